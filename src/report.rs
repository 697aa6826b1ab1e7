//! Text rendering of an [`AnalysisReport`].
//!
//! Tables are built with `tabular`; percentages are colored by [`Tier`].
//!
//! [`Tier`]: crate::score::Tier

use colored::Colorize;
use std::fmt::Write;
use tabular::{Row, Table};

use crate::analyze::{AnalysisReport, ParserReport, SuiteReport};
use crate::compare::{ComparisonTable, FailureRecord};
use crate::data::FieldGroup;
use crate::output;
use crate::score::GroupScores;

/// Which optional sections to render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOptions {
    /// Expected-vs-actual distribution per field
    pub details: bool,
    /// Restrict the distribution to expected values with a mismatch
    pub failures_only: bool,
    /// List every failing test case
    pub diff: bool,
}

/// Score table: total and accuracy rate per field-group plus overall.
pub fn score_table<'a, I>(rows: I) -> Table
where
    I: IntoIterator<Item = (&'a str, &'a GroupScores)>,
{
    let columns = FieldGroup::ALL.len() * 2 + 2;
    let mut table = Table::new(&format!("{{:<}}{}", "  {:>}".repeat(columns)));

    let mut heading = Row::new().with_ansi_cell("PARSER".bold());
    for group in FieldGroup::ALL {
        let name = group.as_str().to_uppercase();
        heading = heading
            .with_ansi_cell(format!("{name} TOTAL").bold())
            .with_ansi_cell(format!("{name} ACC").bold());
    }
    heading = heading
        .with_ansi_cell("OVERALL TOTAL".bold())
        .with_ansi_cell("OVERALL ACC".bold());
    table.add_row(heading);

    for (parser, scores) in rows {
        let mut row = Row::new().with_ansi_cell(output::parser_name(parser));
        for group in FieldGroup::ALL {
            let tally = scores.get(group);
            row = row
                .with_ansi_cell(output::rate(tally.total_rate()))
                .with_ansi_cell(output::rate(tally.accuracy_rate()));
        }
        let overall = scores.overall();
        row = row
            .with_ansi_cell(output::rate(overall.total_rate()))
            .with_ansi_cell(output::rate(overall.accuracy_rate()));
        table.add_row(row);
    }
    table
}

/// Result accounting and timing per parser.
pub fn performance_table(parsers: &[ParserReport]) -> Table {
    let mut table = Table::new(&format!("{{:<}}  {{:<}}{}", "  {:>}".repeat(11)));
    table.add_row(
        Row::new()
            .with_ansi_cell("PARSER".bold())
            .with_ansi_cell("VERSION".bold())
            .with_ansi_cell("FOUND".bold())
            .with_ansi_cell("NOT FOUND".bold())
            .with_ansi_cell("MALFORMED".bold())
            .with_ansi_cell("MISSING".bold())
            .with_ansi_cell("UNEXPECTED".bold())
            .with_ansi_cell("NO TRUTH".bold())
            .with_ansi_cell("DUPLICATE".bold())
            .with_ansi_cell("ERRORS".bold())
            .with_ansi_cell("AVG PARSE".bold())
            .with_ansi_cell("AVG INIT".bold())
            .with_ansi_cell("MAX MEMORY".bold()),
    );

    let seconds = |value: Option<f64>| match value {
        Some(secs) => format!("{secs:.4}s"),
        None => "-".to_string(),
    };

    for parser in parsers {
        let stats = &parser.stats;
        table.add_row(
            Row::new()
                .with_ansi_cell(output::parser_name(&parser.parser))
                .with_cell(stats.version.as_deref().unwrap_or("-"))
                .with_cell(stats.found)
                .with_cell(stats.not_found)
                .with_cell(stats.malformed)
                .with_cell(stats.missing)
                .with_cell(stats.unexpected)
                .with_cell(stats.no_ground_truth)
                .with_cell(stats.duplicate)
                .with_cell(stats.with_errors)
                .with_cell(seconds(stats.avg_parse_time()))
                .with_cell(seconds(stats.avg_init_time()))
                .with_cell(stats.max_memory),
        );
    }
    table
}

/// Expected-vs-actual distribution, one block per field.
///
/// Repeated expected values and parser names are left blank so each
/// distinct actual value gets its own line.
pub fn comparison_table(table: &ComparisonTable, failures_only: bool) -> Table {
    let mut out = Table::new("{:<}  {:<}  {:>}  {:<}  {:<}  {:>}");
    out.add_row(
        Row::new()
            .with_ansi_cell("FIELD".bold())
            .with_ansi_cell("EXPECTED".bold())
            .with_ansi_cell("COUNT".bold())
            .with_ansi_cell("PARSER".bold())
            .with_ansi_cell("ACTUAL".bold())
            .with_ansi_cell("COUNT".bold()),
    );

    for (group, field) in table.fields() {
        let mut first_of_field = true;
        for row in table.rows(group, field, failures_only) {
            let label = if first_of_field {
                format!("{group}.{field}")
            } else {
                String::new()
            };
            first_of_field = false;

            let (expected, expected_count, expected_failed) = match &row.expected {
                Some((value, count, failed)) => (value.to_string(), count.to_string(), *failed),
                None => (String::new(), String::new(), false),
            };
            let expected = if expected_failed {
                expected.yellow().to_string()
            } else {
                expected
            };

            let actual = row.actual.to_string();
            let actual = match &row.expected {
                Some((value, _, _)) if value.is_known() && row.actual.is_known() && *value != row.actual => {
                    actual.red().to_string()
                }
                _ => actual,
            };

            out.add_row(
                Row::new()
                    .with_cell(label)
                    .with_ansi_cell(expected)
                    .with_cell(expected_count)
                    .with_ansi_cell(row.parser.as_deref().map(output::parser_name).unwrap_or_default())
                    .with_ansi_cell(actual)
                    .with_cell(row.count),
            );
        }
    }
    out
}

/// One block per failing test case: headers, then each mismatching field.
pub fn failure_diff(parser: &str, failures: &[FailureRecord]) -> String {
    let mut out = String::new();
    for failure in failures {
        let _ = writeln!(out, "{} {}", output::parser_name(parser), failure.test.bold());
        for (name, value) in &failure.headers {
            if name != "user-agent" || value != &failure.test {
                let _ = writeln!(out, "  {}: {}", name.dimmed(), value);
            }
        }
        for (group, fields) in &failure.fail {
            for (field, mismatch) in fields {
                let _ = writeln!(
                    out,
                    "  {}.{}: {} {}",
                    group,
                    field,
                    format!("- {}", mismatch.expected).red(),
                    format!("+ {}", mismatch.actual).green()
                );
            }
        }
    }
    out
}

pub fn render_suite(suite: &SuiteReport, options: ReportOptions) -> String {
    let mut out = String::new();
    let _ = write!(out, "{} {}", "Suite".bold(), output::suite_name(&suite.suite));
    if let Some(version) = &suite.expected_version {
        let _ = write!(out, " ({version})");
    }
    if let Some(reference) = &suite.reference {
        let _ = write!(out, " against {}", output::parser_name(reference));
    }
    out.push('\n');

    if suite.parsers.is_empty() {
        out.push_str("No parsers to score.\n");
        return out;
    }

    let rows = suite
        .parsers
        .iter()
        .map(|parser| (parser.parser.as_str(), &parser.scores));
    let _ = writeln!(out, "{}", score_table(rows));
    let _ = writeln!(out, "{}", performance_table(&suite.parsers));

    if options.details {
        let _ = writeln!(out, "{}", comparison_table(&suite.table, options.failures_only));
    }
    if options.diff {
        for parser in &suite.parsers {
            out.push_str(&failure_diff(&parser.parser, &parser.failures));
        }
    }
    out
}

pub fn render(report: &AnalysisReport, options: ReportOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}\n", "Run".bold(), report.run);

    for suite in &report.suites {
        out.push_str(&render_suite(suite, options));
        out.push('\n');
    }

    for skipped in &report.skipped_suites {
        let _ = writeln!(
            out,
            "{} {}: {}",
            "Skipped".yellow(),
            output::suite_name(&skipped.suite),
            skipped.reason
        );
    }

    if let Some(totals) = &report.grand_totals {
        let _ = writeln!(out, "{}", "Grand total".bold());
        let rows = totals
            .iter()
            .map(|(parser, scores)| (parser.as_str(), scores));
        let _ = writeln!(out, "{}", score_table(rows));
    }
    out
}
