//! Command implementations for the uabench CLI.
//!
//! - [`analyze_command`]: score and compare every parser of a run
//! - [`runs_command`]: list the runs in the result store
//! - [`normalize_command`]: show how a single raw value normalizes
//!
//! Commands take an already loaded [`UaBenchConfig`]; flags given on the
//! command line override the matching config fields.

use std::fs;
use std::path::{Path, PathBuf};
use tabular::{Row, Table};
use tracing::{debug, info};

use crate::analyze::{AnalysisReport, AnalyzeOptionsBuilder, Analyzer, GroundTruth};
use crate::configuration::UaBenchConfig;
use crate::data::{FieldGroup, FieldValue};
use crate::errors::{Result, UaBenchError};
use crate::normalize::{Normalizer, SynonymMap};
use crate::output;
use crate::report::{render, ReportOptions};
use crate::store::FileResultStore;
use crate::traits::{Exportable, ResultStore};

/// Command-line side of an analysis.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeRequest {
    /// Run to analyze; the latest run when unset
    pub run: Option<String>,
    pub suites: Vec<String>,
    pub parsers: Vec<String>,
    pub comparison_only: bool,
    pub reference: Option<String>,
    pub report: ReportOptions,
    /// Write the JSON report here as well
    pub json: Option<PathBuf>,
}

/// Build a normalizer from the configured synonym map, if any.
pub fn load_normalizer(config: &UaBenchConfig) -> Result<Normalizer> {
    let synonyms = match &config.synonyms {
        Some(path) => SynonymMap::load(path)?,
        None => SynonymMap::new(),
    };
    Ok(Normalizer::new(synonyms))
}

fn ground_truth(config: &UaBenchConfig, request: &AnalyzeRequest) -> GroundTruth {
    if !(request.comparison_only || config.comparison_only) {
        return GroundTruth::Corpus;
    }
    match request.reference.as_ref().or(config.reference_parser.as_ref()) {
        Some(reference) => GroundTruth::Parser(reference.clone()),
        None => match config.parsers.first() {
            Some(first) if request.parsers.is_empty() => GroundTruth::Parser(first.clone()),
            _ => GroundTruth::FirstParser,
        },
    }
}

fn pick<'a>(requested: &'a [String], configured: &'a [String]) -> &'a [String] {
    if requested.is_empty() {
        configured
    } else {
        requested
    }
}

/// Analyze one run, print the report and optionally export it as JSON.
pub fn analyze_command(config: &UaBenchConfig, request: &AnalyzeRequest) -> Result<AnalysisReport> {
    let store = FileResultStore::new(&config.results_dir);
    let run = match &request.run {
        Some(run) => run.clone(),
        None => store.latest_run()?.ok_or_else(|| {
            UaBenchError::not_found("run in", config.results_dir.display().to_string())
        })?,
    };

    let normalizer = load_normalizer(config)?;
    let ground_truth = ground_truth(config, request);
    debug!("Ground truth for run {}: {:?}", run, ground_truth);

    let options = AnalyzeOptionsBuilder::default()
        .run(run)
        .suites(pick(&request.suites, &config.suites).to_vec())
        .parsers(pick(&request.parsers, &config.parsers).to_vec())
        .ground_truth(ground_truth)
        .corpus_dir(config.corpus_dir.clone())
        .build()
        .map_err(anyhow::Error::from)?;

    let report = Analyzer::new(&store, &normalizer, options).run()?;
    print!("{}", render(&report, request.report));

    if let Some(path) = &request.json {
        write_json(&report, path)?;
        output::success(&format!("Report written to {}", path.display()));
    }
    Ok(report)
}

fn write_json(report: &AnalysisReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, report.export()?)?;
    info!("Wrote JSON report to {}", path.display());
    Ok(())
}

/// Runs in the result store, oldest first, with their suite counts.
pub fn runs_table<S: ResultStore>(store: &S) -> Result<Table> {
    let runs = store.runs()?;
    let latest = runs.iter().max().cloned();

    let mut table = Table::new("{:<}  {:>}  {:<}");
    for run in &runs {
        let suites = store.suites(run)?;
        let marker = if Some(run) == latest.as_ref() { "latest" } else { "" };
        table.add_row(
            Row::new()
                .with_cell(run)
                .with_cell(suites.len())
                .with_cell(marker),
        );
    }
    Ok(table)
}

pub fn runs_command(config: &UaBenchConfig) -> Result<()> {
    let store = FileResultStore::new(&config.results_dir);
    let runs = store.runs()?;
    if runs.is_empty() {
        output::warning(&format!("No runs in {}", config.results_dir.display()));
        return Ok(());
    }
    print!("{}", runs_table(&store)?);
    println!("\nTotal: {} runs", output::count(runs.len()));
    Ok(())
}

/// Normalize one raw value the way the analysis would.
pub fn normalize_value(
    normalizer: &Normalizer,
    section: &str,
    field: &str,
    value: &str,
    version: Option<&str>,
) -> Result<String> {
    let group = FieldGroup::parse(section).ok_or_else(|| UaBenchError::not_found("section", section))?;
    let field = group
        .field_names()
        .iter()
        .find(|name| name.eq_ignore_ascii_case(field))
        .ok_or_else(|| UaBenchError::not_found(format!("field of {group}"), field))?;

    let raw = match value {
        "true" => FieldValue::Bool(true),
        "false" => FieldValue::Bool(false),
        "null" => FieldValue::Null,
        other => FieldValue::from(other),
    };
    let version = version.map(FieldValue::from);
    let siblings: Vec<(&str, &FieldValue)> = version.iter().map(|v| ("version", v)).collect();

    Ok(normalizer
        .normalize(group, field, &raw, &siblings)
        .to_string())
}

pub fn normalize_command(
    config: &UaBenchConfig,
    section: &str,
    field: &str,
    value: &str,
    version: Option<&str>,
) -> Result<()> {
    let normalizer = load_normalizer(config)?;
    println!("{}", normalize_value(&normalizer, section, field, value, version)?);
    Ok(())
}
