//! Aggregation driver.
//!
//! For each test suite of a run the [`Analyzer`] loads the expectations
//! (a corpus file, or a reference parser's own output), walks every other
//! parser's stored results in corpus order and threads each test case
//! through normalization, [`compare`] and [`GroupScores`]. Everything it
//! produces lands in one [`RunAccumulator`]; there is no state outside it.
//!
//! Per-row problems are logged and counted in [`ResultStats`]. A suite whose
//! expectations cannot be loaded is skipped with an error, and the other
//! suites still run.

use chrono::{DateTime, Utc};
use derive_builder::Builder;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use crate::compare::{compare, ComparisonTable, FailureRecord, EXPECTED_KEY};
use crate::data::loaders::load_corpus;
use crate::data::schemas::{ExpectedCase, ResultEnvelope};
use crate::errors::{Result, UaBenchError};
use crate::normalize::{NormalizedRecord, Normalizer};
use crate::score::GroupScores;
use crate::traits::{Exportable, ResultStore};

/// Where a suite's expected values come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "parser", rename_all = "snake_case")]
pub enum GroundTruth {
    /// `<corpus_dir>/<suite>.json`
    Corpus,
    /// The named parser's output (comparison-only mode).
    Parser(String),
    /// The first parser of each suite's parser list (comparison-only mode).
    FirstParser,
}

#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct AnalyzeOptions {
    pub run: String,
    /// Suites to analyze; empty means every suite of the run.
    #[builder(default)]
    pub suites: Vec<String>,
    /// Parsers in report order; empty means every parser of the suite.
    #[builder(default)]
    pub parsers: Vec<String>,
    #[builder(default = "GroundTruth::Corpus")]
    pub ground_truth: GroundTruth,
    #[builder(default = "PathBuf::from(\"corpus\")")]
    pub corpus_dir: PathBuf,
}

/// Result bookkeeping for one parser on one suite, kept apart from scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultStats {
    /// Rows with a parsed record
    pub found: usize,
    /// Rows without a parsed record
    pub not_found: usize,
    /// Rows that could not be read
    pub malformed: usize,
    /// Expected test cases with no stored row
    pub missing: usize,
    /// Stored rows for test cases the expectations do not know
    pub unexpected: usize,
    /// Rows for test cases the reference parser gave no usable answer for
    pub no_ground_truth: usize,
    /// Extra rows resolving to a test case already seen; only the first counts
    pub duplicate: usize,
    /// Rows where the adapter reported errors
    pub with_errors: usize,
    pub parse_time_total: f64,
    pub init_time_total: f64,
    pub max_memory: u64,
    pub version: Option<String>,
}

impl ResultStats {
    fn observe(&mut self, envelope: &ResultEnvelope) {
        self.parse_time_total += envelope.parse_time;
        self.init_time_total += envelope.init_time;
        self.max_memory = self.max_memory.max(envelope.memory_used);
        if envelope.has_errors() {
            self.with_errors += 1;
        }
        if self.version.is_none() {
            self.version = envelope.version.clone();
        }
    }

    /// Readable rows, with or without a parsed record.
    pub fn readable(&self) -> usize {
        self.found + self.not_found
    }

    pub fn avg_parse_time(&self) -> Option<f64> {
        (self.readable() > 0).then(|| self.parse_time_total / self.readable() as f64)
    }

    pub fn avg_init_time(&self) -> Option<f64> {
        (self.readable() > 0).then(|| self.init_time_total / self.readable() as f64)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ParserReport {
    pub parser: String,
    pub scores: GroupScores,
    pub stats: ResultStats,
    pub failures: Vec<FailureRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub suite: String,
    /// Parser used as ground truth, when not a corpus
    pub reference: Option<String>,
    pub expected_version: Option<String>,
    pub table: ComparisonTable,
    pub parsers: Vec<ParserReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedSuite {
    pub suite: String,
    pub reason: String,
}

/// Everything one analysis produces.
#[derive(Debug, Clone, Default)]
pub struct RunAccumulator {
    run: String,
    suites: Vec<SuiteReport>,
    skipped: Vec<SkippedSuite>,
    totals: IndexMap<String, GroupScores>,
}

impl RunAccumulator {
    pub fn new(run: &str) -> Self {
        RunAccumulator {
            run: run.to_string(),
            ..Default::default()
        }
    }

    /// Add a finished suite and merge its parser tallies into the totals.
    pub fn add_suite(&mut self, report: SuiteReport) {
        for parser in &report.parsers {
            self.totals
                .entry(parser.parser.clone())
                .or_default()
                .merge(&parser.scores);
        }
        self.suites.push(report);
    }

    pub fn skip_suite(&mut self, suite: &str, reason: String) {
        self.skipped.push(SkippedSuite {
            suite: suite.to_string(),
            reason,
        });
    }

    pub fn suites(&self) -> &[SuiteReport] {
        &self.suites
    }

    /// Per-parser sums across suites; only meaningful with more than one.
    pub fn grand_totals(&self) -> Option<&IndexMap<String, GroupScores>> {
        (self.suites.len() > 1).then_some(&self.totals)
    }

    pub fn into_report(self) -> AnalysisReport {
        let grand_totals = (self.suites.len() > 1).then_some(self.totals);
        AnalysisReport {
            generated_at: Utc::now(),
            run: self.run,
            suites: self.suites,
            skipped_suites: self.skipped,
            grand_totals,
        }
    }
}

/// Final, serializable outcome of an analysis.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub run: String,
    pub suites: Vec<SuiteReport>,
    pub skipped_suites: Vec<SkippedSuite>,
    pub grand_totals: Option<IndexMap<String, GroupScores>>,
}

impl Exportable for AnalysisReport {}

struct Expectations {
    cases: Vec<(String, ExpectedCase, NormalizedRecord)>,
    /// Reference rows that are malformed or carry no parsed record
    unusable: HashSet<String>,
    version: Option<String>,
    reference: Option<String>,
}

pub struct Analyzer<'a, S: ResultStore> {
    store: &'a S,
    normalizer: &'a Normalizer,
    options: AnalyzeOptions,
}

impl<'a, S: ResultStore> Analyzer<'a, S> {
    pub fn new(store: &'a S, normalizer: &'a Normalizer, options: AnalyzeOptions) -> Self {
        Analyzer {
            store,
            normalizer,
            options,
        }
    }

    pub fn run(&self) -> Result<AnalysisReport> {
        let run = &self.options.run;
        let suites = if self.options.suites.is_empty() {
            self.store.suites(run)?
        } else {
            self.options.suites.clone()
        };
        info!("Analyzing {} suites of run {}", suites.len(), run);

        let mut accumulator = RunAccumulator::new(run);
        for suite in &suites {
            match self.analyze_suite(suite) {
                Ok(report) => accumulator.add_suite(report),
                Err(e) => {
                    error!("Skipping suite {} ({}): {}", suite, e.category(), e);
                    accumulator.skip_suite(suite, e.to_string());
                }
            }
        }
        Ok(accumulator.into_report())
    }

    pub fn analyze_suite(&self, suite: &str) -> Result<SuiteReport> {
        let parsers = self.parsers_for(suite)?;
        let expectations = self.expectations(suite, &parsers)?;
        debug!(
            "Suite {}: {} expected cases, {} parsers",
            suite,
            expectations.cases.len(),
            parsers.len()
        );

        let agents = expectations
            .cases
            .iter()
            .map(|(key, _, _)| key.clone())
            .collect();
        let mut table = ComparisonTable::new(agents);

        let mut reports = Vec::new();
        for parser in &parsers {
            if expectations.reference.as_ref() == Some(parser) {
                continue;
            }
            if parser == EXPECTED_KEY {
                warn!(
                    "Not scoring parser {} on {}: the name is reserved in reports",
                    parser, suite
                );
                continue;
            }
            reports.push(self.analyze_parser(suite, parser, &expectations, &mut table));
        }

        Ok(SuiteReport {
            suite: suite.to_string(),
            reference: expectations.reference,
            expected_version: expectations.version,
            table,
            parsers: reports,
        })
    }

    fn parsers_for(&self, suite: &str) -> Result<Vec<String>> {
        let available = self.store.parsers(&self.options.run, suite)?;
        if self.options.parsers.is_empty() {
            return Ok(available);
        }
        Ok(self
            .options
            .parsers
            .iter()
            .filter(|parser| {
                let present = available.contains(parser);
                if !present {
                    warn!("Parser {} has no results for suite {}", parser, suite);
                }
                present
            })
            .cloned()
            .collect())
    }

    fn expectations(&self, suite: &str, parsers: &[String]) -> Result<Expectations> {
        let reference = match &self.options.ground_truth {
            GroundTruth::Corpus => {
                let path = self.options.corpus_dir.join(format!("{suite}.json"));
                let corpus = load_corpus(&path)?;
                let cases = corpus
                    .tests
                    .into_iter()
                    .map(|(key, case)| {
                        let normalized = self.normalizer.normalize_record(&case.record);
                        (key, case, normalized)
                    })
                    .collect();
                return Ok(Expectations {
                    cases,
                    unusable: HashSet::new(),
                    version: corpus.version,
                    reference: None,
                });
            }
            GroundTruth::Parser(name) => name.clone(),
            GroundTruth::FirstParser => parsers
                .first()
                .cloned()
                .ok_or_else(|| UaBenchError::not_found("reference parser for suite", suite))?,
        };
        info!("Suite {}: using {} as ground truth", suite, reference);

        let mut version = None;
        let mut cases = Vec::new();
        let mut unusable = HashSet::new();
        for row in self.store.results(&self.options.run, suite, &reference)? {
            match row.outcome {
                Ok(envelope) => {
                    if version.is_none() {
                        version = envelope.version.clone();
                    }
                    match envelope.result.parsed {
                        Some(record) => {
                            let normalized = self.normalizer.normalize_record(&record);
                            cases.push((row.test, ExpectedCase::new(record), normalized));
                        }
                        None => {
                            debug!("Reference row {} has no parsed record", row.test);
                            unusable.insert(row.test);
                        }
                    }
                }
                Err(e) => {
                    warn!("Skipping reference row {}: {}", row.test, e);
                    unusable.insert(row.test);
                }
            }
        }
        if !unusable.is_empty() {
            info!(
                "Suite {}: {} test cases have no usable answer from {}",
                suite,
                unusable.len(),
                reference
            );
        }

        Ok(Expectations {
            cases,
            unusable,
            version,
            reference: Some(reference),
        })
    }

    fn analyze_parser(
        &self,
        suite: &str,
        parser: &str,
        expectations: &Expectations,
        table: &mut ComparisonTable,
    ) -> ParserReport {
        let rows = match self.store.results(&self.options.run, suite, parser) {
            Ok(rows) => rows,
            Err(e) => {
                warn!("No results for {} on {}: {}", parser, suite, e);
                Vec::new()
            }
        };

        let mut stats = ResultStats::default();
        let mut by_test: HashMap<String, Result<ResultEnvelope>> = HashMap::new();
        for row in rows {
            match by_test.entry(row.test) {
                Entry::Occupied(entry) => {
                    warn!(
                        "Ignoring duplicate result for {} on {}: {}",
                        parser,
                        suite,
                        entry.key()
                    );
                    stats.duplicate += 1;
                }
                Entry::Vacant(entry) => {
                    entry.insert(row.outcome);
                }
            }
        }

        let mut scores = GroupScores::new();
        let mut failures = Vec::new();

        for (agent, (key, case, expected)) in expectations.cases.iter().enumerate() {
            let envelope = match by_test.remove(key) {
                None => {
                    stats.missing += 1;
                    continue;
                }
                Some(Err(e)) => {
                    warn!("Skipping malformed result for {} on {}: {}", parser, key, e);
                    stats.malformed += 1;
                    continue;
                }
                Some(Ok(envelope)) => envelope,
            };

            stats.observe(&envelope);
            let Some(record) = envelope.result.parsed else {
                stats.not_found += 1;
                continue;
            };
            stats.found += 1;

            let actual = self.normalizer.normalize_record(&record);
            scores.record(expected, &actual);

            let comparison = compare(expected, &actual);
            table.record(parser, agent, &comparison.pairs);
            if let Some(failure) = comparison.into_failure_record(key, case.headers_or(key)) {
                failures.push(failure);
            }
        }

        for key in by_test.keys() {
            if expectations.unusable.contains(key) {
                stats.no_ground_truth += 1;
            } else {
                stats.unexpected += 1;
            }
        }
        if stats.unexpected > 0 {
            debug!(
                "{} results of {} on {} match no expected test case",
                stats.unexpected, parser, suite
            );
        }

        ParserReport {
            parser: parser.to_string(),
            scores,
            stats,
            failures,
        }
    }
}
