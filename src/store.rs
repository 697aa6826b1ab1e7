//! Result store implementations.
//!
//! [`FileResultStore`] keeps one JSON file per row under
//! `<root>/<run>/<suite>/<parser>/<test>.json`. [`MemoryResultStore`] keeps
//! rows in memory and can simulate unreadable rows.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::data::loaders::load_result;
use crate::data::schemas::ResultEnvelope;
use crate::errors::{Result, UaBenchError};
use crate::traits::{ResultStore, StoredResult};

#[derive(Debug, Clone)]
pub struct FileResultStore {
    root: PathBuf,
}

impl FileResultStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        FileResultStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn parser_dir(&self, run: &str, suite: &str, parser: &str) -> PathBuf {
        self.root.join(run).join(suite).join(parser)
    }
}

/// Sorted names of the sub-directories of `dir`. A missing directory is
/// reported as not found.
fn list_dirs(dir: &Path, kind: &str) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Err(UaBenchError::not_found(kind, dir.display().to_string()));
    }
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

impl ResultStore for FileResultStore {
    fn runs(&self) -> Result<Vec<String>> {
        list_dirs(&self.root, "results directory")
    }

    fn suites(&self, run: &str) -> Result<Vec<String>> {
        list_dirs(&self.root.join(run), "run")
    }

    fn parsers(&self, run: &str, suite: &str) -> Result<Vec<String>> {
        list_dirs(&self.root.join(run).join(suite), "suite")
    }

    fn results(&self, run: &str, suite: &str, parser: &str) -> Result<Vec<StoredResult>> {
        let dir = self.parser_dir(run, suite, parser);
        if !dir.is_dir() {
            return Err(UaBenchError::not_found("parser results", dir.display().to_string()));
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();
        debug!("{} result files in {}", paths.len(), dir.display());

        Ok(paths
            .into_iter()
            .map(|path| {
                let stem = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let outcome = load_result(&path);
                let test = match &outcome {
                    Ok(envelope) => envelope.test.clone().unwrap_or(stem),
                    Err(_) => stem,
                };
                StoredResult { test, outcome }
            })
            .collect())
    }

    fn put(
        &mut self,
        run: &str,
        suite: &str,
        parser: &str,
        test: &str,
        envelope: &ResultEnvelope,
    ) -> Result<()> {
        let dir = self.parser_dir(run, suite, parser);
        fs::create_dir_all(&dir)?;

        let mut row = envelope.clone();
        row.test = Some(test.to_string());
        let path = dir.join(format!("{}.json", file_stem_for(test)));
        fs::write(&path, serde_json::to_vec_pretty(&row)?)?;
        trace!("Wrote {}", path.display());
        Ok(())
    }
}

const STEM_PREFIX_LEN: usize = 64;

// Test keys are free text, often the full user agent. The readable prefix is
// lossy and bounded; the digest of the whole key keeps stems distinct.
fn file_stem_for(test: &str) -> String {
    let prefix: String = test
        .chars()
        .take(STEM_PREFIX_LEN)
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();

    let digest = Sha256::digest(test.as_bytes());
    let mut stem = String::with_capacity(prefix.len() + 33);
    stem.push_str(&prefix);
    stem.push('-');
    for byte in &digest[..16] {
        let _ = write!(stem, "{byte:02x}");
    }
    stem
}

type RowKey = (String, String, String);

/// In-memory store, mostly for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryResultStore {
    rows: BTreeMap<RowKey, BTreeMap<String, std::result::Result<ResultEnvelope, String>>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a row that fails to read back, as a corrupt file would.
    pub fn put_malformed(&mut self, run: &str, suite: &str, parser: &str, test: &str, reason: &str) {
        self.rows
            .entry((run.to_string(), suite.to_string(), parser.to_string()))
            .or_default()
            .insert(test.to_string(), Err(reason.to_string()));
    }
}

impl ResultStore for MemoryResultStore {
    fn runs(&self) -> Result<Vec<String>> {
        let mut runs: Vec<String> = self.rows.keys().map(|(run, _, _)| run.clone()).collect();
        runs.dedup();
        Ok(runs)
    }

    fn suites(&self, run: &str) -> Result<Vec<String>> {
        let mut suites: Vec<String> = self
            .rows
            .keys()
            .filter(|(r, _, _)| r == run)
            .map(|(_, suite, _)| suite.clone())
            .collect();
        suites.dedup();
        Ok(suites)
    }

    fn parsers(&self, run: &str, suite: &str) -> Result<Vec<String>> {
        Ok(self
            .rows
            .keys()
            .filter(|(r, s, _)| r == run && s == suite)
            .map(|(_, _, parser)| parser.clone())
            .collect())
    }

    fn results(&self, run: &str, suite: &str, parser: &str) -> Result<Vec<StoredResult>> {
        let key = (run.to_string(), suite.to_string(), parser.to_string());
        let rows = self
            .rows
            .get(&key)
            .ok_or_else(|| UaBenchError::not_found("parser results", format!("{run}/{suite}/{parser}")))?;

        Ok(rows
            .iter()
            .map(|(test, row)| StoredResult {
                test: test.clone(),
                outcome: row.clone().map_err(|reason| {
                    UaBenchError::malformed(Path::new(test), reason)
                }),
            })
            .collect())
    }

    fn put(
        &mut self,
        run: &str,
        suite: &str,
        parser: &str,
        test: &str,
        envelope: &ResultEnvelope,
    ) -> Result<()> {
        let mut row = envelope.clone();
        row.test = Some(test.to_string());
        self.rows
            .entry((run.to_string(), suite.to_string(), parser.to_string()))
            .or_default()
            .insert(test.to_string(), Ok(row));
        Ok(())
    }
}
