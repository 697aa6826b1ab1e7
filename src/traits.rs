use crate::data::schemas::ResultEnvelope;
use crate::errors::Result;
use serde::Serialize;

/// One stored adapter result. Reading it may have failed; that failure
/// belongs to this row only.
#[derive(Debug)]
pub struct StoredResult {
    pub test: String,
    pub outcome: Result<ResultEnvelope>,
}

/// Read/write contract of the result store.
///
/// A store holds one [`ResultEnvelope`] per (run, suite, parser, test case).
/// Listing methods return names in a stable, sorted order.
///
/// # Examples
///
/// ```rust
/// use uabench::data::schemas::ResultEnvelope;
/// use uabench::store::MemoryResultStore;
/// use uabench::traits::ResultStore;
///
/// # fn example() -> uabench::Result<()> {
/// let mut store = MemoryResultStore::default();
/// store.put("run-1", "browscap", "ua-parser", "case-1", &ResultEnvelope::default())?;
///
/// assert_eq!(store.runs()?, vec!["run-1".to_string()]);
/// assert_eq!(store.results("run-1", "browscap", "ua-parser")?.len(), 1);
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub trait ResultStore {
    /// All run identifiers.
    fn runs(&self) -> Result<Vec<String>>;

    /// Test suites with results in `run`.
    fn suites(&self, run: &str) -> Result<Vec<String>>;

    /// Parsers with results for `suite` in `run`.
    fn parsers(&self, run: &str, suite: &str) -> Result<Vec<String>>;

    /// Every stored result of one parser on one suite.
    fn results(&self, run: &str, suite: &str, parser: &str) -> Result<Vec<StoredResult>>;

    /// Store (or replace) one result row.
    fn put(
        &mut self,
        run: &str,
        suite: &str,
        parser: &str,
        test: &str,
        envelope: &ResultEnvelope,
    ) -> Result<()>;

    /// The run with the greatest identifier, if any.
    fn latest_run(&self) -> Result<Option<String>> {
        Ok(self.runs()?.into_iter().max())
    }
}

/// Pretty JSON export for report structures.
pub trait Exportable {
    fn export(&self) -> Result<String>
    where
        Self: Serialize,
    {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
