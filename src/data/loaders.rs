// Loading functions for corpora and stored adapter results

use std::fs;
use std::path::Path;
use tracing::{debug, info};

use super::schemas::{ExpectedCorpus, ResultEnvelope};
use crate::errors::{Result, UaBenchError};

/// Load an expected-results corpus. Any failure here is structural and
/// aborts the suite that depends on it.
pub fn load_corpus(path: &Path) -> Result<ExpectedCorpus> {
    let bytes = fs::read(path).map_err(|e| UaBenchError::corpus(path, e.to_string()))?;
    let corpus: ExpectedCorpus =
        serde_json::from_slice(&bytes).map_err(|e| UaBenchError::corpus(path, e.to_string()))?;

    info!(
        "Loaded {} expected test cases from {}",
        corpus.tests.len(),
        path.display()
    );
    Ok(corpus)
}

/// Load one stored adapter result. Errors are row-local.
pub fn load_result(path: &Path) -> Result<ResultEnvelope> {
    let bytes = fs::read(path).map_err(|e| UaBenchError::malformed(path, e.to_string()))?;
    let envelope: ResultEnvelope =
        serde_json::from_slice(&bytes).map_err(|e| UaBenchError::malformed(path, e.to_string()))?;
    debug!("Loaded result {}", path.display());
    Ok(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_corpus_rejects_missing_tests_key() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"version": "1"}}"#).unwrap();

        let err = load_corpus(file.path()).unwrap_err();
        assert_eq!(err.category(), "corpus");
    }

    #[test]
    fn test_load_result_invalid_encoding_is_malformed() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0xff, 0xfe, 0x7b]).unwrap();

        let err = load_result(file.path()).unwrap_err();
        assert!(err.is_row_local());
    }

    #[test]
    fn test_load_result_reads_envelope() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"result": {{"parsed": {{"client": {{"name": "Chrome"}}}}, "err": null}},
                "parse_time": 0.002, "init_time": 0.5, "memory_used": 2048, "version": "4.0"}}"#
        )
        .unwrap();

        let envelope = load_result(file.path()).unwrap();
        assert!(envelope.result.parsed.is_some());
        assert_eq!(envelope.version.as_deref(), Some("4.0"));
    }
}
