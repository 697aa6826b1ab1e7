// Wire shapes of adapter results and expected-result corpora

use crate::data::ParsedRecord;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One adapter invocation as written to the result store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultEnvelope {
    /// Test case key this result belongs to (falls back to the file stem)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test: Option<String>,
    pub result: ParseOutcome,
    /// Seconds spent parsing this user agent
    pub parse_time: f64,
    /// Seconds spent initializing the parser
    pub init_time: f64,
    /// Bytes of memory used by the adapter process
    pub memory_used: u64,
    /// Version of the parser library
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOutcome {
    /// Normalized parser output; `None` when the key is missing or null
    pub parsed: Option<ParsedRecord>,
    /// Errors reported by the adapter
    pub err: Option<Vec<Value>>,
}

impl ResultEnvelope {
    pub fn with_parsed(parsed: ParsedRecord) -> Self {
        ResultEnvelope {
            result: ParseOutcome {
                parsed: Some(parsed),
                err: None,
            },
            ..Default::default()
        }
    }

    /// True when the adapter reported at least one error.
    pub fn has_errors(&self) -> bool {
        self.result.err.as_ref().is_some_and(|errs| !errs.is_empty())
    }
}

/// Expected-results corpus for one test suite
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpectedCorpus {
    /// Test cases in corpus order; the order fixes agent indices
    pub tests: IndexMap<String, ExpectedCase>,
    #[serde(default)]
    pub version: Option<String>,
}

/// One expected record plus the request headers it was produced from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpectedCase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(flatten)]
    pub record: ParsedRecord,
}

impl ExpectedCase {
    pub fn new(record: ParsedRecord) -> Self {
        ExpectedCase {
            headers: None,
            record,
        }
    }

    /// Headers for diff reporting; the case key stands in for the user agent
    /// when the corpus does not carry headers.
    pub fn headers_or(&self, key: &str) -> BTreeMap<String, String> {
        self.headers.clone().unwrap_or_else(|| {
            let mut headers = BTreeMap::new();
            headers.insert("user-agent".to_string(), key.to_string());
            headers
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FieldValue;
    use serde_json::json;

    #[test]
    fn test_missing_parsed_key_is_no_result() {
        let envelope: ResultEnvelope = serde_json::from_value(json!({
            "result": {"err": ["timeout"]},
            "parse_time": 0.5,
            "init_time": 0.1,
            "memory_used": 1024,
            "version": "1.2.3"
        }))
        .unwrap();
        assert!(envelope.result.parsed.is_none());
        assert!(envelope.has_errors());
        assert_eq!(envelope.memory_used, 1024);
    }

    #[test]
    fn test_corpus_preserves_test_order_and_headers() {
        let corpus: ExpectedCorpus = serde_json::from_value(json!({
            "tests": {
                "zeta": {"client": {"name": "Chrome"}},
                "alpha": {
                    "headers": {"user-agent": "Mozilla/5.0"},
                    "client": {"name": "Firefox"}
                }
            },
            "version": null
        }))
        .unwrap();
        let keys: Vec<_> = corpus.tests.keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);

        let alpha = &corpus.tests["alpha"];
        assert_eq!(alpha.record.client.name, FieldValue::from("Firefox"));
        assert_eq!(alpha.headers_or("alpha")["user-agent"], "Mozilla/5.0");
        assert_eq!(corpus.tests["zeta"].headers_or("zeta")["user-agent"], "zeta");
    }
}
