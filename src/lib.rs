//! uabench - user-agent parser benchmarking
//!
//! Scores the stored output of many user-agent parsers against expected
//! results and against each other. Raw field values are first reduced to
//! canonical tokens so that cosmetic differences ("Mobile Safari" vs
//! "mobile-safari") do not count as disagreement.
//!
//! # Quick Start
//!
//! ```rust
//! use uabench::data::{FieldValue, ParsedRecord};
//! use uabench::{compare, GroupScores, Normalizer};
//!
//! let mut expected = ParsedRecord::default();
//! expected.client.name = FieldValue::from("Chrome");
//! expected.client.version = FieldValue::from("55.0");
//!
//! let mut actual = expected.clone();
//! actual.client.version = FieldValue::from("54.0.2840");
//!
//! let normalizer = Normalizer::default();
//! let expected = normalizer.normalize_record(&expected);
//! let actual = normalizer.normalize_record(&actual);
//!
//! let comparison = compare(&expected, &actual);
//! assert!(comparison.has_failures());
//!
//! let mut scores = GroupScores::new();
//! scores.record(&expected, &actual);
//! assert_eq!(scores.overall().pass, 1);
//! ```
//!
//! # Architecture
//!
//! - [`normalize`]: raw value to [`NormalizedValue`]
//! - [`compare`](mod@compare): value pairs, failures and the distribution table
//! - [`score`]: pass/fail tallies and rates per field-group
//! - [`analyze`]: the driver tying a [`ResultStore`] to the above
//! - [`report`]: text tables and JSON export
//!
//! # Error Handling
//!
//! Fallible operations return [`Result<T>`] with [`UaBenchError`]. Problems
//! confined to one stored row are logged and counted instead.

pub mod analyze;
pub mod commands;
pub mod compare;
pub mod configuration;
pub mod data;
pub mod errors;
pub mod normalize;
pub mod output;
pub mod report;
pub mod score;
pub mod store;
pub mod traits;

// Re-export commonly used types
pub use analyze::{AnalysisReport, AnalyzeOptions, Analyzer, GroundTruth, RunAccumulator};
pub use compare::{compare, Comparison, ComparisonTable, FailureRecord, ValuePair};
pub use configuration::UaBenchConfig;
pub use errors::{Result, UaBenchError};
pub use normalize::{NormalizedValue, Normalizer, SynonymMap};
pub use score::{score, GroupScores, ScoreTally, Tier};
pub use store::{FileResultStore, MemoryResultStore};
pub use traits::{Exportable, ResultStore};
