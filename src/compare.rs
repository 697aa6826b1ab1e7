//! Comparison engine.
//!
//! [`compare`] pairs every expected field of one test case with the same
//! field of a parser's output. The pairs feed two consumers:
//!
//! - [`ComparisonTable`], the expected-vs-actual distribution for a whole
//!   test suite across all parsers
//! - [`FailureRecord`], the per-test diff of known-but-different values
//!
//! Only fields present on the expected side are ever looked at. A pair is
//! kept only when [`is_comparable`] says so.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::trace;

use crate::data::FieldGroup;
use crate::normalize::{NormalizedRecord, NormalizedValue};

/// Expected and actual value of one field on one test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuePair {
    pub group: FieldGroup,
    pub field: &'static str,
    pub expected: NormalizedValue,
    pub actual: NormalizedValue,
}

impl ValuePair {
    /// Both sides known and different. An unknown on either side is never a
    /// mismatch.
    pub fn is_mismatch(&self) -> bool {
        self.expected.is_known() && self.actual.is_known() && self.expected != self.actual
    }
}

/// Guard deciding whether a field takes part in comparison at all.
///
/// `None` means the raw value was not a scalar. The expected side must be a
/// known scalar; the actual side may be unknown but not a non-scalar.
pub fn is_comparable(expected: Option<&NormalizedValue>, actual: Option<&NormalizedValue>) -> bool {
    matches!(expected, Some(value) if value.is_known()) && actual.is_some()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub expected: NormalizedValue,
    pub actual: NormalizedValue,
}

pub type FailureMap = BTreeMap<FieldGroup, BTreeMap<String, Mismatch>>;

/// All mismatching fields of one test case for one parser.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    pub test: String,
    pub headers: BTreeMap<String, String>,
    pub fail: FailureMap,
}

impl FailureRecord {
    pub fn mismatch_count(&self) -> usize {
        self.fail.values().map(BTreeMap::len).sum()
    }
}

/// Outcome of comparing one expected record with one actual record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comparison {
    pub pairs: Vec<ValuePair>,
    pub failures: FailureMap,
}

impl Comparison {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn into_failure_record(
        self,
        test: &str,
        headers: BTreeMap<String, String>,
    ) -> Option<FailureRecord> {
        if self.failures.is_empty() {
            return None;
        }
        Some(FailureRecord {
            test: test.to_string(),
            headers,
            fail: self.failures,
        })
    }
}

pub fn compare(expected: &NormalizedRecord, actual: &NormalizedRecord) -> Comparison {
    let mut comparison = Comparison::default();

    for group in FieldGroup::ALL {
        let Some(expected_section) = expected.section(group) else {
            continue;
        };
        for (field, expected_value) in expected_section {
            let actual_value = actual.get(group, field);
            if !is_comparable(Some(expected_value), actual_value) {
                continue;
            }
            let pair = ValuePair {
                group,
                field: *field,
                expected: expected_value.clone(),
                actual: actual_value.cloned().unwrap_or(NormalizedValue::Unknown),
            };
            if pair.is_mismatch() {
                trace!(
                    "{}.{}: expected {} got {}",
                    group,
                    field,
                    pair.expected,
                    pair.actual
                );
                comparison
                    .failures
                    .entry(group)
                    .or_default()
                    .insert(
                        field.to_string(),
                        Mismatch {
                            expected: pair.expected.clone(),
                            actual: pair.actual.clone(),
                        },
                    );
            }
            comparison.pairs.push(pair);
        }
    }

    comparison
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Bucket {
    pub count: usize,
    pub agents: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExpectedBucket {
    pub count: usize,
    pub agents: Vec<usize>,
    #[serde(rename = "hasFailures")]
    pub has_failures: bool,
}

/// Key of the expected bucket in a serialized [`Distribution`]. Parser
/// buckets share its map, so no scored parser may use this name.
pub const EXPECTED_KEY: &str = "expected";

/// What every parser returned for one expected value of one field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Distribution {
    pub expected: ExpectedBucket,
    #[serde(flatten)]
    pub parsers: IndexMap<String, BTreeMap<NormalizedValue, Bucket>>,
}

pub type FieldTable = BTreeMap<NormalizedValue, Distribution>;

/// Expected-vs-actual distribution for one test suite.
///
/// Agent indices point into [`ComparisonTable::agents`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ComparisonTable {
    pub agents: Vec<String>,
    pub sections: BTreeMap<FieldGroup, BTreeMap<String, FieldTable>>,
}

/// One rendered line of a field's distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    /// Set on the first row of an expected value, blank after.
    pub expected: Option<(NormalizedValue, usize, bool)>,
    /// Set on the first row of a parser within an expected value.
    pub parser: Option<String>,
    pub actual: NormalizedValue,
    pub count: usize,
}

impl ComparisonTable {
    pub fn new(agents: Vec<String>) -> Self {
        ComparisonTable {
            agents,
            sections: BTreeMap::new(),
        }
    }

    /// Add one test case's pairs for `parser`.
    pub fn record(&mut self, parser: &str, agent: usize, pairs: &[ValuePair]) {
        for pair in pairs {
            let distribution = self
                .sections
                .entry(pair.group)
                .or_default()
                .entry(pair.field.to_string())
                .or_default()
                .entry(pair.expected.clone())
                .or_default();

            distribution.expected.count += 1;
            distribution.expected.agents.push(agent);
            if pair.is_mismatch() {
                distribution.expected.has_failures = true;
            }

            let bucket = distribution
                .parsers
                .entry(parser.to_string())
                .or_default()
                .entry(pair.actual.clone())
                .or_default();
            bucket.count += 1;
            bucket.agents.push(agent);
        }
    }

    pub fn field(&self, group: FieldGroup, field: &str) -> Option<&FieldTable> {
        self.sections.get(&group).and_then(|fields| fields.get(field))
    }

    /// Every `(group, field)` with at least one recorded pair.
    pub fn fields(&self) -> Vec<(FieldGroup, &str)> {
        FieldGroup::ALL
            .into_iter()
            .flat_map(|group| {
                group
                    .field_names()
                    .iter()
                    .filter(move |field| self.field(group, field).is_some())
                    .map(move |field| (group, *field))
            })
            .collect()
    }

    /// Rows for one field, most common expected values first. With
    /// `failures_only`, expected values without a mismatch are left out.
    pub fn rows(&self, group: FieldGroup, field: &str, failures_only: bool) -> Vec<ComparisonRow> {
        let Some(table) = self.field(group, field) else {
            return Vec::new();
        };

        let mut expected: Vec<_> = table
            .iter()
            .filter(|(_, dist)| !failures_only || dist.expected.has_failures)
            .collect();
        expected.sort_by(|a, b| b.1.expected.count.cmp(&a.1.expected.count));

        let mut rows = Vec::new();
        for (expected_value, dist) in expected {
            let mut first_of_expected = true;
            for (parser, buckets) in &dist.parsers {
                let mut actual: Vec<_> = buckets.iter().collect();
                actual.sort_by(|a, b| b.1.count.cmp(&a.1.count));

                let mut first_of_parser = true;
                for (actual_value, bucket) in actual {
                    rows.push(ComparisonRow {
                        expected: first_of_expected.then(|| {
                            (
                                expected_value.clone(),
                                dist.expected.count,
                                dist.expected.has_failures,
                            )
                        }),
                        parser: first_of_parser.then(|| parser.clone()),
                        actual: actual_value.clone(),
                        count: bucket.count,
                    });
                    first_of_expected = false;
                    first_of_parser = false;
                }
            }
        }
        rows
    }
}
