//! Scoring of normalized parser output against expectations.
//!
//! Per field-group a [`ScoreTally`] counts the scoreable fields (`count`),
//! the correct ones (`pass`) and the attempted-but-wrong ones (`fail`). Two
//! rates are derived from it:
//!
//! - total rate: `(pass + fail) / count`, how much the parser attempted
//! - accuracy rate: `pass / (pass + fail)`, how much of that was right
//!
//! A rate with a zero denominator is `None` and renders as `-`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign};

use crate::data::FieldGroup;
use crate::normalize::{NormalizedRecord, NormalizedSection, NormalizedValue};

/// Count expected fields the parser got right (`possible == false`) or
/// attempted at all (`possible == true`).
///
/// Fields with an unknown expectation, or missing from `actual`, are skipped.
pub fn score(expected: &NormalizedSection, actual: &NormalizedSection, possible: bool) -> usize {
    expected
        .iter()
        .filter(|(_, value)| value.is_known())
        .filter_map(|(field, value)| actual.get(field).map(|found| (value, found)))
        .filter(|(value, found)| {
            if possible {
                found.is_known()
            } else {
                found == value
            }
        })
        .count()
}

/// Number of fields with a known expectation.
pub fn scoreable(expected: &NormalizedSection) -> usize {
    expected.values().filter(|value| value.is_known()).count()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreTally {
    pub count: usize,
    pub pass: usize,
    pub fail: usize,
}

impl ScoreTally {
    pub fn from_sections(expected: &NormalizedSection, actual: &NormalizedSection) -> Self {
        let pass = score(expected, actual, false);
        let attempted = score(expected, actual, true);
        ScoreTally {
            count: scoreable(expected),
            pass,
            fail: attempted.saturating_sub(pass),
        }
    }

    pub fn attempted(&self) -> usize {
        self.pass + self.fail
    }

    pub fn total_rate(&self) -> Option<f64> {
        percentage(self.attempted(), self.count)
    }

    pub fn accuracy_rate(&self) -> Option<f64> {
        percentage(self.pass, self.attempted())
    }
}

impl Add for ScoreTally {
    type Output = ScoreTally;

    fn add(self, other: ScoreTally) -> ScoreTally {
        ScoreTally {
            count: self.count + other.count,
            pass: self.pass + other.pass,
            fail: self.fail + other.fail,
        }
    }
}

impl AddAssign for ScoreTally {
    fn add_assign(&mut self, other: ScoreTally) {
        *self = *self + other;
    }
}

fn percentage(numerator: usize, denominator: usize) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(numerator as f64 / denominator as f64 * 100.0)
    }
}

/// Render a rate with two decimals, or `-` when undefined.
pub fn format_rate(rate: Option<f64>) -> String {
    match rate {
        Some(value) => format!("{:.2}%", value),
        None => "-".to_string(),
    }
}

/// Display tier of a percentage. Each bound is inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Low,
    Mid,
    Tier2,
    Tier3,
    Tier4,
    Tier5,
}

impl Tier {
    pub fn classify(percent: f64) -> Tier {
        if percent >= 100.0 {
            Tier::Tier5
        } else if percent >= 95.0 {
            Tier::Tier4
        } else if percent >= 90.0 {
            Tier::Tier3
        } else if percent >= 85.0 {
            Tier::Tier2
        } else if percent < 50.0 {
            Tier::Low
        } else {
            Tier::Mid
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Low => "low",
            Tier::Mid => "mid",
            Tier::Tier2 => "tier2",
            Tier::Tier3 => "tier3",
            Tier::Tier4 => "tier4",
            Tier::Tier5 => "tier5",
        };
        f.write_str(name)
    }
}

/// Tallies of one parser, per field-group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupScores {
    groups: BTreeMap<FieldGroup, ScoreTally>,
}

impl Default for GroupScores {
    fn default() -> Self {
        GroupScores {
            groups: FieldGroup::ALL
                .into_iter()
                .map(|group| (group, ScoreTally::default()))
                .collect(),
        }
    }
}

impl GroupScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score one test case.
    pub fn record(&mut self, expected: &NormalizedRecord, actual: &NormalizedRecord) {
        let empty = NormalizedSection::new();
        for group in FieldGroup::ALL {
            let tally = ScoreTally::from_sections(
                expected.section(group).unwrap_or(&empty),
                actual.section(group).unwrap_or(&empty),
            );
            *self.groups.entry(group).or_default() += tally;
        }
    }

    pub fn get(&self, group: FieldGroup) -> ScoreTally {
        self.groups.get(&group).copied().unwrap_or_default()
    }

    /// Sum of all field-groups.
    pub fn overall(&self) -> ScoreTally {
        self.groups
            .values()
            .fold(ScoreTally::default(), |acc, tally| acc + *tally)
    }

    pub fn merge(&mut self, other: &GroupScores) {
        for (group, tally) in &other.groups {
            *self.groups.entry(*group).or_default() += *tally;
        }
    }
}

/// Convenience for tests and callers holding raw tokens.
pub fn section_from<'a, I>(fields: I) -> NormalizedSection
where
    I: IntoIterator<Item = (&'static str, Option<&'a str>)>,
{
    fields
        .into_iter()
        .map(|(field, value)| {
            let normalized = match value {
                Some(token) => NormalizedValue::from_token(token.to_string()),
                None => NormalizedValue::Unknown,
            };
            (field, normalized)
        })
        .collect()
}
