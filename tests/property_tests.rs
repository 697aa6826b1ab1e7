//! Property-based tests for uabench
//!
//! These tests use the `proptest` crate to generate random inputs and verify
//! the normalization, comparison and scoring invariants across a wide range
//! of inputs.

use proptest::prelude::*;
use uabench::data::{FieldGroup, FieldValue, ParsedRecord};
use uabench::{compare, ComparisonTable, NormalizedValue, Normalizer, ScoreTally, SynonymMap};

fn group_and_field() -> impl Strategy<Value = (FieldGroup, &'static str)> {
    prop::sample::select(FieldGroup::ALL.to_vec()).prop_flat_map(|group| {
        prop::sample::select(group.field_names().to_vec()).prop_map(move |field| (group, field))
    })
}

fn raw_value() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        Just(FieldValue::Null),
        any::<bool>().prop_map(FieldValue::Bool),
        "[ -~]{0,20}".prop_map(|s| FieldValue::from(s.as_str())),
        "(MSIE|IE|Apple Computer|latest|Macintosh|AppleWebKit|Windows|Windows Phone)"
            .prop_map(|s| FieldValue::from(s.as_str())),
    ]
}

/// Canonicals written the way people write them, not pre-stripped.
fn synonyms() -> SynonymMap {
    SynonymMap::from_yaml_str(
        "client:\n  name:\n    msie: Internet Explorer\n    ie: Internet Explorer\n  version:\n    latest: 99.1.2\n\
         engine:\n  name:\n    applewebkit: WebKit\n\
         platform:\n  name:\n    macintosh: Mac OS X\n\
         device:\n  brand:\n    applecomputer: Apple\n",
    )
    .unwrap()
}

fn record() -> impl Strategy<Value = ParsedRecord> {
    (
        prop::option::of("(Chrome|Firefox|Safari|Edge)"),
        prop::option::of("[0-9]{1,2}(\\.[0-9]{1,3}){0,2}"),
        prop::option::of("(iOS|Android|Linux)"),
    )
        .prop_map(|(name, version, platform)| {
            let mut record = ParsedRecord::default();
            record.client.name = FieldValue::from(name.as_deref());
            record.client.version = FieldValue::from(version.as_deref());
            record.platform.name = FieldValue::from(platform.as_deref());
            record
        })
}

proptest! {
    #[test]
    fn null_stays_unknown((group, field) in group_and_field()) {
        let normalizer = Normalizer::default();
        prop_assert_eq!(
            normalizer.normalize(group, field, &FieldValue::Null, &[]),
            NormalizedValue::Unknown
        );
    }

    #[test]
    fn normalization_is_idempotent(
        (group, field) in group_and_field(),
        raw in raw_value()
    ) {
        let normalizer = Normalizer::new(synonyms());
        let platform_version = FieldValue::from("10.0.19045");
        let siblings = [("version", &platform_version)];
        let once = normalizer.normalize(group, field, &raw, &siblings);
        if let NormalizedValue::Value(token) = &once {
            // the appended platform version does not survive a second strip
            prop_assume!(!(group == FieldGroup::Platform
                && field == "name"
                && token.starts_with("windows")));
            let twice = normalizer.normalize(group, field, &FieldValue::from(token.as_str()), &siblings);
            prop_assert_eq!(twice, once.clone());
        }
    }

    #[test]
    fn versions_keep_at_most_two_components(
        parts in prop::collection::vec(0u32..1000, 1..6)
    ) {
        let raw = parts.iter().map(u32::to_string).collect::<Vec<_>>().join(".");
        let normalizer = Normalizer::default();
        let normalized = normalizer.normalize(FieldGroup::Client, "version", &FieldValue::from(raw.as_str()), &[]);
        let token = normalized.token().unwrap_or_default().to_string();
        prop_assert!(token.matches('.').count() <= 1);
        prop_assert!(raw.starts_with(&token));
    }

    #[test]
    fn tallies_stay_consistent(expected in record(), actual in record()) {
        let normalizer = Normalizer::default();
        let expected = normalizer.normalize_record(&expected);
        let actual = normalizer.normalize_record(&actual);
        for group in FieldGroup::ALL {
            let tally = ScoreTally::from_sections(
                expected.section(group).unwrap(),
                actual.section(group).unwrap(),
            );
            prop_assert!(tally.pass <= tally.attempted());
            prop_assert!(tally.attempted() <= tally.count);
        }
        prop_assert_eq!(compare(&expected, &expected).has_failures(), false);
    }

    #[test]
    fn distribution_counts_add_up(
        cases in prop::collection::vec((record(), record(), record()), 1..8)
    ) {
        let normalizer = Normalizer::default();
        let agents = (0..cases.len()).map(|i| format!("ua-{i}")).collect();
        let mut table = ComparisonTable::new(agents);

        for (agent, (expected, first, second)) in cases.iter().enumerate() {
            let expected = normalizer.normalize_record(expected);
            for (parser, actual) in [("first", first), ("second", second)] {
                let actual = normalizer.normalize_record(actual);
                table.record(parser, agent, &compare(&expected, &actual).pairs);
            }
        }

        for fields in table.sections.values() {
            for field_table in fields.values() {
                for distribution in field_table.values() {
                    let actual_total: usize = distribution
                        .parsers
                        .values()
                        .flat_map(|buckets| buckets.values())
                        .map(|bucket| bucket.count)
                        .sum();
                    prop_assert_eq!(actual_total, distribution.expected.count);
                    prop_assert_eq!(distribution.expected.agents.len(), distribution.expected.count);
                }
            }
        }
    }
}
