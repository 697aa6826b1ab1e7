//! Benchmarks for the per-test-case hot path
//!
//! This benchmark suite measures:
//! - Normalizing a full parsed record
//! - Comparing two normalized records
//! - Analyzing a whole in-memory suite as the corpus grows

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use uabench::analyze::{AnalyzeOptionsBuilder, Analyzer, GroundTruth};
use uabench::data::schemas::ResultEnvelope;
use uabench::data::{FieldValue, ParsedRecord};
use uabench::{compare, MemoryResultStore, Normalizer, ResultStore, SynonymMap};

fn sample_record(i: usize) -> ParsedRecord {
    let mut record = ParsedRecord::default();
    record.client.name = FieldValue::from(["Chrome", "Mobile Safari", "Firefox"][i % 3]);
    record.client.version = FieldValue::from(format!("{}.0.{}", 50 + i % 20, i).as_str());
    record.client.is_bot = FieldValue::Bool(false);
    record.engine.name = FieldValue::from("Blink");
    record.platform.name = FieldValue::from(["Windows", "Android", "iOS"][i % 3]);
    record.platform.version = FieldValue::from("10.0.19045");
    record.device.kind = FieldValue::from("desktop");
    record.device.ismobile = FieldValue::Bool(i % 3 != 0);
    record
}

fn synonyms() -> SynonymMap {
    SynonymMap::from_json_str(
        r#"{"client": {"name": {"mobilesafari": "safari", "chromemobile": "chrome"}}}"#,
    )
    .unwrap()
}

fn bench_normalize(c: &mut Criterion) {
    let normalizer = Normalizer::new(synonyms());
    let record = sample_record(1);
    c.bench_function("normalize_record", |b| {
        b.iter(|| normalizer.normalize_record(black_box(&record)))
    });
}

fn bench_compare(c: &mut Criterion) {
    let normalizer = Normalizer::new(synonyms());
    let expected = normalizer.normalize_record(&sample_record(1));
    let actual = normalizer.normalize_record(&sample_record(4));
    c.bench_function("compare_records", |b| {
        b.iter(|| compare(black_box(&expected), black_box(&actual)))
    });
}

fn bench_suite_scalability(c: &mut Criterion) {
    let normalizer = Normalizer::new(synonyms());

    for size in [100, 1_000, 10_000].iter() {
        let mut store = MemoryResultStore::new();
        for i in 0..*size {
            let test = format!("ua-{i}");
            store
                .put("run", "suite", "reference", &test, &ResultEnvelope::with_parsed(sample_record(i)))
                .unwrap();
            store
                .put("run", "suite", "candidate", &test, &ResultEnvelope::with_parsed(sample_record(i + 1)))
                .unwrap();
        }
        let options = AnalyzeOptionsBuilder::default()
            .run("run")
            .ground_truth(GroundTruth::Parser("reference".to_string()))
            .build()
            .unwrap();

        c.bench_with_input(BenchmarkId::new("analyze_suite", size), size, |b, &_size| {
            b.iter(|| {
                Analyzer::new(&store, &normalizer, options.clone())
                    .analyze_suite("suite")
                    .unwrap()
            })
        });
    }
}

criterion_group!(benches, bench_normalize, bench_compare, bench_suite_scalability);
criterion_main!(benches);
