//! Performance benchmarks for impact-claims inference.
//!
//! Run with: cargo bench --package impact-claims
//!
//! Benchmarks cover:
//! - Decision forest evaluation at various ensemble sizes
//! - Gateway classification with loaded models
//! - Archive extraction and event location

use std::io::{Cursor, Write};
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use impact_claims::ml::{DecisionTree, TreeNode};
use impact_claims::{
    ArchiveExtractor, ClassifierGateway, DecisionForest, DecisionFunction, EventLocator,
};
use impact_signal::{
    FeatureExtractor, SyntheticEventConfig, SyntheticEventGenerator, SyntheticLabel,
};
use zip::write::FileOptions;
use zip::ZipWriter;

// =============================================================================
// Test Data Generators
// =============================================================================

/// Balanced tree of the given depth splitting on rotating features
fn balanced_tree(depth: usize, n_features: usize) -> DecisionTree {
    let mut nodes = Vec::new();
    let internal = (1usize << depth) - 1;
    let total = (1usize << (depth + 1)) - 1;
    for idx in 0..total {
        if idx < internal {
            nodes.push(TreeNode::Split {
                feature: idx % n_features,
                threshold: 5.0 + (idx % 7) as f64,
                left: 2 * idx + 1,
                right: 2 * idx + 2,
            });
        } else {
            let w = (idx % 5) as f64;
            nodes.push(TreeNode::Leaf {
                value: vec![w + 1.0, 5.0 - w],
            });
        }
    }
    DecisionTree { nodes }
}

fn forest(n_trees: usize, depth: usize, n_features: usize) -> DecisionForest {
    DecisionForest {
        classes: vec![0, 1],
        n_features,
        trees: (0..n_trees).map(|_| balanced_tree(depth, n_features)).collect(),
    }
}

fn event_zip(label: SyntheticLabel) -> Vec<u8> {
    let dir = tempfile::tempdir().unwrap();
    SyntheticEventGenerator::new(SyntheticEventConfig::default(), Some(11))
        .write_event(dir.path(), label)
        .unwrap();

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for name in [impact_signal::IMU_FILE, impact_signal::META_FILE] {
        writer
            .start_file(format!("event/{}", name), FileOptions::default())
            .unwrap();
        writer
            .write_all(&std::fs::read(dir.path().join(name)).unwrap())
            .unwrap();
    }
    writer.finish().unwrap().into_inner()
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_forest(c: &mut Criterion) {
    let mut group = c.benchmark_group("Decision Forest");
    let x = [12.0, 9.9, 0.8, 400.0, 1.2, 0.3, 0.2, 14.0];

    for n_trees in [10, 100, 300] {
        let model = forest(n_trees, 8, 8);
        group.throughput(Throughput::Elements(n_trees as u64));
        group.bench_with_input(BenchmarkId::new("predict", n_trees), &model, |b, model| {
            b.iter(|| model.predict(black_box(&x)))
        });
    }

    group.finish();
}

fn bench_gateway(c: &mut Criterion) {
    let gateway = ClassifierGateway::from_functions(
        Arc::new(forest(100, 8, 8)),
        Arc::new(forest(100, 8, 4)),
    )
    .unwrap();

    let series = SyntheticEventGenerator::new(SyntheticEventConfig::default(), Some(3))
        .generate(SyntheticLabel::Heavy)
        .unwrap();
    let features = FeatureExtractor::inference().extract(&series).unwrap();

    c.bench_function("Gateway classify", |b| {
        b.iter(|| {
            gateway
                .classify(black_box(&features.crash), black_box(&features.severity))
                .unwrap()
        })
    });
}

fn bench_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("Ingest");
    let bytes = event_zip(SyntheticLabel::Light);
    let extractor = ArchiveExtractor::default();
    let locator = EventLocator::new();

    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("extract_and_locate", |b| {
        b.iter(|| {
            let dir = tempfile::tempdir().unwrap();
            extractor.extract_bytes(black_box(&bytes), dir.path()).unwrap();
            locator.resolve(dir.path()).unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_forest, bench_gateway, bench_ingest);
criterion_main!(benches);
