//! Coupling benchmarks: full analysis over synthetic layered graphs, and an
//! incremental update after a single file changes.
//!
//! Run with: cargo bench -p strata-analysis --bench coupling_bench

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use strata_analysis::coupling::{
    CouplingAnalyzer, ExportFact, ExportKind, FileFacts, ImportFact, IncrementalCoordinator,
};
use strata_core::config::{CouplingConfig, Granularity};

fn unresolved(_: &str, _: &str) -> Option<String> {
    None
}

fn path(i: usize) -> String {
    format!("pkg_{:03}/mod_{i:05}.ts", i / 50)
}

/// Each module imports a few lower-numbered modules; every 97th also
/// imports upward to seed cycles.
fn synthetic_files(count: usize) -> Vec<FileFacts> {
    (0..count)
        .map(|i| {
            let mut file = FileFacts::new(path(i))
                .with_language("typescript")
                .with_hash(i as u64)
                .with_export(ExportFact::new(format!("fn_{i}"), ExportKind::Function));
            if i % 5 == 0 {
                file = file.with_export(ExportFact::new(format!("Iface{i}"), ExportKind::Interface));
            }
            for step in [1, 7, 31] {
                if i >= step {
                    let target = i - step;
                    file = file.with_import(
                        ImportFact::new(format!("./mod_{target:05}"), &[format!("fn_{target}").as_str()]).resolved(path(target)),
                    );
                }
            }
            if i % 97 == 0 && i + 3 < count {
                let target = i + 3;
                file = file.with_import(
                    ImportFact::new(format!("./mod_{target:05}"), &[format!("fn_{target}").as_str()]).resolved(path(target)),
                );
            }
            file
        })
        .collect()
}

fn config(granularity: Granularity) -> CouplingConfig {
    CouplingConfig {
        granularity: Some(granularity),
        ..CouplingConfig::default()
    }
}

fn full_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("coupling_full");
    group.sample_size(10);

    for size in [500, 2000, 5000] {
        let files = synthetic_files(size);
        group.bench_with_input(BenchmarkId::new("file_granularity", size), &size, |b, _| {
            let analyzer = CouplingAnalyzer::new(config(Granularity::File));
            b.iter(|| analyzer.analyze(&files, &unresolved));
        });
        group.bench_with_input(BenchmarkId::new("directory_granularity", size), &size, |b, _| {
            let analyzer = CouplingAnalyzer::new(config(Granularity::Directory));
            b.iter(|| analyzer.analyze(&files, &unresolved));
        });
    }
    group.finish();
}

fn incremental_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("coupling_incremental");
    group.sample_size(10);

    let base = synthetic_files(5000);
    let mut changed = base.clone();
    changed[2500] = changed[2500].clone().with_hash(u64::MAX);

    group.bench_function("single_file_change", |b| {
        let mut coordinator = IncrementalCoordinator::new(CouplingAnalyzer::new(config(Granularity::File)));
        coordinator.update(&base, &unresolved);
        let mut flip = false;
        b.iter(|| {
            flip = !flip;
            let files = if flip { &changed } else { &base };
            coordinator.update(files, &unresolved).0
        });
    });
    group.finish();
}

criterion_group!(benches, full_analysis, incremental_update);
criterion_main!(benches);
