//! Benchmarks for repository discovery.
//!
//! These benchmarks walk synthetic trees of fake repositories, the first
//! step of every gitfleet run.

use std::fs;
use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gitfleet::discovery::{discover, DiscoveryOptions};
use tempfile::TempDir;

/// Creates `groups * per_group` repositories, each with some plain
/// subdirectories underneath.
fn create_tree(root: &Path, groups: usize, per_group: usize) {
    for g in 0..groups {
        for r in 0..per_group {
            let repo = root.join(format!("group{}/repo{}", g, r));
            fs::create_dir_all(repo.join(".git/objects")).unwrap();
            for d in 0..3 {
                fs::create_dir_all(repo.join(format!("src/module{}", d))).unwrap();
            }
        }
    }
}

fn bench_discovery(c: &mut Criterion) {
    let mut group = c.benchmark_group("discover");

    for &repos in &[10usize, 100, 500] {
        let temp = TempDir::new().unwrap();
        create_tree(temp.path(), repos / 10, 10);

        group.bench_with_input(BenchmarkId::new("recursive", repos), &repos, |b, _| {
            let options = DiscoveryOptions {
                depth: -1,
                subrepos: false,
            };
            b.iter(|| discover(black_box(temp.path()), options))
        });

        group.bench_with_input(BenchmarkId::new("subrepos", repos), &repos, |b, _| {
            let options = DiscoveryOptions {
                depth: -1,
                subrepos: true,
            };
            b.iter(|| discover(black_box(temp.path()), options))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_discovery);
criterion_main!(benches);
