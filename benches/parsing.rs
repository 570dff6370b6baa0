//! Benchmarking RINEX parsing
//! using tiny observation and navigation files
extern crate criterion;
use criterion::{criterion_group, criterion_main, Criterion};

use std::path::Path;

use tec_suite::prelude::{NavigationFile, ObservationFile};

fn observation_parsing(path: &str) {
    let mut file = ObservationFile::open(Path::new(path)).unwrap();
    for record in file.records() {
        let _ = record.unwrap();
    }
}

fn navigation_parsing(path: &str) {
    let _ = NavigationFile::open(Path::new(path)).unwrap();
}

fn benchmark(c: &mut Criterion) {
    let mut parsing_grp = c.benchmark_group("parsing");

    // Small RINEX OBS (V2)
    parsing_grp.bench_function("OBS/V2", |b| {
        b.iter(|| {
            observation_parsing("test_resources/OBS/V2/zimj1000.16o");
        })
    });

    // Small RINEX OBS (V3)
    parsing_grp.bench_function("OBS/V3", |b| {
        b.iter(|| {
            observation_parsing("test_resources/OBS/V3/cebr0920.16o");
        })
    });

    // GPS NAV (V2)
    parsing_grp.bench_function("NAV/V2", |b| {
        b.iter(|| {
            navigation_parsing("test_resources/NAV/V2/zimj1000.16n");
        })
    });

    // Mixed NAV (V3)
    parsing_grp.bench_function("NAV/V3", |b| {
        b.iter(|| {
            navigation_parsing("test_resources/NAV/V3/BRDM00DLR_S_20161000000_01D_MN.rnx");
        })
    });

    parsing_grp.finish();
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
