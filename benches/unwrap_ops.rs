//! Benchmarks for the unwrapping pipeline and its stages.

use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::Vector3;
use unfold::algo::parameterize::lscm;
use unfold::mesh::primitives;
use unfold::prelude::*;

fn bench_topology(c: &mut Criterion) {
    let sphere = primitives::icosphere(4);

    c.bench_function("build_topology_icosphere4", |b| {
        b.iter(|| build_topology(&sphere).unwrap())
    });

    let topology = build_topology(&sphere).unwrap();
    c.bench_function("seams_and_islands_icosphere4", |b| {
        b.iter(|| {
            let seams = detect_seams(&topology);
            extract_islands(&topology, &seams).num_islands()
        })
    });
}

fn bench_lscm(c: &mut Criterion) {
    let grid = primitives::grid(40, 40).unwrap();
    let faces: Vec<FaceId> = grid.face_ids().collect();

    c.bench_function("lscm_grid_40x40", |b| {
        b.iter(|| lscm(&grid, &faces, &LSCMOptions::default()).unwrap())
    });
}

fn bench_unwrap(c: &mut Criterion) {
    let parts: Vec<_> = (0..8)
        .map(|i| {
            (
                primitives::open_cylinder(24, 12, 1.0, 2.0).unwrap(),
                Vector3::new(3.0 * i as f64, 0.0, 0.0),
            )
        })
        .collect();
    let mesh = primitives::disjoint_union(&parts).unwrap();

    c.bench_function("unwrap_8_cylinders_parallel", |b| {
        let options = UnwrapOptions::default().with_metrics(false);
        b.iter(|| unwrap(&mesh, &options).unwrap())
    });

    c.bench_function("unwrap_8_cylinders_sequential", |b| {
        let options = UnwrapOptions::default().with_metrics(false).sequential();
        b.iter(|| unwrap(&mesh, &options).unwrap())
    });

    c.bench_function("unwrap_icosphere3_with_metrics", |b| {
        let sphere = primitives::icosphere(3);
        b.iter(|| unwrap(&sphere, &UnwrapOptions::default()).unwrap())
    });
}

criterion_group!(benches, bench_topology, bench_lscm, bench_unwrap);
criterion_main!(benches);
