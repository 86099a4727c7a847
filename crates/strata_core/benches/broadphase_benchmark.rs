//! # Broad-Phase Benchmark
//!
//! Sort-and-sweep over scattered and clustered entity boxes, plus a full
//! store step with collision dispatch.

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use strata_core::{CollisionBroadphase, EntitySpec, EntityStore, KinematicPhysics, VisualBackend, VisualHandle};
use strata_shared::{Aabb, Vec3};

/// Deterministic box layout (xorshift, no external RNG).
fn scattered_boxes(count: usize, spread: f32, seed: u64) -> Vec<Aabb> {
    let mut state = seed;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state % 10_000) as f32 / 10_000.0
    };

    (0..count)
        .map(|_| {
            let base = Vec3::new(next() * spread, next() * 16.0, next() * spread);
            Aabb::new(base, Vec3::new(0.6, 1.8, 0.6))
        })
        .collect()
}

struct NullVisuals;

impl VisualBackend for NullVisuals {
    fn set_visual_position(&mut self, _visual: VisualHandle, _position: Vec3) {}
    fn dispose_visual(&mut self, _visual: VisualHandle) {}
}

fn bench_detect(c: &mut Criterion) {
    let mut group = c.benchmark_group("broadphase_detect");
    for count in [100_usize, 1_000, 5_000] {
        let boxes = scattered_boxes(count, 256.0, 0x5EED);
        let mut broadphase = CollisionBroadphase::new();
        group.bench_with_input(BenchmarkId::new("scattered", count), &boxes, |b, boxes| {
            b.iter(|| black_box(broadphase.detect(black_box(boxes)).len()));
        });

        let clustered = scattered_boxes(count, 8.0, 0xC0FFEE);
        group.bench_with_input(BenchmarkId::new("clustered", count), &clustered, |b, boxes| {
            b.iter(|| black_box(broadphase.detect(black_box(boxes)).len()));
        });
    }
    group.finish();
}

fn bench_store_step(c: &mut Criterion) {
    let mut store = EntityStore::new(KinematicPhysics::new());
    for aabb in scattered_boxes(1_000, 128.0, 42) {
        store.add(
            EntitySpec::new(aabb.feet(), 0.6, 1.8)
                .with_physics_body()
                .colliding_with_entities(),
        );
    }
    let mut visuals = NullVisuals;

    c.bench_function("store_step_1k_bodies", |b| {
        b.iter(|| black_box(store.step(33.3, &mut visuals)));
    });
}

criterion_group!(benches, bench_detect, bench_store_step);
criterion_main!(benches);
