//! # Raycast Benchmark
//!
//! Voxel DDA at full reach through open air and into terrain, plus a full
//! engine tick with targeting enabled.

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use strata::targeting::{pick, raycast};
use strata::{BlockFace, Engine, EngineConfig, RenderBackend, SparseWorld, VoxelWorld};
use strata_core::{KinematicPhysics, VisualBackend, VisualHandle};
use strata_shared::{BlockPos, Vec3};

fn terrain() -> SparseWorld {
    let mut world = SparseWorld::new();
    world.fill(1, BlockPos::new(-32, -4, -32), BlockPos::new(32, 0, 32));
    world
}

struct HeadlessRenderer {
    aim: Vec3,
}

impl VisualBackend for HeadlessRenderer {
    fn set_visual_position(&mut self, _visual: VisualHandle, _position: Vec3) {}
    fn dispose_visual(&mut self, _visual: VisualHandle) {}
}

impl RenderBackend for HeadlessRenderer {
    fn aim_direction(&self) -> Vec3 {
        self.aim
    }

    fn highlight_block_face(&mut self, _face: Option<BlockFace>) {}
}

fn bench_raycast(c: &mut Criterion) {
    let world = terrain();
    let origin = Vec3::new(0.3, 1.7, 0.2);

    c.bench_function("raycast_miss_open_air", |b| {
        let dir = Vec3::new(0.6, 0.3, 0.7);
        b.iter(|| black_box(raycast(|p| world.is_solid(p), black_box(origin), dir, 10.0)));
    });

    c.bench_function("raycast_diagonal_hit", |b| {
        let dir = Vec3::new(0.7, -0.2, 0.4);
        b.iter(|| black_box(pick(&world, black_box(origin), dir, 10.0, true)));
    });
}

fn bench_engine_tick(c: &mut Criterion) {
    let config = EngineConfig {
        player_start: Vec3::new(0.5, 1.0, 0.5),
        ..EngineConfig::default()
    };
    let renderer = HeadlessRenderer {
        aim: Vec3::new(0.5, -0.4, 0.3),
    };
    let Ok(mut engine) = Engine::new(config, terrain(), renderer, KinematicPhysics::new()) else {
        return;
    };

    c.bench_function("engine_tick_with_targeting", |b| {
        b.iter(|| {
            engine.tick();
            black_box(engine.targeted_block())
        });
    });
}

criterion_group!(benches, bench_raycast, bench_engine_tick);
criterion_main!(benches);
