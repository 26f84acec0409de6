//! Scalability benchmarks: spatial grid rebuild/query, intercept solving,
//! and full simulation ticks at several bot counts.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use quadrant_server::game::game_loop::{GameLoop, GameLoopConfig};
use quadrant_server::game::intercept;
use quadrant_server::game::ships::ShipTable;
use quadrant_server::game::spatial::PlayerGrid;
use quadrant_server::util::vec2::Vec2;

fn bench_spatial_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("spatial_grid");

    for &count in &[8usize, 32, 128] {
        let positions: Vec<(u8, Vec2)> = (0..count)
            .map(|i| {
                let angle = i as f32 * 0.7;
                (
                    (i % 256) as u8,
                    Vec2::new(
                        50_000.0 + angle.cos() * (i as f32 * 311.0),
                        50_000.0 + angle.sin() * (i as f32 * 277.0),
                    ),
                )
            })
            .collect();

        group.bench_with_input(BenchmarkId::new("rebuild", count), &positions, |b, positions| {
            let mut grid = PlayerGrid::default();
            b.iter(|| {
                grid.rebuild(positions.iter().copied());
                black_box(grid.len())
            });
        });

        group.bench_with_input(BenchmarkId::new("nearby", count), &positions, |b, positions| {
            let mut grid = PlayerGrid::default();
            grid.rebuild(positions.iter().copied());
            b.iter(|| {
                let hits = grid.nearby(black_box(Vec2::new(50_000.0, 50_000.0)));
                black_box(hits.len())
            });
        });
    }
    group.finish();
}

fn bench_intercept_solver(c: &mut Criterion) {
    c.bench_function("intercept_solve", |b| {
        b.iter(|| {
            intercept::solve(
                black_box(Vec2::new(0.0, 0.0)),
                black_box(Vec2::new(7_000.0, 3_000.0)),
                black_box(Vec2::new(-120.0, 45.0)),
                black_box(300.0),
            )
        });
    });
}

fn bench_full_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_tick");
    group.sample_size(20);

    for &bots in &[8usize, 16, 32] {
        group.bench_with_input(BenchmarkId::from_parameter(bots), &bots, |b, &bots| {
            let mut game = GameLoop::new(ShipTable::builtin(), GameLoopConfig { bot_fill: bots });
            // Warm up: populate and let combat develop
            for _ in 0..50 {
                game.tick();
            }
            b.iter(|| {
                black_box(game.tick().len());
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_spatial_grid,
    bench_intercept_solver,
    bench_full_tick
);
criterion_main!(benches);
