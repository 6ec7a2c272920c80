//! Benchmarks for the session hot paths.
//!
//! Snake frames and RPG command/advance cycles are what the soak runner
//! spends its time on.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::hint::black_box;
use std::time::Duration;

use arcade::soak::{run_soak, soak_rpg, soak_snake, SoakConfig, SoakStats};
use arcade::{Direction, RpgCommand, RpgConfig, RpgSession, SnakeConfig, SnakeSession};
use criterion::{criterion_group, criterion_main, Criterion};

fn bench_snake_frames(c: &mut Criterion) {
    c.bench_function("snake_1000_frames", |b| {
        b.iter(|| {
            let mut snake = SnakeSession::seeded(SnakeConfig::default(), black_box(42)).unwrap();
            snake.start();
            for i in 0..1000u32 {
                if i % 9 == 0 {
                    snake.set_direction(if i % 2 == 0 { Direction::Left } else { Direction::Up });
                }
                snake.advance(Duration::from_millis(200));
                if !snake.is_alive() {
                    snake.start();
                }
            }
            black_box(snake.score())
        });
    });
}

fn bench_rpg_walk(c: &mut Criterion) {
    c.bench_function("rpg_walk_and_fight", |b| {
        b.iter(|| {
            let mut rpg = RpgSession::seeded(RpgConfig::default(), black_box(7)).unwrap();
            for i in 0..500u32 {
                let command = match i % 5 {
                    0 => RpgCommand::Move(Direction::Left),
                    1 => RpgCommand::Move(Direction::Up),
                    2 => RpgCommand::Attack,
                    3 => RpgCommand::Move(Direction::Right),
                    _ => RpgCommand::Move(Direction::Down),
                };
                let _ = rpg.dispatch(command);
                let _ = rpg.advance(Duration::from_millis(400));
            }
            black_box(rpg.stats())
        });
    });
}

fn bench_soak_seed(c: &mut Criterion) {
    let config = SoakConfig::default();
    c.bench_function("soak_single_seed", |b| {
        b.iter(|| {
            let mut stats = SoakStats::default();
            soak_rpg(black_box(3), config.steps, &config.rpg, &mut stats);
            soak_snake(black_box(3), config.steps, &config.snake, &mut stats);
            black_box(stats)
        });
    });
}

fn bench_soak_parallel(c: &mut Criterion) {
    let config = SoakConfig {
        sessions: 64,
        steps: 200,
        ..SoakConfig::default()
    };
    let mut group = c.benchmark_group("soak");
    group.sample_size(10);
    group.bench_function("parallel_64_seeds", |b| {
        b.iter(|| black_box(run_soak(&config, || {})));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_snake_frames,
    bench_rpg_walk,
    bench_soak_seed,
    bench_soak_parallel
);
criterion_main!(benches);
