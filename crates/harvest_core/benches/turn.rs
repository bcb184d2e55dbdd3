//! Turn pipeline benchmarks for harvest_core.
//!
//! Run with: `cargo bench -p harvest_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use harvest_core::prelude::*;

const SIZE: u32 = 21;

fn crowded_board() -> BoardSnapshot {
    let side = i32::try_from(SIZE).unwrap();
    let resources = (0..side * side)
        .map(|i| Fixed::from_num((i * 37) % 500))
        .collect();

    let mut units = Vec::new();
    let mut bases = Vec::new();
    for player in 0..4_u32 {
        let (ox, oy) = [(5, 5), (15, 5), (5, 15), (15, 15)][player as usize];
        bases.push(Base::new(
            BaseId(u64::from(player)),
            player,
            Position::new(ox, oy),
        ));
        for k in 0..10_i32 {
            let id = u64::from(player) * 100 + u64::try_from(k).unwrap();
            units.push(Unit::new(
                UnitId(id),
                player,
                Position::new(ox + k % 5 - 2, oy + k / 5 + 1),
                Fixed::from_num(k * 40),
            ));
        }
    }
    BoardSnapshot::new(SIZE, resources, units, bases).unwrap()
}

fn turn_input(turn: u32) -> TurnInput {
    let totals: BTreeMap<PlayerId, Fixed> = (0..4)
        .map(|p| (p, Fixed::from_num(2000 + p * 300)))
        .collect();
    TurnInput {
        snapshot: crowded_board(),
        me: 0,
        turn,
        scoreboard: Scoreboard::new(totals),
        constants: GameConstants::default(),
    }
}

/// Full decision pass for a forty-unit, four-player board.
pub fn turn_benchmark(c: &mut Criterion) {
    let mid_game = turn_input(150);
    c.bench_function("play_turn_mid_game", |b| {
        b.iter(|| {
            let mut orchestrator =
                TurnOrchestrator::new(EngineConfig::default(), SeededSelection::new(7));
            black_box(orchestrator.play_turn(black_box(&mid_game)).unwrap())
        });
    });

    let end_game = turn_input(395);
    c.bench_function("play_turn_end_game", |b| {
        b.iter(|| {
            let mut orchestrator =
                TurnOrchestrator::new(EngineConfig::default(), SeededSelection::new(7));
            black_box(orchestrator.play_turn(black_box(&end_game)).unwrap())
        });
    });
}

criterion_group!(benches, turn_benchmark);
criterion_main!(benches);
