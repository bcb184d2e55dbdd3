//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the decision engine
//! produces identical actions given identical inputs.
//!
//! # Testing Strategy
//!
//! Replays and tournament reruns only make sense if a turn is a pure
//! function of its input and the policy seed.
//! Sources of non-determinism include:
//!
//! - **Floating-point math**: Different CPUs can produce different results.
//!   We use fixed-point arithmetic via [`harvest_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   We always iterate in sorted id and position order.
//!
//! - **System randomness**: Every tie-break goes through a
//!   [`SelectionPolicy`]; seeded policies are reproducible.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual component determinism (scan, classify, ...)
//! 2. **Property tests**: Random boards must still produce deterministic turns
//! 3. **Parallel tests**: Running N orchestrators on threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use harvest_core::config::EngineConfig;
use harvest_core::orchestrator::{TurnInput, TurnOrchestrator};
use harvest_core::selection::{SeededSelection, SelectionPolicy};

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of turns played per run.
    pub turns: u32,
}

impl DeterminismResult {
    /// Collect per-run hashes.
    #[must_use]
    pub fn from_hashes(hashes: Vec<u64>, turns: u32) -> Self {
        Self {
            is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
            hashes,
            turns,
        }
    }

    /// Get all unique hashes (should be 1 for a deterministic engine).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Decisions are non-deterministic!\n\
                 Runs: {}\n\
                 Turns: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.turns,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Play `turns` consecutive turns over the same snapshot and hash every report.
///
/// The snapshot stays frozen; only the turn counter advances, so fleet state
/// carried between turns is exercised as well.
///
/// # Panics
///
/// Panics if a turn fails.
#[must_use]
pub fn replay_hash<P: SelectionPolicy>(
    orchestrator: &mut TurnOrchestrator<P>,
    input: &TurnInput,
    turns: u32,
) -> u64 {
    let mut hasher = DefaultHasher::new();
    let mut input = input.clone();
    let start = input.turn;
    for turn in start..start + turns {
        input.turn = turn;
        let report = orchestrator
            .play_turn(&input)
            .expect("turn should succeed");
        report.hash(&mut hasher);
    }
    hasher.finish()
}

/// Replay the same seeded game `runs` times and compare the report hashes.
#[must_use]
pub fn verify_turn_determinism(
    config: EngineConfig,
    seed: u64,
    input: &TurnInput,
    runs: usize,
    turns: u32,
) -> DeterminismResult {
    let hashes = (0..runs)
        .map(|_| {
            replay_hash(
                &mut TurnOrchestrator::new(config, SeededSelection::new(seed)),
                input,
                turns,
            )
        })
        .collect();
    DeterminismResult::from_hashes(hashes, turns)
}

/// Run N seeded replays on scoped threads and compare their hashes.
///
/// Catches shared-state leaks that only show up under concurrent use.
///
/// # Panics
///
/// Panics if a worker thread panics.
#[must_use]
pub fn run_parallel_replays(
    config: EngineConfig,
    seed: u64,
    input: &TurnInput,
    threads: usize,
    turns: u32,
) -> DeterminismResult {
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                s.spawn(move || {
                    replay_hash(
                        &mut TurnOrchestrator::new(config, SeededSelection::new(seed)),
                        input,
                        turns,
                    )
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("replay thread panicked"))
            .collect()
    });
    DeterminismResult::from_hashes(hashes, turns)
}

/// Proptest strategies for determinism testing.
///
/// These strategies generate random but valid boards for
/// property-based testing of the turn pipeline.
pub mod strategies {
    use harvest_core::board::{Base, BaseId, BoardSnapshot, PlayerId, Unit, UnitId};
    use harvest_core::geometry::Position;
    use harvest_core::math::Fixed;
    use proptest::prelude::*;

    /// Cell resource in a typical range.
    pub fn arb_resource() -> impl Strategy<Value = Fixed> {
        (0i32..600i32).prop_map(Fixed::from_num)
    }

    /// Unit cargo in a typical range.
    pub fn arb_cargo() -> impl Strategy<Value = Fixed> {
        (0i32..900i32).prop_map(Fixed::from_num)
    }

    /// A valid board with up to `max_units` units and `max_bases` bases
    /// split between players 0 and 1.
    ///
    /// Units and bases each occupy distinct cells; a unit may stand on a base.
    pub fn arb_board(
        size: u32,
        max_units: usize,
        max_bases: usize,
    ) -> impl Strategy<Value = BoardSnapshot> {
        let cells = (size as usize) * (size as usize);
        let all: Vec<usize> = (0..cells).collect();
        (
            proptest::collection::vec(arb_resource(), cells),
            proptest::sample::subsequence(all.clone(), 0..=max_units.min(cells)),
            proptest::collection::vec(arb_cargo(), max_units),
            proptest::sample::subsequence(all, 0..=max_bases.min(cells)),
            proptest::collection::vec(0u32..2u32, max_units.max(max_bases)),
        )
            .prop_map(move |(resources, unit_cells, cargo, base_cells, owners)| {
                let side = size as usize;
                let at = |i: usize| Position::new((i % side) as i32, (i / side) as i32);
                let owner = |k: usize| -> PlayerId { owners.get(k).copied().unwrap_or(0) };

                let units = unit_cells
                    .iter()
                    .enumerate()
                    .map(|(k, &i)| {
                        Unit::new(
                            UnitId(k as u64 + 1),
                            owner(k),
                            at(i),
                            cargo.get(k).copied().unwrap_or(Fixed::ZERO),
                        )
                    })
                    .collect();
                let bases = base_cells
                    .iter()
                    .enumerate()
                    .map(|(k, &i)| Base::new(BaseId(k as u64 + 1), owner(k), at(i)))
                    .collect();

                BoardSnapshot::new(size, resources, units, bases)
                    .expect("generated board should be valid")
            })
    }
}
