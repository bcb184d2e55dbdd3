//! Headless runner implementation.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use harvest_core::config::EngineConfig;
use harvest_core::orchestrator::{TurnInput, TurnOrchestrator};
use harvest_core::selection::SeededSelection;
use tracing::{debug, info, warn};

use crate::protocol::{TurnOutput, VerifyOutput};
use crate::scenario::{Scenario, ScenarioError};

/// Headless runner configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessConfig {
    /// Engine tuning.
    pub engine: EngineConfig,
    /// Tie-break seed.
    pub seed: u64,
    /// Consecutive turns to play over the scenario's board.
    pub turns: u32,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            seed: 0,
            turns: 1,
        }
    }
}

/// Plays scenario turns through the engine.
///
/// The board is never advanced; when more than one turn is requested the
/// same snapshot is replayed with an advancing turn counter, which exercises
/// the unit states the engine carries between turns.
#[derive(Debug, Clone, Default)]
pub struct HeadlessRunner {
    config: HeadlessConfig,
}

impl HeadlessRunner {
    /// Create a runner with default config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a runner with custom configuration.
    #[must_use]
    pub fn with_config(config: HeadlessConfig) -> Self {
        Self { config }
    }

    /// Runner configuration.
    #[must_use]
    pub const fn config(&self) -> &HeadlessConfig {
        &self.config
    }

    /// Decide every configured turn of `scenario`.
    pub fn decide(&self, scenario: &Scenario) -> Result<Vec<TurnOutput>, ScenarioError> {
        let input = scenario.to_turn_input()?;
        info!(
            scenario = %scenario.name,
            player = input.me,
            turn = input.turn,
            turns = self.config.turns,
            seed = self.config.seed,
            "deciding"
        );

        let mut orchestrator =
            TurnOrchestrator::new(self.config.engine, SeededSelection::new(self.config.seed));
        let mut outputs = Vec::with_capacity(self.config.turns as usize);
        for input in turns(&input, self.config.turns) {
            let report = orchestrator.play_turn(&input)?;
            if let Some(reason) = &report.scheduling_error {
                warn!(turn = input.turn, %reason, "production skipped");
            }
            let output = TurnOutput::from_report(input.turn, input.me, &report);
            debug!(turn = input.turn, actions = output.actions.len(), "turn decided");
            outputs.push(output);
        }
        Ok(outputs)
    }

    /// Replay the scenario `runs` times and compare report hashes.
    pub fn verify(&self, scenario: &Scenario, runs: u32) -> Result<VerifyOutput, ScenarioError> {
        let input = scenario.to_turn_input()?;
        let mut hashes = Vec::with_capacity(runs as usize);
        for run in 0..runs {
            let hash = self.replay_hash(&input)?;
            debug!(run, hash, "run hashed");
            hashes.push(hash);
        }

        let deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
        if deterministic {
            info!(runs, "all runs identical");
        } else {
            warn!(runs, ?hashes, "runs diverged");
        }
        Ok(VerifyOutput {
            runs,
            turns: self.config.turns,
            seed: self.config.seed,
            deterministic,
            hashes,
        })
    }

    fn replay_hash(&self, input: &TurnInput) -> Result<u64, ScenarioError> {
        let mut orchestrator =
            TurnOrchestrator::new(self.config.engine, SeededSelection::new(self.config.seed));
        let mut hasher = DefaultHasher::new();
        for input in turns(input, self.config.turns) {
            orchestrator.play_turn(&input)?.hash(&mut hasher);
        }
        Ok(hasher.finish())
    }
}

/// The scenario's turn followed by `count - 1` later turns on the same board.
fn turns(input: &TurnInput, count: u32) -> impl Iterator<Item = TurnInput> + '_ {
    (0..count).map(move |offset| {
        let mut next = input.clone();
        next.turn = input.turn.saturating_add(offset);
        next
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_core::board::UnitId;
    use harvest_core::strategy::UnitState;
    use harvest_test_utils::determinism::verify_turn_determinism;

    fn runner(turns: u32) -> HeadlessRunner {
        HeadlessRunner::with_config(HeadlessConfig {
            turns,
            ..HeadlessConfig::default()
        })
    }

    #[test]
    fn test_opening_converts_the_only_unit() {
        let outputs = runner(1).decide(&Scenario::opening()).unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].actions["1"], "CONVERT");
        assert_eq!(outputs[0].states["1"], UnitState::Convert.to_string());
    }

    #[test]
    fn test_multi_turn_decide_advances_turn_counter() {
        let outputs = runner(3).decide(&Scenario::midgame()).unwrap();
        let turns: Vec<u32> = outputs.iter().map(|o| o.turn).collect();
        assert_eq!(turns, vec![150, 151, 152]);
        assert!(outputs.iter().all(|o| o.player == 0));
    }

    #[test]
    fn test_verify_midgame_is_deterministic() {
        let verdict = runner(5).verify(&Scenario::midgame(), 4).unwrap();
        assert!(verdict.deterministic);
        assert_eq!(verdict.hashes.len(), 4);
    }

    #[test]
    fn test_verify_hashes_match_the_replay_harness() {
        let scenario = Scenario::midgame();
        let runner = HeadlessRunner::with_config(HeadlessConfig {
            seed: 11,
            turns: 4,
            ..HeadlessConfig::default()
        });
        let verdict = runner.verify(&scenario, 2).unwrap();

        let input = scenario.to_turn_input().unwrap();
        let expected = verify_turn_determinism(EngineConfig::default(), 11, &input, 2, 4);
        expected.assert_deterministic();
        assert_eq!(verdict.hashes, expected.hashes);
    }

    #[test]
    fn test_missing_score_is_reported_not_fatal() {
        let mut scenario = Scenario::midgame();
        scenario.scores.retain(|(p, _)| *p != 0);
        let outputs = runner(1).decide(&scenario).unwrap();
        assert!(outputs[0].scheduling_error.is_some());
        assert!(outputs[0].states.contains_key(&UnitId(1).0.to_string()));
    }

    #[test]
    fn test_invalid_scenario_surfaces_engine_error() {
        let mut scenario = Scenario::opening();
        scenario.constants.size = 0;
        assert!(matches!(
            runner(1).decide(&scenario),
            Err(ScenarioError::Engine(_))
        ));
    }
}
