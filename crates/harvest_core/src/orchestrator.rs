//! One full decision pass per turn.
//!
//! Order of work:
//! 1. prune and seed the fleet state from the live roster;
//! 2. bootstrap conversion if no base is left;
//! 3. in the closing window of the game, send every unit straight home
//!    (and convert the stranded ones on the last actionable turn);
//! 4. otherwise plan production, then run each unit's state machine in
//!    ascending id order, committing as it goes.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, error, info};

use crate::actions::{TurnActions, UnitAction};
use crate::board::{BoardSnapshot, PlayerId, Unit, UnitId};
use crate::config::{EngineConfig, GameConstants};
use crate::error::{EngineError, Result};
use crate::estimator::ResourceEstimator;
use crate::fleet::{FleetScheduler, Scoreboard};
use crate::ledger::TurnLedger;
use crate::math::Fixed;
use crate::movement::{MovementPlanner, StepKind};
use crate::perception::PerceptionScanner;
use crate::selection::SelectionPolicy;
use crate::strategy::{FleetState, UnitState, UnitStrategy};

/// Everything the host hands over for one turn.
#[derive(Debug, Clone)]
pub struct TurnInput {
    /// Frozen board.
    pub snapshot: BoardSnapshot,
    /// The player we decide for.
    pub me: PlayerId,
    /// Zero-based turn index.
    pub turn: u32,
    /// Every player's resource total.
    pub scoreboard: Scoreboard,
    /// Host constants.
    pub constants: GameConstants,
}

/// What a turn produced.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TurnReport {
    /// Action for every owned unit and base.
    pub actions: TurnActions,
    /// Strategy state of every live unit after the turn.
    pub states: BTreeMap<UnitId, UnitState>,
    /// Why production was skipped, when the host's scoreboard was unusable.
    pub scheduling_error: Option<String>,
    /// Whether end-game mode was active.
    pub endgame: bool,
}

impl TurnReport {
    /// Action assigned to a unit.
    #[must_use]
    pub fn unit_action(&self, unit: UnitId) -> Option<UnitAction> {
        self.actions.unit(unit)
    }
}

/// Drives the per-turn pipeline and keeps unit states between turns.
#[derive(Debug, Clone)]
pub struct TurnOrchestrator<P: SelectionPolicy> {
    config: EngineConfig,
    fleet: FleetState,
    policy: P,
}

impl<P: SelectionPolicy> TurnOrchestrator<P> {
    /// Create an orchestrator with a fresh fleet.
    #[must_use]
    pub fn new(config: EngineConfig, policy: P) -> Self {
        Self {
            config,
            fleet: FleetState::new(),
            policy,
        }
    }

    /// Engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Unit states carried between turns.
    #[must_use]
    pub const fn fleet_state(&self) -> &FleetState {
        &self.fleet
    }

    /// Decide every owned unit's and base's action for this turn.
    ///
    /// A missing scoreboard entry for this player skips production and is
    /// reported in [`TurnReport::scheduling_error`]; units still act.
    /// Classification and reservation failures abort the turn.
    pub fn play_turn(&mut self, input: &TurnInput) -> Result<TurnReport> {
        let board = &input.snapshot;
        let me = input.me;
        let constants = input.constants;
        let convert_cost = constants.convert_cost();

        let live: BTreeSet<UnitId> = board.units_of(me).map(|u| u.id).collect();
        self.fleet.retain_live(&live);

        let (bank, mut scheduling_error) = match input.scoreboard.total(me) {
            Ok(total) => (total, None),
            Err(e) => {
                error!(player = me, turn = input.turn, error = %e, "scoreboard unusable, skipping production");
                (Fixed::ZERO, Some(e.to_string()))
            }
        };

        let estimator = ResourceEstimator::new(constants.harvest_rates());
        let scanner = PerceptionScanner::new(
            board,
            me,
            estimator,
            self.config.strategy.hunt_richer_enemies,
        );
        let planner = MovementPlanner::new(board, me, self.config.movement, convert_cost);
        let scheduler = FleetScheduler::new(board, me, self.config.fleet, constants, scanner);
        let mut ledger = TurnLedger::new(board.geometry(), bank);

        if let Some(id) = scheduler.bootstrap_conversion(&mut ledger, &mut self.policy)? {
            self.fleet.set(id, UnitState::Convert);
        }

        let endgame_start = constants
            .episode_turns
            .saturating_sub(self.config.endgame.window);
        let endgame = input.turn >= endgame_start;

        if endgame {
            if input.turn == endgame_start {
                info!(turn = input.turn, "entering end game");
            }
            self.play_endgame(input, &planner, &mut ledger)?;
        } else {
            if scheduling_error.is_none() {
                match scheduler.plan_production(input.turn, &input.scoreboard, &mut ledger) {
                    Ok(_) => {}
                    Err(e @ EngineError::MissingScore(_)) => {
                        error!(player = me, turn = input.turn, error = %e, "production aborted");
                        scheduling_error = Some(e.to_string());
                    }
                    Err(e) => return Err(e),
                }
            }

            let strategy = UnitStrategy::new(
                board,
                me,
                self.config.strategy,
                self.config.movement,
                scanner,
                planner,
                convert_cost,
            );
            for unit in board.units_of(me) {
                if ledger.has_committed(unit.id) {
                    continue;
                }
                let state = self.fleet.state_of(unit.id);
                let decision = strategy.decide(unit, state, &mut ledger, &mut self.policy)?;
                debug!(
                    unit = %unit.id,
                    from = %state,
                    to = %decision.state,
                    action = %decision.step.action,
                    kind = ?decision.step.kind,
                    radius = decision.radar_radius,
                    "unit decided"
                );
                self.fleet.set(unit.id, decision.state);
            }
        }

        let states = self.fleet.iter().collect();
        Ok(TurnReport {
            actions: ledger.into_actions(board, me),
            states,
            scheduling_error,
            endgame,
        })
    }

    fn play_endgame(
        &mut self,
        input: &TurnInput,
        planner: &MovementPlanner<'_>,
        ledger: &mut TurnLedger,
    ) -> Result<()> {
        let board = &input.snapshot;
        let final_turn = input.constants.episode_turns.saturating_sub(2);
        let convert_cost = input.constants.convert_cost();

        for unit in board.units_of(input.me) {
            if ledger.has_committed(unit.id) {
                continue;
            }
            if input.turn >= final_turn
                && unit.cargo >= convert_cost
                && stranded(board, input.me, unit)
            {
                planner.convert(unit, StepKind::FallbackConvert, ledger)?;
                self.fleet.set(unit.id, UnitState::Convert);
                info!(unit = %unit.id, cargo = %unit.cargo, "converting stranded cargo");
                continue;
            }

            let step = match planner.nearest_home(unit.position, ledger) {
                Some(home) => planner.beeline(unit, home, ledger, &mut self.policy)?,
                None => planner.hold(unit, StepKind::Wait, ledger)?,
            };
            self.fleet.set(unit.id, UnitState::Deposit);
            debug!(unit = %unit.id, action = %step.action, "heading home");
        }
        Ok(())
    }
}

/// No base of ours within one step of `unit`.
fn stranded(board: &BoardSnapshot, me: PlayerId, unit: &Unit) -> bool {
    let geometry = board.geometry();
    board
        .bases_of(me)
        .all(|b| geometry.distance(unit.position, b.position) > 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::BaseAction;
    use crate::board::{Base, BaseId};
    use crate::geometry::{Direction, Position};
    use crate::selection::FirstFound;

    const ME: PlayerId = 0;

    fn fx(v: i32) -> Fixed {
        Fixed::from_num(v)
    }

    fn input(turn: u32, units: Vec<Unit>, bases: Vec<Base>, bank: i32) -> TurnInput {
        let constants = GameConstants {
            size: 9,
            ..GameConstants::default()
        };
        TurnInput {
            snapshot: BoardSnapshot::new(9, vec![fx(5); 81], units, bases).unwrap(),
            me: ME,
            turn,
            scoreboard: [(ME, fx(bank)), (1, fx(0))].into_iter().collect(),
            constants,
        }
    }

    fn orchestrator() -> TurnOrchestrator<FirstFound> {
        TurnOrchestrator::new(EngineConfig::default(), FirstFound)
    }

    fn unit(id: u64, x: i32, y: i32, cargo: i32) -> Unit {
        Unit::new(UnitId(id), ME, Position::new(x, y), fx(cargo))
    }

    #[test]
    fn test_every_owned_entity_gets_an_action() {
        let turn = input(
            10,
            vec![unit(1, 0, 0, 0), unit(2, 4, 4, 0)],
            vec![Base::new(BaseId(1), ME, Position::new(6, 6))],
            1000,
        );
        let report = orchestrator().play_turn(&turn).unwrap();
        assert_eq!(report.actions.units.len(), 2);
        assert_eq!(report.actions.bases.len(), 1);
        assert_eq!(report.states.len(), 2);
        assert!(report.scheduling_error.is_none());
        assert!(!report.endgame);
    }

    #[test]
    fn test_spawn_reserves_base_cell() {
        let turn = input(
            10,
            vec![unit(1, 5, 6, 400)],
            vec![Base::new(BaseId(1), ME, Position::new(6, 6))],
            1000,
        );
        let report = orchestrator().play_turn(&turn).unwrap();
        // The loaded unit wants to step onto the base, but the new unit has it
        assert_eq!(report.actions.base(BaseId(1)), Some(BaseAction::Spawn));
        assert_ne!(
            report.unit_action(UnitId(1)),
            Some(UnitAction::Move(Direction::East))
        );
    }

    #[test]
    fn test_missing_score_skips_production_only() {
        let mut turn = input(
            10,
            vec![unit(1, 0, 0, 0)],
            vec![Base::new(BaseId(1), ME, Position::new(6, 6))],
            1000,
        );
        turn.scoreboard = [(1, fx(0))].into_iter().collect();
        let report = orchestrator().play_turn(&turn).unwrap();
        assert!(report.scheduling_error.is_some());
        assert_eq!(report.actions.base(BaseId(1)), Some(BaseAction::Idle));
        assert!(report.actions.unit(UnitId(1)).is_some());
    }

    #[test]
    fn test_fleet_state_tracks_roster() {
        let mut engine = orchestrator();
        let bases = vec![Base::new(BaseId(1), ME, Position::new(6, 6))];
        engine
            .play_turn(&input(10, vec![unit(1, 0, 0, 0), unit(2, 3, 3, 0)], bases.clone(), 0))
            .unwrap();
        assert_eq!(engine.fleet_state().len(), 2);

        engine
            .play_turn(&input(11, vec![unit(2, 3, 3, 0)], bases, 0))
            .unwrap();
        assert_eq!(engine.fleet_state().len(), 1);
    }

    #[test]
    fn test_endgame_beelines_home() {
        let turn = input(
            392,
            vec![unit(1, 2, 6, 100)],
            vec![Base::new(BaseId(1), ME, Position::new(6, 6))],
            5000,
        );
        let report = orchestrator().play_turn(&turn).unwrap();
        assert!(report.endgame);
        assert_eq!(
            report.unit_action(UnitId(1)),
            Some(UnitAction::Move(Direction::East))
        );
        assert_eq!(report.actions.base(BaseId(1)), Some(BaseAction::Idle));
        assert_eq!(report.states.get(&UnitId(1)), Some(&UnitState::Deposit));
    }

    #[test]
    fn test_final_turn_converts_stranded_cargo() {
        let turn = input(
            398,
            vec![unit(1, 0, 0, 600), unit(2, 5, 6, 600), unit(3, 2, 2, 100)],
            vec![Base::new(BaseId(1), ME, Position::new(6, 6))],
            0,
        );
        let report = orchestrator().play_turn(&turn).unwrap();
        assert_eq!(report.unit_action(UnitId(1)), Some(UnitAction::Convert));
        assert_eq!(
            report.unit_action(UnitId(2)),
            Some(UnitAction::Move(Direction::East))
        );
        assert_ne!(report.unit_action(UnitId(3)), Some(UnitAction::Convert));
    }

    #[test]
    fn test_bootstrap_runs_in_endgame() {
        let turn = input(395, vec![unit(1, 0, 0, 0), unit(2, 3, 3, 0)], vec![], 600);
        let report = orchestrator().play_turn(&turn).unwrap();
        let converts = report
            .actions
            .units
            .values()
            .filter(|a| **a == UnitAction::Convert)
            .count();
        assert_eq!(converts, 1);
    }
}
