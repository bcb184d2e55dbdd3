//! Per-unit state machine.
//!
//! Each unit is in one of four states. A decision re-evaluates the unit in
//! a bounded loop: a state change or a wider radar re-runs the evaluation
//! in the same turn, and running out of iterations leaves the unit holding.
//!
//! | From    | Condition                                            | To              |
//! |---------|------------------------------------------------------|-----------------|
//! | Explore | cargo >= deposit threshold                           | Deposit         |
//! | Explore | rich area, no base nearby, conversion affordable     | Convert         |
//! | Explore | own cell holds the best forecast                     | Collect         |
//! | Explore | best forecast below the floor, radius below the cap  | rescan wider    |
//! | Explore | otherwise                                            | head for best   |
//! | Collect | cargo >= min(deposit, dynamic cap) or threatened     | Deposit         |
//! | Collect | otherwise                                            | Explore rules   |
//! | Deposit | on our base with empty hold                          | Explore         |
//! | Deposit | cargo < deposit threshold and not threatened         | Explore         |
//! | Deposit | otherwise                                            | head home       |

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::actions::UnitAction;
use crate::board::{BoardSnapshot, PlayerId, Unit, UnitId};
use crate::config::{MovementConfig, StrategyConfig};
use crate::error::Result;
use crate::geometry::Position;
use crate::ledger::TurnLedger;
use crate::math::{amount, Fixed};
use crate::movement::{MovementPlanner, PlannedStep, StepKind};
use crate::perception::{PerceptionScanner, RadarSnapshot};
use crate::selection::{choose, SelectionPolicy};

/// Strategy state of one unit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum UnitState {
    /// Looking for the best nearby yield.
    #[default]
    Explore,
    /// Harvesting the current cell.
    Collect,
    /// Carrying cargo home.
    Deposit,
    /// Turning into a base this turn.
    Convert,
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Explore => "EXPLORE",
            Self::Collect => "COLLECT",
            Self::Deposit => "DEPOSIT",
            Self::Convert => "CONVERT",
        };
        f.write_str(name)
    }
}

/// Strategy state of every live unit, carried across turns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetState {
    states: BTreeMap<UnitId, UnitState>,
}

impl FleetState {
    /// Empty fleet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// State of `unit`; units never seen before are exploring.
    #[must_use]
    pub fn state_of(&self, unit: UnitId) -> UnitState {
        self.states.get(&unit).copied().unwrap_or_default()
    }

    /// Record the state of `unit`.
    pub fn set(&mut self, unit: UnitId, state: UnitState) {
        self.states.insert(unit, state);
    }

    /// Drop units that are gone and give newcomers a default entry, so that
    /// exactly the `live` units are tracked.
    pub fn retain_live(&mut self, live: &BTreeSet<UnitId>) {
        self.states.retain(|id, _| live.contains(id));
        for id in live {
            self.states.entry(*id).or_default();
        }
    }

    /// Forget a unit.
    pub fn remove(&mut self, unit: UnitId) -> Option<UnitState> {
        self.states.remove(&unit)
    }

    /// Number of tracked units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// True when no unit is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Tracked units and their states, by id.
    pub fn iter(&self) -> impl Iterator<Item = (UnitId, UnitState)> + '_ {
        self.states.iter().map(|(id, s)| (*id, *s))
    }
}

/// Outcome of one unit's evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// State the unit ends the turn in.
    pub state: UnitState,
    /// Action committed for this turn.
    pub step: PlannedStep,
    /// Radar radius of the final evaluation.
    pub radar_radius: u32,
    /// Number of evaluation passes used.
    pub iterations: u32,
}

enum Explore {
    Expand,
    Collect,
    Rescan,
    Head(Position),
    Idle,
}

/// Runs the state machine for one unit at a time.
#[derive(Debug, Clone, Copy)]
pub struct UnitStrategy<'a> {
    board: &'a BoardSnapshot,
    me: PlayerId,
    config: StrategyConfig,
    movement: MovementConfig,
    scanner: PerceptionScanner<'a>,
    planner: MovementPlanner<'a>,
    convert_cost: Fixed,
    liveliness_floor: Fixed,
    collect_cap: Fixed,
}

impl<'a> UnitStrategy<'a> {
    /// Bind a strategy to this turn's board.
    ///
    /// The liveliness floor and the dynamic collect cap both derive from
    /// the board's mean cell resource.
    #[must_use]
    pub fn new(
        board: &'a BoardSnapshot,
        me: PlayerId,
        config: StrategyConfig,
        movement: MovementConfig,
        scanner: PerceptionScanner<'a>,
        planner: MovementPlanner<'a>,
        convert_cost: Fixed,
    ) -> Self {
        let mean = board.mean_resource();
        Self {
            board,
            me,
            config,
            movement,
            scanner,
            planner,
            convert_cost,
            liveliness_floor: mean,
            collect_cap: mean.saturating_mul(amount(config.collect_cap_multiplier)),
        }
    }

    /// Decide and commit this turn's action for `unit`, starting from
    /// `state`.
    pub fn decide(
        &self,
        unit: &Unit,
        state: UnitState,
        ledger: &mut TurnLedger,
        policy: &mut dyn SelectionPolicy,
    ) -> Result<Decision> {
        let deposit_cargo = self.config.deposit_cargo();
        let mut state = match state {
            // Still a unit, so last turn's conversion did not happen
            UnitState::Convert => UnitState::Explore,
            other => other,
        };
        let mut radius = self.config.radar_radius;

        for iteration in 1..=self.config.max_iterations {
            let radar = self.scanner.scan_unit(unit, radius)?;
            let decided = move |state, step| Decision {
                state,
                step,
                radar_radius: radius,
                iterations: iteration,
            };

            match state {
                UnitState::Deposit => {
                    let on_own_base = self
                        .board
                        .base_at(unit.position)?
                        .is_some_and(|b| b.owner == self.me);
                    if on_own_base && unit.cargo == Fixed::ZERO {
                        state = UnitState::Explore;
                        continue;
                    }
                    if unit.cargo < deposit_cargo && !self.threatened(unit, &radar) {
                        state = UnitState::Explore;
                        continue;
                    }
                    let step = self.head_home(unit, ledger, policy)?;
                    return Ok(decided(settle(UnitState::Deposit, step), step));
                }
                UnitState::Collect => {
                    let cap = deposit_cargo.min(self.collect_cap);
                    if unit.cargo >= cap || self.threatened(unit, &radar) {
                        state = UnitState::Deposit;
                        continue;
                    }
                }
                UnitState::Explore => {
                    if unit.cargo >= deposit_cargo {
                        state = UnitState::Deposit;
                        continue;
                    }
                }
                UnitState::Convert => {}
            }

            match self.explore(unit, &radar, radius, ledger, policy) {
                Explore::Expand => {
                    let step = self.planner.convert(unit, StepKind::Expansion, ledger)?;
                    ledger.spend(self.convert_cost.saturating_sub(unit.cargo));
                    info!(unit = %unit.id, position = %unit.position, "founding a base");
                    return Ok(decided(UnitState::Convert, step));
                }
                Explore::Collect => {
                    let step = self.planner.hold(unit, StepKind::Stationary, ledger)?;
                    return Ok(decided(UnitState::Collect, step));
                }
                Explore::Rescan => {
                    radius += 1;
                    debug!(unit = %unit.id, radius, "widening radar");
                }
                Explore::Head(target) => {
                    let step = self.planner.navigate(unit, target, ledger, policy)?;
                    return Ok(decided(settle(UnitState::Explore, step), step));
                }
                Explore::Idle => {
                    let step = self.planner.hold(unit, StepKind::Wait, ledger)?;
                    return Ok(decided(UnitState::Explore, step));
                }
            }
        }

        warn!(
            unit = %unit.id,
            iterations = self.config.max_iterations,
            "evaluation budget exhausted, holding"
        );
        let step = self.planner.hold(unit, StepKind::Wait, ledger)?;
        Ok(Decision {
            state,
            step,
            radar_radius: radius,
            iterations: self.config.max_iterations,
        })
    }

    fn explore(
        &self,
        unit: &Unit,
        radar: &RadarSnapshot,
        radius: u32,
        ledger: &TurnLedger,
        policy: &mut dyn SelectionPolicy,
    ) -> Explore {
        if self.should_expand(unit, radar, ledger) {
            return Explore::Expand;
        }

        let Some(best) = radar.max_forecast() else {
            return Explore::Idle;
        };
        if radar.forecast_at(unit.position) == Some(best) {
            return Explore::Collect;
        }
        if best < self.liveliness_floor && radius < self.config.max_radar_radius {
            return Explore::Rescan;
        }

        let candidates = radar.best_cells();
        match choose(policy, &candidates) {
            Some(target) => Explore::Head(*target),
            None => Explore::Idle,
        }
    }

    fn should_expand(&self, unit: &Unit, radar: &RadarSnapshot, ledger: &TurnLedger) -> bool {
        if radar.resource_total_excluding_center() < self.config.expansion_resource() {
            return false;
        }
        let geometry = self.board.geometry();
        let spacing = self.config.min_base_spacing;
        let crowded = self
            .board
            .bases_of(self.me)
            .map(|b| b.position)
            .chain(ledger.pending_bases().iter().copied())
            .any(|p| geometry.distance(unit.position, p) <= spacing);
        let affordable = unit.cargo.saturating_add(ledger.bank()) >= self.convert_cost;
        !crowded && affordable
    }

    fn threatened(&self, unit: &Unit, radar: &RadarSnapshot) -> bool {
        !radar
            .threats(
                self.board.geometry(),
                unit.position,
                self.config.security_distance,
                unit.cargo,
                self.movement.threat_rule,
            )
            .is_empty()
    }

    fn head_home(
        &self,
        unit: &Unit,
        ledger: &mut TurnLedger,
        policy: &mut dyn SelectionPolicy,
    ) -> Result<PlannedStep> {
        match self.planner.nearest_home(unit.position, ledger) {
            Some(home) => self.planner.navigate(unit, home, ledger, policy),
            None => self.planner.hold(unit, StepKind::Wait, ledger),
        }
    }
}

/// A unit that fell back to converting ends in the convert state.
fn settle(state: UnitState, step: PlannedStep) -> UnitState {
    if step.action == UnitAction::Convert {
        UnitState::Convert
    } else {
        state
    }
}
