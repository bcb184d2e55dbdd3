//! Single-step move planning with same-turn collision avoidance.
//!
//! A destination is turned into one concrete action for this turn. Each
//! candidate step is classified against the frozen board and the turn
//! ledger, and whatever the unit ends up doing is committed to the ledger
//! straight away so later units plan around it.

use tracing::debug;

use crate::actions::UnitAction;
use crate::board::{BoardSnapshot, PlayerId, Unit};
use crate::config::MovementConfig;
use crate::error::{EngineError, Result};
use crate::geometry::{Direction, Position};
use crate::ledger::TurnLedger;
use crate::math::Fixed;
use crate::perception::threats_around;
use crate::selection::{choose, SelectionPolicy};

/// How a candidate step looks from the unit's cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepClass {
    /// Free to take.
    Safe,
    /// Dangerous or illegal: a lighter enemy or an enemy base.
    Blocked,
    /// Not dangerous, just not available this turn.
    Hold,
}

/// Why a unit ended up with its action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    /// A step along the shortest path.
    Direct,
    /// A sideways step because the direct path was unavailable.
    Detour,
    /// Standing still because nothing better was free.
    Wait,
    /// Standing still on purpose (arrived, harvesting).
    Stationary,
    /// End-game step straight home.
    Beeline,
    /// Converting because the unit was cornered with enough cargo.
    FallbackConvert,
    /// Converting to found a base in rich territory.
    Expansion,
}

/// A committed single-turn action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlannedStep {
    /// What the host is told.
    pub action: UnitAction,
    /// Why.
    pub kind: StepKind,
}

/// Turns destinations into committed single steps.
#[derive(Debug, Clone, Copy)]
pub struct MovementPlanner<'a> {
    board: &'a BoardSnapshot,
    me: PlayerId,
    config: MovementConfig,
    convert_cost: Fixed,
}

impl<'a> MovementPlanner<'a> {
    /// Create a planner for player `me`.
    #[must_use]
    pub const fn new(
        board: &'a BoardSnapshot,
        me: PlayerId,
        config: MovementConfig,
        convert_cost: Fixed,
    ) -> Self {
        Self {
            board,
            me,
            config,
            convert_cost,
        }
    }

    /// Classify the step `direction` for `unit`.
    ///
    /// Blocked: the target holds an enemy unit that threatens this one
    /// head-on, or an enemy base.
    ///
    /// Safe: the target is empty, one of our bases, a richer enemy unit, or
    /// an ally that already acted this turn; no threat stands next to it;
    /// and no one has claimed it yet.
    ///
    /// Anything else holds.
    pub fn classify(
        &self,
        unit: &Unit,
        direction: Direction,
        ledger: &TurnLedger,
    ) -> Result<StepClass> {
        let target = self.board.geometry().step(unit.position, direction);
        let invariant = |detail: String| EngineError::ClassificationInvariant {
            unit: unit.id,
            position: target,
            detail,
        };

        let occupant = self
            .board
            .unit_at(target)
            .map_err(|e| invariant(e.to_string()))?;
        let base = self
            .board
            .base_at(target)
            .map_err(|e| invariant(e.to_string()))?;

        if base.is_some_and(|b| b.owner != self.me) {
            return Ok(StepClass::Blocked);
        }

        let passable = match occupant {
            Some(enemy) if enemy.owner != self.me => {
                if self
                    .config
                    .threat_rule
                    .is_threat(enemy.cargo, unit.cargo, 1)
                {
                    return Ok(StepClass::Blocked);
                }
                true
            }
            Some(ally) => ally.id != unit.id && ledger.has_committed(ally.id),
            None => true,
        };

        if !passable || ledger.reservations().is_claimed(target) {
            return Ok(StepClass::Hold);
        }

        let threats = threats_around(
            self.board,
            self.me,
            target,
            1,
            unit.cargo,
            self.config.threat_rule,
        )
        .map_err(|e| invariant(e.to_string()))?;

        if threats.is_empty() {
            Ok(StepClass::Safe)
        } else {
            Ok(StepClass::Hold)
        }
    }

    /// Commit one step of `unit` toward `destination`.
    ///
    /// Direct steps are tried first. When one is blocked the unit sidesteps
    /// to any safe cardinal cell, and a cornered unit rich enough to convert
    /// does so rather than wait to be rammed. When the direct steps are
    /// merely held, the unit either waits or sidesteps, with odds set by
    /// `wait_percent`, so allies waiting on each other eventually untangle.
    pub fn navigate(
        &self,
        unit: &Unit,
        destination: Position,
        ledger: &mut TurnLedger,
        policy: &mut dyn SelectionPolicy,
    ) -> Result<PlannedStep> {
        let direct = self
            .board
            .geometry()
            .direct_steps(unit.position, destination);
        if direct.is_empty() {
            return self.hold(unit, StepKind::Stationary, ledger);
        }

        let mut safe = Vec::new();
        let mut blocked = Vec::new();
        let mut held = Vec::new();
        for direction in direct {
            match self.classify(unit, direction, ledger)? {
                StepClass::Safe => safe.push(direction),
                StepClass::Blocked => blocked.push(direction),
                StepClass::Hold => held.push(direction),
            }
        }

        if let Some(&direction) = choose(policy, &safe) {
            return self.commit(unit, UnitAction::Move(direction), StepKind::Direct, ledger);
        }

        if !blocked.is_empty() {
            let sidesteps = self.safe_sidesteps(unit, &blocked, ledger)?;
            if let Some(&direction) = choose(policy, &sidesteps) {
                return self.commit(unit, UnitAction::Move(direction), StepKind::Detour, ledger);
            }
            if unit.cargo >= self.convert_cost {
                return self.commit(unit, UnitAction::Convert, StepKind::FallbackConvert, ledger);
            }
            return self.hold(unit, StepKind::Wait, ledger);
        }

        let sidesteps = self.safe_sidesteps(unit, &held, ledger)?;
        if sidesteps.is_empty() {
            return self.hold(unit, StepKind::Wait, ledger);
        }
        let roll = policy.pick(100) as u32;
        if roll < self.config.wait_percent {
            return self.hold(unit, StepKind::Wait, ledger);
        }
        match choose(policy, &sidesteps) {
            Some(&direction) => {
                self.commit(unit, UnitAction::Move(direction), StepKind::Detour, ledger)
            }
            None => self.hold(unit, StepKind::Wait, ledger),
        }
    }

    /// End-game step straight toward `destination`.
    ///
    /// No detours and no threat checks; only claimed cells and allies that
    /// have not moved yet are avoided.
    pub fn beeline(
        &self,
        unit: &Unit,
        destination: Position,
        ledger: &mut TurnLedger,
        policy: &mut dyn SelectionPolicy,
    ) -> Result<PlannedStep> {
        let geometry = self.board.geometry();
        let direct = geometry.direct_steps(unit.position, destination);
        if direct.is_empty() {
            return self.hold(unit, StepKind::Stationary, ledger);
        }

        let mut open = Vec::with_capacity(direct.len());
        for direction in direct {
            let target = geometry.step(unit.position, direction);
            if ledger.reservations().is_claimed(target) {
                continue;
            }
            let waiting_ally = self
                .board
                .unit_at(target)?
                .is_some_and(|u| u.owner == self.me && !ledger.has_committed(u.id));
            if !waiting_ally {
                open.push(direction);
            }
        }

        match choose(policy, &open) {
            Some(&direction) => {
                self.commit(unit, UnitAction::Move(direction), StepKind::Beeline, ledger)
            }
            None => self.hold(unit, StepKind::Wait, ledger),
        }
    }

    /// Keep `unit` where it is and claim its cell.
    pub fn hold(&self, unit: &Unit, kind: StepKind, ledger: &mut TurnLedger) -> Result<PlannedStep> {
        self.commit(unit, UnitAction::Hold, kind, ledger)
    }

    /// Convert `unit` into a base on its cell.
    pub fn convert(
        &self,
        unit: &Unit,
        kind: StepKind,
        ledger: &mut TurnLedger,
    ) -> Result<PlannedStep> {
        self.commit(unit, UnitAction::Convert, kind, ledger)
    }

    /// Closest place to drop cargo: one of our bases, or failing that a
    /// cell where one of our units converts this turn.
    #[must_use]
    pub fn nearest_home(&self, from: Position, ledger: &TurnLedger) -> Option<Position> {
        let geometry = self.board.geometry();
        self.board
            .bases_of(self.me)
            .map(|b| b.position)
            .min_by_key(|p| geometry.distance(from, *p))
            .or_else(|| {
                ledger
                    .pending_bases()
                    .iter()
                    .copied()
                    .min_by_key(|p| geometry.distance(from, *p))
            })
    }

    fn safe_sidesteps(
        &self,
        unit: &Unit,
        excluded: &[Direction],
        ledger: &TurnLedger,
    ) -> Result<Vec<Direction>> {
        let mut found = Vec::new();
        for direction in Direction::ALL {
            if excluded.contains(&direction) {
                continue;
            }
            if self.classify(unit, direction, ledger)? == StepClass::Safe {
                found.push(direction);
            }
        }
        Ok(found)
    }

    fn commit(
        &self,
        unit: &Unit,
        action: UnitAction,
        kind: StepKind,
        ledger: &mut TurnLedger,
    ) -> Result<PlannedStep> {
        ledger.commit_unit(unit, action)?;
        debug!(unit = %unit.id, position = %unit.position, %action, ?kind, "step committed");
        Ok(PlannedStep { action, kind })
    }
}
