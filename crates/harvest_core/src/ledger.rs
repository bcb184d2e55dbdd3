//! Everything committed so far in the current turn.
//!
//! The board snapshot stays frozen for the whole turn. Units planned later
//! learn about earlier decisions only through this ledger: claimed cells,
//! units that already acted, bases about to appear, and what is left of
//! the bank.

use std::collections::{BTreeMap, BTreeSet};

use crate::actions::{BaseAction, TurnActions, UnitAction};
use crate::board::{Base, BaseId, BoardSnapshot, PlayerId, Unit, UnitId};
use crate::error::{EngineError, Result};
use crate::geometry::{GridGeometry, Position};
use crate::math::Fixed;
use crate::reservation::{Claimant, ReservationSet};

/// Running record of one turn's commitments.
#[derive(Debug, Clone)]
pub struct TurnLedger {
    geometry: GridGeometry,
    reservations: ReservationSet,
    units: BTreeMap<UnitId, UnitAction>,
    spawns: BTreeSet<BaseId>,
    pending_bases: BTreeSet<Position>,
    bank: Fixed,
}

impl TurnLedger {
    /// Start a turn with `bank` available for spawning and conversion.
    #[must_use]
    pub fn new(geometry: GridGeometry, bank: Fixed) -> Self {
        Self {
            geometry,
            reservations: ReservationSet::new(),
            units: BTreeMap::new(),
            spawns: BTreeSet::new(),
            pending_bases: BTreeSet::new(),
            bank,
        }
    }

    /// Record `action` for `unit` and claim the cell it ends up on.
    ///
    /// A move claims its destination, a hold claims the unit's own cell and
    /// a conversion marks the cell as a base-to-be.
    pub fn commit_unit(&mut self, unit: &Unit, action: UnitAction) -> Result<()> {
        if self.units.contains_key(&unit.id) {
            return Err(EngineError::AlreadyCommitted(unit.id));
        }
        match action {
            UnitAction::Move(direction) => {
                let to = self.geometry.step(unit.position, direction);
                self.reservations.claim(to, Claimant::Unit(unit.id))?;
            }
            UnitAction::Hold => {
                self.reservations
                    .claim(unit.position, Claimant::Unit(unit.id))?;
            }
            UnitAction::Convert => {
                self.pending_bases.insert(unit.position);
            }
        }
        self.units.insert(unit.id, action);
        Ok(())
    }

    /// Order a spawn at `base`, claim its cell and pay for it.
    pub fn commit_spawn(&mut self, base: &Base, cost: Fixed) -> Result<()> {
        self.reservations
            .claim(base.position, Claimant::Spawn(base.id))?;
        self.spawns.insert(base.id);
        self.spend(cost);
        Ok(())
    }

    /// Deduct `amount` from the bank, never going below zero.
    pub fn spend(&mut self, amount: Fixed) {
        self.bank = self.bank.saturating_sub(amount.max(Fixed::ZERO)).max(Fixed::ZERO);
    }

    /// Remaining bank.
    #[must_use]
    pub const fn bank(&self) -> Fixed {
        self.bank
    }

    /// Action already committed for a unit.
    #[must_use]
    pub fn action_of(&self, unit: UnitId) -> Option<UnitAction> {
        self.units.get(&unit).copied()
    }

    /// Whether a unit has acted this turn.
    #[must_use]
    pub fn has_committed(&self, unit: UnitId) -> bool {
        self.units.contains_key(&unit)
    }

    /// Cells where a base appears at the end of this turn.
    #[must_use]
    pub const fn pending_bases(&self) -> &BTreeSet<Position> {
        &self.pending_bases
    }

    /// Same-turn claims.
    #[must_use]
    pub const fn reservations(&self) -> &ReservationSet {
        &self.reservations
    }

    /// Number of spawns ordered so far.
    #[must_use]
    pub fn spawn_count(&self) -> usize {
        self.spawns.len()
    }

    /// Close the turn: every unit and base owned by `me` gets an action,
    /// idle when nothing was committed.
    #[must_use]
    pub fn into_actions(self, board: &BoardSnapshot, me: PlayerId) -> TurnActions {
        let units = board
            .units_of(me)
            .map(|u| (u.id, self.units.get(&u.id).copied().unwrap_or_default()))
            .collect();
        let bases = board
            .bases_of(me)
            .map(|b| {
                let action = if self.spawns.contains(&b.id) {
                    BaseAction::Spawn
                } else {
                    BaseAction::Idle
                };
                (b.id, action)
            })
            .collect();
        TurnActions { units, bases }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Direction;

    fn setup() -> (BoardSnapshot, TurnLedger) {
        let board = BoardSnapshot::new(
            5,
            vec![Fixed::ZERO; 25],
            vec![
                Unit::new(UnitId(1), 0, Position::new(0, 0), Fixed::ZERO),
                Unit::new(UnitId(2), 0, Position::new(2, 0), Fixed::from_num(600)),
                Unit::new(UnitId(9), 1, Position::new(4, 4), Fixed::ZERO),
            ],
            vec![
                Base::new(BaseId(1), 0, Position::new(3, 3)),
                Base::new(BaseId(2), 1, Position::new(1, 3)),
            ],
        )
        .unwrap();
        let ledger = TurnLedger::new(board.geometry(), Fixed::from_num(1000));
        (board, ledger)
    }

    #[test]
    fn test_move_claims_destination() {
        let (board, mut ledger) = setup();
        let unit = *board.unit(UnitId(1)).unwrap();
        ledger
            .commit_unit(&unit, UnitAction::Move(Direction::West))
            .unwrap();
        assert!(ledger.reservations().is_claimed(Position::new(4, 0)));
        assert!(!ledger.reservations().is_claimed(Position::new(0, 0)));
        assert!(ledger.has_committed(UnitId(1)));
    }

    #[test]
    fn test_hold_claims_own_cell() {
        let (board, mut ledger) = setup();
        let unit = *board.unit(UnitId(1)).unwrap();
        ledger.commit_unit(&unit, UnitAction::Hold).unwrap();
        assert!(ledger.reservations().is_claimed(unit.position));
    }

    #[test]
    fn test_convert_marks_pending_base() {
        let (board, mut ledger) = setup();
        let unit = *board.unit(UnitId(2)).unwrap();
        ledger.commit_unit(&unit, UnitAction::Convert).unwrap();
        assert!(ledger.pending_bases().contains(&Position::new(2, 0)));
        assert!(ledger.reservations().is_empty());
    }

    #[test]
    fn test_second_commit_rejected() {
        let (board, mut ledger) = setup();
        let unit = *board.unit(UnitId(1)).unwrap();
        ledger.commit_unit(&unit, UnitAction::Hold).unwrap();
        assert!(matches!(
            ledger.commit_unit(&unit, UnitAction::Convert),
            Err(EngineError::AlreadyCommitted(UnitId(1)))
        ));
    }

    #[test]
    fn test_spawn_pays_and_claims() {
        let (board, mut ledger) = setup();
        let base = *board.base(BaseId(1)).unwrap();
        ledger.commit_spawn(&base, Fixed::from_num(500)).unwrap();
        assert_eq!(ledger.bank(), Fixed::from_num(500));
        assert!(ledger.reservations().is_claimed(base.position));
        assert_eq!(ledger.spawn_count(), 1);
    }

    #[test]
    fn test_spend_floors_at_zero() {
        let (_, mut ledger) = setup();
        ledger.spend(Fixed::from_num(4000));
        assert_eq!(ledger.bank(), Fixed::ZERO);
    }

    #[test]
    fn test_into_actions_fills_idle() {
        let (board, mut ledger) = setup();
        let unit = *board.unit(UnitId(2)).unwrap();
        ledger
            .commit_unit(&unit, UnitAction::Move(Direction::North))
            .unwrap();
        let actions = ledger.into_actions(&board, 0);

        assert_eq!(actions.units.len(), 2);
        assert_eq!(actions.unit(UnitId(1)), Some(UnitAction::Hold));
        assert_eq!(
            actions.unit(UnitId(2)),
            Some(UnitAction::Move(Direction::North))
        );
        assert_eq!(actions.base(BaseId(1)), Some(BaseAction::Idle));
        assert_eq!(actions.base(BaseId(2)), None);
    }
}
