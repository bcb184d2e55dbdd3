//! Same-turn cell claims.

use std::collections::BTreeMap;

use crate::board::{BaseId, UnitId};
use crate::error::{EngineError, Result};
use crate::geometry::Position;

/// Who holds a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Claimant {
    /// A unit moving onto (or staying on) the cell.
    Unit(UnitId),
    /// A base producing a unit on its own cell.
    Spawn(BaseId),
}

/// Cells already promised to an earlier-planned unit or spawn this turn.
///
/// A cell can be claimed once. Later planners must treat claimed cells as
/// off limits; a second claim is an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationSet {
    claimed: BTreeMap<Position, Claimant>,
}

impl ReservationSet {
    /// Empty set for a fresh turn.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `position` for `claimant`.
    pub fn claim(&mut self, position: Position, claimant: Claimant) -> Result<()> {
        if self.claimed.contains_key(&position) {
            return Err(EngineError::ReservationConflict { position });
        }
        self.claimed.insert(position, claimant);
        Ok(())
    }

    /// Whether `position` is already claimed.
    #[must_use]
    pub fn is_claimed(&self, position: Position) -> bool {
        self.claimed.contains_key(&position)
    }

    /// Holder of the claim on `position`.
    #[must_use]
    pub fn claimant(&self, position: Position) -> Option<Claimant> {
        self.claimed.get(&position).copied()
    }

    /// Number of claimed cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    /// True before anything is claimed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }

    /// Claimed cells in position order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.claimed.keys().copied()
    }
}
