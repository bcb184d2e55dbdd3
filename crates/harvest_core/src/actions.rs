//! Per-turn actions handed back to the host.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::{BaseId, UnitId};
use crate::geometry::Direction;

/// Pending action for a mobile unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UnitAction {
    /// Stay on the current cell (and harvest it).
    #[default]
    Hold,
    /// Step one cell.
    Move(Direction),
    /// Turn into a base on the current cell.
    Convert,
}

impl fmt::Display for UnitAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hold => write!(f, "hold"),
            Self::Move(d) => write!(f, "move {d:?}"),
            Self::Convert => write!(f, "convert"),
        }
    }
}

/// Pending action for a base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BaseAction {
    /// Do nothing.
    #[default]
    Idle,
    /// Produce a new unit on the base cell.
    Spawn,
}

/// Fully populated action assignment for every owned unit and base.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnActions {
    /// One entry per owned unit.
    pub units: BTreeMap<UnitId, UnitAction>,
    /// One entry per owned base.
    pub bases: BTreeMap<BaseId, BaseAction>,
}

impl TurnActions {
    /// Action assigned to a unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<UnitAction> {
        self.units.get(&id).copied()
    }

    /// Action assigned to a base.
    #[must_use]
    pub fn base(&self, id: BaseId) -> Option<BaseAction> {
        self.bases.get(&id).copied()
    }

    /// Number of spawns ordered this turn.
    #[must_use]
    pub fn spawn_count(&self) -> usize {
        self.bases
            .values()
            .filter(|a| **a == BaseAction::Spawn)
            .count()
    }
}
