//! Frozen per-turn board snapshot.
//!
//! The host hands over one snapshot per turn. The engine only ever reads it;
//! same-turn commitments live in [`crate::ledger::TurnLedger`] instead.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::geometry::{GridGeometry, Position};
use crate::math::{fixed_serde, Fixed};

/// Player identifier as assigned by the host.
pub type PlayerId = u32;

/// Mobile harvesting unit identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u64);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit-{}", self.0)
    }
}

/// Stationary base identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BaseId(pub u64);

impl fmt::Display for BaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "base-{}", self.0)
    }
}

/// A mobile unit as seen at the start of the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Unit identity.
    pub id: UnitId,
    /// Owning player.
    pub owner: PlayerId,
    /// Current cell.
    pub position: Position,
    /// Carried resource.
    #[serde(with = "fixed_serde")]
    pub cargo: Fixed,
}

impl Unit {
    /// Create a unit record.
    #[must_use]
    pub const fn new(id: UnitId, owner: PlayerId, position: Position, cargo: Fixed) -> Self {
        Self {
            id,
            owner,
            position,
            cargo,
        }
    }
}

/// A stationary production base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Base {
    /// Base identity.
    pub id: BaseId,
    /// Owning player.
    pub owner: PlayerId,
    /// Fixed cell.
    pub position: Position,
}

impl Base {
    /// Create a base record.
    #[must_use]
    pub const fn new(id: BaseId, owner: PlayerId, position: Position) -> Self {
        Self {
            id,
            owner,
            position,
        }
    }
}

/// One board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cell {
    /// Resource lying on the cell.
    #[serde(with = "fixed_serde")]
    pub resource: Fixed,
    /// Occupying unit, if any.
    pub unit: Option<UnitId>,
    /// Occupying base, if any.
    pub base: Option<BaseId>,
}

/// Read-only view of the board at the start of a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    geometry: GridGeometry,
    cells: Vec<Cell>,
    units: BTreeMap<UnitId, Unit>,
    bases: BTreeMap<BaseId, Base>,
}

impl BoardSnapshot {
    /// Build a snapshot from row-major cell resources and entity rosters.
    ///
    /// Positions are normalized. Fails when the resource grid does not match
    /// the side length, a resource is negative, ids repeat, or two units (or
    /// two bases) share a cell.
    pub fn new(
        size: u32,
        resources: Vec<Fixed>,
        units: Vec<Unit>,
        bases: Vec<Base>,
    ) -> Result<Self> {
        let geometry = GridGeometry::new(size)?;
        if resources.len() != geometry.cell_count() {
            return Err(EngineError::InvalidSnapshot(format!(
                "expected {} cell resources, got {}",
                geometry.cell_count(),
                resources.len()
            )));
        }
        if resources.iter().any(|r| *r < Fixed::ZERO) {
            return Err(EngineError::InvalidSnapshot(
                "cell resource must be non-negative".to_string(),
            ));
        }

        let mut cells: Vec<Cell> = resources
            .into_iter()
            .map(|resource| Cell {
                resource,
                ..Cell::default()
            })
            .collect();

        let mut unit_map = BTreeMap::new();
        for mut unit in units {
            unit.position = geometry.normalize(unit.position);
            if unit.cargo < Fixed::ZERO {
                return Err(EngineError::InvalidSnapshot(format!(
                    "{} carries negative cargo",
                    unit.id
                )));
            }
            let cell = &mut cells[geometry.index(unit.position)];
            if let Some(other) = cell.unit {
                return Err(EngineError::InvalidSnapshot(format!(
                    "{} and {other} share {}",
                    unit.id, unit.position
                )));
            }
            cell.unit = Some(unit.id);
            if unit_map.insert(unit.id, unit).is_some() {
                return Err(EngineError::InvalidSnapshot(format!(
                    "duplicate {}",
                    unit.id
                )));
            }
        }

        let mut base_map = BTreeMap::new();
        for mut base in bases {
            base.position = geometry.normalize(base.position);
            let cell = &mut cells[geometry.index(base.position)];
            if let Some(other) = cell.base {
                return Err(EngineError::InvalidSnapshot(format!(
                    "{} and {other} share {}",
                    base.id, base.position
                )));
            }
            cell.base = Some(base.id);
            if base_map.insert(base.id, base).is_some() {
                return Err(EngineError::InvalidSnapshot(format!(
                    "duplicate {}",
                    base.id
                )));
            }
        }

        Ok(Self {
            geometry,
            cells,
            units: unit_map,
            bases: base_map,
        })
    }

    /// Board geometry.
    #[must_use]
    pub const fn geometry(&self) -> GridGeometry {
        self.geometry
    }

    /// Cell at a (possibly unnormalized) position.
    #[must_use]
    pub fn cell(&self, p: Position) -> &Cell {
        &self.cells[self.geometry.index(p)]
    }

    /// Resource lying at a position.
    #[must_use]
    pub fn resource_at(&self, p: Position) -> Fixed {
        self.cell(p).resource
    }

    /// Unit standing at a position.
    ///
    /// Errors if the cell references a unit the roster does not contain.
    pub fn unit_at(&self, p: Position) -> Result<Option<&Unit>> {
        match self.cell(p).unit {
            None => Ok(None),
            Some(id) => self.units.get(&id).map(Some).ok_or_else(|| {
                EngineError::InvalidSnapshot(format!("cell {p} references missing {id}"))
            }),
        }
    }

    /// Base standing at a position.
    pub fn base_at(&self, p: Position) -> Result<Option<&Base>> {
        match self.cell(p).base {
            None => Ok(None),
            Some(id) => self.bases.get(&id).map(Some).ok_or_else(|| {
                EngineError::InvalidSnapshot(format!("cell {p} references missing {id}"))
            }),
        }
    }

    /// Look up a unit by id.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Look up a base by id.
    #[must_use]
    pub fn base(&self, id: BaseId) -> Option<&Base> {
        self.bases.get(&id)
    }

    /// Units owned by `player`, in ascending id order.
    pub fn units_of(&self, player: PlayerId) -> impl Iterator<Item = &Unit> + '_ {
        self.units.values().filter(move |u| u.owner == player)
    }

    /// Bases owned by `player`, in ascending id order.
    pub fn bases_of(&self, player: PlayerId) -> impl Iterator<Item = &Base> + '_ {
        self.bases.values().filter(move |b| b.owner == player)
    }

    /// Every unit on the board, in ascending id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> + '_ {
        self.units.values()
    }

    /// Mean resource per cell.
    #[must_use]
    pub fn mean_resource(&self) -> Fixed {
        let total = self
            .cells
            .iter()
            .fold(Fixed::ZERO, |acc, c| acc.saturating_add(c.resource));
        total / Fixed::from_num(self.cells.len())
    }
}
