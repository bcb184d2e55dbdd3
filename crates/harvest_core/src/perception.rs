//! Radar scanning and threat detection.
//!
//! A radar is a Manhattan disk around a unit or base. Each scanned cell is
//! sorted into allies, enemies, or harvestable ground with a forecast
//! yield. Snapshots are rebuilt every turn and never kept.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::board::{Base, BoardSnapshot, PlayerId, Unit, UnitId};
use crate::error::Result;
use crate::estimator::ResourceEstimator;
use crate::geometry::{GridGeometry, Position};
use crate::math::{amount, Fixed};

/// Rule deciding whether an enemy unit endangers one of ours.
///
/// In a collision the unit carrying less survives and takes the other's
/// cargo, so rivals carrying no more than we do are the dangerous ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ThreatRule {
    /// Enemy cargo `<=` own cargo.
    #[default]
    AtMostOwnCargo,
    /// Enemy cargo `<` own cargo; equal cargo is ignored.
    BelowOwnCargo,
    /// Enemy cargo plus `margin_per_step` for every step beyond the first
    /// must still be `<=` own cargo. Distant rivals need a wider margin.
    DistanceDiscounted {
        /// Resource margin added per extra step of distance.
        margin_per_step: u32,
    },
}

impl ThreatRule {
    /// Whether an enemy at `distance` carrying `enemy_cargo` threatens a
    /// unit carrying `own_cargo`. Distance zero is never a threat.
    #[must_use]
    pub fn is_threat(self, enemy_cargo: Fixed, own_cargo: Fixed, distance: u32) -> bool {
        if distance == 0 {
            return false;
        }
        match self {
            Self::AtMostOwnCargo => enemy_cargo <= own_cargo,
            Self::BelowOwnCargo => enemy_cargo < own_cargo,
            Self::DistanceDiscounted { margin_per_step } => {
                let margin = amount(margin_per_step).saturating_mul(amount(distance - 1));
                enemy_cargo.saturating_add(margin) <= own_cargo
            }
        }
    }
}

/// An enemy unit spotted by a radar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeenUnit {
    /// Unit identity.
    pub id: UnitId,
    /// Where it stands.
    pub position: Position,
    /// What it carries.
    pub cargo: Fixed,
}

/// Per-turn radar picture around one unit or base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadarSnapshot {
    /// Scan center.
    pub center: Position,
    /// Scan radius.
    pub radius: u32,
    /// Resource lying on every scanned cell.
    pub resources: BTreeMap<Position, Fixed>,
    /// Forecast yield for harvestable cells.
    pub forecasts: BTreeMap<Position, Fixed>,
    /// Allied units, the scanning unit excluded.
    pub ally_units: Vec<Position>,
    /// Enemy units.
    pub enemy_units: Vec<SeenUnit>,
    /// Allied bases.
    pub ally_bases: Vec<Position>,
    /// Enemy bases.
    pub enemy_bases: Vec<Position>,
}

impl RadarSnapshot {
    /// Highest forecast yield in range, if any cell is harvestable.
    #[must_use]
    pub fn max_forecast(&self) -> Option<Fixed> {
        self.forecasts.values().copied().max()
    }

    /// Cells tied for the highest forecast, in position order.
    #[must_use]
    pub fn best_cells(&self) -> Vec<Position> {
        let Some(best) = self.max_forecast() else {
            return Vec::new();
        };
        self.forecasts
            .iter()
            .filter(|(_, v)| **v == best)
            .map(|(p, _)| *p)
            .collect()
    }

    /// Forecast yield of one cell.
    #[must_use]
    pub fn forecast_at(&self, p: Position) -> Option<Fixed> {
        self.forecasts.get(&p).copied()
    }

    /// Sum of all forecast yields.
    #[must_use]
    pub fn forecast_total(&self) -> Fixed {
        self.forecasts
            .values()
            .fold(Fixed::ZERO, |acc, v| acc.saturating_add(*v))
    }

    /// Sum of resource on every scanned cell except the center.
    #[must_use]
    pub fn resource_total_excluding_center(&self) -> Fixed {
        self.resources
            .iter()
            .filter(|(p, _)| **p != self.center)
            .fold(Fixed::ZERO, |acc, (_, v)| acc.saturating_add(*v))
    }

    /// Enemy units in this radar that threaten a unit carrying `own_cargo`
    /// standing at `around`, within `within` steps.
    #[must_use]
    pub fn threats(
        &self,
        geometry: GridGeometry,
        around: Position,
        within: u32,
        own_cargo: Fixed,
        rule: ThreatRule,
    ) -> Vec<Position> {
        self.enemy_units
            .iter()
            .filter(|e| {
                let d = geometry.distance(around, e.position);
                d <= within && rule.is_threat(e.cargo, own_cargo, d)
            })
            .map(|e| e.position)
            .collect()
    }
}

/// Threatening enemies near `around`, read straight from the board.
///
/// Unlike [`RadarSnapshot::threats`] this is not limited to a radar's
/// reach, which matters when probing cells at the edge of one.
pub fn threats_around(
    board: &BoardSnapshot,
    me: PlayerId,
    around: Position,
    within: u32,
    own_cargo: Fixed,
    rule: ThreatRule,
) -> Result<Vec<Position>> {
    let geometry = board.geometry();
    let mut found = Vec::new();
    for p in geometry.disk(around, within) {
        if let Some(enemy) = board.unit_at(p)?.filter(|u| u.owner != me) {
            if rule.is_threat(enemy.cargo, own_cargo, geometry.distance(around, p)) {
                found.push(p);
            }
        }
    }
    Ok(found)
}

/// Builds radar snapshots against the frozen board.
#[derive(Debug, Clone, Copy)]
pub struct PerceptionScanner<'a> {
    board: &'a BoardSnapshot,
    me: PlayerId,
    estimator: ResourceEstimator,
    hunt_richer: bool,
}

impl<'a> PerceptionScanner<'a> {
    /// Create a scanner for player `me`.
    ///
    /// With `hunt_richer` set, enemy units carrying more than the scanning
    /// unit show up as harvestable, valued at their cargo on top of the
    /// cell yield.
    #[must_use]
    pub const fn new(
        board: &'a BoardSnapshot,
        me: PlayerId,
        estimator: ResourceEstimator,
        hunt_richer: bool,
    ) -> Self {
        Self {
            board,
            me,
            estimator,
            hunt_richer,
        }
    }

    /// Scan around a unit.
    pub fn scan_unit(&self, unit: &Unit, radius: u32) -> Result<RadarSnapshot> {
        self.scan(unit.position, radius, Some(unit))
    }

    /// Scan around a base.
    pub fn scan_base(&self, base: &Base, radius: u32) -> Result<RadarSnapshot> {
        self.scan(base.position, radius, None)
    }

    fn scan(&self, center: Position, radius: u32, scanner: Option<&Unit>) -> Result<RadarSnapshot> {
        let geometry = self.board.geometry();
        let horizon = radius + 1;
        let mut radar = RadarSnapshot {
            center,
            radius,
            resources: BTreeMap::new(),
            forecasts: BTreeMap::new(),
            ally_units: Vec::new(),
            enemy_units: Vec::new(),
            ally_bases: Vec::new(),
            enemy_bases: Vec::new(),
        };

        for p in geometry.disk(center, radius) {
            let resource = self.board.resource_at(p);
            radar.resources.insert(p, resource);

            let occupant = self.board.unit_at(p)?;
            let base = self.board.base_at(p)?;

            if let Some(base) = base {
                if base.owner == self.me {
                    radar.ally_bases.push(p);
                } else {
                    radar.enemy_bases.push(p);
                }
            }

            match occupant {
                Some(u) if scanner.is_some_and(|s| s.id == u.id) => {
                    radar
                        .forecasts
                        .insert(p, self.estimator.estimate_gain(resource, 0, horizon));
                }
                Some(u) if u.owner == self.me => radar.ally_units.push(p),
                Some(u) => {
                    radar.enemy_units.push(SeenUnit {
                        id: u.id,
                        position: p,
                        cargo: u.cargo,
                    });
                    let richer = scanner.is_some_and(|s| u.cargo > s.cargo);
                    if self.hunt_richer && richer {
                        let bounty = self
                            .estimator
                            .estimate_gain(resource, 0, horizon)
                            .saturating_add(u.cargo);
                        radar.forecasts.insert(p, bounty);
                    }
                }
                None if base.is_none() => {
                    let d = geometry.distance(center, p);
                    radar
                        .forecasts
                        .insert(p, self.estimator.estimate_gain(resource, d, horizon));
                }
                None => {}
            }
        }

        Ok(radar)
    }
}
