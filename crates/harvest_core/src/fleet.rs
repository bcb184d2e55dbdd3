//! Fleet-level production and bootstrap conversion.
//!
//! How many units to run is derived from the scoreboard each turn: a
//! leader converts its lead into extra units, a trailing player spends
//! toward the leader, and late in the game the target decays to zero.
//! Spawns go to the richest free bases first.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::actions::UnitAction;
use crate::board::{Base, BaseId, BoardSnapshot, PlayerId, Unit, UnitId};
use crate::config::{FleetConfig, GameConstants};
use crate::error::{EngineError, Result};
use crate::ledger::TurnLedger;
use crate::math::{percent, Fixed};
use crate::perception::PerceptionScanner;
use crate::selection::{choose, SelectionPolicy};

/// Each player's aggregate resource total this turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scoreboard {
    totals: BTreeMap<PlayerId, Fixed>,
}

impl Scoreboard {
    /// Build a scoreboard from per-player totals.
    #[must_use]
    pub fn new(totals: BTreeMap<PlayerId, Fixed>) -> Self {
        Self { totals }
    }

    /// Total of `player`. A missing entry is a broken host contract.
    pub fn total(&self, player: PlayerId) -> Result<Fixed> {
        self.totals
            .get(&player)
            .copied()
            .ok_or(EngineError::MissingScore(player))
    }

    /// Players from richest to poorest; equal totals by ascending id.
    #[must_use]
    pub fn standings(&self) -> Vec<(PlayerId, Fixed)> {
        let mut ranked: Vec<(PlayerId, Fixed)> =
            self.totals.iter().map(|(p, t)| (*p, *t)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
    }

    /// Number of players listed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.totals.len()
    }

    /// True when no player is listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

impl FromIterator<(PlayerId, Fixed)> for Scoreboard {
    fn from_iter<I: IntoIterator<Item = (PlayerId, Fixed)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Whole multiples of `cost` in `amount`, rounded down. Zero for a
/// non-positive cost or amount.
fn whole(amount: Fixed, cost: Fixed) -> u32 {
    if cost <= Fixed::ZERO {
        return 0;
    }
    amount
        .max(Fixed::ZERO)
        .checked_div(cost)
        .map_or(0, |q| q.floor().saturating_to_num::<u32>())
}

/// Like [`whole`] but rounded up.
fn whole_ceil(amount: Fixed, cost: Fixed) -> u32 {
    if cost <= Fixed::ZERO {
        return 0;
    }
    amount
        .max(Fixed::ZERO)
        .checked_div(cost)
        .map_or(0, |q| q.ceil().saturating_to_num::<u32>())
}

/// Decides spawns and emergency conversions for one player.
#[derive(Debug, Clone, Copy)]
pub struct FleetScheduler<'a> {
    board: &'a BoardSnapshot,
    me: PlayerId,
    config: FleetConfig,
    constants: GameConstants,
    scanner: PerceptionScanner<'a>,
}

impl<'a> FleetScheduler<'a> {
    /// Create a scheduler for player `me`.
    #[must_use]
    pub const fn new(
        board: &'a BoardSnapshot,
        me: PlayerId,
        config: FleetConfig,
        constants: GameConstants,
        scanner: PerceptionScanner<'a>,
    ) -> Self {
        Self {
            board,
            me,
            config,
            constants,
            scanner,
        }
    }

    /// Number of units this player should field on `turn`.
    pub fn target_fleet_size(&self, turn: u32, scoreboard: &Scoreboard) -> Result<u32> {
        let cfg = &self.config;
        let units = self.board.units_of(self.me).count() as u32;

        if turn >= cfg.decay_start_turn {
            let span = self
                .constants
                .episode_turns
                .saturating_sub(cfg.decay_start_turn);
            if span == 0 {
                return Ok(0);
            }
            let remaining = self.constants.episode_turns.saturating_sub(turn);
            let scaled = u64::from(cfg.max_units) * u64::from(remaining) / u64::from(span);
            return Ok(scaled as u32);
        }
        if turn < cfg.scale_start_turn {
            return Ok(cfg.max_units);
        }

        let mine = scoreboard.total(self.me)?;
        let standings = scoreboard.standings();
        let rank = standings
            .iter()
            .position(|(p, _)| *p == self.me)
            .ok_or(EngineError::MissingScore(self.me))?;
        let convert_cost = self.constants.convert_cost();

        let target = if rank == 0 {
            let lead = standings
                .get(1)
                .map_or(Fixed::ZERO, |(_, runner_up)| mine - *runner_up);
            units.saturating_add(whole(lead, convert_cost))
        } else if rank + 1 == standings.len() {
            let gap = standings[0].1 - mine;
            cfg.max_units
                .max(units.saturating_add(whole_ceil(gap, self.constants.spawn_cost())))
        } else {
            let gap_up = standings[0].1 - mine;
            let gap_down = mine - standings[rank + 1].1;
            let share = if gap_up >= gap_down {
                cfg.conservative_percent
            } else {
                cfg.radical_percent
            };
            units.saturating_add(whole(gap_down.saturating_mul(percent(share)), convert_cost))
        };
        Ok(target)
    }

    /// Order spawns up to the target fleet size while the bank lasts.
    ///
    /// Free bases (no unit on them, cell unclaimed) are ranked by the total
    /// forecast yield around them, richest first, ties by base id. Returns
    /// the bases that spawn.
    pub fn plan_production(
        &self,
        turn: u32,
        scoreboard: &Scoreboard,
        ledger: &mut TurnLedger,
    ) -> Result<Vec<BaseId>> {
        let target = self.target_fleet_size(turn, scoreboard)?;
        let units = self.board.units_of(self.me).count();
        let spawn_cost = self.constants.spawn_cost();

        let mut ranked: Vec<(Base, Fixed)> = Vec::new();
        for base in self.board.bases_of(self.me) {
            if self.board.unit_at(base.position)?.is_some()
                || ledger.reservations().is_claimed(base.position)
            {
                continue;
            }
            let radar = self
                .scanner
                .scan_base(base, self.config.spawn_radar_radius)?;
            ranked.push((*base, radar.forecast_total()));
        }
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.id.cmp(&b.0.id)));

        let mut spawned = Vec::new();
        for (base, _) in ranked {
            if units + spawned.len() >= target as usize || ledger.bank() < spawn_cost {
                break;
            }
            ledger.commit_spawn(&base, spawn_cost)?;
            spawned.push(base.id);
        }

        if !spawned.is_empty() {
            info!(turn, target, units, spawns = spawned.len(), "production planned");
        }
        Ok(spawned)
    }

    /// With no base left, convert the unit standing on the poorest cell.
    ///
    /// Only units whose cargo plus the bank covers the conversion qualify.
    /// Returns the converting unit, if any.
    pub fn bootstrap_conversion(
        &self,
        ledger: &mut TurnLedger,
        policy: &mut dyn SelectionPolicy,
    ) -> Result<Option<UnitId>> {
        if self.board.bases_of(self.me).next().is_some() {
            return Ok(None);
        }

        let convert_cost = self.constants.convert_cost();
        let bank = ledger.bank();
        let affordable: Vec<&Unit> = self
            .board
            .units_of(self.me)
            .filter(|u| !ledger.has_committed(u.id))
            .filter(|u| u.cargo.saturating_add(bank) >= convert_cost)
            .collect();

        let Some(poorest) = affordable
            .iter()
            .map(|u| self.board.resource_at(u.position))
            .min()
        else {
            if self.board.units_of(self.me).next().is_some() {
                warn!(bank = %bank, "no base and no unit can afford to convert");
            }
            return Ok(None);
        };

        let candidates: Vec<&Unit> = affordable
            .into_iter()
            .filter(|u| self.board.resource_at(u.position) == poorest)
            .collect();
        let Some(unit) = choose(policy, &candidates).copied() else {
            return Ok(None);
        };

        ledger.commit_unit(unit, UnitAction::Convert)?;
        ledger.spend(convert_cost.saturating_sub(unit.cargo));
        info!(unit = %unit.id, position = %unit.position, "bootstrap conversion");
        Ok(Some(unit.id))
    }
}
