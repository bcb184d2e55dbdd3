//! Host constants and tunable engine configuration.
//!
//! Everything here is plain data meant to be written as RON. Quantities are
//! integers in resource units; rates are integer percentages.
//!
//! # Example RON
//!
//! ```ron
//! EngineConfig(
//!     strategy: StrategyConfig(
//!         radar_radius: 2,
//!         max_radar_radius: 5,
//!         deposit_cargo: 300,
//!         security_distance: 1,
//!         expansion_resource: 1500,
//!         min_base_spacing: 4,
//!         collect_cap_multiplier: 10,
//!         max_iterations: 12,
//!         hunt_richer_enemies: true,
//!     ),
//!     movement: MovementConfig(wait_percent: 50, threat_rule: AtMostOwnCargo),
//!     fleet: FleetConfig(
//!         max_units: 20,
//!         spawn_radar_radius: 2,
//!         scale_start_turn: 100,
//!         decay_start_turn: 300,
//!         conservative_percent: 25,
//!         radical_percent: 75,
//!     ),
//!     endgame: EndgameConfig(window: 10),
//! )
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::estimator::HarvestRates;
use crate::math::{amount, Fixed, MAX_AMOUNT};
use crate::perception::ThreatRule;

/// Static constants published by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConstants {
    /// Board side length.
    pub size: u32,
    /// Resource spent to turn a unit into a base.
    pub convert_cost: u32,
    /// Resource spent to produce a unit.
    pub spawn_cost: u32,
    /// Percent of a cell's resource extracted per turn.
    pub collect_rate_percent: u32,
    /// Percent growth per turn of an unharvested cell.
    pub regen_rate_percent: u32,
    /// Total number of turns in a game.
    pub episode_turns: u32,
}

impl Default for GameConstants {
    fn default() -> Self {
        Self {
            size: 21,
            convert_cost: 500,
            spawn_cost: 500,
            collect_rate_percent: 25,
            regen_rate_percent: 2,
            episode_turns: 400,
        }
    }
}

impl GameConstants {
    /// Conversion cost as a resource amount.
    #[must_use]
    pub fn convert_cost(&self) -> Fixed {
        amount(self.convert_cost)
    }

    /// Spawn cost as a resource amount.
    #[must_use]
    pub fn spawn_cost(&self) -> Fixed {
        amount(self.spawn_cost)
    }

    /// Extraction and regeneration rates.
    #[must_use]
    pub fn harvest_rates(&self) -> HarvestRates {
        HarvestRates::from_percent(self.collect_rate_percent, self.regen_rate_percent)
    }

    /// Check the constants describe a playable game.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(EngineError::InvalidGridSize(self.size));
        }
        if self.collect_rate_percent > 100 {
            return Err(EngineError::InvalidConfig(format!(
                "collect_rate_percent {} exceeds 100",
                self.collect_rate_percent
            )));
        }
        if self.episode_turns < 2 {
            return Err(EngineError::InvalidConfig(
                "episode_turns must be at least 2".to_string(),
            ));
        }
        check_amount("convert_cost", self.convert_cost)?;
        check_amount("spawn_cost", self.spawn_cost)?;
        check_amount("regen_rate_percent", self.regen_rate_percent)?;
        Ok(())
    }
}

/// Reject quantities a [`Fixed`] amount cannot represent.
fn check_amount(field: &str, value: u32) -> Result<()> {
    if value > MAX_AMOUNT {
        return Err(EngineError::InvalidConfig(format!(
            "{field} {value} exceeds {MAX_AMOUNT}"
        )));
    }
    Ok(())
}

/// Per-unit state machine thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Radar radius each unit starts its turn with.
    pub radar_radius: u32,
    /// Upper bound for EXPLORE radius growth.
    pub max_radar_radius: u32,
    /// Cargo at which a unit heads home.
    pub deposit_cargo: u32,
    /// Distance within which a qualifying enemy counts as a threat.
    ///
    /// Threats are read off the unit's radar, so this may not exceed
    /// `radar_radius`.
    pub security_distance: u32,
    /// Scanned resource total that justifies founding a new base.
    pub expansion_resource: u32,
    /// No new base within this distance of an existing one.
    pub min_base_spacing: u32,
    /// COLLECT leaves once cargo reaches this multiple of the board mean.
    pub collect_cap_multiplier: u32,
    /// Bound on same-turn re-evaluations per unit.
    ///
    /// Must cover every radar widening from `radar_radius` to
    /// `max_radar_radius` plus [`StrategyConfig::STATE_HOPS`] passes.
    pub max_iterations: u32,
    /// Treat richer enemy units inside the radar as harvestable.
    pub hunt_richer_enemies: bool,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            radar_radius: 2,
            max_radar_radius: 5,
            deposit_cargo: 300,
            security_distance: 1,
            expansion_resource: 1500,
            min_base_spacing: 4,
            collect_cap_multiplier: 10,
            max_iterations: 12,
            hunt_richer_enemies: true,
        }
    }
}

impl StrategyConfig {
    /// Evaluation passes a unit may spend switching state before it acts:
    /// COLLECT to DEPOSIT, DEPOSIT to EXPLORE, then the acting pass.
    pub const STATE_HOPS: u32 = 3;

    /// Smallest `max_iterations` that never cuts an evaluation short.
    #[must_use]
    pub fn min_iterations(&self) -> u32 {
        self.max_radar_radius
            .saturating_sub(self.radar_radius)
            .saturating_add(Self::STATE_HOPS)
    }

    /// Deposit threshold as a resource amount.
    #[must_use]
    pub fn deposit_cargo(&self) -> Fixed {
        amount(self.deposit_cargo)
    }

    /// Expansion threshold as a resource amount.
    #[must_use]
    pub fn expansion_resource(&self) -> Fixed {
        amount(self.expansion_resource)
    }
}

/// Movement planner tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Chance (percent) of waiting instead of side-stepping when every
    /// direct step is on hold.
    pub wait_percent: u32,
    /// Which enemy units count as threats.
    pub threat_rule: ThreatRule,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            wait_percent: 50,
            threat_rule: ThreatRule::AtMostOwnCargo,
        }
    }
}

/// Production and fleet-size tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Baseline fleet size.
    pub max_units: u32,
    /// Radar radius used to rank bases by local yield.
    pub spawn_radar_radius: u32,
    /// First turn of score-driven fleet scaling.
    pub scale_start_turn: u32,
    /// First turn of the late-game fleet decay.
    pub decay_start_turn: u32,
    /// Share of the gap below spent when squeezed from above.
    pub conservative_percent: u32,
    /// Share of the gap below spent when the leader is within reach.
    pub radical_percent: u32,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            max_units: 20,
            spawn_radar_radius: 2,
            scale_start_turn: 100,
            decay_start_turn: 300,
            conservative_percent: 25,
            radical_percent: 75,
        }
    }
}

/// End-of-game behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndgameConfig {
    /// Number of final turns during which every unit heads home.
    pub window: u32,
}

impl Default for EndgameConfig {
    fn default() -> Self {
        Self { window: 10 }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Unit state machine thresholds.
    #[serde(default)]
    pub strategy: StrategyConfig,
    /// Movement planner tuning.
    #[serde(default)]
    pub movement: MovementConfig,
    /// Fleet scheduling.
    #[serde(default)]
    pub fleet: FleetConfig,
    /// End-game mode.
    #[serde(default)]
    pub endgame: EndgameConfig,
}

impl EngineConfig {
    /// Parse a configuration from RON text and validate it.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: Self =
            ron::from_str(text).map_err(|e| EngineError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render this configuration as pretty RON.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| EngineError::ConfigParse(e.to_string()))
    }

    /// Reject inconsistent settings.
    pub fn validate(&self) -> Result<()> {
        let s = &self.strategy;
        if s.radar_radius == 0 {
            return Err(EngineError::InvalidConfig(
                "radar_radius must be positive".to_string(),
            ));
        }
        if s.max_radar_radius < s.radar_radius {
            return Err(EngineError::InvalidConfig(format!(
                "max_radar_radius {} is below radar_radius {}",
                s.max_radar_radius, s.radar_radius
            )));
        }
        if s.max_iterations < s.min_iterations() {
            return Err(EngineError::InvalidConfig(format!(
                "max_iterations {} is below {} (radar widenings plus state hops)",
                s.max_iterations,
                s.min_iterations()
            )));
        }
        if s.security_distance > s.radar_radius {
            return Err(EngineError::InvalidConfig(format!(
                "security_distance {} reaches past radar_radius {}",
                s.security_distance, s.radar_radius
            )));
        }
        check_amount("deposit_cargo", s.deposit_cargo)?;
        check_amount("expansion_resource", s.expansion_resource)?;
        check_amount("collect_cap_multiplier", s.collect_cap_multiplier)?;
        if let ThreatRule::DistanceDiscounted { margin_per_step } = self.movement.threat_rule {
            check_amount("margin_per_step", margin_per_step)?;
        }
        if self.movement.wait_percent > 100 {
            return Err(EngineError::InvalidConfig(format!(
                "wait_percent {} exceeds 100",
                self.movement.wait_percent
            )));
        }
        let f = &self.fleet;
        if f.decay_start_turn < f.scale_start_turn {
            return Err(EngineError::InvalidConfig(format!(
                "decay_start_turn {} precedes scale_start_turn {}",
                f.decay_start_turn, f.scale_start_turn
            )));
        }
        if f.conservative_percent > 100 || f.radical_percent > 100 {
            return Err(EngineError::InvalidConfig(
                "spend percentages must not exceed 100".to_string(),
            ));
        }
        Ok(())
    }
}
