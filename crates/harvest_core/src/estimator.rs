//! Forward-looking yield forecasts.
//!
//! A cell's worth to a unit is what it can extract inside a fixed horizon:
//! the resource keeps regenerating while the unit is in transit, then every
//! turn spent on the cell takes a fixed fraction of what is left.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, percent, powi, Fixed};

/// Host extraction and regeneration rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestRates {
    /// Fraction of a cell's resource extracted per turn spent on it.
    #[serde(with = "fixed_serde")]
    pub collect_rate: Fixed,
    /// Per-turn growth of an unharvested cell.
    #[serde(with = "fixed_serde")]
    pub regen_rate: Fixed,
}

impl HarvestRates {
    /// Build rates from integer percentages.
    #[must_use]
    pub fn from_percent(collect: u32, regen: u32) -> Self {
        Self {
            collect_rate: percent(collect),
            regen_rate: percent(regen),
        }
    }
}

impl Default for HarvestRates {
    fn default() -> Self {
        Self::from_percent(25, 2)
    }
}

/// Forecast the net harvestable yield of a cell.
///
/// Returns zero when the unit cannot arrive before the horizon closes
/// (`travel_dist >= horizon`) and for empty or negative amounts.
#[must_use]
pub fn estimate_gain(
    amount: Fixed,
    travel_dist: u32,
    horizon: u32,
    collect_rate: Fixed,
    regen_rate: Fixed,
) -> Fixed {
    if travel_dist >= horizon || amount <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let transit_turns = travel_dist.saturating_sub(1);
    let grown = amount.saturating_mul(powi(Fixed::ONE + regen_rate, transit_turns));

    let dwell_turns = horizon - travel_dist;
    let left_behind = powi(Fixed::ONE - collect_rate, dwell_turns);
    grown.saturating_mul(Fixed::ONE - left_behind)
}

/// Yield estimator bound to the host's rates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceEstimator {
    rates: HarvestRates,
}

impl ResourceEstimator {
    /// Create an estimator for the given rates.
    #[must_use]
    pub const fn new(rates: HarvestRates) -> Self {
        Self { rates }
    }

    /// The rates this estimator forecasts with.
    #[must_use]
    pub const fn rates(&self) -> HarvestRates {
        self.rates
    }

    /// Forecast using the bound rates. See [`estimate_gain`].
    #[must_use]
    pub fn estimate_gain(&self, amount: Fixed, travel_dist: u32, horizon: u32) -> Fixed {
        estimate_gain(
            amount,
            travel_dist,
            horizon,
            self.rates.collect_rate,
            self.rates.regen_rate,
        )
    }
}
