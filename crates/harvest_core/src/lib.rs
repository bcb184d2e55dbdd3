//! # Harvest Core
//!
//! Per-turn decision engine for a fleet of harvesting units and production
//! bases on a wrapping grid.
//!
//! This crate contains **only** decision logic:
//! - No IO
//! - No system randomness (tie-breaks go through an injected policy)
//! - No floating-point math (uses fixed-point)
//!
//! Given the same snapshot, configuration and policy seed, a turn always
//! produces the same actions.
//!
//! ## Crate Structure
//!
//! - [`geometry`] - Toroidal positions, distances and steps
//! - [`estimator`] - Yield forecasts
//! - [`board`] - Frozen per-turn board snapshot
//! - [`perception`] - Radar scans and threat detection
//! - [`ledger`] / [`reservation`] - Same-turn commitments
//! - [`movement`] - Single-step move planning
//! - [`strategy`] - Per-unit state machine
//! - [`fleet`] - Production and bootstrap conversion
//! - [`orchestrator`] - The full turn pipeline
//! - [`config`] - Host constants and tunables

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod actions;
pub mod board;
pub mod config;
pub mod error;
pub mod estimator;
pub mod fleet;
pub mod geometry;
pub mod ledger;
pub mod math;
pub mod movement;
pub mod orchestrator;
pub mod perception;
pub mod reservation;
pub mod selection;
pub mod strategy;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::actions::{BaseAction, TurnActions, UnitAction};
    pub use crate::board::{Base, BaseId, BoardSnapshot, Cell, PlayerId, Unit, UnitId};
    pub use crate::config::{
        EndgameConfig, EngineConfig, FleetConfig, GameConstants, MovementConfig, StrategyConfig,
    };
    pub use crate::error::{EngineError, Result};
    pub use crate::estimator::{estimate_gain, HarvestRates, ResourceEstimator};
    pub use crate::fleet::{FleetScheduler, Scoreboard};
    pub use crate::geometry::{Direction, GridGeometry, Position};
    pub use crate::ledger::TurnLedger;
    pub use crate::math::Fixed;
    pub use crate::movement::{MovementPlanner, PlannedStep, StepClass, StepKind};
    pub use crate::orchestrator::{TurnInput, TurnOrchestrator, TurnReport};
    pub use crate::perception::{PerceptionScanner, RadarSnapshot, ThreatRule};
    pub use crate::reservation::ReservationSet;
    pub use crate::selection::{FirstFound, SeededSelection, SelectionPolicy};
    pub use crate::strategy::{Decision, FleetState, UnitState, UnitStrategy};
}
