//! Headless turn runner for bot testing and CI verification.
//!
//! This crate wraps the decision engine in a small command-line adapter:
//!
//! - **Scenario files**: one frozen turn (board, rosters, scores) as RON
//! - **Action output**: host-shaped actions as JSON lines on stdout
//! - **Determinism checks**: seeded reruns must hash identically
//!
//! Logs go to stderr so stdout stays machine-readable.
//!
//! See [`protocol`] for the output format.
//!
//! # Example
//!
//! ```bash
//! # Decide one turn of the built-in opening
//! cargo run -p harvest_headless -- decide --scenario opening
//!
//! # Decide a scenario file with a custom engine config
//! cargo run -p harvest_headless -- decide --scenario turn.ron --config engine.ron
//!
//! # Verify determinism
//! cargo run -p harvest_headless -- verify --scenario opening --runs 10
//! ```

pub mod protocol;
pub mod runner;
pub mod scenario;

pub use protocol::{encode_actions, TurnOutput, VerifyOutput};
pub use runner::HeadlessRunner;
pub use scenario::{Scenario, ScenarioError};
