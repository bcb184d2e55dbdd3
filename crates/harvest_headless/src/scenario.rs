//! Scenario loading and configuration.
//!
//! A scenario is one frozen turn as the host would hand it over: the board,
//! every unit and base, the scoreboard, and the host constants. Quantities
//! are whole resource units.

use std::collections::BTreeMap;
use std::path::Path;

use harvest_core::board::{Base, BaseId, BoardSnapshot, PlayerId, Unit, UnitId};
use harvest_core::config::{EngineConfig, GameConstants};
use harvest_core::error::EngineError;
use harvest_core::fleet::Scoreboard;
use harvest_core::geometry::{GridGeometry, Position};
use harvest_core::math::{amount, Fixed, MAX_AMOUNT};
use harvest_core::orchestrator::TurnInput;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Failed to write RON.
    #[error("Failed to serialize scenario: {0}")]
    WriteError(#[from] ron::Error),
    /// Parsed, but not a usable turn.
    #[error("Invalid scenario: {0}")]
    Invalid(String),
    /// Rejected by the engine.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// A resource pile on one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// Resource on the cell.
    pub amount: u32,
}

impl Deposit {
    /// Create a deposit.
    #[must_use]
    pub const fn new(x: i32, y: i32, amount: u32) -> Self {
        Self { x, y, amount }
    }
}

/// A unit on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPlacement {
    /// Host id.
    pub id: u64,
    /// Owning player.
    pub owner: PlayerId,
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// Carried resource.
    #[serde(default)]
    pub cargo: u32,
}

impl UnitPlacement {
    /// Create a unit placement.
    #[must_use]
    pub const fn new(id: u64, owner: PlayerId, x: i32, y: i32, cargo: u32) -> Self {
        Self {
            id,
            owner,
            x,
            y,
            cargo,
        }
    }
}

/// A base on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasePlacement {
    /// Host id.
    pub id: u64,
    /// Owning player.
    pub owner: PlayerId,
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl BasePlacement {
    /// Create a base placement.
    #[must_use]
    pub const fn new(id: u64, owner: PlayerId, x: i32, y: i32) -> Self {
        Self { id, owner, x, y }
    }
}

/// A complete single-turn scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// The player to decide for.
    pub me: PlayerId,
    /// Zero-based turn index.
    pub turn: u32,
    /// Host constants; `size` is the board side.
    #[serde(default)]
    pub constants: GameConstants,
    /// Resource on every cell not listed in `deposits`.
    #[serde(default)]
    pub background: u32,
    /// Cells with their own resource amount.
    #[serde(default)]
    pub deposits: Vec<Deposit>,
    /// Every unit on the board.
    #[serde(default)]
    pub units: Vec<UnitPlacement>,
    /// Every base on the board.
    #[serde(default)]
    pub bases: Vec<BasePlacement>,
    /// Resource total per player.
    pub scores: Vec<(PlayerId, u32)>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::opening()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Render as pretty RON.
    pub fn to_ron_string(&self) -> Result<String, ScenarioError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// Resolve a built-in preset name, or load the path.
    pub fn resolve(name_or_path: &str) -> Result<Self, ScenarioError> {
        match name_or_path {
            "opening" => Ok(Self::opening()),
            "midgame" => Ok(Self::midgame()),
            path => Self::load(path),
        }
    }

    /// First turn of a standard two-player game: one unit each, full banks.
    #[must_use]
    pub fn opening() -> Self {
        Self {
            name: "Opening".to_string(),
            description: "Turn 0, one unit per player, no bases yet".to_string(),
            me: 0,
            turn: 0,
            constants: GameConstants::default(),
            background: 40,
            deposits: vec![
                Deposit::new(5, 5, 300),
                Deposit::new(15, 15, 300),
                Deposit::new(10, 10, 500),
                Deposit::new(5, 15, 200),
                Deposit::new(15, 5, 200),
            ],
            units: vec![
                UnitPlacement::new(1, 0, 5, 10, 0),
                UnitPlacement::new(2, 1, 15, 10, 0),
            ],
            bases: Vec::new(),
            scores: vec![(0, 5000), (1, 5000)],
        }
    }

    /// Mid-game turn with bases, loaded units and a trailing rival.
    #[must_use]
    pub fn midgame() -> Self {
        Self {
            name: "Midgame".to_string(),
            description: "Turn 150, both players established".to_string(),
            me: 0,
            turn: 150,
            constants: GameConstants::default(),
            background: 25,
            deposits: vec![
                Deposit::new(3, 4, 420),
                Deposit::new(8, 8, 380),
                Deposit::new(12, 2, 260),
                Deposit::new(17, 14, 510),
            ],
            units: vec![
                UnitPlacement::new(1, 0, 5, 6, 0),
                UnitPlacement::new(2, 0, 3, 3, 320),
                UnitPlacement::new(3, 0, 8, 7, 90),
                UnitPlacement::new(4, 0, 6, 5, 0),
                UnitPlacement::new(5, 1, 15, 15, 40),
                UnitPlacement::new(6, 1, 9, 8, 600),
                UnitPlacement::new(7, 1, 16, 13, 0),
            ],
            bases: vec![
                BasePlacement::new(1, 0, 5, 5),
                BasePlacement::new(2, 1, 15, 14),
            ],
            scores: vec![(0, 3200), (1, 2700)],
        }
    }

    /// Build the engine's turn input.
    ///
    /// Deposits and placements outside the board wrap around.
    pub fn to_turn_input(&self) -> Result<TurnInput, ScenarioError> {
        self.constants.validate()?;
        let size = self.constants.size;
        let geometry = GridGeometry::new(size)?;

        let mut resources = vec![quantity("background", self.background)?; geometry.cell_count()];
        for deposit in &self.deposits {
            let p = geometry.normalize(Position::new(deposit.x, deposit.y));
            resources[geometry.index(p)] = quantity("deposit amount", deposit.amount)?;
        }

        let units = self
            .units
            .iter()
            .map(|u| {
                Ok(Unit::new(
                    UnitId(u.id),
                    u.owner,
                    Position::new(u.x, u.y),
                    quantity("cargo", u.cargo)?,
                ))
            })
            .collect::<Result<Vec<_>, ScenarioError>>()?;
        let bases = self
            .bases
            .iter()
            .map(|b| Base::new(BaseId(b.id), b.owner, Position::new(b.x, b.y)))
            .collect();
        let snapshot = BoardSnapshot::new(size, resources, units, bases)?;

        let mut totals = BTreeMap::new();
        for (player, total) in &self.scores {
            if totals.insert(*player, quantity("score", *total)?).is_some() {
                return Err(ScenarioError::Invalid(format!(
                    "player {player} is scored twice"
                )));
            }
        }

        Ok(TurnInput {
            snapshot,
            me: self.me,
            turn: self.turn,
            scoreboard: Scoreboard::new(totals),
            constants: self.constants,
        })
    }
}

/// Widen a scenario quantity, rejecting what a resource amount cannot hold.
fn quantity(field: &str, value: u32) -> Result<Fixed, ScenarioError> {
    if value > MAX_AMOUNT {
        return Err(ScenarioError::Invalid(format!(
            "{field} {value} exceeds {MAX_AMOUNT}"
        )));
    }
    Ok(amount(value))
}

/// Load an engine configuration from a RON file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ScenarioError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ScenarioError::FileNotFound(path.display().to_string()));
    }
    let contents = std::fs::read_to_string(path)?;
    Ok(EngineConfig::from_ron_str(&contents)?)
}
