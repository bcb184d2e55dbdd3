//! Test fixtures and helpers.
//!
//! Boards, scoreboards and turn inputs built the same way in every test.

use std::collections::BTreeMap;

use fixed::types::I32F32;
use harvest_core::board::{Base, BaseId, BoardSnapshot, PlayerId, Unit, UnitId};
use harvest_core::config::GameConstants;
use harvest_core::fleet::Scoreboard;
use harvest_core::geometry::Position;
use harvest_core::orchestrator::TurnInput;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Incremental board construction for tests.
///
/// Unit and base ids are handed out in insertion order starting at 1, so
/// tests can rely on the first unit added being `UnitId(1)`.
///
/// ```ignore
/// let mut builder = BoardBuilder::new(5);
/// builder.resource(2, 0, 100);
/// let me = builder.unit(0, 0, 0, 0);
/// let board = builder.build();
/// ```
#[derive(Debug, Clone)]
pub struct BoardBuilder {
    size: u32,
    resources: Vec<I32F32>,
    units: Vec<Unit>,
    bases: Vec<Base>,
    next_unit: u64,
    next_base: u64,
}

impl BoardBuilder {
    /// Empty board with the given side length.
    #[must_use]
    pub fn new(size: u32) -> Self {
        let cells = (size as usize) * (size as usize);
        Self {
            size,
            resources: vec![I32F32::ZERO; cells],
            units: Vec::new(),
            bases: Vec::new(),
            next_unit: 1,
            next_base: 1,
        }
    }

    fn index(&self, x: i32, y: i32) -> usize {
        let side = self.size as i32;
        let x = x.rem_euclid(side) as usize;
        let y = y.rem_euclid(side) as usize;
        y * self.size as usize + x
    }

    /// Set a cell's resource.
    pub fn resource(&mut self, x: i32, y: i32, amount: i32) -> &mut Self {
        let i = self.index(x, y);
        self.resources[i] = fixed(amount);
        self
    }

    /// Set every cell's resource.
    pub fn fill(&mut self, amount: i32) -> &mut Self {
        self.resources.fill(fixed(amount));
        self
    }

    /// Add a unit and return its id.
    pub fn unit(&mut self, owner: PlayerId, x: i32, y: i32, cargo: i32) -> UnitId {
        let id = UnitId(self.next_unit);
        self.next_unit += 1;
        self.units
            .push(Unit::new(id, owner, Position::new(x, y), fixed(cargo)));
        id
    }

    /// Add a base and return its id.
    pub fn base(&mut self, owner: PlayerId, x: i32, y: i32) -> BaseId {
        let id = BaseId(self.next_base);
        self.next_base += 1;
        self.bases.push(Base::new(id, owner, Position::new(x, y)));
        id
    }

    /// Freeze the board.
    ///
    /// # Panics
    ///
    /// Panics if the fixture is not a valid snapshot (shared cells, bad size).
    #[must_use]
    pub fn build(&self) -> BoardSnapshot {
        BoardSnapshot::new(
            self.size,
            self.resources.clone(),
            self.units.clone(),
            self.bases.clone(),
        )
        .expect("fixture board should be valid")
    }
}

/// Scoreboard from `(player, total)` pairs.
#[must_use]
pub fn scoreboard(totals: &[(PlayerId, i32)]) -> Scoreboard {
    Scoreboard::new(
        totals
            .iter()
            .map(|(p, t)| (*p, fixed(*t)))
            .collect::<BTreeMap<_, _>>(),
    )
}

/// Constants matching a board of `size`, otherwise the host defaults.
#[must_use]
pub fn constants(size: u32) -> GameConstants {
    GameConstants {
        size,
        ..GameConstants::default()
    }
}

/// Turn input for `me` on `board` with default constants sized to it.
#[must_use]
pub fn turn_input(board: BoardSnapshot, me: PlayerId, turn: u32, scores: Scoreboard) -> TurnInput {
    let size = board.geometry().size();
    TurnInput {
        snapshot: board,
        me,
        turn,
        scoreboard: scores,
        constants: constants(size),
    }
}
