//! Toroidal grid geometry.
//!
//! The board wraps on both axes, so every position is kept normalized into
//! `[0, N)` and distances take the shorter way around per axis.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// A cell coordinate on the board.
///
/// `x` grows east, `y` grows north. Ordering is by `x` then `y`, which the
/// engine relies on for deterministic iteration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Position {
    /// East-west coordinate.
    pub x: i32,
    /// North-south coordinate.
    pub y: i32,
}

impl Position {
    /// Create a new (not necessarily normalized) position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset this position by a raw delta, without wrapping.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the four cardinal single-step moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// `+y`.
    North,
    /// `-y`.
    South,
    /// `+x`.
    East,
    /// `-x`.
    West,
}

impl Direction {
    /// All four directions in search order.
    pub const ALL: [Self; 4] = [Self::East, Self::West, Self::North, Self::South];

    /// Raw `(dx, dy)` offset of this move.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, 1),
            Self::South => (0, -1),
            Self::East => (1, 0),
            Self::West => (-1, 0),
        }
    }

    /// Direction for a unit offset, if it is one.
    #[must_use]
    pub const fn from_offset(dx: i32, dy: i32) -> Option<Self> {
        match (dx, dy) {
            (0, 1) => Some(Self::North),
            (0, -1) => Some(Self::South),
            (1, 0) => Some(Self::East),
            (-1, 0) => Some(Self::West),
            _ => None,
        }
    }
}

/// Return the shorter of the two wrap-around offsets for a raw axis delta.
///
/// On an exact tie (`|delta| == N/2`) the raw direction is kept.
///
/// Example: size 5, delta 3 -> -2.
#[must_use]
pub fn shorter_offset(delta: i32, size: i32) -> i32 {
    let forward = delta.rem_euclid(size);
    if forward == 0 {
        return 0;
    }
    let backward = forward - size;
    match forward.cmp(&-backward) {
        std::cmp::Ordering::Less => forward,
        std::cmp::Ordering::Greater => backward,
        std::cmp::Ordering::Equal => {
            if delta < 0 {
                backward
            } else {
                forward
            }
        }
    }
}

/// Signed unit step (-1, 0, +1) along the shorter wrap-around path.
///
/// This is not the sign of the raw offset: on a side-5 board an offset of
/// `+4` is reached fastest by stepping `-1` across the seam.
#[must_use]
pub fn shortest_axis_step(delta: i32, size: i32) -> i32 {
    shorter_offset(delta, size).signum()
}

/// Arithmetic on an `N x N` torus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridGeometry {
    size: i32,
}

impl GridGeometry {
    /// Create the geometry for a board of side `size`.
    pub fn new(size: u32) -> Result<Self> {
        if size == 0 || size > i32::MAX as u32 {
            return Err(EngineError::InvalidGridSize(size));
        }
        Ok(Self { size: size as i32 })
    }

    /// Board side length.
    #[must_use]
    pub const fn size(self) -> u32 {
        self.size as u32
    }

    /// Number of cells on the board.
    #[must_use]
    pub const fn cell_count(self) -> usize {
        (self.size as usize) * (self.size as usize)
    }

    /// Reduce each axis modulo `N` into `[0, N)`.
    #[must_use]
    pub fn normalize(self, p: Position) -> Position {
        Position::new(p.x.rem_euclid(self.size), p.y.rem_euclid(self.size))
    }

    /// Row-major index of a position (normalized first).
    #[must_use]
    pub fn index(self, p: Position) -> usize {
        let p = self.normalize(p);
        (p.y as usize) * (self.size as usize) + (p.x as usize)
    }

    /// Toroidal Manhattan distance.
    #[must_use]
    pub fn distance(self, a: Position, b: Position) -> u32 {
        let dx = shorter_offset(b.x - a.x, self.size).unsigned_abs();
        let dy = shorter_offset(b.y - a.y, self.size).unsigned_abs();
        dx + dy
    }

    /// Unit step along one axis toward the shorter side of the torus.
    #[must_use]
    pub fn shortest_axis_step(self, delta: i32) -> i32 {
        shortest_axis_step(delta, self.size)
    }

    /// Shorter signed offset along one axis.
    #[must_use]
    pub fn shorter_offset(self, delta: i32) -> i32 {
        shorter_offset(delta, self.size)
    }

    /// Decompose the displacement `from -> to` into up to two single-axis
    /// steps, x-axis first. Empty when the positions coincide.
    #[must_use]
    pub fn direct_steps(self, from: Position, to: Position) -> Vec<Direction> {
        let from = self.normalize(from);
        let to = self.normalize(to);
        let sx = self.shortest_axis_step(to.x - from.x);
        let sy = self.shortest_axis_step(to.y - from.y);

        [Direction::from_offset(sx, 0), Direction::from_offset(0, sy)]
            .into_iter()
            .flatten()
            .collect()
    }

    /// Position reached by one step in `direction`.
    #[must_use]
    pub fn step(self, p: Position, direction: Direction) -> Position {
        let (dx, dy) = direction.offset();
        self.normalize(p.offset(dx, dy))
    }

    /// Every distinct normalized position within Manhattan distance
    /// `radius` of `center`, sorted.
    ///
    /// On small boards the disk can wrap onto itself; duplicates collapse.
    #[must_use]
    pub fn disk(self, center: Position, radius: u32) -> Vec<Position> {
        let r = radius as i32;
        let mut cells = BTreeSet::new();
        for dx in -r..=r {
            let span = r - dx.abs();
            for dy in -span..=span {
                cells.insert(self.normalize(center.offset(dx, dy)));
            }
        }
        cells.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn grid(n: u32) -> GridGeometry {
        GridGeometry::new(n).unwrap()
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(matches!(
            GridGeometry::new(0),
            Err(EngineError::InvalidGridSize(0))
        ));
    }

    #[test]
    fn test_normalize_wraps_negative() {
        let g = grid(5);
        assert_eq!(g.normalize(Position::new(-2, -7)), Position::new(3, 3));
        assert_eq!(g.normalize(Position::new(5, 11)), Position::new(0, 1));
    }

    #[test]
    fn test_shorter_offset() {
        assert_eq!(shorter_offset(3, 5), -2);
        assert_eq!(shorter_offset(-3, 5), 2);
        assert_eq!(shorter_offset(2, 5), 2);
        assert_eq!(shorter_offset(0, 5), 0);
        assert_eq!(shorter_offset(5, 5), 0);
        // Ties keep the raw direction
        assert_eq!(shorter_offset(2, 4), 2);
        assert_eq!(shorter_offset(-2, 4), -2);
    }

    #[test]
    fn test_shortest_axis_step_crosses_seam() {
        // Raw +4 on a side-5 board is one step backwards across the seam
        assert_eq!(shortest_axis_step(4, 5), -1);
        assert_eq!(shortest_axis_step(-4, 5), 1);
        assert_eq!(shortest_axis_step(1, 5), 1);
        assert_eq!(shortest_axis_step(0, 5), 0);
    }

    #[test]
    fn test_distance_wraps() {
        let g = grid(21);
        assert_eq!(g.distance(Position::new(0, 0), Position::new(20, 20)), 2);
        assert_eq!(g.distance(Position::new(0, 0), Position::new(10, 0)), 10);
        assert_eq!(g.distance(Position::new(0, 0), Position::new(11, 0)), 10);
    }

    #[test]
    fn test_direct_steps() {
        let g = grid(5);
        let steps = g.direct_steps(Position::new(0, 0), Position::new(2, 0));
        assert_eq!(steps, vec![Direction::East]);

        let steps = g.direct_steps(Position::new(0, 0), Position::new(4, 4));
        assert_eq!(steps, vec![Direction::West, Direction::South]);

        assert!(g
            .direct_steps(Position::new(1, 1), Position::new(6, 6))
            .is_empty());
    }

    #[test]
    fn test_step_wraps() {
        let g = grid(5);
        assert_eq!(
            g.step(Position::new(0, 0), Direction::West),
            Position::new(4, 0)
        );
        assert_eq!(
            g.step(Position::new(2, 4), Direction::North),
            Position::new(2, 0)
        );
    }

    #[test]
    fn test_disk_sizes() {
        let g = grid(21);
        assert_eq!(g.disk(Position::new(0, 0), 0).len(), 1);
        assert_eq!(g.disk(Position::new(0, 0), 1).len(), 5);
        assert_eq!(g.disk(Position::new(0, 0), 2).len(), 13);
        // Side-3 board: a radius-2 disk covers the whole board once
        assert_eq!(grid(3).disk(Position::new(1, 1), 2).len(), 9);
    }

    #[test]
    fn test_direction_round_trip_offsets() {
        for d in Direction::ALL {
            let (dx, dy) = d.offset();
            assert_eq!(Direction::from_offset(dx, dy), Some(d));
        }
    }

    proptest! {
        #[test]
        fn prop_distance_symmetric_and_zero_iff_equal(
            n in 1u32..40,
            ax in -100i32..100, ay in -100i32..100,
            bx in -100i32..100, by in -100i32..100,
        ) {
            let g = grid(n);
            let a = g.normalize(Position::new(ax, ay));
            let b = g.normalize(Position::new(bx, by));
            prop_assert_eq!(g.distance(a, b), g.distance(b, a));
            prop_assert_eq!(g.distance(a, b) == 0, a == b);
        }

        #[test]
        fn prop_distance_triangle_inequality(
            n in 1u32..30,
            pts in proptest::collection::vec((0i32..30, 0i32..30), 3),
        ) {
            let g = grid(n);
            let a = g.normalize(Position::new(pts[0].0, pts[0].1));
            let b = g.normalize(Position::new(pts[1].0, pts[1].1));
            let c = g.normalize(Position::new(pts[2].0, pts[2].1));
            prop_assert!(g.distance(a, c) <= g.distance(a, b) + g.distance(b, c));
        }

        #[test]
        fn prop_direct_step_reduces_distance(
            n in 2u32..30,
            ax in 0i32..30, ay in 0i32..30,
            bx in 0i32..30, by in 0i32..30,
        ) {
            let g = grid(n);
            let a = g.normalize(Position::new(ax, ay));
            let b = g.normalize(Position::new(bx, by));
            for d in g.direct_steps(a, b) {
                prop_assert_eq!(g.distance(g.step(a, d), b) + 1, g.distance(a, b));
            }
        }
    }
}
