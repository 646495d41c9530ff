//! Grid coordinates and the distance metrics used across the simulation.
//!
//! Coordinates are signed so that neighbor offsets can step off the grid
//! without wrapping; bounds checks belong to whoever owns the grid.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Cardinal offsets in expansion order: west, east, north, south.
///
/// Routers and neighbor scans iterate in this order, which makes every
/// tie-break in the simulation reproducible.
pub const CARDINAL_OFFSETS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// The eight surrounding offsets, column by column (`dx` outer, `dy` inner).
pub const SURROUNDING_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// A cell coordinate on the rescue grid.
///
/// Ordering is column-major (`x` first, then `y`), matching the scan order
/// of the grid layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Cell {
    /// Column, `0 <= x < width` when on the grid.
    pub x: i32,
    /// Row, `0 <= y < height` when on the grid.
    pub y: i32,
}

impl Cell {
    /// Create a cell from its coordinates.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell shifted by `(dx, dy)`.
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// Manhattan (4-connected) distance.
    pub const fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).saturating_add(self.y.abs_diff(other.y))
    }

    /// Chebyshev (king-move) distance.
    pub const fn chebyshev(self, other: Self) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        if dx > dy { dx } else { dy }
    }

    /// Whether `other` touches this cell, diagonals included, or is this cell.
    pub const fn is_adjacent(self, other: Self) -> bool {
        self.chebyshev(other) <= 1
    }

    /// The four cardinal neighbors in [`CARDINAL_OFFSETS`] order.
    pub const fn cardinal_neighbors(self) -> [Self; 4] {
        [
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(0, -1),
            self.offset(0, 1),
        ]
    }

    /// One cardinal step toward `target`.
    ///
    /// The axis with the larger remaining distance moves first; ties move
    /// along `x`. Returns `self` when already at `target`.
    pub const fn step_toward(self, target: Self) -> Self {
        let dx = target.x.saturating_sub(self.x);
        let dy = target.y.saturating_sub(self.y);
        if dx == 0 && dy == 0 {
            return self;
        }
        if dx.unsigned_abs() >= dy.unsigned_abs() {
            self.offset(dx.signum(), 0)
        } else {
            self.offset(0, dy.signum())
        }
    }

    /// One cardinal step away from `origin`, or `None` when standing on it.
    ///
    /// Mirrors [`Cell::step_toward`]: the dominant axis wins, ties go to `x`.
    pub const fn step_away_from(self, origin: Self) -> Option<Self> {
        let dx = self.x.saturating_sub(origin.x);
        let dy = self.y.saturating_sub(origin.y);
        if dx == 0 && dy == 0 {
            return None;
        }
        if dx.unsigned_abs() >= dy.unsigned_abs() {
            Some(self.offset(dx.signum(), 0))
        } else {
            Some(self.offset(0, dy.signum()))
        }
    }
}

impl core::fmt::Display for Cell {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn distances() {
        let a = Cell::new(0, 0);
        let b = Cell::new(2, -3);
        assert_eq!(a.manhattan(b), 5);
        assert_eq!(a.chebyshev(b), 3);
        assert_eq!(b.manhattan(a), 5);
    }

    #[test]
    fn adjacency_includes_diagonals_and_self() {
        let c = Cell::new(4, 4);
        assert!(c.is_adjacent(c));
        assert!(c.is_adjacent(Cell::new(5, 5)));
        assert!(!c.is_adjacent(Cell::new(6, 4)));
    }

    #[test]
    fn step_toward_prefers_larger_axis() {
        let c = Cell::new(0, 0);
        assert_eq!(c.step_toward(Cell::new(1, 3)), Cell::new(0, 1));
        assert_eq!(c.step_toward(Cell::new(-4, 2)), Cell::new(-1, 0));
    }

    #[test]
    fn step_toward_tie_moves_x() {
        let c = Cell::new(2, 2);
        assert_eq!(c.step_toward(Cell::new(0, 0)), Cell::new(1, 2));
        assert_eq!(c.step_toward(c), c);
    }

    #[test]
    fn step_away_mirrors_step_toward() {
        let c = Cell::new(3, 3);
        assert_eq!(c.step_away_from(Cell::new(3, 0)), Some(Cell::new(3, 4)));
        assert_eq!(c.step_away_from(Cell::new(5, 4)), Some(Cell::new(2, 3)));
        assert_eq!(c.step_away_from(c), None);
    }

    #[test]
    fn cardinal_neighbors_follow_offset_order() {
        let n = Cell::new(1, 1).cardinal_neighbors();
        for (cell, (dx, dy)) in n.iter().zip(CARDINAL_OFFSETS) {
            assert_eq!(*cell, Cell::new(1 + dx, 1 + dy));
        }
    }

    #[test]
    fn column_major_ordering() {
        let mut cells = vec![Cell::new(1, 0), Cell::new(0, 2), Cell::new(0, 1)];
        cells.sort();
        assert_eq!(cells, vec![Cell::new(0, 1), Cell::new(0, 2), Cell::new(1, 0)]);
    }

    #[test]
    fn serde_shape() {
        let json = serde_json::to_string(&Cell::new(3, 7)).unwrap();
        assert_eq!(json, r#"{"x":3,"y":7}"#);
    }
}
