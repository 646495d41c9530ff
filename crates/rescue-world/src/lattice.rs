//! Column-major indexing shared by every per-cell layer.
//!
//! Index `i` holds cell `(i / height, i % height)`, so walking a layer in
//! index order visits columns left to right, each top to bottom. Grid and
//! belief layers, the router's scratch buffers, and render snapshots all use
//! this layout.

use rescue_types::Cell;

/// Shape of a rectangular grid and the mapping between cells and indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lattice {
    width: i32,
    height: i32,
}

impl Lattice {
    /// Build a lattice, `None` if either side is zero or exceeds `i32::MAX`.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        let width = i32::try_from(width).ok()?;
        let height = i32::try_from(height).ok()?;
        (width > 0 && height > 0).then_some(Self { width, height })
    }

    /// Width in cells.
    pub const fn width(self) -> u32 {
        self.width.unsigned_abs()
    }

    /// Height in cells.
    pub const fn height(self) -> u32 {
        self.height.unsigned_abs()
    }

    /// Number of cells.
    pub fn len(self) -> usize {
        let width = usize::try_from(self.width).unwrap_or(0);
        let height = usize::try_from(self.height).unwrap_or(0);
        width.saturating_mul(height)
    }

    /// Always `false`; a lattice has at least one cell.
    pub const fn is_empty(self) -> bool {
        false
    }

    /// Whether `cell` lies on the grid.
    pub const fn contains(self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height
    }

    /// Whether `cell` lies on the outer ring.
    pub const fn is_border(self, cell: Cell) -> bool {
        self.contains(cell)
            && (cell.x == 0
                || cell.y == 0
                || cell.x == self.width.saturating_sub(1)
                || cell.y == self.height.saturating_sub(1))
    }

    /// Layer index of `cell`, `None` when off the grid.
    pub fn index(self, cell: Cell) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let column = usize::try_from(cell.x).ok()?;
        let row = usize::try_from(cell.y).ok()?;
        let height = usize::try_from(self.height).ok()?;
        column.checked_mul(height)?.checked_add(row)
    }

    /// Cell stored at layer index `index`, `None` past the end.
    pub fn cell(self, index: usize) -> Option<Cell> {
        let height = usize::try_from(self.height).ok()?;
        let x = i32::try_from(index.checked_div(height)?).ok()?;
        let y = i32::try_from(index.checked_rem(height)?).ok()?;
        let cell = Cell::new(x, y);
        self.contains(cell).then_some(cell)
    }

    /// Every cell in layer order.
    pub fn cells(self) -> impl Iterator<Item = Cell> {
        let height = self.height;
        (0..self.width).flat_map(move |x| (0..height).map(move |y| Cell::new(x, y)))
    }

    /// Cells of the Chebyshev box of `radius` around `center`, clipped to
    /// the grid, in layer order.
    pub fn square(self, center: Cell, radius: u32) -> impl Iterator<Item = Cell> {
        let radius = i32::try_from(radius).unwrap_or(i32::MAX);
        let min_x = center.x.saturating_sub(radius).max(0);
        let max_x = center.x.saturating_add(radius).min(self.width.saturating_sub(1));
        let min_y = center.y.saturating_sub(radius).max(0);
        let max_y = center.y.saturating_add(radius).min(self.height.saturating_sub(1));
        (min_x..=max_x).flat_map(move |x| (min_y..=max_y).map(move |y| Cell::new(x, y)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_shapes() {
        assert!(Lattice::new(0, 5).is_none());
        assert!(Lattice::new(5, 0).is_none());
        assert!(Lattice::new(1, 1).is_some());
    }

    #[test]
    fn index_and_cell_are_inverse() {
        let lattice = Lattice::new(4, 3).unwrap();
        for (i, cell) in lattice.cells().enumerate() {
            assert_eq!(lattice.index(cell), Some(i));
            assert_eq!(lattice.cell(i), Some(cell));
        }
        assert_eq!(lattice.len(), 12);
        assert_eq!(lattice.cell(12), None);
    }

    #[test]
    fn layer_order_is_column_major() {
        let lattice = Lattice::new(2, 2).unwrap();
        let cells: Vec<Cell> = lattice.cells().collect();
        assert_eq!(
            cells,
            vec![Cell::new(0, 0), Cell::new(0, 1), Cell::new(1, 0), Cell::new(1, 1)]
        );
    }

    #[test]
    fn off_grid_cells_have_no_index() {
        let lattice = Lattice::new(3, 3).unwrap();
        assert_eq!(lattice.index(Cell::new(-1, 0)), None);
        assert_eq!(lattice.index(Cell::new(3, 0)), None);
        assert_eq!(lattice.index(Cell::new(0, 3)), None);
    }

    #[test]
    fn border_ring() {
        let lattice = Lattice::new(5, 4).unwrap();
        let border = lattice.cells().filter(|c| lattice.is_border(*c)).count();
        assert_eq!(border, 14);
        assert!(!lattice.is_border(Cell::new(2, 2)));
    }

    #[test]
    fn square_is_clipped() {
        let lattice = Lattice::new(5, 5).unwrap();
        assert_eq!(lattice.square(Cell::new(0, 0), 1).count(), 4);
        assert_eq!(lattice.square(Cell::new(2, 2), 1).count(), 9);
        assert_eq!(lattice.square(Cell::new(2, 2), 10).count(), 25);
    }
}
