//! Cell-by-cell movement with per-cell hazard exposure.
//!
//! Every step lands on exactly one cell. A step onto an obstacle ends the
//! walk for this tick and the remaining planned cells are left untouched.
//! Hazard damage is charged on every cell entered, and a mover that stops
//! being able to act ends its walk where it stands.

use std::iter;

use rescue_types::Cell;
use rescue_world::Grid;

use crate::actor::{Agent, Victim};

/// Route cells consumed per tick when following a planned route.
pub(crate) const ROUTE_STEP: u32 = 1;

/// Something that walks the grid and takes hazard damage as it goes.
pub(crate) trait Mobile {
    /// Current cell.
    fn position(&self) -> Cell;

    /// Step onto `cell` and charge its hazard. Returns whether the mover can
    /// keep acting.
    fn enter(&mut self, cell: Cell, grid: &Grid, tick: u64) -> bool;
}

impl Mobile for Agent {
    fn position(&self) -> Cell {
        self.position
    }

    fn enter(&mut self, cell: Cell, grid: &Grid, tick: u64) -> bool {
        self.position = cell;
        self.moves = self.moves.saturating_add(1);
        self.apply_hazard_damage(grid, tick);
        self.is_active()
    }
}

impl Mobile for Victim {
    fn position(&self) -> Cell {
        self.position
    }

    fn enter(&mut self, cell: Cell, grid: &Grid, tick: u64) -> bool {
        self.position = cell;
        self.moves = self.moves.saturating_add(1);
        self.apply_hazard_damage(grid, tick);
        !self.is_terminal()
    }
}

/// Outcome of one walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Stride {
    /// Cells actually entered.
    pub moved: usize,
    /// The walk stopped in front of an obstacle.
    pub blocked: bool,
}

/// Walk up to `max_cells` cells of `path`, stopping early at an obstacle,
/// when the mover is incapacitated, or once `arrived` holds for the cell
/// just entered.
pub(crate) fn follow<M, I, F>(
    mover: &mut M,
    path: I,
    max_cells: u32,
    grid: &Grid,
    tick: u64,
    arrived: F,
) -> Stride
where
    M: Mobile,
    I: IntoIterator<Item = Cell>,
    F: Fn(Cell) -> bool,
{
    let mut stride = Stride::default();
    let budget = usize::try_from(max_cells).unwrap_or(usize::MAX);
    for cell in path.into_iter().take(budget) {
        if !grid.is_passable(cell) {
            stride.blocked = true;
            break;
        }
        stride.moved = stride.moved.saturating_add(1);
        if !mover.enter(cell, grid, tick) || arrived(cell) {
            break;
        }
    }
    stride
}

/// Greedy cardinal walk toward `target` without route planning.
pub(crate) fn walk_toward<M: Mobile>(
    mover: &mut M,
    target: Cell,
    max_cells: u32,
    grid: &Grid,
    tick: u64,
) -> Stride {
    let start = mover.position();
    let path = iter::successors(Some(start), |cell| {
        let next = cell.step_toward(target);
        (next != *cell).then_some(next)
    })
    .skip(1);
    follow(mover, path, max_cells, grid, tick, |_| false)
}
