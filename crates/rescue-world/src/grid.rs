//! The ground-truth hazard grid.
//!
//! A [`Grid`] owns four same-shaped layers: obstacles, safety zones, hazard
//! severity, and sight obstruction. Sight obstruction is never written
//! directly; it is re-derived from the hazard layer after every hazard
//! change.
//!
//! # Hazard evolution
//!
//! [`Grid::evolve`] advances fire/smoke by one step:
//!
//! | Hazard level | Spread multiplier |
//! |--------------|-------------------|
//! | Low          | 0.1               |
//! | Medium       | 0.5               |
//! | High         | 1.0               |
//!
//! Each hazardous cell tries to spread to its eight neighbors with
//! probability `multiplier x spread_chance x direction`, where direction is
//! 1.0 toward `(+1, +1)` and 0.3 everywhere else. Cells that did not receive
//! a spread then roll a 10% intensify and, independently, a 5% decay.
//!
//! # Sight obstruction
//!
//! | Hazard level | Own cell | Cardinal neighbors | Chebyshev ring 2 |
//! |--------------|----------|--------------------|------------------|
//! | Low          | 20       | -                  | -                |
//! | Medium       | 50       | 20                 | -                |
//! | High         | 80       | 50                 | 20               |
//!
//! Overlapping contributions take the maximum.

use rand::Rng;
use rand::seq::IndexedRandom;
use rescue_types::{Cell, GridSnapshot, HazardCell, HazardLevel, SURROUNDING_OFFSETS};
use tracing::debug;

use crate::error::WorldError;
use crate::lattice::Lattice;
use crate::router::{self, Passability, Terrain};

/// Largest accepted grid side.
pub const MAX_DIMENSION: u32 = 4096;

/// Chance a non-spread hazardous cell intensifies by one level.
pub const INTENSIFY_CHANCE: f64 = 0.10;

/// Chance a non-spread hazardous cell decays by one level.
pub const DECAY_CHANCE: f64 = 0.05;

/// The one direction spread is not discounted toward.
pub const FAVOURED_SPREAD_DIRECTION: (i32, i32) = (1, 1);

/// Spread discount for every other direction.
pub const OFF_AXIS_SPREAD_FACTOR: f64 = 0.3;

/// Parameters for [`Grid::generate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridParams {
    /// Width in cells.
    pub width: u32,
    /// Height in cells.
    pub height: u32,
    /// Obstacles to scatter over the interior.
    pub obstacle_count: u32,
    /// Initial hazards to scatter over obstacle-free cells.
    pub hazard_count: u32,
}

/// What one [`Grid::evolve`] step changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvolutionSummary {
    /// Cells that received a more severe level from a neighbor.
    pub spread: u32,
    /// Cells that intensified in place.
    pub intensified: u32,
    /// Cells that decayed in place.
    pub decayed: u32,
}

/// The ground-truth grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    lattice: Lattice,
    obstacle: Vec<bool>,
    safety: Vec<bool>,
    hazard: Vec<HazardLevel>,
    sight: Vec<u8>,
}

impl Grid {
    /// An obstacle- and hazard-free grid whose outer ring is safety.
    pub fn new(width: u32, height: u32) -> Result<Self, WorldError> {
        let lattice = Lattice::new(width, height)
            .filter(|_| width <= MAX_DIMENSION && height <= MAX_DIMENSION)
            .ok_or(WorldError::InvalidDimensions { width, height })?;
        let size = lattice.len();
        Ok(Self {
            lattice,
            obstacle: vec![false; size],
            safety: lattice.cells().map(|cell| lattice.is_border(cell)).collect(),
            hazard: vec![HazardLevel::Clear; size],
            sight: vec![0; size],
        })
    }

    /// Build a random grid.
    ///
    /// Obstacles are drawn without replacement from the interior (the outer
    /// ring stays open), hazards from the remaining obstacle-free cells with
    /// a uniformly random level.
    pub fn generate(params: &GridParams, rng: &mut impl Rng) -> Result<Self, WorldError> {
        let mut grid = Self::new(params.width, params.height)?;

        let interior: Vec<Cell> = grid
            .cells()
            .filter(|cell| !grid.lattice.is_border(*cell))
            .collect();
        let obstacle_capacity = u32::try_from(interior.len()).unwrap_or(u32::MAX);
        if params.obstacle_count > obstacle_capacity {
            return Err(WorldError::TooManyObstacles {
                requested: params.obstacle_count,
                capacity: obstacle_capacity,
            });
        }
        let total = u32::try_from(grid.lattice.len()).unwrap_or(u32::MAX);
        let hazard_capacity = total.saturating_sub(params.obstacle_count);
        if params.hazard_count > hazard_capacity {
            return Err(WorldError::TooManyHazards {
                requested: params.hazard_count,
                capacity: hazard_capacity,
            });
        }

        let obstacle_count = usize::try_from(params.obstacle_count).unwrap_or(usize::MAX);
        for cell in interior.choose_multiple(rng, obstacle_count) {
            if let Some(slot) = grid.lattice.index(*cell).and_then(|i| grid.obstacle.get_mut(i)) {
                *slot = true;
            }
        }

        let open: Vec<Cell> = grid.cells().filter(|c| !grid.is_obstacle(*c)).collect();
        let hazard_count = usize::try_from(params.hazard_count).unwrap_or(usize::MAX);
        let chosen: Vec<Cell> = open.choose_multiple(rng, hazard_count).copied().collect();
        for cell in &chosen {
            let level = HazardLevel::HAZARDOUS
                .choose(rng)
                .copied()
                .unwrap_or(HazardLevel::Low);
            if let Some(slot) = grid.lattice.index(*cell).and_then(|i| grid.hazard.get_mut(i)) {
                *slot = level;
            }
        }

        grid.recompute_sight();
        debug!(
            width = params.width,
            height = params.height,
            obstacles = params.obstacle_count,
            hazards = params.hazard_count,
            "Grid generated"
        );
        Ok(grid)
    }

    // -------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------

    /// Width in cells.
    pub const fn width(&self) -> u32 {
        self.lattice.width()
    }

    /// Height in cells.
    pub const fn height(&self) -> u32 {
        self.lattice.height()
    }

    /// Whether `cell` is on the grid.
    pub const fn contains(&self, cell: Cell) -> bool {
        self.lattice.contains(cell)
    }

    /// Every cell in layer order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + use<> {
        self.lattice.cells()
    }

    /// Cells of the Chebyshev box of `radius` around `center`, clipped to the
    /// grid, in layer order.
    pub fn square(&self, center: Cell, radius: u32) -> impl Iterator<Item = Cell> + use<> {
        self.lattice.square(center, radius)
    }

    /// Whether `cell` holds an obstacle (`false` off the grid).
    pub fn is_obstacle(&self, cell: Cell) -> bool {
        self.read(&self.obstacle, cell).unwrap_or(false)
    }

    /// Whether an actor may stand on `cell`.
    pub fn is_passable(&self, cell: Cell) -> bool {
        self.read(&self.obstacle, cell).is_some_and(|blocked| !blocked)
    }

    /// Whether `cell` is a safety zone (`false` off the grid).
    pub fn is_safety(&self, cell: Cell) -> bool {
        self.read(&self.safety, cell).unwrap_or(false)
    }

    /// Hazard severity at `cell` ([`HazardLevel::Clear`] off the grid).
    pub fn hazard(&self, cell: Cell) -> HazardLevel {
        self.read(&self.hazard, cell).unwrap_or_default()
    }

    /// Sight obstruction percentage at `cell` (0 off the grid).
    pub fn sight_obstruction(&self, cell: Cell) -> u8 {
        self.read(&self.sight, cell).unwrap_or(0)
    }

    fn read<T: Copy>(&self, layer: &[T], cell: Cell) -> Option<T> {
        self.lattice.index(cell).and_then(|i| layer.get(i).copied())
    }

    /// All safety cells in layer order.
    pub fn safety_cells(&self) -> Vec<Cell> {
        self.cells().filter(|c| self.is_safety(*c)).collect()
    }

    /// All obstacle cells in layer order.
    pub fn obstacle_cells(&self) -> Vec<Cell> {
        self.cells().filter(|c| self.is_obstacle(*c)).collect()
    }

    /// All hazardous cells in layer order.
    pub fn hazard_cells(&self) -> Vec<HazardCell> {
        self.cells()
            .map(|cell| HazardCell {
                cell,
                level: self.hazard(cell),
            })
            .filter(|h| h.level.is_hazardous())
            .collect()
    }

    /// On-grid, obstacle-free cardinal neighbors of `cell`.
    pub fn passable_neighbors(&self, cell: Cell) -> Vec<Cell> {
        cell.cardinal_neighbors()
            .into_iter()
            .filter(|n| self.is_passable(*n))
            .collect()
    }

    /// The safety cell with the shortest route from `from`.
    ///
    /// Standing on a safety cell returns that cell. Equal route lengths
    /// resolve in cardinal expansion order. `None` if no safety cell is
    /// reachable under `passability`.
    pub fn nearest_safe_cell(&self, from: Cell, passability: Passability) -> Option<Cell> {
        let path = router::nearest_route(self, from, passability, |c| self.is_safety(c))?;
        Some(path.last().copied().unwrap_or(from))
    }

    // -------------------------------------------------------------------
    // Edits
    // -------------------------------------------------------------------

    fn checked_index(&self, cell: Cell) -> Result<usize, WorldError> {
        self.lattice.index(cell).ok_or(WorldError::OutOfBounds(cell))
    }

    /// Place or clear an obstacle.
    pub fn set_obstacle(&mut self, cell: Cell, blocked: bool) -> Result<(), WorldError> {
        let index = self.checked_index(cell)?;
        if let Some(slot) = self.obstacle.get_mut(index) {
            *slot = blocked;
        }
        Ok(())
    }

    /// Mark or unmark a safety cell.
    pub fn set_safety(&mut self, cell: Cell, safe: bool) -> Result<(), WorldError> {
        let index = self.checked_index(cell)?;
        if let Some(slot) = self.safety.get_mut(index) {
            *slot = safe;
        }
        Ok(())
    }

    /// Set the hazard level at `cell` and re-derive sight obstruction.
    pub fn set_hazard(&mut self, cell: Cell, level: HazardLevel) -> Result<(), WorldError> {
        let index = self.checked_index(cell)?;
        if let Some(slot) = self.hazard.get_mut(index) {
            *slot = level;
        }
        self.recompute_sight();
        Ok(())
    }

    // -------------------------------------------------------------------
    // Evolution
    // -------------------------------------------------------------------

    /// Advance hazards by one spread/intensify/decay step.
    pub fn evolve(&mut self, spread_chance: f64, rng: &mut impl Rng) -> EvolutionSummary {
        let mut summary = EvolutionSummary::default();
        let mut next = self.hazard.clone();
        let mut updated = vec![false; next.len()];

        for (cell, level) in self.lattice.cells().zip(self.hazard.iter().copied()) {
            if !level.is_hazardous() {
                continue;
            }
            for (dx, dy) in SURROUNDING_OFFSETS {
                let Some(index) = self.lattice.index(cell.offset(dx, dy)) else {
                    continue;
                };
                let chance = spread_probability(level, spread_chance, (dx, dy));
                let roll: f64 = rng.random();
                if roll < chance
                    && let Some(slot) = next.get_mut(index)
                    && *slot < level
                {
                    *slot = level;
                    if let Some(flag) = updated.get_mut(index) {
                        *flag = true;
                    }
                    summary.spread = summary.spread.saturating_add(1);
                }
            }
        }

        for (slot, was_updated) in next.iter_mut().zip(&updated) {
            if *was_updated || !slot.is_hazardous() {
                continue;
            }
            if rng.random::<f64>() < INTENSIFY_CHANCE && *slot < HazardLevel::High {
                *slot = slot.intensified();
                summary.intensified = summary.intensified.saturating_add(1);
            }
            if rng.random::<f64>() < DECAY_CHANCE && slot.is_hazardous() {
                *slot = slot.decayed();
                summary.decayed = summary.decayed.saturating_add(1);
            }
        }

        self.hazard = next;
        self.recompute_sight();
        summary
    }

    fn recompute_sight(&mut self) {
        self.sight = derive_sight(self.lattice, &self.hazard);
    }

    /// Render view of the grid layers.
    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            width: self.width(),
            height: self.height(),
            obstacles: self.obstacle_cells(),
            safety: self.safety_cells(),
            hazards: self.hazard_cells(),
            sight_obstruction: self.sight.clone(),
        }
    }
}

impl Terrain for Grid {
    fn lattice(&self) -> Lattice {
        self.lattice
    }

    fn is_obstacle(&self, cell: Cell) -> bool {
        Self::is_obstacle(self, cell)
    }
}

/// Spread multiplier for a hazard level.
pub const fn severity_multiplier(level: HazardLevel) -> f64 {
    match level {
        HazardLevel::Clear => 0.0,
        HazardLevel::Low => 0.1,
        HazardLevel::Medium => 0.5,
        HazardLevel::High => 1.0,
    }
}

/// Probability that `level` spreads one cell in `direction`.
pub fn spread_probability(level: HazardLevel, spread_chance: f64, direction: (i32, i32)) -> f64 {
    let factor = if direction == FAVOURED_SPREAD_DIRECTION {
        1.0
    } else {
        OFF_AXIS_SPREAD_FACTOR
    };
    severity_multiplier(level) * spread_chance * factor
}

/// Sight obstruction as a pure function of the hazard layer.
pub fn derive_sight(lattice: Lattice, hazard: &[HazardLevel]) -> Vec<u8> {
    let mut sight = vec![0_u8; lattice.len()];
    let mut raise = |cell: Cell, value: u8| {
        if let Some(slot) = lattice.index(cell).and_then(|i| sight.get_mut(i)) {
            *slot = (*slot).max(value);
        }
    };

    for (cell, level) in lattice.cells().zip(hazard.iter().copied()) {
        match level {
            HazardLevel::Clear => {}
            HazardLevel::Low => raise(cell, 20),
            HazardLevel::Medium => {
                raise(cell, 50);
                for neighbor in cell.cardinal_neighbors() {
                    raise(neighbor, 20);
                }
            }
            HazardLevel::High => {
                raise(cell, 80);
                for neighbor in cell.cardinal_neighbors() {
                    raise(neighbor, 50);
                }
                for dx in -2..=2 {
                    for dy in -2..=2 {
                        let ring = cell.offset(dx, dy);
                        if cell.chebyshev(ring) == 2 {
                            raise(ring, 20);
                        }
                    }
                }
            }
        }
    }
    sight
}
