//! Imperfect perception: observer scans fused into a shared belief map.
//!
//! Drones and rescuers scan a Chebyshev box around themselves each tick.
//! Every scanned cell yields a [`CellReport`] whose confidence falls off with
//! Manhattan distance and with the *true* sight obstruction at that cell.
//! Reports are fused into the [`BeliefMap`], which is what the commander
//! plans against:
//!
//! - **fuse** -- last writer wins per cell, no reconciliation across sources
//! - **decay** -- `confidence -= rate x (now - timestamp)`, floored at 0
//! - **predict** -- cells never observed get a hazard estimate from a
//!   [`HazardPredictor`]
//!
//! Timestamps are simulation ticks.

use std::collections::BTreeMap;

use rescue_agents::{Agent, Drone};
use rescue_types::{Cell, HazardLevel};
use rescue_world::{Grid, Lattice, Terrain};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PerceptionConfig;

/// How confidence falls off with distance for one observer class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceProfile {
    /// Manhattan distance up to which confidence starts at 100.
    pub inner_radius: u32,
    /// Confidence lost per unit of distance beyond the inner radius.
    pub decay_per_unit: f64,
}

impl ConfidenceProfile {
    /// Drones: full confidence out to 5 cells, then -5 per cell.
    pub const fn drone() -> Self {
        Self {
            inner_radius: 5,
            decay_per_unit: 5.0,
        }
    }

    /// Rescuers: full confidence out to 3 cells, then -5 per cell.
    pub const fn rescuer() -> Self {
        Self {
            inner_radius: 3,
            decay_per_unit: 5.0,
        }
    }

    /// Confidence for a cell `distance` away whose sight obstruction is
    /// `obstruction` percent. Always within `[0, 100]`.
    pub fn confidence(&self, distance: u32, obstruction: u8) -> f64 {
        let beyond = f64::from(distance.saturating_sub(self.inner_radius));
        let base = self.decay_per_unit.mul_add(-beyond, 100.0);
        let visible = 1.0 - f64::from(obstruction.min(100)) / 100.0;
        (base * visible).clamp(0.0, 100.0)
    }
}

/// What one observer saw at one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellReport {
    /// Tick of the observation.
    pub timestamp: u64,
    /// Observed hazard level.
    pub hazard: HazardLevel,
    /// Observed obstacle flag.
    pub obstacle: bool,
    /// Observed safety flag.
    pub safety: bool,
    /// Confidence in the observation.
    pub confidence: f64,
}

/// One scan: observed cells keyed by position.
pub type Report = BTreeMap<Cell, CellReport>;

/// Scan every cell within Chebyshev `radius` of `observer` on the true grid.
pub fn scan(observer: Cell, radius: u32, profile: &ConfidenceProfile, grid: &Grid, now: u64) -> Report {
    grid.square(observer, radius)
        .map(|cell| {
            let report = CellReport {
                timestamp: now,
                hazard: grid.hazard(cell),
                obstacle: grid.is_obstacle(cell),
                safety: grid.is_safety(cell),
                confidence: profile.confidence(observer.manhattan(cell), grid.sight_obstruction(cell)),
            };
            (cell, report)
        })
        .collect()
}

/// The fused belief about one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeliefCell {
    /// Believed hazard level.
    pub hazard_estimate: HazardLevel,
    /// Believed obstacle flag.
    pub obstacle: bool,
    /// Believed safety flag.
    pub safety: bool,
    /// Tick of the last observation, if ever observed.
    pub timestamp: Option<u64>,
    /// Current confidence in `[0, 100]`.
    pub confidence: f64,
}

/// Supplies hazard estimates for cells no observer has reported.
pub trait HazardPredictor: Send {
    /// Estimate the hazard at `cell`, given the value currently believed.
    fn predict(&self, cell: Cell, last_known: HazardLevel) -> HazardLevel;
}

/// Keeps whatever the belief map already holds.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastKnownPredictor;

impl HazardPredictor for LastKnownPredictor {
    fn predict(&self, _cell: Cell, last_known: HazardLevel) -> HazardLevel {
        last_known
    }
}

/// Shared belief about every grid cell.
#[derive(Debug, Clone)]
pub struct BeliefMap {
    lattice: Lattice,
    cells: Vec<BeliefCell>,
}

impl BeliefMap {
    /// Start from a copy of the true layers with zero confidence and no
    /// timestamps.
    pub fn from_grid(grid: &Grid) -> Self {
        let cells = grid
            .cells()
            .map(|cell| BeliefCell {
                hazard_estimate: grid.hazard(cell),
                obstacle: grid.is_obstacle(cell),
                safety: grid.is_safety(cell),
                timestamp: None,
                confidence: 0.0,
            })
            .collect();
        Self {
            lattice: grid.lattice(),
            cells,
        }
    }

    /// Belief at `cell`, `None` off the grid.
    pub fn cell(&self, cell: Cell) -> Option<&BeliefCell> {
        self.lattice.index(cell).and_then(|i| self.cells.get(i))
    }

    fn cell_mut(&mut self, cell: Cell) -> Option<&mut BeliefCell> {
        self.lattice.index(cell).and_then(|i| self.cells.get_mut(i))
    }

    /// Believed hazard at `cell` ([`HazardLevel::Clear`] off the grid).
    pub fn hazard_estimate(&self, cell: Cell) -> HazardLevel {
        self.cell(cell).map(|b| b.hazard_estimate).unwrap_or_default()
    }

    /// Believed safety flag.
    pub fn is_safety(&self, cell: Cell) -> bool {
        self.cell(cell).is_some_and(|b| b.safety)
    }

    /// On the grid and not believed blocked.
    pub fn is_passable(&self, cell: Cell) -> bool {
        self.cell(cell).is_some_and(|b| !b.obstacle)
    }

    /// Confidence at `cell` (0 off the grid).
    pub fn confidence(&self, cell: Cell) -> f64 {
        self.cell(cell).map_or(0.0, |b| b.confidence)
    }

    /// Believed safety cells in layer order.
    pub fn safety_cells(&self) -> Vec<Cell> {
        self.lattice
            .cells()
            .filter(|c| self.is_safety(*c))
            .collect()
    }

    /// Number of believed-passable cardinal neighbors of `cell`.
    pub fn open_neighbors(&self, cell: Cell) -> u32 {
        let open = cell
            .cardinal_neighbors()
            .into_iter()
            .filter(|n| self.is_passable(*n))
            .count();
        u32::try_from(open).unwrap_or(u32::MAX)
    }

    /// Overwrite every reported cell with the report. Returns the number of
    /// cells written.
    pub fn fuse(&mut self, report: &Report) -> usize {
        let mut written: usize = 0;
        for (cell, observed) in report {
            if let Some(belief) = self.cell_mut(*cell) {
                belief.hazard_estimate = observed.hazard;
                belief.obstacle = observed.obstacle;
                belief.safety = observed.safety;
                belief.timestamp = Some(observed.timestamp);
                belief.confidence = observed.confidence.clamp(0.0, 100.0);
                written = written.saturating_add(1);
            }
        }
        written
    }

    /// Lower confidence of every observed cell by `rate` per tick since its
    /// observation, floored at 0.
    pub fn decay(&mut self, rate: f64, now: u64) {
        for belief in &mut self.cells {
            if let Some(timestamp) = belief.timestamp {
                let elapsed = u32::try_from(now.saturating_sub(timestamp)).unwrap_or(u32::MAX);
                let lowered = rate.max(0.0).mul_add(-f64::from(elapsed), belief.confidence);
                belief.confidence = lowered.clamp(0.0, 100.0);
            }
        }
    }

    /// Fill hazard estimates for never-observed cells. Returns the number of
    /// cells predicted.
    pub fn predict_missing(&mut self, predictor: &dyn HazardPredictor) -> usize {
        let mut predicted: usize = 0;
        for (cell, belief) in self.lattice.cells().zip(self.cells.iter_mut()) {
            if belief.timestamp.is_none() {
                belief.hazard_estimate = predictor.predict(cell, belief.hazard_estimate);
                predicted = predicted.saturating_add(1);
            }
        }
        predicted
    }
}

impl Terrain for BeliefMap {
    fn lattice(&self) -> Lattice {
        self.lattice
    }

    fn is_obstacle(&self, cell: Cell) -> bool {
        self.cell(cell).is_some_and(|b| b.obstacle)
    }
}

/// Owns the belief map and runs the per-tick perception phases.
pub struct PerceptionHub {
    belief: BeliefMap,
    predictor: Box<dyn HazardPredictor>,
    decay_rate: f64,
    drone_profile: ConfidenceProfile,
    rescuer_profile: ConfidenceProfile,
}

impl std::fmt::Debug for PerceptionHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerceptionHub")
            .field("decay_rate", &self.decay_rate)
            .field("drone_profile", &self.drone_profile)
            .field("rescuer_profile", &self.rescuer_profile)
            .finish_non_exhaustive()
    }
}

impl PerceptionHub {
    /// A hub over a fresh belief copy of `grid`, predicting with
    /// [`LastKnownPredictor`].
    pub fn new(grid: &Grid, config: &PerceptionConfig) -> Self {
        Self {
            belief: BeliefMap::from_grid(grid),
            predictor: Box::new(LastKnownPredictor),
            decay_rate: config.decay_rate,
            drone_profile: config.drone,
            rescuer_profile: config.rescuer,
        }
    }

    /// Swap in a different hazard predictor.
    #[must_use]
    pub fn with_predictor(mut self, predictor: Box<dyn HazardPredictor>) -> Self {
        self.predictor = predictor;
        self
    }

    /// The fused belief map.
    pub const fn belief(&self) -> &BeliefMap {
        &self.belief
    }

    /// Fuse one report.
    pub fn ingest(&mut self, report: &Report) -> usize {
        self.belief.fuse(report)
    }

    /// Scan from every drone and every active agent, fusing each report in
    /// turn. Returns the number of cell reports fused.
    pub fn survey(&mut self, grid: &Grid, agents: &[Agent], drones: &[Drone], now: u64) -> usize {
        let mut fused: usize = 0;
        for drone in drones {
            let report = scan(drone.position, drone.sight_range, &self.drone_profile, grid, now);
            fused = fused.saturating_add(self.ingest(&report));
        }
        for agent in agents.iter().filter(|a| a.is_active()) {
            let radius = agent.profile.sight.sight_distance;
            let report = scan(agent.position, radius, &self.rescuer_profile, grid, now);
            fused = fused.saturating_add(self.ingest(&report));
        }
        fused
    }

    /// Decay confidence, then predict never-observed cells.
    pub fn update_perceived_map(&mut self, now: u64) -> usize {
        self.belief.decay(self.decay_rate, now);
        let predicted = self.belief.predict_missing(self.predictor.as_ref());
        debug!(now, predicted, "Perceived map updated");
        predicted
    }
}
