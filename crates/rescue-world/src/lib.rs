//! Hazard grid and route planning for the rescue simulation.
//!
//! This crate models the physical world: the ground-truth [`Grid`] with its
//! obstacle, safety, hazard, and sight-obstruction layers, the stochastic
//! hazard spread step, and the A* router every actor plans with.
//!
//! # Modules
//!
//! - [`error`] -- Error types for grid construction and edits.
//! - [`grid`] -- The [`Grid`], random generation, hazard evolution, and
//!   sight-obstruction derivation.
//! - [`lattice`] -- Column-major cell indexing shared by every layer.
//! - [`router`] -- A* routes, breadth-first shortest-path trees, and the
//!   [`Terrain`] trait both plan against.

pub mod error;
pub mod grid;
pub mod lattice;
pub mod router;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use grid::{EvolutionSummary, Grid, GridParams};
pub use lattice::Lattice;
pub use router::{Passability, ShortestPathTree, Terrain, nearest_route, route};
