//! Rescuers, victims, and their per-tick behavior.
//!
//! This crate is the logic layer for actors: everything that reads the grid
//! and mutates actor state, without owning the simulation loop. It sits
//! between `rescue-world` (grid and routing) and `rescue-core` (perception,
//! allocation, tick orchestration).
//!
//! # Modules
//!
//! - [`actor`] -- [`Agent`], [`Victim`], and [`Drone`] state
//! - [`behavior`] -- Decision table, guiding, exploration, self-rescue
//! - [`config`] -- Per-class speed, life, sight, and damage tables
//! - [`error`] -- Guidance relation errors ([`AgentError`])
//! - [`guidance`] -- Attach, carry, deliver, release, and exclusivity checks
//! - [`sight`] -- Effective sight through obstructed lines
//! - [`vitals`] -- Remaining life and deduplicated hazard exposure

pub mod actor;
pub mod behavior;
pub mod config;
pub mod error;
pub mod guidance;
mod movement;
pub mod sight;
pub mod vitals;

// Re-export primary types at crate root for convenience.
pub use actor::{Agent, AssignedTask, Drone, Victim};
pub use behavior::{
    agent_self_rescue, decide_and_move, expose_victim, guide_step, victim_self_rescue,
};
pub use config::{AgentProfile, Attenuation, DamageTable, MAX_LIFE, SightProfile, VictimProfile};
pub use error::AgentError;
pub use guidance::verify_exclusive_guidance;
pub use sight::{can_see, effective_sight};
pub use vitals::{Exposure, Vitals};
