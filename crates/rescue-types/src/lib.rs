//! Shared type definitions for the rescue simulation.
//!
//! This crate holds the value types every other crate agrees on: grid
//! coordinates, hazard levels, actor and task identifiers, behavior enums,
//! and the snapshot records handed to renderers and task-log sinks.
//! Snapshot types flow to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`cell`] -- Grid coordinates, neighbor offsets, distance metrics
//! - [`enums`] -- Hazard levels, agent modes, behavior states
//! - [`ids`] -- Roster-index actor IDs and UUID task IDs
//! - [`snapshot`] -- Render snapshots and task-log records

pub mod cell;
pub mod enums;
pub mod ids;
pub mod snapshot;

// Re-export all public types at crate root for convenience.
pub use cell::{CARDINAL_OFFSETS, Cell, SURROUNDING_OFFSETS};
pub use enums::{AgentActivity, AgentMode, HazardLevel, ObserverClass, RescuedBy};
pub use ids::{AgentId, DroneId, TaskId, VictimId};
pub use snapshot::{
    AgentSnapshot, DroneSnapshot, GridSnapshot, HazardCell, TaskParty, TaskRecord, VictimSnapshot,
    WorldSnapshot,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for snapshot types.

    #[test]
    fn export_bindings() {
        // Files land in `bindings/` relative to the crate root.
        use ts_rs::TS;

        let _ = crate::cell::Cell::export_all();
        let _ = crate::enums::HazardLevel::export_all();
        let _ = crate::enums::AgentMode::export_all();
        let _ = crate::enums::AgentActivity::export_all();
        let _ = crate::enums::RescuedBy::export_all();
        let _ = crate::ids::AgentId::export_all();
        let _ = crate::ids::VictimId::export_all();
        let _ = crate::ids::TaskId::export_all();
        let _ = crate::snapshot::WorldSnapshot::export_all();
        let _ = crate::snapshot::TaskRecord::export_all();
    }
}
