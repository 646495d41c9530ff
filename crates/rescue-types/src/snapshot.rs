//! Read-only snapshots handed to collaborators outside the core.
//!
//! [`WorldSnapshot`] feeds renderers once per tick; [`TaskRecord`] is the
//! serializable form of an approved task consumed by task-log sinks.
//! Neither flows back into the simulation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cell::Cell;
use crate::enums::{AgentActivity, AgentMode, HazardLevel, RescuedBy};
use crate::ids::{AgentId, DroneId, TaskId, VictimId};

/// A hazardous cell and its severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HazardCell {
    /// Where the hazard is.
    pub cell: Cell,
    /// How severe it is.
    pub level: HazardLevel,
}

/// The grid layers at the end of a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GridSnapshot {
    /// Grid width in cells.
    pub width: u32,
    /// Grid height in cells.
    pub height: u32,
    /// Obstacle cells.
    pub obstacles: Vec<Cell>,
    /// Safety cells.
    pub safety: Vec<Cell>,
    /// Hazardous cells.
    pub hazards: Vec<HazardCell>,
    /// Sight obstruction per cell, column-major (`x * height + y`).
    pub sight_obstruction: Vec<u8>,
}

/// Render view of one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AgentSnapshot {
    /// Agent identifier.
    pub id: AgentId,
    /// Current position.
    pub position: Cell,
    /// Remaining life percentage.
    pub remaining_life: u32,
    /// Whether the agent is still alive.
    pub alive: bool,
    /// Autonomous or ordered.
    pub mode: AgentMode,
    /// Behavior state at the end of the tick.
    pub activity: AgentActivity,
    /// Victims currently escorted by this agent.
    pub guided_victims: Vec<VictimId>,
    /// Whether a commander task is pending.
    pub has_task: bool,
}

/// Render view of one victim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct VictimSnapshot {
    /// Victim identifier.
    pub id: VictimId,
    /// Current position.
    pub position: Cell,
    /// Remaining life percentage.
    pub remaining_life: u32,
    /// Whether the victim reached safety.
    pub rescued: bool,
    /// Who rescued the victim, once rescued.
    pub rescued_by: Option<RescuedBy>,
    /// The agent escorting the victim, if any.
    pub guided_by: Option<AgentId>,
}

/// Render view of one drone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DroneSnapshot {
    /// Drone identifier.
    pub id: DroneId,
    /// Current position.
    pub position: Cell,
    /// Scan radius (Chebyshev box).
    pub sight_range: u32,
}

/// Everything a renderer needs to draw one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WorldSnapshot {
    /// Tick the snapshot was taken after.
    pub tick: u64,
    /// Grid layers.
    pub grid: GridSnapshot,
    /// All agents, dead ones included.
    pub agents: Vec<AgentSnapshot>,
    /// All victims, terminal ones included.
    pub victims: Vec<VictimSnapshot>,
    /// All drones.
    pub drones: Vec<DroneSnapshot>,
}

/// Position and life of one party to a task at issue time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TaskParty {
    /// Position when the task was issued.
    pub position: Cell,
    /// Remaining life when the task was issued.
    pub remaining_life: u32,
}

/// Serializable record of an approved task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TaskRecord {
    /// Task identifier.
    pub task_id: TaskId,
    /// Wall-clock issue time.
    pub issued_at: DateTime<Utc>,
    /// Simulation tick the task was issued on.
    pub tick: u64,
    /// Assigned agent.
    pub agent_id: AgentId,
    /// Agent state at issue time.
    pub agent: TaskParty,
    /// Target victim.
    pub victim_id: VictimId,
    /// Victim state at issue time.
    pub victim: TaskParty,
    /// The victim's cell when the task was issued.
    pub target: Cell,
    /// Score after approval (penalties applied).
    pub score: f64,
    /// Full agent -> victim -> safety route.
    pub route: Vec<Cell>,
}
