//! Task log sinks.
//!
//! Approved tasks are handed to a [`TaskLogSink`] as a serializable
//! [`TaskRecord`]. Logging is fire-and-forget: nothing a sink does flows
//! back into the simulation.

use chrono::Utc;
use rescue_agents::{Agent, Victim};
use rescue_types::{TaskParty, TaskRecord};
use tracing::{info, warn};

use crate::commander::Task;

/// Consumes records of approved tasks.
pub trait TaskLogSink: Send {
    /// Record one approved task.
    fn record(&mut self, record: &TaskRecord);
}

/// Discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpTaskLog;

impl TaskLogSink for NoOpTaskLog {
    fn record(&mut self, _record: &TaskRecord) {}
}

/// Emits each record as a JSON `info!` event on the `task_log` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTaskLog;

impl TaskLogSink for TracingTaskLog {
    fn record(&mut self, record: &TaskRecord) {
        match serde_json::to_string(record) {
            Ok(json) => info!(target: "task_log", task = %record.task_id, record = %json, "Task issued"),
            Err(e) => warn!(task = %record.task_id, error = %e, "Failed to serialize task record"),
        }
    }
}

/// Keeps every record in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryTaskLog {
    records: Vec<TaskRecord>,
}

impl MemoryTaskLog {
    /// An empty log.
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Records in arrival order.
    pub fn records(&self) -> &[TaskRecord] {
        &self.records
    }
}

impl TaskLogSink for MemoryTaskLog {
    fn record(&mut self, record: &TaskRecord) {
        self.records.push(record.clone());
    }
}

/// Snapshot `task` together with the state of its agent and victim.
pub fn task_record(task: &Task, agent: &Agent, victim: &Victim, tick: u64) -> TaskRecord {
    TaskRecord {
        task_id: task.id,
        issued_at: Utc::now(),
        tick,
        agent_id: agent.id,
        agent: TaskParty {
            position: agent.position,
            remaining_life: agent.remaining_life(),
        },
        victim_id: victim.id,
        victim: TaskParty {
            position: victim.position,
            remaining_life: victim.remaining_life(),
        },
        target: task.target,
        score: task.score,
        route: task.route.clone(),
    }
}
