//! Simulation loop runner.
//!
//! [`run_simulation`] drives [`run_tick`] until every victim is rescued or
//! dead, or the round budget is spent, notifying a [`TickCallback`] after
//! each tick. [`log_simulation_end`] reports the final counts.
//!
//! [`run_tick`]: crate::tick::run_tick

use serde::Serialize;
use tracing::{info, warn};

use crate::approval::ApprovalGate;
use crate::task_log::TaskLogSink;
use crate::tick::{self, RescueTally, SimulationState, TickError, TickSummary};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Reason why the simulation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SimulationEndReason {
    /// Every victim is rescued or dead.
    AllVictimsTerminal,
    /// The round budget ran out first.
    MaxRoundsReached,
}

/// Result of the simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Total number of ticks executed.
    pub total_ticks: u64,
    /// Counts at the end of the run.
    pub tally: RescueTally,
}

/// Callback invoked after each tick completes.
///
/// Renderers and progress loggers hook in here. The callback receives the
/// tick summary and read-only access to the state.
pub trait TickCallback: Send {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, summary: &TickSummary, state: &SimulationState);
}

/// A no-op tick callback for testing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _state: &SimulationState) {}
}

/// Run the simulation loop until a termination condition is met.
///
/// Terminal victims are checked before every tick, so a scenario whose
/// victims are already all terminal runs zero ticks. At most `max_rounds`
/// ticks run.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick execution fails unrecoverably.
pub fn run_simulation(
    state: &mut SimulationState,
    gate: &mut dyn ApprovalGate,
    task_log: &mut dyn TaskLogSink,
    max_rounds: u64,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(
        max_rounds,
        agents = state.agents.len(),
        victims = state.victims.len(),
        drones = state.drones.len(),
        commander = state.commander.is_some(),
        "Simulation starting"
    );

    let end_reason = loop {
        if state.all_victims_terminal() {
            info!(tick = state.tick, "All victims rescued or dead");
            break SimulationEndReason::AllVictimsTerminal;
        }
        if total_ticks >= max_rounds {
            info!(tick = state.tick, max_rounds, "Round budget spent");
            break SimulationEndReason::MaxRoundsReached;
        }

        let summary = tick::run_tick(state, gate, task_log)?;
        total_ticks = total_ticks.saturating_add(1);
        callback.on_tick(&summary, state);
        last_summary = Some(summary);
    };

    Ok(SimulationResult {
        end_reason,
        final_summary: last_summary,
        total_ticks,
        tally: state.tally(),
    })
}

/// Log the final results of a run.
pub fn log_simulation_end(result: &SimulationResult) {
    let tally = &result.tally;
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        self_rescued = tally.self_rescued,
        rescued_by_agents = tally.rescued_by_agents,
        victims_died = tally.victims_died,
        agents_survived = tally.agents_survived,
        agents_died = tally.agents_died,
        "Simulation ended"
    );
    if tally.victims_remaining > 0 {
        warn!(
            victims_remaining = tally.victims_remaining,
            "Run ended with victims still awaiting rescue"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rescue_agents::{Agent, AgentProfile, Victim, VictimProfile};
    use rescue_types::{AgentId, AgentMode, Cell, HazardLevel, VictimId};
    use rescue_world::Grid;

    use super::*;
    use crate::approval::AutoApprove;
    use crate::task_log::NoOpTaskLog;

    fn make_victim(id: u32, position: Cell) -> Victim {
        let profile = VictimProfile {
            self_rescue: false,
            ..VictimProfile::default()
        };
        Victim::new(VictimId(id), position, profile)
    }

    fn make_state(victims: Vec<Victim>) -> SimulationState {
        SimulationState::new(Grid::new(9, 9).unwrap(), Vec::new(), victims, Vec::new(), 1)
    }

    fn run(state: &mut SimulationState, max_rounds: u64) -> SimulationResult {
        run_simulation(state, &mut AutoApprove, &mut NoOpTaskLog, max_rounds, &mut NoOpCallback).unwrap()
    }

    struct Counter(u64);

    impl TickCallback for Counter {
        fn on_tick(&mut self, summary: &TickSummary, _state: &SimulationState) {
            self.0 = summary.tick;
        }
    }

    #[test]
    fn runs_until_budget_spent() {
        let mut state = make_state(vec![make_victim(0, Cell::new(4, 4))]);
        let mut counter = Counter(0);
        let result =
            run_simulation(&mut state, &mut AutoApprove, &mut NoOpTaskLog, 5, &mut counter).unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::MaxRoundsReached);
        assert_eq!(result.total_ticks, 5);
        assert_eq!(counter.0, 5);
        assert_eq!(result.final_summary.unwrap().tick, 5);
        assert_eq!(result.tally.victims_remaining, 1);
    }

    #[test]
    fn stops_once_victims_are_terminal() {
        let mut state = make_state(vec![make_victim(0, Cell::new(4, 4))]);
        state.grid.set_hazard(Cell::new(4, 4), HazardLevel::High).unwrap();
        let result = run(&mut state, 100);
        assert_eq!(result.end_reason, SimulationEndReason::AllVictimsTerminal);
        assert_eq!(result.total_ticks, 1);
        assert_eq!(result.tally.victims_died, 1);
    }

    #[test]
    fn empty_roster_runs_no_ticks() {
        let mut state = make_state(Vec::new());
        let result = run(&mut state, 100);
        assert_eq!(result.end_reason, SimulationEndReason::AllVictimsTerminal);
        assert_eq!(result.total_ticks, 0);
        assert!(result.final_summary.is_none());
        log_simulation_end(&result);
    }

    #[test]
    fn autonomous_rescuer_finishes_the_job() {
        let agent = Agent::new(AgentId(0), Cell::new(1, 4), AgentMode::Autonomous, AgentProfile::default());
        let mut state = make_state(vec![make_victim(0, Cell::new(4, 4))]);
        state.agents.push(agent);
        let result = run(&mut state, 20);
        assert_eq!(result.end_reason, SimulationEndReason::AllVictimsTerminal);
        assert_eq!(result.tally.rescued_by_agents, 1);
        assert!(state.victims[0].is_rescued());
    }
}
