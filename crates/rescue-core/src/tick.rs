//! Tick cycle: the six-phase loop that drives a rescue scenario.
//!
//! Each tick runs these phases in strict order, single-threaded:
//!
//! 1. **Evolve** -- on the configured cadence, spread and re-roll hazards
//!    on the true grid.
//!
//! 2. **Scan** -- every drone and every active rescuer scans its
//!    neighborhood.
//!
//! 3. **Fuse** -- reports are fused into the belief map in scan order, then
//!    confidence decays and never-observed cells are predicted.
//!
//! 4. **Allocate** -- the commander picks at most one task over every
//!    active ordered agent; the approval gate may penalize or reject it;
//!    approved tasks are logged and replace the agent's current task.
//!
//! 5. **Move** -- every agent runs its decision table once, in roster order.
//!
//! 6. **Self-rescue** -- idle agents evade hazards, victims walk toward
//!    safety, everyone standing still is exposed once, and downed guides
//!    release their victims.
//!
//! The guidance relation is verified after every tick. The cycle is
//! deterministic given the initial state, the RNG seed, and the plug-ins.

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rescue_agents::{
    Agent, AgentError, Drone, Victim, agent_self_rescue, decide_and_move, expose_victim, guidance,
    verify_exclusive_guidance, victim_self_rescue,
};
use rescue_types::{AgentId, AgentMode, RescuedBy, TaskId, VictimId, WorldSnapshot};
use rescue_world::{EvolutionSummary, Grid};
use serde::Serialize;
use tracing::{debug, info};

use crate::approval::ApprovalGate;
use crate::commander::Commander;
use crate::config::PerceptionConfig;
use crate::perception::PerceptionHub;
use crate::task_log::{TaskLogSink, task_record};

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// An actor operation broke the guidance relation.
    #[error("agent error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },

    /// The tick counter cannot advance.
    #[error("tick counter overflowed after tick {last}")]
    TickOverflow {
        /// The last tick that ran.
        last: u64,
    },

    /// The commander named an agent missing from the roster.
    #[error("unknown agent {0}")]
    UnknownAgent(AgentId),
}

/// How often and how aggressively hazards evolve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HazardEvolution {
    /// Base spread probability.
    pub spread_chance: f64,
    /// Evolve every N ticks (0 = never).
    pub every: u64,
}

impl Default for HazardEvolution {
    fn default() -> Self {
        Self {
            spread_chance: 0.1,
            every: 5,
        }
    }
}

impl HazardEvolution {
    /// Whether hazards evolve on `tick`.
    pub const fn is_due(&self, tick: u64) -> bool {
        matches!(tick.checked_rem(self.every), Some(0))
    }
}

/// What happened to this tick's task, if one was selected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TaskOutcome {
    /// The task passed approval and was assigned.
    Assigned {
        /// Task identifier.
        task: TaskId,
        /// Assigned agent.
        agent: AgentId,
        /// Target victim.
        victim: VictimId,
        /// Score after approval.
        score: f64,
    },
    /// The approval gate discarded the task.
    Rejected {
        /// Task identifier.
        task: TaskId,
        /// Agent that would have been assigned.
        agent: AgentId,
        /// Target victim.
        victim: VictimId,
    },
}

/// Final and running counts of the rescue effort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RescueTally {
    /// Victims that walked to safety on their own.
    pub self_rescued: u32,
    /// Victims delivered by an agent.
    pub rescued_by_agents: u32,
    /// Victims that ran out of life.
    pub victims_died: u32,
    /// Victims neither rescued nor dead.
    pub victims_remaining: u32,
    /// Agents with life left.
    pub agents_survived: u32,
    /// Agents out of life.
    pub agents_died: u32,
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Hazard changes, if hazards evolved this tick.
    pub evolution: Option<EvolutionSummary>,
    /// Cell reports fused into the belief map.
    pub cells_fused: usize,
    /// Task selected this tick.
    pub task: Option<TaskOutcome>,
    /// Victims delivered to safety this tick.
    pub rescued_by_agents: Vec<VictimId>,
    /// Victims that reached safety alone this tick.
    pub self_rescued: Vec<VictimId>,
    /// Victims that died this tick.
    pub victims_died: Vec<VictimId>,
    /// Agents that went down this tick.
    pub agents_died: Vec<AgentId>,
    /// Counts after the tick.
    pub tally: RescueTally,
}

/// Complete mutable state of a running scenario.
#[derive(Debug)]
pub struct SimulationState {
    /// Last completed tick (0 before the first).
    pub tick: u64,
    /// The true grid.
    pub grid: Grid,
    /// Rescuers in roster order.
    pub agents: Vec<Agent>,
    /// Victims in roster order.
    pub victims: Vec<Victim>,
    /// Static aerial observers.
    pub drones: Vec<Drone>,
    /// Belief map and fusion pipeline.
    pub perception: PerceptionHub,
    /// Task allocator, `None` when allocation is off.
    pub commander: Option<Commander>,
    /// Hazard evolution cadence.
    pub evolution: HazardEvolution,
    /// Source of every random choice.
    pub rng: SmallRng,
}

impl SimulationState {
    /// A state at tick 0 with default perception, default evolution, and
    /// no commander.
    pub fn new(grid: Grid, agents: Vec<Agent>, victims: Vec<Victim>, drones: Vec<Drone>, seed: u64) -> Self {
        let perception = PerceptionHub::new(&grid, &PerceptionConfig::default());
        Self {
            tick: 0,
            grid,
            agents,
            victims,
            drones,
            perception,
            commander: None,
            evolution: HazardEvolution::default(),
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Enable task allocation.
    #[must_use]
    pub fn with_commander(mut self, commander: Commander) -> Self {
        self.commander = Some(commander);
        self
    }

    /// Replace the perception pipeline.
    #[must_use]
    pub fn with_perception(mut self, perception: PerceptionHub) -> Self {
        self.perception = perception;
        self
    }

    /// Replace the hazard evolution cadence.
    #[must_use]
    pub const fn with_evolution(mut self, evolution: HazardEvolution) -> Self {
        self.evolution = evolution;
        self
    }

    /// Every victim is rescued or dead.
    pub fn all_victims_terminal(&self) -> bool {
        self.victims.iter().all(Victim::is_terminal)
    }

    /// Current counts.
    pub fn tally(&self) -> RescueTally {
        tally(&self.agents, &self.victims)
    }

    /// Read-only view for renderers.
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick,
            grid: self.grid.snapshot(),
            agents: self.agents.iter().map(Agent::snapshot).collect(),
            victims: self.victims.iter().map(Victim::snapshot).collect(),
            drones: self.drones.iter().map(Drone::snapshot).collect(),
        }
    }
}

/// Count outcomes across the rosters.
pub fn tally(agents: &[Agent], victims: &[Victim]) -> RescueTally {
    RescueTally {
        self_rescued: count(victims, |v| v.rescued_by() == Some(RescuedBy::SelfRescue)),
        rescued_by_agents: count(victims, |v| v.rescued_by() == Some(RescuedBy::Agent)),
        victims_died: count(victims, |v| v.is_dead()),
        victims_remaining: count(victims, |v| !v.is_terminal()),
        agents_survived: count(agents, |a| !is_down(a)),
        agents_died: count(agents, is_down),
    }
}

fn count<T>(items: &[T], predicate: impl Fn(&T) -> bool) -> u32 {
    u32::try_from(items.iter().filter(|item| predicate(item)).count()).unwrap_or(u32::MAX)
}

fn is_down(agent: &Agent) -> bool {
    !agent.alive || agent.vitals.is_depleted()
}

/// Execute one complete tick of the simulation.
///
/// # Phases
///
/// 1. Evolve
/// 2. Scan
/// 3. Fuse
/// 4. Allocate (via the provided gate and task log)
/// 5. Move
/// 6. Self-rescue
pub fn run_tick(
    state: &mut SimulationState,
    gate: &mut dyn ApprovalGate,
    task_log: &mut dyn TaskLogSink,
) -> Result<TickSummary, TickError> {
    let tick = state
        .tick
        .checked_add(1)
        .ok_or(TickError::TickOverflow { last: state.tick })?;
    state.tick = tick;
    let before = Census::take(state);

    // --- Phase 1: Evolve ---
    let evolution = phase_evolve(state, tick);
    info!(tick, evolved = evolution.is_some(), "Tick started");

    // --- Phases 2 and 3: Scan and Fuse ---
    let cells_fused = phase_perceive(state, tick);

    // --- Phase 4: Allocate ---
    let task = phase_allocate(state, tick, gate, task_log)?;

    // --- Phase 5: Move ---
    phase_move(state, tick)?;

    // --- Phase 6: Self-rescue ---
    phase_self_rescue(state, tick)?;

    verify_exclusive_guidance(&state.agents, &state.victims)?;

    let summary = before.summarize(state, tick, evolution, cells_fused, task);
    for id in &summary.victims_died {
        info!(tick, victim = %id, "Victim died");
    }
    for id in &summary.agents_died {
        info!(tick, agent = %id, "Agent died");
    }
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

fn phase_evolve(state: &mut SimulationState, tick: u64) -> Option<EvolutionSummary> {
    if !state.evolution.is_due(tick) {
        return None;
    }
    let summary = state.grid.evolve(state.evolution.spread_chance, &mut state.rng);
    info!(
        tick,
        spread = summary.spread,
        intensified = summary.intensified,
        decayed = summary.decayed,
        "Hazards evolved"
    );
    Some(summary)
}

fn phase_perceive(state: &mut SimulationState, tick: u64) -> usize {
    let fused = state
        .perception
        .survey(&state.grid, &state.agents, &state.drones, tick);
    let predicted = state.perception.update_perceived_map(tick);
    debug!(tick, fused, predicted, "Belief map updated");
    fused
}

/// Ordered and able to act. A held task does not exempt an agent: a new
/// assignment replaces it.
fn takes_orders(agent: &Agent) -> bool {
    agent.mode == AgentMode::Ordered && agent.is_active()
}

fn phase_allocate(
    state: &mut SimulationState,
    tick: u64,
    gate: &mut dyn ApprovalGate,
    task_log: &mut dyn TaskLogSink,
) -> Result<Option<TaskOutcome>, TickError> {
    let Some(commander) = state.commander.as_ref() else {
        return Ok(None);
    };
    let candidates: Vec<Agent> = state
        .agents
        .iter()
        .filter(|a| takes_orders(a))
        .cloned()
        .collect();
    if candidates.is_empty() {
        return Ok(None);
    }

    let Some(task) = commander.select_task(&candidates, &state.victims, state.perception.belief())
    else {
        debug!(tick, "No task available");
        return Ok(None);
    };
    let (task_id, agent_id, victim_id) = (task.id, task.agent, task.victim);
    let agent_index = agent_id
        .index()
        .filter(|i| *i < state.agents.len())
        .ok_or(TickError::UnknownAgent(agent_id))?;
    let agent = state
        .agents
        .get(agent_index)
        .ok_or(TickError::UnknownAgent(agent_id))?;

    let Some(task) = gate.approve(task, agent).into_approved() else {
        return Ok(Some(TaskOutcome::Rejected {
            task: task_id,
            agent: agent_id,
            victim: victim_id,
        }));
    };
    let victim = victim_id
        .index()
        .and_then(|i| state.victims.get(i))
        .ok_or(AgentError::UnknownVictim(victim_id))?;
    task_log.record(&task_record(&task, agent, victim, tick));
    info!(
        tick,
        task = %task_id,
        agent = %agent_id,
        victim = %victim_id,
        score = task.score,
        route_len = task.route.len(),
        "Task assigned"
    );

    let score = task.score;
    if let Some(agent) = state.agents.get_mut(agent_index) {
        if let Some(previous) = agent.current_task() {
            debug!(tick, agent = %agent_id, superseded = %previous.task_id, "Task superseded");
        }
        agent.assign(task.into_assignment());
    }
    Ok(Some(TaskOutcome::Assigned {
        task: task_id,
        agent: agent_id,
        victim: victim_id,
        score,
    }))
}

fn phase_move(state: &mut SimulationState, tick: u64) -> Result<(), TickError> {
    for agent in &mut state.agents {
        let from = agent.position;
        let activity = decide_and_move(agent, &mut state.victims, &state.grid, tick, &mut state.rng)?;
        debug!(tick, agent = %agent.id, ?activity, %from, to = %agent.position, "Agent acted");
    }
    Ok(())
}

fn phase_self_rescue(state: &mut SimulationState, tick: u64) -> Result<(), TickError> {
    for agent in &mut state.agents {
        agent_self_rescue(agent, &state.grid, tick, &mut state.rng);
        agent.apply_hazard_damage(&state.grid, tick);
    }
    for victim in &mut state.victims {
        if victim.being_guided() {
            expose_victim(victim, &state.grid, tick);
        } else {
            victim_self_rescue(victim, &state.grid, tick, &mut state.rng);
        }
    }
    for agent in &mut state.agents {
        if !agent.is_guiding() {
            continue;
        }
        if agent.is_active() {
            guidance::shed_dead(agent, &mut state.victims)?;
        } else {
            let released = guidance::release(agent, &mut state.victims)?;
            info!(
                tick,
                agent = %agent.id,
                position = %agent.position,
                count = released.len(),
                "Guide down, victims released"
            );
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Per-tick outcome diff
// ---------------------------------------------------------------------------

/// Which actors were already finished when the tick began.
struct Census {
    victims_terminal: Vec<bool>,
    agents_down: Vec<bool>,
}

impl Census {
    fn take(state: &SimulationState) -> Self {
        Self {
            victims_terminal: state.victims.iter().map(Victim::is_terminal).collect(),
            agents_down: state.agents.iter().map(is_down).collect(),
        }
    }

    fn summarize(
        self,
        state: &SimulationState,
        tick: u64,
        evolution: Option<EvolutionSummary>,
        cells_fused: usize,
        task: Option<TaskOutcome>,
    ) -> TickSummary {
        let mut summary = TickSummary {
            tick,
            evolution,
            cells_fused,
            task,
            rescued_by_agents: Vec::new(),
            self_rescued: Vec::new(),
            victims_died: Vec::new(),
            agents_died: Vec::new(),
            tally: state.tally(),
        };
        for (victim, was_terminal) in state.victims.iter().zip(self.victims_terminal) {
            if was_terminal {
                continue;
            }
            match victim.rescued_by() {
                Some(RescuedBy::Agent) => summary.rescued_by_agents.push(victim.id),
                Some(RescuedBy::SelfRescue) => summary.self_rescued.push(victim.id),
                None if victim.is_dead() => summary.victims_died.push(victim.id),
                None => {}
            }
        }
        for (agent, was_down) in state.agents.iter().zip(self.agents_down) {
            if !was_down && is_down(agent) {
                summary.agents_died.push(agent.id);
            }
        }
        summary
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use rescue_agents::{AgentProfile, AssignedTask, VictimProfile, Vitals};
    use rescue_types::{AgentActivity, Cell, DroneId, HazardLevel};
    use rescue_world::Passability;

    use super::*;
    use crate::approval::{AutoApprove, RiskThresholdGate, StaticReviewer};
    use crate::commander::HazardExposureScorer;
    use crate::config::ReviewPolicy;
    use crate::task_log::{MemoryTaskLog, NoOpTaskLog};

    fn make_agent(id: u32, position: Cell, mode: AgentMode) -> Agent {
        Agent::new(AgentId(id), position, mode, AgentProfile::default())
    }

    fn make_victim(id: u32, position: Cell) -> Victim {
        let profile = VictimProfile {
            self_rescue: false,
            ..VictimProfile::default()
        };
        Victim::new(VictimId(id), position, profile)
    }

    fn make_commander() -> Commander {
        Commander::new(
            Box::new(HazardExposureScorer::default()),
            Passability::AvoidObstacles,
        )
    }

    fn make_state(agents: Vec<Agent>, victims: Vec<Victim>) -> SimulationState {
        SimulationState::new(Grid::new(11, 11).unwrap(), agents, victims, Vec::new(), 7)
    }

    fn tick(state: &mut SimulationState) -> TickSummary {
        run_tick(state, &mut AutoApprove, &mut NoOpTaskLog).unwrap()
    }

    // -----------------------------------------------------------------------
    // Counter and cadence
    // -----------------------------------------------------------------------

    #[test]
    fn tick_advances_counter() {
        let mut state = make_state(Vec::new(), Vec::new());
        assert_eq!(tick(&mut state).tick, 1);
        assert_eq!(tick(&mut state).tick, 2);
        assert_eq!(state.tick, 2);
    }

    #[test]
    fn tick_overflow_is_an_error() {
        let mut state = make_state(Vec::new(), Vec::new());
        state.tick = u64::MAX;
        let result = run_tick(&mut state, &mut AutoApprove, &mut NoOpTaskLog);
        assert!(matches!(result, Err(TickError::TickOverflow { last: u64::MAX })));
    }

    #[test]
    fn hazards_evolve_on_cadence() {
        let mut state = make_state(Vec::new(), Vec::new()).with_evolution(HazardEvolution {
            spread_chance: 0.5,
            every: 2,
        });
        state.grid.set_hazard(Cell::new(5, 5), HazardLevel::High).unwrap();
        assert!(tick(&mut state).evolution.is_none());
        assert!(tick(&mut state).evolution.is_some());
        assert!(tick(&mut state).evolution.is_none());
    }

    #[test]
    fn zero_cadence_never_evolves() {
        let cadence = HazardEvolution {
            spread_chance: 1.0,
            every: 0,
        };
        assert!(!cadence.is_due(0));
        assert!(!cadence.is_due(5));
    }

    // -----------------------------------------------------------------------
    // Perception
    // -----------------------------------------------------------------------

    #[test]
    fn drones_feed_the_belief_map() {
        let mut state = make_state(Vec::new(), Vec::new());
        state.drones.push(Drone {
            id: DroneId(0),
            position: Cell::new(5, 5),
            sight_range: 1,
        });
        let summary = tick(&mut state);
        assert_eq!(summary.cells_fused, 9);
        assert!(state.perception.belief().confidence(Cell::new(5, 5)) > 0.0);
    }

    // -----------------------------------------------------------------------
    // Allocation
    // -----------------------------------------------------------------------

    #[test]
    fn idle_ordered_agent_receives_task() {
        let agents = vec![make_agent(0, Cell::new(5, 2), AgentMode::Ordered)];
        let victims = vec![make_victim(0, Cell::new(5, 8))];
        let mut state = make_state(agents, victims).with_commander(make_commander());
        let mut log = MemoryTaskLog::new();
        let summary = run_tick(&mut state, &mut AutoApprove, &mut log).unwrap();
        assert!(matches!(
            summary.task,
            Some(TaskOutcome::Assigned { agent: AgentId(0), victim: VictimId(0), .. })
        ));
        assert_eq!(log.records().len(), 1);
        assert_eq!(log.records()[0].target, Cell::new(5, 8));
        assert_eq!(state.agents[0].activity, AgentActivity::ExecutingTask);
        // One route cell per tick.
        assert_eq!(state.agents[0].position, Cell::new(5, 3));
    }

    #[test]
    fn autonomous_agents_get_no_orders() {
        let agents = vec![make_agent(0, Cell::new(5, 2), AgentMode::Autonomous)];
        let victims = vec![make_victim(0, Cell::new(5, 9))];
        let mut state = make_state(agents, victims).with_commander(make_commander());
        assert!(tick(&mut state).task.is_none());
    }

    #[test]
    fn each_cycle_supersedes_the_held_task() {
        let agents = vec![make_agent(0, Cell::new(5, 2), AgentMode::Ordered)];
        let victims = vec![make_victim(0, Cell::new(5, 8))];
        let mut state = make_state(agents, victims).with_commander(make_commander());
        let mut log = MemoryTaskLog::new();

        run_tick(&mut state, &mut AutoApprove, &mut log).unwrap();
        let first = state.agents[0].current_task().unwrap().task_id;
        let second = run_tick(&mut state, &mut AutoApprove, &mut log).unwrap();
        let Some(TaskOutcome::Assigned { task, .. }) = second.task else {
            panic!("expected a fresh assignment, got {:?}", second.task);
        };
        assert_ne!(task, first);
        assert_eq!(state.agents[0].current_task().unwrap().task_id, task);
        assert_eq!(log.records().len(), 2);
    }

    #[test]
    fn busy_agent_is_redirected_to_better_victim() {
        let mut agent = make_agent(0, Cell::new(5, 2), AgentMode::Ordered);
        agent.assign(AssignedTask {
            task_id: TaskId::new(),
            victim: VictimId(0),
            target: Cell::new(5, 8),
            route: (3..=7).map(|y| Cell::new(5, y)).collect(),
        });
        let victims = vec![make_victim(0, Cell::new(5, 8)), make_victim(1, Cell::new(5, 4))];
        let mut state = make_state(vec![agent], victims).with_commander(make_commander());
        // Only the held task's victim lies behind hazards.
        state.grid.set_hazard(Cell::new(5, 6), HazardLevel::Low).unwrap();
        state.grid.set_hazard(Cell::new(5, 7), HazardLevel::Low).unwrap();

        let summary = tick(&mut state);
        assert!(matches!(
            summary.task,
            Some(TaskOutcome::Assigned { agent: AgentId(0), victim: VictimId(1), .. })
        ));
        assert_eq!(state.agents[0].current_task().unwrap().victim, VictimId(1));
    }

    #[test]
    fn rejected_task_leaves_agent_unassigned() {
        let mut agent = make_agent(0, Cell::new(5, 2), AgentMode::Ordered);
        agent.vitals = Vitals::new(30);
        let victims = vec![make_victim(0, Cell::new(5, 8))];
        let mut state = make_state(vec![agent], victims).with_commander(make_commander());
        let mut gate = RiskThresholdGate::new(50, 20.0, Box::new(StaticReviewer(ReviewPolicy::Reject)));
        let mut log = MemoryTaskLog::new();
        let summary = run_tick(&mut state, &mut gate, &mut log).unwrap();
        assert!(matches!(summary.task, Some(TaskOutcome::Rejected { .. })));
        assert!(log.records().is_empty());
        assert!(state.agents[0].current_task().is_none());
        assert_eq!(state.agents[0].activity, AgentActivity::AwaitingOrders);
    }

    #[test]
    fn penalized_task_is_still_assigned() {
        let mut agent = make_agent(0, Cell::new(5, 2), AgentMode::Ordered);
        agent.vitals = Vitals::new(30);
        let victims = vec![make_victim(0, Cell::new(5, 8))];
        let mut state = make_state(vec![agent], victims).with_commander(make_commander());
        let mut gate = RiskThresholdGate::new(50, 20.0, Box::new(StaticReviewer(ReviewPolicy::Penalize)));
        let summary = run_tick(&mut state, &mut gate, &mut NoOpTaskLog).unwrap();
        assert!(matches!(
            summary.task,
            Some(TaskOutcome::Assigned { score, .. }) if score == 80.0
        ));
    }

    // -----------------------------------------------------------------------
    // Movement, release, and counts
    // -----------------------------------------------------------------------

    #[test]
    fn downed_guide_releases_victims() {
        let mut agent = make_agent(0, Cell::new(5, 5), AgentMode::Autonomous);
        let mut victims = vec![make_victim(0, Cell::new(5, 5))];
        guidance::attach(&mut agent, &mut victims[0]).unwrap();
        agent.vitals = Vitals::new(0);
        let mut state = make_state(vec![agent], victims);
        let summary = tick(&mut state);
        assert!(!state.agents[0].is_guiding());
        assert!(state.victims[0].guided_by().is_none());
        assert_eq!(state.victims[0].position, Cell::new(5, 5));
        assert_eq!(summary.tally.agents_died, 1);
    }

    #[test]
    fn victim_death_is_reported_once() {
        let victims = vec![make_victim(0, Cell::new(5, 5))];
        let mut state = make_state(Vec::new(), victims);
        state.grid.set_hazard(Cell::new(5, 5), HazardLevel::High).unwrap();
        let first = tick(&mut state);
        assert_eq!(first.victims_died, vec![VictimId(0)]);
        assert!(state.all_victims_terminal());
        let second = tick(&mut state);
        assert!(second.victims_died.is_empty());
        assert_eq!(second.tally.victims_died, 1);
    }

    #[test]
    fn self_rescue_is_counted() {
        let profile = VictimProfile::default();
        let victims = vec![Victim::new(VictimId(0), Cell::new(1, 5), profile)];
        let mut state = make_state(Vec::new(), victims);
        state.grid.set_hazard(Cell::new(3, 5), HazardLevel::Low).unwrap();
        let summary = tick(&mut state);
        assert_eq!(summary.self_rescued, vec![VictimId(0)]);
        assert_eq!(summary.tally.self_rescued, 1);
        assert_eq!(summary.tally.victims_remaining, 0);
    }

    #[test]
    fn tally_counts_everything() {
        let mut agents = vec![
            make_agent(0, Cell::new(1, 1), AgentMode::Autonomous),
            make_agent(1, Cell::new(2, 2), AgentMode::Autonomous),
        ];
        agents[1].alive = false;
        let mut victims = vec![
            make_victim(0, Cell::new(1, 1)),
            make_victim(1, Cell::new(2, 2)),
            make_victim(2, Cell::new(3, 3)),
        ];
        victims[0].mark_rescued(RescuedBy::Agent);
        victims[1].mark_rescued(RescuedBy::SelfRescue);
        let counts = tally(&agents, &victims);
        assert_eq!(
            counts,
            RescueTally {
                self_rescued: 1,
                rescued_by_agents: 1,
                victims_died: 0,
                victims_remaining: 1,
                agents_survived: 1,
                agents_died: 1,
            }
        );
    }

    #[test]
    fn snapshot_mirrors_state() {
        let agents = vec![make_agent(0, Cell::new(3, 3), AgentMode::Autonomous)];
        let victims = vec![make_victim(0, Cell::new(6, 6))];
        let mut state = make_state(agents, victims);
        tick(&mut state);
        let snapshot = state.snapshot();
        assert_eq!(snapshot.tick, 1);
        assert_eq!(snapshot.grid.width, 11);
        assert_eq!(snapshot.agents.len(), 1);
        assert_eq!(snapshot.agents[0].position, state.agents[0].position);
        assert_eq!(snapshot.victims[0].remaining_life, 100);
    }
}
