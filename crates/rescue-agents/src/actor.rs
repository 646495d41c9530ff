//! Rescuers, victims, and drones.
//!
//! Actors refer to each other by roster index only: an agent lists the
//! [`VictimId`]s it escorts and each victim records the [`AgentId`] of its
//! guide. Keeping both sides consistent is the job of
//! [`guidance`](crate::guidance).

use std::collections::VecDeque;

use rescue_types::{
    AgentActivity, AgentId, AgentMode, AgentSnapshot, Cell, DroneId, DroneSnapshot, RescuedBy,
    TaskId, VictimId, VictimSnapshot,
};
use rescue_world::{Grid, Passability};
use tracing::debug;

use crate::config::{AgentProfile, VictimProfile};
use crate::vitals::{Exposure, Vitals};

/// A commander-issued assignment held by an ordered-mode agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedTask {
    /// Identifier shared with the task log.
    pub task_id: TaskId,
    /// The victim to collect.
    pub victim: VictimId,
    /// Where the victim stood when the task was issued.
    pub target: Cell,
    /// Cells still to walk, front first.
    pub route: VecDeque<Cell>,
}

/// A mobile rescuer.
#[derive(Debug, Clone)]
pub struct Agent {
    /// Roster index.
    pub id: AgentId,
    /// Current cell.
    pub position: Cell,
    /// Remaining life.
    pub vitals: Vitals,
    /// Cleared when life runs out off a safety cell.
    pub alive: bool,
    /// Autonomous search or commander-driven.
    pub mode: AgentMode,
    /// What the agent did on its last decision.
    pub activity: AgentActivity,
    /// Class parameters.
    pub profile: AgentProfile,
    pub(crate) current_task: Option<AssignedTask>,
    pub(crate) guided_victims: Vec<VictimId>,
    pub(crate) moves: u64,
}

impl Agent {
    /// A fresh agent at `position`.
    pub const fn new(id: AgentId, position: Cell, mode: AgentMode, profile: AgentProfile) -> Self {
        Self {
            id,
            position,
            vitals: Vitals::new(profile.starting_life),
            alive: true,
            mode,
            activity: AgentActivity::Searching,
            profile,
            current_task: None,
            guided_victims: Vec::new(),
            moves: 0,
        }
    }

    /// Cells per tick on a direct walk toward a visible target.
    pub const fn speed(&self) -> u32 {
        self.profile.speed
    }

    /// Cells per tick while escorting: one fewer than [`Agent::speed`], at
    /// least one.
    pub const fn guiding_speed(&self) -> u32 {
        let slower = self.profile.speed.saturating_sub(1);
        if slower == 0 { 1 } else { slower }
    }

    /// Direct-walk budget this tick: [`Agent::guiding_speed`] while
    /// escorting, else [`Agent::speed`].
    pub fn current_speed(&self) -> u32 {
        if self.is_guiding() {
            self.guiding_speed()
        } else {
            self.speed()
        }
    }

    /// Remaining life percentage.
    pub const fn remaining_life(&self) -> u32 {
        self.vitals.remaining_life()
    }

    /// Whether the agent still takes part in the simulation.
    pub const fn is_active(&self) -> bool {
        self.alive && !self.vitals.is_depleted()
    }

    /// Victims currently escorted, in attachment order.
    pub fn guided_victims(&self) -> &[VictimId] {
        &self.guided_victims
    }

    /// Whether this agent is escorting anyone.
    pub fn is_guiding(&self) -> bool {
        !self.guided_victims.is_empty()
    }

    /// The assignment being executed, if any.
    pub const fn current_task(&self) -> Option<&AssignedTask> {
        self.current_task.as_ref()
    }

    /// Replace any current assignment.
    pub fn assign(&mut self, task: AssignedTask) {
        debug!(agent = %self.id, task = %task.task_id, victim = %task.victim, "Task assigned");
        self.current_task = Some(task);
    }

    /// Drop the current assignment.
    pub fn clear_task(&mut self) -> Option<AssignedTask> {
        self.current_task.take()
    }

    /// Passability used when planning routes.
    pub const fn planning(&self) -> Passability {
        Passability::from_flag(self.profile.plan_through_obstacles)
    }

    /// Charge hazard damage for the current cell.
    ///
    /// Repeated calls within the same tick without movement charge once.
    /// Running out of life off a safety cell kills the agent.
    pub fn apply_hazard_damage(&mut self, grid: &Grid, tick: u64) -> u32 {
        let exposure = Exposure {
            tick,
            step: self.moves,
        };
        let lost = self.vitals.apply_hazard_damage(
            grid.hazard(self.position),
            &self.profile.damage,
            exposure,
        );
        if self.alive && self.vitals.is_depleted() && !grid.is_safety(self.position) {
            self.alive = false;
            debug!(agent = %self.id, position = %self.position, tick, "Agent died");
        }
        lost
    }

    /// Render view.
    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id,
            position: self.position,
            remaining_life: self.remaining_life(),
            alive: self.alive,
            mode: self.mode,
            activity: self.activity,
            guided_victims: self.guided_victims.clone(),
            has_task: self.current_task.is_some(),
        }
    }
}

/// A person awaiting rescue.
#[derive(Debug, Clone)]
pub struct Victim {
    /// Roster index.
    pub id: VictimId,
    /// Current cell.
    pub position: Cell,
    /// Remaining life.
    pub vitals: Vitals,
    /// Class parameters.
    pub profile: VictimProfile,
    pub(crate) rescued_by: Option<RescuedBy>,
    pub(crate) guided_by: Option<AgentId>,
    pub(crate) moves: u64,
}

impl Victim {
    /// A fresh victim at `position`.
    pub const fn new(id: VictimId, position: Cell, profile: VictimProfile) -> Self {
        Self {
            id,
            position,
            vitals: Vitals::new(profile.starting_life),
            profile,
            rescued_by: None,
            guided_by: None,
            moves: 0,
        }
    }

    /// Remaining life percentage.
    pub const fn remaining_life(&self) -> u32 {
        self.vitals.remaining_life()
    }

    /// Whether the victim reached safety.
    pub const fn is_rescued(&self) -> bool {
        self.rescued_by.is_some()
    }

    /// Who brought the victim to safety.
    pub const fn rescued_by(&self) -> Option<RescuedBy> {
        self.rescued_by
    }

    /// Out of life before reaching safety.
    pub const fn is_dead(&self) -> bool {
        !self.is_rescued() && self.vitals.is_depleted()
    }

    /// Rescued or dead.
    pub const fn is_terminal(&self) -> bool {
        self.is_rescued() || self.vitals.is_depleted()
    }

    /// The escorting agent, if any.
    pub const fn guided_by(&self) -> Option<AgentId> {
        self.guided_by
    }

    /// Whether an agent is escorting this victim.
    pub const fn being_guided(&self) -> bool {
        self.guided_by.is_some()
    }

    /// Alive, unrescued, and not yet escorted.
    pub const fn is_awaiting_rescue(&self) -> bool {
        !self.is_terminal() && !self.being_guided()
    }

    /// Record the rescue. Ignored if the victim is already terminal.
    pub fn mark_rescued(&mut self, by: RescuedBy) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.rescued_by = Some(by);
        self.guided_by = None;
        true
    }

    /// Charge hazard damage for the current cell, at most once per
    /// (tick, movement step).
    pub fn apply_hazard_damage(&mut self, grid: &Grid, tick: u64) -> u32 {
        if self.is_rescued() {
            return 0;
        }
        let exposure = Exposure {
            tick,
            step: self.moves,
        };
        self.vitals
            .apply_hazard_damage(grid.hazard(self.position), &self.profile.damage, exposure)
    }

    /// Render view.
    pub const fn snapshot(&self) -> VictimSnapshot {
        VictimSnapshot {
            id: self.id,
            position: self.position,
            remaining_life: self.remaining_life(),
            rescued: self.is_rescued(),
            rescued_by: self.rescued_by,
            guided_by: self.guided_by,
        }
    }
}

/// A static aerial observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drone {
    /// Roster index.
    pub id: DroneId,
    /// Hover cell.
    pub position: Cell,
    /// Chebyshev scan radius.
    pub sight_range: u32,
}

impl Drone {
    /// Render view.
    pub const fn snapshot(&self) -> DroneSnapshot {
        DroneSnapshot {
            id: self.id,
            position: self.position,
            sight_range: self.sight_range,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rescue_types::HazardLevel;

    use super::*;

    fn make_agent(position: Cell) -> Agent {
        Agent::new(AgentId(0), position, AgentMode::Autonomous, AgentProfile::default())
    }

    fn make_victim(position: Cell) -> Victim {
        Victim::new(VictimId(0), position, VictimProfile::default())
    }

    #[test]
    fn guiding_speed_is_one_slower_but_never_zero() {
        let mut agent = make_agent(Cell::new(0, 0));
        assert_eq!(agent.guiding_speed(), 2);
        agent.profile.speed = 1;
        assert_eq!(agent.guiding_speed(), 1);
        agent.profile.speed = 0;
        assert_eq!(agent.guiding_speed(), 1);
    }

    #[test]
    fn current_speed_slows_while_escorting() {
        let mut agent = make_agent(Cell::new(0, 0));
        let mut victim = make_victim(Cell::new(1, 0));
        assert_eq!(agent.current_speed(), 3);
        crate::guidance::attach(&mut agent, &mut victim).unwrap();
        assert_eq!(agent.current_speed(), 2);
    }

    #[test]
    fn agent_dies_off_safety() {
        let mut grid = Grid::new(6, 6).unwrap();
        grid.set_hazard(Cell::new(2, 2), HazardLevel::High).unwrap();
        let mut agent = make_agent(Cell::new(2, 2));
        agent.vitals = Vitals::new(50);
        assert_eq!(agent.apply_hazard_damage(&grid, 1), 50);
        assert!(!agent.alive);
        assert!(!agent.is_active());
    }

    #[test]
    fn agent_out_of_life_on_safety_stays_alive_but_inactive() {
        let mut grid = Grid::new(6, 6).unwrap();
        grid.set_hazard(Cell::new(0, 2), HazardLevel::High).unwrap();
        let mut agent = make_agent(Cell::new(0, 2));
        agent.vitals = Vitals::new(50);
        agent.apply_hazard_damage(&grid, 1);
        assert!(agent.alive);
        assert!(!agent.is_active());
    }

    #[test]
    fn damage_once_per_tick_without_movement() {
        let mut grid = Grid::new(6, 6).unwrap();
        grid.set_hazard(Cell::new(2, 2), HazardLevel::Low).unwrap();
        let mut victim = make_victim(Cell::new(2, 2));
        victim.apply_hazard_damage(&grid, 4);
        victim.apply_hazard_damage(&grid, 4);
        assert_eq!(victim.remaining_life(), 90);
        victim.apply_hazard_damage(&grid, 5);
        assert_eq!(victim.remaining_life(), 80);
    }

    #[test]
    fn victim_lifecycle() {
        let mut victim = make_victim(Cell::new(1, 1));
        assert!(victim.is_awaiting_rescue());
        victim.guided_by = Some(AgentId(3));
        assert!(!victim.is_awaiting_rescue());
        assert!(victim.mark_rescued(RescuedBy::Agent));
        assert!(victim.is_rescued());
        assert!(victim.guided_by().is_none());
        assert!(!victim.mark_rescued(RescuedBy::SelfRescue));
        assert_eq!(victim.rescued_by(), Some(RescuedBy::Agent));
    }

    #[test]
    fn dead_victims_cannot_be_rescued() {
        let mut grid = Grid::new(6, 6).unwrap();
        grid.set_hazard(Cell::new(2, 2), HazardLevel::High).unwrap();
        let mut victim = make_victim(Cell::new(2, 2));
        victim.apply_hazard_damage(&grid, 1);
        assert!(victim.is_dead());
        assert!(victim.is_terminal());
        assert!(!victim.mark_rescued(RescuedBy::Agent));
    }

    #[test]
    fn snapshot_reports_task_and_guidance() {
        let mut agent = make_agent(Cell::new(1, 2));
        agent.guided_victims.push(VictimId(4));
        agent.assign(AssignedTask {
            task_id: TaskId::new(),
            victim: VictimId(4),
            target: Cell::new(0, 2),
            route: VecDeque::from([Cell::new(0, 2)]),
        });
        let snapshot = agent.snapshot();
        assert!(snapshot.has_task);
        assert_eq!(snapshot.guided_victims, vec![VictimId(4)]);
        assert!(agent.clear_task().is_some());
        assert!(!agent.snapshot().has_task);
    }
}
