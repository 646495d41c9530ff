//! Centralized task allocation.
//!
//! Each cycle the commander pairs every active agent with every victim
//! still awaiting rescue, plans an agent -> victim -> safety route on the
//! belief map, scores it, and emits the single best task. Allocation is
//! greedy: one task per cycle, chosen globally, ties going to the first pair
//! evaluated (agents in roster order, then victims in roster order).
//!
//! The victim -> safety leg is the cheapest route to any believed safety
//! cell, where
//!
//! ```text
//! cost = route length + sum(hazard penalty) - sum(open cardinal neighbors)
//! ```
//!
//! with hazard penalties 10 / 20 / 100 for levels 1 / 2 / 3. Scoring is
//! pluggable through [`RouteScorer`].

use std::collections::BTreeMap;

use rescue_agents::{Agent, AssignedTask, Victim};
use rescue_types::{AgentId, Cell, HazardLevel, TaskId, VictimId};
use rescue_world::{Passability, ShortestPathTree, route};
use tracing::debug;

use crate::config::CommanderConfig;
use crate::perception::BeliefMap;

/// Scores a full agent -> victim -> safety route. Higher is better.
pub trait RouteScorer: Send {
    /// Score `route` against the current belief.
    fn score(&self, route: &[Cell], belief: &BeliefMap) -> f64;
}

/// `benefit - sum(hazard level x hazard_weight)` along the route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HazardExposureScorer {
    /// Fixed benefit of completing a rescue.
    pub benefit: f64,
    /// Penalty per believed hazard level per cell.
    pub hazard_weight: f64,
}

impl Default for HazardExposureScorer {
    fn default() -> Self {
        Self {
            benefit: 100.0,
            hazard_weight: 5.0,
        }
    }
}

impl RouteScorer for HazardExposureScorer {
    fn score(&self, route: &[Cell], belief: &BeliefMap) -> f64 {
        route.iter().fold(self.benefit, |score, cell| {
            let level = f64::from(belief.hazard_estimate(*cell).level());
            self.hazard_weight.mul_add(-level, score)
        })
    }
}

/// Penalty for routing a victim through a cell of `level`.
pub const fn hazard_penalty(level: HazardLevel) -> i64 {
    match level {
        HazardLevel::Clear => 0,
        HazardLevel::Low => 10,
        HazardLevel::Medium => 20,
        HazardLevel::High => 100,
    }
}

/// Cost of a victim's route to safety. Lower is better; open space makes a
/// route cheaper.
pub fn route_cost(route: &[Cell], belief: &BeliefMap) -> i64 {
    let length = i64::try_from(route.len()).unwrap_or(i64::MAX);
    route.iter().fold(length, |cost, cell| {
        cost.saturating_add(hazard_penalty(belief.hazard_estimate(*cell)))
            .saturating_sub(i64::from(belief.open_neighbors(*cell)))
    })
}

/// Lowest-cost route from `from` to any believed safety cell.
///
/// Each reachable safety cell contributes its shortest route; the cheapest
/// wins, the first in layer order on ties. `Some(vec![])` when `from` is a
/// safety cell with nothing cheaper.
pub fn optimal_route_to_safety(
    belief: &BeliefMap,
    from: Cell,
    passability: Passability,
) -> Option<Vec<Cell>> {
    let tree = ShortestPathTree::grow(belief, from, passability);
    let mut best: Option<(i64, Vec<Cell>)> = None;
    for exit in belief.safety_cells() {
        let Some(candidate) = tree.route_to(exit) else {
            continue;
        };
        let cost = route_cost(&candidate, belief);
        if best.as_ref().is_none_or(|(lowest, _)| cost < *lowest) {
            best = Some((cost, candidate));
        }
    }
    best.map(|(_, path)| path)
}

/// A scored assignment of one agent to one victim.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    /// Identifier shared with the task log.
    pub id: TaskId,
    /// Assigned agent.
    pub agent: AgentId,
    /// Victim to collect.
    pub victim: VictimId,
    /// Full route: agent -> victim -> safety.
    pub route: Vec<Cell>,
    /// Score from the active [`RouteScorer`], after any approval penalty.
    pub score: f64,
    /// The victim's position when the task was issued.
    pub target: Cell,
}

impl Task {
    /// Convert into the form an agent executes.
    pub fn into_assignment(self) -> AssignedTask {
        AssignedTask {
            task_id: self.id,
            victim: self.victim,
            target: self.target,
            route: self.route.into(),
        }
    }
}

/// The task allocator.
pub struct Commander {
    scorer: Box<dyn RouteScorer>,
    passability: Passability,
}

impl std::fmt::Debug for Commander {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Commander")
            .field("passability", &self.passability)
            .finish_non_exhaustive()
    }
}

impl Default for Commander {
    fn default() -> Self {
        Self::new(
            Box::new(HazardExposureScorer::default()),
            Passability::ThroughObstacles,
        )
    }
}

impl Commander {
    /// A commander with an explicit scorer and planning passability.
    pub fn new(scorer: Box<dyn RouteScorer>, passability: Passability) -> Self {
        Self {
            scorer,
            passability,
        }
    }

    /// A commander configured from the scenario file.
    pub fn from_config(config: &CommanderConfig) -> Self {
        Self::new(
            Box::new(HazardExposureScorer {
                benefit: config.benefit,
                hazard_weight: config.hazard_weight,
            }),
            Passability::from_flag(config.plan_through_obstacles),
        )
    }

    /// Candidate full routes for `agent` to collect `victim`.
    ///
    /// At most one candidate: the agent -> victim route joined to the optimal
    /// victim -> safety route. Empty when either leg is missing.
    pub fn generate_candidates(
        &self,
        victim: &Victim,
        agent: &Agent,
        belief: &BeliefMap,
    ) -> Vec<Vec<Cell>> {
        let Some(to_safety) = optimal_route_to_safety(belief, victim.position, self.passability)
        else {
            return Vec::new();
        };
        self.join_legs(agent.position, victim.position, &to_safety, belief)
            .into_iter()
            .collect()
    }

    fn join_legs(
        &self,
        from: Cell,
        victim: Cell,
        to_safety: &[Cell],
        belief: &BeliefMap,
    ) -> Option<Vec<Cell>> {
        let mut full = route(belief, from, victim, self.passability);
        if full.is_empty() && from != victim {
            return None;
        }
        full.extend_from_slice(to_safety);
        Some(full)
    }

    /// Score a candidate route.
    pub fn score(&self, route: &[Cell], belief: &BeliefMap) -> f64 {
        self.scorer.score(route, belief)
    }

    /// The globally best task this cycle, or `None` if no active agent can
    /// reach any victim awaiting rescue.
    pub fn select_task(
        &self,
        agents: &[Agent],
        victims: &[Victim],
        belief: &BeliefMap,
    ) -> Option<Task> {
        let waiting: Vec<&Victim> = victims.iter().filter(|v| v.is_awaiting_rescue()).collect();
        if waiting.is_empty() {
            return None;
        }
        let exits: BTreeMap<VictimId, Vec<Cell>> = waiting
            .iter()
            .filter_map(|v| {
                optimal_route_to_safety(belief, v.position, self.passability).map(|r| (v.id, r))
            })
            .collect();

        let mut best: Option<Task> = None;
        for agent in agents.iter().filter(|a| a.is_active()) {
            for victim in &waiting {
                let Some(to_safety) = exits.get(&victim.id) else {
                    continue;
                };
                let Some(candidate) =
                    self.join_legs(agent.position, victim.position, to_safety, belief)
                else {
                    continue;
                };
                let score = self.score(&candidate, belief);
                if best.as_ref().is_none_or(|b| score > b.score) {
                    best = Some(Task {
                        id: TaskId::new(),
                        agent: agent.id,
                        victim: victim.id,
                        route: candidate,
                        score,
                        target: victim.position,
                    });
                }
            }
        }
        if let Some(task) = &best {
            debug!(
                agent = %task.agent,
                victim = %task.victim,
                score = task.score,
                route_len = task.route.len(),
                "Best task selected"
            );
        }
        best
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::indexing_slicing)]
mod tests {
    use rescue_agents::{AgentProfile, VictimProfile};
    use rescue_types::{AgentMode, RescuedBy};
    use rescue_world::Grid;

    use super::*;

    fn make_agent(id: u32, position: Cell) -> Agent {
        Agent::new(AgentId(id), position, AgentMode::Ordered, AgentProfile::default())
    }

    fn make_victim(id: u32, position: Cell) -> Victim {
        Victim::new(VictimId(id), position, VictimProfile::default())
    }

    fn avoiding() -> Commander {
        Commander::new(
            Box::new(HazardExposureScorer::default()),
            Passability::AvoidObstacles,
        )
    }

    // -----------------------------------------------------------------------
    // Costs and scores
    // -----------------------------------------------------------------------

    #[test]
    fn score_penalizes_hazard_levels() {
        let mut grid = Grid::new(10, 10).unwrap();
        grid.set_hazard(Cell::new(2, 2), HazardLevel::High).unwrap();
        grid.set_hazard(Cell::new(3, 2), HazardLevel::Low).unwrap();
        let belief = BeliefMap::from_grid(&grid);
        let scorer = HazardExposureScorer::default();
        let route = [Cell::new(1, 2), Cell::new(2, 2), Cell::new(3, 2)];
        assert!((scorer.score(&route, &belief) - 80.0).abs() < 1e-9);
        assert!((scorer.score(&[], &belief) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn route_cost_rewards_open_space() {
        let mut grid = Grid::new(10, 10).unwrap();
        let belief = BeliefMap::from_grid(&grid);
        // Two interior cells with four open neighbors each: 2 - 8.
        assert_eq!(route_cost(&[Cell::new(4, 4), Cell::new(4, 5)], &belief), -6);

        grid.set_hazard(Cell::new(4, 4), HazardLevel::Medium).unwrap();
        let belief = BeliefMap::from_grid(&grid);
        assert_eq!(route_cost(&[Cell::new(4, 4), Cell::new(4, 5)], &belief), 14);
    }

    #[test]
    fn optimal_exit_avoids_hazard() {
        let mut grid = Grid::new(7, 7).unwrap();
        // Victim at (3, 1): north exit (3, 0) is one step but burning.
        grid.set_hazard(Cell::new(3, 0), HazardLevel::High).unwrap();
        let belief = BeliefMap::from_grid(&grid);
        let path = optimal_route_to_safety(&belief, Cell::new(3, 1), Passability::AvoidObstacles)
            .unwrap();
        assert_ne!(path.last(), Some(&Cell::new(3, 0)));
        assert!(belief.is_safety(*path.last().unwrap()));
    }

    #[test]
    fn no_exit_when_walled_in() {
        let mut grid = Grid::new(7, 7).unwrap();
        for cell in Cell::new(3, 3).cardinal_neighbors() {
            grid.set_obstacle(cell, true).unwrap();
        }
        let belief = BeliefMap::from_grid(&grid);
        assert!(
            optimal_route_to_safety(&belief, Cell::new(3, 3), Passability::AvoidObstacles)
                .is_none()
        );
    }

    // -----------------------------------------------------------------------
    // Candidates and selection
    // -----------------------------------------------------------------------

    #[test]
    fn candidate_joins_both_legs() {
        let grid = Grid::new(9, 9).unwrap();
        let belief = BeliefMap::from_grid(&grid);
        let agent = make_agent(0, Cell::new(2, 4));
        let victim = make_victim(0, Cell::new(4, 4));
        let candidates = avoiding().generate_candidates(&victim, &agent, &belief);
        assert_eq!(candidates.len(), 1);
        let full = &candidates[0];
        assert_eq!(full[1], Cell::new(4, 4));
        assert!(belief.is_safety(*full.last().unwrap()));
    }

    #[test]
    fn unreachable_victim_yields_no_candidate() {
        let mut grid = Grid::new(9, 9).unwrap();
        for cell in Cell::new(4, 4).cardinal_neighbors() {
            grid.set_obstacle(cell, true).unwrap();
        }
        let belief = BeliefMap::from_grid(&grid);
        let agent = make_agent(0, Cell::new(1, 1));
        let victim = make_victim(0, Cell::new(4, 4));
        assert!(avoiding().generate_candidates(&victim, &agent, &belief).is_empty());
    }

    #[test]
    fn select_prefers_hazard_free_route() {
        let mut grid = Grid::new(11, 11).unwrap();
        // Agent in the middle, victims two cells west and east.
        grid.set_hazard(Cell::new(6, 5), HazardLevel::High).unwrap();
        let belief = BeliefMap::from_grid(&grid);
        let agents = vec![make_agent(0, Cell::new(5, 5))];
        let victims = vec![make_victim(0, Cell::new(7, 5)), make_victim(1, Cell::new(3, 5))];
        let task = avoiding().select_task(&agents, &victims, &belief).unwrap();
        assert_eq!(task.victim, VictimId(1));
        assert_eq!(task.agent, AgentId(0));
        assert_eq!(task.target, Cell::new(3, 5));
    }

    #[test]
    fn select_skips_rescued_victims() {
        let grid = Grid::new(9, 9).unwrap();
        let belief = BeliefMap::from_grid(&grid);
        let agents = vec![make_agent(0, Cell::new(4, 4))];
        let mut victims = vec![make_victim(0, Cell::new(3, 3))];
        victims[0].mark_rescued(RescuedBy::SelfRescue);
        assert!(avoiding().select_task(&agents, &victims, &belief).is_none());
    }

    #[test]
    fn select_skips_inactive_agents() {
        let grid = Grid::new(9, 9).unwrap();
        let belief = BeliefMap::from_grid(&grid);
        let mut agents = vec![make_agent(0, Cell::new(4, 4))];
        agents[0].alive = false;
        let victims = vec![make_victim(0, Cell::new(3, 3))];
        assert!(avoiding().select_task(&agents, &victims, &belief).is_none());
    }

    #[test]
    fn ties_go_to_first_pair() {
        let grid = Grid::new(11, 11).unwrap();
        let belief = BeliefMap::from_grid(&grid);
        let agents = vec![make_agent(0, Cell::new(5, 5)), make_agent(1, Cell::new(5, 6))];
        let victims = vec![make_victim(0, Cell::new(3, 5)), make_victim(1, Cell::new(7, 5))];
        let task = avoiding().select_task(&agents, &victims, &belief).unwrap();
        assert_eq!((task.agent, task.victim), (AgentId(0), VictimId(0)));
    }

    #[test]
    fn custom_scorer_is_used() {
        struct Flat;
        impl RouteScorer for Flat {
            fn score(&self, _route: &[Cell], _belief: &BeliefMap) -> f64 {
                7.0
            }
        }
        let grid = Grid::new(11, 11).unwrap();
        let belief = BeliefMap::from_grid(&grid);
        let agents = vec![make_agent(0, Cell::new(5, 5))];
        let victims = vec![make_victim(0, Cell::new(5, 4)), make_victim(1, Cell::new(5, 8))];
        let commander = Commander::new(Box::new(Flat), Passability::AvoidObstacles);
        let task = commander.select_task(&agents, &victims, &belief).unwrap();
        assert_eq!(task.score, 7.0);
        assert_eq!(task.victim, VictimId(0));
    }
}
