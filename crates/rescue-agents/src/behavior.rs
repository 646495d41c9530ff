//! Per-tick decisions for agents and victims.
//!
//! The agent decision table, evaluated top to bottom:
//!
//! | Condition | Action | Activity |
//! |-----------|--------|----------|
//! | out of life or dead | nothing | `Incapacitated` |
//! | escorting victims | [`guide_step`] | `Guiding` |
//! | ordered, task held | walk the task route | `ExecutingTask` |
//! | ordered, no task | wait | `AwaitingOrders` |
//! | autonomous, victim in sight | route toward it, attach when adjacent | `Pursuing` / `Guiding` |
//! | autonomous, no victim in sight or no way forward | explore | `Searching` |
//!
//! Planned routes advance one cell per tick. Self-rescue runs after the
//! primary action for every actor that did not spend the tick on a victim.
//! Randomness is always injected.

use rand::Rng;
use rand::seq::IndexedRandom;
use rescue_types::{AgentActivity, AgentMode, Cell, RescuedBy, VictimId};
use rescue_world::{Grid, Passability, nearest_route, route};
use tracing::debug;

use crate::actor::{Agent, Victim};
use crate::config::SightProfile;
use crate::error::AgentError;
use crate::guidance;
use crate::movement::{self, Mobile, ROUTE_STEP, Stride};
use crate::sight::can_see;

/// Run one decision for `agent` and move it.
///
/// Returns the activity the agent ended the tick in, which is also stored
/// on the agent.
pub fn decide_and_move(
    agent: &mut Agent,
    victims: &mut [Victim],
    grid: &Grid,
    tick: u64,
    rng: &mut impl Rng,
) -> Result<AgentActivity, AgentError> {
    let activity = if !agent.is_active() {
        AgentActivity::Incapacitated
    } else if agent.is_guiding() {
        guide_step(agent, victims, grid, tick)?;
        AgentActivity::Guiding
    } else {
        match agent.mode {
            AgentMode::Ordered => execute_task(agent, victims, grid, tick)?,
            AgentMode::Autonomous => pursue_or_explore(agent, victims, grid, tick, rng)?,
        }
    };
    agent.activity = activity;
    Ok(activity)
}

/// Escort the agent's victims toward the nearest reachable safety cell.
///
/// The agent moves one cell along the shortest obstacle-free route, victims
/// travel on its cell, and arriving on a safety cell rescues
/// them all. An agent that can no longer act releases its victims.
///
/// Returns the victims rescued this step.
pub fn guide_step(
    agent: &mut Agent,
    victims: &mut [Victim],
    grid: &Grid,
    tick: u64,
) -> Result<Vec<VictimId>, AgentError> {
    guidance::shed_dead(agent, victims)?;
    if !agent.is_guiding() {
        return Ok(Vec::new());
    }
    if !grid.is_safety(agent.position) {
        match nearest_route(grid, agent.position, Passability::AvoidObstacles, |c| {
            grid.is_safety(c)
        }) {
            Some(path) => {
                movement::follow(agent, path, ROUTE_STEP, grid, tick, |_| false);
            }
            None => {
                debug!(agent = %agent.id, position = %agent.position, "No route to safety");
            }
        }
        guidance::carry(agent, victims)?;
    }
    if grid.is_safety(agent.position) {
        return guidance::deliver(agent, victims);
    }
    if !agent.is_active() {
        guidance::release(agent, victims)?;
    }
    Ok(Vec::new())
}

fn execute_task(
    agent: &mut Agent,
    victims: &mut [Victim],
    grid: &Grid,
    tick: u64,
) -> Result<AgentActivity, AgentError> {
    let Some(mut task) = agent.clear_task() else {
        return Ok(AgentActivity::AwaitingOrders);
    };
    let victim = guidance::victim_mut(victims, task.victim)?;
    if !victim.is_awaiting_rescue() {
        debug!(agent = %agent.id, victim = %task.victim, "Task dropped, victim no longer waiting");
        return Ok(AgentActivity::AwaitingOrders);
    }
    let victim_position = victim.position;

    if !agent.position.is_adjacent(victim_position) {
        let blocked = task.route.front().is_some_and(|c| !grid.is_passable(*c));
        if blocked || task.route.is_empty() {
            debug!(agent = %agent.id, task = %task.task_id, blocked, "Re-planning task route");
            task.route = route(
                grid,
                agent.position,
                victim_position,
                Passability::AvoidObstacles,
            )
            .into();
        }
        if task.route.is_empty() {
            debug!(agent = %agent.id, task = %task.task_id, "Task route exhausted");
            return Ok(AgentActivity::AwaitingOrders);
        }
        let stride = movement::follow(
            agent,
            task.route.iter().copied(),
            ROUTE_STEP,
            grid,
            tick,
            |c| c.is_adjacent(victim_position),
        );
        task.route.drain(..stride.moved.min(task.route.len()));
    }

    if !agent.is_active() {
        return Ok(AgentActivity::Incapacitated);
    }
    if agent.position.is_adjacent(victim_position) {
        guidance::attach(agent, guidance::victim_mut(victims, task.victim)?)?;
        guide_step(agent, victims, grid, tick)?;
        return Ok(AgentActivity::Guiding);
    }
    agent.current_task = Some(task);
    Ok(AgentActivity::ExecutingTask)
}

fn pursue_or_explore(
    agent: &mut Agent,
    victims: &mut [Victim],
    grid: &Grid,
    tick: u64,
    rng: &mut impl Rng,
) -> Result<AgentActivity, AgentError> {
    let origin = agent.position;
    let target = victims
        .iter()
        .filter(|v| v.is_awaiting_rescue())
        .filter(|v| {
            can_see(
                origin,
                v.position,
                &agent.profile.sight,
                agent.profile.visibility_threshold,
                grid,
            )
        })
        .min_by_key(|v| origin.manhattan(v.position))
        .map(|v| (v.id, v.position));

    let Some((victim_id, victim_position)) = target else {
        explore(agent, grid, tick, rng);
        return Ok(AgentActivity::Searching);
    };

    if !origin.is_adjacent(victim_position) {
        let planning = agent.planning();
        let mut stride = step_toward_victim(agent, victim_position, planning, grid, tick);
        if stride.moved == 0 && planning != Passability::AvoidObstacles {
            // The optimistic route runs into rubble; walk around it instead.
            stride = step_toward_victim(
                agent,
                victim_position,
                Passability::AvoidObstacles,
                grid,
                tick,
            );
        }
        if stride.moved == 0 {
            debug!(agent = %agent.id, victim = %victim_id, "No way toward victim, exploring");
            explore(agent, grid, tick, rng);
            return Ok(AgentActivity::Searching);
        }
    }

    if agent.is_active() && agent.position.is_adjacent(victim_position) {
        debug!(agent = %agent.id, victim = %victim_id, "Reached victim");
        guidance::attach(agent, guidance::victim_mut(victims, victim_id)?)?;
        guide_step(agent, victims, grid, tick)?;
        return Ok(AgentActivity::Guiding);
    }
    if agent.is_active() {
        Ok(AgentActivity::Pursuing)
    } else {
        Ok(AgentActivity::Incapacitated)
    }
}

/// Plan toward `target` and take one route cell, stopping once adjacent.
fn step_toward_victim(
    agent: &mut Agent,
    target: Cell,
    passability: Passability,
    grid: &Grid,
    tick: u64,
) -> Stride {
    let path = route(grid, agent.position, target, passability);
    movement::follow(agent, path, ROUTE_STEP, grid, tick, |c| c.is_adjacent(target))
}

/// Step away from the nearest visible safety cell, or randomly when none
/// is visible.
fn explore(agent: &mut Agent, grid: &Grid, tick: u64, rng: &mut impl Rng) {
    let origin = agent.position;
    let threshold = agent.profile.visibility_threshold;
    let nearest_safety = visible_cells(origin, &agent.profile.sight, threshold, grid)
        .filter(|c| grid.is_safety(*c))
        .min_by_key(|c| origin.manhattan(*c));
    let away = nearest_safety
        .and_then(|safety| origin.step_away_from(safety))
        .filter(|c| grid.is_passable(*c));
    match away {
        Some(cell) => {
            movement::follow(agent, [cell], 1, grid, tick, |_| false);
        }
        None => wander(agent, grid, tick, rng),
    }
}

/// Cells other than its own within Manhattan sight distance that the
/// observer sees above `threshold`.
fn visible_cells<'a>(
    observer: Cell,
    profile: &'a SightProfile,
    threshold: f64,
    grid: &'a Grid,
) -> impl Iterator<Item = Cell> + 'a {
    grid.square(observer, profile.sight_distance)
        .filter(move |c| *c != observer && observer.manhattan(*c) <= profile.sight_distance)
        .filter(move |c| can_see(observer, *c, profile, threshold, grid))
}

/// Agent self-preservation after the primary action.
///
/// Only agents that are idle this tick, off safety, and see a hazard react:
/// a walk of up to [`Agent::current_speed`] cells toward the nearest visible
/// safety cell, or a random passable step when none is visible.
pub fn agent_self_rescue(agent: &mut Agent, grid: &Grid, tick: u64, rng: &mut impl Rng) {
    if !agent.is_active() || agent.is_guiding() || agent.activity.is_engaged() {
        return;
    }
    if grid.is_safety(agent.position) {
        return;
    }
    let origin = agent.position;
    let threshold = agent.profile.visibility_threshold;
    let visible: Vec<Cell> = visible_cells(origin, &agent.profile.sight, threshold, grid).collect();
    if !visible.iter().any(|c| grid.hazard(*c).is_hazardous()) {
        return;
    }
    let nearest_safety = visible
        .iter()
        .copied()
        .filter(|c| grid.is_safety(*c))
        .min_by_key(|c| origin.manhattan(*c));
    match nearest_safety {
        Some(safety) => {
            let speed = agent.current_speed();
            movement::walk_toward(agent, safety, speed, grid, tick);
        }
        None => wander(agent, grid, tick, rng),
    }
    debug!(agent = %agent.id, from = %origin, to = %agent.position, "Agent evaded hazard");
}

/// Victim self-rescue for one tick, followed by hazard exposure.
///
/// Victims whose profile disables self-rescue only take exposure. An
/// unescorted victim walks toward the nearest visible safety cell or,
/// failing that, away from the centroid of the hazards it sees. A victim
/// that ends up where it started takes a random passable step instead.
/// Standing on a safety cell alive afterwards counts as a self-rescue.
///
/// Returns `true` if the victim rescued itself this tick.
pub fn victim_self_rescue(victim: &mut Victim, grid: &Grid, tick: u64, rng: &mut impl Rng) -> bool {
    if victim.is_terminal() || victim.being_guided() {
        return false;
    }
    if !victim.profile.self_rescue {
        expose_victim(victim, grid, tick);
        return false;
    }
    let origin = victim.position;
    let profile = &victim.profile;
    let visible: Vec<Cell> =
        visible_cells(origin, &profile.sight, profile.visibility_threshold, grid).collect();
    let speed = profile.speed;

    let nearest_safety = visible
        .iter()
        .copied()
        .filter(|c| grid.is_safety(*c))
        .min_by_key(|c| origin.manhattan(*c));
    let hazards: Vec<Cell> = visible
        .iter()
        .copied()
        .filter(|c| grid.hazard(*c).is_hazardous())
        .collect();

    if !grid.is_safety(origin) {
        if let Some(safety) = nearest_safety {
            movement::walk_toward(victim, safety, speed, grid, tick);
        } else if !hazards.is_empty() {
            flee_hazards(victim, &hazards, grid, tick, rng);
        }
        if victim.position == origin && !victim.is_terminal() {
            wander(victim, grid, tick, rng);
        }
    }

    expose_victim(victim, grid, tick);
    if grid.is_safety(victim.position) && victim.mark_rescued(RescuedBy::SelfRescue) {
        debug!(victim = %victim.id, position = %victim.position, tick, "Victim reached safety");
        return true;
    }
    false
}

/// Charge hazard damage for the victim's current cell once this tick.
pub fn expose_victim(victim: &mut Victim, grid: &Grid, tick: u64) -> u32 {
    let lost = victim.apply_hazard_damage(grid, tick);
    if lost > 0 && victim.is_dead() {
        debug!(victim = %victim.id, position = %victim.position, tick, "Victim died");
    }
    lost
}

/// Step away from the centroid of `hazards`, or randomly if that cell is
/// blocked.
fn flee_hazards(victim: &mut Victim, hazards: &[Cell], grid: &Grid, tick: u64, rng: &mut impl Rng) {
    let origin = victim.position();
    let count = i64::try_from(hazards.len()).unwrap_or(i64::MAX);
    let (sum_x, sum_y) = hazards.iter().fold((0_i64, 0_i64), |(x, y), c| {
        (x.saturating_add(i64::from(c.x)), y.saturating_add(i64::from(c.y)))
    });
    // Compare origin * n with the coordinate sums so the centroid stays integral.
    let dx = i64::from(origin.x).saturating_mul(count).saturating_sub(sum_x);
    let dy = i64::from(origin.y).saturating_mul(count).saturating_sub(sum_y);
    let away = if dx == 0 && dy == 0 {
        None
    } else if dx.unsigned_abs() >= dy.unsigned_abs() {
        Some(origin.offset(sign(dx), 0))
    } else {
        Some(origin.offset(0, sign(dy)))
    };
    match away.filter(|c| grid.is_passable(*c)) {
        Some(cell) => {
            movement::follow(victim, [cell], 1, grid, tick, |_| false);
        }
        None => wander(victim, grid, tick, rng),
    }
}

/// One step onto a uniformly chosen passable cardinal neighbour, if any.
fn wander<M: Mobile>(mover: &mut M, grid: &Grid, tick: u64, rng: &mut impl Rng) {
    if let Some(cell) = grid.passable_neighbors(mover.position()).choose(rng).copied() {
        movement::follow(mover, [cell], 1, grid, tick, |_| false);
    }
}

const fn sign(value: i64) -> i32 {
    if value > 0 {
        1
    } else if value < 0 {
        -1
    } else {
        0
    }
}
