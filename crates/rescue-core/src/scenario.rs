//! Scenario construction from configuration.
//!
//! [`build_simulation`] validates the configuration, generates the grid,
//! and places every actor. Agents and victims spawn on uniformly random
//! passable cells (several may share one); drones hover over any cell. All
//! draws come from one `SmallRng` seeded with `world.seed`, which the state
//! keeps for the rest of the run.

use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rescue_agents::{Agent, Drone, Victim};
use rescue_types::{AgentId, Cell, DroneId, VictimId};
use rescue_world::{Grid, GridParams, WorldError};
use tracing::info;

use crate::commander::Commander;
use crate::config::{ConfigError, ScenarioConfig};
use crate::perception::PerceptionHub;
use crate::tick::{HazardEvolution, SimulationState};

/// Errors that can occur while building a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// The configuration failed validation.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// Grid generation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// The grid has no passable cell to spawn on.
    #[error("no passable cell to place actors on")]
    NoSpawnCell,
}

/// Build the initial state for `config`.
pub fn build_simulation(config: &ScenarioConfig) -> Result<SimulationState, ScenarioError> {
    config.validate()?;
    let world = &config.world;
    let mut rng = SmallRng::seed_from_u64(world.seed);

    let grid = Grid::generate(
        &GridParams {
            width: world.width,
            height: world.height,
            obstacle_count: world.obstacle_count,
            hazard_count: world.hazard_count,
        },
        &mut rng,
    )?;
    let open: Vec<Cell> = grid.cells().filter(|c| grid.is_passable(*c)).collect();
    if open.is_empty() {
        return Err(ScenarioError::NoSpawnCell);
    }

    let population = &config.population;
    let agents = (0..population.agents)
        .map(|i| {
            let position = spawn_cell(&open, &mut rng)?;
            Ok(Agent::new(AgentId(i), position, config.agents.mode, config.agents.profile.clone()))
        })
        .collect::<Result<Vec<_>, ScenarioError>>()?;
    let victims = (0..population.victims)
        .map(|i| {
            let position = spawn_cell(&open, &mut rng)?;
            Ok(Victim::new(VictimId(i), position, config.victims.clone()))
        })
        .collect::<Result<Vec<_>, ScenarioError>>()?;
    let drones: Vec<Drone> = (0..population.drones)
        .map(|i| Drone {
            id: DroneId(i),
            position: Cell::new(
                rng.random_range(0..coordinate(world.width)),
                rng.random_range(0..coordinate(world.height)),
            ),
            sight_range: config.drones.sight_range,
        })
        .collect();

    info!(
        seed = world.seed,
        width = world.width,
        height = world.height,
        obstacles = world.obstacle_count,
        hazards = world.hazard_count,
        agents = agents.len(),
        victims = victims.len(),
        drones = drones.len(),
        "Scenario built"
    );

    let perception = PerceptionHub::new(&grid, &config.perception);
    let mut state = SimulationState::new(grid, agents, victims, drones, world.seed)
        .with_perception(perception)
        .with_evolution(HazardEvolution {
            spread_chance: world.spread_chance,
            every: world.evolve_every,
        });
    if config.commander.enabled {
        state = state.with_commander(Commander::from_config(&config.commander));
    }
    state.rng = rng;
    Ok(state)
}

fn spawn_cell(open: &[Cell], rng: &mut impl Rng) -> Result<Cell, ScenarioError> {
    open.choose(rng).copied().ok_or(ScenarioError::NoSpawnCell)
}

fn coordinate(extent: u32) -> i32 {
    i32::try_from(extent).unwrap_or(i32::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rescue_types::AgentMode;

    use super::*;

    fn make_config() -> ScenarioConfig {
        let mut config = ScenarioConfig::default();
        config.world.width = 20;
        config.world.height = 15;
        config.world.obstacle_count = 40;
        config.world.hazard_count = 5;
        config.population.victims = 12;
        config
    }

    #[test]
    fn builds_requested_population() {
        let state = build_simulation(&make_config()).unwrap();
        assert_eq!(state.agents.len(), 3);
        assert_eq!(state.victims.len(), 12);
        assert_eq!(state.drones.len(), 5);
        assert_eq!(state.grid.obstacle_cells().len(), 40);
        assert!(state.commander.is_some());
        assert_eq!(state.evolution.every, 5);
        assert_eq!(state.tick, 0);
    }

    #[test]
    fn actors_spawn_on_passable_cells() {
        let state = build_simulation(&make_config()).unwrap();
        assert!(state.agents.iter().all(|a| state.grid.is_passable(a.position)));
        assert!(state.victims.iter().all(|v| state.grid.is_passable(v.position)));
        assert!(state.drones.iter().all(|d| state.grid.contains(d.position)));
        assert!(state.agents.iter().all(|a| a.mode == AgentMode::Ordered));
    }

    #[test]
    fn same_seed_same_scenario() {
        let first = build_simulation(&make_config()).unwrap();
        let second = build_simulation(&make_config()).unwrap();
        assert_eq!(first.snapshot(), second.snapshot());
    }

    #[test]
    fn commander_can_be_disabled() {
        let mut config = make_config();
        config.commander.enabled = false;
        assert!(build_simulation(&config).unwrap().commander.is_none());
    }

    #[test]
    fn invalid_config_fails_fast() {
        let mut config = make_config();
        config.world.obstacle_count = 10_000;
        assert!(matches!(
            build_simulation(&config),
            Err(ScenarioError::Config { .. })
        ));
    }
}
