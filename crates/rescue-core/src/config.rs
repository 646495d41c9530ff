//! Configuration loading and typed config structures for a rescue scenario.
//!
//! The canonical configuration lives in `rescue-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure and a loader that reads and validates the file. Every field is
//! defaulted, so a partial or empty file describes the reference scenario:
//! a 75x50 grid with 800 obstacles and 20 hazards, 3 rescuers, 50 victims,
//! 5 drones, and a 1000-round budget.

use std::path::Path;

use rescue_agents::{AgentProfile, MAX_LIFE, VictimProfile};
use rescue_types::AgentMode;
use serde::Deserialize;

use crate::perception::ConfidenceProfile;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The values parse but describe an impossible scenario.
    #[error("invalid config: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level scenario configuration.
///
/// Mirrors the structure of `rescue-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScenarioConfig {
    /// Grid shape, seeding, and hazard evolution.
    #[serde(default)]
    pub world: WorldConfig,

    /// Actor counts.
    #[serde(default)]
    pub population: PopulationConfig,

    /// Rescuer parameters.
    #[serde(default)]
    pub agents: AgentsConfig,

    /// Victim parameters.
    #[serde(default)]
    pub victims: VictimProfile,

    /// Drone parameters.
    #[serde(default)]
    pub drones: DroneConfig,

    /// Belief map fusion and decay.
    #[serde(default)]
    pub perception: PerceptionConfig,

    /// Task allocation.
    #[serde(default)]
    pub commander: CommanderConfig,

    /// Task approval.
    #[serde(default)]
    pub approval: ApprovalConfig,

    /// Run boundaries.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ScenarioConfig {
    /// Load and validate configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the scenario can be built.
    ///
    /// Grid capacity is checked against the same limits grid generation
    /// enforces, so a scenario that validates never fails for capacity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let world = &self.world;
        if world.width < 3 || world.height < 3 {
            return invalid(format!(
                "grid {}x{} has no interior, need at least 3x3",
                world.width, world.height
            ));
        }
        let area = u64::from(world.width).saturating_mul(u64::from(world.height));
        let interior = u64::from(world.width.saturating_sub(2))
            .saturating_mul(u64::from(world.height.saturating_sub(2)));
        if u64::from(world.obstacle_count) > interior {
            return invalid(format!(
                "{} obstacles do not fit in an interior of {interior} cells",
                world.obstacle_count
            ));
        }
        let free = area.saturating_sub(u64::from(world.obstacle_count));
        if u64::from(world.hazard_count) > free {
            return invalid(format!(
                "{} hazards do not fit in {free} obstacle-free cells",
                world.hazard_count
            ));
        }
        if !(0.0..=1.0).contains(&world.spread_chance) {
            return invalid(format!("spread_chance {} is not a probability", world.spread_chance));
        }
        if !self.perception.decay_rate.is_finite() || self.perception.decay_rate < 0.0 {
            return invalid(format!("decay_rate {} must be >= 0", self.perception.decay_rate));
        }
        if self.agents.profile.starting_life > MAX_LIFE || self.victims.starting_life > MAX_LIFE {
            return invalid(format!("starting_life cannot exceed {MAX_LIFE}"));
        }
        if self.agents.profile.speed == 0 {
            return invalid("agents.speed must be at least 1".to_owned());
        }
        if self.simulation.max_rounds == 0 {
            return invalid("simulation.max_rounds must be at least 1".to_owned());
        }
        Ok(())
    }
}

fn invalid(reason: String) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid { reason })
}

/// Grid and hazard configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldConfig {
    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Grid width in cells.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Grid height in cells.
    #[serde(default = "default_height")]
    pub height: u32,

    /// Obstacles scattered over the interior.
    #[serde(default = "default_obstacle_count")]
    pub obstacle_count: u32,

    /// Initial hazard cells, each at a random level.
    #[serde(default = "default_hazard_count")]
    pub hazard_count: u32,

    /// Base probability that a hazard spreads to a neighbor.
    #[serde(default = "default_spread_chance")]
    pub spread_chance: f64,

    /// Hazards evolve every N ticks (0 = never).
    #[serde(default = "default_evolve_every")]
    pub evolve_every: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            width: default_width(),
            height: default_height(),
            obstacle_count: default_obstacle_count(),
            hazard_count: default_hazard_count(),
            spread_chance: default_spread_chance(),
            evolve_every: default_evolve_every(),
        }
    }
}

/// Actor counts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PopulationConfig {
    /// Rescuers to spawn.
    #[serde(default = "default_agents")]
    pub agents: u32,

    /// Victims to spawn.
    #[serde(default = "default_victims")]
    pub victims: u32,

    /// Drones to spawn.
    #[serde(default = "default_drones")]
    pub drones: u32,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            agents: default_agents(),
            victims: default_victims(),
            drones: default_drones(),
        }
    }
}

/// Rescuer configuration: the behavior mode plus the class profile.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentsConfig {
    /// Autonomous search or commander-driven.
    #[serde(default = "default_agent_mode")]
    pub mode: AgentMode,

    /// Speed, life, sight, damage, and planning parameters.
    #[serde(flatten)]
    pub profile: AgentProfile,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            mode: default_agent_mode(),
            profile: AgentProfile::default(),
        }
    }
}

/// Drone configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DroneConfig {
    /// Chebyshev scan radius.
    #[serde(default = "default_drone_sight_range")]
    pub sight_range: u32,
}

impl Default for DroneConfig {
    fn default() -> Self {
        Self {
            sight_range: default_drone_sight_range(),
        }
    }
}

/// Belief map configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PerceptionConfig {
    /// Confidence lost per tick since a cell was last observed.
    #[serde(default = "default_decay_rate")]
    pub decay_rate: f64,

    /// Confidence falloff for drone scans.
    #[serde(default = "ConfidenceProfile::drone")]
    pub drone: ConfidenceProfile,

    /// Confidence falloff for rescuer scans.
    #[serde(default = "ConfidenceProfile::rescuer")]
    pub rescuer: ConfidenceProfile,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            decay_rate: default_decay_rate(),
            drone: ConfidenceProfile::drone(),
            rescuer: ConfidenceProfile::rescuer(),
        }
    }
}

/// Task allocation configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommanderConfig {
    /// Whether a task is allocated each tick.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Fixed benefit of completing a rescue.
    #[serde(default = "default_benefit")]
    pub benefit: f64,

    /// Score penalty per believed hazard level per route cell.
    #[serde(default = "default_hazard_weight")]
    pub hazard_weight: f64,

    /// Plan routes through believed obstacles.
    #[serde(default = "default_true")]
    pub plan_through_obstacles: bool,
}

impl Default for CommanderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            benefit: default_benefit(),
            hazard_weight: default_hazard_weight(),
            plan_through_obstacles: true,
        }
    }
}

/// What the reviewer does with a task that exceeds the risk threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewPolicy {
    /// Pass the task unchanged.
    Approve,
    /// Lower the task's score and pass it.
    #[default]
    Penalize,
    /// Discard the task.
    Reject,
}

/// Task approval configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApprovalConfig {
    /// Whether tasks pass through the risk gate (off = always approve).
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Rescuer risk (100 - remaining life) above which a task is reviewed.
    #[serde(default = "default_max_risk")]
    pub max_risk: u32,

    /// Reviewer decision for high-risk tasks.
    #[serde(default)]
    pub on_high_risk: ReviewPolicy,

    /// Score subtracted by [`ReviewPolicy::Penalize`].
    #[serde(default = "default_penalty")]
    pub penalty: f64,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_risk: default_max_risk(),
            on_high_risk: ReviewPolicy::default(),
            penalty: default_penalty(),
        }
    }
}

/// Simulation boundary configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Round budget. The run also ends once every victim is terminal.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u64,
}

impl Default for SimulationBoundsConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log a progress line every N ticks (0 = never).
    #[serde(default = "default_summary_interval")]
    pub summary_interval: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            summary_interval: default_summary_interval(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions for serde
// ---------------------------------------------------------------------------

const fn default_seed() -> u64 {
    42
}

const fn default_width() -> u32 {
    75
}

const fn default_height() -> u32 {
    50
}

const fn default_obstacle_count() -> u32 {
    800
}

const fn default_hazard_count() -> u32 {
    20
}

const fn default_spread_chance() -> f64 {
    0.1
}

const fn default_evolve_every() -> u64 {
    5
}

const fn default_agents() -> u32 {
    3
}

const fn default_victims() -> u32 {
    50
}

const fn default_drones() -> u32 {
    5
}

const fn default_agent_mode() -> AgentMode {
    AgentMode::Ordered
}

const fn default_drone_sight_range() -> u32 {
    20
}

const fn default_decay_rate() -> f64 {
    0.05
}

const fn default_benefit() -> f64 {
    100.0
}

const fn default_hazard_weight() -> f64 {
    5.0
}

const fn default_max_risk() -> u32 {
    50
}

const fn default_penalty() -> f64 {
    20.0
}

const fn default_max_rounds() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_summary_interval() -> u64 {
    50
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ScenarioConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.world.seed, 42);
        assert_eq!((config.world.width, config.world.height), (75, 50));
        assert_eq!(config.world.obstacle_count, 800);
        assert_eq!(config.population.victims, 50);
        assert_eq!(config.agents.mode, AgentMode::Ordered);
        assert_eq!(config.agents.profile.speed, 3);
        assert_eq!(config.simulation.max_rounds, 1000);
        assert_eq!(config.perception.decay_rate, 0.05);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
world:
  seed: 7
  width: 30
  height: 20
  obstacle_count: 40
  hazard_count: 4
  spread_chance: 0.2
  evolve_every: 3

population:
  agents: 2
  victims: 10
  drones: 1

agents:
  mode: autonomous
  speed: 2
  starting_life: 80
  plan_through_obstacles: false

victims:
  speed: 1
  self_rescue: false

drones:
  sight_range: 8

perception:
  decay_rate: 0.5
  drone:
    inner_radius: 4
    decay_per_unit: 2.5

commander:
  enabled: false
  benefit: 50.0

approval:
  max_risk: 30
  on_high_risk: reject

simulation:
  max_rounds: 200

logging:
  level: "debug"
  summary_interval: 10
"#;

        let config = ScenarioConfig::parse(yaml).unwrap();
        assert_eq!(config.world.seed, 7);
        assert_eq!(config.world.evolve_every, 3);
        assert_eq!(config.population.drones, 1);
        assert_eq!(config.agents.mode, AgentMode::Autonomous);
        assert_eq!(config.agents.profile.speed, 2);
        assert_eq!(config.agents.profile.starting_life, 80);
        assert!(!config.agents.profile.plan_through_obstacles);
        // Untouched profile fields keep their defaults.
        assert_eq!(config.agents.profile.sight.sight_distance, 5);
        assert!(!config.victims.self_rescue);
        assert_eq!(config.drones.sight_range, 8);
        assert_eq!(config.perception.drone.inner_radius, 4);
        assert_eq!(config.perception.rescuer, ConfidenceProfile::rescuer());
        assert!(!config.commander.enabled);
        assert_eq!(config.commander.hazard_weight, 5.0);
        assert_eq!(config.approval.on_high_risk, ReviewPolicy::Reject);
        assert_eq!(config.approval.penalty, 20.0);
        assert_eq!(config.simulation.max_rounds, 200);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = ScenarioConfig::parse("world:\n  seed: 9\n").unwrap();
        assert_eq!(config.world.seed, 9);
        assert_eq!(config.population.agents, 3);
        assert!(config.commander.enabled);
    }

    #[test]
    fn parse_empty_yaml() {
        assert!(ScenarioConfig::parse("").is_ok());
    }

    #[test]
    fn rejects_too_many_obstacles() {
        let yaml = "world:\n  width: 5\n  height: 5\n  obstacle_count: 10\n";
        assert!(matches!(
            ScenarioConfig::parse(yaml),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn rejects_too_many_hazards() {
        let yaml = "world:\n  width: 4\n  height: 4\n  obstacle_count: 4\n  hazard_count: 13\n";
        assert!(matches!(
            ScenarioConfig::parse(yaml),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn rejects_degenerate_grid_and_bounds() {
        for yaml in [
            "world:\n  width: 2\n  height: 10\n  obstacle_count: 0\n",
            "world:\n  spread_chance: 1.5\n",
            "perception:\n  decay_rate: -1.0\n",
            "simulation:\n  max_rounds: 0\n",
            "agents:\n  speed: 0\n",
            "victims:\n  starting_life: 101\n",
        ] {
            assert!(
                matches!(ScenarioConfig::parse(yaml), Err(ConfigError::Invalid { .. })),
                "accepted {yaml:?}"
            );
        }
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        assert!(matches!(
            ScenarioConfig::parse("world: [unclosed"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("rescue-config.yaml");
        if path.exists() {
            let config = ScenarioConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
