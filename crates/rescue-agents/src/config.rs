//! Parameter tables for rescuers and victims.
//!
//! Each actor class carries a movement speed, starting life, a sight profile
//! (how well it sees at each distance), and a damage table (how much life a
//! hazard level costs per exposure). The scenario configuration embeds these
//! structs directly, so every field deserializes with a class-specific
//! default.

use std::collections::BTreeMap;

use rescue_types::HazardLevel;
use serde::{Deserialize, Serialize};

/// Upper bound on remaining life (a percentage).
pub const MAX_LIFE: u32 = 100;

/// Confidence an actor must exceed before it acts on something it sees.
pub const DEFAULT_VISIBILITY_THRESHOLD: f64 = 35.0;

/// How sight obstruction along the line of sight reduces base sight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attenuation {
    /// `base x (1 - obstruction / 100)`.
    #[default]
    Scale,
    /// `base - obstruction`.
    Subtract,
}

/// Distance-bucketed base sight for one actor class.
///
/// If `sight` is given in YAML, `sight_distance` and `base_sight` must both
/// be present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SightProfile {
    /// Farthest Chebyshev distance the actor can see.
    pub sight_distance: u32,
    /// Base sight percentage per distance bucket.
    pub base_sight: BTreeMap<u32, u32>,
    /// How obstruction is applied.
    #[serde(default)]
    pub attenuation: Attenuation,
}

impl SightProfile {
    /// Rescuer sight: five cells, degrading from 100% to 40%.
    pub fn rescuer() -> Self {
        Self {
            sight_distance: 5,
            base_sight: BTreeMap::from([(1, 100), (2, 80), (3, 60), (4, 50), (5, 40)]),
            attenuation: Attenuation::Scale,
        }
    }

    /// Victim sight: three cells, degrading from 100% to 40%.
    pub fn victim() -> Self {
        Self {
            sight_distance: 3,
            base_sight: BTreeMap::from([(1, 100), (2, 70), (3, 40)]),
            attenuation: Attenuation::Subtract,
        }
    }

    /// Base sight at `steps` cells, with distances past the sight range
    /// clamped to the last bucket. Missing buckets read as 0.
    pub fn base_at(&self, steps: u32) -> u32 {
        self.base_sight
            .get(&steps.min(self.sight_distance))
            .copied()
            .unwrap_or(0)
    }
}

/// Life lost per exposure, by hazard level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageTable {
    /// Level 1.
    pub low: u32,
    /// Level 2.
    pub medium: u32,
    /// Level 3.
    pub high: u32,
}

impl DamageTable {
    /// Rescuer damage: 5 / 10 / 50.
    pub const fn rescuer() -> Self {
        Self {
            low: 5,
            medium: 10,
            high: 50,
        }
    }

    /// Victim damage, twice as punishing: 10 / 20 / 100.
    pub const fn victim() -> Self {
        Self {
            low: 10,
            medium: 20,
            high: 100,
        }
    }

    /// Damage for standing in `level`.
    pub const fn damage_for(&self, level: HazardLevel) -> u32 {
        match level {
            HazardLevel::Clear => 0,
            HazardLevel::Low => self.low,
            HazardLevel::Medium => self.medium,
            HazardLevel::High => self.high,
        }
    }
}

/// Parameters for a rescuer agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Cells moved per tick (guiding moves one fewer, at least one).
    #[serde(default = "default_agent_speed")]
    pub speed: u32,

    /// Life at spawn, capped at [`MAX_LIFE`].
    #[serde(default = "default_starting_life")]
    pub starting_life: u32,

    /// Sight profile.
    #[serde(default = "SightProfile::rescuer")]
    pub sight: SightProfile,

    /// Hazard damage table.
    #[serde(default = "DamageTable::rescuer")]
    pub damage: DamageTable,

    /// Plan routes through obstacles (movement still stops at them).
    #[serde(default = "default_plan_through_obstacles")]
    pub plan_through_obstacles: bool,

    /// Effective sight a victim must exceed to be pursued.
    #[serde(default = "default_visibility_threshold")]
    pub visibility_threshold: f64,
}

impl Default for AgentProfile {
    fn default() -> Self {
        Self {
            speed: default_agent_speed(),
            starting_life: default_starting_life(),
            sight: SightProfile::rescuer(),
            damage: DamageTable::rescuer(),
            plan_through_obstacles: default_plan_through_obstacles(),
            visibility_threshold: default_visibility_threshold(),
        }
    }
}

/// Parameters for a victim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VictimProfile {
    /// Cells moved per self-rescue step.
    #[serde(default = "default_victim_speed")]
    pub speed: u32,

    /// Life at spawn, capped at [`MAX_LIFE`].
    #[serde(default = "default_starting_life")]
    pub starting_life: u32,

    /// Sight profile.
    #[serde(default = "SightProfile::victim")]
    pub sight: SightProfile,

    /// Hazard damage table.
    #[serde(default = "DamageTable::victim")]
    pub damage: DamageTable,

    /// Effective sight a safety cell or hazard must exceed to be noticed.
    #[serde(default = "default_visibility_threshold")]
    pub visibility_threshold: f64,

    /// Walk toward safety unaided. When off, victims only move while escorted.
    #[serde(default = "default_self_rescue")]
    pub self_rescue: bool,
}

impl Default for VictimProfile {
    fn default() -> Self {
        Self {
            speed: default_victim_speed(),
            starting_life: default_starting_life(),
            sight: SightProfile::victim(),
            damage: DamageTable::victim(),
            visibility_threshold: default_visibility_threshold(),
            self_rescue: default_self_rescue(),
        }
    }
}

const fn default_agent_speed() -> u32 {
    3
}

const fn default_victim_speed() -> u32 {
    1
}

const fn default_starting_life() -> u32 {
    MAX_LIFE
}

const fn default_plan_through_obstacles() -> bool {
    true
}

const fn default_self_rescue() -> bool {
    true
}

const fn default_visibility_threshold() -> f64 {
    DEFAULT_VISIBILITY_THRESHOLD
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    #[test]
    fn base_sight_clamps_to_last_bucket() {
        let sight = SightProfile::rescuer();
        assert_eq!(sight.base_at(1), 100);
        assert_eq!(sight.base_at(3), 60);
        assert_eq!(sight.base_at(9), 40);
        assert_eq!(sight.base_at(0), 0);
    }

    #[test]
    fn victims_take_double_damage() {
        let agent = DamageTable::rescuer();
        let victim = DamageTable::victim();
        for level in HazardLevel::HAZARDOUS {
            assert_eq!(victim.damage_for(level), agent.damage_for(level) * 2);
        }
        assert_eq!(agent.damage_for(HazardLevel::Clear), 0);
    }

    #[test]
    fn empty_yaml_yields_class_defaults() {
        let agent: AgentProfile = serde_yml::from_str("{}").unwrap();
        assert_eq!(agent, AgentProfile::default());
        let victim: VictimProfile = serde_yml::from_str("{}").unwrap();
        assert_eq!(victim, VictimProfile::default());
        assert_eq!(victim.sight.attenuation, Attenuation::Subtract);
    }

    #[test]
    fn partial_yaml_overrides_fields() {
        let yaml = r"
speed: 5
sight:
  sight_distance: 2
  base_sight: {1: 90, 2: 45}
damage: {low: 1, medium: 2, high: 3}
";
        let agent: AgentProfile = serde_yml::from_str(yaml).unwrap();
        assert_eq!(agent.speed, 5);
        assert_eq!(agent.sight.base_at(2), 45);
        assert_eq!(agent.damage.damage_for(HazardLevel::High), 3);
        assert!(agent.plan_through_obstacles);
    }
}
