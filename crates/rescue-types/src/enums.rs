//! Enumeration types for hazards, actor modes, and behavior states.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Hazards
// ---------------------------------------------------------------------------

/// Severity of a hazard cell (fire/smoke).
///
/// Levels are ordered, so `HazardLevel::Low < HazardLevel::High` holds and
/// spread comparisons read naturally.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum HazardLevel {
    /// No hazard.
    #[default]
    Clear,
    /// Level 1.
    Low,
    /// Level 2.
    Medium,
    /// Level 3.
    High,
}

impl HazardLevel {
    /// The three hazardous levels, mildest first.
    pub const HAZARDOUS: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Map a numeric level (0..=3) to a hazard, `None` when out of range.
    pub const fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(Self::Clear),
            1 => Some(Self::Low),
            2 => Some(Self::Medium),
            3 => Some(Self::High),
            _ => None,
        }
    }

    /// The numeric level (0..=3).
    pub const fn level(self) -> u8 {
        match self {
            Self::Clear => 0,
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    /// Whether this cell carries any hazard.
    pub const fn is_hazardous(self) -> bool {
        !matches!(self, Self::Clear)
    }

    /// One level more severe, capped at [`HazardLevel::High`].
    pub const fn intensified(self) -> Self {
        match self {
            Self::Clear => Self::Low,
            Self::Low => Self::Medium,
            Self::Medium | Self::High => Self::High,
        }
    }

    /// One level milder, floored at [`HazardLevel::Clear`].
    pub const fn decayed(self) -> Self {
        match self {
            Self::Clear | Self::Low => Self::Clear,
            Self::Medium => Self::Low,
            Self::High => Self::Medium,
        }
    }
}

// ---------------------------------------------------------------------------
// Actors
// ---------------------------------------------------------------------------

/// How an agent chooses what to do each tick.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum AgentMode {
    /// Searches for and pursues visible victims on its own.
    #[default]
    Autonomous,
    /// Executes routes assigned by the commander.
    Ordered,
}

/// The behavior state an agent ended its last tick in.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum AgentActivity {
    /// Exploring with no eligible victim in sight.
    #[default]
    Searching,
    /// Moving toward a chosen victim.
    Pursuing,
    /// Escorting one or more victims to safety.
    Guiding,
    /// Following a commander-assigned route.
    ExecutingTask,
    /// Ordered mode with no task assigned.
    AwaitingOrders,
    /// Dead or out of life; no longer acts.
    Incapacitated,
}

impl AgentActivity {
    /// Whether the agent spent this tick on a victim (pursuit, escort, or task).
    pub const fn is_engaged(self) -> bool {
        matches!(self, Self::Pursuing | Self::Guiding | Self::ExecutingTask)
    }
}

/// Who brought a victim to safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum RescuedBy {
    /// The victim walked onto a safety cell unaided.
    #[serde(rename = "self")]
    SelfRescue,
    /// An agent guided the victim onto a safety cell.
    Agent,
}

/// Observer classes that contribute perception reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ObserverClass {
    /// Aerial observer with a wide, gently degrading view.
    Drone,
    /// Ground rescuer with a short view.
    Rescuer,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn hazard_levels_round_trip_through_numbers() {
        for level in 0..=3 {
            assert_eq!(HazardLevel::from_level(level).unwrap().level(), level);
        }
        assert_eq!(HazardLevel::from_level(4), None);
    }

    #[test]
    fn hazard_intensify_and_decay_saturate() {
        assert_eq!(HazardLevel::High.intensified(), HazardLevel::High);
        assert_eq!(HazardLevel::Low.intensified(), HazardLevel::Medium);
        assert_eq!(HazardLevel::Clear.decayed(), HazardLevel::Clear);
        assert_eq!(HazardLevel::High.decayed(), HazardLevel::Medium);
    }

    #[test]
    fn hazard_ordering_matches_severity() {
        assert!(HazardLevel::Clear < HazardLevel::Low);
        assert!(HazardLevel::Medium < HazardLevel::High);
        assert!(!HazardLevel::Clear.is_hazardous());
        assert!(HazardLevel::HAZARDOUS.iter().all(|h| h.is_hazardous()));
    }

    #[test]
    fn rescued_by_serializes_self() {
        let json = serde_json::to_string(&RescuedBy::SelfRescue).unwrap();
        assert_eq!(json, "\"self\"");
        let json = serde_json::to_string(&HazardLevel::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
    }

    #[test]
    fn engaged_activities() {
        assert!(AgentActivity::Guiding.is_engaged());
        assert!(AgentActivity::ExecutingTask.is_engaged());
        assert!(!AgentActivity::Searching.is_engaged());
        assert!(!AgentActivity::AwaitingOrders.is_engaged());
    }
}
