//! Type-safe identifiers for actors and tasks.
//!
//! Actors are addressed by their position in the scenario roster, so their
//! IDs wrap a plain index. Tasks are ephemeral and logged externally; they
//! carry a UUID v7 so log entries sort by issue time.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around a roster index with standard derives.
macro_rules! define_index_id {
    (
        $(#[$meta:meta])*
        $name:ident, $prefix:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub u32);

        impl $name {
            /// Return the roster index as `usize`, `None` if it does not fit.
            pub fn index(self) -> Option<usize> {
                usize::try_from(self.0).ok()
            }

            /// Build an identifier from a roster index, `None` past `u32::MAX`.
            pub fn from_index(index: usize) -> Option<Self> {
                u32::try_from(index).ok().map(Self)
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }

        impl From<u32> for $name {
            fn from(id: u32) -> Self {
                Self(id)
            }
        }
    };
}

define_index_id! {
    /// Identifier for a rescuer agent.
    AgentId, "agent"
}

define_index_id! {
    /// Identifier for a victim.
    VictimId, "victim"
}

define_index_id! {
    /// Identifier for an aerial observer drone.
    DroneId, "drone"
}

/// Identifier for a commander-issued task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TaskId(pub Uuid);

impl TaskId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for TaskId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn index_ids_round_trip() {
        let id = VictimId::from_index(7).unwrap();
        assert_eq!(id, VictimId(7));
        assert_eq!(id.index(), Some(7));
    }

    #[test]
    fn index_ids_display_with_prefix() {
        assert_eq!(AgentId(2).to_string(), "agent-2");
        assert_eq!(VictimId(11).to_string(), "victim-11");
        assert_eq!(DroneId(0).to_string(), "drone-0");
    }

    #[test]
    fn task_ids_are_unique() {
        assert_ne!(TaskId::new(), TaskId::new());
    }

    #[test]
    fn index_id_serializes_as_number() {
        let json = serde_json::to_string(&AgentId(3)).unwrap();
        assert_eq!(json, "3");
    }
}
