//! Error types for the rescue-agents crate.
//!
//! Degraded conditions (no route, blocked step, nothing visible) are not
//! errors; they resolve to fallback behavior. The variants here cover
//! violations of the guidance relation between agents and victims.

use rescue_types::{AgentId, VictimId};

/// Errors that can occur during agent and victim operations.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The victim is already escorted by a different agent.
    #[error("{victim} is already guided by {guide}")]
    VictimAlreadyGuided {
        /// The contested victim.
        victim: VictimId,
        /// The agent currently escorting it.
        guide: AgentId,
    },

    /// The victim is rescued or dead and cannot be attached.
    #[error("{0} is no longer awaiting rescue")]
    VictimUnavailable(VictimId),

    /// No victim with this identifier exists in the roster.
    #[error("unknown victim {0}")]
    UnknownVictim(VictimId),

    /// Two agents list the same victim as guided.
    #[error("{victim} is listed as guided by both {first} and {second}")]
    GuidanceConflict {
        /// The doubly-claimed victim.
        victim: VictimId,
        /// First agent listing it.
        first: AgentId,
        /// Second agent listing it.
        second: AgentId,
    },

    /// An agent's guided list and the victim's back-reference disagree.
    #[error("{victim} guided_by {guided_by:?} but listed by {listed_by:?}")]
    GuidanceMismatch {
        /// The victim in question.
        victim: VictimId,
        /// The agent whose list contains the victim, if any.
        listed_by: Option<AgentId>,
        /// The victim's own back-reference.
        guided_by: Option<AgentId>,
    },
}
