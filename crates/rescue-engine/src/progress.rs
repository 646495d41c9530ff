//! Tick callback that logs run progress.
//!
//! Every `interval` ticks a progress line with the running tally is logged
//! at `info`. When `trace` is enabled for this module, the world snapshot
//! from [`SimulationState::snapshot`] is emitted as JSON after every tick
//! for offline rendering.

use rescue_core::runner::TickCallback;
use rescue_core::tick::{SimulationState, TickSummary};
use tracing::{Level, debug, enabled, info, trace, warn};

/// Logs a progress line every `interval` ticks (0 = never).
pub struct ProgressLogger {
    interval: u64,
}

impl ProgressLogger {
    /// Create a logger reporting every `interval` ticks.
    pub const fn new(interval: u64) -> Self {
        Self { interval }
    }

    const fn is_due(&self, tick: u64) -> bool {
        matches!(tick.checked_rem(self.interval), Some(0))
    }
}

impl TickCallback for ProgressLogger {
    fn on_tick(&mut self, summary: &TickSummary, state: &SimulationState) {
        if !summary.rescued_by_agents.is_empty() || !summary.self_rescued.is_empty() {
            debug!(
                tick = summary.tick,
                by_agents = summary.rescued_by_agents.len(),
                self_rescued = summary.self_rescued.len(),
                "Rescues this tick"
            );
        }

        if self.is_due(summary.tick) {
            let tally = &summary.tally;
            info!(
                tick = summary.tick,
                self_rescued = tally.self_rescued,
                rescued_by_agents = tally.rescued_by_agents,
                victims_died = tally.victims_died,
                victims_remaining = tally.victims_remaining,
                agents_survived = tally.agents_survived,
                "Progress"
            );
        }

        if enabled!(Level::TRACE) {
            match serde_json::to_string(&state.snapshot()) {
                Ok(json) => trace!(tick = summary.tick, snapshot = %json, "World snapshot"),
                Err(e) => warn!(tick = summary.tick, error = %e, "Failed to serialize snapshot"),
            }
        }
    }
}
