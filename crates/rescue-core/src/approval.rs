//! Approval gate between the commander and the agents.
//!
//! Every task the commander selects passes through an [`ApprovalGate`]
//! before it is assigned. The gate returns a [`Verdict`]: the task
//! unchanged, the task with a lowered score, or a rejection. A rejected task
//! is discarded and its agent receives no assignment this cycle.
//!
//! [`RiskThresholdGate`] measures rescuer risk as `100 - remaining life` and
//! hands tasks above the threshold to a [`Reviewer`], which may be a fixed
//! policy ([`StaticReviewer`]), a closure, or an interactive front end.

use rescue_agents::Agent;
use tracing::{info, warn};

use crate::commander::Task;
use crate::config::{ApprovalConfig, ReviewPolicy};

/// Outcome of reviewing one task.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Assign the task as issued.
    Approved(Task),
    /// Assign the task with its score lowered.
    Penalized {
        /// The task with the penalty already applied.
        task: Task,
        /// Amount subtracted from the score.
        penalty: f64,
    },
    /// Discard the task.
    Rejected(Task),
}

impl Verdict {
    /// The task to assign, `None` if rejected.
    pub fn into_approved(self) -> Option<Task> {
        match self {
            Self::Approved(task) | Self::Penalized { task, .. } => Some(task),
            Self::Rejected(_) => None,
        }
    }

    /// Whether the task survives review.
    pub const fn is_approved(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }
}

/// Decides whether a task may be assigned.
pub trait ApprovalGate: Send {
    /// Review `task`, which would be assigned to `agent`.
    fn approve(&mut self, task: Task, agent: &Agent) -> Verdict;
}

/// Approves everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

impl ApprovalGate for AutoApprove {
    fn approve(&mut self, task: Task, _agent: &Agent) -> Verdict {
        Verdict::Approved(task)
    }
}

/// Decides what happens to a high-risk task.
pub trait Reviewer: Send {
    /// Choose a policy for `task` given the rescuer's `risk`.
    fn review(&mut self, task: &Task, risk: u32) -> ReviewPolicy;
}

impl<F> Reviewer for F
where
    F: FnMut(&Task, u32) -> ReviewPolicy + Send,
{
    fn review(&mut self, task: &Task, risk: u32) -> ReviewPolicy {
        self(task, risk)
    }
}

/// Always answers with the same policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaticReviewer(pub ReviewPolicy);

impl Reviewer for StaticReviewer {
    fn review(&mut self, _task: &Task, _risk: u32) -> ReviewPolicy {
        self.0
    }
}

/// Sends tasks whose rescuer risk exceeds `max_risk` to a reviewer.
pub struct RiskThresholdGate {
    max_risk: u32,
    penalty: f64,
    reviewer: Box<dyn Reviewer>,
}

impl std::fmt::Debug for RiskThresholdGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskThresholdGate")
            .field("max_risk", &self.max_risk)
            .field("penalty", &self.penalty)
            .finish_non_exhaustive()
    }
}

impl RiskThresholdGate {
    /// A gate with an explicit threshold, penalty, and reviewer.
    pub fn new(max_risk: u32, penalty: f64, reviewer: Box<dyn Reviewer>) -> Self {
        Self {
            max_risk,
            penalty,
            reviewer,
        }
    }

    /// Rescuer risk: life already lost.
    pub const fn risk(agent: &Agent) -> u32 {
        100_u32.saturating_sub(agent.remaining_life())
    }
}

impl ApprovalGate for RiskThresholdGate {
    fn approve(&mut self, mut task: Task, agent: &Agent) -> Verdict {
        let risk = Self::risk(agent);
        if risk <= self.max_risk {
            return Verdict::Approved(task);
        }
        warn!(
            task = %task.id,
            agent = %task.agent,
            risk,
            max_risk = self.max_risk,
            "Task flagged for review"
        );
        match self.reviewer.review(&task, risk) {
            ReviewPolicy::Approve => Verdict::Approved(task),
            ReviewPolicy::Penalize => {
                task.score -= self.penalty;
                info!(task = %task.id, penalty = self.penalty, score = task.score, "Task penalized");
                Verdict::Penalized {
                    task,
                    penalty: self.penalty,
                }
            }
            ReviewPolicy::Reject => {
                info!(task = %task.id, agent = %task.agent, "Task rejected");
                Verdict::Rejected(task)
            }
        }
    }
}

/// The gate described by `config`, with a [`StaticReviewer`] applying its
/// high-risk policy.
pub fn gate_from_config(config: &ApprovalConfig) -> Box<dyn ApprovalGate> {
    if config.enabled {
        Box::new(RiskThresholdGate::new(
            config.max_risk,
            config.penalty,
            Box::new(StaticReviewer(config.on_high_risk)),
        ))
    } else {
        Box::new(AutoApprove)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use rescue_agents::{AgentProfile, Vitals};
    use rescue_types::{AgentId, AgentMode, Cell, TaskId, VictimId};

    use super::*;

    fn make_agent(life: u32) -> Agent {
        let mut agent = Agent::new(AgentId(0), Cell::new(1, 1), AgentMode::Ordered, AgentProfile::default());
        agent.vitals = Vitals::new(life);
        agent
    }

    fn make_task() -> Task {
        Task {
            id: TaskId::new(),
            agent: AgentId(0),
            victim: VictimId(2),
            route: vec![Cell::new(1, 2)],
            score: 90.0,
            target: Cell::new(1, 2),
        }
    }

    #[test]
    fn auto_approve_passes_everything() {
        let task = make_task();
        let verdict = AutoApprove.approve(task.clone(), &make_agent(1));
        assert_eq!(verdict, Verdict::Approved(task));
    }

    #[test]
    fn healthy_rescuer_skips_review() {
        let mut gate = RiskThresholdGate::new(50, 20.0, Box::new(StaticReviewer(ReviewPolicy::Reject)));
        // Risk exactly at the threshold is not reviewed.
        let verdict = gate.approve(make_task(), &make_agent(50));
        assert!(matches!(verdict, Verdict::Approved(_)));
    }

    #[test]
    fn risky_task_is_penalized() {
        let mut gate = RiskThresholdGate::new(50, 20.0, Box::new(StaticReviewer(ReviewPolicy::Penalize)));
        let verdict = gate.approve(make_task(), &make_agent(40));
        assert!(matches!(&verdict, Verdict::Penalized { penalty, .. } if *penalty == 20.0));
        assert_eq!(verdict.into_approved().unwrap().score, 70.0);
    }

    #[test]
    fn rejection_discards_task() {
        let mut gate = RiskThresholdGate::new(50, 20.0, Box::new(StaticReviewer(ReviewPolicy::Reject)));
        let verdict = gate.approve(make_task(), &make_agent(10));
        assert!(!verdict.is_approved());
        assert!(verdict.into_approved().is_none());
    }

    #[test]
    fn closure_reviewer_sees_risk() {
        let reviewer = |_task: &Task, risk: u32| {
            if risk > 80 { ReviewPolicy::Reject } else { ReviewPolicy::Approve }
        };
        let mut gate = RiskThresholdGate::new(50, 20.0, Box::new(reviewer));
        assert!(gate.approve(make_task(), &make_agent(30)).is_approved());
        assert!(!gate.approve(make_task(), &make_agent(10)).is_approved());
    }

    #[test]
    fn disabled_config_auto_approves() {
        let config = ApprovalConfig {
            enabled: false,
            ..ApprovalConfig::default()
        };
        let mut gate = gate_from_config(&config);
        assert!(gate.approve(make_task(), &make_agent(0)).is_approved());
    }
}
