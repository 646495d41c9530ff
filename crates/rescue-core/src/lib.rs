//! Perception, task allocation, and the tick cycle for the rescue simulation.
//!
//! This crate owns the six-phase tick cycle that drives a scenario:
//! Evolve, Scan, Fuse, Allocate, Move, and Self-rescue.
//!
//! # Modules
//!
//! - [`approval`] -- [`ApprovalGate`] between the commander and the agents,
//!   with [`AutoApprove`] and the risk-threshold gate.
//! - [`commander`] -- Greedy global task allocation over the belief map.
//! - [`config`] -- Configuration loading from `rescue-config.yaml` into
//!   strongly-typed structs.
//! - [`perception`] -- Observer scans, last-writer-wins fusion, confidence
//!   decay, and hazard prediction.
//! - [`runner`] -- The bounded simulation loop.
//! - [`scenario`] -- Grid generation and actor placement from config.
//! - [`task_log`] -- [`TaskLogSink`] implementations.
//! - [`tick`] -- The six-phase tick cycle.
//!
//! [`ApprovalGate`]: approval::ApprovalGate
//! [`AutoApprove`]: approval::AutoApprove
//! [`TaskLogSink`]: task_log::TaskLogSink

pub mod approval;
pub mod commander;
pub mod config;
pub mod perception;
pub mod runner;
pub mod scenario;
pub mod task_log;
pub mod tick;
