// src/dag/mod.rs

//! DAG representation and scheduling.
//!
//! - [`graph`] validates the declared dependencies of one run.
//! - [`scheduler`] contains the per-run state machine that decides which
//!   task runs next and which tasks are skipped after a failure.
//! - [`task_info`] provides task metadata and per-run states.
//! - [`scheduler_step`] defines the result type for scheduler steps.
//! - [`state_manager`] manages per-run state transitions.

pub mod graph;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;
pub mod task_info;

pub use graph::DagGraph;
pub use scheduler::{FailurePolicy, Scheduler};
pub use scheduler_step::SchedulerStep;
pub use task_info::TaskState;
