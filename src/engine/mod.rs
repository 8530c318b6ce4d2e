// src/engine/mod.rs

//! Orchestration engine.
//!
//! - [`controller`] owns the tasks of one run, validates their dependency
//!   graph and executes them in order, honouring the failure policy.
//! - [`report`] aggregates per-task outcomes into the run status and the
//!   process exit code.

pub mod controller;
pub mod report;

pub use controller::Controller;
pub use report::{RunReport, TaskRecord, TaskStatus};
