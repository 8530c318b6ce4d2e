// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`backend`] provides the `ProgramRunner` trait and the production
//!   `ProcessRunner`; tests replace it with a fake runner.
//! - [`command`] wraps a runner call with per-task logging and the
//!   hard/soft failure modes used by the pipeline stages.
//! - [`pool`] fans one task's workload out over a bounded set of threads.

pub mod backend;
pub mod command;
pub mod pool;

pub use backend::{ProcessRunner, ProgramRunner};
pub use command::{ExecMode, checked_exec, checked_exec_env};
pub use pool::{PoolReport, WorkerPool};
