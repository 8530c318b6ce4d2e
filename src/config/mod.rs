// src/config/mod.rs

//! Configuration loading and validation for the controller.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants (`validate.rs`).
//! - Resolve the read-only run configuration handed to every task
//!   (`properties.rs`).

pub mod loader;
pub mod model;
pub mod properties;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_from_str};
pub use model::{
    ArchiveSection, ClangTidySection, CloneSection, ConfigFile, OutputSection, ProjectSection,
    RawConfigFile, RunSection, ToolchainSection, WrapperSection,
};
pub use properties::{Overrides, Properties};
