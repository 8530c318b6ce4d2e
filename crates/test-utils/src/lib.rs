//! Shared fixtures for the controller's integration tests.
//!
//! - [`builders`]: scratch projects with resolved [`Properties`] and fake
//!   toolchain installs.
//! - [`fake_runner`]: a `ProgramRunner` that records invocations.
//! - [`recording_task`]: tasks with scripted outcomes.
//!
//! [`Properties`]: osa_controller::config::Properties

pub mod builders;
pub mod fake_runner;
pub mod recording_task;

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Initialise tracing for tests, once per test binary.
///
/// Output goes through the test writer, so it only shows for failing tests
/// unless run with `--nocapture`. The filter comes from `OSA_LOG`
/// (e.g. `OSA_LOG=debug cargo test`), defaulting to `info`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("OSA_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}
