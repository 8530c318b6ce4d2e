#![allow(dead_code)]

pub use osa_controller_test_utils::builders::{PropertiesBuilder, TEST_DATE, TestProject, touch};
pub use osa_controller_test_utils::fake_runner::FakeRunner;
pub use osa_controller_test_utils::init_tracing;
pub use osa_controller_test_utils::recording_task::{ExecLog, RecordingTask, exec_log, registry_of};

use std::fs;

use osa_controller::config::Properties;
use osa_controller::config::properties::binary_path;
use osa_controller::engine::{Controller, RunReport};
use osa_controller::errors::Result;
use osa_controller::task::{Task, TaskRegistry};

/// Run `tasks` through a controller built on `props`.
pub fn run_tasks(
    props: &Properties,
    registry: &TaskRegistry,
    tasks: Vec<Box<dyn Task>>,
) -> Result<RunReport> {
    let runner = FakeRunner::succeeding();
    let mut controller = Controller::new(props, registry, &runner);
    for task in tasks {
        controller.add_task(task);
    }
    controller.execute_tasks()
}

/// Snapshot of the execution log.
pub fn executed(log: &ExecLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Put every binary the wrapper stage copies into the fake toolchain.
pub fn install_wrapper(project: &TestProject) {
    let props = &project.props;
    for tool in ["CAN", "CANConfig", "CANLink", "CANLib", "AnalyzerWrapperConfig"] {
        touch(&binary_path(&props.wrapper_tools_dir, tool));
    }
    touch(&binary_path(&props.wrapper_bin_dir, "exewrapper"));
    for wrapper in ["ClangWrapper", "ArWrapper", "LdWrapper", "LnWrapper", "CopyMoveWrapper"] {
        touch(&props.wrapper_bin_dir.join(wrapper));
    }
    touch(&props.wrapper_tools_dir.join("cppcheck").join("cfg").join("std.cfg"));
}

/// A runner whose build script records one component, as a real build would.
pub fn building_runner(project: &TestProject) -> FakeRunner {
    let build_script = project.props.build_script.clone();
    let component_list = project.props.wrapper_log_dir().join("component.list");
    FakeRunner::with_script(move |program, _| {
        if program == build_script {
            fs::write(&component_list, "main.component\n").unwrap();
        }
        0
    })
}
