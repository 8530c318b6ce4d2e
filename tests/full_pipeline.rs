// tests/full_pipeline.rs

mod common;
use crate::common::{FakeRunner, PropertiesBuilder, building_runner, init_tracing, install_wrapper};

use osa_controller::engine::Controller;
use osa_controller::task::Outcome;
use osa_controller::tasks::{self, names};

#[test]
fn default_pipeline_is_a_valid_dag() {
    let project = PropertiesBuilder::new().build();
    let registry = tasks::registry().unwrap();
    let runner = FakeRunner::succeeding();
    let mut controller = Controller::new(&project.props, &registry, &runner);
    tasks::populate(&mut controller).unwrap();

    let declared: Vec<&str> = controller.task_names().collect();
    assert_eq!(declared.first(), Some(&names::CLEANUP));
    assert!(declared.contains(&names::LINK_STATIC_LIBS));
    assert!(!declared.contains(&names::STATIC_LIB_HANDLER));
    assert!(!declared.contains(&names::CLEAN_RESULTS));
    assert!(!declared.contains(&names::CLEAN_PROJECT));

    let graph = controller.plan().unwrap();
    assert_eq!(graph.len(), declared.len());
}

#[test]
fn whole_pipeline_runs_in_order_with_fake_tools() {
    init_tracing();
    let project = PropertiesBuilder::new()
        .section("[wrapper]\nmode = \"clang\"")
        .build();
    install_wrapper(&project);
    project.prepare_dirs();
    let runner = building_runner(&project);

    let registry = tasks::registry().unwrap();
    let mut controller = Controller::new(&project.props, &registry, &runner);
    tasks::populate(&mut controller).unwrap();
    let report = controller.execute_tasks().unwrap();

    assert_eq!(report.status(), Outcome::Success, "{report:#?}");
    assert_eq!(report.skipped().count(), 0);
    assert_eq!(report.inactive, vec!["UserDefinedMetrics".to_string()]);

    let order: Vec<&str> = report.executed().collect();
    let at = |task: &str| order.iter().position(|t| *t == task).unwrap();
    assert_eq!(order[0], names::WRAPPER);
    assert!(at(names::CAN2LIM) > at(names::LINK_STATIC_LIBS));
    assert!(at(names::PROFILE) > at(names::CAN2LIM));
    assert!(at(names::GRAPH_MERGE) > at(names::CLANG_TIDY));
    assert!(at(names::METRIC_HUNTER) > at(names::GRAPH_MERGE));
    assert!(at(names::GRAPH_DUMP) > at(names::LIM2PATTERNS));
    assert!(at(names::CLEANUP) > at(names::GRAPH_MERGE));

    let tools: Vec<String> = runner.calls().iter().map(|c| c.tool()).collect();
    for tool in ["CAN2Lim", "Cppcheck2Graph", "LIM2Metrics", "DuplicatedCodeFinder", "GraphMerge"] {
        assert!(tools.iter().any(|t| t == tool), "{tool} not run");
    }
    assert!(!project.props.wrapper_tmp_dir.join("bin").exists());
}

#[test]
fn disabled_analyzers_are_reported_inactive() {
    let project = PropertiesBuilder::new()
        .run_option("cppcheck", "false")
        .run_option("dcf", "false")
        .run_option("udm", "false")
        .run_option("expand_static_libs", "true")
        .run_option("clean_results", "2")
        .section("[wrapper]\nmode = \"clang\"")
        .build();
    install_wrapper(&project);
    project.prepare_dirs();
    let runner = building_runner(&project);

    let registry = tasks::registry().unwrap();
    let mut controller = Controller::new(&project.props, &registry, &runner);
    tasks::populate(&mut controller).unwrap();

    let declared: Vec<&str> = controller.task_names().collect();
    assert!(declared.contains(&names::STATIC_LIB_HANDLER));
    assert!(declared.contains(&names::CLEAN_RESULTS));
    assert!(!declared.contains(&names::LINK_STATIC_LIBS));
    assert!(!declared.contains(&names::DCF));
    assert!(!declared.contains(&names::USER_DEFINED_METRICS));

    let report = controller.execute_tasks().unwrap();
    assert_eq!(report.exit_code(), 0, "{report:#?}");
    assert_eq!(
        report.inactive,
        vec![
            "UserDefinedMetrics".to_string(),
            "Cppcheck2Graph".to_string(),
            "DuplicatedCodeFinder".to_string(),
        ]
    );
    assert!(runner.calls_to("DuplicatedCodeFinder").is_empty());
    // The results cleanup runs before the wrapper.
    let order: Vec<&str> = report.executed().collect();
    assert_eq!(order[0], names::CLEAN_RESULTS);
}
