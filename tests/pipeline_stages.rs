// tests/pipeline_stages.rs

mod common;
use crate::common::{
    FakeRunner, PropertiesBuilder, TEST_DATE, TestProject, building_runner, init_tracing,
    install_wrapper, touch,
};

use std::fs;
use std::path::{Path, PathBuf};

use osa_controller::engine::{Controller, RunReport, TaskStatus};
use osa_controller::fs::load_string_list;
use osa_controller::task::Outcome;
use osa_controller::tasks::{self, names};

fn run_stages(project: &TestProject, runner: &FakeRunner, stages: &[&str]) -> RunReport {
    let registry = tasks::registry().unwrap();
    let mut controller = Controller::new(&project.props, &registry, runner);
    for stage in stages {
        controller.add_registered(stage).unwrap();
    }
    controller.execute_tasks().unwrap()
}

fn outcome_of(report: &RunReport, task: &str) -> Outcome {
    match &report.record(task).expect("task recorded").status {
        TaskStatus::Executed { outcome, .. } => *outcome,
        TaskStatus::Skipped { .. } => panic!("{task} was skipped"),
    }
}

fn message_of(report: &RunReport, task: &str) -> String {
    match &report.record(task).expect("task recorded").status {
        TaskStatus::Executed { message, .. } => message.clone().unwrap_or_default(),
        TaskStatus::Skipped { .. } => panic!("{task} was skipped"),
    }
}

fn clang_project() -> TestProject {
    PropertiesBuilder::new()
        .section("[wrapper]\nmode = \"clang\"")
        .build()
}

#[test]
fn wrapper_prepares_environment_and_runs_the_build() {
    init_tracing();
    let project = clang_project();
    install_wrapper(&project);
    let runner = building_runner(&project);

    let report = run_stages(&project, &runner, &[names::WRAPPER]);
    assert_eq!(outcome_of(&report, names::WRAPPER), Outcome::Success);

    let calls = runner.calls();
    let tools: Vec<String> = calls.iter().map(|c| c.tool()).collect();
    assert_eq!(tools, vec!["WrapperEnvironmentConfig", "AnalyzerWrapperConfig", "build"]);

    let bin = project.props.wrapper_tmp_dir.join("bin");
    let env_config = &calls[0];
    let wraptools = env_config
        .args
        .windows(3)
        .any(|w| w == ["-wraptools", "clang++", "ClangWrapper"]);
    assert!(wraptools);
    assert!(env_config.args.contains(&"-setWrapperRunFirst".to_string()));
    assert_eq!(
        env_config.env_var("WRAPPER_LOG_DIR"),
        Some(project.props.wrapper_tmp_dir.join("log").to_str().unwrap())
    );

    let analyzer_config = &calls[1];
    assert!(analyzer_config.args.ends_with(&["-outputDir".to_string(), ".osa".to_string()]));
    assert!(analyzer_config.env_var("ANALYZER_WRAPPER_CONFIG_FILE").is_some());

    let build = &calls[2];
    let path = build.env_var("PATH").unwrap();
    assert!(path.starts_with(bin.to_str().unwrap()));

    assert!(bin.join("clang").exists());
    assert!(bin.join("ClangWrapper").exists());
    assert!(bin.join("CAN").exists());
    assert!(bin.join("cppcheck").join("cfg").join("std.cfg").exists());
    let rm = fs::read_to_string(bin.join("rm")).unwrap();
    assert!(rm.contains("/bin/rm -rf"));
}

#[test]
fn build_without_output_is_critical_and_blocks_dependents() {
    init_tracing();
    let project = clang_project();
    install_wrapper(&project);
    project.prepare_dirs();
    let runner = FakeRunner::succeeding();

    let report = run_stages(&project, &runner, &[names::WRAPPER, names::CAN2LIM]);

    assert_eq!(outcome_of(&report, names::WRAPPER), Outcome::CriticalError);
    assert_eq!(report.skipped().collect::<Vec<_>>(), vec![names::CAN2LIM]);
    assert!(runner.calls_to("CAN2Lim").is_empty());
    assert_eq!(report.exit_code(), 3);
}

#[test]
fn wrapper_error_log_is_an_error() {
    let project = clang_project();
    install_wrapper(&project);
    let log_dir = project.props.wrapper_log_dir();
    let build_script = project.props.build_script.clone();
    let runner = FakeRunner::with_script(move |program, _| {
        if program == build_script {
            fs::write(log_dir.join("aast.list"), "lib.aast\n").unwrap();
            fs::write(log_dir.join("Error.log"), "compile error\n").unwrap();
        }
        0
    });

    let report = run_stages(&project, &runner, &[names::WRAPPER]);
    assert_eq!(outcome_of(&report, names::WRAPPER), Outcome::Error);
    assert!(message_of(&report, names::WRAPPER).contains("Error.log"));
}

#[test]
fn failing_environment_config_is_critical() {
    let project = clang_project();
    install_wrapper(&project);
    let runner = FakeRunner::failing_tools(&["WrapperEnvironmentConfig"]);

    let report = run_stages(&project, &runner, &[names::WRAPPER]);

    assert_eq!(outcome_of(&report, names::WRAPPER), Outcome::CriticalError);
    assert!(message_of(&report, names::WRAPPER).contains("exited with code 1"));
    // The build never ran.
    assert_eq!(runner.calls().len(), 1);
}

#[test]
fn clang_tidy_runs_once_per_unique_unit_then_converts() {
    init_tracing();
    let project = PropertiesBuilder::new().max_threads(3).build();
    project.prepare_dirs();
    let src = project.path().join("src");
    let a = src.join("a.cpp.ast").display().to_string();
    let b = src.join("b.cpp.ast").display().to_string();
    project.write_wrapper_list("ast.list", &[&b, &a, &b]);
    touch(Path::new(&format!("{a}.ct.err")));
    let runner = FakeRunner::succeeding();

    let report = run_stages(&project, &runner, &[names::CLANG_TIDY]);

    assert_eq!(outcome_of(&report, names::CLANG_TIDY), Outcome::Success);
    assert!(!Path::new(&format!("{a}.ct.err")).exists());

    let mut runs: Vec<Vec<String>> = runner
        .calls_to("clang-tidy")
        .into_iter()
        .map(|c| c.args)
        .collect();
    runs.sort();
    let config = project.props.temp_dir.join("ClangTidy.conf");
    assert_eq!(runs.len(), 2);
    assert_eq!(
        runs[0],
        vec![
            a.clone(),
            format!("-config-file={}", config.display()),
            format!("-xml={a}.ct.err"),
            "--".to_string(),
        ]
    );
    assert_eq!(runs[1][0], b);

    let convert = runner.calls_to("ClangTidy2Graph");
    assert_eq!(convert.len(), 1);
    assert!(convert[0].args.contains(&"-exportrul".to_string()));

    // Successful workers leave no logs behind.
    for index in 0..3 {
        let log = project
            .props
            .log_dir
            .join(format!("{}-T{index}.log", names::CLANG_TIDY));
        assert!(!log.exists());
    }
}

#[test]
fn clang_tidy_failures_are_errors_naming_the_worker_logs() {
    let project = PropertiesBuilder::new().max_threads(1).build();
    project.prepare_dirs();
    project.write_wrapper_list("ast.list", &["x.ast", "y.ast"]);
    let runner = FakeRunner::failing_tools(&["clang-tidy"]);

    let report = run_stages(&project, &runner, &[names::CLANG_TIDY]);

    assert_eq!(outcome_of(&report, names::CLANG_TIDY), Outcome::Error);
    let message = message_of(&report, names::CLANG_TIDY);
    assert!(message.contains("Execution failure! Check logs:"));
    assert!(message.contains("ClangTidyTask-T0.log"));
    assert_eq!(runner.calls_to("ClangTidy2Graph").len(), 1);
}

#[test]
fn link_static_libs_unpacks_archives_into_components() {
    init_tracing();
    let project = PropertiesBuilder::new().build();
    project.prepare_dirs();
    let libs = project.path().join("libs");
    fs::create_dir_all(&libs).unwrap();
    let archive = libs.join("util.aast").display().to_string();
    project.write_wrapper_list("aast.list", &[&archive, &archive, "x.a"]);
    project.write_wrapper_list("component.list", &["main.component"]);

    // The fake unzip drops one member into the target directory.
    let runner = FakeRunner::with_script(|_, args| {
        touch(&PathBuf::from(&args[4]).join("util.o.ast"));
        0
    });

    let report = run_stages(&project, &runner, &[names::LINK_STATIC_LIBS]);
    assert_eq!(outcome_of(&report, names::LINK_STATIC_LIBS), Outcome::Success);

    // Short entries are ignored, duplicates extracted once.
    assert_eq!(runner.calls().len(), 1);

    let component = libs.join("util.component");
    let members = load_string_list(&component).unwrap().unwrap();
    assert_eq!(members.len(), 1);
    assert!(members[0].ends_with("util.o.ast"));

    let list = load_string_list(&project.props.wrapper_log_dir().join("component.list"))
        .unwrap()
        .unwrap();
    assert_eq!(list, vec!["main.component".to_string(), component.display().to_string()]);

    // The controller dropped its arena at the end of the run.
    assert!(!libs.join("util.aast.content").exists());
}

#[test]
fn static_lib_handler_inlines_archive_members() {
    let project = PropertiesBuilder::new().run_option("expand_static_libs", "true").build();
    project.prepare_dirs();
    let dir = project.path().join("out");
    fs::create_dir_all(&dir).unwrap();
    let archive = dir.join("util.aast").display().to_string();
    let main = dir.join("main.component");
    fs::write(&main, format!("main.ast\n{archive}\n")).unwrap();
    project.write_wrapper_list("aast.list", &[&archive]);
    project.write_wrapper_list("component.list", &[&main.display().to_string()]);

    let runner = FakeRunner::with_script(|_, args| {
        touch(&PathBuf::from(&args[4]).join("util.o.ast"));
        0
    });

    let report = run_stages(&project, &runner, &[names::STATIC_LIB_HANDLER]);
    assert_eq!(outcome_of(&report, names::STATIC_LIB_HANDLER), Outcome::Success);

    let expanded = load_string_list(&main).unwrap().unwrap();
    assert_eq!(expanded.len(), 2);
    assert_eq!(expanded[0], "main.ast");
    assert!(expanded[1].ends_with("util.o.ast"));

    // The handler does not register the archive as a component of its own.
    let list = load_string_list(&project.props.wrapper_log_dir().join("component.list"))
        .unwrap()
        .unwrap();
    assert_eq!(list.len(), 1);
}

#[test]
fn profile_writes_rule_files_and_clang_tidy_config() {
    let project = PropertiesBuilder::new()
        .section("[clang_tidy]\ndisabled_checks = [\"a\", \"b\"]")
        .build();
    project.prepare_dirs();
    touch(&project.props.tools_dir.join("Cppcheck.rul.md"));
    touch(&project.props.tools_dir.join("MetricHunter.threshold"));

    let report = run_stages(&project, &FakeRunner::succeeding(), &[names::PROFILE]);
    assert_eq!(outcome_of(&report, names::PROFILE), Outcome::Success);

    let temp = &project.props.temp_dir;
    assert!(temp.join("Cppcheck.rul.md").exists());
    assert!(temp.join("MetricHunter.threshold").exists());
    assert!(!temp.join("ClangTidy.rul.md").exists());
    let conf = fs::read_to_string(temp.join("ClangTidy.conf")).unwrap();
    assert_eq!(
        conf,
        "Checks: '*,-a,-b'\nWarningsAsErrors: ''\nHeaderFilterRegex: ''\nAnalyzeTemporaryDtors: false\n"
    );
}

#[test]
fn requested_metrics_without_rules_are_critical() {
    let project = PropertiesBuilder::new().run_option("udm", "true").build();
    project.prepare_dirs();

    let report = run_stages(&project, &FakeRunner::succeeding(), &[names::PROFILE]);

    assert_eq!(outcome_of(&report, names::PROFILE), Outcome::CriticalError);
    assert!(message_of(&report, names::PROFILE).contains("UDM.rul.md"));
}

#[test]
fn user_defined_metrics_follow_the_profile_decision() {
    let project = PropertiesBuilder::new().build();
    project.prepare_dirs();
    let runner = FakeRunner::succeeding();

    let report = run_stages(&project, &runner, &[names::PROFILE, names::USER_DEFINED_METRICS]);
    assert_eq!(outcome_of(&report, names::USER_DEFINED_METRICS), Outcome::Success);
    assert!(runner.calls_to("UserDefinedMetrics").is_empty());
    assert_eq!(report.inactive, vec!["UserDefinedMetrics".to_string()]);

    touch(&project.props.tools_dir.join("UDM.rul.md"));
    let runner = FakeRunner::succeeding();
    let report = run_stages(&project, &runner, &[names::PROFILE, names::USER_DEFINED_METRICS]);
    assert!(report.inactive.is_empty());
    let calls = runner.calls_to("UserDefinedMetrics");
    assert_eq!(calls.len(), 1);
    assert!(calls[0].args.contains(&"-rulconfig:cpp".to_string()));
}

#[test]
fn soft_analyzer_failure_is_an_error_and_hard_failure_is_critical() {
    let project = PropertiesBuilder::new().build();
    project.prepare_dirs();
    let runner = FakeRunner::failing_tools(&["LIM2Metrics", "CAN2Lim"]);

    let report = run_stages(&project, &runner, &[names::LIM2METRICS]);
    assert_eq!(outcome_of(&report, names::LIM2METRICS), Outcome::Error);
    let log = fs::read_to_string(project.props.task_log_path(names::LIM2METRICS)).unwrap();
    assert!(log.contains("exited with 1"));

    let report = run_stages(&project, &runner, &[names::CAN2LIM]);
    assert_eq!(outcome_of(&report, names::CAN2LIM), Outcome::CriticalError);
    assert!(message_of(&report, names::CAN2LIM).contains("exited with code 1"));
}

#[test]
fn graph_merge_takes_sorted_graph_files() {
    let project = PropertiesBuilder::new().build();
    project.prepare_dirs();
    let graph_dir = &project.props.graph_dir;
    touch(&graph_dir.join("demo-metrics.graph"));
    touch(&graph_dir.join("demo-DCF.graph"));
    touch(&graph_dir.join("notes.txt"));
    let runner = FakeRunner::succeeding();

    let report = run_stages(&project, &runner, &[names::GRAPH_MERGE]);
    assert_eq!(outcome_of(&report, names::GRAPH_MERGE), Outcome::Success);

    let call = &runner.calls_to("GraphMerge")[0];
    assert_eq!(
        call.args,
        vec![
            graph_dir.join("demo-DCF.graph").display().to_string(),
            graph_dir.join("demo-metrics.graph").display().to_string(),
            format!("-out:{}", project.props.timed_result_file(".graph").display()),
            "-summary".to_string(),
        ]
    );
}

#[test]
fn graph_dump_exports_graph_and_summary() {
    let project = PropertiesBuilder::new()
        .section("[output]\ncsv_separator = \";\"\nsarif_severity = \"3\"")
        .build();
    project.prepare_dirs();
    let runner = FakeRunner::succeeding();

    run_stages(&project, &runner, &[names::GRAPH_DUMP]);

    let calls = runner.calls_to("GraphDump");
    assert_eq!(calls.len(), 2);
    assert!(calls[0].args.contains(&"-csvseparator:;".to_string()));
    assert!(calls[0].args.contains(&"-sarifseverity:3".to_string()));
    assert_eq!(calls[1].args[1..], ["-xml".to_string(), "-json".to_string()]);
}

#[test]
fn clean_results_keeps_the_newest_directories() {
    let project = PropertiesBuilder::new().run_option("clean_results", "1").build();
    let results = &project.props.project_result_dir;
    for dir in ["2020-01-01-00-00-00", "2021-01-01-00-00-00", "2022-01-01-00-00-00", "notes"] {
        fs::create_dir_all(results.join(dir)).unwrap();
    }
    project.prepare_dirs();

    let report = run_stages(&project, &FakeRunner::succeeding(), &[names::CLEAN_RESULTS]);
    assert_eq!(outcome_of(&report, names::CLEAN_RESULTS), Outcome::Success);

    assert!(!results.join("2020-01-01-00-00-00").exists());
    assert!(!results.join("2021-01-01-00-00-00").exists());
    assert!(results.join("2022-01-01-00-00-00").exists());
    assert!(results.join("notes").exists());
    assert!(results.join(TEST_DATE).exists());
}

#[test]
fn clean_results_zero_also_removes_genealogy_and_graph() {
    let project = PropertiesBuilder::new().run_option("clean_results", "0").build();
    let results = &project.props.project_result_dir;
    fs::create_dir_all(results.join("2020-01-01-00-00-00")).unwrap();
    touch(&results.join("demo.gsi"));
    touch(&results.join("demo.graph"));
    project.prepare_dirs();

    let report = run_stages(&project, &FakeRunner::succeeding(), &[names::CLEAN_RESULTS]);
    assert_eq!(outcome_of(&report, names::CLEAN_RESULTS), Outcome::Success);

    assert!(!results.join("2020-01-01-00-00-00").exists());
    assert!(!results.join("demo.gsi").exists());
    assert!(!results.join("demo.graph").exists());
    assert!(results.join(TEST_DATE).exists());
}

#[test]
fn clean_results_zero_warns_when_graph_files_are_missing() {
    let project = PropertiesBuilder::new().run_option("clean_results", "0").build();
    let results = &project.props.project_result_dir;
    touch(&results.join("demo.graph"));
    project.prepare_dirs();

    let report = run_stages(&project, &FakeRunner::succeeding(), &[names::CLEAN_RESULTS]);
    assert_eq!(outcome_of(&report, names::CLEAN_RESULTS), Outcome::Warning);
    assert!(!results.join("demo.graph").exists());
}

#[test]
fn clean_project_removes_every_analysis_output_dir() {
    let project = PropertiesBuilder::new().run_option("clean_project", "true").build();
    let base = project.path().join("project");
    touch(&base.join("a").join(".osa").join("x.ast"));
    touch(&base.join("b").join("c").join(".osa").join("y.ast"));
    touch(&base.join("b").join("keep.cpp"));

    let report = run_stages(&project, &FakeRunner::succeeding(), &[names::CLEAN_PROJECT]);
    assert_eq!(outcome_of(&report, names::CLEAN_PROJECT), Outcome::Success);

    assert!(!base.join("a").join(".osa").exists());
    assert!(!base.join("b").join("c").join(".osa").exists());
    assert!(base.join("b").join("keep.cpp").exists());
}

#[test]
fn cleanup_removes_the_wrapper_bin_dir() {
    let project = PropertiesBuilder::new().build();
    let bin = project.props.wrapper_tmp_dir.join("bin");
    touch(&bin.join("clang"));

    let report = run_stages(&project, &FakeRunner::succeeding(), &[names::CLEANUP]);

    assert_eq!(outcome_of(&report, names::CLEANUP), Outcome::Success);
    assert!(!bin.exists());
}
