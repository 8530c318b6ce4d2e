// src/main.rs

use osa_controller::{cli, logging, run};

/// Exit code for failures that prevent the pipeline from starting.
const EXIT_SETUP_FAILURE: i32 = 4;

fn main() {
    match run_main() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("osa-controller error: {err:?}");
            std::process::exit(EXIT_SETUP_FAILURE);
        }
    }
}

fn run_main() -> anyhow::Result<i32> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    let report = run(args)?;
    Ok(report.exit_code())
}
