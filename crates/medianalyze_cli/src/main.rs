//! Verification harness for the MediAnalyze Pro persistence layer.
//!
//! Exit status is 0 when every phase passes and 1 otherwise.

mod cli;
mod harness;

use clap::Parser;
use cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        if let Err(err) = medianalyze_core::init_logging(cli.log_level(), log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    println!("MediAnalyze Pro persistence check");
    let config = match cli.database_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let outcomes = harness::run_all(&config);
    if harness::print_summary(&outcomes) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
