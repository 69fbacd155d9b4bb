use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use ttvga_tb::{
    config::TbConfig,
    runner::{self, TestRunner},
    scenarios, TtvgaTbResult,
};

/// Runs the VGA tile testbench scenarios
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scenario to run, by full or test name (repeatable)
    #[arg(short, long)]
    testcase: Vec<String>,

    /// Directory receiving one VCD file per scenario
    #[arg(short, long)]
    waves: Option<PathBuf>,

    /// Do not record waveforms
    #[arg(long)]
    no_waves: bool,

    /// Compiled DUT library to simulate instead of the behavioural model
    #[arg(short, long)]
    lib: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn load_config(&self) -> TtvgaTbResult<TbConfig> {
        let mut config = match &self.config {
            Some(path) => TbConfig::from_file(path)?,
            None => TbConfig::default(),
        };
        if !self.testcase.is_empty() {
            config.testcases = self.testcase.clone();
        }
        if self.waves.is_some() {
            config.waves_dir = self.waves.clone();
        }
        if self.no_waves {
            config.record_waves = false;
        }
        if self.lib.is_some() {
            config.dut_library = self.lib.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let scenarios = scenarios::all();
    let runner = TestRunner::new(config);
    let reports = runner.run(&scenarios).await;
    println!("{}", runner::summary(&reports));

    if !reports.is_empty() && runner::all_passed(&reports) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
