//! Runs registered scenarios, one fresh simulation each, and reports how
//! they went.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::mpsc::{self, Receiver};
use ttvga_local_sim::{Backend, LocalSimulator, Options, VgaTile};
use ttvga_sim::{
    response::{self, Notifications},
    vcd, Response, Simulator, TimeUnit,
};

use crate::{
    config::TbConfig,
    error::TtvgaTbResult,
    scenarios::Scenario,
    testbench::Dut,
};

pub type BackendFactory =
    Box<dyn Fn(&Scenario) -> TtvgaTbResult<Box<dyn Backend>> + Send + Sync>;

pub struct TestRunner {
    config: TbConfig,
    backend_factory: BackendFactory,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed(String),
}

#[derive(Clone, Debug)]
pub struct TestReport {
    pub name: String,
    pub outcome: Outcome,
    pub sim_time_ps: u64,
    pub real_time: Duration,
    pub waveform: Option<PathBuf>,
}

impl TestRunner {
    /// Simulates `config.dut_library` when set, the behavioural model of the
    /// scenario's design revision otherwise.
    pub fn new(config: TbConfig) -> Self {
        let dut_library = config.dut_library.clone();
        let backend_factory: BackendFactory = Box::new(move |scenario: &Scenario| {
            let backend: Box<dyn Backend> = match &dut_library {
                Some(path) => Box::new(ttvga_rs::Dut::new(&path.to_string_lossy())?),
                None => Box::new(VgaTile::new(scenario.polarity)),
            };
            Ok(backend)
        });
        Self::with_backend_factory(config, backend_factory)
    }

    pub fn with_backend_factory(config: TbConfig, backend_factory: BackendFactory) -> Self {
        Self {
            config,
            backend_factory,
        }
    }

    pub fn selected<'a>(&self, scenarios: &'a [Scenario]) -> Vec<&'a Scenario> {
        scenarios
            .iter()
            .filter(|s| {
                self.config.testcases.is_empty()
                    || self.config.testcases.iter().any(|filter| s.matches(filter))
            })
            .collect()
    }

    pub async fn run(&self, scenarios: &[Scenario]) -> Vec<TestReport> {
        let selected = self.selected(scenarios);
        if selected.is_empty() {
            tracing::warn!(filters = ?self.config.testcases, "no scenario selected");
        }
        let mut reports = vec![];
        for scenario in selected {
            let report = match self.run_scenario(scenario).await {
                Ok(report) => report,
                Err(e) => TestReport {
                    name: scenario.name.to_string(),
                    outcome: Outcome::Failed(e.to_string()),
                    sim_time_ps: 0,
                    real_time: Duration::ZERO,
                    waveform: None,
                },
            };
            match &report.outcome {
                Outcome::Passed => tracing::info!(scenario = scenario.name, "passed"),
                Outcome::Failed(reason) => {
                    tracing::error!(scenario = scenario.name, "failed: {reason}")
                }
            }
            reports.push(report);
        }
        reports
    }

    async fn run_scenario(&self, scenario: &Scenario) -> TtvgaTbResult<TestReport> {
        let backend = (self.backend_factory)(scenario)?;
        let options = Options {
            record_waves: self.config.record_waves,
        };
        let simulator = Arc::new(LocalSimulator::new(backend, options)?);
        let (tx, rx) = mpsc::channel(100);
        simulator.set_channel(tx).await;
        let notification_logger = tokio::spawn(log_notifications(scenario.name, rx));

        tracing::info!(scenario = scenario.name, "running");
        let dut = Dut::new(simulator.clone());
        let started = Instant::now();
        let outcome = match (scenario.test)(dut.clone()).await {
            Ok(()) => Outcome::Passed,
            Err(e) => Outcome::Failed(e.to_string()),
        };
        let real_time = started.elapsed();

        let sim_time_ps = dut.terminate().await?;
        let waveform = match self.config.waveform_path(scenario.name) {
            Some(path) => {
                let result = dut.simulation_result().await?;
                write_waveform(&path, &self.config.toplevel, &result)?;
                tracing::info!(path = %path.display(), "waveform written");
                Some(path)
            }
            None => None,
        };

        drop(dut);
        drop(simulator);
        _ = notification_logger.await;

        Ok(TestReport {
            name: scenario.name.to_string(),
            outcome,
            sim_time_ps,
            real_time,
            waveform,
        })
    }
}

async fn log_notifications(scenario: &'static str, mut rx: Receiver<Response>) {
    while let Some(response) = rx.recv().await {
        if let response::Payload::Notification(Notifications::Progress(percentage, message)) =
            response.payload
        {
            let percent = (percentage.value() * 100.0).round() as u32;
            tracing::info!(scenario, percent, "{message}");
        }
    }
}

fn write_waveform(
    path: &Path,
    toplevel: &str,
    result: &response::SimulationResult,
) -> TtvgaTbResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    vcd::write(result, toplevel, &mut writer)?;
    writer.flush()?;
    Ok(())
}

pub fn all_passed(reports: &[TestReport]) -> bool {
    reports.iter().all(|r| r.outcome == Outcome::Passed)
}

pub fn summary(reports: &[TestReport]) -> String {
    let width = reports
        .iter()
        .map(|r| r.name.len())
        .max()
        .unwrap_or(0)
        .max("TEST".len());
    let mut lines = vec![format!(
        "{:<width$}  STATUS  {:>14}  {:>13}",
        "TEST", "SIM TIME (ns)", "REAL TIME (s)"
    )];
    for report in reports {
        let status = match report.outcome {
            Outcome::Passed => "PASS",
            Outcome::Failed(_) => "FAIL",
        };
        lines.push(format!(
            "{:<width$}  {:<6}  {:>14}  {:>13.2}",
            report.name,
            status,
            TimeUnit::Ns.from_ps(report.sim_time_ps),
            report.real_time.as_secs_f64()
        ));
    }
    let passed = reports
        .iter()
        .filter(|r| r.outcome == Outcome::Passed)
        .count();
    lines.push(format!(
        "TESTS={} PASS={} FAIL={}",
        reports.len(),
        passed,
        reports.len() - passed
    ));
    lines.join("\n")
}
