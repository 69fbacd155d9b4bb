//! End-to-end runs of the registered scenarios against the behavioural VGA
//! tile, including designs with broken pin directions.

use std::sync::Arc;

use bitvec::vec::BitVec;
use ttvga_local_sim::{
    Backend, LocalSimulator, Options, ResetPolarity, TtvgaLocalSimResult, UioOeFault, VgaTile,
};
use ttvga_sim::{bits, response::SimulationResult, Signal};
use ttvga_tb::{
    config::TbConfig,
    runner::{self, BackendFactory, Outcome, TestReport, TestRunner},
    scenarios::{self, Scenario, ScenarioFuture},
    testbench::{Clock, ClockCycles, Dut, TimeUnit},
};

const RESET_HIGH: &str = "reset_high.test_basic_waveform_dump";
const RESET_LOW: &str = "reset_low.test_basic_waveform_dump";

fn config(testcase: &str) -> TbConfig {
    TbConfig {
        testcases: vec![testcase.to_string()],
        record_waves: false,
        ..TbConfig::default()
    }
}

fn tile_factory(make: fn(ResetPolarity) -> VgaTile) -> BackendFactory {
    Box::new(move |scenario: &Scenario| {
        let backend: Box<dyn Backend> = Box::new(make(scenario.polarity));
        Ok(backend)
    })
}

async fn run_one(runner: &TestRunner) -> TestReport {
    let mut reports = runner.run(&scenarios::all()).await;
    assert_eq!(reports.len(), 1);
    reports.remove(0)
}

#[tokio::test]
async fn test_reset_high_passes() {
    let report = run_one(&TestRunner::new(config(RESET_HIGH))).await;
    assert_eq!(report.name, RESET_HIGH);
    assert_eq!(report.outcome, Outcome::Passed);
    // 400 ns of reset sequence, then 500,000 cycles of 40 ns.
    assert_eq!(report.sim_time_ps, 20_000_400_000);
    assert_eq!(report.waveform, None);
}

#[tokio::test]
async fn test_reset_low_passes() {
    let report = run_one(&TestRunner::new(config(RESET_LOW))).await;
    assert_eq!(report.outcome, Outcome::Passed);
    // 6 reset cycles, then 500,000 more.
    assert_eq!(report.sim_time_ps, 20_000_240_000);
}

#[tokio::test]
async fn test_wrong_pin_directions_fail_at_first_check() {
    let runner = TestRunner::with_backend_factory(
        config(RESET_LOW),
        tile_factory(|polarity| VgaTile::new(polarity).with_uio_oe(0xFF)),
    );
    let report = run_one(&runner).await;
    assert_eq!(
        report.outcome,
        Outcome::Failed(
            "assertion failed at 120 ns: uio_oe == 0b11111111, expected 0b00011011".to_string()
        )
    );
    assert_eq!(report.sim_time_ps, 120_000);
}

#[tokio::test]
async fn test_late_fault_fails_at_its_checkpoint() {
    let runner = TestRunner::with_backend_factory(
        config(RESET_LOW),
        tile_factory(|polarity| {
            VgaTile::new(polarity).with_fault(UioOeFault {
                after_cycles: 100,
                value: 0b0001_1111,
            })
        }),
    );
    let report = run_one(&runner).await;
    // Reset released at 240 ns, first checkpoint one line later.
    assert_eq!(report.sim_time_ps, 240_000 + 800 * 40_000);
    match report.outcome {
        Outcome::Failed(reason) => {
            assert!(reason.contains("32240 ns"), "{reason}");
            assert!(reason.contains("0b00011111"), "{reason}");
        }
        Outcome::Passed => panic!("fault went unnoticed"),
    }
}

#[tokio::test]
async fn test_every_checkpoint_is_checked() {
    // After release the checks land on 800, 8800, 420000 and 500000 cycles.
    let late = TestRunner::with_backend_factory(
        config(RESET_LOW),
        tile_factory(|polarity| {
            VgaTile::new(polarity).with_fault(UioOeFault {
                after_cycles: 8_801,
                value: 0,
            })
        }),
    );
    let report = run_one(&late).await;
    assert_eq!(report.sim_time_ps, 240_000 + 420_000 * 40_000);
    assert!(matches!(report.outcome, Outcome::Failed(ref r) if r.contains("16800240 ns")));

    let last = TestRunner::with_backend_factory(
        config(RESET_LOW),
        tile_factory(|polarity| {
            VgaTile::new(polarity).with_fault(UioOeFault {
                after_cycles: 420_001,
                value: 0,
            })
        }),
    );
    let report = run_one(&last).await;
    assert_eq!(report.sim_time_ps, 20_000_240_000);
    assert!(matches!(report.outcome, Outcome::Failed(ref r) if r.contains("20000240 ns")));
}

/// The tile with only the pins the scenarios drive or check, so a full run
/// can keep its waves without recording the raster counters.
struct ScenarioPins(VgaTile);

impl Backend for ScenarioPins {
    fn query(&self) -> TtvgaLocalSimResult<Vec<Signal>> {
        let reset_pin = self.0.polarity().pin_name();
        Ok(self
            .0
            .signals()
            .into_iter()
            .filter(|s| {
                s.name == reset_pin || ["clk", "ena", "Test_in", "uio_oe"].contains(&s.name.as_str())
            })
            .collect())
    }

    fn set(&mut self, signal_name: &str, value: &BitVec<u32>) -> TtvgaLocalSimResult<()> {
        self.0.set(signal_name, value)
    }

    fn get(&self, signal_name: &str) -> TtvgaLocalSimResult<BitVec<u32>> {
        self.0.get(signal_name)
    }

    fn run(&mut self, duration: u64) -> TtvgaLocalSimResult<u64> {
        self.0.run(duration)
    }
}

async fn recorded_run(name: &str) -> SimulationResult {
    let scenario = scenarios::all()
        .into_iter()
        .find(|s| s.name == name)
        .unwrap();
    let backend = ScenarioPins(VgaTile::new(scenario.polarity));
    let simulator = LocalSimulator::new(Box::new(backend), Options::default()).unwrap();
    let dut = Dut::new(Arc::new(simulator));
    (scenario.test)(dut.clone()).await.unwrap();
    dut.terminate().await.unwrap();
    dut.simulation_result().await.unwrap()
}

fn rising_clk_edges_after(result: &SimulationResult, time: u64) -> usize {
    let clk = result.wave("clk").unwrap();
    clk.rising_edges().into_iter().filter(|t| *t > time).count()
}

#[tokio::test]
async fn test_reset_high_pulse_timing() {
    let result = recorded_run(RESET_HIGH).await;
    assert_eq!(result.current_time, 20_000_400_000);

    let reset = result.wave("reset").unwrap();
    assert_eq!(reset.values[0].0, bits::from_u64(0, 1));
    assert_eq!(reset.rising_edges(), vec![150_000]);
    assert_eq!(reset.falling_edges(), vec![400_000]);
    assert_eq!(rising_clk_edges_after(&result, 400_000), 500_000);
}

#[tokio::test]
async fn test_reset_low_pulse_timing() {
    let result = recorded_run(RESET_LOW).await;
    assert_eq!(result.current_time, 20_000_240_000);

    let rst_n = result.wave("rst_n").unwrap();
    assert_eq!(rst_n.values[0].0, bits::from_u64(1, 1));
    assert_eq!(rst_n.falling_edges(), vec![120_000]);
    assert_eq!(rst_n.rising_edges(), vec![240_000]);
    assert_eq!(rising_clk_edges_after(&result, 240_000), 500_000);

    for name in ["ena", "Test_in"] {
        let wave = result.wave(name).unwrap();
        assert_eq!(wave.values.len(), 1, "{name} changed");
        assert_eq!(wave.values[0].0, bits::from_u64(1, 1));
        assert_eq!(wave.values[0].1, 0);
    }
    let uio_oe = result.wave("uio_oe").unwrap();
    assert_eq!(uio_oe.values.len(), 1);
    assert_eq!(uio_oe.values[0].0, bits::from_u64(0b0001_1011, 8));
}

#[tokio::test]
async fn test_missing_dut_library_fails_the_scenario() {
    let runner = TestRunner::new(TbConfig {
        dut_library: Some("does/not/exist.so".into()),
        ..config(RESET_HIGH)
    });
    let report = run_one(&runner).await;
    assert!(matches!(report.outcome, Outcome::Failed(_)));
    assert_eq!(report.sim_time_ps, 0);
}

fn short_reset(dut: Dut) -> ScenarioFuture {
    Box::pin(async move {
        let clk = dut.signal("clk");
        let reset = dut.signal("reset");
        reset.set(1).await?;
        Clock::new(&clk, scenarios::CLOCK_PERIOD_NS, TimeUnit::Ns)
            .start()
            .await?;
        ClockCycles::new(&clk, 2).await?;
        reset.set(0).await?;
        ClockCycles::new(&clk, 10).await?;
        scenarios::check_uio_out(&dut).await
    })
}

#[tokio::test]
async fn test_waveform_written_per_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let runner = TestRunner::new(TbConfig {
        waves_dir: Some(dir.path().join("sim_build")),
        ..TbConfig::default()
    });
    let short = [Scenario {
        name: "short.test_reset",
        polarity: ResetPolarity::ActiveHigh,
        test: short_reset,
    }];
    let reports = runner.run(&short).await;
    assert!(runner::all_passed(&reports));

    let path = dir.path().join("sim_build").join("short_test_reset.vcd");
    assert_eq!(reports[0].waveform.as_deref(), Some(path.as_path()));
    assert_eq!(reports[0].sim_time_ps, 480_000);

    let vcd = std::fs::read_to_string(&path).unwrap();
    assert!(vcd.starts_with("$version ttvga $end\n$timescale 1ps $end\n"));
    assert!(vcd.contains("$scope module tt_um_vga $end"));
    assert!(vcd.contains(" clk $end"));
    assert!(vcd.contains(" reset $end"));
    assert!(vcd.contains("\n#80000\n"));
    assert!(vcd.contains("\n#480000\n"));

    let summary = runner::summary(&reports);
    assert!(summary.lines().nth(1).unwrap().starts_with("short.test_reset  PASS"));
    assert!(summary.ends_with("TESTS=1 PASS=1 FAIL=0"));
}
