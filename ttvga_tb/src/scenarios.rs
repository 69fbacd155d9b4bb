//! The waveform-dump scenarios and the checks they share.

pub mod reset_high;
pub mod reset_low;

use std::{future::Future, pin::Pin};

use ttvga_local_sim::ResetPolarity;
use ttvga_sim::bits;

use crate::{
    error::{Error, TtvgaTbResult},
    testbench::Dut,
};

/// 25 MHz pixel clock.
pub const CLOCK_PERIOD_NS: u64 = 40;
pub const CYCLES_PER_LINE: u64 = 800;
pub const CYCLES_AFTER_RESET: u64 = 500_000;

/// Bidirectional pins 0, 1, 3 and 4 are always outputs in this design.
pub const EXPECTED_UIO_OE: u64 = 0b0001_1011;

pub type ScenarioFuture = Pin<Box<dyn Future<Output = TtvgaTbResult<()>> + Send>>;
pub type ScenarioFn = fn(Dut) -> ScenarioFuture;

pub struct Scenario {
    pub name: &'static str,
    /// Reset pin convention of the design the scenario was written for.
    pub polarity: ResetPolarity,
    pub test: ScenarioFn,
}

impl Scenario {
    pub fn test_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(self.name)
    }

    /// Matches either the full name or the bare test name.
    pub fn matches(&self, filter: &str) -> bool {
        self.name == filter || self.test_name() == filter
    }
}

pub fn all() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "reset_high.test_basic_waveform_dump",
            polarity: ResetPolarity::ActiveHigh,
            test: reset_high_waveform_dump,
        },
        Scenario {
            name: "reset_low.test_basic_waveform_dump",
            polarity: ResetPolarity::ActiveLow,
            test: reset_low_waveform_dump,
        },
    ]
}

fn reset_high_waveform_dump(dut: Dut) -> ScenarioFuture {
    Box::pin(reset_high::test_basic_waveform_dump(dut))
}

fn reset_low_waveform_dump(dut: Dut) -> ScenarioFuture {
    Box::pin(reset_low::test_basic_waveform_dump(dut))
}

/// Fails unless every bidirectional pin has its expected direction.
pub async fn check_uio_out(dut: &Dut) -> TtvgaTbResult<()> {
    let uio_oe = dut.signal("uio_oe");
    let actual = uio_oe.value().await?;
    if bits::to_u64(&actual) == Some(EXPECTED_UIO_OE) {
        return Ok(());
    }
    let time_ps = dut.current_time().await?;
    Err(Error::AssertionMismatch {
        signal_name: uio_oe.name().to_string(),
        expected: bits::binary(&bits::from_u64(EXPECTED_UIO_OE, actual.len())),
        actual: bits::binary(&actual),
        time_ps,
    })
}

/// Inputs that are hard-wired on the real board.
pub async fn set_default_start_state(dut: &Dut) -> TtvgaTbResult<()> {
    dut.signal("ena").set(1).await?;
    dut.signal("Test_in").set(1).await?;
    Ok(())
}
