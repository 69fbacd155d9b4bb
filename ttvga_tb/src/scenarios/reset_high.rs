//! Design revision with an active-high `reset` input and no hard-wired
//! inputs: the reset pulse is timed in nanoseconds.

use crate::{
    error::TtvgaTbResult,
    testbench::{Clock, ClockCycles, Dut, TimeUnit, Timer},
};

use super::{CLOCK_PERIOD_NS, CYCLES_AFTER_RESET};

pub const RESET_ASSERT_DELAY_NS: u64 = 150;
pub const RESET_DURATION_NS: u64 = 250;

/// Starts the clock, pulses `reset` from 150 ns to 400 ns, then lets the
/// design free-run for 500,000 cycles: more than one full VGA frame.
pub async fn test_basic_waveform_dump(dut: Dut) -> TtvgaTbResult<()> {
    let clk = dut.signal("clk");
    let reset = dut.signal("reset");

    Clock::new(&clk, CLOCK_PERIOD_NS, TimeUnit::Ns).start().await?;

    reset.set(0).await?;
    Timer::new(&dut, RESET_ASSERT_DELAY_NS, TimeUnit::Ns).await?;
    reset.set(1).await?;
    Timer::new(&dut, RESET_DURATION_NS, TimeUnit::Ns).await?;
    reset.set(0).await?;
    tracing::info!("reset released, free-running {CYCLES_AFTER_RESET} cycles");

    ClockCycles::new(&clk, CYCLES_AFTER_RESET).await?;
    Ok(())
}
