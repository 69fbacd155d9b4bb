//! Design revision with an active-low `rst_n`, hard-wired `ena`/`Test_in`,
//! and bidirectional pins whose directions are checked along the way.

use crate::{
    error::TtvgaTbResult,
    testbench::{Clock, ClockCycles, Dut, TimeUnit},
};

use super::{check_uio_out, set_default_start_state, CLOCK_PERIOD_NS, CYCLES_PER_LINE};

pub const RESET_LEAD_CYCLES: u64 = 3;
pub const RESET_CYCLES: u64 = 3;

/// Cycles to run after reset release, each followed by a pin check:
/// 1 line, 10 lines, the rest of the frame, then 100 lines of the next
/// frame. Together they make 500,000 cycles.
pub const CHECKPOINTS: [u64; 4] = [
    CYCLES_PER_LINE,
    10 * CYCLES_PER_LINE,
    514 * CYCLES_PER_LINE,
    100 * CYCLES_PER_LINE,
];

pub async fn test_basic_waveform_dump(dut: Dut) -> TtvgaTbResult<()> {
    let clk = dut.signal("clk");
    let rst_n = dut.signal("rst_n");

    set_default_start_state(&dut).await?;
    rst_n.set(1).await?;

    Clock::new(&clk, CLOCK_PERIOD_NS, TimeUnit::Ns).start().await?;

    ClockCycles::new(&clk, RESET_LEAD_CYCLES).await?;
    check_uio_out(&dut).await?;
    rst_n.set(0).await?;

    ClockCycles::new(&clk, RESET_CYCLES).await?;
    check_uio_out(&dut).await?;
    rst_n.set(1).await?;

    for cycles in CHECKPOINTS {
        ClockCycles::new(&clk, cycles).await?;
        check_uio_out(&dut).await?;
        tracing::debug!(cycles, "checkpoint passed");
    }
    Ok(())
}
