//! Primitives a scenario is written with: a DUT handle with named signals,
//! a free-running clock, and the two waits (`Timer`, `ClockCycles`).
//!
//! Each wait is one request to the simulator; the scenario stays suspended
//! until the simulator has advanced time and answered.

mod clock;
mod dut;
mod triggers;

pub use clock::Clock;
pub use dut::{Dut, SignalHandle};
pub use triggers::{ClockCycles, Timer};
pub use ttvga_sim::TimeUnit;
