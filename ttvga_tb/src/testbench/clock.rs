use ttvga_sim::{request::ClockSpec, Request, TimeUnit};

use crate::error::TtvgaTbResult;

use super::SignalHandle;

/// A free-running clock on one signal.
///
/// Once started, the driver lives inside the simulator: it toggles the
/// signal every half period until the simulation is terminated. Starting a
/// clock on a signal that already has one replaces it.
pub struct Clock {
    signal: SignalHandle,
    period: u64,
    unit: TimeUnit,
    start_high: bool,
}

impl Clock {
    pub fn new(signal: &SignalHandle, period: u64, unit: TimeUnit) -> Self {
        Self {
            signal: signal.clone(),
            period,
            unit,
            start_high: true,
        }
    }

    pub fn start_high(mut self, start_high: bool) -> Self {
        self.start_high = start_high;
        self
    }

    pub async fn start(self) -> TtvgaTbResult<()> {
        let period = self.unit.to_ps(self.period)?;
        tracing::debug!(
            signal_name = self.signal.name(),
            "starting {} {} clock",
            self.period,
            self.unit
        );
        let request = Request::start_clock(ClockSpec {
            signal_name: self.signal.name().to_string(),
            period,
            start_high: self.start_high,
        });
        self.signal.dut().request_empty(request).await
    }
}
