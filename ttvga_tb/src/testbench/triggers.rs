use std::{future::IntoFuture, pin::Pin};

use ttvga_sim::{Request, TimeUnit};

use crate::error::TtvgaTbResult;

use super::{Dut, SignalHandle};

type TriggerFuture = Pin<Box<dyn std::future::Future<Output = TtvgaTbResult<u64>> + Send>>;

/// Resumes after a fixed amount of simulated time. Awaiting it yields the
/// simulation time (ps) at which the scenario resumed.
pub struct Timer {
    dut: Dut,
    duration: u64,
    unit: TimeUnit,
}

/// Resumes after a number of rising edges of a clocked signal.
pub struct ClockCycles {
    signal: SignalHandle,
    cycles: u64,
}

impl Timer {
    pub fn new(dut: &Dut, duration: u64, unit: TimeUnit) -> Self {
        Self {
            dut: dut.clone(),
            duration,
            unit,
        }
    }
}

impl IntoFuture for Timer {
    type Output = TtvgaTbResult<u64>;
    type IntoFuture = TriggerFuture;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            let duration = self.unit.to_ps(self.duration)?;
            self.dut.request_time(Request::run(duration)).await
        })
    }
}

impl ClockCycles {
    pub fn new(signal: &SignalHandle, cycles: u64) -> Self {
        Self {
            signal: signal.clone(),
            cycles,
        }
    }
}

impl IntoFuture for ClockCycles {
    type Output = TtvgaTbResult<u64>;
    type IntoFuture = TriggerFuture;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            let request = Request::run_cycles(self.signal.name().to_string(), self.cycles);
            self.signal.dut().request_time(request).await
        })
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use ttvga_local_sim::{LocalSimulator, Options, ResetPolarity, VgaTile};

    use crate::testbench::{Clock, ClockCycles, Dut, TimeUnit, Timer};

    fn dut() -> Dut {
        let tile = VgaTile::new(ResetPolarity::ActiveHigh);
        let simulator = LocalSimulator::new(Box::new(tile), Options::default()).unwrap();
        Dut::new(Arc::new(simulator))
    }

    #[tokio::test]
    async fn test_timer_and_clock_cycles() {
        let dut = dut();
        let clk = dut.signal("clk");
        Clock::new(&clk, 40, TimeUnit::Ns).start().await.unwrap();

        assert_eq!(Timer::new(&dut, 150, TimeUnit::Ns).await.unwrap(), 150_000);
        assert_eq!(ClockCycles::new(&clk, 2).await.unwrap(), 200_000);
        assert_eq!(dut.current_time().await.unwrap(), 200_000);
        assert_eq!(ClockCycles::new(&clk, 0).await.unwrap(), 200_000);
    }

    #[tokio::test]
    async fn test_clock_starting_low() {
        let dut = dut();
        let clk = dut.signal("clk");
        Clock::new(&clk, 10, TimeUnit::Ns)
            .start_high(false)
            .start()
            .await
            .unwrap();
        assert_eq!(clk.value_u64().await.unwrap(), 0);
        assert_eq!(ClockCycles::new(&clk, 1).await.unwrap(), 5_000);
    }

    #[tokio::test]
    async fn test_clock_cycles_without_clock_fails() {
        let dut = dut();
        let result = ClockCycles::new(&dut.signal("clk"), 3).await;
        assert!(matches!(result, Err(crate::Error::Simulator(_))));
    }

    #[tokio::test]
    async fn test_timer_overflow() {
        let dut = dut();
        let result = Timer::new(&dut, u64::MAX, TimeUnit::S).await;
        assert!(matches!(result, Err(crate::Error::Sim(_))));
    }

    #[tokio::test]
    async fn test_timer_past_end_of_time_fails_without_advancing() {
        let dut = dut();
        Clock::new(&dut.signal("clk"), 40, TimeUnit::Ns)
            .start()
            .await
            .unwrap();
        Timer::new(&dut, 150, TimeUnit::Ns).await.unwrap();
        let result = Timer::new(&dut, u64::MAX, TimeUnit::Ps).await;
        assert!(matches!(result, Err(crate::Error::Simulator(_))));
        assert_eq!(dut.current_time().await.unwrap(), 150_000);
        assert_eq!(ClockCycles::new(&dut.signal("clk"), 1).await.unwrap(), 160_000);
    }
}
