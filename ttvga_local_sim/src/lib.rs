mod backend;
mod error;
mod oscillator;
pub mod vga_tile;

use std::collections::HashMap;

use async_trait::async_trait;
use bitvec::vec::BitVec;
use tokio::sync::{mpsc::Sender, RwLock};
use tokio::sync::{RwLockReadGuard, RwLockWriteGuard};

use ttvga_rs::Signal;
use ttvga_sim::{
    bits,
    request::{self, ClockSpec},
    response::{self, Percentage, SimulationResult, Wave},
    Request, Response, Simulator,
};

pub use backend::Backend;
pub use error::{Error, TtvgaLocalSimResult};
pub use vga_tile::{ResetPolarity, UioOeFault, VgaTile};

use crate::oscillator::{Edge, Oscillator, OscillatorGroup};

/// `RunCycles` requests at least this long report progress.
const PROGRESS_MIN_CYCLES: u64 = 10_000;
const PROGRESS_STEPS: u64 = 10;

pub struct LocalSimulator {
    channel: RwLock<Option<Sender<Response>>>,
    simulation_result: RwLock<SimulationResult>,
    dut_state: RwLock<DutState>,
}

#[derive(Clone, Copy, Debug)]
pub struct Options {
    pub record_waves: bool,
}

struct DutState {
    backend: Option<Box<dyn Backend>>,
    signals: HashMap<String, Signal>,
    oscillators: OscillatorGroup,
    current_time: u64,
    record_waves: bool,
}

/// Counts rising edges of one clock during a `RunCycles` request.
struct EdgeWatch<'a> {
    signal_name: &'a str,
    target: u64,
    seen: u64,
    progress: Option<Progress>,
}

struct Progress {
    channel: Sender<Response>,
    message_id: usize,
    percentage: Percentage,
    step: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self { record_waves: true }
    }
}

#[async_trait]
impl Simulator for LocalSimulator {
    async fn serve(&self, request: &Request) -> Response {
        tracing::trace!(id = request.id, "serving `{}`", request.payload);
        let payload = match &request.payload {
            request::Payload::Run(duration) => self.serve_run(*duration).await,
            request::Payload::RunCycles(signal_name, cycles) => {
                self.serve_run_cycles(signal_name, *cycles, request.id)
                    .await
            }
            request::Payload::SetSignal(signal_name, value) => {
                self.serve_set_signal(signal_name, value).await
            }
            request::Payload::GetSignal(signal_name) => self.serve_get_signal(signal_name).await,
            request::Payload::StartClock(clock_spec) => self.serve_start_clock(clock_spec).await,
            request::Payload::GetSimulationResult => self.serve_simulation_result().await,
            request::Payload::Terminate => self.serve_terminate().await,
        };
        Response {
            id: request.id,
            payload,
        }
    }

    async fn set_channel(&self, channel: Sender<Response>) {
        let mut current_channel = self.channel.write().await;
        *current_channel = Some(channel);
    }
}

impl LocalSimulator {
    pub fn new(backend: Box<dyn Backend>, options: Options) -> TtvgaLocalSimResult<Self> {
        let signals = backend.query()?;
        let mut simulation_result = SimulationResult {
            waves: signals.iter().cloned().map(Wave::from).collect(),
            time_step_ps: 1,
            current_time: 0,
        };
        let dut_state = DutState {
            backend: Some(backend),
            signals: signals.into_iter().map(|s| (s.name.clone(), s)).collect(),
            oscillators: OscillatorGroup::default(),
            current_time: 0,
            record_waves: options.record_waves,
        };
        dut_state.record(&mut simulation_result)?;
        tracing::debug!(
            signals = dut_state.signals.len(),
            record_waves = options.record_waves,
            "local simulator ready"
        );
        Ok(Self {
            channel: RwLock::new(None),
            simulation_result: RwLock::new(simulation_result),
            dut_state: RwLock::new(dut_state),
        })
    }

    async fn serve_run(&self, duration: u64) -> response::Payload {
        let mut dut_state = self.dut_state.write().await;
        let mut simulation_result = self.simulation_result.write().await;
        let Some(target_time) = dut_state.current_time.checked_add(duration) else {
            return response::Payload::error(Error::TimeOverflow(dut_state.current_time, duration));
        };
        match dut_state.run_until(target_time, None, &mut simulation_result) {
            Ok(()) => response::Payload::current_time(dut_state.current_time),
            Err(e) => response::Payload::error(e),
        }
    }

    async fn serve_run_cycles(
        &self,
        signal_name: &str,
        cycles: u64,
        message_id: usize,
    ) -> response::Payload {
        let channel = self.channel.read().await.clone();
        let mut dut_state = self.dut_state.write().await;
        let mut simulation_result = self.simulation_result.write().await;
        match dut_state.run_cycles(
            signal_name,
            cycles,
            channel,
            message_id,
            &mut simulation_result,
        ) {
            Ok(()) => response::Payload::current_time(dut_state.current_time),
            Err(e) => response::Payload::error(e),
        }
    }

    async fn serve_set_signal(&self, signal_name: &str, value: &BitVec<u32>) -> response::Payload {
        let mut dut_state = self.dut_state.write().await;
        let mut simulation_result = self.simulation_result.write().await;
        match Self::set_signal(&mut dut_state, signal_name, value, &mut simulation_result) {
            Ok(()) => response::Payload::empty(),
            Err(e) => response::Payload::error(e),
        }
    }

    fn set_signal(
        dut_state: &mut RwLockWriteGuard<'_, DutState>,
        signal_name: &str,
        value: &BitVec<u32>,
        simulation_result: &mut RwLockWriteGuard<'_, SimulationResult>,
    ) -> TtvgaLocalSimResult<()> {
        let value = dut_state.settable_value(signal_name, value)?;
        dut_state.backend_mut()?.set(signal_name, &value)?;
        dut_state.settle(simulation_result)
    }

    async fn serve_get_signal(&self, signal_name: &str) -> response::Payload {
        let dut_state = self.dut_state.read().await;
        match Self::get_signal(&dut_state, signal_name) {
            Ok(value) => response::Payload::signal_value(value),
            Err(e) => response::Payload::error(e),
        }
    }

    fn get_signal(
        dut_state: &RwLockReadGuard<'_, DutState>,
        signal_name: &str,
    ) -> TtvgaLocalSimResult<BitVec<u32>> {
        match dut_state.signals.get(signal_name) {
            Some(signal) if signal.get => dut_state.backend()?.get(signal_name),
            Some(_) => Err(Error::NotGettable(signal_name.to_string())),
            None => Err(Error::UnknownSignal(signal_name.to_string())),
        }
    }

    async fn serve_start_clock(&self, clock_spec: &ClockSpec) -> response::Payload {
        let mut dut_state = self.dut_state.write().await;
        let mut simulation_result = self.simulation_result.write().await;
        match dut_state.start_clock(clock_spec, &mut simulation_result) {
            Ok(()) => response::Payload::empty(),
            Err(e) => response::Payload::error(e),
        }
    }

    async fn serve_simulation_result(&self) -> response::Payload {
        let current_time = self.dut_state.read().await.current_time;
        let mut simulation_result = self.simulation_result.write().await;
        simulation_result.extend_to(current_time);
        response::Payload::from(simulation_result.clone())
    }

    async fn serve_terminate(&self) -> response::Payload {
        let mut dut_state = self.dut_state.write().await;
        let mut simulation_result = self.simulation_result.write().await;
        simulation_result.extend_to(dut_state.current_time);
        dut_state.release_resources();
        tracing::debug!(current_time = dut_state.current_time, "simulation terminated");
        response::Payload::current_time(dut_state.current_time)
    }
}

impl DutState {
    fn backend(&self) -> TtvgaLocalSimResult<&dyn Backend> {
        match &self.backend {
            Some(backend) => Ok(backend.as_ref()),
            None => Err(Error::Terminated),
        }
    }

    fn backend_mut(&mut self) -> TtvgaLocalSimResult<&mut Box<dyn Backend>> {
        match &mut self.backend {
            Some(backend) => Ok(backend),
            None => Err(Error::Terminated),
        }
    }

    fn settable_value(
        &self,
        signal_name: &str,
        value: &BitVec<u32>,
    ) -> TtvgaLocalSimResult<BitVec<u32>> {
        let signal = match self.signals.get(signal_name) {
            Some(signal) if signal.set => signal,
            Some(_) => return Err(Error::NotSettable(signal_name.to_string())),
            None => return Err(Error::UnknownSignal(signal_name.to_string())),
        };
        let width = signal.width as usize;
        bits::fit_to_width(value, width)
            .ok_or_else(|| Error::ValueTooWide(signal_name.to_string(), bits::binary(value), width))
    }

    fn start_clock(
        &mut self,
        clock_spec: &ClockSpec,
        simulation_result: &mut SimulationResult,
    ) -> TtvgaLocalSimResult<()> {
        let signal_name = &clock_spec.signal_name;
        if clock_spec.period == 0 || clock_spec.period % 2 != 0 {
            return Err(Error::InvalidClockPeriod(
                signal_name.clone(),
                clock_spec.period,
            ));
        }
        let low = self.settable_value(signal_name, &bits::from_u64(0, 1))?;
        let high = self.settable_value(signal_name, &bits::from_u64(1, 1))?;
        let oscillator = Oscillator::new(
            signal_name.clone(),
            clock_spec.period / 2,
            self.current_time,
            low,
            high,
            clock_spec.start_high,
        );
        let initial_value = oscillator.initial_value().clone();
        self.backend_mut()?.set(signal_name, &initial_value)?;
        self.oscillators.insert(oscillator);
        tracing::debug!(
            signal_name = signal_name.as_str(),
            period_ps = clock_spec.period,
            "clock started"
        );
        self.settle(simulation_result)
    }

    fn run_cycles(
        &mut self,
        signal_name: &str,
        cycles: u64,
        channel: Option<Sender<Response>>,
        message_id: usize,
        simulation_result: &mut SimulationResult,
    ) -> TtvgaLocalSimResult<()> {
        self.backend()?;
        if !self.oscillators.contains(signal_name) {
            return Err(Error::NoClockOnSignal(signal_name.to_string()));
        }
        if cycles == 0 {
            return Ok(());
        }
        let progress = match channel {
            Some(channel) if cycles >= PROGRESS_MIN_CYCLES => Some(Progress {
                channel,
                message_id,
                percentage: Percentage::new(PROGRESS_STEPS as usize),
                step: cycles / PROGRESS_STEPS,
            }),
            _ => None,
        };
        let mut watch = EdgeWatch {
            signal_name,
            target: cycles,
            seen: 0,
            progress,
        };
        self.run_until(u64::MAX, Some(&mut watch), simulation_result)
    }

    /// Advances event by event until `target_time`, or until `watch` has
    /// seen its number of rising edges.
    fn run_until(
        &mut self,
        target_time: u64,
        mut watch: Option<&mut EdgeWatch<'_>>,
        simulation_result: &mut SimulationResult,
    ) -> TtvgaLocalSimResult<()> {
        self.backend()?;
        loop {
            let next_time = match self.oscillators.next_trigger_time() {
                Some(time) if time <= target_time => time,
                _ => target_time,
            };
            if next_time > self.current_time {
                let delta = next_time - self.current_time;
                self.backend_mut()?.run(delta)?;
                self.current_time = next_time;
            }

            let mut toggled = false;
            while let Some(trip) = self.oscillators.try_pop(self.current_time) {
                self.backend_mut()?.set(&trip.signal_name, &trip.value)?;
                if let Some(watch) = watch.as_deref_mut() {
                    if trip.edge == Edge::Rising && trip.signal_name == watch.signal_name {
                        watch.count_edge();
                    }
                }
                toggled = true;
            }
            if toggled {
                self.settle(simulation_result)?;
            }

            if let Some(watch) = watch.as_deref() {
                if watch.seen >= watch.target {
                    return Ok(());
                }
            }
            if self.current_time >= target_time {
                return Ok(());
            }
        }
    }

    /// Evaluates the backend at the current time and records waves.
    fn settle(&mut self, simulation_result: &mut SimulationResult) -> TtvgaLocalSimResult<()> {
        self.backend_mut()?.run(0)?;
        self.record(simulation_result)
    }

    fn record(&self, simulation_result: &mut SimulationResult) -> TtvgaLocalSimResult<()> {
        if !self.record_waves {
            return Ok(());
        }
        let backend = self.backend()?;
        for wave in simulation_result.waves.iter_mut() {
            let value = backend.get(&wave.signal_name)?;
            wave.record(value, self.current_time);
        }
        simulation_result.current_time = self.current_time;
        Ok(())
    }

    fn release_resources(&mut self) {
        self.oscillators.clear();
        _ = self.backend.take();
    }
}

impl EdgeWatch<'_> {
    fn count_edge(&mut self) {
        self.seen += 1;
        if let Some(progress) = self.progress.as_mut() {
            if progress.step > 0 && self.seen % progress.step == 0 && self.seen < self.target {
                progress.percentage.increment();
                let message = format!(
                    "{} / {} cycles of {}",
                    self.seen, self.target, self.signal_name
                );
                let payload = response::Payload::progress(message, progress.percentage.clone());
                let response = Response {
                    id: progress.message_id,
                    payload,
                };
                if progress.channel.try_send(response).is_err() {
                    tracing::trace!("progress notification dropped");
                }
            }
        }
    }
}
