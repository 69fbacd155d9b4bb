use bitvec::vec::BitVec;
use rand::RngCore;

use crate::bits;

#[derive(Clone, Debug)]
pub struct Request {
    pub id: usize,
    pub payload: Payload,
}

/// Durations and periods are in picoseconds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    Run(u64),
    RunCycles(String, u64),
    SetSignal(String, BitVec<u32>),
    GetSignal(String),
    StartClock(ClockSpec),
    GetSimulationResult,
    Terminate,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClockSpec {
    pub signal_name: String,
    pub period: u64,
    pub start_high: bool,
}

impl Request {
    pub fn run(duration: u64) -> Self {
        Self::with_payload(Payload::Run(duration))
    }

    pub fn run_cycles(signal_name: String, cycles: u64) -> Self {
        Self::with_payload(Payload::RunCycles(signal_name, cycles))
    }

    pub fn set_signal(signal_name: String, value: BitVec<u32>) -> Self {
        Self::with_payload(Payload::SetSignal(signal_name, value))
    }

    pub fn get_signal(signal_name: String) -> Self {
        Self::with_payload(Payload::GetSignal(signal_name))
    }

    pub fn start_clock(clock_spec: ClockSpec) -> Self {
        Self::with_payload(Payload::StartClock(clock_spec))
    }

    pub fn get_simulation_result() -> Self {
        Self::with_payload(Payload::GetSimulationResult)
    }

    pub fn terminate() -> Self {
        Self::with_payload(Payload::Terminate)
    }

    fn with_payload(payload: Payload) -> Self {
        let id = Self::random_id();
        Self { id, payload }
    }

    fn random_id() -> usize {
        let mut rng = rand::rng();
        rng.next_u32() as usize
    }
}

impl std::fmt::Display for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Payload::Run(duration) => write!(f, "run {duration} ps"),
            Payload::RunCycles(signal_name, cycles) => {
                write!(f, "run {cycles} cycles of {signal_name}")
            }
            Payload::SetSignal(signal_name, value) => {
                write!(f, "set {signal_name} = 0b{}", bits::binary(value))
            }
            Payload::GetSignal(signal_name) => write!(f, "get {signal_name}"),
            Payload::StartClock(spec) => {
                write!(f, "start clock on {} ({} ps)", spec.signal_name, spec.period)
            }
            Payload::GetSimulationResult => write!(f, "get simulation result"),
            Payload::Terminate => write!(f, "terminate"),
        }
    }
}
