mod results;

use bitvec::vec::BitVec;

pub use results::{SimulationResult, Wave};

pub struct Response {
    pub id: usize,
    pub payload: Payload,
}

pub enum Payload {
    Result(Results),
    Error(Box<dyn std::error::Error + Send + Sync>),
    Notification(Notifications),
}

pub enum Results {
    CurrentTime(u64),
    SignalValue(BitVec<u32>),
    SimulationResult(SimulationResult),
    Empty,
}

pub enum Notifications {
    Progress(Percentage, String),
}

#[derive(Clone, Debug)]
pub struct Percentage {
    num_of_steps: usize,
    completed_steps: usize,
}

impl Response {
    pub fn result(&self) -> Option<&Results> {
        if let Payload::Result(result) = &self.payload {
            Some(result)
        } else {
            None
        }
    }
}

impl From<SimulationResult> for Payload {
    fn from(value: SimulationResult) -> Self {
        Payload::Result(Results::SimulationResult(value))
    }
}

impl Payload {
    pub fn progress(message: String, percentage: Percentage) -> Self {
        Payload::Notification(Notifications::Progress(percentage, message))
    }

    pub fn current_time(current_time: u64) -> Self {
        Payload::Result(Results::CurrentTime(current_time))
    }

    pub fn signal_value(value: BitVec<u32>) -> Self {
        Payload::Result(Results::SignalValue(value))
    }

    pub fn empty() -> Self {
        Payload::Result(Results::Empty)
    }

    pub fn error<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Payload::Error(Box::new(error))
    }
}

impl Percentage {
    pub fn new(num_of_steps: usize) -> Self {
        Self {
            num_of_steps,
            completed_steps: 0,
        }
    }

    pub fn increment(&mut self) {
        self.completed_steps += 1;
    }

    /// Completed fraction in `0.0..=1.0`. A zero-step progress is complete.
    pub fn value(&self) -> f32 {
        if self.num_of_steps == 0 {
            return 1.0;
        }
        self.completed_steps.min(self.num_of_steps) as f32 / self.num_of_steps as f32
    }
}

impl std::fmt::Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0}%", self.value() * 100.0)
    }
}

impl std::fmt::Display for Notifications {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notifications::Progress(percentage, message) => write!(f, "{message} ({percentage})"),
        }
    }
}
