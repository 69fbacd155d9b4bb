use thiserror::Error;
use ttvga_sim::time;

pub type TtvgaTbResult<T> = Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(
        "assertion failed at {}: {signal_name} == 0b{actual}, expected 0b{expected}",
        at(.time_ps)
    )]
    AssertionMismatch {
        signal_name: String,
        expected: String,
        actual: String,
        time_ps: u64,
    },
    #[error("simulator: {}", _0)]
    Simulator(String),
    #[error("unexpected response to `{}`", _0)]
    UnexpectedResponse(String),
    #[error("ttvga_sim: {}", _0)]
    Sim(ttvga_sim::Error),
    #[error("ttvga_local_sim: {}", _0)]
    LocalSim(ttvga_local_sim::Error),
    #[error("invalid config: {}", _0)]
    Config(serde_json::Error),
    #[error("IO error: {}", _0)]
    Io(std::io::Error),
}

fn at(time_ps: &u64) -> String {
    time::format_ps(*time_ps)
}

impl From<ttvga_sim::Error> for Error {
    fn from(value: ttvga_sim::Error) -> Self {
        Self::Sim(value)
    }
}

impl From<ttvga_local_sim::Error> for Error {
    fn from(value: ttvga_local_sim::Error) -> Self {
        Self::LocalSim(value)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Config(value)
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ttvga_rs::Error> for Error {
    fn from(value: ttvga_rs::Error) -> Self {
        Self::LocalSim(value.into())
    }
}
