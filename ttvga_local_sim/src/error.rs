pub type TtvgaLocalSimResult<T> = Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown signal '{}'", _0)]
    UnknownSignal(String),
    #[error("signal '{}' cannot be set", _0)]
    NotSettable(String),
    #[error("signal '{}' cannot be read", _0)]
    NotGettable(String),
    #[error("value 0b{} does not fit in {}-bit signal '{}'", _1, _2, _0)]
    ValueTooWide(String, String, usize),
    #[error("no clock is running on signal '{}'", _0)]
    NoClockOnSignal(String),
    #[error("invalid clock period {} ps on signal '{}'", _1, _0)]
    InvalidClockPeriod(String, u64),
    #[error("running {} ps past {} ps overflows the simulation time", _1, _0)]
    TimeOverflow(u64, u64),
    #[error("simulation terminated")]
    Terminated,
    #[error("ttvga_rs: {}", _0)]
    Dut(ttvga_rs::Error),
}

impl From<ttvga_rs::Error> for Error {
    fn from(value: ttvga_rs::Error) -> Self {
        Self::Dut(value)
    }
}
