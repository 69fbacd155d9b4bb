use thiserror::Error;

use crate::TimeUnit;

pub type TtvgaSimResult<T> = Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown time unit '{}'", _0)]
    UnknownTimeUnit(String),
    #[error("{} {} does not fit in the simulation time range", _0, _1)]
    TimeOverflow(u64, TimeUnit),
}
