//! Simulation time. The protocol counts time in picoseconds.

use std::str::FromStr;

use crate::error::{Error, TtvgaSimResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeUnit {
    Ps,
    Ns,
    Us,
    Ms,
    S,
}

impl TimeUnit {
    pub fn ps_per_unit(self) -> u64 {
        match self {
            TimeUnit::Ps => 1,
            TimeUnit::Ns => 1_000,
            TimeUnit::Us => 1_000_000,
            TimeUnit::Ms => 1_000_000_000,
            TimeUnit::S => 1_000_000_000_000,
        }
    }

    pub fn to_ps(self, value: u64) -> TtvgaSimResult<u64> {
        value
            .checked_mul(self.ps_per_unit())
            .ok_or(Error::TimeOverflow(value, self))
    }

    /// Whole units in `ps`, rounded down.
    pub fn from_ps(self, ps: u64) -> u64 {
        ps / self.ps_per_unit()
    }
}

impl FromStr for TimeUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ps" => Ok(TimeUnit::Ps),
            "ns" => Ok(TimeUnit::Ns),
            "us" => Ok(TimeUnit::Us),
            "ms" => Ok(TimeUnit::Ms),
            "s" | "sec" => Ok(TimeUnit::S),
            _ => Err(Error::UnknownTimeUnit(s.to_string())),
        }
    }
}

impl std::fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let unit = match self {
            TimeUnit::Ps => "ps",
            TimeUnit::Ns => "ns",
            TimeUnit::Us => "us",
            TimeUnit::Ms => "ms",
            TimeUnit::S => "s",
        };
        write!(f, "{unit}")
    }
}

/// Formats a picosecond timestamp in the largest unit that divides it.
pub fn format_ps(ps: u64) -> String {
    let unit = [TimeUnit::S, TimeUnit::Ms, TimeUnit::Us, TimeUnit::Ns]
        .into_iter()
        .find(|unit| ps != 0 && ps % unit.ps_per_unit() == 0)
        .unwrap_or(TimeUnit::Ps);
    format!("{} {}", unit.from_ps(ps), unit)
}
