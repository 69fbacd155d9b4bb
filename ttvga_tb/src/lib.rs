pub mod config;
pub mod error;
pub mod runner;
pub mod scenarios;
pub mod testbench;

pub use error::{Error, TtvgaTbResult};
