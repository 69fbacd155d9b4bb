pub mod dut;
pub mod error;

pub use dut::{Dut, Signal};
pub use error::{Error, TtvgaResult};
