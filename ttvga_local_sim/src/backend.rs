use bitvec::vec::BitVec;
use ttvga_rs::Signal;

use crate::error::TtvgaLocalSimResult;

/// The object that actually evaluates the design under test.
///
/// `run(0)` settles the design at the current time after inputs changed.
pub trait Backend: Send + Sync {
    fn query(&self) -> TtvgaLocalSimResult<Vec<Signal>>;
    fn set(&mut self, signal_name: &str, value: &BitVec<u32>) -> TtvgaLocalSimResult<()>;
    fn get(&self, signal_name: &str) -> TtvgaLocalSimResult<BitVec<u32>>;
    fn run(&mut self, duration: u64) -> TtvgaLocalSimResult<u64>;
}

impl Backend for ttvga_rs::Dut {
    fn query(&self) -> TtvgaLocalSimResult<Vec<Signal>> {
        Ok(ttvga_rs::Dut::query(self)?)
    }

    fn set(&mut self, signal_name: &str, value: &BitVec<u32>) -> TtvgaLocalSimResult<()> {
        Ok(ttvga_rs::Dut::set(self, signal_name, value)?)
    }

    fn get(&self, signal_name: &str) -> TtvgaLocalSimResult<BitVec<u32>> {
        Ok(ttvga_rs::Dut::get(self, signal_name)?)
    }

    fn run(&mut self, duration: u64) -> TtvgaLocalSimResult<u64> {
        Ok(ttvga_rs::Dut::run(self, duration)?)
    }
}
