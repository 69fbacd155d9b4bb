//! Binding to a compiled DUT shared library.
//!
//! The library exports four C functions: `ttvga_query`, `ttvga_run`,
//! `ttvga_set` and `ttvga_get`. Signal values cross the boundary as little
//! endian arrays of 32-bit words, least significant bit first.

use bitvec::vec::BitVec;
use dut_sys::{DutLib, SigT};
use std::ffi::{c_int, CStr, CString};

use crate::TtvgaResult;

mod dut_sys;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("run failed with status {}", _0)]
    Run(c_int),
    #[error("no signal named {}", _0)]
    UnknownSignal(String),
    #[error("failed to set signal {} with value {}", _0, _1)]
    Set(String, BitVec<u32>),
    #[error("failed to get signal {}", _0)]
    Get(String),
    #[error("libloading: {}", _0)]
    Libloading(libloading::Error),
}

impl From<Error> for crate::Error {
    fn from(value: Error) -> Self {
        crate::Error::Dut(value)
    }
}

impl From<libloading::Error> for crate::Error {
    fn from(value: libloading::Error) -> Self {
        Error::Libloading(value).into()
    }
}

pub struct Dut {
    lib: DutLib,
    signals: Vec<Signal>,
}

impl Dut {
    pub fn new(lib_path: &str) -> TtvgaResult<Self> {
        tracing::debug!(lib_path, "loading DUT library");
        let lib = DutLib::load(lib_path)?;
        let signals = Self::query_signals(&lib);
        tracing::debug!(signals = signals.len(), "DUT library loaded");
        Ok(Dut { lib, signals })
    }

    /// The signal table reported by the library when it was loaded.
    pub fn query(&self) -> TtvgaResult<Vec<Signal>> {
        Ok(self.signals.clone())
    }

    /// Advances the DUT by `duration` time steps and returns its current time.
    pub fn run(&self, duration: u64) -> TtvgaResult<u64> {
        let mut current_time = 0;
        match self.lib.run(duration, &mut current_time) {
            0 => Ok(current_time),
            status => Err(Error::Run(status).into()),
        }
    }

    pub fn set(&self, sig_name: &str, bit_vec: &BitVec<u32>) -> TtvgaResult<()> {
        let width = self.width_of(sig_name)?;
        let c_name = CString::new(sig_name)?;
        let words = Self::words_from(bit_vec, width);
        match self.lib.set(&c_name, &words) {
            0 => Ok(()),
            _ => Err(Error::Set(sig_name.to_string(), bit_vec.clone()).into()),
        }
    }

    pub fn get(&self, sig_name: &str) -> TtvgaResult<BitVec<u32>> {
        let c_name = CString::new(sig_name)?;
        let mut n_bits = 0;
        let words_ptr = self.lib.get(&c_name, &mut n_bits);
        if words_ptr.is_null() {
            return Err(Error::Get(sig_name.to_string()).into());
        }
        Ok(unsafe { Self::bitvec_from(words_ptr, n_bits as usize) })
    }

    fn width_of(&self, sig_name: &str) -> TtvgaResult<usize> {
        self.signals
            .iter()
            .find(|s| s.name == sig_name)
            .map(|s| s.width as usize)
            .ok_or_else(|| Error::UnknownSignal(sig_name.to_string()).into())
    }

    fn query_signals(lib: &DutLib) -> Vec<Signal> {
        let mut num_of_signals = 0;
        let sig_t_ptr = lib.query(&mut num_of_signals);
        if sig_t_ptr.is_null() {
            return vec![];
        }
        unsafe { Self::signals_from(sig_t_ptr, num_of_signals as usize) }
    }

    /// `bit_vec` resized to `width` and padded with zeros to whole words.
    fn words_from(bit_vec: &BitVec<u32>, width: usize) -> Vec<u32> {
        let mut padded = bit_vec.clone();
        padded.resize(width.div_ceil(32) * 32, false);
        padded[width..].fill(false);
        padded.into_vec()
    }

    /// # Safety
    /// `words_ptr` must point to at least `n_bits.div_ceil(32)` words.
    unsafe fn bitvec_from(words_ptr: *const u32, n_bits: usize) -> BitVec<u32> {
        let words = std::slice::from_raw_parts(words_ptr, n_bits.div_ceil(32));
        let mut bit_vec = BitVec::from_slice(words);
        bit_vec.truncate(n_bits);
        bit_vec
    }

    /// # Safety
    /// `sig_t_ptr` must point to `num_of_signals` descriptors whose names are
    /// NUL terminated.
    unsafe fn signals_from(sig_t_ptr: *const SigT, num_of_signals: usize) -> Vec<Signal> {
        std::slice::from_raw_parts(sig_t_ptr, num_of_signals)
            .iter()
            .map(Signal::from)
            .collect()
    }
}

/// A DUT port or internal net visible to the testbench.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub name: String,
    pub width: u64,
    pub get: bool,
    pub set: bool,
}

impl Signal {
    pub fn input(name: &str, width: u64) -> Self {
        Signal {
            name: name.to_string(),
            width,
            get: true,
            set: true,
        }
    }

    pub fn output(name: &str, width: u64) -> Self {
        Signal {
            name: name.to_string(),
            width,
            get: true,
            set: false,
        }
    }
}

impl From<&SigT> for Signal {
    fn from(value: &SigT) -> Self {
        let name = unsafe { CStr::from_ptr(value.name) }
            .to_string_lossy()
            .into_owned();
        Signal {
            name,
            width: value.width,
            get: value.get == 1,
            set: value.set == 1,
        }
    }
}

#[cfg(test)]
mod test {
    use std::ffi::CString;

    use bitvec::prelude::*;

    use super::{dut_sys::SigT, Dut, Signal};

    #[test]
    fn test_bitvec_from_truncates_to_width() {
        let words: [u32; 2] = [0xFFFF_FF1B, 0x0000_0003];
        let bit_vec = unsafe { Dut::bitvec_from(words.as_ptr(), 34) };
        assert_eq!(bit_vec.len(), 34);
        assert_eq!(bit_vec[..8].load_le::<u8>(), 0b0001_1011);
        assert!(bit_vec[32]);
        assert!(bit_vec[33]);
    }

    #[test]
    fn test_signals_from_descriptors() {
        let clk = CString::new("clk").unwrap();
        let uio_oe = CString::new("uio_oe").unwrap();
        let descriptors = [
            SigT {
                name: clk.as_ptr(),
                width: 1,
                get: 1,
                set: 1,
            },
            SigT {
                name: uio_oe.as_ptr(),
                width: 8,
                get: 1,
                set: 0,
            },
        ];
        let signals = unsafe { Dut::signals_from(descriptors.as_ptr(), descriptors.len()) };
        assert_eq!(
            signals,
            vec![Signal::input("clk", 1), Signal::output("uio_oe", 8)]
        );
    }

    #[test]
    fn test_words_from_clears_unused_bits() {
        let mut bit_vec = BitVec::<u32, Lsb0>::from_slice(&[0xFFFF_FFFF, 0xFFFF_FFFF]);
        bit_vec.truncate(36);
        assert_eq!(Dut::words_from(&bit_vec, 36), vec![0xFFFF_FFFF, 0x0000_000F]);
        assert_eq!(Dut::words_from(&bit_vec, 8), vec![0x0000_00FF]);
        assert_eq!(Dut::words_from(&bitvec![u32, Lsb0; 1], 1), vec![1]);
    }

    #[test]
    fn test_missing_library_is_an_error() {
        let result = Dut::new("/nonexistent/libdut.so");
        assert!(matches!(result, Err(crate::Error::Dut(_))));
    }
}
