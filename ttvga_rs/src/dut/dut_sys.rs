use libloading::Library;
use std::ffi::{c_char, c_int, CStr};

use crate::error::TtvgaResult;

type QueryFn = unsafe extern "C" fn(*mut u64) -> *const SigT;
type RunFn = unsafe extern "C" fn(u64, *mut u64) -> c_int;
type SetFn = unsafe extern "C" fn(*const c_char, *const u32, u64) -> c_int;
type GetFn = unsafe extern "C" fn(*const c_char, *mut u64) -> *const u32;

/// Entry points of a loaded DUT library, resolved once at load time.
///
/// The function pointers stay valid as long as `_lib` is loaded, which is as
/// long as this struct lives.
pub struct DutLib {
    query: QueryFn,
    run: RunFn,
    set: SetFn,
    get: GetFn,
    _lib: Library,
}

impl DutLib {
    pub fn load(lib_path: &str) -> TtvgaResult<Self> {
        unsafe {
            let lib = Library::new(lib_path)?;
            let query = *lib.get::<QueryFn>(b"ttvga_query")?;
            let run = *lib.get::<RunFn>(b"ttvga_run")?;
            let set = *lib.get::<SetFn>(b"ttvga_set")?;
            let get = *lib.get::<GetFn>(b"ttvga_get")?;
            Ok(DutLib {
                query,
                run,
                set,
                get,
                _lib: lib,
            })
        }
    }

    pub fn query(&self, num_of_signals: &mut u64) -> *const SigT {
        unsafe { (self.query)(num_of_signals) }
    }

    pub fn run(&self, duration: u64, current_time: &mut u64) -> c_int {
        unsafe { (self.run)(duration, current_time) }
    }

    pub fn set(&self, sig_name: &CStr, words: &[u32]) -> c_int {
        unsafe { (self.set)(sig_name.as_ptr(), words.as_ptr(), words.len() as u64) }
    }

    pub fn get(&self, sig_name: &CStr, n_bits: &mut u64) -> *const u32 {
        unsafe { (self.get)(sig_name.as_ptr(), n_bits) }
    }
}

/// Signal descriptor as laid out by the compiled DUT.
#[repr(C)]
pub struct SigT {
    pub name: *const c_char,
    pub width: u64,
    pub get: u8,
    pub set: u8,
}
