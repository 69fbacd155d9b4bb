use crate::dut;

pub type TtvgaResult<T> = Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("ttvga_rs: dut: {}", _0)]
    Dut(dut::Error),
    #[error("ttvga_rs: internal error: {}", _0)]
    InternalError(String),
}

impl From<std::ffi::NulError> for Error {
    fn from(value: std::ffi::NulError) -> Self {
        Error::InternalError(value.to_string())
    }
}
