pub mod bits;
pub mod error;
mod message;
mod simulator;
pub mod time;
pub mod vcd;

pub use error::{Error, TtvgaSimResult};
pub use message::request;
pub use message::request::Request;
pub use message::response;
pub use message::response::Response;
pub use simulator::Simulator;
pub use time::TimeUnit;

pub use ttvga_rs::Signal;
