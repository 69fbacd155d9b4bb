use std::sync::Arc;

use bitvec::vec::BitVec;
use ttvga_sim::{
    bits,
    response::{self, Results, SimulationResult},
    Request, Simulator,
};

use crate::error::{Error, TtvgaTbResult};

/// Handle to the simulated circuit. Cloning it is cheap; every clone talks
/// to the same simulator.
#[derive(Clone)]
pub struct Dut {
    simulator: Arc<dyn Simulator>,
}

#[derive(Clone)]
pub struct SignalHandle {
    dut: Dut,
    name: String,
}

impl Dut {
    pub fn new(simulator: Arc<dyn Simulator>) -> Self {
        Self { simulator }
    }

    pub fn signal(&self, name: &str) -> SignalHandle {
        SignalHandle {
            dut: self.clone(),
            name: name.to_string(),
        }
    }

    pub async fn current_time(&self) -> TtvgaTbResult<u64> {
        self.request_time(Request::run(0)).await
    }

    pub async fn simulation_result(&self) -> TtvgaTbResult<SimulationResult> {
        match self.request(Request::get_simulation_result()).await? {
            (Results::SimulationResult(result), _) => Ok(result),
            (_, request) => Err(Error::UnexpectedResponse(request)),
        }
    }

    pub async fn terminate(&self) -> TtvgaTbResult<u64> {
        self.request_time(Request::terminate()).await
    }

    pub(crate) async fn request_time(&self, request: Request) -> TtvgaTbResult<u64> {
        match self.request(request).await? {
            (Results::CurrentTime(time), _) => Ok(time),
            (_, request) => Err(Error::UnexpectedResponse(request)),
        }
    }

    pub(crate) async fn request_empty(&self, request: Request) -> TtvgaTbResult<()> {
        match self.request(request).await? {
            (Results::Empty, _) => Ok(()),
            (_, request) => Err(Error::UnexpectedResponse(request)),
        }
    }

    /// Serves `request` and unpacks its result, keeping the request text for
    /// error messages.
    async fn request(&self, request: Request) -> TtvgaTbResult<(Results, String)> {
        let description = request.payload.to_string();
        let response = self.simulator.serve(&request).await;
        match response.payload {
            response::Payload::Result(result) => Ok((result, description)),
            response::Payload::Error(e) => Err(Error::Simulator(e.to_string())),
            response::Payload::Notification(_) => Err(Error::UnexpectedResponse(description)),
        }
    }
}

impl SignalHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dut(&self) -> &Dut {
        &self.dut
    }

    pub async fn set(&self, value: u64) -> TtvgaTbResult<()> {
        self.set_bits(bits::from_u64(value, 64)).await
    }

    pub async fn set_bits(&self, value: BitVec<u32>) -> TtvgaTbResult<()> {
        let request = Request::set_signal(self.name.clone(), value);
        self.dut.request_empty(request).await
    }

    pub async fn value(&self) -> TtvgaTbResult<BitVec<u32>> {
        let request = Request::get_signal(self.name.clone());
        match self.dut.request(request).await? {
            (Results::SignalValue(value), _) => Ok(value),
            (_, request) => Err(Error::UnexpectedResponse(request)),
        }
    }

    pub async fn value_u64(&self) -> TtvgaTbResult<u64> {
        let value = self.value().await?;
        bits::to_u64(&value).ok_or_else(|| {
            Error::Simulator(format!("{} = 0b{} exceeds 64 bits", self.name, bits::binary(&value)))
        })
    }
}
