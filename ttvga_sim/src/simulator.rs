use async_trait::async_trait;
use tokio::sync::mpsc::Sender;

use crate::{Request, Response};

/// A simulation environment serving testbench requests.
///
/// Every request is answered by exactly one response carrying the same id.
/// Progress notifications are pushed to the channel registered through
/// `set_channel`, if any.
#[async_trait]
pub trait Simulator: Send + Sync {
    async fn serve(&self, request: &Request) -> Response;
    async fn set_channel(&self, channel: Sender<Response>);
}
