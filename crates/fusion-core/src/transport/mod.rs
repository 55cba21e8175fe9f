//! The seam between the orchestrator and the agents it talks to.
//!
//! [`HttpTransport`](http::HttpTransport) speaks JSON over HTTP; tests plug in
//! [`ScriptedTransport`](crate::fakes::ScriptedTransport).

pub mod http;

use async_trait::async_trait;

use crate::dispatch::events::ProgressSink;
use crate::domain::{AgentCard, TaskRequest, TransportResult};

pub use http::{HttpTransport, HttpTransportConfig};

/// Injectable agent transport.
#[async_trait]
pub trait AgentTransport: Send + Sync {
    /// Fetch the raw card document published at `endpoint`.
    async fn fetch_card(&self, endpoint: &str) -> TransportResult<serde_json::Value>;

    /// Send a task to the agent described by `card` and return the raw
    /// response body. Decoding is the dispatcher's job.
    async fn send_task(
        &self,
        card: &AgentCard,
        request: &TaskRequest,
        progress: &ProgressSink,
    ) -> TransportResult<String>;
}
