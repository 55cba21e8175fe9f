//! JSON-over-HTTP agent transport.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::AgentTransport;
use crate::dispatch::events::ProgressSink;
use crate::domain::{AgentCard, TaskRequest, TransportError, TransportResult};

/// Paths appended to an agent's base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpTransportConfig {
    pub card_path: String,
    pub task_path: String,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            card_path: "/card".to_string(),
            task_path: "/process_task".to_string(),
        }
    }
}

/// `GET {endpoint}{card_path}` for discovery, `POST {card.url}{task_path}` for tasks.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    config: HttpTransportConfig,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> TransportResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("fusion-core/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { config, client })
    }

    pub fn card_url(&self, endpoint: &str) -> String {
        join_url(endpoint, &self.config.card_path)
    }

    pub fn task_url(&self, card: &AgentCard) -> String {
        join_url(&card.url, &self.config.task_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

async fn ensure_success(response: reqwest::Response) -> TransportResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TransportError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl AgentTransport for HttpTransport {
    async fn fetch_card(&self, endpoint: &str) -> TransportResult<serde_json::Value> {
        let url = self.card_url(endpoint);
        debug!(url = %url, "fetching agent card");
        let response = ensure_success(self.client.get(&url).send().await?).await?;
        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }

    async fn send_task(
        &self,
        card: &AgentCard,
        request: &TaskRequest,
        progress: &ProgressSink,
    ) -> TransportResult<String> {
        let url = self.task_url(card);
        debug!(url = %url, sector = %request.sector_id, "sending task");
        progress.report(format!("task submitted to {url}"));
        let response = ensure_success(self.client.post(&url).json(request).send().await?).await?;
        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AgentCapabilities;

    #[test]
    fn test_urls_join_without_double_slashes() {
        let transport = HttpTransport::new(HttpTransportConfig::default()).unwrap();
        assert_eq!(
            transport.card_url("http://localhost:8001/"),
            "http://localhost:8001/card"
        );

        let card = AgentCard {
            id: "radar_agent".to_string(),
            name: "Radar Sensor Agent".to_string(),
            version: "1.0.0".to_string(),
            url: "http://localhost:8001".to_string(),
            description: None,
            skills: vec![],
            capabilities: AgentCapabilities::default(),
        };
        assert_eq!(transport.task_url(&card), "http://localhost:8001/process_task");
    }

    #[test]
    fn test_custom_paths() {
        let transport = HttpTransport::new(HttpTransportConfig {
            card_path: ".well-known/agent.json".to_string(),
            task_path: "/tasks".to_string(),
        })
        .unwrap();
        assert_eq!(
            transport.card_url("http://agent"),
            "http://agent/.well-known/agent.json"
        );
    }
}
