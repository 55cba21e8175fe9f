//! In-memory agent transport (testing only)
//!
//! [`ScriptedTransport`] answers discovery and task calls from per-URL
//! scripts, so pipeline behaviour can be exercised without any network.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::dispatch::events::ProgressSink;
use crate::domain::{AgentCard, TaskRequest, TransportError, TransportResult};
use crate::transport::AgentTransport;

#[derive(Debug, Clone)]
enum CardScript {
    Document(Value),
    Unreachable(String),
}

#[derive(Debug, Clone)]
enum ReplyScript {
    Body(String),
    ConnectionFailure(String),
    Status(u16),
}

/// Scripted behaviour of one agent, keyed by its base URL.
#[derive(Debug, Clone)]
pub struct ScriptedAgent {
    url: String,
    card: CardScript,
    reply: ReplyScript,
    delay: Duration,
    progress: Vec<String>,
}

impl ScriptedAgent {
    /// An agent at `url` that publishes `card` and replies `{}` to tasks.
    pub fn new(url: impl Into<String>, card: Value) -> Self {
        Self {
            url: url.into(),
            card: CardScript::Document(card),
            reply: ReplyScript::Body("{}".to_string()),
            delay: Duration::ZERO,
            progress: Vec::new(),
        }
    }

    /// A radar agent replying with the given polar reading.
    pub fn radar(url: impl Into<String>, range_meters: f64, azimuth_degrees: f64) -> Self {
        let url = url.into();
        Self::new(url.clone(), radar_card(&url)).replying(json!({
            "range_meters": range_meters,
            "azimuth_degrees": azimuth_degrees,
            "timestamp": "2025-01-01T12:00:00Z"
        }))
    }

    /// A visual agent replying with the given classification.
    pub fn visual(url: impl Into<String>, classification: &str, certainty_percent: u8) -> Self {
        let url = url.into();
        Self::new(url.clone(), visual_card(&url)).replying(json!({
            "classification": classification,
            "certainty_percent": certainty_percent,
            "timestamp": "2025-01-01T12:00:00Z"
        }))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn with_card(mut self, card: Value) -> Self {
        self.card = CardScript::Document(card);
        self
    }

    /// Discovery of this agent fails with a connection error.
    pub fn unreachable(mut self) -> Self {
        self.card = CardScript::Unreachable(format!("connection refused: {}", self.url));
        self
    }

    pub fn replying(mut self, body: Value) -> Self {
        self.reply = ReplyScript::Body(body.to_string());
        self
    }

    pub fn replying_raw(mut self, body: impl Into<String>) -> Self {
        self.reply = ReplyScript::Body(body.into());
        self
    }

    /// Task calls fail with a connection error.
    pub fn failing(mut self, detail: impl Into<String>) -> Self {
        self.reply = ReplyScript::ConnectionFailure(detail.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.reply = ReplyScript::Status(status);
        self
    }

    /// Delay applied to every call before it answers.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Progress message emitted before the task reply.
    pub fn with_progress(mut self, message: impl Into<String>) -> Self {
        self.progress.push(message.into());
        self
    }
}

/// Transport answering from [`ScriptedAgent`]s and recording every task sent.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    agents: Mutex<HashMap<String, ScriptedAgent>>,
    sent: Mutex<Vec<(String, TaskRequest)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agent(self, agent: ScriptedAgent) -> Self {
        self.set_agent(agent);
        self
    }

    /// Add or replace an agent script.
    pub fn set_agent(&self, agent: ScriptedAgent) {
        self.agents
            .lock()
            .unwrap()
            .insert(agent.url.clone(), agent);
    }

    /// `(url, request)` pairs in the order tasks were received.
    pub fn sent_tasks(&self) -> Vec<(String, TaskRequest)> {
        self.sent.lock().unwrap().clone()
    }

    fn script(&self, url: &str) -> TransportResult<ScriptedAgent> {
        self.agents
            .lock()
            .unwrap()
            .get(url.trim_end_matches('/'))
            .cloned()
            .ok_or_else(|| TransportError::Connect(format!("no agent at {url}")))
    }
}

#[async_trait]
impl AgentTransport for ScriptedTransport {
    async fn fetch_card(&self, endpoint: &str) -> TransportResult<Value> {
        let agent = self.script(endpoint)?;
        if !agent.delay.is_zero() {
            tokio::time::sleep(agent.delay).await;
        }
        match agent.card {
            CardScript::Document(doc) => Ok(doc),
            CardScript::Unreachable(detail) => Err(TransportError::Connect(detail)),
        }
    }

    async fn send_task(
        &self,
        card: &AgentCard,
        request: &TaskRequest,
        progress: &ProgressSink,
    ) -> TransportResult<String> {
        let agent = self.script(&card.url)?;
        self.sent
            .lock()
            .unwrap()
            .push((agent.url.clone(), request.clone()));

        for message in &agent.progress {
            progress.report(message.clone());
        }
        if !agent.delay.is_zero() {
            tokio::time::sleep(agent.delay).await;
        }

        match agent.reply {
            ReplyScript::Body(body) => Ok(body),
            ReplyScript::ConnectionFailure(detail) => Err(TransportError::Connect(detail)),
            ReplyScript::Status(status) => Err(TransportError::Status {
                status,
                body: String::new(),
            }),
        }
    }
}

/// Card document of a radar agent at `url`.
pub fn radar_card(url: &str) -> Value {
    json!({
        "name": "Radar Sensor Agent",
        "version": "1.0.0",
        "url": url,
        "skills": [{
            "id": "radar_detection",
            "name": "Radar Target Detection",
            "description": "Detects and tracks targets, reporting range and bearing",
            "tags": ["radar", "sensor", "tracking", "polar"]
        }],
        "capabilities": {
            "streaming": false,
            "cancellable": false,
            "max_concurrent_tasks": 10,
            "average_response_time_ms": 50
        }
    })
}

/// Card document of a visual classification agent at `url`.
pub fn visual_card(url: &str) -> Value {
    json!({
        "name": "Visual Sensor Agent",
        "version": "1.0.0",
        "url": url,
        "skills": [{
            "id": "visual_classification",
            "name": "Visual Target Classification",
            "description": "Classifies targets using computer vision",
            "tags": ["visual", "sensor", "classification"]
        }],
        "capabilities": {
            "streaming": true,
            "cancellable": true,
            "max_concurrent_tasks": 5,
            "average_response_time_ms": 120
        }
    })
}
