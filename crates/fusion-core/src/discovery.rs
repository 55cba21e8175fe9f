//! Agent discovery: fetch each configured agent's card and register it.
//!
//! Every endpoint is discovered independently and concurrently. One failure
//! never prevents the others from registering; the run continues with
//! whatever subset answered, and a required skill with no provider is
//! reported as a coverage warning.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::instrument;

use crate::config::AgentEndpoint;
use crate::domain::{AgentCard, DiscoveryError, DiscoveryResult, TransportError};
use crate::metrics::{Counter, METRICS};
use crate::obs;
use crate::registry::{AgentRegistry, RegistrySnapshot};
use crate::transport::AgentTransport;

/// Outcome of one discovery pass over a set of endpoints.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Ids registered by this pass, in endpoint order.
    pub registered: Vec<String>,
    /// Endpoints that failed, keyed by configured agent id.
    pub failures: Vec<(String, DiscoveryError)>,
    /// Required skills left without any registered provider.
    pub coverage_warnings: Vec<String>,
}

impl DiscoveryReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.coverage_warnings.is_empty()
    }
}

/// Fetches agent cards and writes them to the registry.
#[derive(Clone)]
pub struct Discovery {
    transport: Arc<dyn AgentTransport>,
    registry: AgentRegistry,
    timeout: Duration,
    required_skills: Vec<String>,
}

impl Discovery {
    pub fn new(
        transport: Arc<dyn AgentTransport>,
        registry: AgentRegistry,
        timeout: Duration,
        required_skills: Vec<String>,
    ) -> Self {
        Self {
            transport,
            registry,
            timeout,
            required_skills,
        }
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Fetch and check one agent's card without registering it.
    #[instrument(skip(self), fields(agent_id = %endpoint.id, url = %endpoint.url))]
    pub async fn discover(&self, endpoint: &AgentEndpoint) -> DiscoveryResult<AgentCard> {
        let document = match tokio::time::timeout(
            self.timeout,
            self.transport.fetch_card(&endpoint.url),
        )
        .await
        {
            Ok(Ok(document)) => document,
            Ok(Err(TransportError::Decode(detail))) => {
                return Err(DiscoveryError::MalformedCard {
                    endpoint: endpoint.url.clone(),
                    detail,
                })
            }
            Ok(Err(e)) => {
                return Err(DiscoveryError::Unreachable {
                    endpoint: endpoint.url.clone(),
                    detail: e.to_string(),
                })
            }
            Err(_) => {
                return Err(DiscoveryError::Unreachable {
                    endpoint: endpoint.url.clone(),
                    detail: format!("no card within {}s", self.timeout.as_secs_f64()),
                })
            }
        };

        let card = AgentCard::from_document(&endpoint.id, document).map_err(|e| {
            DiscoveryError::MalformedCard {
                endpoint: endpoint.url.clone(),
                detail: e.to_string(),
            }
        })?;

        if card.skills.is_empty() {
            return Err(DiscoveryError::MalformedCard {
                endpoint: endpoint.url.clone(),
                detail: "card declares no skills".to_string(),
            });
        }
        if let Some(skill) = &endpoint.skill {
            if !card.declares(skill) {
                return Err(DiscoveryError::MissingSkill {
                    agent_id: endpoint.id.clone(),
                    skill: skill.clone(),
                });
            }
        }

        Ok(card)
    }

    /// Discover every endpoint concurrently and register the successes.
    ///
    /// Re-discovering an id replaces its card; the registry never holds two
    /// entries for one agent.
    #[instrument(skip_all, fields(endpoints = endpoints.len()))]
    pub async fn discover_all(&self, endpoints: &[AgentEndpoint]) -> DiscoveryReport {
        let results = join_all(endpoints.iter().map(|e| self.discover(e))).await;

        let mut report = DiscoveryReport::default();
        for (endpoint, result) in endpoints.iter().zip(results) {
            match result {
                Ok(card) => {
                    let skills: Vec<String> = card.skills.iter().map(|s| s.id.clone()).collect();
                    self.registry.register(card).await;
                    METRICS.inc(Counter::AgentsDiscovered);
                    obs::emit_agent_registered(&endpoint.id, &endpoint.url, &skills);
                    report.registered.push(endpoint.id.clone());
                }
                Err(err) => {
                    METRICS.inc(Counter::DiscoveryFailures);
                    obs::emit_agent_failed(&endpoint.id, &err);
                    report.failures.push((endpoint.id.clone(), err));
                }
            }
        }

        let snapshot = self.registry.snapshot().await;
        report.coverage_warnings = uncovered_skills(&snapshot, &self.required_skills);
        for skill in &report.coverage_warnings {
            obs::emit_coverage_gap(skill);
        }
        report
    }
}

/// Required skills with zero providers in `snapshot`.
pub fn uncovered_skills(snapshot: &RegistrySnapshot, required: &[String]) -> Vec<String> {
    required
        .iter()
        .filter(|skill| snapshot.find_by_skill(skill).is_empty())
        .cloned()
        .collect()
}
