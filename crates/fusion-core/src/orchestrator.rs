//! The fusion pipeline: discovery, dispatch, validation, normalization, report.
//!
//! A run fails only on an invalid task, cancellation, or when a required
//! skill ends up with no contributing agent. Every other failure is recorded
//! on the report against the agent or target group it belongs to.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::config::{AgentEndpoint, FusionConfig};
use crate::discovery::{uncovered_skills, Discovery, DiscoveryReport};
use crate::dispatch::events::CancelToken;
use crate::dispatch::{DispatchOutcome, DispatchTarget, Dispatcher};
use crate::domain::{AgentFailure, FusionError, FusionResult, TargetFailure, Task};
use crate::metrics::{Counter, METRICS};
use crate::normalize::{fuse_group, group_readings, pair_of};
use crate::obs::{self, FusionSpan};
use crate::registry::{AgentRegistry, RegistrySnapshot};
use crate::report::{new_fusion_id, FusionReport, ReportBuilder};
use crate::transport::{AgentTransport, HttpTransport};
use crate::validate::{validate, ValidationResult};

const NOT_REGISTERED: &str = "agent is not registered";
const NO_FUSABLE_SKILL: &str = "no fusable skill declared";

pub struct FusionOrchestrator {
    config: FusionConfig,
    registry: AgentRegistry,
    discovery: Discovery,
    dispatcher: Dispatcher,
    /// Reason each configured agent failed its latest discovery.
    discovery_failures: Arc<RwLock<BTreeMap<String, String>>>,
}

impl FusionOrchestrator {
    pub fn new(config: FusionConfig, transport: Arc<dyn AgentTransport>) -> FusionResult<Self> {
        config
            .validate()
            .map_err(|e| FusionError::Config(e.to_string()))?;

        let registry = AgentRegistry::new();
        let discovery = Discovery::new(
            Arc::clone(&transport),
            registry.clone(),
            config.discovery_timeout(),
            config.required_skills.clone(),
        );
        let dispatcher = Dispatcher::new(transport, config.dispatch_timeout());

        Ok(Self {
            config,
            registry,
            discovery,
            dispatcher,
            discovery_failures: Arc::default(),
        })
    }

    /// Orchestrator talking JSON over HTTP with the configured paths.
    pub fn with_http(config: FusionConfig) -> FusionResult<Self> {
        let transport = HttpTransport::new(config.http_transport_config())
            .map_err(|e| FusionError::Config(e.to_string()))?;
        Self::new(config, Arc::new(transport))
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// (Re-)discover every configured agent.
    pub async fn discover(&self) -> DiscoveryReport {
        self.discover_endpoints(&self.config.agents).await
    }

    async fn discover_endpoints(&self, endpoints: &[AgentEndpoint]) -> DiscoveryReport {
        let report = self.discovery.discover_all(endpoints).await;

        let mut failures = self.discovery_failures.write().await;
        for id in &report.registered {
            failures.remove(id);
        }
        for (id, err) in &report.failures {
            failures.insert(id.clone(), err.to_string());
        }
        report
    }

    pub async fn run(&self, sector_id: &str) -> FusionResult<FusionReport> {
        self.run_with_cancel(sector_id, &CancelToken::never()).await
    }

    /// Run one fusion for `sector_id`.
    ///
    /// Discovers agents first if the registry is empty, and retries the
    /// configured agents that are not registered whenever a required skill
    /// lacks a provider. Cancelling `cancel` aborts in-flight card fetches
    /// and agent calls and skips validation and normalization.
    #[instrument(skip(self, cancel))]
    pub async fn run_with_cancel(
        &self,
        sector_id: &str,
        cancel: &CancelToken,
    ) -> FusionResult<FusionReport> {
        let task = Task::new(
            sector_id,
            self.config.request_type.as_str(),
            self.config.priority,
        )?;

        let mut snapshot = self.registry.snapshot().await;
        let pending = self.unregistered_endpoints(&snapshot);
        let uncovered = !uncovered_skills(&snapshot, &self.config.required_skills).is_empty();
        if !pending.is_empty() && (snapshot.is_empty() || uncovered) {
            info!(agents = pending.len(), "discovering unregistered agents");
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FusionError::Cancelled),
                _ = self.discover_endpoints(&pending) => {}
            }
            snapshot = self.registry.snapshot().await;
        }

        if cancel.is_cancelled() {
            return Err(FusionError::Cancelled);
        }

        let missing = uncovered_skills(&snapshot, &self.config.required_skills);
        if !missing.is_empty() {
            return Err(FusionError::InsufficientCoverage {
                missing_skills: missing,
                contributors: Vec::new(),
                failed: self.unregistered(&snapshot),
            });
        }

        let mut targets = Vec::new();
        let mut unfusable = Vec::new();
        for card in snapshot.cards() {
            let skill = self.configured_skill(&card.id);
            match DispatchTarget::for_card_with_skill(Arc::clone(&card), skill) {
                Some(target) => targets.push(target),
                None => unfusable.push(AgentFailure::new(card.id.as_str(), NO_FUSABLE_SKILL)),
            }
        }
        info!(task_id = %task.task_id, agents = targets.len(), "dispatching task");
        let outcome = self.dispatcher.dispatch(&task, targets, cancel).await;

        if cancel.is_cancelled() {
            return Err(FusionError::Cancelled);
        }

        let contributors = outcome.succeeded();
        let missing: Vec<String> = self
            .config
            .required_skills
            .iter()
            .filter(|skill| {
                !contributors.iter().any(|id| {
                    snapshot
                        .get(id)
                        .map(|card| card.declares(skill))
                        .unwrap_or(false)
                })
            })
            .cloned()
            .collect();
        if !missing.is_empty() {
            let mut failed = outcome.failed();
            failed.extend(unfusable.iter().map(|f| f.agent_id.clone()));
            failed.extend(self.unregistered(&snapshot));
            return Err(FusionError::InsufficientCoverage {
                missing_skills: missing,
                contributors,
                failed,
            });
        }

        let mut failed_agents: Vec<AgentFailure> =
            outcome.failures().into_iter().map(AgentFailure::from).collect();
        failed_agents.extend(unfusable);
        failed_agents.extend(self.discovery_failures_for(&snapshot).await);

        Ok(self.fuse(sector_id, &outcome, contributors, failed_agents))
    }

    /// Validate and normalize every reading group and assemble the report.
    fn fuse(
        &self,
        sector_id: &str,
        outcome: &DispatchOutcome,
        contributors: Vec<String>,
        failed_agents: Vec<AgentFailure>,
    ) -> FusionReport {
        let fusion_id = new_fusion_id();
        let _span = FusionSpan::enter(&fusion_id, sector_id);

        let groups = group_readings(&outcome.readings());

        let validations: Vec<ValidationResult> = groups
            .iter()
            .filter_map(|group| pair_of(group).ok())
            .map(|(radar, classification)| validate(radar, classification))
            .collect();
        let validation = ValidationResult::combine(&validations);
        obs::emit_validation_completed(&validation);

        let mut targets = Vec::new();
        let mut failures = Vec::new();
        for group in &groups {
            match fuse_group(group) {
                Ok(target) => targets.push(target),
                Err(err) => {
                    failures.push(TargetFailure::new(group.index, group.agent_ids(), &err))
                }
            }
        }

        let report = ReportBuilder::new(sector_id, targets, validation)
            .fusion_id(fusion_id)
            .contributors(contributors)
            .failed_agents(failed_agents)
            .failures(failures)
            .build();

        METRICS.inc(Counter::ReportsBuilt);
        obs::emit_report_built(
            &report.fusion_id,
            &report.sector_id,
            report.targets.len(),
            report.quality_score,
        );
        report
    }

    /// Configured endpoints with no card in `snapshot`.
    fn unregistered_endpoints(&self, snapshot: &RegistrySnapshot) -> Vec<AgentEndpoint> {
        self.config
            .agents
            .iter()
            .filter(|a| snapshot.get(&a.id).is_none())
            .cloned()
            .collect()
    }

    fn unregistered(&self, snapshot: &RegistrySnapshot) -> Vec<String> {
        self.unregistered_endpoints(snapshot)
            .into_iter()
            .map(|a| a.id)
            .collect()
    }

    fn configured_skill(&self, agent_id: &str) -> Option<&str> {
        self.config
            .agents
            .iter()
            .find(|a| a.id == agent_id)
            .and_then(|a| a.skill.as_deref())
    }

    async fn discovery_failures_for(&self, snapshot: &RegistrySnapshot) -> Vec<AgentFailure> {
        let reasons = self.discovery_failures.read().await;
        self.unregistered(snapshot)
            .into_iter()
            .map(|id| {
                let reason = reasons
                    .get(&id)
                    .cloned()
                    .unwrap_or_else(|| NOT_REGISTERED.to_string());
                AgentFailure::new(id, reason)
            })
            .collect()
    }

    /// Drop all registered agents.
    pub async fn shutdown(&self) {
        self.registry.clear().await;
        self.discovery_failures.write().await.clear();
        info!("orchestrator shut down");
    }
}
