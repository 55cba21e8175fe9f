//! Concurrent task fan-out with per-call isolation.
//!
//! Every target agent is called on its own tokio task under its own timeout.
//! A slow, failing or malformed agent only ever produces a [`DispatchError`]
//! for itself; the batch always returns one result per target.

pub mod events;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use crate::domain::{
    AgentCard, DispatchError, DispatchResult, RawReading, ReadingKind, SkillKind, Task,
    TaskRequest, TransportError,
};
use crate::metrics::{Counter, METRICS};
use crate::obs;
use crate::transport::AgentTransport;

use events::{CancelToken, ProgressSink, TaskEvent};

/// An agent to call and the reading it must answer with.
#[derive(Debug, Clone)]
pub struct DispatchTarget {
    pub card: Arc<AgentCard>,
    pub expected: ReadingKind,
}

impl DispatchTarget {
    pub fn new(card: Arc<AgentCard>, expected: ReadingKind) -> Self {
        Self { card, expected }
    }

    /// Target derived from the card's first fusable skill, if any.
    pub fn for_card(card: Arc<AgentCard>) -> Option<Self> {
        Self::for_card_with_skill(card, None)
    }

    /// Target expecting the reading of `skill` when the card declares it and
    /// it is fusable, otherwise of the card's first fusable skill.
    pub fn for_card_with_skill(card: Arc<AgentCard>, skill: Option<&str>) -> Option<Self> {
        let expected = skill
            .filter(|s| card.declares(s))
            .and_then(|s| SkillKind::from_id(s).reading_kind())
            .or_else(|| card.reading_kind())?;
        Some(Self { card, expected })
    }

    pub fn agent_id(&self) -> &str {
        &self.card.id
    }
}

/// Per-agent results of one dispatch, keyed by agent id.
#[derive(Debug, Clone, Default)]
pub struct DispatchOutcome {
    pub results: HashMap<String, DispatchResult<RawReading>>,
    /// Progress messages per agent, in arrival order.
    pub progress: BTreeMap<String, Vec<String>>,
}

impl DispatchOutcome {
    /// Successful readings, ordered by agent id.
    pub fn readings(&self) -> BTreeMap<String, RawReading> {
        self.results
            .iter()
            .filter_map(|(id, r)| r.as_ref().ok().map(|reading| (id.clone(), reading.clone())))
            .collect()
    }

    /// Failures, ordered by agent id.
    pub fn failures(&self) -> Vec<&DispatchError> {
        let mut failures: Vec<_> = self
            .results
            .values()
            .filter_map(|r| r.as_ref().err())
            .collect();
        failures.sort_by(|a, b| a.agent_id().cmp(b.agent_id()));
        failures
    }

    pub fn succeeded(&self) -> Vec<String> {
        self.readings().into_keys().collect()
    }

    pub fn failed(&self) -> Vec<String> {
        self.failures()
            .into_iter()
            .map(|e| e.agent_id().to_string())
            .collect()
    }
}

/// Fans a task out to many agents at once.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn AgentTransport>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn AgentTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Call every target concurrently and wait for all of them.
    ///
    /// Each call ends in a reading, a timeout, a transport failure, a schema
    /// mismatch or a cancellation, always recorded under its agent id.
    #[instrument(skip_all, fields(task_id = %task.task_id, agents = targets.len()))]
    pub async fn dispatch(
        &self,
        task: &Task,
        targets: Vec<DispatchTarget>,
        cancel: &CancelToken,
    ) -> DispatchOutcome {
        let request = task.request();
        let agent_ids: Vec<String> = targets.iter().map(|t| t.agent_id().to_string()).collect();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut calls = JoinSet::new();

        for target in targets {
            let transport = Arc::clone(&self.transport);
            let request = request.clone();
            let tx = tx.clone();
            let cancel = cancel.clone();
            let timeout = self.timeout;

            calls.spawn(async move {
                let agent_id = target.agent_id().to_string();
                let _ = tx.send(TaskEvent::Started {
                    agent_id: agent_id.clone(),
                });
                let sink = ProgressSink::new(agent_id.clone(), tx.clone());

                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(DispatchError::Cancelled {
                        agent_id: agent_id.clone(),
                    }),
                    res = call_agent(transport.as_ref(), &target, &request, &sink, timeout) => res,
                };

                let _ = tx.send(TaskEvent::Finished { agent_id, result });
            });
        }
        drop(tx);

        let mut outcome = DispatchOutcome::default();
        while let Some(event) = rx.recv().await {
            match event {
                TaskEvent::Started { agent_id } => {
                    debug!(agent_id = %agent_id, "agent call started");
                }
                TaskEvent::Progress { agent_id, message } => {
                    debug!(agent_id = %agent_id, message = %message, "agent progress");
                    outcome.progress.entry(agent_id).or_default().push(message);
                }
                TaskEvent::Finished { agent_id, result } => {
                    match &result {
                        Ok(reading) => {
                            METRICS.inc(Counter::DispatchesSucceeded);
                            obs::emit_dispatch_completed(&agent_id, reading.kind());
                        }
                        Err(err) => {
                            METRICS.inc(Counter::DispatchFailures);
                            obs::emit_dispatch_failed(&agent_id, err);
                        }
                    }
                    outcome.results.insert(agent_id, result);
                }
            }
        }

        while let Some(joined) = calls.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "agent call task did not complete");
            }
        }

        // A call task that panicked never reported; record it rather than drop it.
        for agent_id in agent_ids {
            outcome.results.entry(agent_id.clone()).or_insert_with(|| {
                Err(DispatchError::Connection {
                    agent_id,
                    detail: "call aborted before reporting a result".to_string(),
                })
            });
        }

        outcome
    }
}

async fn call_agent(
    transport: &dyn AgentTransport,
    target: &DispatchTarget,
    request: &TaskRequest,
    progress: &ProgressSink,
    timeout: Duration,
) -> DispatchResult<RawReading> {
    let agent_id = target.agent_id();
    let timed_out = || DispatchError::Timeout {
        agent_id: agent_id.to_string(),
        timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
    };

    let body = match tokio::time::timeout(
        timeout,
        transport.send_task(&target.card, request, progress),
    )
    .await
    {
        Err(_) | Ok(Err(TransportError::Timeout)) => return Err(timed_out()),
        Ok(Err(e)) => {
            return Err(DispatchError::Connection {
                agent_id: agent_id.to_string(),
                detail: e.to_string(),
            })
        }
        Ok(Ok(body)) => body,
    };

    RawReading::parse(target.expected, &body).map_err(|detail| DispatchError::SchemaMismatch {
        agent_id: agent_id.to_string(),
        expected: target.expected.to_string(),
        detail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RadarReading, TargetClass};
    use crate::fakes::{ScriptedAgent, ScriptedTransport};
    use serde_json::json;

    fn target(agent: &ScriptedAgent, id: &str) -> DispatchTarget {
        let doc = match agent.url() {
            url if url.contains("radar") => crate::fakes::radar_card(url),
            url => crate::fakes::visual_card(url),
        };
        let card = AgentCard::from_document(id, doc).unwrap();
        DispatchTarget::for_card(Arc::new(card)).unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_collects_typed_readings() {
        let radar = ScriptedAgent::radar("http://radar", 1000.0, 90.0);
        let visual = ScriptedAgent::visual("http://visual", "drone", 80);
        let targets = vec![target(&radar, "radar_agent"), target(&visual, "visual_agent")];
        let transport = Arc::new(ScriptedTransport::new().with_agent(radar).with_agent(visual));

        let dispatcher = Dispatcher::new(transport.clone(), Duration::from_secs(10));
        let task = Task::new("Alpha Sector", "track", 8).unwrap();
        let outcome = dispatcher
            .dispatch(&task, targets, &CancelToken::never())
            .await;

        let readings = outcome.readings();
        assert_eq!(readings.len(), 2);
        match &readings["radar_agent"] {
            RawReading::Radar(RadarReading { range_meters, .. }) => assert_eq!(*range_meters, 1000.0),
            other => panic!("expected radar reading, got {other:?}"),
        }
        match &readings["visual_agent"] {
            RawReading::Classification(c) => assert_eq!(c.classification, TargetClass::Drone),
            other => panic!("expected classification, got {other:?}"),
        }

        let sent = transport.sent_tasks();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|(_, req)| req.sector_id == "Alpha Sector" && req.priority == 8));
    }

    #[tokio::test]
    async fn test_schema_mismatch_is_isolated() {
        let radar = ScriptedAgent::radar("http://radar", 1000.0, 90.0)
            .replying(json!({"classification": "drone", "certainty_percent": 80}));
        let visual = ScriptedAgent::visual("http://visual", "vessel", 75);
        let targets = vec![target(&radar, "radar_agent"), target(&visual, "visual_agent")];
        let transport = Arc::new(ScriptedTransport::new().with_agent(radar).with_agent(visual));

        let outcome = Dispatcher::new(transport, Duration::from_secs(10))
            .dispatch(
                &Task::new("Alpha Sector", "track", 8).unwrap(),
                targets,
                &CancelToken::never(),
            )
            .await;

        assert!(matches!(
            outcome.results["radar_agent"],
            Err(DispatchError::SchemaMismatch { ref expected, .. }) if expected == "radar"
        ));
        assert!(outcome.results["visual_agent"].is_ok());
        assert_eq!(outcome.failed(), vec!["radar_agent"]);
        assert_eq!(outcome.succeeded(), vec!["visual_agent"]);
    }

    #[tokio::test]
    async fn test_http_status_becomes_connection_error() {
        let radar = ScriptedAgent::radar("http://radar", 1000.0, 90.0).with_status(503);
        let targets = vec![target(&radar, "radar_agent")];
        let transport = Arc::new(ScriptedTransport::new().with_agent(radar));

        let outcome = Dispatcher::new(transport, Duration::from_secs(10))
            .dispatch(
                &Task::new("Alpha Sector", "track", 8).unwrap(),
                targets,
                &CancelToken::never(),
            )
            .await;

        match &outcome.results["radar_agent"] {
            Err(DispatchError::Connection { detail, .. }) => assert!(detail.contains("503")),
            other => panic!("expected connection error, got {other:?}"),
        }
    }

    #[test]
    fn test_configured_skill_picks_the_expected_reading() {
        let mut doc = crate::fakes::radar_card("http://multi");
        doc["skills"] = json!([
            {"id": "visual_classification", "name": "Visual Target Classification"},
            {"id": "radar_detection", "name": "Radar Target Detection"}
        ]);
        let card = Arc::new(AgentCard::from_document("multi_agent", doc).unwrap());

        let default = DispatchTarget::for_card(Arc::clone(&card)).unwrap();
        assert_eq!(default.expected, ReadingKind::Classification);

        let radar =
            DispatchTarget::for_card_with_skill(Arc::clone(&card), Some("radar_detection"))
                .unwrap();
        assert_eq!(radar.expected, ReadingKind::Radar);

        let undeclared =
            DispatchTarget::for_card_with_skill(Arc::clone(&card), Some("thermal_imaging"))
                .unwrap();
        assert_eq!(undeclared.expected, ReadingKind::Classification);
    }

    #[tokio::test]
    async fn test_empty_target_set_returns_empty_outcome() {
        let outcome = Dispatcher::new(Arc::new(ScriptedTransport::new()), Duration::from_secs(1))
            .dispatch(
                &Task::new("Alpha Sector", "track", 8).unwrap(),
                Vec::new(),
                &CancelToken::never(),
            )
            .await;
        assert!(outcome.results.is_empty());
    }
}
