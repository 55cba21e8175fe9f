//! Per-agent and per-target failure records carried on a fusion report.

use serde::{Deserialize, Serialize};

use crate::domain::error::{DispatchError, FusionError};

/// An agent that produced no reading for the run, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentFailure {
    pub agent_id: String,
    pub reason: String,
}

impl AgentFailure {
    pub fn new(agent_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            reason: reason.into(),
        }
    }
}

impl From<&DispatchError> for AgentFailure {
    fn from(err: &DispatchError) -> Self {
        Self::new(err.agent_id(), err.to_string())
    }
}

/// A reading group that could not be fused into a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetFailure {
    pub group: usize,
    /// Agents whose readings were in the group.
    pub agents: Vec<String>,
    pub reason: String,
}

impl TargetFailure {
    pub fn new(group: usize, agents: Vec<String>, error: &FusionError) -> Self {
        Self {
            group,
            agents,
            reason: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_failure_from_dispatch_error() {
        let err = DispatchError::Timeout {
            agent_id: "visual_agent".to_string(),
            timeout_ms: 30_000,
        };
        let failure = AgentFailure::from(&err);
        assert_eq!(failure.agent_id, "visual_agent");
        assert!(failure.reason.contains("timed out"));
    }

    #[test]
    fn test_target_failure_keeps_reason_text() {
        let err = FusionError::MissingReading {
            group: 1,
            kind: "classification".to_string(),
        };
        let failure = TargetFailure::new(1, vec!["radar_b".to_string()], &err);
        assert_eq!(failure.group, 1);
        assert!(failure.reason.contains("classification"));
    }
}
