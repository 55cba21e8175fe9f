//! Error taxonomy for the fusion pipeline.
//!
//! Per-agent failures ([`DiscoveryError`], [`DispatchError`]) are recovered by
//! the caller and recorded against the agent. [`FusionError`] is fatal to a
//! single target, or to the whole run for coverage and cancellation failures.

use thiserror::Error;

/// Errors raised by an [`AgentTransport`](crate::transport::AgentTransport).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out")]
    Timeout,

    #[error("agent returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else {
            TransportError::Connect(err.to_string())
        }
    }
}

/// Errors produced while discovering a single agent.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("agent at {endpoint} is unreachable: {detail}")]
    Unreachable { endpoint: String, detail: String },

    #[error("agent at {endpoint} published a malformed card: {detail}")]
    MalformedCard { endpoint: String, detail: String },

    #[error("agent {agent_id} does not declare required skill {skill}")]
    MissingSkill { agent_id: String, skill: String },
}

/// Errors produced by a single agent call during dispatch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("agent {agent_id} timed out after {timeout_ms}ms")]
    Timeout { agent_id: String, timeout_ms: u64 },

    #[error("agent {agent_id} connection failed: {detail}")]
    Connection { agent_id: String, detail: String },

    #[error("agent {agent_id} response does not match {expected} schema: {detail}")]
    SchemaMismatch {
        agent_id: String,
        expected: String,
        detail: String,
    },

    #[error("call to agent {agent_id} was cancelled")]
    Cancelled { agent_id: String },
}

impl DispatchError {
    pub fn agent_id(&self) -> &str {
        match self {
            DispatchError::Timeout { agent_id, .. }
            | DispatchError::Connection { agent_id, .. }
            | DispatchError::SchemaMismatch { agent_id, .. }
            | DispatchError::Cancelled { agent_id } => agent_id,
        }
    }
}

/// Errors fatal to a fusion target or a fusion run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FusionError {
    #[error("target group {group} is missing a {kind} reading")]
    MissingReading { group: usize, kind: String },

    #[error(
        "insufficient sensor coverage: no provider for {missing_skills:?} \
         (contributed: {contributors:?}, failed: {failed:?})"
    )]
    InsufficientCoverage {
        missing_skills: Vec<String>,
        contributors: Vec<String>,
        failed: Vec<String>,
    },

    #[error("invalid task: {0}")]
    InvalidTask(String),

    #[error("fusion run was cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type TransportResult<T> = std::result::Result<T, TransportError>;
pub type DiscoveryResult<T> = std::result::Result<T, DiscoveryError>;
pub type DispatchResult<T> = std::result::Result<T, DispatchError>;
pub type FusionResult<T> = std::result::Result<T, FusionError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_error_exposes_agent_id() {
        let err = DispatchError::Timeout {
            agent_id: "radar_agent".to_string(),
            timeout_ms: 30_000,
        };
        assert_eq!(err.agent_id(), "radar_agent");
        assert!(err.to_string().contains("30000ms"));

        let err = DispatchError::Cancelled {
            agent_id: "visual_agent".to_string(),
        };
        assert_eq!(err.agent_id(), "visual_agent");
    }

    #[test]
    fn test_insufficient_coverage_names_missing_skill_and_agents() {
        let err = FusionError::InsufficientCoverage {
            missing_skills: vec!["visual_classification".to_string()],
            contributors: vec!["radar_agent".to_string()],
            failed: vec!["visual_agent".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("insufficient sensor coverage"));
        assert!(msg.contains("visual_classification"));
        assert!(msg.contains("radar_agent"));
        assert!(msg.contains("visual_agent"));
    }

    #[test]
    fn test_missing_skill_error_display() {
        let err = DiscoveryError::MissingSkill {
            agent_id: "radar_agent".to_string(),
            skill: "radar_detection".to_string(),
        };
        assert!(err.to_string().contains("radar_detection"));
    }
}
