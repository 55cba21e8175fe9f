//! Orchestrator configuration.
//!
//! Loaded from TOML (`from_toml_str` / `from_file`), overlaid from the
//! environment with [`FusionConfig::apply_env`] and checked by
//! [`FusionConfig::validate`]. Nothing else in the library reads the
//! environment.
//!
//! Environment overrides:
//! - `FUSION_AGENTS` - `id=url[|skill],...`, replaces the agent list
//! - `FUSION_DISPATCH_TIMEOUT_SECS`
//! - `FUSION_DISCOVERY_TIMEOUT_SECS`
//! - `FUSION_PRIORITY` - 1 to 10

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::task::{MAX_PRIORITY, MIN_PRIORITY};
use crate::domain::{ConfigError, ConfigResult, RADAR_DETECTION, VISUAL_CLASSIFICATION};
use crate::transport::HttpTransportConfig;

pub const ENV_AGENTS: &str = "FUSION_AGENTS";
pub const ENV_DISPATCH_TIMEOUT: &str = "FUSION_DISPATCH_TIMEOUT_SECS";
pub const ENV_DISCOVERY_TIMEOUT: &str = "FUSION_DISCOVERY_TIMEOUT_SECS";
pub const ENV_PRIORITY: &str = "FUSION_PRIORITY";

/// Where an agent lives and, optionally, the skill it must declare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentEndpoint {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,
}

impl AgentEndpoint {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            skill: None,
        }
    }

    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.skill = Some(skill.into());
        self
    }

    /// Parse `id=url` or `id=url|skill`.
    pub fn parse(entry: &str) -> ConfigResult<Self> {
        let (id, rest) = entry
            .split_once('=')
            .ok_or_else(|| ConfigError::Invalid(format!("agent `{entry}` is not id=url")))?;
        let (url, skill) = match rest.split_once('|') {
            Some((url, skill)) => (url, Some(skill.trim())),
            None => (rest, None),
        };
        let (id, url) = (id.trim(), url.trim());
        if id.is_empty() || url.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "agent `{entry}` has an empty id or url"
            )));
        }

        let mut endpoint = Self::new(id, url);
        if let Some(skill) = skill.filter(|s| !s.is_empty()) {
            endpoint = endpoint.with_skill(skill);
        }
        Ok(endpoint)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    pub agents: Vec<AgentEndpoint>,
    /// Skills that must have at least one contributing agent for a run to succeed.
    pub required_skills: Vec<String>,
    pub discovery_timeout_secs: u64,
    pub dispatch_timeout_secs: u64,
    pub request_type: String,
    pub priority: u8,
    pub card_path: String,
    pub task_path: String,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            agents: vec![
                AgentEndpoint::new("radar_agent", "http://localhost:8001")
                    .with_skill(RADAR_DETECTION),
                AgentEndpoint::new("visual_agent", "http://localhost:8002")
                    .with_skill(VISUAL_CLASSIFICATION),
            ],
            required_skills: vec![
                RADAR_DETECTION.to_string(),
                VISUAL_CLASSIFICATION.to_string(),
            ],
            discovery_timeout_secs: 10,
            dispatch_timeout_secs: 30,
            request_type: "track".to_string(),
            priority: 8,
            card_path: "/card".to_string(),
            task_path: "/process_task".to_string(),
        }
    }
}

impl FusionConfig {
    pub fn from_toml_str(input: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(input)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) -> ConfigResult<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary variable lookup.
    pub fn apply_vars<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(agents) = lookup(ENV_AGENTS) {
            self.agents = agents
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(AgentEndpoint::parse)
                .collect::<ConfigResult<_>>()?;
        }
        if let Some(secs) = lookup(ENV_DISPATCH_TIMEOUT) {
            self.dispatch_timeout_secs = parse_number(ENV_DISPATCH_TIMEOUT, &secs)?;
        }
        if let Some(secs) = lookup(ENV_DISCOVERY_TIMEOUT) {
            self.discovery_timeout_secs = parse_number(ENV_DISCOVERY_TIMEOUT, &secs)?;
        }
        if let Some(priority) = lookup(ENV_PRIORITY) {
            self.priority = parse_number(ENV_PRIORITY, &priority)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.agents.is_empty() {
            return Err(ConfigError::Invalid("no agents configured".to_string()));
        }
        let mut ids = HashSet::new();
        for agent in &self.agents {
            if !ids.insert(agent.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate agent id `{}`",
                    agent.id
                )));
            }
        }
        if self.discovery_timeout_secs == 0 || self.dispatch_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeouts must be at least one second".to_string(),
            ));
        }
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&self.priority) {
            return Err(ConfigError::Invalid(format!(
                "priority {} outside {MIN_PRIORITY}..={MAX_PRIORITY}",
                self.priority
            )));
        }
        Ok(())
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_secs)
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_secs)
    }

    pub fn http_transport_config(&self) -> HttpTransportConfig {
        HttpTransportConfig {
            card_path: self.card_path.clone(),
            task_path: self.task_path.clone(),
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{key}={value} is not a valid number")))
}
