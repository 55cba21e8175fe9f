//! Domain models for the fusion pipeline.
//!
//! - `AgentCard`: capability descriptor published by an agent
//! - `Task` / `TaskRequest`: the per-run task and its wire form
//! - `RawReading`: modality-tagged agent output
//! - `NormalizedTarget`: the fused, canonical target record
//! - `AgentFailure` / `TargetFailure`: what did not make it into a report

pub mod agent_card;
pub mod error;
pub mod outcome;
pub mod reading;
pub mod target;
pub mod task;

pub use agent_card::{
    AgentCapabilities, AgentCard, AgentSkill, SkillKind, RADAR_DETECTION, VISUAL_CLASSIFICATION,
};
pub use error::{
    ConfigError, ConfigResult, DiscoveryError, DiscoveryResult, DispatchError, DispatchResult,
    FusionError, FusionResult, TransportError, TransportResult,
};
pub use outcome::{AgentFailure, TargetFailure};
pub use reading::{ClassificationReading, RadarReading, RawReading, ReadingKind, TargetClass};
pub use target::NormalizedTarget;
pub use task::{Task, TaskRequest};
