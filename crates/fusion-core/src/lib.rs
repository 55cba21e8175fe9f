//! Fusion Core Library
//!
//! Discovers sensor agents, dispatches one task to all of them concurrently,
//! scores the returned readings and fuses them into a single report.

pub mod config;
pub mod discovery;
pub mod dispatch;
pub mod domain;
pub mod fakes;
pub mod metrics;
pub mod normalize;
pub mod obs;
pub mod orchestrator;
pub mod registry;
pub mod report;
pub mod telemetry;
pub mod transport;
pub mod validate;

pub use config::{AgentEndpoint, FusionConfig};
pub use discovery::{Discovery, DiscoveryReport};
pub use dispatch::events::{cancel_pair, CancelHandle, CancelToken, ProgressSink, TaskEvent};
pub use dispatch::{DispatchOutcome, DispatchTarget, Dispatcher};
pub use domain::{
    AgentCapabilities, AgentCard, AgentFailure, AgentSkill, ClassificationReading, ConfigError,
    DiscoveryError, DispatchError, FusionError, FusionResult, NormalizedTarget, RadarReading,
    RawReading, ReadingKind, SkillKind, TargetClass, TargetFailure, Task, TaskRequest,
    TransportError,
};
pub use normalize::normalize;
pub use orchestrator::FusionOrchestrator;
pub use registry::{AgentRegistry, RegistrySnapshot};
pub use report::{build_report, FusionReport, ReportBuilder};
pub use telemetry::init_tracing;
pub use transport::{AgentTransport, HttpTransport, HttpTransportConfig};
pub use validate::{validate, Recommendation, ValidationResult};

/// Crate version, for `--version` style output.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
