//! Structured observability hooks for fusion run lifecycle events.
//!
//! This module provides:
//! - A run-scoped tracing span via the `FusionSpan` RAII guard
//! - Emission functions for discovery, dispatch, validation and report events
//!
//! Events are emitted at `info!` level (configurable via `FUSION_LOG` or
//! `RUST_LOG`); failures and rejected batches are emitted at `warn!`.

use tracing::{info, warn};

use crate::domain::{DiscoveryError, DispatchError, ReadingKind};
use crate::validate::{Recommendation, ValidationResult};

/// RAII guard that enters a fusion-scoped tracing span for the duration of a run.
///
/// # Example
///
/// ```ignore
/// let _span = FusionSpan::enter("RPT-1A2B3C4D", "Alpha Sector");
/// // every tracing call now carries fusion_id and sector_id
/// ```
pub struct FusionSpan {
    _span: tracing::span::EnteredSpan,
}

impl FusionSpan {
    /// Create and enter a span tagged with the fusion and sector ids.
    pub fn enter(fusion_id: &str, sector_id: &str) -> Self {
        let span = tracing::info_span!(
            "fusion.run",
            fusion_id = %fusion_id,
            sector_id = %sector_id
        );
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: an agent card was fetched and registered.
pub fn emit_agent_registered(agent_id: &str, endpoint: &str, skills: &[String]) {
    info!(
        event = "discovery.agent_registered",
        agent_id = %agent_id,
        endpoint = %endpoint,
        skills = ?skills,
    );
}

/// Emit event: discovery of one agent failed (warning level).
pub fn emit_agent_failed(agent_id: &str, error: &DiscoveryError) {
    warn!(event = "discovery.agent_failed", agent_id = %agent_id, error = %error);
}

/// Emit event: a required skill has no registered provider.
pub fn emit_coverage_gap(skill: &str) {
    warn!(event = "discovery.coverage_gap", skill = %skill);
}

/// Emit event: an agent answered with a well-formed reading.
pub fn emit_dispatch_completed(agent_id: &str, kind: ReadingKind) {
    info!(event = "dispatch.completed", agent_id = %agent_id, kind = %kind);
}

/// Emit event: an agent call ended in a dispatch error (warning level).
pub fn emit_dispatch_failed(agent_id: &str, error: &DispatchError) {
    warn!(event = "dispatch.failed", agent_id = %agent_id, error = %error);
}

/// Emit event: batch validation finished. A `REJECT` is logged at warn level.
pub fn emit_validation_completed(result: &ValidationResult) {
    if result.recommendation == Recommendation::Reject {
        warn!(
            event = "validation.completed",
            quality_score = result.quality_score,
            recommendation = ?result.recommendation,
            warnings = ?result.warnings,
            "readings rejected by validator; continuing with fusion"
        );
    } else {
        info!(
            event = "validation.completed",
            quality_score = result.quality_score,
            recommendation = ?result.recommendation,
            warnings = result.warnings.len(),
        );
    }
}

/// Emit event: the terminal report was assembled.
pub fn emit_report_built(fusion_id: &str, sector_id: &str, targets: usize, quality_score: f64) {
    info!(
        event = "fusion.report_built",
        fusion_id = %fusion_id,
        sector_id = %sector_id,
        targets = targets,
        quality_score = quality_score,
    );
}
