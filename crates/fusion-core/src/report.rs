//! Terminal artifact of a fusion run.
//!
//! Pure assembly: the builder stamps an id and a time and writes the summary
//! sentence. Scores and targets are carried through unchanged.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{AgentFailure, NormalizedTarget, TargetFailure};
use crate::validate::{Recommendation, ValidationResult};

/// The fused report for one sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionReport {
    pub fusion_id: String,
    pub sector_id: String,
    pub targets: Vec<NormalizedTarget>,
    pub summary: String,
    pub quality_score: f64,
    pub recommendation: Recommendation,
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Agents that produced a reading.
    #[serde(default)]
    pub contributors: Vec<String>,
    /// Agents that produced nothing, with the reason.
    #[serde(default)]
    pub failed_agents: Vec<AgentFailure>,
    /// Reading groups that could not be fused.
    #[serde(default)]
    pub failures: Vec<TargetFailure>,
    pub timestamp: DateTime<Utc>,
}

impl FusionReport {
    pub fn is_rejected(&self) -> bool {
        self.recommendation == Recommendation::Reject
    }
}

/// `RPT-` followed by eight lowercase hex digits.
pub fn new_fusion_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("RPT-{}", &hex[..8])
}

#[derive(Debug, Clone)]
pub struct ReportBuilder {
    fusion_id: String,
    sector_id: String,
    targets: Vec<NormalizedTarget>,
    validation: ValidationResult,
    contributors: Vec<String>,
    failed_agents: Vec<AgentFailure>,
    failures: Vec<TargetFailure>,
}

impl ReportBuilder {
    pub fn new(
        sector_id: impl Into<String>,
        targets: Vec<NormalizedTarget>,
        validation: ValidationResult,
    ) -> Self {
        Self {
            fusion_id: new_fusion_id(),
            sector_id: sector_id.into(),
            targets,
            validation,
            contributors: Vec::new(),
            failed_agents: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Use a pre-allocated id, e.g. one already attached to the run's span.
    pub fn fusion_id(mut self, fusion_id: impl Into<String>) -> Self {
        self.fusion_id = fusion_id.into();
        self
    }

    pub fn contributors(mut self, contributors: Vec<String>) -> Self {
        self.contributors = contributors;
        self
    }

    pub fn failed_agents(mut self, failed_agents: Vec<AgentFailure>) -> Self {
        self.failed_agents = failed_agents;
        self
    }

    pub fn failures(mut self, failures: Vec<TargetFailure>) -> Self {
        self.failures = failures;
        self
    }

    pub fn build(self) -> FusionReport {
        let summary = summarize(
            &self.sector_id,
            &self.targets,
            &self.contributors,
            &self.failed_agents,
        );
        FusionReport {
            fusion_id: self.fusion_id,
            sector_id: self.sector_id,
            targets: self.targets,
            summary,
            quality_score: self.validation.quality_score,
            recommendation: self.validation.recommendation,
            warnings: self.validation.warnings,
            contributors: self.contributors,
            failed_agents: self.failed_agents,
            failures: self.failures,
            timestamp: Utc::now(),
        }
    }
}

/// Assemble a report with no agent bookkeeping.
pub fn build_report(
    sector_id: &str,
    targets: Vec<NormalizedTarget>,
    validation: &ValidationResult,
) -> FusionReport {
    ReportBuilder::new(sector_id, targets, validation.clone()).build()
}

fn describe(target: &NormalizedTarget) -> String {
    format!(
        "{} target at position ({:?}, {:?}) with {:.0}% confidence",
        target.target_type,
        target.x,
        target.y,
        target.confidence * 100.0
    )
}

fn summarize(
    sector_id: &str,
    targets: &[NormalizedTarget],
    contributors: &[String],
    failed: &[AgentFailure],
) -> String {
    let mut summary = match targets {
        [] => format!("No targets fused for {sector_id}."),
        [only] => format!(
            "Track successful for {sector_id}. Detected 1 {}.",
            describe(only)
        ),
        many => {
            let listed: Vec<String> = many.iter().map(describe).collect();
            format!(
                "Track successful for {sector_id}. Detected {} targets: {}.",
                many.len(),
                listed.join("; ")
            )
        }
    };

    if !contributors.is_empty() {
        let _ = write!(summary, " Contributing agents: {}.", contributors.join(", "));
    }
    if !failed.is_empty() {
        let ids: Vec<&str> = failed.iter().map(|f| f.agent_id.as_str()).collect();
        let _ = write!(summary, " No data from: {}.", ids.join(", "));
    }
    summary
}
