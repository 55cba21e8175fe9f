//! The canonical fused target record.

use serde::{Deserialize, Serialize};

/// A target in Cartesian metres with the radar at the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTarget {
    #[serde(rename = "x_pos")]
    pub x: f64,
    #[serde(rename = "y_pos")]
    pub y: f64,
    /// Upper-cased classification label, e.g. `DRONE`.
    pub target_type: String,
    /// Classifier certainty scaled to `[0, 1]`.
    pub confidence: f64,
    /// Agents whose readings were fused into this target.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_agents: Vec<String>,
}
