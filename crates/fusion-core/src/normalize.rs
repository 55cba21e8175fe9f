//! Fusion transform: radar polar coordinates plus a classification become one
//! [`NormalizedTarget`].
//!
//! [`normalize`] is the pure two-reading transform. [`group_readings`] and
//! [`fuse_group`] lift it to an arbitrary set of agent readings so further
//! modalities only touch this module.

use std::collections::BTreeMap;

use crate::domain::{
    ClassificationReading, FusionError, FusionResult, NormalizedTarget, RadarReading, RawReading,
    ReadingKind,
};

/// Round to two decimals for presentation; `-0.0` collapses to `0.0`.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0 + 0.0
}

/// Convert one radar reading and one classification into a target.
///
/// Azimuth 0° lies on +x and grows counter-clockwise. Position and confidence
/// are rounded to two decimals; confidence is clamped to `[0, 1]`.
pub fn normalize(radar: &RadarReading, classification: &ClassificationReading) -> NormalizedTarget {
    let azimuth = radar.azimuth_degrees.to_radians();
    let x = radar.range_meters * azimuth.cos();
    let y = radar.range_meters * azimuth.sin();

    let confidence = (f64::from(classification.certainty_percent) / 100.0).clamp(0.0, 1.0);

    NormalizedTarget {
        x: round2(x),
        y: round2(y),
        target_type: classification.classification.label().to_uppercase(),
        confidence: round2(confidence),
        source_agents: Vec::new(),
    }
}

/// Readings destined for a single target, tagged with the agent that produced each.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingGroup {
    pub index: usize,
    pub readings: Vec<(String, RawReading)>,
}

impl ReadingGroup {
    fn first_of(&self, kind: ReadingKind) -> Option<&(String, RawReading)> {
        self.readings.iter().find(|(_, r)| r.kind() == kind)
    }

    pub fn agent_ids(&self) -> Vec<String> {
        self.readings.iter().map(|(id, _)| id.clone()).collect()
    }
}

/// Pair readings into target groups.
///
/// Within each modality readings are ordered by agent id; the i-th radar
/// reading joins the i-th classification. Surplus readings of either kind
/// form incomplete groups, which [`fuse_group`] reports as failures.
pub fn group_readings(readings: &BTreeMap<String, RawReading>) -> Vec<ReadingGroup> {
    let radar: Vec<_> = readings
        .iter()
        .filter(|(_, r)| r.kind() == ReadingKind::Radar)
        .collect();
    let classifications: Vec<_> = readings
        .iter()
        .filter(|(_, r)| r.kind() == ReadingKind::Classification)
        .collect();

    let count = radar.len().max(classifications.len());
    (0..count)
        .map(|index| {
            let readings = [radar.get(index), classifications.get(index)]
                .into_iter()
                .flatten()
                .map(|&(id, r)| (id.clone(), r.clone()))
                .collect();
            ReadingGroup { index, readings }
        })
        .collect()
}

/// The radar and classification pair of a group, or the kind that is missing.
pub fn pair_of(group: &ReadingGroup) -> FusionResult<(&RadarReading, &ClassificationReading)> {
    let radar = match group.first_of(ReadingKind::Radar) {
        Some((_, RawReading::Radar(r))) => r,
        _ => {
            return Err(FusionError::MissingReading {
                group: group.index,
                kind: ReadingKind::Radar.to_string(),
            })
        }
    };
    let classification = match group.first_of(ReadingKind::Classification) {
        Some((_, RawReading::Classification(c))) => c,
        _ => {
            return Err(FusionError::MissingReading {
                group: group.index,
                kind: ReadingKind::Classification.to_string(),
            })
        }
    };
    Ok((radar, classification))
}

/// Fuse a group into a target that names its contributing agents.
pub fn fuse_group(group: &ReadingGroup) -> FusionResult<NormalizedTarget> {
    let (radar, classification) = pair_of(group)?;
    let mut target = normalize(radar, classification);
    target.source_agents = group.agent_ids();
    Ok(target)
}
