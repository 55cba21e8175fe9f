//! Data-quality scoring for a radar/classification pair.
//!
//! The score starts at 100 and each check deducts independently, floored at
//! zero. The result is advisory: a `Reject` recommendation is logged and
//! flagged on the report but never stops normalization.

use serde::{Deserialize, Serialize};

use crate::domain::{ClassificationReading, RadarReading};

pub const MAX_QUALITY_SCORE: f64 = 100.0;
/// Ranges beyond this are plausible but unusual for the sensor.
pub const TYPICAL_DETECTION_LIMIT_METERS: f64 = 10_000.0;

const NEGATIVE_RANGE_PENALTY: f64 = 50.0;
const EXCESSIVE_RANGE_PENALTY: f64 = 10.0;
const AZIMUTH_PENALTY: f64 = 30.0;
const LOW_CONFIDENCE_PENALTY: f64 = 20.0;
const MODERATE_CONFIDENCE_PENALTY: f64 = 10.0;

const LOW_CONFIDENCE_BELOW: u8 = 50;
const MODERATE_CONFIDENCE_BELOW: u8 = 70;

const ACCEPT_ABOVE: f64 = 70.0;
const REVIEW_ABOVE: f64 = 30.0;

/// What downstream consumers should do with a batch of readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Accept,
    Review,
    Reject,
}

impl Recommendation {
    /// `> 70` accepts, `(30, 70]` asks for review, `<= 30` rejects.
    pub fn from_score(score: f64) -> Self {
        if score > ACCEPT_ABOVE {
            Recommendation::Accept
        } else if score > REVIEW_ABOVE {
            Recommendation::Review
        } else {
            Recommendation::Reject
        }
    }
}

/// Quality verdict for one or more reading pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub quality_score: f64,
    /// Warnings in the order the checks raised them.
    pub warnings: Vec<String>,
    pub recommendation: Recommendation,
}

impl ValidationResult {
    fn from_parts(score: f64, warnings: Vec<String>) -> Self {
        let quality_score = score.max(0.0);
        Self {
            quality_score,
            warnings,
            recommendation: Recommendation::from_score(quality_score),
        }
    }

    /// True without warnings, or while the score stays above the reject line.
    ///
    /// Warnings alone do not invalidate a batch; only `Reject` does.
    pub fn is_valid(&self) -> bool {
        self.warnings.is_empty() || self.quality_score > REVIEW_ABOVE
    }

    /// Fold per-target results into one batch verdict.
    ///
    /// The batch scores as its weakest member; warnings are concatenated in
    /// input order. An empty batch is rejected outright.
    pub fn combine(results: &[ValidationResult]) -> Self {
        if results.is_empty() {
            return Self::from_parts(0.0, vec!["no complete reading groups".to_string()]);
        }

        let score = results
            .iter()
            .map(|r| r.quality_score)
            .fold(MAX_QUALITY_SCORE, f64::min);
        let warnings = results
            .iter()
            .flat_map(|r| r.warnings.iter().cloned())
            .collect();
        Self::from_parts(score, warnings)
    }
}

/// Score the joint plausibility of a radar reading and a classification.
pub fn validate(radar: &RadarReading, classification: &ClassificationReading) -> ValidationResult {
    let mut score = MAX_QUALITY_SCORE;
    let mut warnings = Vec::new();

    if radar.range_meters < 0.0 {
        score -= NEGATIVE_RANGE_PENALTY;
        warnings.push("negative range detected - invalid reading".to_string());
    } else if radar.range_meters > TYPICAL_DETECTION_LIMIT_METERS {
        score -= EXCESSIVE_RANGE_PENALTY;
        warnings.push("range exceeds typical detection limit".to_string());
    }

    if !(0.0..=360.0).contains(&radar.azimuth_degrees) {
        score -= AZIMUTH_PENALTY;
        warnings.push("azimuth out of range (0-360 degrees)".to_string());
    }

    let certainty = classification.certainty_percent;
    if certainty < LOW_CONFIDENCE_BELOW {
        score -= LOW_CONFIDENCE_PENALTY;
        warnings.push("low confidence in visual classification".to_string());
    } else if certainty < MODERATE_CONFIDENCE_BELOW {
        score -= MODERATE_CONFIDENCE_PENALTY;
        warnings.push("moderate confidence in visual classification".to_string());
    }

    ValidationResult::from_parts(score, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TargetClass;

    fn run(range: f64, azimuth: f64, certainty: u8) -> ValidationResult {
        validate(
            &RadarReading::new(range, azimuth),
            &ClassificationReading::new(TargetClass::Drone, certainty),
        )
    }

    #[test]
    fn test_clean_readings_accept() {
        let result = run(1000.0, 90.0, 80);
        assert_eq!(result.quality_score, 100.0);
        assert!(result.warnings.is_empty());
        assert_eq!(result.recommendation, Recommendation::Accept);
        assert!(result.is_valid());
    }

    #[test]
    fn test_negative_range_is_reviewed() {
        let result = run(-1.0, 0.0, 100);
        assert_eq!(result.quality_score, 50.0);
        assert!(result.warnings.iter().any(|w| w.contains("negative range")));
        assert_eq!(result.recommendation, Recommendation::Review);
    }

    #[test]
    fn test_azimuth_and_low_confidence_deductions_add_up() {
        let result = run(500.0, 400.0, 40);
        assert_eq!(result.quality_score, 50.0);
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings[0].contains("azimuth out of range"));
        assert!(result.warnings[1].contains("low confidence"));
        assert_eq!(result.recommendation, Recommendation::Review);
    }

    #[test]
    fn test_range_beyond_detection_limit() {
        let result = run(12_000.0, 45.0, 90);
        assert_eq!(result.quality_score, 90.0);
        assert!(result.warnings[0].contains("exceeds typical detection limit"));
        assert_eq!(result.recommendation, Recommendation::Accept);
    }

    #[test]
    fn test_moderate_confidence_band() {
        assert_eq!(run(100.0, 10.0, 50).quality_score, 90.0);
        assert_eq!(run(100.0, 10.0, 69).quality_score, 90.0);
        assert_eq!(run(100.0, 10.0, 70).quality_score, 100.0);
        assert!(run(100.0, 10.0, 69).warnings[0].contains("moderate confidence"));
    }

    #[test]
    fn test_azimuth_boundaries_inclusive() {
        assert!(run(100.0, 0.0, 90).warnings.is_empty());
        assert!(run(100.0, 360.0, 90).warnings.is_empty());
        assert_eq!(run(100.0, -0.5, 90).quality_score, 70.0);
    }

    #[test]
    fn test_worst_case_rejects_and_floors_at_zero() {
        let result = run(-10.0, 720.0, 10);
        assert_eq!(result.quality_score, 0.0);
        assert_eq!(result.warnings.len(), 3);
        assert_eq!(result.recommendation, Recommendation::Reject);
        assert!(!result.is_valid());
    }

    #[test]
    fn test_score_seventy_is_review_not_accept() {
        let result = run(100.0, 400.0, 90);
        assert_eq!(result.quality_score, 70.0);
        assert_eq!(result.recommendation, Recommendation::Review);
    }

    #[test]
    fn test_validity_stays_true_with_warnings_above_reject_line() {
        // Deliberately loose: warnings do not invalidate a batch scoring above 30.
        let result = run(-1.0, 0.0, 60);
        assert_eq!(result.quality_score, 40.0);
        assert!(!result.warnings.is_empty());
        assert_eq!(result.recommendation, Recommendation::Review);
        assert!(result.is_valid());

        let at_line = run(-1.0, 0.0, 40);
        assert_eq!(at_line.quality_score, 30.0);
        assert_eq!(at_line.recommendation, Recommendation::Reject);
        assert!(!at_line.is_valid());
    }

    #[test]
    fn test_combine_takes_weakest_score_and_all_warnings() {
        let a = run(1000.0, 90.0, 80);
        let b = run(500.0, 400.0, 40);
        let combined = ValidationResult::combine(&[a, b]);
        assert_eq!(combined.quality_score, 50.0);
        assert_eq!(combined.warnings.len(), 2);
        assert_eq!(combined.recommendation, Recommendation::Review);
    }

    #[test]
    fn test_combine_empty_rejects() {
        let combined = ValidationResult::combine(&[]);
        assert_eq!(combined.quality_score, 0.0);
        assert_eq!(combined.recommendation, Recommendation::Reject);
    }

    #[test]
    fn test_recommendation_wire_form() {
        assert_eq!(
            serde_json::to_string(&Recommendation::Accept).unwrap(),
            "\"ACCEPT\""
        );
    }
}
