//! Raw sensor readings as returned by agents, one variant per modality.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The modality a dispatched agent is expected to answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingKind {
    Radar,
    Classification,
}

impl fmt::Display for ReadingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadingKind::Radar => f.write_str("radar"),
            ReadingKind::Classification => f.write_str("classification"),
        }
    }
}

/// Polar detection relative to the radar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarReading {
    pub range_meters: f64,
    pub azimuth_degrees: f64,
    #[serde(default, rename = "timestamp", skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<String>,
}

impl RadarReading {
    pub fn new(range_meters: f64, azimuth_degrees: f64) -> Self {
        Self {
            range_meters,
            azimuth_degrees,
            captured_at: None,
        }
    }
}

/// Target categories a classifier may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetClass {
    Drone,
    Aircraft,
    Vessel,
    Unknown,
}

impl TargetClass {
    pub fn label(&self) -> &'static str {
        match self {
            TargetClass::Drone => "drone",
            TargetClass::Aircraft => "aircraft",
            TargetClass::Vessel => "vessel",
            TargetClass::Unknown => "unknown",
        }
    }
}

/// Classifier output with an integer certainty in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReading {
    pub classification: TargetClass,
    pub certainty_percent: u8,
    #[serde(default, rename = "timestamp", skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<String>,
}

impl ClassificationReading {
    pub fn new(classification: TargetClass, certainty_percent: u8) -> Self {
        Self {
            classification,
            certainty_percent,
            captured_at: None,
        }
    }
}

/// A reading from exactly one agent call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawReading {
    Radar(RadarReading),
    Classification(ClassificationReading),
}

impl RawReading {
    pub fn kind(&self) -> ReadingKind {
        match self {
            RawReading::Radar(_) => ReadingKind::Radar,
            RawReading::Classification(_) => ReadingKind::Classification,
        }
    }

    /// Decode an agent response body as the expected modality.
    ///
    /// A body carrying an `error` field, a body of the wrong shape and a
    /// certainty above 100 are all rejected with a description of the mismatch.
    pub fn parse(expected: ReadingKind, body: &str) -> Result<Self, String> {
        let value: serde_json::Value =
            serde_json::from_str(body).map_err(|e| format!("invalid JSON: {e}"))?;

        if let Some(err) = value.get("error") {
            return Err(format!("agent reported error: {err}"));
        }

        match expected {
            ReadingKind::Radar => {
                let reading: RadarReading =
                    serde_json::from_value(value).map_err(|e| e.to_string())?;
                if !reading.range_meters.is_finite() || !reading.azimuth_degrees.is_finite() {
                    return Err("range and azimuth must be finite".to_string());
                }
                Ok(RawReading::Radar(reading))
            }
            ReadingKind::Classification => {
                let reading: ClassificationReading =
                    serde_json::from_value(value).map_err(|e| e.to_string())?;
                if reading.certainty_percent > 100 {
                    return Err(format!(
                        "certainty_percent {} exceeds 100",
                        reading.certainty_percent
                    ));
                }
                Ok(RawReading::Classification(reading))
            }
        }
    }
}
