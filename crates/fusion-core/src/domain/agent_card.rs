//! Agent cards: the capability descriptor each agent publishes for discovery.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::reading::ReadingKind;

/// Skill id advertised by radar agents.
pub const RADAR_DETECTION: &str = "radar_detection";
/// Skill id advertised by visual classification agents.
pub const VISUAL_CLASSIFICATION: &str = "visual_classification";

/// Known skill kinds, with a fallback for ids this orchestrator does not fuse.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SkillKind {
    RadarDetection,
    VisualClassification,
    Custom(String),
}

impl SkillKind {
    pub fn from_id(id: &str) -> Self {
        match id {
            RADAR_DETECTION => SkillKind::RadarDetection,
            VISUAL_CLASSIFICATION => SkillKind::VisualClassification,
            other => SkillKind::Custom(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SkillKind::RadarDetection => RADAR_DETECTION,
            SkillKind::VisualClassification => VISUAL_CLASSIFICATION,
            SkillKind::Custom(id) => id,
        }
    }

    /// The reading an agent with this skill is expected to return.
    pub fn reading_kind(&self) -> Option<ReadingKind> {
        match self {
            SkillKind::RadarDetection => Some(ReadingKind::Radar),
            SkillKind::VisualClassification => Some(ReadingKind::Classification),
            SkillKind::Custom(_) => None,
        }
    }
}

impl fmt::Display for SkillKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single declared skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSkill {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Declared input schema, free-form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_format: Option<String>,
    /// Declared output schema, free-form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl AgentSkill {
    pub fn kind(&self) -> SkillKind {
        SkillKind::from_id(&self.id)
    }
}

/// Operating limits and protocol features of an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCapabilities {
    #[serde(default)]
    pub streaming: bool,
    #[serde(default)]
    pub cancellable: bool,
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: u32,
    #[serde(default)]
    pub average_response_time_ms: u64,
}

fn default_max_concurrent_tasks() -> u32 {
    1
}

impl Default for AgentCapabilities {
    fn default() -> Self {
        Self {
            streaming: false,
            cancellable: false,
            max_concurrent_tasks: default_max_concurrent_tasks(),
            average_response_time_ms: 0,
        }
    }
}

/// Immutable descriptor of an agent, keyed in the registry by `id`.
///
/// The `id` is not part of the published document; discovery assigns it from
/// the endpoint the card was fetched from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCard {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub version: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub skills: Vec<AgentSkill>,
    #[serde(default)]
    pub capabilities: AgentCapabilities,
}

impl AgentCard {
    /// Parse a published card document and bind it to `agent_id`.
    ///
    /// Skills repeated under the same id keep their first declaration.
    pub fn from_document(
        agent_id: &str,
        document: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        let mut card: AgentCard = serde_json::from_value(document)?;
        card.id = agent_id.to_string();
        let mut seen = std::collections::HashSet::new();
        card.skills.retain(|s| seen.insert(s.id.clone()));
        Ok(card)
    }

    /// Whether the card declares a skill with this id.
    pub fn declares(&self, skill_id: &str) -> bool {
        self.skills.iter().any(|s| s.id == skill_id)
    }

    pub fn skill_kinds(&self) -> impl Iterator<Item = SkillKind> + '_ {
        self.skills.iter().map(AgentSkill::kind)
    }

    /// The first reading kind this agent can produce, in declaration order.
    pub fn reading_kind(&self) -> Option<ReadingKind> {
        self.skill_kinds().find_map(|k| k.reading_kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn radar_document() -> serde_json::Value {
        json!({
            "name": "Radar Sensor Agent",
            "version": "1.0.0",
            "url": "http://localhost:8001",
            "skills": [{
                "id": "radar_detection",
                "name": "Radar Target Detection",
                "description": "Detects and tracks targets using radar",
                "input_format": "A2ATask (sector_id, request_type)",
                "output_format": "RadarData (range_meters, azimuth_degrees)",
                "tags": ["radar", "sensor", "tracking"]
            }],
            "capabilities": {
                "streaming": false,
                "cancellable": false,
                "max_concurrent_tasks": 10,
                "average_response_time_ms": 50
            }
        })
    }

    #[test]
    fn test_card_parses_and_binds_agent_id() {
        let card = AgentCard::from_document("radar_agent", radar_document()).unwrap();
        assert_eq!(card.id, "radar_agent");
        assert_eq!(card.name, "Radar Sensor Agent");
        assert!(card.declares(RADAR_DETECTION));
        assert!(!card.declares(VISUAL_CLASSIFICATION));
        assert_eq!(card.capabilities.max_concurrent_tasks, 10);
        assert_eq!(card.reading_kind(), Some(ReadingKind::Radar));
    }

    #[test]
    fn test_card_without_capabilities_uses_defaults() {
        let mut doc = radar_document();
        doc.as_object_mut().unwrap().remove("capabilities");
        let card = AgentCard::from_document("radar_agent", doc).unwrap();
        assert_eq!(card.capabilities, AgentCapabilities::default());
    }

    #[test]
    fn test_card_missing_name_is_rejected() {
        let mut doc = radar_document();
        doc.as_object_mut().unwrap().remove("name");
        assert!(AgentCard::from_document("radar_agent", doc).is_err());
    }

    #[test]
    fn test_duplicate_skill_ids_collapse() {
        let mut doc = radar_document();
        let skill = doc["skills"][0].clone();
        doc["skills"].as_array_mut().unwrap().push(skill);
        let card = AgentCard::from_document("radar_agent", doc).unwrap();
        assert_eq!(card.skills.len(), 1);
    }

    #[test]
    fn test_skill_kind_round_trips_known_ids_and_keeps_custom() {
        assert_eq!(SkillKind::from_id("radar_detection"), SkillKind::RadarDetection);
        assert_eq!(
            SkillKind::from_id("visual_classification").reading_kind(),
            Some(ReadingKind::Classification)
        );
        let custom = SkillKind::from_id("thermal_imaging");
        assert_eq!(custom.as_str(), "thermal_imaging");
        assert_eq!(custom.reading_kind(), None);
    }
}
