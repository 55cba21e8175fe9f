use std::sync::Arc;
use std::time::Duration;

use fusion_core::domain::{DiscoveryError, RADAR_DETECTION, VISUAL_CLASSIFICATION};
use fusion_core::fakes::{radar_card, ScriptedAgent, ScriptedTransport};
use fusion_core::{AgentEndpoint, AgentRegistry, Discovery};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn endpoints() -> Vec<AgentEndpoint> {
    vec![
        AgentEndpoint::new("radar_agent", "http://radar:8001").with_skill(RADAR_DETECTION),
        AgentEndpoint::new("visual_agent", "http://visual:8002").with_skill(VISUAL_CLASSIFICATION),
    ]
}

fn discovery(transport: Arc<ScriptedTransport>, registry: AgentRegistry) -> Discovery {
    Discovery::new(
        transport,
        registry,
        Duration::from_secs(10),
        vec![RADAR_DETECTION.to_string(), VISUAL_CLASSIFICATION.to_string()],
    )
}

// ---------------------------------------------------------------------------
// Re-discovery
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rediscovery_replaces_card_without_duplicates() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .with_agent(ScriptedAgent::radar("http://radar:8001", 1000.0, 90.0))
            .with_agent(ScriptedAgent::visual("http://visual:8002", "drone", 80)),
    );
    let registry = AgentRegistry::new();
    let d = discovery(transport.clone(), registry.clone());

    let first = d.discover_all(&endpoints()).await;
    assert!(first.is_complete());
    assert_eq!(registry.len().await, 2);
    let before = registry.snapshot().await;

    let mut upgraded = radar_card("http://radar:8001");
    upgraded["version"] = "2.0.0".into();
    transport.set_agent(ScriptedAgent::new("http://radar:8001", upgraded));

    let second = d.discover_all(&endpoints()).await;
    assert_eq!(second.registered, vec!["radar_agent", "visual_agent"]);
    assert_eq!(registry.len().await, 2);
    assert_eq!(
        registry.get("radar_agent").await.expect("radar registered").version,
        "2.0.0"
    );

    // A snapshot taken before re-discovery keeps the card it saw.
    assert_eq!(before.get("radar_agent").expect("radar in snapshot").version, "1.0.0");
}

// ---------------------------------------------------------------------------
// Partial failure
// ---------------------------------------------------------------------------

#[tokio::test]
async fn one_failed_agent_does_not_block_the_others() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .with_agent(ScriptedAgent::radar("http://radar:8001", 1000.0, 90.0).unreachable())
            .with_agent(ScriptedAgent::visual("http://visual:8002", "drone", 80)),
    );
    let registry = AgentRegistry::new();
    let report = discovery(transport, registry.clone())
        .discover_all(&endpoints())
        .await;

    assert_eq!(report.registered, vec!["visual_agent"]);
    assert_eq!(report.failures.len(), 1);
    let (agent_id, err) = &report.failures[0];
    assert_eq!(agent_id, "radar_agent");
    assert!(matches!(err, DiscoveryError::Unreachable { .. }));
    assert_eq!(report.coverage_warnings, vec![RADAR_DETECTION]);
    assert!(registry.get("visual_agent").await.is_some());
}

#[tokio::test(start_paused = true)]
async fn slow_card_fetch_times_out_as_unreachable() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .with_agent(
                ScriptedAgent::radar("http://radar:8001", 1000.0, 90.0)
                    .with_delay(Duration::from_secs(60)),
            )
            .with_agent(ScriptedAgent::visual("http://visual:8002", "drone", 80)),
    );
    let registry = AgentRegistry::new();
    let report = discovery(transport, registry.clone())
        .discover_all(&endpoints())
        .await;

    assert_eq!(report.registered, vec!["visual_agent"]);
    assert!(matches!(
        report.failures[0].1,
        DiscoveryError::Unreachable { ref detail, .. } if detail.contains("no card within")
    ));
}

#[tokio::test]
async fn agent_missing_configured_skill_is_not_registered() {
    let transport = Arc::new(
        ScriptedTransport::new()
            // Radar card served where the visual agent is expected.
            .with_agent(ScriptedAgent::radar("http://radar:8001", 1000.0, 90.0))
            .with_agent(ScriptedAgent::new(
                "http://visual:8002",
                radar_card("http://visual:8002"),
            )),
    );
    let registry = AgentRegistry::new();
    let report = discovery(transport, registry.clone())
        .discover_all(&endpoints())
        .await;

    assert!(matches!(
        report.failures[0].1,
        DiscoveryError::MissingSkill { ref skill, .. } if skill == VISUAL_CLASSIFICATION
    ));
    assert_eq!(report.coverage_warnings, vec![VISUAL_CLASSIFICATION]);
    assert_eq!(registry.len().await, 1);
}

#[tokio::test]
async fn custom_skills_are_registered_and_queryable() {
    let mut card = radar_card("http://thermal:8003");
    card["skills"] = serde_json::json!([
        {"id": "thermal_imaging", "name": "Thermal Imaging", "tags": ["ir"]},
        {"id": "thermal_imaging", "name": "Duplicate declaration"}
    ]);
    let transport = Arc::new(
        ScriptedTransport::new().with_agent(ScriptedAgent::new("http://thermal:8003", card)),
    );
    let registry = AgentRegistry::new();
    let report = discovery(transport, registry.clone())
        .discover_all(&[AgentEndpoint::new("thermal_agent", "http://thermal:8003")])
        .await;

    assert_eq!(report.registered, vec!["thermal_agent"]);
    let snapshot = registry.snapshot().await;
    let thermal = snapshot.find_by_skill("thermal_imaging");
    assert_eq!(thermal.len(), 1);
    assert_eq!(thermal[0].skills.len(), 1);
    assert_eq!(thermal[0].reading_kind(), None);
}
