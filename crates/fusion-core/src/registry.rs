//! In-memory capability registry: agent id → [`AgentCard`].
//!
//! Writers (discovery) replace the shared map copy-on-write, so a
//! [`RegistrySnapshot`] taken by a fusion run never observes a half-applied
//! re-discovery.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::AgentCard;

type CardMap = HashMap<String, Arc<AgentCard>>;

/// Shared, cloneable handle to the registry.
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    cards: Arc<RwLock<Arc<CardMap>>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the card under its id. Returns the previous card.
    pub async fn register(&self, card: AgentCard) -> Option<Arc<AgentCard>> {
        let mut guard = self.cards.write().await;
        let map = Arc::make_mut(&mut *guard);
        let previous = map.insert(card.id.clone(), Arc::new(card));
        if let Some(prev) = &previous {
            debug!(agent_id = %prev.id, "replaced registered agent card");
        }
        previous
    }

    pub async fn get(&self, agent_id: &str) -> Option<Arc<AgentCard>> {
        self.cards.read().await.get(agent_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.cards.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cards.read().await.is_empty()
    }

    /// An immutable view of the registry at this instant.
    pub async fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            cards: Arc::clone(&*self.cards.read().await),
        }
    }

    /// Drop every card. Only called on orchestrator shutdown.
    pub async fn clear(&self) {
        *self.cards.write().await = Arc::new(CardMap::new());
    }
}

/// Point-in-time copy of the registry, read by dispatch.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    cards: Arc<CardMap>,
}

impl RegistrySnapshot {
    pub fn get(&self, agent_id: &str) -> Option<&Arc<AgentCard>> {
        self.cards.get(agent_id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Cards sorted by agent id.
    pub fn cards(&self) -> Vec<Arc<AgentCard>> {
        let mut cards: Vec<_> = self.cards.values().cloned().collect();
        cards.sort_by(|a, b| a.id.cmp(&b.id));
        cards
    }

    /// Cards declaring `skill_id`, sorted by agent id.
    pub fn find_by_skill(&self, skill_id: &str) -> Vec<Arc<AgentCard>> {
        self.cards()
            .into_iter()
            .filter(|c| c.declares(skill_id))
            .collect()
    }
}
