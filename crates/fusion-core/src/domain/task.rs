//! The task issued once per fusion run and the request body sent to agents.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::{FusionError, FusionResult};

pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 10;

/// A read-only fusion task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: Uuid,
    pub sector_id: String,
    pub request_kind: String,
    pub priority: u8,
}

impl Task {
    /// Create a task with a fresh id.
    ///
    /// Rejects an empty sector, an empty request kind and a priority outside
    /// `1..=10`.
    pub fn new(
        sector_id: impl Into<String>,
        request_kind: impl Into<String>,
        priority: u8,
    ) -> FusionResult<Self> {
        let sector_id = sector_id.into();
        let request_kind = request_kind.into();

        if sector_id.trim().is_empty() {
            return Err(FusionError::InvalidTask("sector id must not be empty".into()));
        }
        if request_kind.trim().is_empty() {
            return Err(FusionError::InvalidTask(
                "request kind must not be empty".into(),
            ));
        }
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&priority) {
            return Err(FusionError::InvalidTask(format!(
                "priority {priority} outside {MIN_PRIORITY}..={MAX_PRIORITY}"
            )));
        }

        Ok(Self {
            task_id: Uuid::new_v4(),
            sector_id,
            request_kind,
            priority,
        })
    }

    pub fn request(&self) -> TaskRequest {
        TaskRequest {
            sector_id: self.sector_id.clone(),
            request_type: self.request_kind.clone(),
            priority: self.priority,
        }
    }
}

/// Request body produced to each agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest {
    pub sector_id: String,
    pub request_type: String,
    pub priority: u8,
}
