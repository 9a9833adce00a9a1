//! Comment entity
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::EntityId;

/// Append-only message on a ticket thread
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: EntityId,
    pub ticket_id: EntityId,
    pub author: EntityId,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn post(ticket_id: EntityId, author: EntityId, message: String, now: DateTime<Utc>) -> Self {
        Self { id: EntityId::new(), ticket_id, author, message, created_at: now }
    }
}
