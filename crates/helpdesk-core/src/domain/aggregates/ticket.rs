//! Ticket Aggregate
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{EntityId, TicketPriority, TicketStatus};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: EntityId,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub client_id: EntityId,
    pub agent_id: Option<EntityId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// Normalized set of field changes that passed the access policy.
///
/// `agent_id` distinguishes "leave as is" (`None`) from "unassign"
/// (`Some(None)`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TicketPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub agent_id: Option<Option<EntityId>>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Ticket {
    pub fn open(
        client_id: EntityId,
        title: String,
        description: String,
        priority: TicketPriority,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EntityId::new(),
            title,
            description,
            status: TicketStatus::Open,
            priority,
            client_id,
            agent_id: None,
            created_at: now,
            updated_at: now,
            closed_at: None,
        }
    }

    pub fn is_owned_by(&self, user_id: &EntityId) -> bool {
        &self.client_id == user_id
    }

    /// Apply a policy-approved patch. `client_id` is never touched and
    /// `closed_at` is only ever set, never cleared.
    pub fn apply(&mut self, patch: TicketPatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(agent_id) = patch.agent_id {
            self.agent_id = agent_id;
        }
        if self.closed_at.is_none() {
            self.closed_at = patch.closed_at;
        }
        self.updated_at = now;
    }
}

impl TicketPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_defaults() {
        let now = Utc::now();
        let t = Ticket::open(EntityId::from_string("c1"), "Printer jam".into(), "Tray two is stuck".into(), TicketPriority::default(), now);
        assert_eq!(t.status, TicketStatus::Open);
        assert_eq!(t.priority, TicketPriority::Medium);
        assert!(t.agent_id.is_none());
        assert!(t.closed_at.is_none());
        assert!(t.is_owned_by(&EntityId::from_string("c1")));
    }

    #[test]
    fn test_apply_keeps_first_closed_at() {
        let created = Utc::now();
        let mut t = Ticket::open(EntityId::from_string("c1"), "Printer jam".into(), "Tray two is stuck".into(), TicketPriority::High, created);
        let first = created + chrono::Duration::minutes(5);
        t.apply(TicketPatch { status: Some(TicketStatus::Closed), closed_at: Some(first), ..Default::default() }, first);
        t.apply(TicketPatch { status: Some(TicketStatus::Open), ..Default::default() }, first);
        let later = first + chrono::Duration::minutes(5);
        t.apply(TicketPatch { status: Some(TicketStatus::Closed), closed_at: Some(later), ..Default::default() }, later);
        assert_eq!(t.closed_at, Some(first));
        assert_eq!(t.updated_at, later);
    }

    #[test]
    fn test_apply_unassigns() {
        let now = Utc::now();
        let mut t = Ticket::open(EntityId::from_string("c1"), "VPN down".into(), "Cannot reach the office".into(), TicketPriority::Low, now);
        t.agent_id = Some(EntityId::from_string("a1"));
        t.apply(TicketPatch { agent_id: Some(None), ..Default::default() }, now);
        assert!(t.agent_id.is_none());
    }
}
