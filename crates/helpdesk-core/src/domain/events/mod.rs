//! Lifecycle events
//!
//! Raised by the access policy on successful writes and handed to the
//! notification dispatcher for best-effort delivery.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{Email, EntityId};

/// Where to reach the client that owns a ticket
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub email: Email,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    TicketCreated {
        ticket_id: EntityId,
        title: String,
        description: String,
        client: Contact,
    },

    AgentReplied {
        ticket_id: EntityId,
        ticket_title: String,
        client: Contact,
        agent_name: String,
        message: String,
    },

    TicketClosed {
        ticket_id: EntityId,
        title: String,
        closed_at: DateTime<Utc>,
        client: Contact,
    },
}

impl LifecycleEvent {
    pub fn ticket_id(&self) -> &EntityId {
        match self {
            Self::TicketCreated { ticket_id, .. }
            | Self::AgentReplied { ticket_id, .. }
            | Self::TicketClosed { ticket_id, .. } => ticket_id,
        }
    }

    /// The client every lifecycle notification is addressed to
    pub fn recipient(&self) -> &Contact {
        match self {
            Self::TicketCreated { client, .. }
            | Self::AgentReplied { client, .. }
            | Self::TicketClosed { client, .. } => client,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::TicketCreated { .. } => "ticket.created",
            Self::AgentReplied { .. } => "ticket.agent_replied",
            Self::TicketClosed { .. } => "ticket.closed",
        }
    }
}
