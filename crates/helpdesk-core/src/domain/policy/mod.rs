//! Ticket access and lifecycle policy
//!
//! Pure decision functions: given who is calling and the current record,
//! decide whether a read or write is allowed, which fields a write may touch,
//! and which lifecycle events the write raises. Nothing here performs I/O;
//! callers pass `now` in.
//!
//! | action            | client                         | agent            |
//! |-------------------|--------------------------------|------------------|
//! | read / comment    | own tickets                    | any ticket       |
//! | list              | own tickets (+ filters)        | all (+ filters)  |
//! | create            | yes, owner forced to caller    | same             |
//! | update            | own, `title`/`description` only| any field        |
//! | delete            | own tickets                    | any ticket       |

pub mod validation;

pub use validation::{FieldViolation, Violations};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::domain::aggregates::{Comment, Ticket, TicketPatch};
use crate::domain::events::{Contact, LifecycleEvent};
use crate::domain::value_objects::{EntityId, Role, TicketPriority, TicketStatus};
use validation::{supplied, DESCRIPTION_LEN, TITLE_LEN};

// =============================================================================
// Identity
// =============================================================================

/// Resolved identity of the requester. Only the two known roles exist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Caller {
    Client { id: EntityId },
    Agent { id: EntityId },
}

impl Caller {
    pub fn new(id: EntityId, role: Role) -> Self {
        match role {
            Role::Client => Self::Client { id },
            Role::Agent => Self::Agent { id },
        }
    }

    pub fn id(&self) -> &EntityId {
        match self {
            Self::Client { id } | Self::Agent { id } => id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Self::Client { .. } => Role::Client,
            Self::Agent { .. } => Role::Agent,
        }
    }

    pub fn is_agent(&self) -> bool {
        matches!(self, Self::Agent { .. })
    }
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PolicyError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("validation failed: {}", join_violations(.0))]
    ValidationFailed(Vec<FieldViolation>),
}

fn join_violations(fields: &[FieldViolation]) -> String {
    fields.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

pub fn require_caller(caller: Option<Caller>) -> Result<Caller, PolicyError> {
    caller.ok_or(PolicyError::Unauthenticated)
}

pub fn require_found<T>(found: Option<T>, what: &str) -> Result<T, PolicyError> {
    found.ok_or_else(|| PolicyError::NotFound(what.to_string()))
}

// =============================================================================
// Proposed mutations (raw, as received)
// =============================================================================

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTicket {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    /// Absent: leave assignment alone. `null` or `""`: unassign.
    #[serde(default, deserialize_with = "present")]
    pub agent_id: Option<Option<String>>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NewComment {
    pub message: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ListTicketsQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
}

/// Deserializer for `Option<Option<T>>` fields that tells an explicit `null`
/// (`Some(None)`) apart from a missing key (`None`, via `#[serde(default)]`).
pub fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

// =============================================================================
// Decisions
// =============================================================================

/// A permitted write together with the events it raises
#[derive(Clone, Debug, PartialEq)]
pub struct Authorized<T> {
    pub value: T,
    pub events: Vec<LifecycleEvent>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TicketUpdate {
    pub patch: TicketPatch,
    pub events: Vec<LifecycleEvent>,
}

/// Ticket collection filter; all present criteria must match
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TicketFilter {
    pub client_id: Option<EntityId>,
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
}

impl TicketFilter {
    pub fn matches(&self, ticket: &Ticket) -> bool {
        self.client_id.as_ref().map_or(true, |id| &ticket.client_id == id)
            && self.status.map_or(true, |s| ticket.status == s)
            && self.priority.map_or(true, |p| ticket.priority == p)
    }
}

// =============================================================================
// Rules
// =============================================================================

pub fn can_read_ticket(caller: &Caller, ticket: &Ticket) -> Result<(), PolicyError> {
    owner_or_agent(caller, ticket, "ticket belongs to another client")
}

pub fn can_read_comments(caller: &Caller, parent: &Ticket) -> Result<(), PolicyError> {
    owner_or_agent(caller, parent, "comments belong to another client's ticket")
}

pub fn authorize_delete_ticket(caller: &Caller, existing: &Ticket) -> Result<(), PolicyError> {
    owner_or_agent(caller, existing, "cannot delete another client's ticket")
}

fn owner_or_agent(caller: &Caller, ticket: &Ticket, denial: &str) -> Result<(), PolicyError> {
    match caller {
        Caller::Agent { .. } => Ok(()),
        Caller::Client { id } if ticket.is_owned_by(id) => Ok(()),
        Caller::Client { .. } => Err(PolicyError::Forbidden(denial.to_string())),
    }
}

pub fn build_list_filter(caller: &Caller, query: &ListTicketsQuery) -> Result<TicketFilter, PolicyError> {
    let mut violations = Violations::default();
    let status = violations.status(query.status.as_deref());
    let priority = violations.priority(query.priority.as_deref());
    violations.finish()?;

    let client_id = match caller {
        Caller::Client { id } => Some(id.clone()),
        Caller::Agent { .. } => None,
    };
    Ok(TicketFilter { client_id, status, priority })
}

/// Any authenticated caller may open a ticket; it is always owned by them.
pub fn authorize_create_ticket(
    caller: &Caller,
    owner: &Contact,
    draft: NewTicket,
    now: DateTime<Utc>,
) -> Result<Authorized<Ticket>, PolicyError> {
    let mut violations = Violations::default();
    let title = violations.required_text("title", draft.title.as_deref(), TITLE_LEN);
    let description = violations.required_text("description", draft.description.as_deref(), DESCRIPTION_LEN);
    let priority = violations.priority(draft.priority.as_deref()).unwrap_or_default();
    violations.finish()?;

    let ticket = Ticket::open(caller.id().clone(), title, description, priority, now);
    let event = LifecycleEvent::TicketCreated {
        ticket_id: ticket.id.clone(),
        title: ticket.title.clone(),
        description: ticket.description.clone(),
        client: owner.clone(),
    };
    Ok(Authorized { value: ticket, events: vec![event] })
}

pub fn authorize_create_comment(
    caller: &Caller,
    author_name: &str,
    parent: &Ticket,
    owner: &Contact,
    draft: NewComment,
    now: DateTime<Utc>,
) -> Result<Authorized<Comment>, PolicyError> {
    owner_or_agent(caller, parent, "cannot comment on another client's ticket")?;

    let mut violations = Violations::default();
    let message = violations.message(draft.message.as_deref());
    violations.finish()?;

    let comment = Comment::post(parent.id.clone(), caller.id().clone(), message, now);
    let events = match caller {
        Caller::Agent { .. } => vec![LifecycleEvent::AgentReplied {
            ticket_id: parent.id.clone(),
            ticket_title: parent.title.clone(),
            client: owner.clone(),
            agent_name: author_name.to_string(),
            message: comment.message.clone(),
        }],
        Caller::Client { .. } => Vec::new(),
    };
    Ok(Authorized { value: comment, events })
}

/// Field whitelist and closure bookkeeping for ticket edits.
///
/// Owning clients may only retitle or redescribe; `status`, `priority` and
/// `agentId` in their request are dropped without error. Agents may change
/// every field. Closing an unclosed ticket stamps `closed_at` (first time
/// only) and raises exactly one `TicketClosed` addressed to `owner`.
/// `assignee` is the role of the user named by `agentId`, `None` when no
/// such user exists; a named assignee must be an agent.
pub fn authorize_update_ticket(
    caller: &Caller,
    existing: &Ticket,
    owner: &Contact,
    changes: TicketChanges,
    assignee: Option<Role>,
    now: DateTime<Utc>,
) -> Result<TicketUpdate, PolicyError> {
    let mut violations = Violations::default();
    let title = violations.optional_text("title", changes.title.as_deref(), TITLE_LEN);
    let description = violations.optional_text("description", changes.description.as_deref(), DESCRIPTION_LEN);

    match caller {
        Caller::Client { id } => {
            if !existing.is_owned_by(id) {
                return Err(PolicyError::Forbidden("cannot edit another client's ticket".into()));
            }
            violations.finish()?;
            if changes.status.is_some() || changes.priority.is_some() || changes.agent_id.is_some() {
                tracing::debug!(ticket_id = %existing.id, client_id = %id, "dropping agent-only fields from client update");
            }
            Ok(TicketUpdate {
                patch: TicketPatch { title, description, ..Default::default() },
                events: Vec::new(),
            })
        }
        Caller::Agent { .. } => {
            let status = violations.status(changes.status.as_deref());
            let priority = violations.priority(changes.priority.as_deref());
            let agent_id = changes
                .agent_id
                .map(|raw| supplied(raw.as_deref()).map(EntityId::from_string));
            if matches!(agent_id, Some(Some(_))) && assignee != Some(Role::Agent) {
                violations.push("agentId", "must reference an agent");
            }
            violations.finish()?;

            let mut patch = TicketPatch { title, description, status, priority, agent_id, closed_at: None };
            let mut events = Vec::new();
            if status == Some(TicketStatus::Closed) {
                if existing.closed_at.is_none() {
                    patch.closed_at = Some(now);
                }
                if !existing.status.is_closed() {
                    events.push(LifecycleEvent::TicketClosed {
                        ticket_id: existing.id.clone(),
                        title: patch.title.clone().unwrap_or_else(|| existing.title.clone()),
                        closed_at: existing.closed_at.unwrap_or(now),
                        client: owner.clone(),
                    });
                }
            }
            Ok(TicketUpdate { patch, events })
        }
    }
}
