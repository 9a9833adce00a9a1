//! API Models
//!
//! Wire shapes for requests and responses. Domain records are converted into
//! views so that secrets such as password hashes never reach a response.

use chrono::{DateTime, Utc};
use helpdesk_core::application::dto::{NewComment, NewTicket, Registration, TicketChanges};
use helpdesk_core::{Comment, FieldViolation, Ticket, User};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standard API response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ErrorResponse>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    pub fn error(error: ErrorResponse) -> Self {
        Self { success: false, data: None, error: Some(error) }
    }
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    /// Present for validation failures: every offending field with its reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

impl From<FieldViolation> for FieldError {
    fn from(v: FieldViolation) -> Self {
        Self { field: v.field, reason: v.reason }
    }
}

// ============ Users ============

/// User as exposed by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub name: String,
    pub email: String,
    /// `client` or `agent`
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name,
            email: user.email.to_string(),
            role: user.role.as_str().into(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Name and contact of a user referenced by a ticket or comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name,
            email: user.email.to_string(),
            role: user.role.as_str().into(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl From<RegisterRequest> for Registration {
    fn from(req: RegisterRequest) -> Self {
        Self { name: req.name, email: req.email, password: req.password }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Signed-in user together with a bearer token
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserView,
    pub token: String,
}

// ============ Tickets ============

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketView {
    pub id: String,
    pub title: String,
    pub description: String,
    /// `open`, `in-progress`, `resolved` or `closed`
    pub status: String,
    /// `low`, `medium`, `high` or `urgent`
    pub priority: String,
    pub client_id: String,
    pub agent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    /// Owner; absent when the account no longer exists
    pub client: Option<UserSummary>,
    pub agent: Option<UserSummary>,
}

impl From<Ticket> for TicketView {
    fn from(t: Ticket) -> Self {
        Self {
            id: t.id.to_string(),
            title: t.title,
            description: t.description,
            status: t.status.as_str().into(),
            priority: t.priority.as_str().into(),
            client_id: t.client_id.to_string(),
            agent_id: t.agent_id.map(|id| id.to_string()),
            created_at: t.created_at,
            updated_at: t.updated_at,
            closed_at: t.closed_at,
            client: None,
            agent: None,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateTicketRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Defaults to `medium`
    pub priority: Option<String>,
}

impl From<CreateTicketRequest> for NewTicket {
    fn from(req: CreateTicketRequest) -> Self {
        Self { title: req.title, description: req.description, priority: req.priority }
    }
}

/// Clients may only change `title` and `description`; other fields they send
/// are ignored.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicketRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    /// `null` or `""` unassigns
    #[serde(default, deserialize_with = "helpdesk_core::domain::policy::present")]
    #[schema(value_type = Option<String>, nullable)]
    pub agent_id: Option<Option<String>>,
}

impl From<UpdateTicketRequest> for TicketChanges {
    fn from(req: UpdateTicketRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            agent_id: req.agent_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeletedView {
    pub id: String,
}

// ============ Comments ============

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: String,
    pub ticket_id: String,
    /// Author's user id
    pub author: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub author_user: Option<UserSummary>,
}

impl From<Comment> for CommentView {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id.to_string(),
            ticket_id: c.ticket_id.to_string(),
            author: c.author.to_string(),
            message: c.message,
            created_at: c.created_at,
            author_user: None,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateCommentRequest {
    pub message: Option<String>,
}

impl From<CreateCommentRequest> for NewComment {
    fn from(req: CreateCommentRequest) -> Self {
        Self { message: req.message }
    }
}
