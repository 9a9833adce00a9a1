//! Inbound ports (Use case traits)
//!
//! Hexagonal architecture: application service interfaces.

use async_trait::async_trait;
use thiserror::Error;

use crate::application::dto::{Registration, SeedUser};
use crate::domain::aggregates::{Comment, Ticket, User};
use crate::domain::policy::{Caller, ListTicketsQuery, NewComment, NewTicket, PolicyError, TicketChanges};
use crate::domain::value_objects::{EntityId, Role};
use crate::ports::outbound::RepositoryError;

/// Ticket and comment use cases, always on behalf of a resolved caller
#[async_trait]
pub trait TicketUseCases: Send + Sync {
    async fn list_tickets(&self, caller: &Caller, query: ListTicketsQuery) -> Result<Vec<Ticket>, ServiceError>;

    async fn get_ticket(&self, caller: &Caller, id: &EntityId) -> Result<Ticket, ServiceError>;

    async fn create_ticket(&self, caller: &Caller, draft: NewTicket) -> Result<Ticket, ServiceError>;

    async fn update_ticket(&self, caller: &Caller, id: &EntityId, changes: TicketChanges) -> Result<Ticket, ServiceError>;

    async fn delete_ticket(&self, caller: &Caller, id: &EntityId) -> Result<(), ServiceError>;

    async fn list_comments(&self, caller: &Caller, ticket_id: &EntityId) -> Result<Vec<Comment>, ServiceError>;

    async fn add_comment(&self, caller: &Caller, ticket_id: &EntityId, draft: NewComment) -> Result<Comment, ServiceError>;
}

/// Account use cases
#[async_trait]
pub trait AccountUseCases: Send + Sync {
    /// Self-service sign up; always creates a client
    async fn register(&self, registration: Registration) -> Result<User, ServiceError>;

    async fn authenticate(&self, email: &str, password: &str) -> Result<User, ServiceError>;

    async fn get_user(&self, id: &EntityId) -> Result<User, ServiceError>;

    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>, ServiceError>;

    /// Create a configured account unless its email already exists
    async fn seed(&self, seed: SeedUser) -> Result<User, ServiceError>;
}

#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("internal error: {0}")]
    Internal(String),
}
