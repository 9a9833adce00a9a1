//! Outbound ports (Repository and delivery traits)
//!
//! Hexagonal architecture: these are the interfaces that infrastructure must implement.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::aggregates::{Comment, Ticket, User};
use crate::domain::events::LifecycleEvent;
use crate::domain::policy::TicketFilter;
use crate::domain::value_objects::{Email, EntityId, Role};

/// Ticket repository port
#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn find_by_id(&self, id: &EntityId) -> Result<Option<Ticket>, RepositoryError>;

    /// Tickets matching `filter`, newest first
    async fn find(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, RepositoryError>;

    async fn insert(&self, ticket: &Ticket) -> Result<(), RepositoryError>;

    /// Replace a stored ticket. Last write wins.
    async fn update(&self, ticket: &Ticket) -> Result<(), RepositoryError>;

    async fn delete(&self, id: &EntityId) -> Result<(), RepositoryError>;
}

/// Comment repository port. Comments are append-only.
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Comments on a ticket in the order they were written
    async fn find_by_ticket(&self, ticket_id: &EntityId) -> Result<Vec<Comment>, RepositoryError>;

    async fn insert(&self, comment: &Comment) -> Result<(), RepositoryError>;
}

/// User repository port
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &EntityId) -> Result<Option<User>, RepositoryError>;

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Users sorted by name, optionally restricted to one role
    async fn list(&self, role: Option<Role>) -> Result<Vec<User>, RepositoryError>;

    /// Fails with `DuplicateKey` when the email is taken
    async fn insert(&self, user: &User) -> Result<(), RepositoryError>;
}

/// Delivery backend for lifecycle notifications
#[async_trait]
pub trait NotificationSink: Send + Sync {
    fn name(&self) -> &'static str;

    async fn deliver(&self, event: &LifecycleEvent) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("entity not found: {0}")]
    NotFound(String),

    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("message build failed: {0}")]
    Build(String),

    #[error("transport failed: {0}")]
    Transport(String),
}
