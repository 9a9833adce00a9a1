//! HelpDesk core
//!
//! Ticketing domain for a small support desk: clients open tickets, agents
//! work them, and both sides talk through comments.
//!
//! ## Architecture
//!
//! - **Domain Layer**: aggregates, value objects, lifecycle events and the
//!   access policy (who may read or change what)
//! - **Application Layer**: use case orchestration, DTOs
//! - **Ports Layer**: Hexagonal architecture interfaces
//! - **Infrastructure Layer**: in-memory store, notification sinks, password hashing
//!
//! ## Roles
//!
//! - **Client**: sees and edits only their own tickets, and only title/description
//! - **Agent**: sees every ticket and may change any field, including closing it

pub mod domain;
pub mod application;
pub mod ports;
pub mod infrastructure;

// Re-exports for convenience
pub use domain::aggregates::{Comment, Ticket, TicketPatch, User};
pub use domain::value_objects::{Email, EntityId, Role, TicketPriority, TicketStatus};
pub use domain::events::{Contact, LifecycleEvent};
pub use domain::policy::{Caller, FieldViolation, PolicyError};
pub use application::{AccountService, TicketService};
pub use ports::inbound::{AccountUseCases, ServiceError, TicketUseCases};
pub use ports::outbound::{CommentRepository, NotificationSink, RepositoryError, TicketRepository, UserRepository};
