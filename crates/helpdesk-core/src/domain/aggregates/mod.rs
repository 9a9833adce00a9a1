//! Aggregates
pub mod ticket;
pub mod comment;
pub mod user;
pub use ticket::{Ticket, TicketPatch};
pub use comment::Comment;
pub use user::User;
