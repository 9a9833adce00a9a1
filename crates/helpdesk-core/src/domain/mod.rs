//! Domain module
//!
//! Tickets, comments and users, the lifecycle events they raise, and the
//! access policy that governs them.

pub mod aggregates;
pub mod value_objects;
pub mod events;
pub mod policy;

pub use aggregates::*;
pub use value_objects::*;
pub use events::*;
