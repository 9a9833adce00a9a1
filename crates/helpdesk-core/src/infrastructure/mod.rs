//! Infrastructure layer
//!
//! Concrete adapters for the outbound ports.

pub mod notifications;
pub mod persistence;
pub mod security;

pub use notifications::{LogSink, NotificationDispatcher, RecordingSink, SmtpSettings, SmtpSink};
pub use persistence::InMemoryStore;
