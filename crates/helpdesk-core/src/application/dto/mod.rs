//! Data Transfer Objects (DTOs)
//!
//! Account commands. Ticket and comment proposals live with the policy that
//! judges them and are re-exported here.

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::Role;

pub use crate::domain::policy::{ListTicketsQuery, NewComment, NewTicket, TicketChanges};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Registration {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Account provisioned from configuration at startup
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeedUser {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}
