//! User account
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::events::Contact;
use crate::domain::value_objects::{Email, EntityId, Role};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: EntityId,
    pub name: String,
    pub email: Email,
    pub role: Role,
    /// Argon2 PHC string. Never leaves the core crate in API payloads.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: Email, role: Role, password_hash: String, now: DateTime<Utc>) -> Self {
        Self { id: EntityId::new(), name, email, role, password_hash, created_at: now, updated_at: now }
    }

    pub fn is_agent(&self) -> bool {
        self.role == Role::Agent
    }

    pub fn contact(&self) -> Contact {
        Contact { name: self.name.clone(), email: self.email.clone() }
    }
}
