//! In-memory store
//!
//! One injected instance backs all three repositories. It is opened at
//! startup (optionally loading a JSON snapshot) and flushed at shutdown.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::{Comment, Ticket, User};
use crate::domain::policy::TicketFilter;
use crate::domain::value_objects::{Email, EntityId, Role};
use crate::ports::outbound::{CommentRepository, RepositoryError, TicketRepository, UserRepository};

#[derive(Default)]
pub struct InMemoryStore {
    tickets: DashMap<String, Ticket>,
    comments: RwLock<Vec<Comment>>,
    users: RwLock<HashMap<String, User>>,
    snapshot_path: Option<PathBuf>,
}

#[derive(Default, Serialize, Deserialize)]
struct Snapshot {
    tickets: Vec<Ticket>,
    comments: Vec<Comment>,
    users: Vec<User>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the store, loading `snapshot_path` when it exists
    pub fn open(snapshot_path: Option<PathBuf>) -> Result<Self, RepositoryError> {
        let store = Self { snapshot_path, ..Self::default() };
        if let Some(path) = store.snapshot_path.as_deref().filter(|p| p.exists()) {
            let snapshot = read_snapshot(path)?;
            tracing::info!(
                path = %path.display(),
                tickets = snapshot.tickets.len(),
                comments = snapshot.comments.len(),
                users = snapshot.users.len(),
                "loaded store snapshot"
            );
            for ticket in snapshot.tickets {
                store.tickets.insert(ticket.id.to_string(), ticket);
            }
            *store.comments.write() = snapshot.comments;
            store.users.write().extend(snapshot.users.into_iter().map(|u| (u.id.to_string(), u)));
        }
        Ok(store)
    }

    /// Persist a snapshot when a path is configured
    pub fn flush(&self) -> Result<(), RepositoryError> {
        let Some(path) = self.snapshot_path.as_deref() else {
            return Ok(());
        };
        let snapshot = Snapshot {
            tickets: self.tickets.iter().map(|entry| entry.value().clone()).collect(),
            comments: self.comments.read().clone(),
            users: self.users.read().values().cloned().collect(),
        };
        let json = serde_json::to_vec_pretty(&snapshot).map_err(|e| RepositoryError::Storage(e.to_string()))?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, json).map_err(|e| RepositoryError::Storage(e.to_string()))?;
        std::fs::rename(&tmp, path).map_err(|e| RepositoryError::Storage(e.to_string()))?;
        tracing::info!(path = %path.display(), "flushed store snapshot");
        Ok(())
    }
}

fn read_snapshot(path: &Path) -> Result<Snapshot, RepositoryError> {
    let content = std::fs::read(path).map_err(|e| RepositoryError::Storage(e.to_string()))?;
    serde_json::from_slice(&content).map_err(|e| RepositoryError::Storage(format!("{}: {}", path.display(), e)))
}

#[async_trait]
impl TicketRepository for InMemoryStore {
    async fn find_by_id(&self, id: &EntityId) -> Result<Option<Ticket>, RepositoryError> {
        Ok(self.tickets.get(id.as_str()).map(|t| t.value().clone()))
    }

    async fn find(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, RepositoryError> {
        let mut found: Vec<Ticket> = self.tickets
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn insert(&self, ticket: &Ticket) -> Result<(), RepositoryError> {
        self.tickets.insert(ticket.id.to_string(), ticket.clone());
        Ok(())
    }

    async fn update(&self, ticket: &Ticket) -> Result<(), RepositoryError> {
        match self.tickets.get_mut(ticket.id.as_str()) {
            Some(mut stored) => {
                *stored = ticket.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound(ticket.id.to_string())),
        }
    }

    async fn delete(&self, id: &EntityId) -> Result<(), RepositoryError> {
        self.tickets
            .remove(id.as_str())
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn find_by_ticket(&self, ticket_id: &EntityId) -> Result<Vec<Comment>, RepositoryError> {
        let comments = self.comments.read();
        let mut thread: Vec<Comment> = comments.iter().filter(|c| &c.ticket_id == ticket_id).cloned().collect();
        // stable: equal timestamps keep insertion order
        thread.sort_by_key(|c| c.created_at);
        Ok(thread)
    }

    async fn insert(&self, comment: &Comment) -> Result<(), RepositoryError> {
        self.comments.write().push(comment.clone());
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: &EntityId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.read().get(id.as_str()).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.read().values().find(|u| &u.email == email).cloned())
    }

    async fn list(&self, role: Option<Role>) -> Result<Vec<User>, RepositoryError> {
        let mut users: Vec<User> = self.users
            .read()
            .values()
            .filter(|u| role.map_or(true, |r| u.role == r))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.email.as_str().cmp(b.email.as_str())));
        Ok(users)
    }

    async fn insert(&self, user: &User) -> Result<(), RepositoryError> {
        let mut users = self.users.write();
        if users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::DuplicateKey(user.email.to_string()));
        }
        users.insert(user.id.to_string(), user.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{TicketPriority, TicketStatus};
    use chrono::{Duration, Utc};

    fn ticket(owner: &str, minutes_ago: i64, status: TicketStatus) -> Ticket {
        let mut t = Ticket::open(
            EntityId::from_string(owner),
            "Mail bounce".into(),
            "Outgoing mail bounces back".into(),
            TicketPriority::Medium,
            Utc::now() - Duration::minutes(minutes_ago),
        );
        t.status = status;
        t
    }

    fn user(name: &str, email: &str, role: Role) -> User {
        User::new(name.into(), Email::parse(email).unwrap(), role, "hash".into(), Utc::now())
    }

    #[tokio::test]
    async fn test_find_filters_and_sorts_newest_first() {
        let store = InMemoryStore::new();
        let old = ticket("c1", 30, TicketStatus::Open);
        let new = ticket("c1", 1, TicketStatus::Open);
        let other = ticket("c2", 5, TicketStatus::Closed);
        for t in [&old, &new, &other] {
            TicketRepository::insert(&store, t).await.unwrap();
        }

        let mine = store.find(&TicketFilter { client_id: Some(EntityId::from_string("c1")), ..Default::default() }).await.unwrap();
        assert_eq!(mine.iter().map(|t| t.id.clone()).collect::<Vec<_>>(), vec![new.id.clone(), old.id.clone()]);

        let closed = store.find(&TicketFilter { status: Some(TicketStatus::Closed), ..Default::default() }).await.unwrap();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].id, other.id);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing() {
        let store = InMemoryStore::new();
        let t = ticket("c1", 0, TicketStatus::Open);
        assert!(matches!(store.update(&t).await, Err(RepositoryError::NotFound(_))));
        TicketRepository::insert(&store, &t).await.unwrap();
        store.delete(&t.id).await.unwrap();
        assert!(matches!(store.delete(&t.id).await, Err(RepositoryError::NotFound(_))));
        assert!(TicketRepository::find_by_id(&store, &t.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_comments_chronological() {
        let store = InMemoryStore::new();
        let ticket_id = EntityId::from_string("t1");
        let now = Utc::now();
        let later = Comment::post(ticket_id.clone(), EntityId::from_string("a"), "second".into(), now + Duration::seconds(5));
        let earlier = Comment::post(ticket_id.clone(), EntityId::from_string("c"), "first".into(), now);
        let elsewhere = Comment::post(EntityId::from_string("t2"), EntityId::from_string("c"), "other".into(), now);
        for c in [&later, &earlier, &elsewhere] {
            CommentRepository::insert(&store, c).await.unwrap();
        }
        let thread = store.find_by_ticket(&ticket_id).await.unwrap();
        let messages: Vec<_> = thread.iter().map(|c| c.message.as_str()).collect();
        assert_eq!(messages, ["first", "second"]);
    }

    #[tokio::test]
    async fn test_users_unique_email_and_sorted() {
        let store = InMemoryStore::new();
        UserRepository::insert(&store, &user("Zoe", "zoe@example.com", Role::Agent)).await.unwrap();
        UserRepository::insert(&store, &user("Ana", "ana@example.com", Role::Client)).await.unwrap();
        let dup = UserRepository::insert(&store, &user("Other", "ana@example.com", Role::Client)).await;
        assert!(matches!(dup, Err(RepositoryError::DuplicateKey(_))));

        let all = store.list(None).await.unwrap();
        assert_eq!(all.iter().map(|u| u.name.as_str()).collect::<Vec<_>>(), ["Ana", "Zoe"]);
        let agents = store.list(Some(Role::Agent)).await.unwrap();
        assert_eq!(agents.len(), 1);

        let found = store.find_by_email(&Email::parse("ANA@example.com").unwrap()).await.unwrap();
        assert_eq!(found.map(|u| u.name), Some("Ana".to_string()));
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let path = std::env::temp_dir().join(format!("helpdesk-store-{}.json", EntityId::new()));
        let t = ticket("c1", 0, TicketStatus::InProgress);
        {
            let store = InMemoryStore::open(Some(path.clone())).unwrap();
            TicketRepository::insert(&store, &t).await.unwrap();
            UserRepository::insert(&store, &user("Ana", "ana@example.com", Role::Client)).await.unwrap();
            store.flush().unwrap();
        }
        let reopened = InMemoryStore::open(Some(path.clone())).unwrap();
        assert_eq!(TicketRepository::find_by_id(&reopened, &t.id).await.unwrap(), Some(t));
        assert_eq!(reopened.list(None).await.unwrap().len(), 1);
        std::fs::remove_file(path).unwrap();
    }
}
