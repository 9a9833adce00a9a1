//! Command handlers
//!
//! Application services that orchestrate use cases: load records, ask the
//! access policy for a decision, persist, then hand raised events to the
//! notification dispatcher.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::application::dto::*;
use crate::domain::aggregates::{Comment, Ticket, User};
use crate::domain::events::Contact;
use crate::domain::policy::{self, validation, Caller, PolicyError, Violations};
use crate::domain::value_objects::{Email, EntityId, Role};
use crate::infrastructure::notifications::NotificationDispatcher;
use crate::infrastructure::security;
use crate::ports::inbound::{AccountUseCases, ServiceError, TicketUseCases};
use crate::ports::outbound::{CommentRepository, RepositoryError, TicketRepository, UserRepository};

/// Ticket application service
pub struct TicketService {
    tickets: Arc<dyn TicketRepository>,
    comments: Arc<dyn CommentRepository>,
    users: Arc<dyn UserRepository>,
    notifications: Arc<NotificationDispatcher>,
}

impl TicketService {
    pub fn new(
        tickets: Arc<dyn TicketRepository>,
        comments: Arc<dyn CommentRepository>,
        users: Arc<dyn UserRepository>,
        notifications: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            tickets,
            comments,
            users,
            notifications,
        }
    }

    async fn load_ticket(&self, id: &EntityId) -> Result<Ticket, ServiceError> {
        let found = self.tickets.find_by_id(id).await?;
        Ok(policy::require_found(found, "ticket")?)
    }

    /// The stored account behind a token; gone means the token is stale
    async fn caller_account(&self, caller: &Caller) -> Result<User, ServiceError> {
        self.users
            .find_by_id(caller.id())
            .await?
            .ok_or(ServiceError::Policy(PolicyError::Unauthenticated))
    }

    async fn owner_contact(&self, ticket: &Ticket) -> Result<Contact, ServiceError> {
        let owner = self.users.find_by_id(&ticket.client_id).await?;
        Ok(policy::require_found(owner, "ticket owner")?.contact())
    }

    /// Role of the user an agent's update names as assignee, if any
    async fn assignee_role(&self, caller: &Caller, changes: &TicketChanges) -> Result<Option<Role>, ServiceError> {
        let named = changes.agent_id.as_ref().and_then(|raw| validation::supplied(raw.as_deref()));
        match named {
            Some(id) if caller.is_agent() => {
                let user = self.users.find_by_id(&EntityId::from_string(id)).await?;
                Ok(user.map(|u| u.role))
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl TicketUseCases for TicketService {
    async fn list_tickets(&self, caller: &Caller, query: ListTicketsQuery) -> Result<Vec<Ticket>, ServiceError> {
        let filter = policy::build_list_filter(caller, &query)?;
        Ok(self.tickets.find(&filter).await?)
    }

    async fn get_ticket(&self, caller: &Caller, id: &EntityId) -> Result<Ticket, ServiceError> {
        let ticket = self.load_ticket(id).await?;
        policy::can_read_ticket(caller, &ticket)?;
        Ok(ticket)
    }

    async fn create_ticket(&self, caller: &Caller, draft: NewTicket) -> Result<Ticket, ServiceError> {
        let owner = self.caller_account(caller).await?.contact();
        let decision = policy::authorize_create_ticket(caller, &owner, draft, Utc::now())?;

        self.tickets.insert(&decision.value).await?;
        tracing::info!(ticket_id = %decision.value.id, client_id = %caller.id(), "ticket created");

        self.notifications.dispatch(decision.events);
        Ok(decision.value)
    }

    async fn update_ticket(&self, caller: &Caller, id: &EntityId, changes: TicketChanges) -> Result<Ticket, ServiceError> {
        let mut ticket = self.load_ticket(id).await?;
        let owner = self.owner_contact(&ticket).await?;
        let now = Utc::now();
        let assignee = self.assignee_role(caller, &changes).await?;
        let update = policy::authorize_update_ticket(caller, &ticket, &owner, changes, assignee, now)?;

        let from = ticket.status;
        ticket.apply(update.patch, now);
        self.tickets.update(&ticket).await.map_err(|e| match e {
            RepositoryError::NotFound(_) => ServiceError::Policy(PolicyError::NotFound("ticket".into())),
            other => other.into(),
        })?;
        tracing::info!(ticket_id = %ticket.id, caller = %caller.id(), %from, to = %ticket.status, "ticket updated");

        self.notifications.dispatch(update.events);
        Ok(ticket)
    }

    async fn delete_ticket(&self, caller: &Caller, id: &EntityId) -> Result<(), ServiceError> {
        let ticket = self.load_ticket(id).await?;
        policy::authorize_delete_ticket(caller, &ticket)?;

        self.tickets.delete(id).await.map_err(|e| match e {
            RepositoryError::NotFound(_) => ServiceError::Policy(PolicyError::NotFound("ticket".into())),
            other => other.into(),
        })?;
        tracing::info!(ticket_id = %id, caller = %caller.id(), "ticket deleted");
        Ok(())
    }

    async fn list_comments(&self, caller: &Caller, ticket_id: &EntityId) -> Result<Vec<Comment>, ServiceError> {
        let parent = self.load_ticket(ticket_id).await?;
        policy::can_read_comments(caller, &parent)?;
        Ok(self.comments.find_by_ticket(ticket_id).await?)
    }

    async fn add_comment(&self, caller: &Caller, ticket_id: &EntityId, draft: NewComment) -> Result<Comment, ServiceError> {
        let parent = self.load_ticket(ticket_id).await?;
        let author = self.caller_account(caller).await?;
        let owner = self.owner_contact(&parent).await?;
        let decision = policy::authorize_create_comment(caller, &author.name, &parent, &owner, draft, Utc::now())?;

        self.comments.insert(&decision.value).await?;
        tracing::info!(ticket_id = %parent.id, comment_id = %decision.value.id, author = %author.id, "comment added");

        self.notifications.dispatch(decision.events);
        Ok(decision.value)
    }
}

/// Account application service
pub struct AccountService {
    users: Arc<dyn UserRepository>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    async fn create(&self, name: String, email: Email, password: String, role: Role) -> Result<User, ServiceError> {
        let hash = tokio::task::spawn_blocking(move || security::hash_password(&password))
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?
            .map_err(|e| ServiceError::Internal(e.to_string()))?;

        let user = User::new(name, email, role, hash, Utc::now());
        self.users.insert(&user).await.map_err(|e| match e {
            RepositoryError::DuplicateKey(_) => ServiceError::Conflict("email already registered".into()),
            other => other.into(),
        })?;
        tracing::info!(user_id = %user.id, role = %user.role, "account created");
        Ok(user)
    }
}

#[async_trait]
impl AccountUseCases for AccountService {
    async fn register(&self, registration: Registration) -> Result<User, ServiceError> {
        let mut violations = Violations::default();
        let name = violations.required_text("name", registration.name.as_deref(), validation::NAME_LEN);
        let email = match validation::supplied(registration.email.as_deref()).map(Email::parse) {
            Some(Ok(email)) => Some(email),
            Some(Err(_)) => {
                violations.push("email", "must be a valid email address");
                None
            }
            None => {
                violations.push("email", "is required");
                None
            }
        };
        let password = registration.password.unwrap_or_default();
        if password.chars().count() < validation::PASSWORD_MIN_LEN {
            violations.push("password", format!("must be at least {} characters", validation::PASSWORD_MIN_LEN));
        }
        violations.finish()?;

        let Some(email) = email else {
            return Err(ServiceError::Internal("email missing after validation".into()));
        };
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(ServiceError::Conflict("email already registered".into()));
        }
        self.create(name, email, password, Role::Client).await
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<User, ServiceError> {
        let email = Email::parse(email).map_err(|_| ServiceError::InvalidCredentials)?;
        let user = self.users.find_by_email(&email).await?.ok_or(ServiceError::InvalidCredentials)?;

        let password = password.to_string();
        let stored = user.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || security::verify_password(&password, &stored))
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        if !verified {
            tracing::debug!(user_id = %user.id, "password mismatch");
            return Err(ServiceError::InvalidCredentials);
        }
        Ok(user)
    }

    async fn get_user(&self, id: &EntityId) -> Result<User, ServiceError> {
        let found = self.users.find_by_id(id).await?;
        Ok(policy::require_found(found, "user")?)
    }

    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>, ServiceError> {
        Ok(self.users.list(role).await?)
    }

    async fn seed(&self, seed: SeedUser) -> Result<User, ServiceError> {
        let email = Email::parse(&seed.email).map_err(|e| {
            PolicyError::ValidationFailed(vec![policy::FieldViolation { field: "email".into(), reason: e.to_string() }])
        })?;
        if let Some(existing) = self.users.find_by_email(&email).await? {
            tracing::debug!(email = %email, "seed account already present");
            return Ok(existing);
        }
        self.create(seed.name, email, seed.password, seed.role).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::LifecycleEvent;
    use crate::domain::value_objects::{TicketPriority, TicketStatus};
    use crate::infrastructure::notifications::RecordingSink;
    use crate::infrastructure::persistence::InMemoryStore;
    use crate::ports::outbound::NotificationSink;

    struct Harness {
        tickets: TicketService,
        accounts: AccountService,
        dispatcher: Arc<NotificationDispatcher>,
        sink: Arc<RecordingSink>,
    }

    fn harness_with(sink: Arc<RecordingSink>) -> Harness {
        let store = Arc::new(InMemoryStore::new());
        let sinks: Vec<Arc<dyn NotificationSink>> = vec![sink.clone()];
        let dispatcher = Arc::new(NotificationDispatcher::spawn(sinks));
        Harness {
            tickets: TicketService::new(store.clone(), store.clone(), store.clone(), dispatcher.clone()),
            accounts: AccountService::new(store),
            dispatcher,
            sink,
        }
    }

    fn harness() -> Harness {
        harness_with(Arc::new(RecordingSink::new()))
    }

    async fn account(h: &Harness, name: &str, email: &str, role: Role) -> Caller {
        let user = h
            .accounts
            .seed(SeedUser { name: name.into(), email: email.into(), password: "secret1".into(), role })
            .await
            .unwrap();
        Caller::new(user.id, user.role)
    }

    fn draft(title: &str) -> NewTicket {
        NewTicket {
            title: Some(title.into()),
            description: Some("Cannot log in since this morning".into()),
            priority: None,
        }
    }

    fn status(value: &str) -> TicketChanges {
        TicketChanges { status: Some(value.into()), ..Default::default() }
    }

    #[tokio::test]
    async fn test_full_ticket_lifecycle_notifies_client() {
        let h = harness();
        let client = account(&h, "Carla Client", "carla@example.com", Role::Client).await;
        let agent = account(&h, "Alex Agent", "alex@example.com", Role::Agent).await;

        let ticket = h.tickets.create_ticket(&client, draft("Login broken")).await.unwrap();
        assert_eq!(ticket.status, TicketStatus::Open);
        assert_eq!(ticket.priority, TicketPriority::Medium);

        let assign = TicketChanges {
            status: Some("in-progress".into()),
            agent_id: Some(Some(agent.id().to_string())),
            ..Default::default()
        };
        let ticket = h.tickets.update_ticket(&agent, &ticket.id, assign).await.unwrap();
        assert_eq!(ticket.agent_id.as_ref(), Some(agent.id()));

        h.tickets
            .add_comment(&agent, &ticket.id, NewComment { message: Some("Please clear your cache".into()) })
            .await
            .unwrap();
        h.tickets
            .add_comment(&client, &ticket.id, NewComment { message: Some("Done, thanks".into()) })
            .await
            .unwrap();

        let closed = h.tickets.update_ticket(&agent, &ticket.id, status("closed")).await.unwrap();
        let closed_at = closed.closed_at.unwrap();

        let reopened = h.tickets.update_ticket(&client, &ticket.id, status("open")).await.unwrap();
        assert_eq!(reopened.status, TicketStatus::Closed);
        assert_eq!(reopened.closed_at, Some(closed_at));

        let thread = h.tickets.list_comments(&client, &ticket.id).await.unwrap();
        assert_eq!(thread.len(), 2);

        h.dispatcher.shutdown().await;
        let kinds: Vec<_> = h.sink.delivered().iter().map(LifecycleEvent::event_type).collect();
        assert_eq!(kinds, ["ticket.created", "ticket.agent_replied", "ticket.closed"]);
        assert!(h.sink.delivered().iter().all(|e| e.recipient().email.as_str() == "carla@example.com"));
    }

    #[tokio::test]
    async fn test_clients_are_isolated() {
        let h = harness();
        let owner = account(&h, "Carla", "carla@example.com", Role::Client).await;
        let other = account(&h, "Otto", "otto@example.com", Role::Client).await;
        let ticket = h.tickets.create_ticket(&owner, draft("Printer jam")).await.unwrap();

        let forbidden = |r: Result<_, ServiceError>| matches!(r, Err(ServiceError::Policy(PolicyError::Forbidden(_))));
        assert!(forbidden(h.tickets.get_ticket(&other, &ticket.id).await.map(|_| ())));
        assert!(forbidden(h.tickets.list_comments(&other, &ticket.id).await.map(|_| ())));
        assert!(forbidden(h.tickets.delete_ticket(&other, &ticket.id).await));

        let listed = h.tickets.list_tickets(&other, ListTicketsQuery::default()).await.unwrap();
        assert!(listed.is_empty());
        let listed = h.tickets.list_tickets(&owner, ListTicketsQuery::default()).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    fn is_not_found<T>(result: Result<T, ServiceError>) -> bool {
        matches!(result, Err(ServiceError::Policy(PolicyError::NotFound(what))) if what == "ticket")
    }

    #[tokio::test]
    async fn test_missing_ticket_is_not_found() {
        let h = harness();
        let agent = account(&h, "Alex", "alex@example.com", Role::Agent).await;
        let missing = EntityId::from_string("nope");

        assert!(is_not_found(h.tickets.get_ticket(&agent, &missing).await));
        assert!(is_not_found(h.tickets.update_ticket(&agent, &missing, status("closed")).await));
        assert!(is_not_found(h.tickets.delete_ticket(&agent, &missing).await));
        assert!(is_not_found(h.tickets.list_comments(&agent, &missing).await));
        let reply = NewComment { message: Some("Anyone there?".into()) };
        assert!(is_not_found(h.tickets.add_comment(&agent, &missing, reply).await));
    }

    #[tokio::test]
    async fn test_comment_on_deleted_ticket_is_not_found() {
        let h = harness();
        let client = account(&h, "Carla", "carla@example.com", Role::Client).await;
        let ticket = h.tickets.create_ticket(&client, draft("Printer jam")).await.unwrap();
        h.tickets.delete_ticket(&client, &ticket.id).await.unwrap();

        let late = NewComment { message: Some("Still jammed".into()) };
        assert!(is_not_found(h.tickets.add_comment(&client, &ticket.id, late).await));
        assert!(is_not_found(h.tickets.delete_ticket(&client, &ticket.id).await));
    }

    #[tokio::test]
    async fn test_assignee_must_be_agent() {
        let h = harness();
        let client = account(&h, "Carla", "carla@example.com", Role::Client).await;
        let agent = account(&h, "Alex", "alex@example.com", Role::Agent).await;
        let ticket = h.tickets.create_ticket(&client, draft("Printer jam")).await.unwrap();

        let to_client = TicketChanges { agent_id: Some(Some(client.id().to_string())), ..Default::default() };
        let result = h.tickets.update_ticket(&agent, &ticket.id, to_client).await;
        assert!(matches!(result, Err(ServiceError::Policy(PolicyError::ValidationFailed(_)))));

        let bad_everywhere = TicketChanges {
            title: Some("no".into()),
            agent_id: Some(Some(client.id().to_string())),
            ..Default::default()
        };
        match h.tickets.update_ticket(&agent, &ticket.id, bad_everywhere).await {
            Err(ServiceError::Policy(PolicyError::ValidationFailed(fields))) => {
                let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, ["title", "agentId"]);
            }
            other => panic!("expected validation failure, got {other:?}"),
        }

        let to_agent = TicketChanges { agent_id: Some(Some(agent.id().to_string())), ..Default::default() };
        let assigned = h.tickets.update_ticket(&agent, &ticket.id, to_agent).await.unwrap();
        assert_eq!(assigned.agent_id.as_ref(), Some(agent.id()));
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_write() {
        let h = harness_with(Arc::new(RecordingSink::failing()));
        let client = account(&h, "Carla", "carla@example.com", Role::Client).await;
        let ticket = h.tickets.create_ticket(&client, draft("Printer jam")).await.unwrap();
        h.dispatcher.shutdown().await;
        assert!(h.tickets.get_ticket(&client, &ticket.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_stale_caller_cannot_create() {
        let h = harness();
        let ghost = Caller::Client { id: EntityId::from_string("ghost") };
        let result = h.tickets.create_ticket(&ghost, draft("Printer jam")).await;
        assert!(matches!(result, Err(ServiceError::Policy(PolicyError::Unauthenticated))));
    }

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let h = harness();
        let registration = Registration {
            name: Some("Carla Client".into()),
            email: Some("Carla@Example.com".into()),
            password: Some("secret1".into()),
        };
        let user = h.accounts.register(registration.clone()).await.unwrap();
        assert_eq!(user.role, Role::Client);
        assert_eq!(user.email.as_str(), "carla@example.com");

        assert!(matches!(h.accounts.register(registration).await, Err(ServiceError::Conflict(_))));

        let found = h.accounts.authenticate("carla@example.com", "secret1").await.unwrap();
        assert_eq!(found.id, user.id);
        assert!(matches!(
            h.accounts.authenticate("carla@example.com", "wrong").await,
            Err(ServiceError::InvalidCredentials)
        ));
        assert!(matches!(
            h.accounts.authenticate("nobody@example.com", "secret1").await,
            Err(ServiceError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_register_reports_every_violation() {
        let h = harness();
        let registration = Registration { name: Some("C".into()), email: Some("not-an-email".into()), password: Some("123".into()) };
        match h.accounts.register(registration).await {
            Err(ServiceError::Policy(PolicyError::ValidationFailed(fields))) => {
                let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, ["name", "email", "password"]);
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let h = harness();
        let first = account(&h, "Alex", "alex@example.com", Role::Agent).await;
        let second = account(&h, "Alex", "alex@example.com", Role::Agent).await;
        assert_eq!(first, second);
        assert_eq!(h.accounts.list_users(Some(Role::Agent)).await.unwrap().len(), 1);
    }
}
