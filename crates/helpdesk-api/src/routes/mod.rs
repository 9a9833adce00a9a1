//! API Routes

pub mod health;
pub mod auth;
pub mod users;
pub mod tickets;
pub mod comments;

use std::collections::HashMap;

use helpdesk_core::{AccountUseCases, Comment, EntityId, PolicyError, ServiceError, Ticket};

use crate::error::ApiError;
use crate::models::{CommentView, TicketView, UserSummary};

/// Fills in the people a ticket or comment refers to, looking each user up
/// once per response.
pub(crate) struct People<'a> {
    accounts: &'a dyn AccountUseCases,
    seen: HashMap<EntityId, Option<UserSummary>>,
}

impl<'a> People<'a> {
    pub(crate) fn new(accounts: &'a dyn AccountUseCases) -> Self {
        Self { accounts, seen: HashMap::new() }
    }

    async fn summary(&mut self, id: &EntityId) -> Result<Option<UserSummary>, ApiError> {
        if let Some(known) = self.seen.get(id) {
            return Ok(known.clone());
        }
        let found = match self.accounts.get_user(id).await {
            Ok(user) => Some(UserSummary::from(user)),
            Err(ServiceError::Policy(PolicyError::NotFound(_))) => None,
            Err(e) => return Err(e.into()),
        };
        self.seen.insert(id.clone(), found.clone());
        Ok(found)
    }

    pub(crate) async fn ticket(&mut self, ticket: Ticket) -> Result<TicketView, ApiError> {
        let client = self.summary(&ticket.client_id).await?;
        let agent = match &ticket.agent_id {
            Some(id) => self.summary(id).await?,
            None => None,
        };
        Ok(TicketView { client, agent, ..TicketView::from(ticket) })
    }

    pub(crate) async fn tickets(&mut self, tickets: Vec<Ticket>) -> Result<Vec<TicketView>, ApiError> {
        let mut views = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            views.push(self.ticket(ticket).await?);
        }
        Ok(views)
    }

    pub(crate) async fn comment(&mut self, comment: Comment) -> Result<CommentView, ApiError> {
        let author_user = self.summary(&comment.author).await?;
        Ok(CommentView { author_user, ..CommentView::from(comment) })
    }

    pub(crate) async fn comments(&mut self, comments: Vec<Comment>) -> Result<Vec<CommentView>, ApiError> {
        let mut views = Vec::with_capacity(comments.len());
        for comment in comments {
            views.push(self.comment(comment).await?);
        }
        Ok(views)
    }
}
