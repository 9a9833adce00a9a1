//! Email bodies for lifecycle notifications

use crate::domain::events::LifecycleEvent;
use crate::domain::value_objects::Email;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedEmail {
    pub to_name: String,
    pub to: Email,
    pub subject: String,
    pub html: String,
}

pub fn render(event: &LifecycleEvent) -> RenderedEmail {
    let client = event.recipient();
    let (subject, body) = match event {
        LifecycleEvent::TicketCreated { title, description, .. } => (
            format!("Ticket created: {title}"),
            format!(
                "<p>Hello {name},</p>\
                 <p>We received your ticket <strong>{title}</strong> and an agent will look at it shortly.</p>\
                 <blockquote>{description}</blockquote>",
                name = escape(&client.name),
                title = escape(title),
                description = escape(description),
            ),
        ),
        LifecycleEvent::AgentReplied { ticket_title, agent_name, message, .. } => (
            format!("New reply on your ticket: {ticket_title}"),
            format!(
                "<p>Hello {name},</p>\
                 <p>{agent} replied to <strong>{title}</strong>:</p>\
                 <blockquote>{message}</blockquote>",
                name = escape(&client.name),
                agent = escape(agent_name),
                title = escape(ticket_title),
                message = escape(message),
            ),
        ),
        LifecycleEvent::TicketClosed { title, closed_at, .. } => (
            format!("Ticket closed: {title}"),
            format!(
                "<p>Hello {name},</p>\
                 <p>Your ticket <strong>{title}</strong> was closed on {closed}.</p>\
                 <p>Reply to reopen the conversation if the problem persists.</p>",
                name = escape(&client.name),
                title = escape(title),
                closed = closed_at.format("%Y-%m-%d %H:%M UTC"),
            ),
        ),
    };

    RenderedEmail {
        to_name: client.name.clone(),
        to: client.email.clone(),
        subject,
        html: format!("<html><body>{body}<p>Ticket reference: {}</p></body></html>", event.ticket_id()),
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::Contact;
    use crate::domain::value_objects::EntityId;
    use chrono::{TimeZone, Utc};

    fn contact() -> Contact {
        Contact { name: "Carla".into(), email: Email::parse("carla@example.com").unwrap() }
    }

    #[test]
    fn test_subjects_per_event() {
        let created = LifecycleEvent::TicketCreated {
            ticket_id: EntityId::from_string("t1"),
            title: "Login broken".into(),
            description: "Cannot log in".into(),
            client: contact(),
        };
        let email = render(&created);
        assert_eq!(email.subject, "Ticket created: Login broken");
        assert_eq!(email.to.as_str(), "carla@example.com");

        let closed = LifecycleEvent::TicketClosed {
            ticket_id: EntityId::from_string("t1"),
            title: "Login broken".into(),
            closed_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
            client: contact(),
        };
        let email = render(&closed);
        assert_eq!(email.subject, "Ticket closed: Login broken");
        assert!(email.html.contains("2024-03-01 09:30 UTC"));
    }

    #[test]
    fn test_reply_body_is_escaped() {
        let replied = LifecycleEvent::AgentReplied {
            ticket_id: EntityId::from_string("t1"),
            ticket_title: "Login broken".into(),
            client: contact(),
            agent_name: "Alex".into(),
            message: "<script>alert('x')</script>".into(),
        };
        let email = render(&replied);
        assert_eq!(email.subject, "New reply on your ticket: Login broken");
        assert!(email.html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
        assert!(!email.html.contains("<script>"));
    }
}
