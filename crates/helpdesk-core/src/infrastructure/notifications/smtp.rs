//! SMTP delivery via lettre (STARTTLS relay)

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::{Deserialize, Serialize};

use super::templates;
use crate::domain::events::LifecycleEvent;
use crate::ports::outbound::{NotificationError, NotificationSink};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmtpSettings {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sender mailbox, e.g. `HelpDesk <support@example.com>`
    pub from: String,
}

fn default_port() -> u16 {
    587
}

pub struct SmtpSink {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpSink {
    pub fn new(settings: &SmtpSettings) -> Result<Self, NotificationError> {
        let from: Mailbox = settings
            .from
            .parse()
            .map_err(|e| NotificationError::Build(format!("invalid sender {}: {e}", settings.from)))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .map_err(|e| NotificationError::Transport(e.to_string()))?
            .port(settings.port);
        if let (Some(user), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        Ok(Self { transport: builder.build(), from })
    }
}

#[async_trait]
impl NotificationSink for SmtpSink {
    fn name(&self) -> &'static str {
        "smtp"
    }

    async fn deliver(&self, event: &LifecycleEvent) -> Result<(), NotificationError> {
        let email = templates::render(event);
        let address: Address = email
            .to
            .as_str()
            .parse()
            .map_err(|e| NotificationError::Build(format!("invalid recipient: {e}")))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(Mailbox::new(Some(email.to_name), address))
            .subject(email.subject)
            .header(ContentType::TEXT_HTML)
            .body(email.html)
            .map_err(|e| NotificationError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| NotificationError::Transport(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_sender() {
        let settings = SmtpSettings {
            host: "smtp.example.com".into(),
            port: 587,
            username: None,
            password: None,
            from: "not a mailbox".into(),
        };
        assert!(matches!(SmtpSink::new(&settings), Err(NotificationError::Build(_))));
    }

    #[test]
    fn test_settings_default_port() {
        let settings: SmtpSettings =
            serde_json::from_str(r#"{"host":"smtp.example.com","from":"HelpDesk <support@example.com>"}"#).unwrap();
        assert_eq!(settings.port, 587);
    }
}
