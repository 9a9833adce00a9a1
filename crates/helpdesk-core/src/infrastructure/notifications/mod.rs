//! Lifecycle notification dispatch
//!
//! Events are queued on an unbounded channel and delivered by a single
//! background worker to every configured sink. Delivery is best effort: a
//! failing sink is logged and the event is dropped for that sink. The write
//! that raised the event never waits on delivery.

pub mod smtp;
pub mod templates;

pub use smtp::{SmtpSettings, SmtpSink};

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::events::LifecycleEvent;
use crate::ports::outbound::{NotificationError, NotificationSink};

pub struct NotificationDispatcher {
    tx: Mutex<Option<mpsc::UnboundedSender<LifecycleEvent>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl NotificationDispatcher {
    /// Start the delivery worker. Must be called from within a tokio runtime.
    pub fn spawn(sinks: Vec<Arc<dyn NotificationSink>>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<LifecycleEvent>();
        let worker = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                for sink in &sinks {
                    if let Err(e) = sink.deliver(&event).await {
                        tracing::error!(
                            sink = sink.name(),
                            event = event.event_type(),
                            ticket_id = %event.ticket_id(),
                            error = %e,
                            "notification delivery failed"
                        );
                    }
                }
            }
            tracing::debug!("notification worker stopped");
        });

        Self {
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        }
    }

    pub fn dispatch(&self, events: Vec<LifecycleEvent>) {
        let guard = self.tx.lock();
        let Some(tx) = guard.as_ref() else {
            tracing::warn!(dropped = events.len(), "dispatcher shut down; dropping notifications");
            return;
        };
        for event in events {
            if tx.send(event).is_err() {
                tracing::warn!("notification worker gone; dropping event");
            }
        }
    }

    /// Stop accepting events and wait until queued ones are delivered
    pub async fn shutdown(&self) {
        self.tx.lock().take();
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                tracing::error!(error = %e, "notification worker panicked");
            }
        }
    }
}

/// Writes each event to the log; the default sink when SMTP is not configured
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn deliver(&self, event: &LifecycleEvent) -> Result<(), NotificationError> {
        let email = templates::render(event);
        tracing::info!(
            event = event.event_type(),
            ticket_id = %event.ticket_id(),
            to = %email.to,
            subject = %email.subject,
            "notification"
        );
        Ok(())
    }
}

/// Keeps delivered events in memory; optionally fails every delivery
#[derive(Default)]
pub struct RecordingSink {
    delivered: Mutex<Vec<LifecycleEvent>>,
    failing: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { failing: true, ..Self::default() }
    }

    pub fn delivered(&self) -> Vec<LifecycleEvent> {
        self.delivered.lock().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn deliver(&self, event: &LifecycleEvent) -> Result<(), NotificationError> {
        if self.failing {
            return Err(NotificationError::Transport("recording sink set to fail".into()));
        }
        self.delivered.lock().push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::Contact;
    use crate::domain::value_objects::{Email, EntityId};

    fn created(id: &str) -> LifecycleEvent {
        LifecycleEvent::TicketCreated {
            ticket_id: EntityId::from_string(id),
            title: "Printer jam".into(),
            description: "Paper stuck in tray two".into(),
            client: Contact { name: "Carla".into(), email: Email::parse("carla@example.com").unwrap() },
        }
    }

    #[tokio::test]
    async fn test_delivers_in_order_to_every_sink() {
        let first = Arc::new(RecordingSink::new());
        let second = Arc::new(RecordingSink::new());
        let sinks: Vec<Arc<dyn NotificationSink>> = vec![first.clone(), second.clone()];
        let dispatcher = NotificationDispatcher::spawn(sinks);
        dispatcher.dispatch(vec![created("t1"), created("t2")]);
        dispatcher.shutdown().await;

        for sink in [&first, &second] {
            let ids: Vec<_> = sink.delivered().iter().map(|e| e.ticket_id().to_string()).collect();
            assert_eq!(ids, ["t1", "t2"]);
        }
    }

    #[tokio::test]
    async fn test_failing_sink_does_not_block_others() {
        let healthy = Arc::new(RecordingSink::new());
        let sinks: Vec<Arc<dyn NotificationSink>> = vec![Arc::new(RecordingSink::failing()), healthy.clone(), Arc::new(LogSink)];
        let dispatcher = NotificationDispatcher::spawn(sinks);
        dispatcher.dispatch(vec![created("t1")]);
        dispatcher.shutdown().await;
        assert_eq!(healthy.delivered().len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_after_shutdown_is_dropped() {
        let sink = Arc::new(RecordingSink::new());
        let dispatcher = NotificationDispatcher::spawn(vec![sink.clone() as Arc<dyn NotificationSink>]);
        dispatcher.shutdown().await;
        dispatcher.dispatch(vec![created("late")]);
        assert!(sink.delivered().is_empty());
    }
}
