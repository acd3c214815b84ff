//! Two-phase host operations
//!
//! A method that starts long-running host work returns immediately with an [`OperationTicket`]
//! while the host keeps the matching [`CompletionSignal`]. Firing the signal resolves the ticket
//! and publishes a [`CompletionNotice`] to every subscriber.

use chrono::SecondsFormat;
use chrono::Utc;
use error_stack::Report;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::sync::oneshot;
use tracing::debug;
use uuid::Uuid;

use crate::constants::COMPLETION_CHANNEL_CAPACITY;
use crate::error::Error;
use crate::error::Result;

/// Published when a two-phase operation finishes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionNotice {
    /// Id of the finished operation
    pub id:           Uuid,
    /// What the operation was started for
    pub description:  String,
    /// Host supplied completion message
    pub message:      String,
    /// RFC 3339 completion time
    pub completed_at: String,
}

/// Caller side of a started operation
#[derive(Debug)]
pub struct OperationTicket {
    id:          Uuid,
    description: String,
    receiver:    oneshot::Receiver<CompletionNotice>,
}

impl OperationTicket {
    /// Operation id, also carried by the matching [`CompletionNotice`]
    pub const fn id(&self) -> Uuid { self.id }

    /// What the operation was started for
    pub fn description(&self) -> &str { &self.description }

    /// Wait for the host to fire the completion signal
    pub async fn wait(self) -> Result<CompletionNotice> {
        self.receiver.await.map_err(|_| {
            Report::new(Error::HostOperation(format!(
                "operation '{}' ({}) was abandoned before completing",
                self.description, self.id
            )))
        })
    }
}

/// Host side of a started operation; consumed when fired
#[derive(Debug)]
pub struct CompletionSignal {
    id:          Uuid,
    description: String,
    sender:      oneshot::Sender<CompletionNotice>,
    notices:     broadcast::Sender<CompletionNotice>,
}

impl CompletionSignal {
    /// Operation id
    pub const fn id(&self) -> Uuid { self.id }

    /// What the operation was started for
    pub fn description(&self) -> &str { &self.description }

    /// Mark the operation finished
    pub fn complete(self, message: impl Into<String>) {
        let notice = CompletionNotice {
            id:           self.id,
            description:  self.description,
            message:      message.into(),
            completed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        debug!(id = %notice.id, description = %notice.description, "Operation completed");
        // nobody listening is fine
        let _ = self.notices.send(notice.clone());
        let _ = self.sender.send(notice);
    }
}

/// Factory for operation tickets plus the broadcast channel of their completions
#[derive(Debug, Clone)]
pub struct PendingOperations {
    notices: broadcast::Sender<CompletionNotice>,
}

impl Default for PendingOperations {
    fn default() -> Self { Self::new() }
}

impl PendingOperations {
    /// No operations yet, with a fresh completion channel
    pub fn new() -> Self {
        let (notices, _) = broadcast::channel(COMPLETION_CHANNEL_CAPACITY);
        Self { notices }
    }

    /// Start tracking an operation
    pub fn start(&self, description: impl Into<String>) -> (OperationTicket, CompletionSignal) {
        let id = Uuid::new_v4();
        let description = description.into();
        let (sender, receiver) = oneshot::channel();
        debug!(%id, %description, "Operation started");
        (
            OperationTicket {
                id,
                description: description.clone(),
                receiver,
            },
            CompletionSignal {
                id,
                description,
                sender,
                notices: self.notices.clone(),
            },
        )
    }

    /// Receive every completion notice published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<CompletionNotice> { self.notices.subscribe() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signal_resolves_ticket_and_broadcasts() {
        let operations = PendingOperations::new();
        let mut notices = operations.subscribe();
        let (ticket, signal) = operations.start("bake lighting");
        let id = ticket.id();

        signal.complete("Lighting baked.");

        let notice = ticket.wait().await.expect("ticket should resolve");
        assert_eq!(notice.id, id);
        assert_eq!(notice.message, "Lighting baked.");
        assert_eq!(notices.recv().await.ok(), Some(notice));
    }

    #[tokio::test]
    async fn test_dropped_signal_abandons_ticket() {
        let operations = PendingOperations::new();
        let (ticket, signal) = operations.start("import asset");
        drop(signal);
        let error = ticket.wait().await.expect_err("ticket should fail");
        assert!(matches!(error.current_context(), Error::HostOperation(_)));
    }
}
