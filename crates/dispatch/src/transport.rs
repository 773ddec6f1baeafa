use {
    async_trait::async_trait,
    courier_common::types::{Action, ActionKind, RawUpdate},
};

use crate::error::TransportError;

/// The bot's own account, as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub id: i64,
    pub first_name: String,
    pub username: Option<String>,
}

impl BotIdentity {
    /// `@username` when the bot has one, else its first name.
    pub fn handle(&self) -> String {
        match &self.username {
            Some(username) => format!("@{username}"),
            None => self.first_name.clone(),
        }
    }
}

/// Pull side of the transport. Owned by the ingestion loop, so at most one
/// `poll` is ever in flight.
#[async_trait]
pub trait UpdateSource: Send {
    async fn identity(&self) -> Result<BotIdentity, TransportError>;

    /// Wait for the next batch of updates. An empty batch is a normal
    /// long-poll expiry.
    async fn poll(&mut self) -> Result<Vec<RawUpdate>, TransportError>;
}

/// Send side of the transport. Shared by every concurrent handling unit.
#[async_trait]
pub trait Outbound: Send + Sync {
    /// Deliver a message or media action.
    async fn send(&self, action: &Action) -> Result<(), TransportError>;

    /// Dismiss the client-side spinner of a pressed button, optionally with a
    /// toast note.
    async fn acknowledge_callback(
        &self,
        callback_id: &str,
        note: Option<&str>,
    ) -> Result<(), TransportError>;

    /// Route an action to `send` or `acknowledge_callback`.
    async fn deliver(&self, action: &Action) -> Result<(), TransportError> {
        match &action.kind {
            ActionKind::AcknowledgeCallback { callback_id, note } => {
                self.acknowledge_callback(callback_id, note.as_deref())
                    .await
            },
            ActionKind::SendText { .. } | ActionKind::SendMedia { .. } => self.send(action).await,
        }
    }
}
