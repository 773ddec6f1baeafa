use {
    async_trait::async_trait,
    courier_common::types::RawUpdate,
    courier_dispatch::{BotIdentity, TransportError, UpdateSource},
    teloxide::{prelude::*, types::AllowedUpdate},
    tracing::debug,
};

use crate::{convert, error::transport_error};

/// Long-poll `getUpdates` consumer. Tracks the offset so every update is
/// delivered to the engine once.
pub struct TelegramPoller {
    bot: Bot,
    identity: BotIdentity,
    offset: i32,
    poll_timeout_secs: u32,
}

impl TelegramPoller {
    pub fn new(bot: Bot, identity: BotIdentity, poll_timeout_secs: u32) -> Self {
        Self {
            bot,
            identity,
            offset: 0,
            poll_timeout_secs,
        }
    }
}

#[async_trait]
impl UpdateSource for TelegramPoller {
    async fn identity(&self) -> Result<BotIdentity, TransportError> {
        Ok(self.identity.clone())
    }

    async fn poll(&mut self) -> Result<Vec<RawUpdate>, TransportError> {
        let updates = self
            .bot
            .get_updates()
            .offset(self.offset)
            .timeout(self.poll_timeout_secs)
            .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::CallbackQuery])
            .await
            .map_err(|e| transport_error("getUpdates", e))?;

        if let Some(last) = updates.last() {
            self.offset = last.id.as_offset();
        }
        if !updates.is_empty() {
            debug!(count = updates.len(), offset = self.offset, "got telegram updates");
        }
        Ok(updates.iter().map(convert::raw_update).collect())
    }
}
