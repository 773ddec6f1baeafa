use std::time::Duration;

use {
    courier_config::TelegramConfig,
    courier_dispatch::{BotIdentity, COMMANDS},
    secrecy::ExposeSecret,
    teloxide::{prelude::*, types::BotCommand},
    tracing::{info, warn},
};

use crate::{
    error::{Error, Result},
    outbound::TelegramOutbound,
    poller::TelegramPoller,
};

/// Verify the token and prepare long polling.
///
/// Fails if the Bot API rejects the token or cannot be reached. Command
/// registration failures are logged and ignored.
pub async fn connect(config: &TelegramConfig) -> Result<(TelegramPoller, TelegramOutbound)> {
    if config.token.expose_secret().trim().is_empty() {
        return Err(Error::message("telegram bot token is empty"));
    }

    // Client timeout has to outlive the long-poll timeout, otherwise the HTTP
    // layer aborts the request before Telegram answers.
    let client = teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()?;
    let bot = Bot::with_client(config.token.expose_secret(), client);

    let me = bot.get_me().await?;
    let identity = BotIdentity {
        id: me.id.0 as i64,
        first_name: me.first_name.clone(),
        username: me.username.clone(),
    };

    // Long polling and webhooks are mutually exclusive.
    bot.delete_webhook().send().await?;

    if config.register_commands
        && let Err(e) = bot.set_my_commands(bot_commands()).await
    {
        warn!("failed to register bot commands: {e}");
    }

    info!(
        bot = %identity.handle(),
        id = identity.id,
        "telegram bot connected (webhook cleared)"
    );

    Ok((
        TelegramPoller::new(bot.clone(), identity, config.poll_timeout_secs),
        TelegramOutbound::new(bot),
    ))
}

/// Slash commands offered for autocomplete, in menu order.
pub fn bot_commands() -> Vec<BotCommand> {
    COMMANDS
        .iter()
        .map(|row| BotCommand::new(row.name, row.description))
        .collect()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_match_routing_table() {
        let commands = bot_commands();
        assert_eq!(commands.len(), COMMANDS.len());
        assert_eq!(commands[0].command, "start");
        assert!(commands.iter().any(|c| c.command == "photo"));
        assert!(commands.iter().all(|c| !c.description.is_empty()));
    }

    #[tokio::test]
    async fn empty_token_is_rejected_before_any_request() {
        let config = TelegramConfig::default();
        let err = connect(&config).await.err().unwrap();
        assert!(err.to_string().contains("token is empty"));
    }
}
