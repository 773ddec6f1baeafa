//! Telegram Bot API transport for the courier engine.
//!
//! [`connect`] verifies the token and returns a long-poll
//! [`UpdateSource`](courier_dispatch::UpdateSource) plus an
//! [`Outbound`](courier_dispatch::Outbound) sender, both backed by teloxide.

pub mod bot;
pub mod convert;
pub mod error;
pub mod outbound;
pub mod poller;

pub use {
    bot::connect,
    error::{Error, Result},
    outbound::TelegramOutbound,
    poller::TelegramPoller,
};
