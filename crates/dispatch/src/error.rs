use std::{error::Error as StdError, time::Duration};

use crate::route::Route;

/// Failure returned by a handler for a well-formed event.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error(transparent)]
    Event(#[from] courier_common::Error),

    /// The handler was wired to a route whose events it cannot process.
    #[error("handler expects a {expected} event, got {got}")]
    UnexpectedKind {
        expected: &'static str,
        got: &'static str,
    },

    #[error("{message}")]
    Message { message: String },

    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl HandlerError {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

/// Failure talking to the remote platform, inbound or outbound.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Another process is polling with the same credential. Not recoverable.
    #[error("another poller is already using this bot token")]
    Conflict,

    /// The transport is not ready or the platform rejected the call outright.
    #[error("transport unavailable: {message}")]
    Unavailable { message: String },

    #[error("{context}: {source}")]
    Request {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl TransportError {
    #[must_use]
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn request(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Request {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Whether the ingestion loop has to stop instead of retrying.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Conflict)
    }
}

/// Why one handling unit did not complete. Reported, never propagated to
/// the ingestion loop.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("no handler registered for route {route}")]
    NoHandler { route: Route },

    #[error("handler for route {route} failed: {source}")]
    Handler {
        route: Route,
        #[source]
        source: HandlerError,
    },

    /// The handler succeeded but produced nothing to send.
    #[error("handler for route {route} returned no actions")]
    EmptyReply { route: Route },

    /// Delivery stopped at `index`; later actions of the unit were dropped.
    #[error("delivering {action} ({} of {total}) failed: {source}", .index + 1)]
    Delivery {
        action: &'static str,
        index: usize,
        total: usize,
        #[source]
        source: TransportError,
    },

    #[error("handling unit abandoned after {after:?}")]
    Timeout { after: Duration },

    #[error("handler panicked: {message}")]
    Panicked { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_conflict_is_fatal() {
        assert!(TransportError::Conflict.is_fatal());
        assert!(!TransportError::unavailable("down").is_fatal());
        assert!(!TransportError::request("send", std::io::Error::other("boom")).is_fatal());
    }

    #[test]
    fn delivery_error_counts_from_one() {
        let err = DispatchError::Delivery {
            action: "send_text",
            index: 1,
            total: 2,
            source: TransportError::unavailable("rate limited"),
        };
        assert_eq!(
            err.to_string(),
            "delivering send_text (2 of 2) failed: transport unavailable: rate limited"
        );
    }
}
