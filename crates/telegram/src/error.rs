use {
    courier_dispatch::TransportError,
    teloxide::{ApiError, RequestError},
    thiserror::Error,
};

/// Failure while connecting to the Bot API.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Telegram(#[from] RequestError),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Map a Bot API failure onto the engine's transport error.
///
/// A competing `getUpdates` consumer is the only fatal case.
pub(crate) fn transport_error(operation: &'static str, error: RequestError) -> TransportError {
    match error {
        RequestError::Api(ApiError::TerminatedByOtherGetUpdates) => TransportError::Conflict,
        other => TransportError::request(operation, other),
    }
}
