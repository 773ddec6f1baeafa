use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// An operation needed the originating conversation but the event has none.
    #[error("event {event_id} has no conversation to reply into")]
    NoConversation { event_id: String },
}

impl Error {
    #[must_use]
    pub fn no_conversation(event_id: impl std::fmt::Display) -> Self {
        Self::NoConversation {
            event_id: event_id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
