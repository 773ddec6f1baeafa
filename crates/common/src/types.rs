use std::fmt;

use crate::error::{Error, Result};

// ── Identifiers ─────────────────────────────────────────────────────────────

/// Chat/conversation key on the remote platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationId(pub i64);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque per-delivery identifier. For callbacks this is the callback query
/// id that must be echoed back when acknowledging.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventId(pub String);

impl EventId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The human (or bot) who produced an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

// ── Raw inbound shape ───────────────────────────────────────────────────────

/// Transport-neutral projection of one platform update, before classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawUpdate {
    pub update_id: i64,
    pub message: Option<RawMessage>,
    pub callback: Option<RawCallback>,
    /// Name of an update type the transport received but does not project.
    pub other: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub message_id: i32,
    pub chat_id: i64,
    pub from: Option<Sender>,
    pub text: Option<String>,
    pub has_media: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCallback {
    pub id: String,
    pub from: Sender,
    /// Chat of the message carrying the pressed button, when still accessible.
    pub chat_id: Option<i64>,
    pub data: Option<String>,
}

// ── Classified event ────────────────────────────────────────────────────────

/// Kind tag plus kind-specific payload. Exactly one per event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Command { name: String, args: String },
    Text { text: String },
    Callback { data: String },
    /// Anything the classifier does not recognise. Never an error.
    Unknown { shape: String },
}

impl EventKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Command { .. } => "command",
            Self::Text { .. } => "text",
            Self::Callback { .. } => "callback",
            Self::Unknown { .. } => "unknown",
        }
    }
}

/// One normalized inbound occurrence. Handlers only ever see `&Event`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: EventId,
    pub update_id: i64,
    /// Always set for command, text and callback events.
    pub source: Option<ConversationId>,
    pub sender: Option<Sender>,
    pub kind: EventKind,
}

impl Event {
    /// Conversation that replies should be delivered into.
    pub fn reply_target(&self) -> Result<ConversationId> {
        self.source.ok_or_else(|| Error::no_conversation(&self.id))
    }

    /// First name of the sender, or an empty string for anonymous events.
    pub fn sender_first_name(&self) -> &str {
        self.sender
            .as_ref()
            .map(|s| s.first_name.as_str())
            .unwrap_or("")
    }
}

// ── Outbound action ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaRef {
    Url(String),
}

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineButton {
    Url { label: String, url: String },
    Callback { label: String, data: String },
}

/// Interactive layout attached to an action. Built by handlers, only carried
/// by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Markup {
    ReplyKeyboard { rows: Vec<Vec<String>>, resize: bool },
    InlineKeyboard { rows: Vec<Vec<InlineButton>> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    SendText { text: String },
    SendMedia { media: MediaRef, caption: Option<String> },
    AcknowledgeCallback { callback_id: String, note: Option<String> },
}

impl ActionKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::SendText { .. } => "send_text",
            Self::SendMedia { .. } => "send_media",
            Self::AcknowledgeCallback { .. } => "acknowledge_callback",
        }
    }
}

/// One outbound effect requested by a handler, consumed exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub target: ConversationId,
    pub kind: ActionKind,
    pub markup: Option<Markup>,
}

impl Action {
    pub fn text(target: ConversationId, text: impl Into<String>) -> Self {
        Self {
            target,
            kind: ActionKind::SendText { text: text.into() },
            markup: None,
        }
    }

    pub fn media(target: ConversationId, media: MediaRef) -> Self {
        Self {
            target,
            kind: ActionKind::SendMedia {
                media,
                caption: None,
            },
            markup: None,
        }
    }

    pub fn acknowledge(
        target: ConversationId,
        callback_id: impl Into<String>,
        note: Option<String>,
    ) -> Self {
        Self {
            target,
            kind: ActionKind::AcknowledgeCallback {
                callback_id: callback_id.into(),
                note,
            },
            markup: None,
        }
    }

    #[must_use]
    pub fn with_markup(mut self, markup: Markup) -> Self {
        self.markup = Some(markup);
        self
    }

    /// Text body for `SendText`, caption for `SendMedia`, note for acknowledgements.
    pub fn body(&self) -> Option<&str> {
        match &self.kind {
            ActionKind::SendText { text } => Some(text),
            ActionKind::SendMedia { caption, .. } => caption.as_deref(),
            ActionKind::AcknowledgeCallback { note, .. } => note.as_deref(),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_target_requires_source() {
        let mut event = Event {
            id: EventId("9".into()),
            update_id: 9,
            source: None,
            sender: None,
            kind: EventKind::Unknown {
                shape: "poll".into(),
            },
        };
        let err = event.reply_target().unwrap_err();
        assert!(err.to_string().contains("event 9"));

        event.source = Some(ConversationId(42));
        assert_eq!(event.reply_target().unwrap(), ConversationId(42));
    }

    #[test]
    fn action_body_per_kind() {
        let target = ConversationId(1);
        assert_eq!(Action::text(target, "hi").body(), Some("hi"));
        assert_eq!(
            Action::media(target, MediaRef::Url("https://x/y.jpg".into())).body(),
            None
        );
        assert_eq!(
            Action::acknowledge(target, "abc", Some("button1".into())).body(),
            Some("button1")
        );
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(
            EventKind::Callback {
                data: String::new()
            }
            .label(),
            "callback"
        );
        assert_eq!(
            ActionKind::SendText {
                text: String::new()
            }
            .label(),
            "send_text"
        );
    }
}
