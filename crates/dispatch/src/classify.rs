//! Raw update → [`Event`] projection. Pure and total: every raw shape yields
//! exactly one event, unrecognised shapes become [`EventKind::Unknown`].

use courier_common::types::{
    ConversationId, Event, EventId, EventKind, RawCallback, RawMessage, RawUpdate,
};

pub fn classify(raw: &RawUpdate) -> Event {
    if let Some(message) = &raw.message {
        return classify_message(raw.update_id, message);
    }
    if let Some(callback) = &raw.callback {
        return classify_callback(raw.update_id, callback);
    }
    Event {
        id: EventId(raw.update_id.to_string()),
        update_id: raw.update_id,
        source: None,
        sender: None,
        kind: EventKind::Unknown {
            shape: raw.other.clone().unwrap_or_else(|| "empty update".into()),
        },
    }
}

fn classify_message(update_id: i64, message: &RawMessage) -> Event {
    let kind = match message.text.as_deref() {
        Some(text) => parse_command(text).unwrap_or_else(|| EventKind::Text {
            text: text.to_string(),
        }),
        None if message.has_media => EventKind::Unknown {
            shape: "media message".into(),
        },
        None => EventKind::Unknown {
            shape: "non-text message".into(),
        },
    };
    Event {
        id: EventId(update_id.to_string()),
        update_id,
        source: Some(ConversationId(message.chat_id)),
        sender: message.from.clone(),
        kind,
    }
}

fn classify_callback(update_id: i64, callback: &RawCallback) -> Event {
    // A private chat id equals the user id, so the presser is a usable
    // fallback when the button's message is no longer accessible.
    let chat_id = callback.chat_id.unwrap_or(callback.from.id);
    Event {
        id: EventId(callback.id.clone()),
        update_id,
        source: Some(ConversationId(chat_id)),
        sender: Some(callback.from.clone()),
        kind: EventKind::Callback {
            data: callback.data.clone().unwrap_or_default(),
        },
    }
}

/// `/name[@bot] [args]` → `Command`. A bare `/` or `/ text` is not a command.
fn parse_command(text: &str) -> Option<EventKind> {
    let rest = text.strip_prefix('/')?;
    let (head, args) = match rest.find(char::is_whitespace) {
        Some(split) => (&rest[..split], rest[split..].trim_start()),
        None => (rest, ""),
    };
    let name = head.split('@').next().unwrap_or_default();
    if name.is_empty() {
        return None;
    }
    Some(EventKind::Command {
        name: name.to_string(),
        args: args.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use {super::*, courier_common::types::Sender, rstest::rstest};

    fn alice() -> Sender {
        Sender {
            id: 1001,
            first_name: "Alice".into(),
            last_name: None,
            username: Some("alice".into()),
        }
    }

    fn text_update(text: &str) -> RawUpdate {
        RawUpdate {
            update_id: 10,
            message: Some(RawMessage {
                message_id: 1,
                chat_id: 42,
                from: Some(alice()),
                text: Some(text.into()),
                has_media: false,
            }),
            ..Default::default()
        }
    }

    #[rstest]
    #[case("/start", "start", "")]
    #[case("/help@courier_bot", "help", "")]
    #[case("/photo  cats and dogs", "photo", "cats and dogs")]
    #[case("/nope\nmore", "nope", "more")]
    fn commands(#[case] input: &str, #[case] name: &str, #[case] args: &str) {
        let event = classify(&text_update(input));
        assert_eq!(
            event.kind,
            EventKind::Command {
                name: name.into(),
                args: args.into()
            }
        );
        assert_eq!(event.source, Some(ConversationId(42)));
        assert_eq!(event.id, EventId("10".into()));
    }

    #[rstest]
    #[case("hello")]
    #[case("时间")]
    #[case("/")]
    #[case("/ spaced")]
    #[case("/@bot")]
    #[case("")]
    fn plain_text(#[case] input: &str) {
        let event = classify(&text_update(input));
        assert_eq!(
            event.kind,
            EventKind::Text {
                text: input.into()
            }
        );
        assert_eq!(event.sender, Some(alice()));
    }

    #[test]
    fn callback_uses_query_id_and_message_chat() {
        let raw = RawUpdate {
            update_id: 11,
            callback: Some(RawCallback {
                id: "abc".into(),
                from: alice(),
                chat_id: Some(42),
                data: Some("button1".into()),
            }),
            ..Default::default()
        };
        let event = classify(&raw);
        assert_eq!(event.id, EventId("abc".into()));
        assert_eq!(event.source, Some(ConversationId(42)));
        assert_eq!(
            event.kind,
            EventKind::Callback {
                data: "button1".into()
            }
        );
    }

    #[test]
    fn callback_without_message_falls_back_to_sender() {
        let raw = RawUpdate {
            update_id: 12,
            callback: Some(RawCallback {
                id: "def".into(),
                from: alice(),
                chat_id: None,
                data: None,
            }),
            ..Default::default()
        };
        let event = classify(&raw);
        assert_eq!(event.source, Some(ConversationId(1001)));
        assert_eq!(
            event.kind,
            EventKind::Callback {
                data: String::new()
            }
        );
    }

    #[rstest]
    #[case(true, "media message")]
    #[case(false, "non-text message")]
    fn textless_message_is_unknown_with_source(#[case] has_media: bool, #[case] shape: &str) {
        let raw = RawUpdate {
            update_id: 13,
            message: Some(RawMessage {
                message_id: 2,
                chat_id: 42,
                from: None,
                text: None,
                has_media,
            }),
            ..Default::default()
        };
        let event = classify(&raw);
        assert_eq!(
            event.kind,
            EventKind::Unknown {
                shape: shape.into()
            }
        );
        assert_eq!(event.source, Some(ConversationId(42)));
    }

    #[rstest]
    #[case(None, "empty update")]
    #[case(Some("poll"), "poll")]
    fn unrecognised_update_is_unknown_without_source(
        #[case] other: Option<&str>,
        #[case] shape: &str,
    ) {
        let raw = RawUpdate {
            update_id: 14,
            other: other.map(Into::into),
            ..Default::default()
        };
        let event = classify(&raw);
        assert_eq!(event.source, None);
        assert_eq!(
            event.kind,
            EventKind::Unknown {
                shape: shape.into()
            }
        );
    }

    #[test]
    fn message_wins_over_callback() {
        let mut raw = text_update("hi");
        raw.callback = Some(RawCallback {
            id: "abc".into(),
            from: alice(),
            chat_id: Some(42),
            data: Some("x".into()),
        });
        assert_eq!(classify(&raw).kind.label(), "text");
    }

    #[test]
    fn classification_is_idempotent() {
        let inputs = [
            text_update("/start"),
            text_update("hello"),
            RawUpdate::default(),
        ];
        for raw in &inputs {
            assert_eq!(classify(raw), classify(raw));
        }
    }
}
