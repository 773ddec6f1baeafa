//! teloxide update → platform-neutral [`RawUpdate`].

use {
    courier_common::types::{RawCallback, RawMessage, RawUpdate, Sender},
    teloxide::types::{CallbackQuery, MediaKind, Message, MessageKind, Update, UpdateKind, User},
};

pub fn raw_update(update: &Update) -> RawUpdate {
    let update_id = i64::from(update.id.0);
    match &update.kind {
        UpdateKind::Message(msg) => RawUpdate {
            update_id,
            message: Some(raw_message(msg)),
            ..Default::default()
        },
        UpdateKind::CallbackQuery(query) => RawUpdate {
            update_id,
            callback: Some(raw_callback(query)),
            ..Default::default()
        },
        other => RawUpdate {
            update_id,
            other: Some(describe(other).to_string()),
            ..Default::default()
        },
    }
}

fn raw_message(msg: &Message) -> RawMessage {
    RawMessage {
        message_id: msg.id.0,
        chat_id: msg.chat.id.0,
        from: msg.from.as_ref().map(sender),
        text: text_of(msg),
        has_media: has_media(msg),
    }
}

fn raw_callback(query: &CallbackQuery) -> RawCallback {
    RawCallback {
        id: query.id.to_string(),
        from: sender(&query.from),
        chat_id: query.message.as_ref().map(|m| m.chat().id.0),
        data: query.data.clone(),
    }
}

fn sender(user: &User) -> Sender {
    Sender {
        id: user.id.0 as i64,
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        username: user.username.clone(),
    }
}

/// Plain text body only; media captions do not count.
fn text_of(msg: &Message) -> Option<String> {
    match &msg.kind {
        MessageKind::Common(common) => match &common.media_kind {
            MediaKind::Text(t) => Some(t.text.clone()),
            _ => None,
        },
        _ => None,
    }
}

fn has_media(msg: &Message) -> bool {
    match &msg.kind {
        MessageKind::Common(common) => !matches!(common.media_kind, MediaKind::Text(_)),
        _ => false,
    }
}

fn describe(kind: &UpdateKind) -> &'static str {
    match kind {
        UpdateKind::EditedMessage(_) => "edited message",
        UpdateKind::ChannelPost(_) | UpdateKind::EditedChannelPost(_) => "channel post",
        UpdateKind::InlineQuery(_) => "inline query",
        UpdateKind::Poll(_) | UpdateKind::PollAnswer(_) => "poll",
        UpdateKind::MyChatMember(_) | UpdateKind::ChatMember(_) => "member update",
        _ => "unrecognised update",
    }
}
