use {
    async_trait::async_trait,
    courier_common::types::{Action, ActionKind, InlineButton, Markup, MediaRef},
    courier_dispatch::{Outbound, TransportError},
    teloxide::{
        payloads::{AnswerCallbackQuerySetters, SendMessageSetters, SendPhotoSetters},
        prelude::*,
        types::{
            InlineKeyboardButton, InlineKeyboardMarkup, InputFile, KeyboardButton, KeyboardMarkup,
            ReplyMarkup,
        },
    },
    tracing::debug,
};

use crate::error::transport_error;

/// Sends actions through the Bot API. Shared by every handling unit; `Bot`
/// is an `Arc` internally so clones are cheap.
#[derive(Clone)]
pub struct TelegramOutbound {
    bot: Bot,
}

impl TelegramOutbound {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Outbound for TelegramOutbound {
    async fn send(&self, action: &Action) -> Result<(), TransportError> {
        let chat_id = ChatId(action.target.0);
        let markup = action.markup.as_ref().map(reply_markup).transpose()?;

        match &action.kind {
            ActionKind::SendText { text } => {
                let mut req = self.bot.send_message(chat_id, text);
                if let Some(markup) = markup {
                    req = req.reply_markup(markup);
                }
                req.await.map_err(|e| transport_error("sendMessage", e))?;
                debug!(chat_id = chat_id.0, len = text.len(), "telegram message sent");
            },
            ActionKind::SendMedia { media, caption } => {
                let mut req = self.bot.send_photo(chat_id, input_file(media)?);
                if let Some(caption) = caption {
                    req = req.caption(caption);
                }
                if let Some(markup) = markup {
                    req = req.reply_markup(markup);
                }
                req.await.map_err(|e| transport_error("sendPhoto", e))?;
                debug!(chat_id = chat_id.0, %media, "telegram photo sent");
            },
            ActionKind::AcknowledgeCallback { callback_id, note } => {
                return self
                    .acknowledge_callback(callback_id, note.as_deref())
                    .await;
            },
        }
        Ok(())
    }

    async fn acknowledge_callback(
        &self,
        callback_id: &str,
        note: Option<&str>,
    ) -> Result<(), TransportError> {
        let mut req = self.bot.answer_callback_query(callback_id);
        if let Some(note) = note {
            req = req.text(note);
        }
        req.await
            .map_err(|e| transport_error("answerCallbackQuery", e))?;
        Ok(())
    }
}

fn input_file(media: &MediaRef) -> Result<InputFile, TransportError> {
    match media {
        MediaRef::Url(url) => {
            let url = url
                .parse::<reqwest::Url>()
                .map_err(|e| TransportError::request("invalid media url", e))?;
            Ok(InputFile::url(url))
        },
    }
}

fn reply_markup(markup: &Markup) -> Result<ReplyMarkup, TransportError> {
    match markup {
        Markup::ReplyKeyboard { rows, resize } => {
            let mut keyboard = KeyboardMarkup::new(
                rows.iter()
                    .map(|row| row.iter().map(KeyboardButton::new).collect::<Vec<_>>()),
            );
            keyboard.resize_keyboard = *resize;
            Ok(ReplyMarkup::Keyboard(keyboard))
        },
        Markup::InlineKeyboard { rows } => {
            let rows = rows
                .iter()
                .map(|row| row.iter().map(inline_button).collect::<Result<Vec<_>, _>>())
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new(rows)))
        },
    }
}

fn inline_button(button: &InlineButton) -> Result<InlineKeyboardButton, TransportError> {
    match button {
        InlineButton::Url { label, url } => {
            let url = url
                .parse::<reqwest::Url>()
                .map_err(|e| TransportError::request("invalid button url", e))?;
            Ok(InlineKeyboardButton::url(label, url))
        },
        InlineButton::Callback { label, data } => Ok(InlineKeyboardButton::callback(label, data)),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, teloxide::types::InlineKeyboardButtonKind};

    #[test]
    fn reply_keyboard_keeps_layout_and_resize() {
        let markup = Markup::ReplyKeyboard {
            rows: vec![
                vec!["Hello".into(), "时间".into()],
                vec!["帮助".into(), "关于".into()],
            ],
            resize: true,
        };
        let ReplyMarkup::Keyboard(keyboard) = reply_markup(&markup).unwrap() else {
            panic!("expected a reply keyboard");
        };
        assert!(keyboard.resize_keyboard);
        assert_eq!(keyboard.keyboard.len(), 2);
        assert_eq!(keyboard.keyboard[0][1].text, "时间");
        assert_eq!(keyboard.keyboard[1][0].text, "帮助");
    }

    #[test]
    fn inline_keyboard_maps_both_button_kinds() {
        let markup = Markup::InlineKeyboard {
            rows: vec![vec![
                InlineButton::Url {
                    label: "访问网站".into(),
                    url: "https://example.com".into(),
                },
                InlineButton::Callback {
                    label: "点击我".into(),
                    data: "button1".into(),
                },
            ]],
        };
        let ReplyMarkup::InlineKeyboard(keyboard) = reply_markup(&markup).unwrap() else {
            panic!("expected an inline keyboard");
        };
        let row = &keyboard.inline_keyboard[0];
        assert!(matches!(&row[0].kind, InlineKeyboardButtonKind::Url(url) if url.as_str() == "https://example.com/"));
        assert!(matches!(&row[1].kind, InlineKeyboardButtonKind::CallbackData(data) if data == "button1"));
    }

    #[test]
    fn malformed_button_url_is_a_delivery_error() {
        let markup = Markup::InlineKeyboard {
            rows: vec![vec![InlineButton::Url {
                label: "broken".into(),
                url: "not a url".into(),
            }]],
        };
        let err = reply_markup(&markup).unwrap_err();
        assert!(err.to_string().starts_with("invalid button url"));
    }

    #[test]
    fn media_url_must_parse() {
        assert!(input_file(&MediaRef::Url("https://example.com/photo.jpg".into())).is_ok());
        assert!(input_file(&MediaRef::Url("photo.jpg".into())).is_err());
    }
}
