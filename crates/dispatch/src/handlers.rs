//! Handler Set: one handler per [`Route`], each a pure mapping from an event
//! to the actions it wants delivered.

use std::{collections::HashMap, sync::Arc};

use {
    async_trait::async_trait,
    courier_common::types::{Action, Event, EventKind, InlineButton, Markup, MediaRef},
    courier_config::Replies,
};

use crate::{error::HandlerError, route::Route};

/// Callback token offered by the inline keyboard demo.
pub const DEMO_CALLBACK_DATA: &str = "button1";

/// Time format of the clock reply.
pub const CLOCK_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[async_trait]
pub trait Handler: Send + Sync {
    /// Map one event to an ordered, non-empty list of actions.
    async fn handle(&self, event: &Event) -> Result<Vec<Action>, HandlerError>;
}

/// Route → handler table.
#[derive(Clone, Default)]
pub struct HandlerSet {
    handlers: HashMap<Route, Arc<dyn Handler>>,
}

impl HandlerSet {
    /// Empty set; every route must be registered with [`Self::with_handler`].
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock handlers, covering every route.
    pub fn builtin(replies: &Replies) -> Self {
        let text = |body: &str| Arc::new(StaticText::new(body)) as Arc<dyn Handler>;
        let reply_keyboard = Markup::ReplyKeyboard {
            rows: vec![
                vec!["Hello".into(), "时间".into()],
                vec!["帮助".into(), "关于".into()],
            ],
            resize: true,
        };
        let inline_keyboard = Markup::InlineKeyboard {
            rows: vec![vec![
                InlineButton::Url {
                    label: "访问网站".into(),
                    url: replies.inline_link_url.clone(),
                },
                InlineButton::Callback {
                    label: "点击我".into(),
                    data: DEMO_CALLBACK_DATA.into(),
                },
            ]],
        };

        Self::new()
            .with_handler(Route::Start, text(&replies.greeting))
            .with_handler(Route::Help, text(&replies.help))
            .with_handler(Route::About, text(&replies.about))
            .with_handler(
                Route::Keyboard,
                Arc::new(StaticText::new(&replies.keyboard_prompt).with_markup(reply_keyboard)),
            )
            .with_handler(
                Route::Inline,
                Arc::new(StaticText::new(&replies.inline_prompt).with_markup(inline_keyboard)),
            )
            .with_handler(
                Route::Photo,
                Arc::new(SendPhoto {
                    url: replies.photo_url.clone(),
                }),
            )
            .with_handler(Route::UnknownCommand, text(&replies.unknown_command))
            .with_handler(
                Route::Hello,
                Arc::new(Hello {
                    template: replies.hello_template.clone(),
                }),
            )
            .with_handler(
                Route::Clock,
                Arc::new(Clock {
                    prefix: replies.clock_prefix.clone(),
                }),
            )
            .with_handler(
                Route::Echo,
                Arc::new(Echo {
                    prefix: replies.echo_prefix.clone(),
                }),
            )
            .with_handler(
                Route::Callback,
                Arc::new(CallbackEcho {
                    prefix: replies.callback_prefix.clone(),
                }),
            )
            .with_handler(Route::Unsupported, text(&replies.unsupported))
    }

    /// Register or replace the handler for `route`.
    #[must_use]
    pub fn with_handler(mut self, route: Route, handler: Arc<dyn Handler>) -> Self {
        self.handlers.insert(route, handler);
        self
    }

    pub fn get(&self, route: Route) -> Option<Arc<dyn Handler>> {
        self.handlers.get(&route).cloned()
    }

    /// Routes with no registered handler.
    pub fn missing_routes(&self) -> Vec<Route> {
        Route::ALL
            .into_iter()
            .filter(|route| !self.handlers.contains_key(route))
            .collect()
    }
}

// ── Built-in handlers ───────────────────────────────────────────────────────

/// Fixed reply text, optionally with a keyboard.
pub struct StaticText {
    text: String,
    markup: Option<Markup>,
}

impl StaticText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: None,
        }
    }

    #[must_use]
    pub fn with_markup(mut self, markup: Markup) -> Self {
        self.markup = Some(markup);
        self
    }
}

#[async_trait]
impl Handler for StaticText {
    async fn handle(&self, event: &Event) -> Result<Vec<Action>, HandlerError> {
        let mut action = Action::text(event.reply_target()?, self.text.clone());
        action.markup = self.markup.clone();
        Ok(vec![action])
    }
}

struct SendPhoto {
    url: String,
}

#[async_trait]
impl Handler for SendPhoto {
    async fn handle(&self, event: &Event) -> Result<Vec<Action>, HandlerError> {
        Ok(vec![Action::media(
            event.reply_target()?,
            MediaRef::Url(self.url.clone()),
        )])
    }
}

struct Hello {
    template: String,
}

#[async_trait]
impl Handler for Hello {
    async fn handle(&self, event: &Event) -> Result<Vec<Action>, HandlerError> {
        let text = self.template.replace("{name}", event.sender_first_name());
        Ok(vec![Action::text(event.reply_target()?, text)])
    }
}

struct Clock {
    prefix: String,
}

#[async_trait]
impl Handler for Clock {
    async fn handle(&self, event: &Event) -> Result<Vec<Action>, HandlerError> {
        let now = chrono::Local::now().format(CLOCK_FORMAT).to_string();
        Ok(vec![Action::text(
            event.reply_target()?,
            format!("{}{now}", self.prefix),
        )])
    }
}

struct Echo {
    prefix: String,
}

#[async_trait]
impl Handler for Echo {
    async fn handle(&self, event: &Event) -> Result<Vec<Action>, HandlerError> {
        let EventKind::Text { text } = &event.kind else {
            return Err(HandlerError::UnexpectedKind {
                expected: "text",
                got: event.kind.label(),
            });
        };
        Ok(vec![Action::text(
            event.reply_target()?,
            format!("{}{text}", self.prefix),
        )])
    }
}

/// Acknowledge the press (the data doubles as toast text), then echo the data.
struct CallbackEcho {
    prefix: String,
}

#[async_trait]
impl Handler for CallbackEcho {
    async fn handle(&self, event: &Event) -> Result<Vec<Action>, HandlerError> {
        let EventKind::Callback { data } = &event.kind else {
            return Err(HandlerError::UnexpectedKind {
                expected: "callback",
                got: event.kind.label(),
            });
        };
        let target = event.reply_target()?;
        Ok(vec![
            Action::acknowledge(target, event.id.as_str(), Some(data.clone())),
            Action::text(target, format!("{}{data}", self.prefix)),
        ])
    }
}
