//! Closed routing table. New behaviour is added as rows here, never as
//! string comparisons elsewhere.

use std::fmt;

use courier_common::types::{Event, EventKind};

/// Handler selector. Every variant has exactly one handler in a complete
/// [`HandlerSet`](crate::HandlerSet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Start,
    Help,
    About,
    Keyboard,
    Inline,
    Photo,
    UnknownCommand,
    Hello,
    Clock,
    Echo,
    Callback,
    Unsupported,
}

impl Route {
    pub const ALL: [Route; 12] = [
        Route::Start,
        Route::Help,
        Route::About,
        Route::Keyboard,
        Route::Inline,
        Route::Photo,
        Route::UnknownCommand,
        Route::Hello,
        Route::Clock,
        Route::Echo,
        Route::Callback,
        Route::Unsupported,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::About => "about",
            Self::Keyboard => "keyboard",
            Self::Inline => "inline",
            Self::Photo => "photo",
            Self::UnknownCommand => "unknown_command",
            Self::Hello => "hello",
            Self::Clock => "clock",
            Self::Echo => "echo",
            Self::Callback => "callback",
            Self::Unsupported => "unsupported",
        }
    }

    /// Pick the route for a classified event.
    ///
    /// Returns `None` only for unknown events that carry no conversation:
    /// there is nobody to answer.
    pub fn resolve(event: &Event) -> Option<Route> {
        match &event.kind {
            EventKind::Command { name, .. } => {
                let name = name.to_lowercase();
                let route = COMMANDS
                    .iter()
                    .find(|row| row.name == name)
                    .map_or(Route::UnknownCommand, |row| row.route);
                Some(route)
            },
            EventKind::Text { text } => {
                let text = text.to_lowercase();
                let route = CANNED_PHRASES
                    .iter()
                    .find(|(phrase, _)| *phrase == text)
                    .map_or(Route::Echo, |(_, route)| *route);
                Some(route)
            },
            EventKind::Callback { .. } => Some(Route::Callback),
            EventKind::Unknown { .. } => event.source.map(|_| Route::Unsupported),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One slash command: name as typed (without `/`), route, menu description.
#[derive(Debug, Clone, Copy)]
pub struct CommandRow {
    pub name: &'static str,
    pub route: Route,
    pub description: &'static str,
}

/// Commands in menu order. Also published to Telegram for autocomplete.
pub const COMMANDS: &[CommandRow] = &[
    CommandRow {
        name: "start",
        route: Route::Start,
        description: "开始使用",
    },
    CommandRow {
        name: "help",
        route: Route::Help,
        description: "显示帮助",
    },
    CommandRow {
        name: "about",
        route: Route::About,
        description: "关于",
    },
    CommandRow {
        name: "keyboard",
        route: Route::Keyboard,
        description: "显示键盘",
    },
    CommandRow {
        name: "inline",
        route: Route::Inline,
        description: "显示内联键盘",
    },
    CommandRow {
        name: "photo",
        route: Route::Photo,
        description: "发送图片示例",
    },
];

/// Free-text phrases with a canned reply, lowercase. The last two are the
/// labels on the demo reply keyboard.
const CANNED_PHRASES: &[(&str, Route)] = &[
    ("hello", Route::Hello),
    ("hi", Route::Hello),
    ("时间", Route::Clock),
    ("帮助", Route::Help),
    ("关于", Route::About),
];

#[cfg(test)]
mod tests {
    use {
        super::*,
        courier_common::types::{ConversationId, EventId},
        rstest::rstest,
    };

    fn event(kind: EventKind) -> Event {
        Event {
            id: EventId("1".into()),
            update_id: 1,
            source: Some(ConversationId(42)),
            sender: None,
            kind,
        }
    }

    fn command(name: &str) -> EventKind {
        EventKind::Command {
            name: name.into(),
            args: String::new(),
        }
    }

    fn text(text: &str) -> EventKind {
        EventKind::Text { text: text.into() }
    }

    #[rstest]
    #[case(command("start"), Route::Start)]
    #[case(command("help"), Route::Help)]
    #[case(command("about"), Route::About)]
    #[case(command("keyboard"), Route::Keyboard)]
    #[case(command("inline"), Route::Inline)]
    #[case(command("photo"), Route::Photo)]
    #[case(command("START"), Route::Start)]
    #[case(command("nope"), Route::UnknownCommand)]
    #[case(text("hello"), Route::Hello)]
    #[case(text("HELLO"), Route::Hello)]
    #[case(text("Hi"), Route::Hello)]
    #[case(text("时间"), Route::Clock)]
    #[case(text("帮助"), Route::Help)]
    #[case(text("关于"), Route::About)]
    #[case(text("xyz123"), Route::Echo)]
    #[case(text("hello there"), Route::Echo)]
    #[case(EventKind::Callback { data: "button1".into() }, Route::Callback)]
    #[case(EventKind::Unknown { shape: "media message".into() }, Route::Unsupported)]
    fn routing_table(#[case] kind: EventKind, #[case] expected: Route) {
        assert_eq!(Route::resolve(&event(kind)), Some(expected));
    }

    #[test]
    fn unknown_without_conversation_is_dropped() {
        let mut ev = event(EventKind::Unknown {
            shape: "poll".into(),
        });
        ev.source = None;
        assert_eq!(Route::resolve(&ev), None);
    }

    #[test]
    fn every_command_row_has_a_distinct_name() {
        let mut names: Vec<_> = COMMANDS.iter().map(|row| row.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), COMMANDS.len());
    }

    #[test]
    fn canned_phrases_are_lowercase() {
        for (phrase, _) in CANNED_PHRASES {
            assert_eq!(phrase.to_lowercase(), *phrase);
        }
    }
}
