/// Config schema types (telegram transport, dispatch policy, reply texts).
use {secrecy::Secret, serde::Deserialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CourierConfig {
    pub telegram: TelegramConfig,
    pub dispatch: DispatchConfig,
    pub replies: Replies,
}

/// Telegram Bot API connection settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather. Overridden by `TELEGRAM_BOT_TOKEN`.
    pub token: Secret<String>,

    /// Long-poll wait per `getUpdates` call, in seconds.
    pub poll_timeout_secs: u32,

    /// HTTP client timeout. Must exceed the long-poll timeout or every idle
    /// poll is aborted client-side.
    pub http_timeout_secs: u64,

    /// Back-off after a failed poll before trying again.
    pub poll_retry_secs: u64,

    /// Publish the command list to Telegram for client autocomplete.
    pub register_commands: bool,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("poll_retry_secs", &self.poll_retry_secs)
            .field("register_commands", &self.register_commands)
            .finish()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            poll_timeout_secs: 30,
            http_timeout_secs: 45,
            poll_retry_secs: 5,
            register_commands: true,
        }
    }
}

/// Ordering of handler completions within one conversation.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderingMode {
    /// Every event runs independently; replies may interleave.
    #[default]
    Unordered,
    /// Events from the same conversation run one after another in arrival order.
    PerConversation,
}

/// Concurrency policy for handler units.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Deadline for one handling unit (handler plus delivery). `validate`
    /// rejects `0`.
    pub handler_timeout_secs: u64,

    /// Upper bound on concurrently running units. Unbounded when unset;
    /// `validate` rejects `Some(0)`.
    pub max_in_flight: Option<usize>,

    pub ordering: OrderingMode,

    /// How long shutdown waits for in-flight units.
    pub shutdown_grace_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            handler_timeout_secs: 30,
            max_in_flight: None,
            ordering: OrderingMode::Unordered,
            shutdown_grace_secs: 10,
        }
    }
}

/// User-facing reply texts used by the built-in handlers.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Replies {
    pub greeting: String,
    pub help: String,
    pub about: String,
    pub keyboard_prompt: String,
    pub inline_prompt: String,
    pub inline_link_url: String,
    pub photo_url: String,
    pub unknown_command: String,
    /// `{name}` is replaced with the sender's first name.
    pub hello_template: String,
    pub clock_prefix: String,
    pub echo_prefix: String,
    pub callback_prefix: String,
    pub unsupported: String,
}

impl Default for Replies {
    fn default() -> Self {
        Self {
            greeting: "欢迎使用本机器人！\n输入 /help 查看帮助信息。".into(),
            help: "可用命令：\n\
                   /start - 开始使用\n\
                   /help - 显示帮助\n\
                   /about - 关于\n\
                   /keyboard - 显示键盘\n\
                   /inline - 显示内联键盘\n\
                   /photo - 发送图片示例"
                .into(),
            about: "这是一个示例机器人，使用Rust开发。".into(),
            keyboard_prompt: "这是一个自定义键盘示例".into(),
            inline_prompt: "这是一个内联键盘示例".into(),
            inline_link_url: "https://example.com".into(),
            photo_url: "https://example.com/photo.jpg".into(),
            unknown_command: "未知命令。输入 /help 查看可用命令。".into(),
            hello_template: "你好，{name}!".into(),
            clock_prefix: "当前时间：".into(),
            echo_prefix: "你说: ".into(),
            callback_prefix: "你点击了: ".into(),
            unsupported: "暂不支持此类消息。输入 /help 查看可用命令。".into(),
        }
    }
}
