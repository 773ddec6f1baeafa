//! Semantic validation of a loaded configuration.
//!
//! Parsing already rejects unknown types; this pass catches values that
//! deserialize fine but cannot work at runtime.

use secrecy::ExposeSecret;

use crate::{loader::TOKEN_ENV, schema::CourierConfig};

/// Telegram rejects long-poll timeouts above this many seconds.
const TELEGRAM_MAX_POLL_TIMEOUT_SECS: u32 = 50;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "dispatch.max_in_flight"
    pub path: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(&mut self, severity: Severity, path: &'static str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path,
            message: message.into(),
        });
    }
}

#[must_use]
pub fn validate(config: &CourierConfig) -> ValidationResult {
    let mut result = ValidationResult::default();
    let telegram = &config.telegram;
    let dispatch = &config.dispatch;

    if telegram.token.expose_secret().trim().is_empty() {
        result.push(
            Severity::Error,
            "telegram.token",
            format!("no bot token; set {TOKEN_ENV}"),
        );
    }

    if telegram.poll_timeout_secs > TELEGRAM_MAX_POLL_TIMEOUT_SECS {
        result.push(
            Severity::Warning,
            "telegram.poll_timeout_secs",
            format!(
                "{}s exceeds Telegram's {TELEGRAM_MAX_POLL_TIMEOUT_SECS}s long-poll cap",
                telegram.poll_timeout_secs
            ),
        );
    }

    if telegram.http_timeout_secs <= u64::from(telegram.poll_timeout_secs) {
        result.push(
            Severity::Error,
            "telegram.http_timeout_secs",
            format!(
                "must be greater than telegram.poll_timeout_secs ({})",
                telegram.poll_timeout_secs
            ),
        );
    }

    if dispatch.handler_timeout_secs == 0 {
        result.push(
            Severity::Error,
            "dispatch.handler_timeout_secs",
            "must be at least 1",
        );
    }

    if dispatch.max_in_flight == Some(0) {
        result.push(
            Severity::Error,
            "dispatch.max_in_flight",
            "must be at least 1 (omit it for no limit)",
        );
    }

    if !config.replies.hello_template.contains("{name}") {
        result.push(
            Severity::Warning,
            "replies.hello_template",
            "has no {name} placeholder; greetings will not be personalised",
        );
    }

    result
}
