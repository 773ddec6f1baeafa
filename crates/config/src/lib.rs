//! Configuration loading, environment overrides, and validation.
//!
//! Config file: `courier.toml`, searched in `./` then the user config dir
//! (`~/.config/courier/` on Linux). Every section is optional; the bot token
//! normally comes from `TELEGRAM_BOT_TOKEN`.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{
        CONFIG_FILENAME, TOKEN_ENV, apply_env_overrides, config_dir, discover_and_load,
        load_config, require_token,
    },
    schema::{CourierConfig, DispatchConfig, OrderingMode, Replies, TelegramConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
