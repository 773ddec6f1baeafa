use std::path::{Path, PathBuf};

use {
    secrecy::{ExposeSecret, Secret},
    tracing::{debug, warn},
};

use crate::{
    error::{Error, Result},
    schema::CourierConfig,
};

/// Config file name, checked in `./` then the user config dir.
pub const CONFIG_FILENAME: &str = "courier.toml";

/// Environment variable holding the bot token.
pub const TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Load config from the given TOML file.
pub fn load_config(path: &Path) -> Result<CourierConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load config from an explicit path, or discover it in standard locations.
///
/// An explicit path must exist and parse. A discovered file that fails to
/// load is skipped with a warning. Returns defaults when nothing is found,
/// together with the path that was actually loaded.
pub fn discover_and_load(explicit: Option<&Path>) -> Result<(CourierConfig, Option<PathBuf>)> {
    if let Some(path) = explicit {
        debug!(path = %path.display(), "loading config");
        return Ok((load_config(path)?, Some(path.to_path_buf())));
    }

    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return Ok((cfg, Some(path))),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    Ok((CourierConfig::default(), None))
}

/// Find the first config file in standard locations.
pub(crate) fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILENAME);
    if local.exists() {
        return Some(local);
    }
    config_dir()
        .map(|dir| dir.join(CONFIG_FILENAME))
        .filter(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/courier/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "courier").map(|d| d.config_dir().to_path_buf())
}

/// Apply process-environment overrides on top of file values.
pub fn apply_env_overrides(config: &mut CourierConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(config: &mut CourierConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(token) = lookup(TOKEN_ENV).filter(|t| !t.trim().is_empty()) {
        debug!(env = TOKEN_ENV, "bot token taken from environment");
        config.telegram.token = Secret::new(token);
    }
}

/// Return the bot token, failing when it is absent or blank.
pub fn require_token(config: &CourierConfig) -> Result<&Secret<String>> {
    let token = &config.telegram.token;
    if token.expose_secret().trim().is_empty() {
        return Err(Error::MissingToken { env: TOKEN_ENV });
    }
    Ok(token)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[telegram]\npoll_timeout_secs = 10\n").unwrap();

        let (cfg, loaded) = discover_and_load(Some(&path)).unwrap();
        assert_eq!(cfg.telegram.poll_timeout_secs, 10);
        assert_eq!(loaded.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        let err = discover_and_load(Some(&path)).unwrap_err();
        assert!(matches!(err, Error::Read { .. }), "got {err}");
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[telegram\n").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(err.to_string().contains(CONFIG_FILENAME));
    }

    #[test]
    fn env_token_overrides_file_value() {
        let mut cfg: CourierConfig = toml::from_str("[telegram]\ntoken = \"from-file\"").unwrap();
        apply_env_overrides_with(&mut cfg, |name| {
            (name == TOKEN_ENV).then(|| "from-env".to_string())
        });
        assert_eq!(require_token(&cfg).unwrap().expose_secret(), "from-env");
    }

    #[test]
    fn blank_env_token_keeps_file_value() {
        let mut cfg: CourierConfig = toml::from_str("[telegram]\ntoken = \"from-file\"").unwrap();
        apply_env_overrides_with(&mut cfg, |_| Some("   ".to_string()));
        assert_eq!(require_token(&cfg).unwrap().expose_secret(), "from-file");
    }

    #[test]
    fn missing_token_fails_fast() {
        let mut cfg = CourierConfig::default();
        apply_env_overrides_with(&mut cfg, |_| None);
        let err = require_token(&cfg).unwrap_err();
        assert!(matches!(err, Error::MissingToken { env: TOKEN_ENV }));
        assert!(err.to_string().contains(TOKEN_ENV));
    }
}
