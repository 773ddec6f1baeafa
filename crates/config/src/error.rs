use std::path::PathBuf;

/// Crate-wide result type for config operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// No bot token in the config file or the environment.
    #[error("bot token is not set: export {env} or set telegram.token in courier.toml")]
    MissingToken { env: &'static str },
}
