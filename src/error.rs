//! Error type shared by the scheduler, the session model and the SQLite store.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed request, e.g. a quality rating outside 0-5. Nothing was written.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Operation not allowed in the current lifecycle state (e.g. a closed session).
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("failed to read/write file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config TOML: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
