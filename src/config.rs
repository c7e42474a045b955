//! Runtime configuration, read from a TOML file.
//!
//! ```toml
//! database_path = "db.sqlite3"
//! log_level = "debug"
//! user_id = "alice"
//! ```

use crate::error::Result;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "FLASHCARDS_CONFIG";

pub const DEFAULT_CONFIG_FILE: &str = "flashcards.toml";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_path: PathBuf,
    /// off, error, warn, info, debug or trace
    pub log_level: String,
    /// Learner recorded on sessions and review log entries.
    pub user_id: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("db.sqlite3"),
            log_level: "info".to_string(),
            user_id: "local".to_string(),
        }
    }
}

impl Config {
    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Explicit path if given, else `$FLASHCARDS_CONFIG`, else `flashcards.toml`.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let path = std::env::var_os(CONFIG_ENV)
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
                Self::load(&path)
            }
        }
    }

    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }
}
