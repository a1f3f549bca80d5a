//! Application configuration
//!
//! Loaded from TOML, then overridden by environment variables:
//!
//! ```toml
//! database_path = "/var/lib/tally/tally.db"
//! user_id = "local"
//! seed_new_users = true
//!
//! [import]
//! max_rows = 50000
//! date_formats = ["%Y-%m-%d", "%m/%d/%Y"]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::materialize::DEFAULT_DATE_FORMATS;

/// Overrides `database_path`
pub const DB_ENV: &str = "TALLY_DB";
/// Overrides `user_id`
pub const USER_ENV: &str = "TALLY_USER";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_path: PathBuf,
    /// User the CLI acts as
    pub user_id: String,
    /// Provision default categories, merchants and mappings on `init`
    pub seed_new_users: bool,
    pub import: ImportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Largest file, in rows, accepted for import
    pub max_rows: usize,
    /// Date formats tried in order
    pub date_formats: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            user_id: "local".to_string(),
            seed_new_users: true,
            import: ImportConfig::default(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_rows: 50_000,
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// `<data dir>/tally/tally.db`, or `./tally.db` without a data dir
pub fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("tally").join("tally.db"))
        .unwrap_or_else(|| PathBuf::from("tally.db"))
}

/// `<config dir>/tally/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tally").join("config.toml"))
}

impl Config {
    /// Parse TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(format!("invalid config: {}", e)))
    }

    /// Read a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml(&text)
    }

    /// Load from an explicit path, else the default location if it exists,
    /// else defaults. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(p) => Self::from_file(&p)?,
                None => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        debug!(db = %config.database_path.display(), user = %config.user_id, "Loaded config");
        Ok(config)
    }

    /// Apply environment overrides from a lookup function
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(db) = lookup(DB_ENV).filter(|v| !v.is_empty()) {
            self.database_path = PathBuf::from(db);
        }
        if let Some(user) = lookup(USER_ENV).filter(|v| !v.is_empty()) {
            self.user_id = user;
        }
    }
}
