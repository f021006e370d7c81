//! Store configuration loaded from JSON.
//!
//! # Responsibility
//! - Describe where users live, where logs go and which policy lists apply.
//! - Reject configurations that would make every registration fail.
//!
//! # Invariants
//! - A loaded config has passed `validate()`.
//! - A missing `database_path` means an in-memory store.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::logging::{default_log_level, init_logging, normalize_level};
use crate::policy::{ProhibitedWordList, TrustedDomainList};
use rusqlite::Connection;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "malformed config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// User store settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UserStoreConfig {
    /// SQLite file; `None` keeps the store in memory.
    pub database_path: Option<PathBuf>,
    /// One of `trace|debug|info|warn|error`; build-mode default when unset.
    pub log_level: Option<String>,
    /// Absolute directory for rolling logs; logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    pub trusted_domains: Vec<String>,
    pub prohibited_words: Vec<String>,
}

impl UserStoreConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(level) = &self.log_level {
            normalize_level(level).map_err(ConfigError::Invalid)?;
        }
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be absolute, got `{}`",
                    dir.display()
                )));
            }
        }
        if self.trusted_domains.is_empty() {
            return Err(ConfigError::Invalid(
                "trusted_domains must list at least one domain".to_string(),
            ));
        }
        for domain in &self.trusted_domains {
            let trimmed = domain.trim();
            if trimmed.is_empty() || trimmed.contains('@') {
                return Err(ConfigError::Invalid(format!(
                    "trusted domain `{domain}` is not a bare domain"
                )));
            }
        }
        if self.prohibited_words.iter().any(|word| word.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "prohibited_words must not contain blank entries".to_string(),
            ));
        }
        Ok(())
    }

    /// Effective log level after defaulting.
    pub fn effective_log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(default_log_level())
    }

    /// Starts file logging when `log_dir` is configured.
    ///
    /// Returns `Ok(false)` when logging is not configured.
    pub fn init_logging(&self) -> Result<bool, String> {
        match &self.log_dir {
            Some(dir) => init_logging(self.effective_log_level(), dir).map(|()| true),
            None => Ok(false),
        }
    }

    /// Opens the configured database with migrations applied.
    pub fn open_db(&self) -> DbResult<Connection> {
        match &self.database_path {
            Some(path) => open_db(path),
            None => open_db_in_memory(),
        }
    }

    pub fn trusted_domain_list(&self) -> TrustedDomainList {
        TrustedDomainList::new(&self.trusted_domains)
    }

    pub fn prohibited_word_list(&self) -> ProhibitedWordList {
        ProhibitedWordList::new(&self.prohibited_words)
    }
}
