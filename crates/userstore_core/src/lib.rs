//! Core of the user store.
//! Validates account records, persists them to SQLite and journals every
//! mutation.

pub mod clock;
pub mod config;
pub mod db;
pub mod journal;
pub mod logging;
pub mod model;
pub mod policy;
pub mod repo;
pub mod validation;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, UserStoreConfig};
pub use journal::{
    ChangeParam, ChangeValue, JournalEntry, JournalError, JournalResult, NoopModificationLog,
    SqliteModificationLog, UserChange, UserModificationLog, UserOperation,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::user::{User, UserId};
pub use policy::{ProhibitedWordList, ProhibitedWords, TrustedDomainList, TrustedDomains};
pub use repo::user_repo::{
    RepoError, RepoResult, SqliteUserRepository, UserLookup, UserRepository,
};
pub use validation::{DefaultUserValidator, UserValidator, ValidationError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
