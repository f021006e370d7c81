//! Audit journal for committed user mutations.
//!
//! # Responsibility
//! - Define the modification-log capability the repository reports to.
//! - Provide a durable SQLite journal and a discarding journal.
//!
//! # Invariants
//! - The repository calls `log_change` exactly once per committed mutation.
//! - Journal entries carry no validation semantics; they only record.

pub mod change;
mod sqlite_log;

pub use change::{ChangeParam, ChangeValue, UserChange, UserOperation};
pub use sqlite_log::{JournalEntry, SqliteModificationLog};

use std::error::Error;
use std::fmt::{Display, Formatter};

pub type JournalResult<T> = Result<T, JournalError>;

/// Failure to record or read back a journal entry.
#[derive(Debug)]
pub enum JournalError {
    Sqlite(rusqlite::Error),
    Encode(serde_json::Error),
    Rejected(String),
    InvalidData(String),
}

impl Display for JournalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "journal payload encoding failed: {err}"),
            Self::Rejected(message) => write!(f, "journal rejected change: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted journal data: {message}"),
        }
    }
}

impl Error for JournalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::Rejected(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<rusqlite::Error> for JournalError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<serde_json::Error> for JournalError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Durable recorder of user mutations.
pub trait UserModificationLog {
    fn log_change(&self, change: &UserChange) -> JournalResult<()>;
}

impl<L: UserModificationLog + ?Sized> UserModificationLog for &L {
    fn log_change(&self, change: &UserChange) -> JournalResult<()> {
        (**self).log_change(change)
    }
}

/// Journal that drops every change.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopModificationLog;

impl UserModificationLog for NoopModificationLog {
    fn log_change(&self, _change: &UserChange) -> JournalResult<()> {
        Ok(())
    }
}
