//! User domain model.
//!
//! # Responsibility
//! - Define the account record validated and persisted by core.
//! - Provide lifecycle helpers for soft-delete semantics.
//!
//! # Invariants
//! - `id` is `None` until storage assigns one on insert.
//! - `created` is stamped once at construction and never rewritten by updates.
//! - `deleted` is the source of truth for tombstone state.

use crate::clock::{Clock, SystemClock};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage-assigned user identity.
pub type UserId = i64;

/// Account record shared by validation and persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Assigned by storage on insert.
    pub id: Option<UserId>,
    /// Lowercase alphanumeric login name, unique across all rows.
    pub name: String,
    /// Contact address, unique across all rows.
    pub email: String,
    /// Creation time in UTC.
    pub created: DateTime<Utc>,
    /// Soft delete tombstone. Should be >= `created` when set.
    pub deleted: Option<DateTime<Utc>>,
    /// Free-form operator notes.
    pub notes: Option<String>,
}

impl User {
    /// Creates an unsaved user stamped with the current UTC time.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self::with_clock(&SystemClock, name, email)
    }

    /// Creates an unsaved user stamped by the provided clock.
    ///
    /// # Invariants
    /// - `id`, `deleted` and `notes` start as `None`.
    pub fn with_clock(
        clock: &dyn Clock,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
            created: clock.now(),
            deleted: None,
            notes: None,
        }
    }

    /// Builder-style helper for attaching notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Returns the part of `email` after the first `@`.
    pub fn email_domain(&self) -> Option<&str> {
        self.email.split_once('@').map(|(_, domain)| domain)
    }

    /// Returns whether this user has not been soft-deleted.
    pub fn is_active(&self) -> bool {
        self.deleted.is_none()
    }
}
