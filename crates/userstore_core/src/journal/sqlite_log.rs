//! SQLite-backed modification journal.
//!
//! # Invariants
//! - Entries are append-only; nothing in core updates or deletes them.
//! - Entries outlive hard-deleted users (no foreign key to `users`).

use super::change::{ChangeParam, UserChange, UserOperation};
use super::{JournalError, JournalResult, UserModificationLog};
use crate::clock::{Clock, SystemClock};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

/// One persisted journal row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub id: i64,
    pub operation: UserOperation,
    pub query: String,
    pub params: Vec<ChangeParam>,
    pub logged_at: DateTime<Utc>,
}

/// Journal writing into the `user_modifications` table.
pub struct SqliteModificationLog<'conn> {
    conn: &'conn Connection,
    clock: Box<dyn Clock + 'conn>,
}

impl<'conn> SqliteModificationLog<'conn> {
    /// Creates a journal on a migrated connection.
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            clock: Box::new(SystemClock),
        }
    }

    /// Replaces the clock used for `logged_at`.
    pub fn with_clock(mut self, clock: impl Clock + 'conn) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Returns all entries in insertion order.
    pub fn entries(&self) -> JournalResult<Vec<JournalEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, operation, query, params, logged_at
             FROM user_modifications
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }
        Ok(entries)
    }
}

impl UserModificationLog for SqliteModificationLog<'_> {
    fn log_change(&self, change: &UserChange) -> JournalResult<()> {
        let params_json = serde_json::to_string(&change.params)?;
        self.conn.execute(
            "INSERT INTO user_modifications (operation, query, params, logged_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                change.operation.as_str(),
                change.query,
                params_json,
                self.clock.now(),
            ],
        )?;
        Ok(())
    }
}

fn parse_entry_row(row: &Row<'_>) -> JournalResult<JournalEntry> {
    let operation_text: String = row.get("operation")?;
    let operation = UserOperation::parse(&operation_text).ok_or_else(|| {
        JournalError::InvalidData(format!(
            "invalid operation `{operation_text}` in user_modifications.operation"
        ))
    })?;
    let params_text: String = row.get("params")?;

    Ok(JournalEntry {
        id: row.get("id")?,
        operation,
        query: row.get("query")?,
        params: serde_json::from_str(&params_text)?,
        logged_at: row.get("logged_at")?,
    })
}
