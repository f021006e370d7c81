//! User repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide add/update/delete/lookup over canonical `users` storage.
//! - Gate writes through a `UserValidator` and report committed mutations to
//!   a `UserModificationLog`.
//!
//! # Invariants
//! - `add`/`update` validate before any SQL runs; deletes and reads never do.
//! - Each committed mutation produces exactly one `log_change` call, issued
//!   after the statement succeeds and outside any transaction.
//! - Name/email uniqueness is left to the storage constraints; violations
//!   surface as `RepoError::Db` unchanged.
//! - Single-row lookups fail with `NotFound` instead of returning nothing.
//! - A soft delete journals the tombstone actually stored, which is the first
//!   one when the row was already deleted.

use crate::clock::{Clock, SystemClock};
use crate::db::DbError;
use crate::journal::{JournalError, UserChange, UserModificationLog, UserOperation};
use crate::model::user::{User, UserId};
use crate::validation::{UserValidator, ValidationError};
use log::{debug, error, info};
use chrono::{DateTime, Utc};
use rusqlite::{named_params, Connection, OptionalExtension, Row, ToSql};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const USER_SELECT_SQL: &str = "SELECT id, name, email, created, deleted, notes FROM users";

const INSERT_USER_SQL: &str = "INSERT INTO users (name, email, created, deleted, notes)
     VALUES (:name, :email, :created, NULL, :notes);";
const UPDATE_USER_SQL: &str =
    "UPDATE users SET name = :name, email = :email, notes = :notes WHERE id = :id;";
// Tombstones never precede `created`; both columns share chrono's sortable text form.
const SOFT_DELETE_USER_SQL: &str = "UPDATE users
     SET deleted = COALESCE(deleted, MAX(created, :deleted))
     WHERE id = :id
     RETURNING deleted;";
const HARD_DELETE_USER_SQL: &str = "DELETE FROM users WHERE id = :id;";

pub type RepoResult<T> = Result<T, RepoError>;

/// Key used by a single-row lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserLookup {
    Id(UserId),
    Email(String),
    Name(String),
}

impl Display for UserLookup {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id={id}"),
            Self::Email(email) => write!(f, "email={email}"),
            Self::Name(name) => write!(f, "name={name}"),
        }
    }
}

/// Repository error for user persistence and lookups.
#[derive(Debug)]
pub enum RepoError {
    /// Write rejected before touching storage.
    Validation(ValidationError),
    /// Caller passed an unusable argument (e.g. `update` without an id).
    InvalidArgument(String),
    /// Storage failure, including UNIQUE constraint violations.
    Db(DbError),
    NotFound(UserLookup),
    /// Persisted rows break an invariant storage should have enforced.
    InvalidData(String),
    /// The mutation committed but could not be journaled.
    Journal {
        operation: UserOperation,
        source: JournalError,
    },
}

impl RepoError {
    /// Returns whether storage rejected the write on a name/email collision.
    pub fn is_uniqueness_conflict(&self) -> bool {
        matches!(self, Self::Db(err) if err.is_unique_violation())
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(lookup) => write!(f, "user not found: {lookup}"),
            Self::InvalidData(message) => write!(f, "invalid persisted user data: {message}"),
            Self::Journal { operation, source } => write!(
                f,
                "user {} committed but journaling failed: {source}",
                operation.as_str()
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Journal { source, .. } => Some(source),
            Self::InvalidArgument(_) | Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for user CRUD operations.
pub trait UserRepository {
    /// Validates and inserts a new user, returning the assigned id.
    fn add(&self, user: &User) -> RepoResult<UserId>;
    /// Validates and rewrites `name`, `email` and `notes` of an existing user.
    fn update(&self, user: &User) -> RepoResult<()>;
    /// Stamps the deletion time, keeping the row queryable.
    fn soft_delete_by_id(&self, id: UserId) -> RepoResult<()>;
    /// Erases the row permanently.
    fn hard_delete_by_id(&self, id: UserId) -> RepoResult<()>;
    fn get_by_id(&self, id: UserId) -> RepoResult<User>;
    fn get_by_email(&self, email: &str) -> RepoResult<User>;
    fn get_by_name(&self, name: &str) -> RepoResult<User>;
    /// Returns every user, soft-deleted ones included, ordered by id.
    fn get_all(&self) -> RepoResult<Vec<User>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn, V, L> {
    conn: &'conn Connection,
    validator: V,
    log: L,
    clock: Box<dyn Clock + 'conn>,
}

impl<'conn, V: UserValidator, L: UserModificationLog> SqliteUserRepository<'conn, V, L> {
    /// Builds a repository over a migrated connection.
    pub fn new(conn: &'conn Connection, validator: V, log: L) -> Self {
        Self {
            conn,
            validator,
            log,
            clock: Box::new(SystemClock),
        }
    }

    /// Replaces the clock used for soft-delete tombstones.
    pub fn with_clock(mut self, clock: impl Clock + 'conn) -> Self {
        self.clock = Box::new(clock);
        self
    }

    fn execute(&self, change: &UserChange, params: &[(&str, &dyn ToSql)]) -> RepoResult<usize> {
        self.timed(change.operation, || self.conn.execute(change.query, params))
    }

    fn timed<T>(
        &self,
        operation: UserOperation,
        statement: impl FnOnce() -> rusqlite::Result<T>,
    ) -> RepoResult<T> {
        let started_at = Instant::now();
        let event = event_name(operation);
        match statement() {
            Ok(value) => {
                info!(
                    "event={event} module=repo status=ok duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(value)
            }
            Err(err) => {
                let err = RepoError::from(err);
                error!(
                    "event={event} module=repo status=error duration_ms={} unique_violation={} error={err}",
                    started_at.elapsed().as_millis(),
                    err.is_uniqueness_conflict()
                );
                Err(err)
            }
        }
    }

    fn journal(&self, change: &UserChange) -> RepoResult<()> {
        self.log.log_change(change).map_err(|source| {
            error!(
                "event=user_journal module=repo status=error operation={} error={source}",
                change.operation.as_str()
            );
            RepoError::Journal {
                operation: change.operation,
                source,
            }
        })
    }

    fn fetch_one(&self, filter: &str, value: &dyn ToSql, lookup: UserLookup) -> RepoResult<User> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE {filter} = ?1 LIMIT 2;"))?;
        let mut rows = stmt.query([value])?;

        let Some(row) = rows.next()? else {
            debug!("event=user_lookup module=repo status=not_found by={filter}");
            return Err(RepoError::NotFound(lookup));
        };
        let user = parse_user_row(row)?;

        if rows.next()?.is_some() {
            return Err(RepoError::InvalidData(format!(
                "multiple users match {lookup} despite uniqueness constraint"
            )));
        }
        Ok(user)
    }
}

impl<V: UserValidator, L: UserModificationLog> UserRepository
    for SqliteUserRepository<'_, V, L>
{
    fn add(&self, user: &User) -> RepoResult<UserId> {
        self.validator.validate(user)?;

        let change = UserChange::new(UserOperation::Add, INSERT_USER_SQL)
            .param("name", user.name.as_str())
            .param("email", user.email.as_str())
            .param("created", user.created)
            .param("notes", user.notes.as_deref());
        self.execute(
            &change,
            named_params! {
                ":name": user.name,
                ":email": user.email,
                ":created": user.created,
                ":notes": user.notes,
            },
        )?;
        let id = self.conn.last_insert_rowid();

        self.journal(&change)?;
        Ok(id)
    }

    fn update(&self, user: &User) -> RepoResult<()> {
        let Some(id) = user.id else {
            return Err(RepoError::InvalidArgument("user id is not set".to_string()));
        };
        self.validator.validate(user)?;

        let change = UserChange::new(UserOperation::Update, UPDATE_USER_SQL)
            .param("name", user.name.as_str())
            .param("email", user.email.as_str())
            .param("notes", user.notes.as_deref())
            .param("id", id);
        let changed = self.execute(
            &change,
            named_params! {
                ":name": user.name,
                ":email": user.email,
                ":notes": user.notes,
                ":id": id,
            },
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(UserLookup::Id(id)));
        }
        self.journal(&change)
    }

    fn soft_delete_by_id(&self, id: UserId) -> RepoResult<()> {
        let now = self.clock.now();
        let stored: Option<DateTime<Utc>> = self.timed(UserOperation::SoftDelete, || {
            self.conn
                .query_row(
                    SOFT_DELETE_USER_SQL,
                    named_params! {
                        ":deleted": now,
                        ":id": id,
                    },
                    |row| row.get("deleted"),
                )
                .optional()
        })?;

        let Some(deleted) = stored else {
            return Err(RepoError::NotFound(UserLookup::Id(id)));
        };
        let change = UserChange::new(UserOperation::SoftDelete, SOFT_DELETE_USER_SQL)
            .param("deleted", deleted)
            .param("id", id);
        self.journal(&change)
    }

    fn hard_delete_by_id(&self, id: UserId) -> RepoResult<()> {
        let change =
            UserChange::new(UserOperation::HardDelete, HARD_DELETE_USER_SQL).param("id", id);
        let changed = self.execute(&change, named_params! { ":id": id })?;

        if changed == 0 {
            return Err(RepoError::NotFound(UserLookup::Id(id)));
        }
        self.journal(&change)
    }

    fn get_by_id(&self, id: UserId) -> RepoResult<User> {
        self.fetch_one("id", &id, UserLookup::Id(id))
    }

    fn get_by_email(&self, email: &str) -> RepoResult<User> {
        self.fetch_one("email", &email, UserLookup::Email(email.to_string()))
    }

    fn get_by_name(&self, name: &str) -> RepoResult<User> {
        self.fetch_one("name", &name, UserLookup::Name(name.to_string()))
    }

    fn get_all(&self) -> RepoResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();

        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }

        Ok(users)
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let id: UserId = row.get("id")?;
    let created = row.get("created").map_err(|err| {
        RepoError::InvalidData(format!("invalid created value for user {id}: {err}"))
    })?;
    let deleted = row.get("deleted").map_err(|err| {
        RepoError::InvalidData(format!("invalid deleted value for user {id}: {err}"))
    })?;

    Ok(User {
        id: Some(id),
        name: row.get("name")?,
        email: row.get("email")?,
        created,
        deleted,
        notes: row.get("notes")?,
    })
}

fn event_name(operation: UserOperation) -> &'static str {
    match operation {
        UserOperation::Add => "user_add",
        UserOperation::Update => "user_update",
        UserOperation::SoftDelete => "user_soft_delete",
        UserOperation::HardDelete => "user_hard_delete",
    }
}
