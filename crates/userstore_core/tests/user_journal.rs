use chrono::{TimeZone, Utc};
use rusqlite::{params, Connection};
use std::cell::RefCell;
use userstore_core::db::open_db_in_memory;
use userstore_core::{
    ChangeValue, FixedClock, JournalError, JournalResult, RepoError, SqliteModificationLog,
    SqliteUserRepository, User, UserChange, UserModificationLog, UserOperation, UserRepository,
    UserValidator, ValidationError,
};

struct AcceptAll;

impl UserValidator for AcceptAll {
    fn validate(&self, _user: &User) -> Result<(), ValidationError> {
        Ok(())
    }
}

struct RejectAll;

impl UserValidator for RejectAll {
    fn validate(&self, _user: &User) -> Result<(), ValidationError> {
        Err(ValidationError::NameTooShort)
    }
}

#[derive(Default)]
struct RecordingLog {
    changes: RefCell<Vec<UserChange>>,
}

impl RecordingLog {
    fn operations(&self) -> Vec<UserOperation> {
        self.changes
            .borrow()
            .iter()
            .map(|change| change.operation)
            .collect()
    }
}

impl UserModificationLog for RecordingLog {
    fn log_change(&self, change: &UserChange) -> JournalResult<()> {
        self.changes.borrow_mut().push(change.clone());
        Ok(())
    }
}

struct FailingLog;

impl UserModificationLog for FailingLog {
    fn log_change(&self, _change: &UserChange) -> JournalResult<()> {
        Err(JournalError::Rejected("audit sink offline".to_string()))
    }
}

fn insert_raw(conn: &Connection, name: &str, email: &str) -> i64 {
    conn.execute(
        "INSERT INTO users (name, email, created, deleted, notes) VALUES (?1, ?2, ?3, NULL, NULL);",
        params![name, email, Utc::now()],
    )
    .unwrap();
    conn.last_insert_rowid()
}

#[test]
fn adding_is_journaled() {
    let conn = open_db_in_memory().unwrap();
    let log = RecordingLog::default();
    let repo = SqliteUserRepository::new(&conn, AcceptAll, &log);

    repo.add(&User::new("frosty123", "frosty@chilly.com").with_notes("hi"))
        .unwrap();

    assert_eq!(log.operations(), vec![UserOperation::Add]);
    let changes = log.changes.borrow();
    let change = &changes[0];
    assert!(change.query.starts_with("INSERT INTO users"));
    assert_eq!(change.get("name"), Some(&ChangeValue::Text("frosty123".to_string())));
    assert_eq!(change.get("email"), Some(&ChangeValue::Text("frosty@chilly.com".to_string())));
    assert_eq!(change.get("notes"), Some(&ChangeValue::Text("hi".to_string())));
    assert!(matches!(change.get("created"), Some(ChangeValue::Text(_))));
}

#[test]
fn updating_is_journaled() {
    let conn = open_db_in_memory().unwrap();
    let id = insert_raw(&conn, "frosty123", "frosty@chilly.com");
    let log = RecordingLog::default();
    let repo = SqliteUserRepository::new(&conn, AcceptAll, &log);

    let mut user = repo.get_by_name("frosty123").unwrap();
    user.email = "frosty@newdomain.com".to_string();
    repo.update(&user).unwrap();

    assert_eq!(log.operations(), vec![UserOperation::Update]);
    let changes = log.changes.borrow();
    assert_eq!(changes[0].get("id"), Some(&ChangeValue::Integer(id)));
    assert_eq!(changes[0].get("notes"), Some(&ChangeValue::Null));
    assert_eq!(
        changes[0].get("email"),
        Some(&ChangeValue::Text("frosty@newdomain.com".to_string()))
    );
}

#[test]
fn soft_deletion_is_journaled() {
    let conn = open_db_in_memory().unwrap();
    insert_raw(&conn, "frosty123", "frosty@chilly.com");
    let log = RecordingLog::default();
    let deleted_at = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
    let repo =
        SqliteUserRepository::new(&conn, AcceptAll, &log).with_clock(FixedClock::new(deleted_at));

    let user = repo.get_by_name("frosty123").unwrap();
    repo.soft_delete_by_id(user.id.unwrap()).unwrap();

    assert_eq!(log.operations(), vec![UserOperation::SoftDelete]);
    assert_eq!(
        log.changes.borrow()[0].get("deleted"),
        Some(&ChangeValue::from(deleted_at))
    );
}

#[test]
fn repeated_soft_deletion_journals_the_stored_tombstone() {
    let conn = open_db_in_memory().unwrap();
    insert_raw(&conn, "frosty123", "frosty@chilly.com");
    let log = RecordingLog::default();
    let first_at = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
    let first =
        SqliteUserRepository::new(&conn, AcceptAll, &log).with_clock(FixedClock::new(first_at));
    let second = SqliteUserRepository::new(&conn, AcceptAll, &log)
        .with_clock(FixedClock::new(Utc.with_ymd_and_hms(2031, 1, 1, 0, 0, 0).unwrap()));

    let id = first.get_by_name("frosty123").unwrap().id.unwrap();
    first.soft_delete_by_id(id).unwrap();
    second.soft_delete_by_id(id).unwrap();

    let changes = log.changes.borrow();
    assert_eq!(changes.len(), 2);
    for change in changes.iter() {
        assert_eq!(change.get("deleted"), Some(&ChangeValue::from(first_at)));
    }
}

#[test]
fn soft_deletion_journals_created_when_clock_lags() {
    let conn = open_db_in_memory().unwrap();
    let created = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    conn.execute(
        "INSERT INTO users (name, email, created) VALUES ('frosty123', 'frosty@chilly.com', ?1);",
        params![created],
    )
    .unwrap();
    let id = conn.last_insert_rowid();
    let log = RecordingLog::default();
    let repo = SqliteUserRepository::new(&conn, AcceptAll, &log)
        .with_clock(FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));

    repo.soft_delete_by_id(id).unwrap();

    assert_eq!(repo.get_by_id(id).unwrap().deleted, Some(created));
    assert_eq!(
        log.changes.borrow()[0].get("deleted"),
        Some(&ChangeValue::from(created))
    );
}

#[test]
fn hard_deletion_is_journaled() {
    let conn = open_db_in_memory().unwrap();
    insert_raw(&conn, "frosty123", "frosty@chilly.com");
    let log = RecordingLog::default();
    let repo = SqliteUserRepository::new(&conn, AcceptAll, &log);

    let user = repo.get_by_name("frosty123").unwrap();
    repo.hard_delete_by_id(user.id.unwrap()).unwrap();

    assert_eq!(log.operations(), vec![UserOperation::HardDelete]);
    assert_eq!(log.changes.borrow()[0].query, "DELETE FROM users WHERE id = :id;");
}

#[test]
fn reads_are_never_journaled() {
    let conn = open_db_in_memory().unwrap();
    let id = insert_raw(&conn, "frosty123", "frosty@chilly.com");
    let log = RecordingLog::default();
    let repo = SqliteUserRepository::new(&conn, AcceptAll, &log);

    repo.get_by_id(id).unwrap();
    repo.get_by_name("frosty123").unwrap();
    repo.get_by_email("frosty@chilly.com").unwrap();
    repo.get_all().unwrap();
    let _ = repo.get_by_id(999);

    assert!(log.operations().is_empty());
}

#[test]
fn failed_mutations_are_not_journaled() {
    let conn = open_db_in_memory().unwrap();
    insert_raw(&conn, "frosty123", "frosty@chilly.com");
    let log = RecordingLog::default();
    let accepting = SqliteUserRepository::new(&conn, AcceptAll, &log);
    let rejecting = SqliteUserRepository::new(&conn, RejectAll, &log);

    rejecting
        .add(&User::new("letter999", "a@b.com"))
        .unwrap_err();
    accepting
        .add(&User::new("frosty123", "other@b.com"))
        .unwrap_err();
    accepting
        .update(&User::new("frosty123", "frosty@chilly.com"))
        .unwrap_err();
    accepting.soft_delete_by_id(999).unwrap_err();
    accepting.hard_delete_by_id(999).unwrap_err();

    assert!(log.operations().is_empty());
}

#[test]
fn each_mutation_is_journaled_exactly_once() {
    let conn = open_db_in_memory().unwrap();
    let log = RecordingLog::default();
    let repo = SqliteUserRepository::new(&conn, AcceptAll, &log);

    let id = repo.add(&User::new("frosty123", "frosty@chilly.com")).unwrap();
    let mut user = repo.get_by_id(id).unwrap();
    user.notes = Some("note".to_string());
    repo.update(&user).unwrap();
    repo.soft_delete_by_id(id).unwrap();
    repo.hard_delete_by_id(id).unwrap();

    assert_eq!(
        log.operations(),
        vec![
            UserOperation::Add,
            UserOperation::Update,
            UserOperation::SoftDelete,
            UserOperation::HardDelete,
        ]
    );
}

#[test]
fn journal_failure_is_surfaced_after_commit() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::new(&conn, AcceptAll, FailingLog);

    let err = repo
        .add(&User::new("frosty123", "frosty@chilly.com"))
        .unwrap_err();

    assert!(matches!(
        err,
        RepoError::Journal {
            operation: UserOperation::Add,
            source: JournalError::Rejected(_),
        }
    ));
    assert!(err.to_string().contains("audit sink offline"));
    // Journaling is not transactional with the write.
    assert_eq!(repo.get_all().unwrap().len(), 1);
}

#[test]
fn sqlite_journal_persists_entries_in_order() {
    let conn = open_db_in_memory().unwrap();
    let logged_at = Utc.with_ymd_and_hms(2025, 2, 3, 4, 5, 6).unwrap();
    let log = SqliteModificationLog::new(&conn).with_clock(FixedClock::new(logged_at));
    let repo = SqliteUserRepository::new(&conn, AcceptAll, &log);

    let first = repo.add(&User::new("frosty123", "frosty@chilly.com")).unwrap();
    let second = repo.add(&User::new("letter999", "a@b.com")).unwrap();
    repo.soft_delete_by_id(first).unwrap();
    repo.hard_delete_by_id(first).unwrap();

    // Ids come from `users`, not from the journal table sharing the connection.
    assert_eq!(repo.get_by_name("letter999").unwrap().id, Some(second));

    let entries = log.entries().unwrap();
    let operations: Vec<_> = entries.iter().map(|entry| entry.operation).collect();
    assert_eq!(
        operations,
        vec![
            UserOperation::Add,
            UserOperation::Add,
            UserOperation::SoftDelete,
            UserOperation::HardDelete,
        ]
    );
    assert!(entries.windows(2).all(|pair| pair[0].id < pair[1].id));
    assert!(entries.iter().all(|entry| entry.logged_at == logged_at));

    let hard_delete = &entries[3];
    assert_eq!(hard_delete.query, "DELETE FROM users WHERE id = :id;");
    assert_eq!(hard_delete.params.len(), 1);
    assert_eq!(hard_delete.params[0].name, "id");
    assert_eq!(hard_delete.params[0].value, ChangeValue::Integer(first));
}

#[test]
fn sqlite_journal_rejects_unknown_operations_on_read() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch("PRAGMA ignore_check_constraints = ON;").unwrap();
    conn.execute(
        "INSERT INTO user_modifications (operation, query, params, logged_at)
         VALUES ('truncate', 'DELETE FROM users;', '[]', ?1);",
        params![Utc::now()],
    )
    .unwrap();
    let log = SqliteModificationLog::new(&conn);

    let err = log.entries().unwrap_err();

    assert!(matches!(err, JournalError::InvalidData(_)), "{err}");
}
