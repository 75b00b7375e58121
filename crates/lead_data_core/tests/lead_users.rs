use lead_data_core::db::schema::{schema_version, LEAD_SCHEMA_VERSION};
use lead_data_core::db::{open_db_in_memory, DbError};
use lead_data_core::{LeadDataProvider, LeadUser, RepoError, SqliteLeadRepository};
use rusqlite::Connection;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn add_user_twice_with_same_email_returns_same_id_and_overwrites_profile() {
    let conn = open_db_in_memory().unwrap();
    let provider = LeadDataProvider::new(SqliteLeadRepository::try_new(&conn).unwrap());

    let first = provider
        .add_user(&LeadUser::new("a@x.com", "Jo", "Doe", "555"))
        .unwrap();
    let second = provider
        .add_user(&LeadUser::new("a@x.com", "Joanne", "Doe-Smith", "556"))
        .unwrap();
    assert_eq!(first, second);

    let stored = provider.find_user(first).unwrap().unwrap();
    assert_eq!(stored.email, "a@x.com");
    assert_eq!(stored.first_name, "Joanne");
    assert_eq!(stored.last_name, "Doe-Smith");
    assert_eq!(stored.phone, "556");
    assert!(stored.date_modified.is_some());
    assert!(stored.date_modified.unwrap() >= stored.date_created);

    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM app_users;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn new_user_has_no_modified_timestamp() {
    let conn = open_db_in_memory().unwrap();
    let provider = LeadDataProvider::new(SqliteLeadRepository::try_new(&conn).unwrap());

    let id = provider
        .add_user(&LeadUser::new("new@x.com", "Sam", "Lee", "111"))
        .unwrap();

    let stored = provider.find_user(id).unwrap().unwrap();
    assert_eq!(stored.user_id, id);
    assert!(stored.date_modified.is_none());
    assert!(stored.date_created > 0);
}

#[test]
fn distinct_emails_create_distinct_users() {
    let conn = open_db_in_memory().unwrap();
    let provider = LeadDataProvider::new(SqliteLeadRepository::try_new(&conn).unwrap());

    let a = provider
        .add_user(&LeadUser::new("a@x.com", "A", "One", "1"))
        .unwrap();
    let b = provider
        .add_user(&LeadUser::new("b@x.com", "B", "Two", "2"))
        .unwrap();
    assert_ne!(a, b);
}

#[test]
fn email_lookup_is_exact_match() {
    let conn = open_db_in_memory().unwrap();
    let provider = LeadDataProvider::new(SqliteLeadRepository::try_new(&conn).unwrap());

    let id = provider
        .add_user(&LeadUser::new("a@x.com", "Jo", "Doe", "555"))
        .unwrap();

    assert_eq!(provider.get_user_id_from_email("a@x.com").unwrap(), Some(id));
    assert_eq!(provider.get_user_id_from_email("A@X.COM").unwrap(), None);
    assert_eq!(provider.get_user_id_from_email("nobody@x.com").unwrap(), None);
}

#[test]
fn writes_are_visible_to_a_second_connection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("leads.sqlite3");

    let id = {
        let conn = lead_data_core::db::open_db(&path).unwrap();
        let provider = LeadDataProvider::new(SqliteLeadRepository::try_new(&conn).unwrap());
        provider
            .add_user(&LeadUser::new("durable@x.com", "Di", "Ray", "9"))
            .unwrap()
    };

    let conn = lead_data_core::db::open_db(&path).unwrap();
    let provider = LeadDataProvider::new(SqliteLeadRepository::try_new(&conn).unwrap());
    assert_eq!(
        provider.get_user_id_from_email("durable@x.com").unwrap(),
        Some(id)
    );
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteLeadRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, LEAD_SCHEMA_VERSION),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_required_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", LEAD_SCHEMA_VERSION))
        .unwrap();

    assert!(matches!(
        SqliteLeadRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("app_users"))
    ));
}

#[test]
fn repository_rejects_connection_missing_required_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE app_users (
            user_id TEXT PRIMARY KEY NOT NULL,
            email TEXT NOT NULL,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            phone TEXT NOT NULL,
            date_created INTEGER NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", LEAD_SCHEMA_VERSION))
        .unwrap();

    assert!(matches!(
        SqliteLeadRepository::try_new(&conn),
        Err(RepoError::MissingRequiredColumn {
            table: "app_users",
            column: "date_modified"
        })
    ));
}

#[test]
fn idle_interrupt_does_not_poison_later_writes() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLeadRepository::try_new(&conn).unwrap();

    let handle = repo.interrupt_handle();
    std::thread::spawn(move || handle.interrupt()).join().unwrap();

    let provider = LeadDataProvider::new(repo);
    let id = provider
        .add_user(&LeadUser::new("idle@x.com", "Id", "Le", "0"))
        .unwrap();
    assert_eq!(provider.get_user_id_from_email("idle@x.com").unwrap(), Some(id));
}

#[test]
fn interrupt_aborts_running_statement() {
    let conn = open_db_in_memory().unwrap();
    let handle = SqliteLeadRepository::try_new(&conn)
        .unwrap()
        .interrupt_handle();

    let finished = Arc::new(AtomicBool::new(false));
    let interrupter = {
        let finished = Arc::clone(&finished);
        std::thread::spawn(move || {
            while !finished.load(Ordering::Acquire) {
                std::thread::sleep(Duration::from_millis(20));
                handle.interrupt();
            }
        })
    };

    // Unbounded recursion; only an interrupt ends it.
    let result = conn.query_row(
        "WITH RECURSIVE counter(n) AS (
            SELECT 1
            UNION ALL
            SELECT n + 1 FROM counter
         )
         SELECT COUNT(*) FROM counter;",
        [],
        |row| row.get::<_, i64>(0),
    );
    finished.store(true, Ordering::Release);
    interrupter.join().unwrap();

    let err = DbError::from(result.unwrap_err());
    assert!(err.is_interrupted(), "unexpected error: {err}");
    assert!(!err.is_busy());
    assert_eq!(schema_version(&conn).unwrap(), LEAD_SCHEMA_VERSION);
}
