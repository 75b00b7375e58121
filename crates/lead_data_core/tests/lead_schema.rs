use lead_data_core::db::schema::{find_schema_gap, schema_version, SchemaGap, LEAD_SCHEMA_VERSION};
use lead_data_core::db::{open_db, open_db_in_memory, DbError};
use lead_data_core::{LeadDataProvider, LeadUser, SqliteLeadRepository};
use rusqlite::Connection;

#[test]
fn fresh_database_carries_full_lead_schema() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn).unwrap(), LEAD_SCHEMA_VERSION);
    assert_eq!(find_schema_gap(&conn).unwrap(), None);
}

#[test]
fn address_match_key_is_indexed_in_lookup_order() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(
        index_columns(&conn, "idx_user_addresses_owner"),
        vec![
            ("user_id".to_string(), false),
            ("street".to_string(), false),
            ("city".to_string(), false),
            ("state".to_string(), false),
            ("zip".to_string(), false),
        ]
    );
}

#[test]
fn report_history_index_sorts_newest_first_per_user() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(
        index_columns(&conn, "idx_rent_valuation_reports_user_created"),
        vec![
            ("user_id".to_string(), false),
            ("date_created".to_string(), true),
        ]
    );
}

#[test]
fn valuation_reports_require_every_figure_and_link() {
    let conn = open_db_in_memory().unwrap();

    let nullable: Vec<String> = conn
        .prepare(
            "SELECT name FROM pragma_table_info('rent_valuation_reports')
             WHERE \"notnull\" = 0;",
        )
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert!(nullable.is_empty(), "nullable report columns: {nullable:?}");

    let links: Vec<(String, String, String)> = conn
        .prepare(
            "SELECT \"table\", \"from\", \"to\"
             FROM pragma_foreign_key_list('rent_valuation_reports')
             ORDER BY \"from\";",
        )
        .unwrap()
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        links,
        vec![
            (
                "user_addresses".to_string(),
                "address_id".to_string(),
                "address_id".to_string()
            ),
            (
                "app_users".to_string(),
                "user_id".to_string(),
                "user_id".to_string()
            ),
        ]
    );
}

#[test]
fn user_modified_timestamp_is_the_only_nullable_user_column() {
    let conn = open_db_in_memory().unwrap();

    let nullable: Vec<String> = conn
        .prepare("SELECT name FROM pragma_table_info('app_users') WHERE \"notnull\" = 0;")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(nullable, vec!["date_modified".to_string()]);
}

#[test]
fn address_owner_must_exist() {
    let conn = open_db_in_memory().unwrap();

    let result = conn.execute(
        "INSERT INTO user_addresses (
            address_id, user_id, street, city, county, state, zip, date_created
        ) VALUES ('a', 'missing-user', 's', 'c', 'k', 'st', 'z', 0);",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn reopening_file_keeps_leads_without_reinstalling() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("leads.sqlite3");

    let user_id = {
        let conn = open_db(&path).unwrap();
        let provider = LeadDataProvider::new(SqliteLeadRepository::try_new(&conn).unwrap());
        provider
            .add_user(&LeadUser::new("kept@x.com", "Kay", "Pt", "1"))
            .unwrap()
    };

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn).unwrap(), LEAD_SCHEMA_VERSION);
    let provider = LeadDataProvider::new(SqliteLeadRepository::try_new(&conn).unwrap());
    assert_eq!(
        provider.get_user_id_from_email("kept@x.com").unwrap(),
        Some(user_id)
    );
}

#[test]
fn newer_schema_file_is_left_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.pragma_update(None, "user_version", LEAD_SCHEMA_VERSION + 1)
        .unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, LEAD_SCHEMA_VERSION + 1);
            assert_eq!(latest_supported, LEAD_SCHEMA_VERSION);
        }
        other => panic!("unexpected error: {other}"),
    }

    let conn = Connection::open(&path).unwrap();
    assert_eq!(
        find_schema_gap(&conn).unwrap(),
        Some(SchemaGap::MissingTable("app_users"))
    );
}

#[test]
fn dropped_report_column_is_reported_as_gap() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch("ALTER TABLE rent_valuation_reports DROP COLUMN value_changed_in_30_days;")
        .unwrap();

    assert_eq!(
        find_schema_gap(&conn).unwrap(),
        Some(SchemaGap::MissingColumn {
            table: "rent_valuation_reports",
            column: "value_changed_in_30_days",
        })
    );
}

/// Key columns of an index with their descending flag.
fn index_columns(conn: &Connection, index: &str) -> Vec<(String, bool)> {
    let mut stmt = conn
        .prepare(
            "SELECT name, \"desc\"
             FROM pragma_index_xinfo(?1)
             WHERE key = 1
             ORDER BY seqno;",
        )
        .unwrap();
    let columns = stmt
        .query_map([index], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    columns
}
