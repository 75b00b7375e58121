//! Lead schema install, version stamp and shape verification.
//!
//! # Responsibility
//! - Install `app_users`, `user_addresses` and `rent_valuation_reports` on an
//!   empty database, stamping `PRAGMA user_version`.
//! - Describe which columns the lead repository reads, and find the first
//!   one a connection lacks.
//!
//! # Invariants
//! - Install runs in one transaction; a failed install leaves version `0`.
//! - A database stamped with a newer version is never touched.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;
use std::collections::HashSet;

/// Version stamped by [`ensure_lead_schema`].
pub const LEAD_SCHEMA_VERSION: u32 = 1;

const LEAD_SCHEMA_SQL: &str = include_str!("lead_schema.sql");

/// Columns one lead table must expose to the repository.
#[derive(Debug, Clone, Copy)]
pub struct LeadTable {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

pub const LEAD_TABLES: &[LeadTable] = &[
    LeadTable {
        name: "app_users",
        columns: &[
            "user_id",
            "email",
            "first_name",
            "last_name",
            "phone",
            "date_created",
            "date_modified",
        ],
    },
    LeadTable {
        name: "user_addresses",
        columns: &[
            "address_id",
            "user_id",
            "street",
            "city",
            "county",
            "state",
            "zip",
            "date_created",
        ],
    },
    LeadTable {
        name: "rent_valuation_reports",
        columns: &[
            "rent_valuation_record_id",
            "user_id",
            "address_id",
            "average_monthly_rent",
            "home_owner_specified_rent",
            "valuation_rent_high",
            "valuation_rent_low",
            "value_changed_in_30_days",
            "is_rent_estimate_available",
            "date_created",
        ],
    },
];

/// First way a connection falls short of [`LEAD_TABLES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaGap {
    MissingTable(&'static str),
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },
}

/// Installs the lead schema on a fresh database; no-op when already current.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file carries any other version.
pub fn ensure_lead_schema(conn: &mut Connection) -> DbResult<()> {
    match schema_version(conn)? {
        LEAD_SCHEMA_VERSION => Ok(()),
        0 => install_lead_schema(conn),
        found => Err(DbError::UnsupportedSchemaVersion {
            db_version: found,
            latest_supported: LEAD_SCHEMA_VERSION,
        }),
    }
}

/// Reads the version stamped in `PRAGMA user_version`.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Returns the first missing table or column, or `None` when the connection
/// can serve every lead query.
pub fn find_schema_gap(conn: &Connection) -> DbResult<Option<SchemaGap>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    for table in LEAD_TABLES {
        let present = stmt
            .query_map([table.name], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        if present.is_empty() {
            return Ok(Some(SchemaGap::MissingTable(table.name)));
        }
        if let Some(column) = table
            .columns
            .iter()
            .copied()
            .find(|column| !present.contains(*column))
        {
            return Ok(Some(SchemaGap::MissingColumn {
                table: table.name,
                column,
            }));
        }
    }
    Ok(None)
}

fn install_lead_schema(conn: &mut Connection) -> DbResult<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(LEAD_SCHEMA_SQL)?;
    tx.pragma_update(None, "user_version", LEAD_SCHEMA_VERSION)?;
    tx.commit()?;

    info!("event=db_schema_install module=db status=ok version={LEAD_SCHEMA_VERSION}");
    Ok(())
}
