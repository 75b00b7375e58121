//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure pragmas and lock wait bounds.
//! - Install the lead schema before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections are at `LEAD_SCHEMA_VERSION`.

use super::schema::ensure_lead_schema;
use super::DbResult;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Lock wait applied by `open_db` and `open_db_in_memory`.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a SQLite database file and installs the lead schema if missing.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_db_with_busy_timeout(Some(path.as_ref()), DEFAULT_BUSY_TIMEOUT)
}

/// Opens an in-memory SQLite database and installs the lead schema if missing.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_db_with_busy_timeout(None, DEFAULT_BUSY_TIMEOUT)
}

/// Opens a file database (`Some(path)`) or an in-memory one (`None`) with a
/// caller-chosen busy timeout.
///
/// The busy timeout bounds how long a statement waits on a locked database
/// before failing with `SQLITE_BUSY`.
pub fn open_db_with_busy_timeout(
    path: Option<&Path>,
    busy_timeout: Duration,
) -> DbResult<Connection> {
    let mode = if path.is_some() { "file" } else { "memory" };
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let opened = match path {
        Some(path) => Connection::open(path),
        None => Connection::open_in_memory(),
    };
    let mut conn = match opened {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&mut conn, busy_timeout) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection, busy_timeout: Duration) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(busy_timeout)?;
    ensure_lead_schema(conn)?;
    Ok(())
}
