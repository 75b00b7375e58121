//! Lead database connections and schema.
//!
//! Connections handed out here have foreign keys enforced, a bounded lock
//! wait, and the lead schema at [`schema::LEAD_SCHEMA_VERSION`].

use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
pub mod schema;

pub use open::{open_db, open_db_in_memory, open_db_with_busy_timeout, DEFAULT_BUSY_TIMEOUT};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file was stamped by a newer build of the lead schema.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl DbError {
    /// SQLite primary result code, when the failure came from the engine.
    pub fn sqlite_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Sqlite(err) => err.sqlite_error_code(),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }

    /// Statement aborted through an interrupt handle.
    pub fn is_interrupted(&self) -> bool {
        self.sqlite_code() == Some(ErrorCode::OperationInterrupted)
    }

    /// Lock wait exceeded the connection's busy timeout.
    pub fn is_busy(&self) -> bool {
        matches!(
            self.sqlite_code(),
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
        )
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "lead storage error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "lead database is at schema version {db_version}, this build understands up to {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
