//! Lead repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide first-or-none lookups and single-row writes for the three lead
//!   collections (`app_users`, `user_addresses`, `rent_valuation_reports`).
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Statements run in autocommit mode, so each write is durable on return.
//! - Read paths reject invalid persisted state instead of masking it.
//! - "Most recent report" means `date_created DESC`, newest insert first on
//!   equal timestamps.

use crate::db::schema::{find_schema_gap, schema_version, SchemaGap, LEAD_SCHEMA_VERSION};
use crate::db::DbError;
use crate::model::address::{Address, AddressId, AddressRecord};
use crate::model::user::{LeadUser, UserId, UserRecord};
use crate::model::valuation::{RentValuationData, RentValuationReport, ReportId};
use rusqlite::{params, Connection, InterruptHandle, Row};
use rust_decimal::Decimal;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

const USER_SELECT_SQL: &str = "SELECT
    user_id,
    email,
    first_name,
    last_name,
    phone,
    date_created,
    date_modified
FROM app_users";

const ADDRESS_SELECT_SQL: &str = "SELECT
    address_id,
    user_id,
    street,
    city,
    county,
    state,
    zip,
    date_created
FROM user_addresses";

const REPORT_SELECT_SQL: &str = "SELECT
    rent_valuation_record_id,
    user_id,
    address_id,
    average_monthly_rent,
    home_owner_specified_rent,
    valuation_rent_high,
    valuation_rent_low,
    value_changed_in_30_days,
    is_rent_estimate_available,
    date_created
FROM rent_valuation_reports";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for lead persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// An update targeted a row that does not exist.
    NotFound {
        entity: &'static str,
        id: Uuid,
    },
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted lead data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it with open_db first"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
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

/// Persistence context used by the lead data provider.
pub trait LeadRepository {
    /// First user whose email matches exactly.
    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<UserRecord>>;
    fn find_user(&self, user_id: UserId) -> RepoResult<Option<UserRecord>>;
    fn insert_user(&self, user: &UserRecord) -> RepoResult<UserId>;
    /// Overwrites name and phone; email is left untouched.
    fn update_user_profile(
        &self,
        user_id: UserId,
        values: &LeadUser,
        date_modified: i64,
    ) -> RepoResult<()>;
    /// First address of `user_id` matching street, city, state and zip exactly.
    fn find_address(&self, user_id: UserId, address: &Address)
        -> RepoResult<Option<AddressRecord>>;
    fn find_address_by_id(&self, address_id: AddressId) -> RepoResult<Option<AddressRecord>>;
    fn insert_address(&self, address: &AddressRecord) -> RepoResult<AddressId>;
    fn insert_valuation_report(&self, report: &RentValuationReport) -> RepoResult<ReportId>;
    fn find_valuation_report(&self, report_id: ReportId)
        -> RepoResult<Option<RentValuationReport>>;
    fn latest_valuation_report_for_user(
        &self,
        user_id: UserId,
    ) -> RepoResult<Option<RentValuationReport>>;
    /// All reports of a user, newest first.
    fn list_valuation_reports_for_user(
        &self,
        user_id: UserId,
    ) -> RepoResult<Vec<RentValuationReport>>;
    fn set_home_owner_specified_rent(&self, report_id: ReportId, rent: Decimal)
        -> RepoResult<()>;
}

/// SQLite-backed lead repository borrowing one connection.
pub struct SqliteLeadRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLeadRepository<'conn> {
    /// Constructs a repository from a connection carrying the lead schema.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema version is not current.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` on schema drift.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_lead_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Handle that aborts the statement currently running on this
    /// connection. Safe to fire from another thread.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.conn.get_interrupt_handle()
    }
}

impl LeadRepository for SqliteLeadRepository<'_> {
    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<UserRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{USER_SELECT_SQL}
             WHERE email = ?1
             ORDER BY rowid ASC
             LIMIT 1;"
        ))?;
        let mut rows = stmt.query([email])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn find_user(&self, user_id: UserId) -> RepoResult<Option<UserRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE user_id = ?1;"))?;
        let mut rows = stmt.query([user_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn insert_user(&self, user: &UserRecord) -> RepoResult<UserId> {
        self.conn.execute(
            "INSERT INTO app_users (
                user_id,
                email,
                first_name,
                last_name,
                phone,
                date_created,
                date_modified
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                user.user_id.to_string(),
                user.email.as_str(),
                user.first_name.as_str(),
                user.last_name.as_str(),
                user.phone.as_str(),
                user.date_created,
                user.date_modified,
            ],
        )?;
        Ok(user.user_id)
    }

    fn update_user_profile(
        &self,
        user_id: UserId,
        values: &LeadUser,
        date_modified: i64,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE app_users
             SET
                first_name = ?1,
                last_name = ?2,
                phone = ?3,
                date_modified = ?4
             WHERE user_id = ?5;",
            params![
                values.first_name.as_str(),
                values.last_name.as_str(),
                values.phone.as_str(),
                date_modified,
                user_id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "user",
                id: user_id,
            });
        }
        Ok(())
    }

    fn find_address(
        &self,
        user_id: UserId,
        address: &Address,
    ) -> RepoResult<Option<AddressRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ADDRESS_SELECT_SQL}
             WHERE user_id = ?1
               AND street = ?2
               AND city = ?3
               AND state = ?4
               AND zip = ?5
             ORDER BY rowid ASC
             LIMIT 1;"
        ))?;
        let mut rows = stmt.query(params![
            user_id.to_string(),
            address.street.as_str(),
            address.city.as_str(),
            address.state.as_str(),
            address.zip.as_str(),
        ])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_address_row(row)?));
        }
        Ok(None)
    }

    fn find_address_by_id(&self, address_id: AddressId) -> RepoResult<Option<AddressRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ADDRESS_SELECT_SQL} WHERE address_id = ?1;"))?;
        let mut rows = stmt.query([address_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_address_row(row)?));
        }
        Ok(None)
    }

    fn insert_address(&self, record: &AddressRecord) -> RepoResult<AddressId> {
        self.conn.execute(
            "INSERT INTO user_addresses (
                address_id,
                user_id,
                street,
                city,
                county,
                state,
                zip,
                date_created
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                record.address_id.to_string(),
                record.user_id.to_string(),
                record.address.street.as_str(),
                record.address.city.as_str(),
                record.address.county.as_str(),
                record.address.state.as_str(),
                record.address.zip.as_str(),
                record.date_created,
            ],
        )?;
        Ok(record.address_id)
    }

    fn insert_valuation_report(&self, report: &RentValuationReport) -> RepoResult<ReportId> {
        let data = &report.data;
        self.conn.execute(
            "INSERT INTO rent_valuation_reports (
                rent_valuation_record_id,
                user_id,
                address_id,
                average_monthly_rent,
                home_owner_specified_rent,
                valuation_rent_high,
                valuation_rent_low,
                value_changed_in_30_days,
                is_rent_estimate_available,
                date_created
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                report.report_id.to_string(),
                report.user_id.to_string(),
                report.address_id.to_string(),
                data.average_monthly_rent.to_string(),
                data.home_owner_specified_rent.to_string(),
                data.valuation_rent_high.to_string(),
                data.valuation_rent_low.to_string(),
                data.value_changed_in_30_days.to_string(),
                bool_to_int(data.is_rent_estimate_available),
                report.date_created,
            ],
        )?;
        Ok(report.report_id)
    }

    fn find_valuation_report(
        &self,
        report_id: ReportId,
    ) -> RepoResult<Option<RentValuationReport>> {
        let mut stmt = self.conn.prepare(&format!(
            "{REPORT_SELECT_SQL} WHERE rent_valuation_record_id = ?1;"
        ))?;
        let mut rows = stmt.query([report_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_report_row(row)?));
        }
        Ok(None)
    }

    fn latest_valuation_report_for_user(
        &self,
        user_id: UserId,
    ) -> RepoResult<Option<RentValuationReport>> {
        let mut stmt = self.conn.prepare(&format!(
            "{REPORT_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY date_created DESC, rowid DESC
             LIMIT 1;"
        ))?;
        let mut rows = stmt.query([user_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_report_row(row)?));
        }
        Ok(None)
    }

    fn list_valuation_reports_for_user(
        &self,
        user_id: UserId,
    ) -> RepoResult<Vec<RentValuationReport>> {
        let mut stmt = self.conn.prepare(&format!(
            "{REPORT_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY date_created DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut reports = Vec::new();
        while let Some(row) = rows.next()? {
            reports.push(parse_report_row(row)?);
        }
        Ok(reports)
    }

    fn set_home_owner_specified_rent(
        &self,
        report_id: ReportId,
        rent: Decimal,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE rent_valuation_reports
             SET home_owner_specified_rent = ?1
             WHERE rent_valuation_record_id = ?2;",
            params![rent.to_string(), report_id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "rent valuation report",
                id: report_id,
            });
        }
        Ok(())
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<UserRecord> {
    Ok(UserRecord {
        user_id: parse_uuid_column(row, "app_users", "user_id")?,
        email: row.get("email")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        phone: row.get("phone")?,
        date_created: row.get("date_created")?,
        date_modified: row.get("date_modified")?,
    })
}

fn parse_address_row(row: &Row<'_>) -> RepoResult<AddressRecord> {
    Ok(AddressRecord {
        address_id: parse_uuid_column(row, "user_addresses", "address_id")?,
        user_id: parse_uuid_column(row, "user_addresses", "user_id")?,
        address: Address {
            street: row.get("street")?,
            city: row.get("city")?,
            county: row.get("county")?,
            state: row.get("state")?,
            zip: row.get("zip")?,
        },
        date_created: row.get("date_created")?,
    })
}

fn parse_report_row(row: &Row<'_>) -> RepoResult<RentValuationReport> {
    let table = "rent_valuation_reports";
    let is_rent_estimate_available = match row.get::<_, i64>("is_rent_estimate_available")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_rent_estimate_available value `{other}` in {table}"
            )));
        }
    };

    Ok(RentValuationReport {
        report_id: parse_uuid_column(row, table, "rent_valuation_record_id")?,
        user_id: parse_uuid_column(row, table, "user_id")?,
        address_id: parse_uuid_column(row, table, "address_id")?,
        data: RentValuationData {
            average_monthly_rent: parse_decimal_column(row, table, "average_monthly_rent")?,
            home_owner_specified_rent: parse_decimal_column(
                row,
                table,
                "home_owner_specified_rent",
            )?,
            is_rent_estimate_available,
            valuation_rent_high: parse_decimal_column(row, table, "valuation_rent_high")?,
            valuation_rent_low: parse_decimal_column(row, table, "valuation_rent_low")?,
            value_changed_in_30_days: parse_decimal_column(
                row,
                table,
                "value_changed_in_30_days",
            )?,
        },
        date_created: row.get("date_created")?,
    })
}

fn parse_uuid_column(row: &Row<'_>, table: &str, column: &str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{text}` in {table}.{column}"))
    })
}

fn parse_decimal_column(row: &Row<'_>, table: &str, column: &str) -> RepoResult<Decimal> {
    let text: String = row.get(column)?;
    Decimal::from_str(&text).map_err(|_| {
        RepoError::InvalidData(format!("invalid decimal value `{text}` in {table}.{column}"))
    })
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn ensure_lead_connection_ready(conn: &Connection) -> RepoResult<()> {
    let actual_version = schema_version(conn)?;
    if actual_version != LEAD_SCHEMA_VERSION {
        return Err(RepoError::UninitializedConnection {
            expected_version: LEAD_SCHEMA_VERSION,
            actual_version,
        });
    }

    match find_schema_gap(conn)? {
        None => Ok(()),
        Some(SchemaGap::MissingTable(table)) => Err(RepoError::MissingRequiredTable(table)),
        Some(SchemaGap::MissingColumn { table, column }) => {
            Err(RepoError::MissingRequiredColumn { table, column })
        }
    }
}
