//! Lead data provider: find-or-create upserts and valuation snapshots.
//!
//! # Responsibility
//! - Upsert users by email and addresses by (owner, street, city, state, zip).
//! - Append one rent valuation report per valuation event.
//! - Apply the home-owner specified-rent correction to the latest report.
//!
//! # Invariants
//! - Lookup always precedes create, so one email maps to one user id.
//! - Email is never rewritten by an upsert.
//! - Reports are never updated except for `home_owner_specified_rent`.
//! - Every create/update path is committed before the call returns.

use crate::model::address::{Address, AddressId, AddressRecord};
use crate::model::now_epoch_ms;
use crate::model::user::{LeadUser, UserId, UserRecord};
use crate::model::valuation::{RentValuationData, RentValuationReport, ReportId};
use crate::repo::lead_repo::{LeadRepository, RepoError};
use log::{debug, info};
use rust_decimal::Decimal;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type LeadDataResult<T> = Result<T, LeadDataError>;

/// Provider error for lead use cases.
#[derive(Debug)]
pub enum LeadDataError {
    /// A required record is missing and no placeholder can be returned.
    NotFound { entity: &'static str, key: String },
    /// Caller input cannot address any record.
    InvalidArgument(String),
    /// Query or commit failure in the persistence layer.
    Storage(RepoError),
}

impl Display for LeadDataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, key } => write!(f, "{entity} not found: {key}"),
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LeadDataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for LeadDataError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound {
                entity,
                key: id.to_string(),
            },
            other => Self::Storage(other),
        }
    }
}

/// Lead data facade over a repository bound to one unit of work.
pub struct LeadDataProvider<R: LeadRepository> {
    repo: R,
}

impl<R: LeadRepository> LeadDataProvider<R> {
    /// Creates a provider using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Upserts a user by exact email match and returns its stable id.
    ///
    /// # Contract
    /// - Existing email: name and phone are overwritten, `date_modified` is
    ///   set, the existing id is returned.
    /// - Unknown email: a new row is inserted with a generated id.
    pub fn add_user(&self, user: &LeadUser) -> LeadDataResult<UserId> {
        match self.repo.find_user_by_email(&user.email)? {
            Some(existing) => self.update_user(&existing, user),
            None => self.add_new_user(user),
        }
    }

    /// Records a rent valuation snapshot for a user at an address.
    ///
    /// # Contract
    /// - The user is upserted exactly as in [`Self::add_user`].
    /// - The address is reused when the same owner already has one with
    ///   identical street, city, state and zip; otherwise it is created.
    /// - A new report is always appended and its id returned.
    /// - The stored specified rent starts equal to `average_monthly_rent`.
    pub fn add_rent_valuation_record(
        &self,
        user: &LeadUser,
        address: &Address,
        valuation: &RentValuationData,
    ) -> LeadDataResult<ReportId> {
        let user_id = self.add_user(user)?;
        let address_id = self.resolve_address(user_id, address)?;

        let report = RentValuationReport::snapshot(user_id, address_id, valuation, now_epoch_ms());
        let report_id = self.repo.insert_valuation_report(&report)?;
        info!(
            "event=rent_valuation_add module=provider status=ok report_id={} user_id={} address_id={} estimate_available={}",
            report_id, user_id, address_id, valuation.is_rent_estimate_available
        );
        Ok(report_id)
    }

    /// Overwrites the specified rent on the user's most recent report.
    ///
    /// Returns `Ok(None)` without touching storage when `user_id` is empty.
    /// The id is matched exactly as given, without trimming.
    ///
    /// # Errors
    /// - `NotFound` when no report exists for `user_id`, including ids that
    ///   are not UUIDs and so can never own a report.
    pub fn update_home_owner_specified_rent(
        &self,
        user_id: &str,
        home_owner_specified_rent: Decimal,
    ) -> LeadDataResult<Option<ReportId>> {
        if user_id.is_empty() {
            return Ok(None);
        }
        let missing_report = || LeadDataError::NotFound {
            entity: "rent valuation report for user",
            key: user_id.to_string(),
        };

        // Stored ids are canonical hyphenated lowercase; anything else cannot match.
        let parsed_id = Uuid::try_parse(user_id)
            .ok()
            .filter(|parsed| parsed.hyphenated().to_string() == user_id)
            .ok_or_else(missing_report)?;
        let latest = self
            .repo
            .latest_valuation_report_for_user(parsed_id)?
            .ok_or_else(missing_report)?;

        self.repo
            .set_home_owner_specified_rent(latest.report_id, home_owner_specified_rent)?;
        info!(
            "event=specified_rent_update module=provider status=ok report_id={} user_id={}",
            latest.report_id, parsed_id
        );
        Ok(Some(latest.report_id))
    }

    /// Returns the figures of one valuation report.
    pub fn find_rent_valuation_record(
        &self,
        report_id: ReportId,
    ) -> LeadDataResult<Option<RentValuationData>> {
        Ok(self
            .repo
            .find_valuation_report(report_id)?
            .map(|report| report.data))
    }

    /// Returns the address a valuation report was recorded for.
    ///
    /// `None` when either the report or its address is missing.
    pub fn get_address_from_rent_valuation_record_id(
        &self,
        report_id: ReportId,
    ) -> LeadDataResult<Option<Address>> {
        let Some(report) = self.repo.find_valuation_report(report_id)? else {
            return Ok(None);
        };
        Ok(self
            .repo
            .find_address_by_id(report.address_id)?
            .map(|record| record.address))
    }

    /// Looks up a user id by exact email match.
    pub fn get_user_id_from_email(&self, email: &str) -> LeadDataResult<Option<UserId>> {
        Ok(self
            .repo
            .find_user_by_email(email)?
            .map(|user| user.user_id))
    }

    /// Returns the stored user row.
    pub fn find_user(&self, user_id: UserId) -> LeadDataResult<Option<UserRecord>> {
        Ok(self.repo.find_user(user_id)?)
    }

    /// Returns every valuation snapshot of a user, newest first.
    pub fn list_rent_valuation_history(
        &self,
        user_id: UserId,
    ) -> LeadDataResult<Vec<RentValuationReport>> {
        Ok(self.repo.list_valuation_reports_for_user(user_id)?)
    }

    fn update_user(&self, existing: &UserRecord, values: &LeadUser) -> LeadDataResult<UserId> {
        self.repo
            .update_user_profile(existing.user_id, values, now_epoch_ms())?;
        debug!(
            "event=lead_user_upsert module=provider status=ok action=updated user_id={}",
            existing.user_id
        );
        Ok(existing.user_id)
    }

    fn add_new_user(&self, user: &LeadUser) -> LeadDataResult<UserId> {
        let record = UserRecord::new(user, now_epoch_ms());
        let user_id = self.repo.insert_user(&record)?;
        info!(
            "event=lead_user_upsert module=provider status=ok action=created user_id={}",
            user_id
        );
        Ok(user_id)
    }

    fn resolve_address(&self, user_id: UserId, address: &Address) -> LeadDataResult<AddressId> {
        if let Some(existing) = self.repo.find_address(user_id, address)? {
            return Ok(existing.address_id);
        }

        let record = AddressRecord::new(user_id, address, now_epoch_ms());
        let address_id = self.repo.insert_address(&record)?;
        debug!(
            "event=lead_address_add module=provider status=ok address_id={} user_id={}",
            address_id, user_id
        );
        Ok(address_id)
    }
}
