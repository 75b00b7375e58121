//! Rent valuation snapshot model.
//!
//! # Invariants
//! - A report links exactly one user and one address owned by that user.
//! - Only `home_owner_specified_rent` may change after a report is stored.

use crate::model::address::AddressId;
use crate::model::user::UserId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a stored rent valuation report.
pub type ReportId = Uuid;

/// Rent figures of one valuation event.
///
/// Money values serialize as decimal strings to stay exact on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentValuationData {
    pub average_monthly_rent: Decimal,
    pub home_owner_specified_rent: Decimal,
    pub is_rent_estimate_available: bool,
    pub valuation_rent_high: Decimal,
    pub valuation_rent_low: Decimal,
    pub value_changed_in_30_days: Decimal,
}

/// Persisted valuation snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentValuationReport {
    pub report_id: ReportId,
    pub user_id: UserId,
    pub address_id: AddressId,
    pub data: RentValuationData,
    pub date_created: i64,
}

impl RentValuationReport {
    /// Builds a new snapshot from caller figures.
    ///
    /// The stored `home_owner_specified_rent` starts out equal to the
    /// estimated `average_monthly_rent`; owners override it later through the
    /// specified-rent correction. The caller's own specified value is ignored.
    pub fn snapshot(
        user_id: UserId,
        address_id: AddressId,
        figures: &RentValuationData,
        date_created: i64,
    ) -> Self {
        Self {
            report_id: Uuid::new_v4(),
            user_id,
            address_id,
            data: RentValuationData {
                home_owner_specified_rent: figures.average_monthly_rent,
                ..figures.clone()
            },
            date_created,
        }
    }
}
