//! Lead data persistence core.
//! Upserts lead users and addresses and records rent valuation snapshots.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, LeadDataConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::address::{Address, AddressId, AddressRecord};
pub use model::user::{LeadUser, UserId, UserRecord};
pub use model::valuation::{RentValuationData, RentValuationReport, ReportId};
pub use repo::lead_repo::{LeadRepository, RepoError, RepoResult, SqliteLeadRepository};
pub use service::lead_data_provider::{LeadDataError, LeadDataProvider, LeadDataResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
