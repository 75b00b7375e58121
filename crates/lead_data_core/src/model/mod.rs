//! Lead domain model: users, their addresses, and rent valuation snapshots.
//!
//! # Invariants
//! - Every record is identified by a generated UUID v4 that is never reused.
//! - Timestamps are Unix epoch milliseconds.
//! - Valuation reports are append-only snapshots.

pub mod address;
pub mod user;
pub mod valuation;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in Unix epoch milliseconds.
///
/// Clocks set before 1970 collapse to `0`.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
