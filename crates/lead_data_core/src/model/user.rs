//! Lead user model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a stored lead user.
pub type UserId = Uuid;

/// Caller-supplied user values used by upserts.
///
/// `email` is the natural lookup key; the other fields are overwritten on
/// every upsert that matches an existing row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

impl LeadUser {
    pub fn new(
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            phone: phone.into(),
        }
    }
}

/// Persisted user row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: UserId,
    /// Never rewritten after the row is created.
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub date_created: i64,
    /// `None` until the first in-place update.
    pub date_modified: Option<i64>,
}

impl UserRecord {
    /// Builds a fresh row with a generated id.
    pub fn new(user: &LeadUser, date_created: i64) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone: user.phone.clone(),
            date_created,
            date_modified: None,
        }
    }
}
