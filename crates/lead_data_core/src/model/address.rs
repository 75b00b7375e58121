//! Address model scoped to one owning user.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a stored address.
pub type AddressId = Uuid;

/// Postal address value object.
///
/// `county` is carried along but does not take part in address matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub county: String,
    pub state: String,
    pub zip: String,
}

/// Persisted address row. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    pub address_id: AddressId,
    pub user_id: UserId,
    pub address: Address,
    pub date_created: i64,
}

impl AddressRecord {
    pub fn new(user_id: UserId, address: &Address, date_created: i64) -> Self {
        Self {
            address_id: Uuid::new_v4(),
            user_id,
            address: address.clone(),
            date_created,
        }
    }
}
