//! Addresses from the user's address book.

use common::{AddressId, UserId};
use serde::{Deserialize, Serialize};

/// A saved address owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl Address {
    pub fn belongs_to(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// Copies the postal fields into an order-owned snapshot.
    pub fn snapshot(&self) -> AddressSnapshot {
        AddressSnapshot {
            street: self.street.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            postal_code: self.postal_code.clone(),
            country: self.country.clone(),
        }
    }
}

/// Address as it was when the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressSnapshot {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}
