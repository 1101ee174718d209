//! Address book entries.

use serde::Serialize;

use booktime_core::{AddressFields, AddressId, CountryCode, UserId};

/// A saved address owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Address {
    pub id: AddressId,
    #[serde(rename = "user")]
    pub user_id: UserId,
    pub name: String,
    pub address1: String,
    pub address2: String,
    pub zip_code: String,
    pub city: String,
    pub country: CountryCode,
}

impl Address {
    /// Copy the postal fields out of the address book entry.
    #[must_use]
    pub fn fields(&self) -> AddressFields {
        AddressFields {
            name: self.name.clone(),
            address1: self.address1.clone(),
            address2: self.address2.clone(),
            zip_code: self.zip_code.clone(),
            city: self.city.clone(),
            country: self.country,
        }
    }
}
