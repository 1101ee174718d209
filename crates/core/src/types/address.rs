//! Postal address value shared by the address book and order snapshots.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::CountryCode;

/// A field of [`AddressFields`] failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// A required field is blank.
    #[error("{0} is required")]
    Required(&'static str),
    /// A field exceeds its column length.
    #[error("{field} must be at most {max} characters")]
    TooLong {
        /// Field name.
        field: &'static str,
        /// Maximum allowed length.
        max: usize,
    },
}

/// The postal fields of an address.
///
/// Orders copy these values into their `billing_*` and `shipping_*` columns,
/// so later edits to the address book never reach a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressFields {
    pub name: String,
    pub address1: String,
    #[serde(default)]
    pub address2: String,
    pub zip_code: String,
    pub city: String,
    pub country: CountryCode,
}

impl AddressFields {
    /// Validate lengths and required fields, returning the trimmed value.
    ///
    /// # Errors
    ///
    /// Returns the first failing field.
    pub fn validated(self) -> Result<Self, AddressError> {
        let name = required("name", &self.name, 60)?;
        let address1 = required("address1", &self.address1, 60)?;
        let address2 = optional("address2", &self.address2, 60)?;
        let zip_code = required("zip_code", &self.zip_code, 12)?;
        let city = required("city", &self.city, 60)?;

        Ok(Self {
            name,
            address1,
            address2,
            zip_code,
            city,
            country: self.country,
        })
    }
}

fn required(field: &'static str, value: &str, max: usize) -> Result<String, AddressError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AddressError::Required(field));
    }
    optional(field, value, max)
}

fn optional(field: &'static str, value: &str, max: usize) -> Result<String, AddressError> {
    let value = value.trim();
    if value.chars().count() > max {
        return Err(AddressError::TooLong { field, max });
    }
    Ok(value.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> AddressFields {
        AddressFields {
            name: " Jo Reader ".into(),
            address1: "1 Library Lane".into(),
            address2: String::new(),
            zip_code: "AB1 2CD".into(),
            city: "London".into(),
            country: CountryCode::Uk,
        }
    }

    #[test]
    fn test_validated_trims() {
        let fields = sample().validated().unwrap();
        assert_eq!(fields.name, "Jo Reader");
    }

    #[test]
    fn test_validated_requires_city() {
        let mut fields = sample();
        fields.city = "  ".into();
        assert_eq!(fields.validated(), Err(AddressError::Required("city")));
    }

    #[test]
    fn test_validated_zip_length() {
        let mut fields = sample();
        fields.zip_code = "1".repeat(13);
        assert!(matches!(
            fields.validated(),
            Err(AddressError::TooLong { field: "zip_code", .. })
        ));
    }
}
