//! Supported shipping countries.

use serde::{Deserialize, Serialize};

/// Error returned when a country code is not in the supported set.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported country code: {0}")]
pub struct CountryCodeError(pub String);

/// Country codes accepted for addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.country_code", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum CountryCode {
    /// United Kingdom.
    Uk,
    /// United States of America.
    Us,
}

impl CountryCode {
    /// All supported codes, in display order.
    pub const ALL: [Self; 2] = [Self::Uk, Self::Us];

    /// The stored two-letter code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Uk => "uk",
            Self::Us => "us",
        }
    }

    /// Human-readable country name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Uk => "United Kingdom",
            Self::Us => "United States of America",
        }
    }
}

impl std::fmt::Display for CountryCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for CountryCode {
    type Err = CountryCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uk" => Ok(Self::Uk),
            "us" => Ok(Self::Us),
            _ => Err(CountryCodeError(s.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("UK".parse::<CountryCode>().unwrap(), CountryCode::Uk);
        assert_eq!("us".parse::<CountryCode>().unwrap(), CountryCode::Us);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("fr".parse::<CountryCode>().is_err());
    }

    #[test]
    fn test_serde_uses_lowercase_codes() {
        assert_eq!(serde_json::to_string(&CountryCode::Uk).unwrap(), "\"uk\"");
        let parsed: CountryCode = serde_json::from_str("\"us\"").unwrap();
        assert_eq!(parsed, CountryCode::Us);
    }
}
