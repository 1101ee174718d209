//! URL slugs for products and tags.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// The input string is empty.
    #[error("slug cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("slug must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character outside `[a-z0-9_-]`.
    #[error("slug may only contain lowercase letters, digits, hyphens and underscores")]
    InvalidCharacter,
}

/// A URL-safe identifier: lowercase ASCII letters, digits, `-` and `_`.
///
/// ```
/// use booktime_core::Slug;
///
/// assert_eq!(Slug::from_name("The Cathedral & the Bazaar").as_str(), "the-cathedral-the-bazaar");
/// assert!(Slug::parse("Not A Slug").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Maximum slug length, matching the storage column.
    pub const MAX_LENGTH: usize = 48;

    /// Parse an already-formed slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than 48 characters, or
    /// contains characters other than lowercase ASCII letters, digits, `-`
    /// and `_`.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !s
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
        {
            return Err(SlugError::InvalidCharacter);
        }
        Ok(Self(s.to_owned()))
    }

    /// Derive a slug from a display name.
    ///
    /// Runs of anything that is not an ASCII letter or digit collapse into a
    /// single hyphen; leading and trailing hyphens are dropped. A name with no
    /// usable characters produces `"item"`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let mut slug = String::with_capacity(name.len());
        let mut pending_hyphen = false;

        for c in name.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_hyphen && !slug.is_empty() {
                    slug.push('-');
                }
                pending_hyphen = false;
                slug.push(c.to_ascii_lowercase());
            } else {
                pending_hyphen = true;
            }
            if slug.len() >= Self::MAX_LENGTH {
                break;
            }
        }

        slug.truncate(Self::MAX_LENGTH);
        while slug.ends_with('-') {
            slug.pop();
        }

        if slug.is_empty() {
            return Self("item".to_owned());
        }
        Self(slug)
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Slug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Slug {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Slug {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Slug {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_collapses_separators() {
        assert_eq!(Slug::from_name("  Rust -- in Action ").as_str(), "rust-in-action");
        assert_eq!(Slug::from_name("Sci-Fi").as_str(), "sci-fi");
    }

    #[test]
    fn test_from_name_without_usable_chars() {
        assert_eq!(Slug::from_name("!!!").as_str(), "item");
    }

    #[test]
    fn test_from_name_truncates() {
        let slug = Slug::from_name(&"a".repeat(100));
        assert_eq!(slug.as_str().len(), Slug::MAX_LENGTH);
    }

    #[test]
    fn test_from_name_is_always_parseable() {
        for name in ["Hello, World", "x y z", "Dune (1965)", &"ab ".repeat(30)] {
            let slug = Slug::from_name(name);
            assert_eq!(Slug::parse(slug.as_str()).unwrap(), slug);
        }
    }

    #[test]
    fn test_parse_rejects() {
        assert_eq!(Slug::parse(""), Err(SlugError::Empty));
        assert_eq!(Slug::parse("Upper"), Err(SlugError::InvalidCharacter));
        assert_eq!(Slug::parse("with space"), Err(SlugError::InvalidCharacter));
        assert!(matches!(
            Slug::parse(&"a".repeat(49)),
            Err(SlugError::TooLong { .. })
        ));
    }
}
