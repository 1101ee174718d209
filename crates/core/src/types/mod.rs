//! Core types for BookTime.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod country;
pub mod email;
pub mod id;
pub mod price;
pub mod slug;
pub mod status;

pub use address::{AddressError, AddressFields};
pub use country::{CountryCode, CountryCodeError};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use slug::{Slug, SlugError};
pub use status::*;
