//! Fulfillment partner API.
//!
//! Authenticated with HTTP Basic credentials of a staff account on every
//! request. Only paid orders and their lines exist as far as this API is
//! concerned.

pub mod orders;
