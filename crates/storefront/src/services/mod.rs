//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Accounts and password login
//! - `basket` - Session basket operations
//! - `merge` - Basket merge on login
//! - `checkout` - Basket to order conversion
//! - `fulfillment` - Order-line status changes and order aggregation
//! - `catalog` - Back-office product and tag writes
//! - `reports` - Orders per day and most bought products
//! - `email` - Outgoing notifications
//!
//! Services take the store as `&dyn Store` and hold no state of their own.

pub mod auth;
pub mod basket;
pub mod catalog;
pub mod checkout;
pub mod email;
pub mod fulfillment;
pub mod merge;
pub mod reports;
