//! BookTime Core - Shared types and domain rules.
//!
//! This crate provides the types and the pure basket/order rules used across
//! all BookTime components:
//! - `storefront` - Shop, back office and fulfillment API
//! - `cli` - Command-line tools for migrations and staff accounts
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Persistence layers execute the plans computed here, so the
//! same rules apply regardless of which store is behind them.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, slugs, statuses and roles
//! - [`basket`] - Quantity helpers for basket lines
//! - [`order`] - Basket-to-order quantity expansion
//! - [`merge`] - Login-time basket merge planning
//! - [`aggregation`] - Order status derived from order-line statuses
//! - [`access`] - Per-role field access policy for the back office

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod aggregation;
pub mod basket;
pub mod merge;
pub mod order;
pub mod types;

pub use types::*;
