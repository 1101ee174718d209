//! Quantity helpers for basket lines.
//!
//! A basket may hold more than one line for the same product after a login
//! merge. These helpers never coalesce such lines; they only read them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{BasketLineId, ProductId};

/// The quantity-bearing part of a basket line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineQuantity {
    pub line_id: BasketLineId,
    pub product_id: ProductId,
    pub quantity: i32,
}

/// A requested line quantity is not a positive integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("quantity must be at least 1, got {0}")]
pub struct QuantityError(pub i32);

/// Sum of quantities across all lines.
#[must_use]
pub fn total_quantity(lines: &[LineQuantity]) -> i64 {
    lines.iter().map(|line| i64::from(line.quantity)).sum()
}

/// A basket is empty when it has no lines at all.
#[must_use]
pub const fn is_empty(lines: &[LineQuantity]) -> bool {
    lines.is_empty()
}

/// The line that a repeated add of `product` should increment.
///
/// When several lines carry the product, the oldest one (lowest id) wins.
/// `None` means a new line with quantity 1 must be created.
#[must_use]
pub fn line_to_increment(lines: &[LineQuantity], product: ProductId) -> Option<BasketLineId> {
    lines
        .iter()
        .filter(|line| line.product_id == product)
        .map(|line| line.line_id)
        .min()
}

/// Check a quantity submitted from the basket page.
///
/// # Errors
///
/// Returns [`QuantityError`] when the quantity is below 1. There is no upper
/// bound.
pub const fn validate_quantity(quantity: i32) -> Result<i32, QuantityError> {
    if quantity < 1 {
        return Err(QuantityError(quantity));
    }
    Ok(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: i32, product: i32, quantity: i32) -> LineQuantity {
        LineQuantity {
            line_id: BasketLineId::new(id),
            product_id: ProductId::new(product),
            quantity,
        }
    }

    #[test]
    fn test_total_quantity_counts_duplicate_rows() {
        let lines = [line(1, 7, 2), line(2, 7, 1), line(3, 9, 4)];
        assert_eq!(total_quantity(&lines), 7);
        assert!(!is_empty(&lines));
    }

    #[test]
    fn test_empty_basket() {
        assert!(is_empty(&[]));
        assert_eq!(total_quantity(&[]), 0);
    }

    #[test]
    fn test_line_to_increment_picks_oldest_line() {
        let lines = [line(5, 7, 1), line(3, 7, 2), line(4, 8, 1)];
        assert_eq!(
            line_to_increment(&lines, ProductId::new(7)),
            Some(BasketLineId::new(3))
        );
        assert_eq!(line_to_increment(&lines, ProductId::new(99)), None);
    }

    #[test]
    fn test_validate_quantity_bounds() {
        assert_eq!(validate_quantity(1), Ok(1));
        assert_eq!(validate_quantity(1001), Ok(1001));
        assert_eq!(validate_quantity(i32::MAX), Ok(i32::MAX));
        assert_eq!(validate_quantity(0), Err(QuantityError(0)));
        assert!(validate_quantity(-3).is_err());
    }
}
