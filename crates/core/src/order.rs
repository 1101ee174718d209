//! Basket-to-order conversion rules.

use thiserror::Error;

use crate::basket::LineQuantity;
use crate::types::{BasketStatus, ProductId, UserId};

/// Why a basket cannot be converted into an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// Orders always belong to a user; anonymous baskets must be merged first.
    #[error("cannot create an order from a basket without a user")]
    NoUser,
    /// The basket was already submitted.
    #[error("basket is not open")]
    NotOpen,
}

/// Check that a basket may be converted, returning the owning user.
///
/// # Errors
///
/// [`ConversionError::NoUser`] for anonymous baskets and
/// [`ConversionError::NotOpen`] for baskets already submitted.
pub const fn check_convertible(
    user: Option<UserId>,
    status: BasketStatus,
) -> Result<UserId, ConversionError> {
    let Some(user) = user else {
        return Err(ConversionError::NoUser);
    };
    if !matches!(status, BasketStatus::Open) {
        return Err(ConversionError::NotOpen);
    }
    Ok(user)
}

/// Expand basket lines into one product reference per physical unit.
///
/// Lines keep their order and each contributes exactly `quantity` entries.
/// Non-positive quantities contribute nothing.
#[must_use]
pub fn expand_lines(lines: &[LineQuantity]) -> Vec<ProductId> {
    lines
        .iter()
        .flat_map(|line| {
            let count = usize::try_from(line.quantity).unwrap_or(0);
            std::iter::repeat_n(line.product_id, count)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BasketLineId;

    fn line(id: i32, product: i32, quantity: i32) -> LineQuantity {
        LineQuantity {
            line_id: BasketLineId::new(id),
            product_id: ProductId::new(product),
            quantity,
        }
    }

    #[test]
    fn test_expand_lines_repeats_each_product() {
        let lines = [line(1, 10, 3), line(2, 20, 1)];
        let expanded = expand_lines(&lines);

        assert_eq!(expanded.len(), 4);
        assert_eq!(
            expanded,
            vec![
                ProductId::new(10),
                ProductId::new(10),
                ProductId::new(10),
                ProductId::new(20)
            ]
        );
    }

    #[test]
    fn test_expand_lines_keeps_duplicate_rows_separate() {
        let lines = [line(1, 10, 2), line(2, 10, 1)];
        assert_eq!(expand_lines(&lines).len(), 3);
    }

    #[test]
    fn test_expand_lines_ignores_non_positive() {
        assert!(expand_lines(&[line(1, 10, 0), line(2, 11, -2)]).is_empty());
    }

    #[test]
    fn test_check_convertible() {
        let user = UserId::new(4);
        assert_eq!(check_convertible(Some(user), BasketStatus::Open), Ok(user));
        assert_eq!(
            check_convertible(None, BasketStatus::Open),
            Err(ConversionError::NoUser)
        );
        assert_eq!(
            check_convertible(Some(user), BasketStatus::Submitted),
            Err(ConversionError::NotOpen)
        );
    }
}
