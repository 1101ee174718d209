//! Order status derived from the status of its lines.
//!
//! Runs after every order-line status write. An order is closed once none of
//! its lines is still pending (`New` or `Processing`); cancelled lines count
//! as settled. The rule only ever moves an order to `Done`: it never demotes
//! a finished order and never marks one as paid.

use crate::types::{OrderLineStatus, OrderStatus};

/// The status the order should move to, or `None` when nothing changes.
///
/// Calling this repeatedly with the same input yields the same answer, and
/// once the order is `Done` it always returns `None`.
#[must_use]
pub fn order_status_after_line_change(
    current: OrderStatus,
    lines: &[OrderLineStatus],
) -> Option<OrderStatus> {
    if current == OrderStatus::Done {
        return None;
    }

    if lines.iter().any(|status| status.is_pending()) {
        return None;
    }

    Some(OrderStatus::Done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderLineStatus::{Cancelled, New, Processing, Sent};

    #[test]
    fn test_pending_line_keeps_order_open() {
        assert_eq!(
            order_status_after_line_change(OrderStatus::Paid, &[Sent, Sent, New]),
            None
        );
        assert_eq!(
            order_status_after_line_change(OrderStatus::Paid, &[Processing]),
            None
        );
    }

    #[test]
    fn test_last_line_sent_closes_order() {
        assert_eq!(
            order_status_after_line_change(OrderStatus::Paid, &[Sent, Sent, Sent]),
            Some(OrderStatus::Done)
        );
    }

    #[test]
    fn test_cancelled_counts_as_settled() {
        assert_eq!(
            order_status_after_line_change(OrderStatus::Paid, &[Sent, Sent, Cancelled]),
            Some(OrderStatus::Done)
        );
    }

    #[test]
    fn test_done_is_never_demoted() {
        assert_eq!(
            order_status_after_line_change(OrderStatus::Done, &[Sent, New]),
            None
        );
        assert_eq!(
            order_status_after_line_change(OrderStatus::Done, &[Sent]),
            None
        );
    }

    #[test]
    fn test_never_sets_paid() {
        for current in [OrderStatus::New, OrderStatus::Paid] {
            for lines in [&[New][..], &[Sent], &[Cancelled, Processing]] {
                assert_ne!(
                    order_status_after_line_change(current, lines),
                    Some(OrderStatus::Paid)
                );
            }
        }
    }
}
