//! Status enums for baskets, orders and order lines, plus staff roles.
//!
//! All enums serialize as `snake_case` strings and map onto Postgres enums
//! in the `storefront` schema when the `postgres` feature is enabled.

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown status or role name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseStatusError {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The `snake_case` name used in storage and on the wire.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseStatusError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(ParseStatusError {
                        kind: $kind,
                        value: s.to_owned(),
                    }),
                }
            }
        }
    };
}

/// Lifecycle of a shopping basket.
///
/// A basket moves from `Open` to `Submitted` exactly once, when it is
/// converted into an order, and is never reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.basket_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum BasketStatus {
    #[default]
    Open,
    Submitted,
}

string_enum!(BasketStatus, "basket status", {
    Open => "open",
    Submitted => "submitted",
});

/// Order-level status.
///
/// `Paid` is only ever set by staff acting on payment confirmation. `Done` is
/// derived from the order lines, see [`crate::aggregation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    New,
    Paid,
    Done,
}

string_enum!(OrderStatus, "order status", {
    New => "new",
    Paid => "paid",
    Done => "done",
});

/// Fulfillment status of a single unit in an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.order_line_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderLineStatus {
    #[default]
    New,
    Processing,
    Sent,
    Cancelled,
}

impl OrderLineStatus {
    /// Whether the line still needs work before the order can be closed.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::New | Self::Processing)
    }
}

string_enum!(OrderLineStatus, "order line status", {
    New => "new",
    Processing => "processing",
    Sent => "sent",
    Cancelled => "cancelled",
});

/// Back-office role of a staff account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.staff_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    /// Full access to every back-office resource.
    Owner,
    /// Manages orders and the catalog; cannot rename catalog entries.
    CentralOffice,
    /// Ships paid orders; sees no billing data.
    Dispatcher,
}

string_enum!(StaffRole, "staff role", {
    Owner => "owner",
    CentralOffice => "central_office",
    Dispatcher => "dispatcher",
});

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_line_statuses() {
        assert!(OrderLineStatus::New.is_pending());
        assert!(OrderLineStatus::Processing.is_pending());
        assert!(!OrderLineStatus::Sent.is_pending());
        assert!(!OrderLineStatus::Cancelled.is_pending());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(BasketStatus::default(), BasketStatus::Open);
        assert_eq!(OrderStatus::default(), OrderStatus::New);
        assert_eq!(OrderLineStatus::default(), OrderLineStatus::New);
    }

    #[test]
    fn test_display_matches_serde() {
        for status in OrderLineStatus::ALL {
            let json = serde_json::to_string(status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
        }
        assert_eq!(
            serde_json::to_string(&StaffRole::CentralOffice).unwrap(),
            "\"central_office\""
        );
    }

    #[test]
    fn test_from_str() {
        assert_eq!("paid".parse::<OrderStatus>().unwrap(), OrderStatus::Paid);
        assert_eq!(
            "dispatcher".parse::<StaffRole>().unwrap(),
            StaffRole::Dispatcher
        );
        let err = "shipped".parse::<OrderLineStatus>().unwrap_err();
        assert_eq!(err.kind, "order line status");
    }
}
