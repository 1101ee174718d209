//! Back-office report rows.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Number of orders placed on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct DailyOrderCount {
    pub day: NaiveDate,
    pub orders: i64,
}

/// Units ordered of one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ProductSales {
    pub product_name: String,
    pub quantity: i64,
}

/// Trailing period a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "u32")]
pub enum ReportPeriod {
    #[default]
    Days30,
    Days60,
    Days90,
}

impl ReportPeriod {
    /// Length of the period in days.
    #[must_use]
    pub const fn days(self) -> i64 {
        match self {
            Self::Days30 => 30,
            Self::Days60 => 60,
            Self::Days90 => 90,
        }
    }

    /// Start of the period, counting back from `now`.
    #[must_use]
    pub fn since(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.days())
    }
}

impl TryFrom<u32> for ReportPeriod {
    type Error = String;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        match days {
            30 => Ok(Self::Days30),
            60 => Ok(Self::Days60),
            90 => Ok(Self::Days90),
            other => Err(format!("period must be 30, 60 or 90 days, got {other}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_period_from_days() {
        assert_eq!(ReportPeriod::try_from(60).unwrap(), ReportPeriod::Days60);
        assert!(ReportPeriod::try_from(7).is_err());
    }

    #[test]
    fn test_since_counts_back() {
        let now = Utc::now();
        assert_eq!(now - ReportPeriod::Days90.since(now), Duration::days(90));
    }
}
