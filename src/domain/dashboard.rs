use bigdecimal::BigDecimal;
use chrono::{DateTime, Datelike, TimeZone, Utc};

use super::errors::DomainError;

pub const DEFAULT_TREND_MONTHS: u32 = 5;
pub const MAX_TREND_MONTHS: u32 = 24;

#[derive(Debug, Clone, PartialEq)]
pub struct Overview {
    pub total_users: i64,
    pub customers: i64,
    pub admins: i64,
    pub total_orders: i64,
    /// Sum over completed orders only.
    pub revenue: BigDecimal,
    pub total_books: i64,
    pub stock: i64,
    pub sold: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusFigures {
    pub count: i64,
    pub amount: BigDecimal,
}

/// Half-open calendar month `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthWindow {
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyFigures {
    pub completed: i64,
    pub cancelled: i64,
    pub revenue: BigDecimal,
}

fn month_start(year: i32, month: u32) -> Result<DateTime<Utc>, DomainError> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| DomainError::Internal(format!("invalid month {year}-{month}")))
}

/// `(year, month)` shifted back by `back` months.
fn shift_back(year: i32, month: u32, back: u32) -> (i32, u32) {
    let index = year * 12 + (month as i32 - 1) - back as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

/// The `months` full calendar months before the one containing `now`,
/// oldest first, labelled `T%m`.
pub fn trailing_months(now: DateTime<Utc>, months: u32) -> Result<Vec<MonthWindow>, DomainError> {
    let months = months.clamp(1, MAX_TREND_MONTHS);
    (1..=months)
        .rev()
        .map(|back| {
            let (y, m) = shift_back(now.year(), now.month(), back);
            let (ey, em) = shift_back(now.year(), now.month(), back - 1);
            let start = month_start(y, m)?;
            Ok(MonthWindow {
                label: start.format("T%m").to_string(),
                start,
                end: month_start(ey, em)?,
            })
        })
        .collect()
}
