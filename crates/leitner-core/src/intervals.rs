//! Leitner box interval table and day-granularity date arithmetic.
//!
//! | Box | Interval |
//! |-----|----------|
//! | 1   | 1 day    |
//! | 2   | 3 days   |
//! | 3   | 7 days   |
//! | 4   | 14 days  |
//! | 5   | 30 days  |
//!
//! Every function here is pure; callers pass "today" explicitly (usually from
//! a [`Clock`](crate::clock::Clock)).

use chrono::{Days, NaiveDate};

use crate::error::{CoreError, Result};

/// Lowest box. New and failed items live here.
pub const MIN_BOX: u8 = 1;

/// Highest box. Items here count as mastered.
pub const MAX_BOX: u8 = 5;

/// Review interval in days, indexed by `box - 1`.
const BOX_INTERVAL_DAYS: [u32; 5] = [1, 3, 7, 14, 30];

/// Review interval in days for a box.
///
/// # Errors
/// Returns [`CoreError::InvalidBox`] when `box_number` is outside 1..=5.
pub fn interval_for_box(box_number: u8) -> Result<u32> {
    if !(MIN_BOX..=MAX_BOX).contains(&box_number) {
        return Err(CoreError::InvalidBox(box_number));
    }
    Ok(BOX_INTERVAL_DAYS[usize::from(box_number - 1)])
}

/// Date of the next review for an item that lands in `box_number` on `from`.
///
/// # Errors
/// Returns [`CoreError::InvalidBox`] when `box_number` is outside 1..=5.
pub fn next_review_date(box_number: u8, from: NaiveDate) -> Result<NaiveDate> {
    let days = interval_for_box(box_number)?;
    Ok(from
        .checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX))
}

/// True when `date` is today or earlier. Overdue counts as due.
pub fn is_due(date: NaiveDate, today: NaiveDate) -> bool {
    date <= today
}

/// Signed distance in days from `today` to `date`; negative when overdue.
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    (date - today).num_days()
}
