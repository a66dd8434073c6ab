use chrono::{Datelike, NaiveDate};

use crate::error::{ComputeError, Result};

/// Returns the number of days in the given month.
pub fn days_in_month(year: i32, month: u32) -> Result<u32> {
    let first = first_of_month(year, month)?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let first_of_next = first_of_month(next_year, next_month)?;
    let last = first_of_next
        .pred_opt()
        .ok_or_else(|| ComputeError::Date(format!("no day before {}", first_of_next)))?;
    debug_assert_eq!(last.month(), first.month());
    Ok(last.day())
}

/// Returns the first and last day of the given month.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let start = first_of_month(year, month)?;
    let last_day = days_in_month(year, month)?;
    let end = NaiveDate::from_ymd_opt(year, month, last_day)
        .ok_or_else(|| ComputeError::Date(format!("invalid date {}-{}-{}", year, month, last_day)))?;
    Ok((start, end))
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ComputeError::Date(format!("invalid month {}-{}", year, month)))
}
