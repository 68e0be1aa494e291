// 📅 Calendar - Month arithmetic for the budget ledger
//
// Every offset in the engine is expressed in whole months or years. Shifting
// a date clamps the day to the length of the target month (31 Jan + 1 month
// = 28/29 Feb), so no offset can produce an invalid calendar day.

use chrono::{Datelike, Months, NaiveDate};

// ============================================================================
// OFFSETS
// ============================================================================

/// Shift a date by a signed number of months, clamping the day of month.
///
/// Returns `None` only when the result falls outside chrono's date range.
pub fn add_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let magnitude = Months::new(months.unsigned_abs());
    if months >= 0 {
        date.checked_add_months(magnitude)
    } else {
        date.checked_sub_months(magnitude)
    }
}

/// Shift a date by a signed number of years (29 Feb clamps to 28 Feb).
pub fn add_years(date: NaiveDate, years: i32) -> Option<NaiveDate> {
    add_months(date, years.checked_mul(12)?)
}

/// Last calendar day of the month containing `date`.
pub fn end_of_month(date: NaiveDate) -> Option<NaiveDate> {
    date.with_day(1)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

// ============================================================================
// SAMPLING
// ============================================================================

/// Every month-end date in the closed range `[start, end]`, chronologically.
///
/// The first sample is the end of `start`'s month; the last one is the
/// latest month-end that is not after `end`. An empty vector is returned
/// when `start > end` or when `end` precedes the first month-end.
pub fn month_ends(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = end_of_month(start);

    while let Some(date) = current {
        if date > end {
            break;
        }
        dates.push(date);
        current = date.succ_opt().and_then(end_of_month);
    }

    dates
}

// ============================================================================
// TESTS
// ============================================================================
