//! Month-end calendar helpers
//!
//! Growth series and the aligned matrix are keyed by the last calendar day of
//! each month. Months are also addressed by a linear index
//! (`year * 12 + month0`) so gaps can be found by subtraction.

use chrono::{Datelike, NaiveDate};

/// Linear month index of the month containing `date`
pub fn month_index(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month0() as i32
}

/// Last day of the month with the given linear index.
///
/// Returns `None` only outside chrono's representable range.
pub fn month_end_from_index(index: i32) -> Option<NaiveDate> {
    let year = index.div_euclid(12);
    let month0 = index.rem_euclid(12) as u32;
    let first_of_next = if month0 == 11 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month0 + 2, 1)?
    };
    first_of_next.pred_opt()
}

/// Last day of the month containing `date`
pub fn month_end(date: NaiveDate) -> Option<NaiveDate> {
    month_end_from_index(month_index(date))
}
