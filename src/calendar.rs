use chrono::{Datelike, NaiveDate};

/// whole days from `start` to `end`, negative when `end` precedes `start`
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// days a due date is overdue at an evaluation date, clamped at zero
pub fn days_overdue(next_due_date: NaiveDate, evaluation_date: NaiveDate) -> u32 {
    days_between(next_due_date, evaluation_date).max(0) as u32
}

/// add calendar months, clamping to the last day of the target month
/// (jan 31 + 1 month = feb 28/29)
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    let total = date.year() * 12 + date.month0() as i32 + months as i32;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));
    // year/month/day are valid by construction
    NaiveDate::from_ymd_opt(year, month, day).expect("clamped date is valid")
}

/// days in a calendar month
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 30,
    }
}

/// check if year is a leap year
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}
