use chrono::{Datelike, Duration, Months, NaiveDate};

/// Get the first day of the month containing `d`.
pub fn first_day_of_month(d: NaiveDate) -> NaiveDate {
    d.with_day(1).unwrap_or(d)
}

/// Get the last day of a given month.
pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .map(|d| d - Duration::days(1))
        .unwrap_or(NaiveDate::MAX)
}

/// Get the quarter (1-4) for a given date.
pub fn quarter_of(d: NaiveDate) -> u8 {
    ((d.month() - 1) / 3 + 1) as u8
}

/// Shift a date back by one calendar month, clamping the day to the
/// length of the target month (Mar 31 -> Feb 28/29).
pub fn one_month_before(d: NaiveDate) -> NaiveDate {
    d.checked_sub_months(Months::new(1)).unwrap_or(NaiveDate::MIN)
}

/// Number of days in `[start, end]`, counting both ends. Zero when the
/// range is inverted.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> u32 {
    let days = (end - start).num_days() + 1;
    days.max(0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_last_day_of_month() {
        assert_eq!(last_day_of_month(2025, 1), date(2025, 1, 31));
        assert_eq!(last_day_of_month(2025, 2), date(2025, 2, 28));
        assert_eq!(last_day_of_month(2024, 2), date(2024, 2, 29)); // Leap year
        assert_eq!(last_day_of_month(2025, 12), date(2025, 12, 31));
    }

    #[test]
    fn test_first_day_of_month() {
        assert_eq!(first_day_of_month(date(2025, 3, 17)), date(2025, 3, 1));
        assert_eq!(first_day_of_month(date(2025, 3, 1)), date(2025, 3, 1));
    }

    #[test]
    fn test_quarter_of() {
        assert_eq!(quarter_of(date(2025, 1, 15)), 1);
        assert_eq!(quarter_of(date(2025, 3, 31)), 1);
        assert_eq!(quarter_of(date(2025, 4, 1)), 2);
        assert_eq!(quarter_of(date(2025, 7, 1)), 3);
        assert_eq!(quarter_of(date(2025, 12, 31)), 4);
    }

    #[test]
    fn test_one_month_before_clamps() {
        assert_eq!(one_month_before(date(2025, 3, 31)), date(2025, 2, 28));
        assert_eq!(one_month_before(date(2024, 3, 31)), date(2024, 2, 29));
        assert_eq!(one_month_before(date(2025, 1, 15)), date(2024, 12, 15));
        assert_eq!(one_month_before(date(2025, 5, 1)), date(2025, 4, 1));
    }

    #[test]
    fn test_inclusive_days() {
        assert_eq!(inclusive_days(date(2025, 3, 1), date(2025, 3, 31)), 31);
        assert_eq!(inclusive_days(date(2025, 3, 1), date(2025, 3, 1)), 1);
        assert_eq!(inclusive_days(date(2025, 3, 2), date(2025, 3, 1)), 0);
    }
}
