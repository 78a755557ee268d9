use std::sync::LazyLock;

use chrono::{Datelike, Days, Duration, NaiveDate, Weekday};
use regex::Regex;

use crate::date_util::{last_day_of_month, quarter_of};
use crate::error::{Error, Result};

static RE_QUARTER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-Q([1-4])$").unwrap());
static RE_WEEK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-W(\d{1,2})$").unwrap());
static RE_MONTH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})$").unwrap());

/// An explicit reporting range, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    /// Parse `--from`/`--to` style arguments (`YYYY-MM-DD`).
    pub fn parse(from: &str, to: &str) -> Result<Self> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map_err(|_| Error::PeriodParse(format!("invalid date: {s}")))
        };
        Ok(Self::new(parse(from)?, parse(to)?))
    }

    pub fn contains(&self, d: NaiveDate) -> bool {
        d >= self.from && d <= self.to
    }
}

/// Shorthand for a reporting range, as typed on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Period {
    Year(i32),
    Quarter(i32, u8),
    Month(i32, u8),
    Week(i32, u8),
    /// Last N days ending on the given date.
    Rolling(u32, NaiveDate),
    YearToDate(i32, NaiveDate),
    QuarterToDate(i32, u8, NaiveDate),
    MonthToDate(i32, u8, NaiveDate),
}

impl Period {
    /// Parse a period string relative to the local date.
    pub fn parse(s: &str) -> Result<Self> {
        Self::parse_at(s, chrono::Local::now().date_naive())
    }

    /// Parse a period string.
    ///
    /// Supported formats:
    /// - `2025` — year
    /// - `2025-Q1` — quarter
    /// - `2025-03` — month
    /// - `2025-W05` — ISO week
    /// - `30d` — rolling last N days
    /// - `ytd`, `qtd`, `mtd` — to date, ending on `today`
    pub fn parse_at(s: &str, today: NaiveDate) -> Result<Self> {
        let s = s.trim();

        match s.to_lowercase().as_str() {
            "ytd" => return Ok(Period::YearToDate(today.year(), today)),
            "qtd" => return Ok(Period::QuarterToDate(today.year(), quarter_of(today), today)),
            "mtd" => return Ok(Period::MonthToDate(today.year(), today.month() as u8, today)),
            _ => {}
        }

        if let Some(n) = s.strip_suffix(['d', 'D']) {
            if let Ok(n) = n.parse::<u32>() {
                if n == 0 {
                    return Err(Error::PeriodParse(format!("empty rolling period: {s}")));
                }
                return Ok(Period::Rolling(n, today));
            }
        }

        if s.len() == 4 {
            if let Ok(year) = s.parse::<i32>() {
                return Ok(Period::Year(year));
            }
        }

        if let Some(caps) = RE_QUARTER.captures(s) {
            let year: i32 = caps[1].parse().map_err(|_| Error::PeriodParse(s.to_string()))?;
            let q: u8 = caps[2].parse().map_err(|_| Error::PeriodParse(s.to_string()))?;
            return Ok(Period::Quarter(year, q));
        }

        if let Some(caps) = RE_WEEK.captures(s) {
            let year: i32 = caps[1].parse().map_err(|_| Error::PeriodParse(s.to_string()))?;
            let week: u8 = caps[2].parse().map_err(|_| Error::PeriodParse(s.to_string()))?;
            if NaiveDate::from_isoywd_opt(year, week as u32, Weekday::Mon).is_some() {
                return Ok(Period::Week(year, week));
            }
        }

        if let Some(caps) = RE_MONTH.captures(s) {
            let year: i32 = caps[1].parse().map_err(|_| Error::PeriodParse(s.to_string()))?;
            let month: u8 = caps[2].parse().map_err(|_| Error::PeriodParse(s.to_string()))?;
            if (1..=12).contains(&month) {
                return Ok(Period::Month(year, month));
            }
        }

        Err(Error::PeriodParse(format!("unrecognized period: {s}")))
    }

    /// Canonical key, e.g. `2025-Q1` or `30d`.
    pub fn to_key(&self) -> String {
        match self {
            Period::Year(y) => format!("{y}"),
            Period::Quarter(y, q) => format!("{y}-Q{q}"),
            Period::Month(y, m) => format!("{y}-{m:02}"),
            Period::Week(y, w) => format!("{y}-W{w:02}"),
            Period::Rolling(n, _) => format!("{n}d"),
            Period::YearToDate(y, _) => format!("{y}-ytd"),
            Period::QuarterToDate(y, q, _) => format!("{y}-Q{q}-td"),
            Period::MonthToDate(y, m, _) => format!("{y}-{m:02}-td"),
        }
    }

    /// The inclusive date range this period covers.
    pub fn date_range(&self) -> Result<DateRange> {
        let ymd = |y: i32, m: u32, d: u32| {
            NaiveDate::from_ymd_opt(y, m, d)
                .ok_or_else(|| Error::PeriodParse(format!("date out of range: {y}-{m:02}-{d:02}")))
        };
        let (from, to) = match self {
            Period::Year(y) => (ymd(*y, 1, 1)?, ymd(*y, 12, 31)?),
            Period::Quarter(y, q) => {
                let start_month = (*q as u32 - 1) * 3 + 1;
                (ymd(*y, start_month, 1)?, last_day_of_month(*y, *q as u32 * 3))
            }
            Period::Month(y, m) => (ymd(*y, *m as u32, 1)?, last_day_of_month(*y, *m as u32)),
            Period::Week(y, w) => {
                let start = NaiveDate::from_isoywd_opt(*y, *w as u32, Weekday::Mon)
                    .ok_or_else(|| Error::PeriodParse(self.to_key()))?;
                (start, start + Duration::days(6))
            }
            Period::Rolling(n, as_of) => {
                let back = Days::new((*n as u64).saturating_sub(1));
                let from = as_of.checked_sub_days(back).ok_or_else(|| {
                    Error::PeriodParse(format!("rolling period out of range: {}", self.to_key()))
                })?;
                (from, *as_of)
            }
            Period::YearToDate(y, as_of) => (ymd(*y, 1, 1)?, *as_of),
            Period::QuarterToDate(y, q, as_of) => (ymd(*y, (*q as u32 - 1) * 3 + 1, 1)?, *as_of),
            Period::MonthToDate(y, m, as_of) => (ymd(*y, *m as u32, 1)?, *as_of),
        };
        Ok(DateRange::new(from, to))
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_fixed_periods() {
        let today = date(2025, 6, 10);
        assert_eq!(Period::parse_at("2025", today).unwrap(), Period::Year(2025));
        assert_eq!(Period::parse_at("2025-Q4", today).unwrap(), Period::Quarter(2025, 4));
        assert_eq!(Period::parse_at("2025-03", today).unwrap(), Period::Month(2025, 3));
        assert_eq!(Period::parse_at("2025-W05", today).unwrap(), Period::Week(2025, 5));
        assert_eq!(Period::parse_at("2025-W1", today).unwrap(), Period::Week(2025, 1));
    }

    #[test]
    fn test_parse_relative_periods() {
        let today = date(2025, 6, 10);
        assert_eq!(Period::parse_at("30d", today).unwrap(), Period::Rolling(30, today));
        assert_eq!(Period::parse_at("MTD", today).unwrap(), Period::MonthToDate(2025, 6, today));
        assert_eq!(Period::parse_at("qtd", today).unwrap(), Period::QuarterToDate(2025, 2, today));
        assert_eq!(Period::parse_at("ytd", today).unwrap(), Period::YearToDate(2025, today));
    }

    #[test]
    fn test_parse_invalid() {
        let today = date(2025, 6, 10);
        assert!(Period::parse_at("garbage", today).is_err());
        assert!(Period::parse_at("2025-Q5", today).is_err());
        assert!(Period::parse_at("2025-13", today).is_err());
        assert!(Period::parse_at("0d", today).is_err());
    }

    #[test]
    fn test_date_ranges() {
        let r = Period::Month(2024, 2).date_range().unwrap();
        assert_eq!((r.from, r.to), (date(2024, 2, 1), date(2024, 2, 29)));

        let r = Period::Quarter(2025, 2).date_range().unwrap();
        assert_eq!((r.from, r.to), (date(2025, 4, 1), date(2025, 6, 30)));

        let r = Period::Rolling(7, date(2025, 6, 10)).date_range().unwrap();
        assert_eq!((r.from, r.to), (date(2025, 6, 4), date(2025, 6, 10)));

        let r = Period::Week(2025, 1).date_range().unwrap();
        assert_eq!(r.from.weekday(), Weekday::Mon);
        assert_eq!((r.to - r.from).num_days(), 6);
    }

    #[test]
    fn test_rolling_past_calendar_start_is_error() {
        let today = date(2025, 6, 10);
        let p = Period::parse_at("100000000d", today).unwrap();
        assert!(matches!(p.date_range(), Err(Error::PeriodParse(_))));

        let r = Period::parse_at("1d", today).unwrap().date_range().unwrap();
        assert_eq!((r.from, r.to), (today, today));
    }

    #[test]
    fn test_to_key() {
        assert_eq!(Period::Month(2025, 1).to_key(), "2025-01");
        assert_eq!(Period::Quarter(2025, 3).to_key(), "2025-Q3");
        assert_eq!(Period::Rolling(30, date(2025, 1, 1)).to_key(), "30d");
    }

    #[test]
    fn test_date_range_parse_and_contains() {
        let r = DateRange::parse("2025-03-01", "2025-03-31").unwrap();
        assert!(r.contains(date(2025, 3, 1)));
        assert!(r.contains(date(2025, 3, 31)));
        assert!(!r.contains(date(2025, 4, 1)));
        assert!(DateRange::parse("2025-03-01", "March").is_err());
    }
}
