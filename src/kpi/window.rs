use chrono::{Datelike, NaiveDate};

use crate::date_util::{first_day_of_month, inclusive_days, last_day_of_month, one_month_before};
use crate::period::DateRange;

/// The reporting window and the comparison window that precedes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub current_start: NaiveDate,
    pub current_end: NaiveDate,
    pub previous_start: NaiveDate,
    pub previous_end: NaiveDate,
}

impl ReportWindow {
    /// Use `range` as the current window, or the calendar month containing
    /// `today` when none is given. The previous window is the current one
    /// with both bounds moved back one calendar month.
    pub fn resolve(range: Option<DateRange>, today: NaiveDate) -> Self {
        let (current_start, current_end) = match range {
            Some(r) => (r.from, r.to),
            None => (
                first_day_of_month(today),
                last_day_of_month(today.year(), today.month()),
            ),
        };
        Self {
            current_start,
            current_end,
            previous_start: one_month_before(current_start),
            previous_end: one_month_before(current_end),
        }
    }

    pub fn current(&self) -> DateRange {
        DateRange::new(self.current_start, self.current_end)
    }

    pub fn previous(&self) -> DateRange {
        DateRange::new(self.previous_start, self.previous_end)
    }

    /// Inclusive day count of the current window.
    pub fn period_days(&self) -> u32 {
        inclusive_days(self.current_start, self.current_end)
    }
}
