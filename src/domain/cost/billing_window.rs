use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use std::fmt;

/// Date range a single cost sample is aggregated over.
///
/// `start` is always the first day of the month containing "today". `end` is
/// today, except on the 1st where it is shifted back to yesterday; on that day
/// `start` sits one day after `end` and the window is still a valid input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BillingWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl BillingWindow {
    pub fn for_date(today: NaiveDate) -> Self {
        let start = today - Days::new(u64::from(today.day0()));
        let end = if start == today {
            today - Days::new(1)
        } else {
            today
        };

        Self { start, end }
    }

    /// True on the 1st of the month, when `end` precedes `start`.
    pub fn is_month_boundary(&self) -> bool {
        self.end < self.start
    }
}

impl fmt::Display for BillingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}
