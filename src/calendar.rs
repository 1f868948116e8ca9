use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A selected calendar month. `month` is zero-based (0 = January).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Returns `None` if `month > 11` or the year is outside chrono's range.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if month > 11 {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month + 1, 1)?;
        Some(Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month0(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Zero-based month index.
    pub fn month(&self) -> u32 {
        self.month
    }

    /// One-based month number, as used in date strings.
    pub fn month_number(&self) -> u32 {
        self.month + 1
    }

    pub fn first_day(&self) -> NaiveDate {
        // Range checked in the constructors.
        NaiveDate::from_ymd_opt(self.year, self.month + 1, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn days(&self) -> u32 {
        days_in_month(self.year, self.month)
    }

    /// Date of `day` (1-based) in this month, if it exists.
    pub fn date(&self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month + 1, day)
    }

    /// The month before, wrapping into the previous year. Stays put at the
    /// earliest representable month.
    pub fn previous(&self) -> Self {
        let target = if self.month == 0 {
            self.year.checked_sub(1).and_then(|y| Self::new(y, 11))
        } else {
            Self::new(self.year, self.month - 1)
        };
        target.unwrap_or(*self)
    }

    /// The month after, wrapping into the next year. Stays put at the latest
    /// representable month.
    pub fn next(&self) -> Self {
        let target = if self.month == 11 {
            self.year.checked_add(1).and_then(|y| Self::new(y, 0))
        } else {
            Self::new(self.year, self.month + 1)
        };
        target.unwrap_or(*self)
    }

    /// `"September 2025"`.
    pub fn label(&self) -> String {
        self.first_day().format("%B %Y").to_string()
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month + 1)
    }
}

/// Number of days in a month, `month` zero-based. Leap years follow the
/// Gregorian rules.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month >= 11 { (year + 1, 1) } else { (year, month + 2) };
    match (
        NaiveDate::from_ymd_opt(year, month + 1, 1),
        NaiveDate::from_ymd_opt(next_year, next_month, 1),
    ) {
        (Some(first), Some(next_first)) => (next_first - first).num_days() as u32,
        _ => 0,
    }
}
