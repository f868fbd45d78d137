//! Report date ranges.
//!
//! A missing bound falls back to the current calendar month. A date-only
//! upper bound covers the whole day.

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::validation::parse_bound;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReportPeriod {
    #[ts(as = "String")]
    pub start: DateTime<Utc>,
    #[ts(as = "String")]
    pub end: DateTime<Utc>,
}

impl ReportPeriod {
    /// The calendar month containing `today`.
    pub fn month_of(today: NaiveDate) -> Self {
        let first = today.with_day(1).unwrap_or(today);
        let last = first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(today);

        Self::days(first, last)
    }

    /// From `first` 00:00 through the end of `last`.
    pub fn days(first: NaiveDate, last: NaiveDate) -> Self {
        Self {
            start: first.and_time(chrono::NaiveTime::MIN).and_utc(),
            end: end_of_day(last),
        }
    }

    /// Resolves optional query-string bounds against `today`.
    pub fn resolve(
        start: Option<&str>,
        end: Option<&str>,
        today: NaiveDate,
    ) -> Result<Self, ValidationError> {
        let month = Self::month_of(today);

        let start = match non_empty(start) {
            Some(raw) => parse_bound("startDate", raw, false)?,
            None => month.start,
        };
        let end = match non_empty(end) {
            Some(raw) => parse_bound("endDate", raw, true)?,
            None => month.end,
        };

        Ok(Self { start, end })
    }

    /// Date portion of the bounds, for date-typed columns like `expense_date`.
    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        (self.start.date_naive(), self.end.date_naive())
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

fn end_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_else(|| day.and_time(chrono::NaiveTime::MIN))
        .and_utc()
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_bounds() {
        let p = ReportPeriod::month_of(day(2024, 2, 17));
        assert_eq!(p.date_range(), (day(2024, 2, 1), day(2024, 2, 29)));

        let dec = ReportPeriod::month_of(day(2025, 12, 5));
        assert_eq!(dec.date_range(), (day(2025, 12, 1), day(2025, 12, 31)));
    }

    #[test]
    fn test_resolve_defaults_and_overrides() {
        let today = day(2025, 1, 15);

        let default = ReportPeriod::resolve(None, Some(""), today).unwrap();
        assert_eq!(default, ReportPeriod::month_of(today));

        let custom = ReportPeriod::resolve(Some("2025-01-10"), Some("2025-01-10"), today).unwrap();
        let late_sale = "2025-01-10T23:30:00Z".parse::<DateTime<Utc>>().unwrap();
        assert!(custom.contains(late_sale));

        assert!(ReportPeriod::resolve(Some("10-01-2025"), None, today).is_err());
    }
}
