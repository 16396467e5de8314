//! ISO week numbering and Monday–Friday business-week ranges.
//!
//! Week 1 of a year is the week containing January 4th; weeks run Monday to
//! Sunday. BD updates are filed against a week number and displayed with the
//! business days (Monday to Friday) of that week.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate};

use super::error::SalesTrackError;

const BUSINESS_DAYS_SPAN: i64 = 4;

/// Calendar span of a business week. `end` is always `start + 4 days`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    fn same_month(&self) -> bool {
        self.start.year() == self.end.year() && self.start.month() == self.end.month()
    }
}

/// A (year, week number) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WeekSpec {
    pub year: i32,
    pub week: u32,
}

impl WeekSpec {
    /// Validated constructor: `week` must lie in `1..=weeks_in_year(year)`.
    pub fn new(year: i32, week: u32) -> Result<Self, SalesTrackError> {
        let max = weeks_in_year(year);
        if week == 0 || week > max {
            return Err(SalesTrackError::InvalidWeek { year, week, max });
        }
        Ok(Self { year, week })
    }

    /// Builds a spec without range checks; ranges for out-of-year weeks
    /// extrapolate.
    pub fn unchecked(year: i32, week: u32) -> Self {
        Self { year, week }
    }

    /// The ISO week a calendar date belongs to. Early-January dates can
    /// belong to the previous ISO year and late-December dates to the next.
    pub fn containing(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }

    pub fn range(&self) -> DateRange {
        compute_range(self.year, self.week)
    }

    pub fn label(&self) -> String {
        format_label(self.year, self.week)
    }
}

impl fmt::Display for WeekSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Monday-to-Friday range of ISO week `week` in `year`.
///
/// Never fails: week numbers outside the year extrapolate by whole weeks
/// (week 0 is the week before week 1), and dates past chrono's supported
/// range saturate at `NaiveDate::MIN` / `NaiveDate::MAX`.
pub fn compute_range(year: i32, week: u32) -> DateRange {
    let start = week_monday(year, week);
    let end = add_days(start, BUSINESS_DAYS_SPAN);
    DateRange { start, end }
}

/// Display label, e.g. `Week 10 (2 - 6 Mar)` or `Week 1 (29 Dec - 2 Jan)`.
pub fn format_label(year: i32, week: u32) -> String {
    let range = compute_range(year, week);
    let start_day = range.start.day();
    let end_day = range.end.day();
    let end_month = range.end.format("%b");
    if range.same_month() {
        format!("Week {week} ({start_day} - {end_day} {end_month})")
    } else {
        let start_month = range.start.format("%b");
        format!("Week {week} ({start_day} {start_month} - {end_day} {end_month})")
    }
}

/// Number of ISO weeks in `year` (52 or 53).
pub fn weeks_in_year(year: i32) -> u32 {
    // December 28th always falls in the last ISO week of its year.
    NaiveDate::from_ymd_opt(year, 12, 28)
        .map(|d| d.iso_week().week())
        .unwrap_or(52)
}

/// Every week of `year`, newest first.
pub fn reporting_weeks(year: i32) -> Vec<WeekSpec> {
    (1..=weeks_in_year(year))
        .rev()
        .map(|week| WeekSpec { year, week })
        .collect()
}

fn week_monday(year: i32, week: u32) -> NaiveDate {
    let jan4 = match NaiveDate::from_ymd_opt(year, 1, 4) {
        Some(d) => d,
        None if year < 0 => return NaiveDate::MIN,
        None => return NaiveDate::MAX,
    };
    // Jan 4 is in week 1, so walking back to its Monday gives week 1's Monday.
    let monday_offset = -i64::from(jan4.weekday().num_days_from_monday());
    let week1_monday = add_days(jan4, monday_offset);
    add_days(week1_monday, (i64::from(week) - 1) * 7)
}

fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    match date.checked_add_signed(Duration::days(days)) {
        Some(d) => d,
        None if days < 0 => NaiveDate::MIN,
        None => NaiveDate::MAX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_one_2026_starts_in_december() {
        let range = compute_range(2026, 1);
        assert_eq!(range.start, date(2025, 12, 29));
        assert_eq!(range.end, date(2026, 1, 2));
    }

    #[test]
    fn week_one_when_jan4_is_monday() {
        // 2021-01-04 is a Monday.
        let range = compute_range(2021, 1);
        assert_eq!(range.start, date(2021, 1, 4));
        assert_eq!(range.end, date(2021, 1, 8));
    }

    #[test]
    fn week_ten_2026() {
        let range = compute_range(2026, 10);
        assert_eq!(range.start, date(2026, 3, 2));
        assert_eq!(range.end, date(2026, 3, 6));
    }

    #[test]
    fn label_same_month() {
        assert_eq!(format_label(2026, 10), "Week 10 (2 - 6 Mar)");
    }

    #[test]
    fn label_cross_month_and_year() {
        assert_eq!(format_label(2026, 1), "Week 1 (29 Dec - 2 Jan)");
    }

    #[test]
    fn label_cross_month_inside_year() {
        // 2026-03-30 (Mon) .. 2026-04-03 (Fri)
        assert_eq!(format_label(2026, 14), "Week 14 (30 Mar - 3 Apr)");
    }

    #[test]
    fn weeks_in_year_known_values() {
        assert_eq!(weeks_in_year(2020), 53);
        assert_eq!(weeks_in_year(2025), 52);
        assert_eq!(weeks_in_year(2026), 53);
        assert_eq!(weeks_in_year(2027), 52);
    }

    #[test]
    fn new_rejects_week_beyond_year() {
        let err = WeekSpec::new(2025, 53).unwrap_err();
        assert!(matches!(
            err,
            SalesTrackError::InvalidWeek {
                year: 2025,
                week: 53,
                max: 52
            }
        ));
        assert!(WeekSpec::new(2026, 53).is_ok());
    }

    #[test]
    fn new_rejects_week_zero() {
        assert!(WeekSpec::new(2026, 0).is_err());
    }

    #[test]
    fn unchecked_week_extrapolates_into_next_year() {
        let range = WeekSpec::unchecked(2025, 53).range();
        // Same as week 1 of 2026.
        assert_eq!(range, compute_range(2026, 1));
    }

    #[test]
    fn week_zero_is_week_before_week_one() {
        let w0 = compute_range(2026, 0);
        let w1 = compute_range(2026, 1);
        assert_eq!(w1.start - w0.start, Duration::days(7));
    }

    #[test]
    fn extreme_year_saturates_instead_of_panicking() {
        let range = compute_range(i32::MAX, 1);
        assert_eq!(range.start, NaiveDate::MAX);
        assert_eq!(range.end, NaiveDate::MAX);
    }

    #[test]
    fn containing_maps_early_january_to_previous_iso_year() {
        let spec = WeekSpec::containing(date(2027, 1, 1));
        assert_eq!(spec, WeekSpec::unchecked(2026, 53));
    }

    #[test]
    fn containing_round_trips_with_range() {
        let spec = WeekSpec::containing(date(2026, 10, 19));
        assert!(spec.range().contains(date(2026, 10, 19)));
    }

    #[test]
    fn reporting_weeks_are_descending() {
        let weeks = reporting_weeks(2026);
        assert_eq!(weeks.len(), 53);
        assert_eq!(weeks.first().unwrap().week, 53);
        assert_eq!(weeks.last().unwrap().week, 1);
    }

    #[test]
    fn display_uses_label() {
        let spec = WeekSpec::new(2026, 10).unwrap();
        assert_eq!(spec.to_string(), "Week 10 (2 - 6 Mar)");
    }

    proptest! {
        #[test]
        fn week_one_is_monday_near_jan4(year in 1600i32..2600) {
            let start = compute_range(year, 1).start;
            let jan4 = date(year, 1, 4);
            prop_assert_eq!(start.weekday(), Weekday::Mon);
            let days_before = (jan4 - start).num_days();
            prop_assert!((0..=6).contains(&days_before));
        }

        #[test]
        fn range_spans_four_days(year in 1600i32..2600, week in 1u32..=53) {
            let range = compute_range(year, week);
            prop_assert_eq!(range.end - range.start, Duration::days(4));
            prop_assert_eq!(range.start.weekday(), Weekday::Mon);
            prop_assert_eq!(range.end.weekday(), Weekday::Fri);
        }

        #[test]
        fn consecutive_weeks_are_seven_days_apart(year in 1600i32..2600, week in 0u32..60) {
            let this = compute_range(year, week).start;
            let next = compute_range(year, week + 1).start;
            prop_assert_eq!(next - this, Duration::days(7));
        }

        #[test]
        fn agrees_with_chrono_iso_weeks(year in 1600i32..2600, week in 1u32..=53) {
            if let Some(monday) = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon) {
                prop_assert_eq!(compute_range(year, week).start, monday);
                prop_assert!(WeekSpec::new(year, week).is_ok());
            } else {
                prop_assert!(WeekSpec::new(year, week).is_err());
            }
        }
    }
}
