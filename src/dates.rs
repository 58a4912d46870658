//! Calendar helpers for the `YYYY-MM-DD` storage format.
//!
//! Every persisted or compared date goes through [`normalize_storage_date`]. The display
//! helpers never fail: an unparseable input is echoed back (or yields an empty string).

use chrono::{Datelike, Days, Local, NaiveDate, Weekday};

use crate::error::{TrackError, TrackResult};

pub const STORAGE_FORMAT: &str = "%Y-%m-%d";
pub const DISPLAY_FORMAT: &str = "%b %d, %Y";
pub const SHORT_DISPLAY_FORMAT: &str = "%d/%m/%Y";
pub const DAY_MONTH_FORMAT: &str = "%d %b";
pub const MONTH_YEAR_FORMAT: &str = "%b %Y";

/// Source of "today" for defaulting the selected date and for "is today" checks.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Local wall-clock date.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to one date (`--today`).
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

pub fn parse_storage_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), STORAGE_FORMAT).ok()
}

pub fn format_for_storage(date: NaiveDate) -> String {
    date.format(STORAGE_FORMAT).to_string()
}

/// Parse and re-emit a date so stored strings are always zero padded.
pub fn normalize_storage_date(s: &str) -> TrackResult<String> {
    parse_storage_date(s)
        .map(format_for_storage)
        .ok_or_else(|| TrackError::InvalidDate {
            input: s.to_string(),
        })
}

fn reformat(s: &str, fmt: &str) -> String {
    match parse_storage_date(s) {
        Some(d) => d.format(fmt).to_string(),
        None => s.to_string(),
    }
}

/// `2024-01-10` -> `Jan 10, 2024`.
pub fn format_for_display(s: &str) -> String {
    reformat(s, DISPLAY_FORMAT)
}

/// `2024-01-10` -> `10/01/2024`.
pub fn format_for_short_display(s: &str) -> String {
    reformat(s, SHORT_DISPLAY_FORMAT)
}

pub fn format_day_month(s: &str) -> String {
    reformat(s, DAY_MONTH_FORMAT)
}

pub fn month_year(s: &str) -> String {
    parse_storage_date(s)
        .map(|d| d.format(MONTH_YEAR_FORMAT).to_string())
        .unwrap_or_default()
}

/// Full English weekday name, or an empty string for invalid input.
pub fn weekday_name(s: &str) -> String {
    parse_storage_date(s)
        .map(|d| d.format("%A").to_string())
        .unwrap_or_default()
}

pub fn is_weekend(s: &str) -> bool {
    parse_storage_date(s)
        .map(|d| matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .unwrap_or(false)
}

/// Signed day count from `start` to `end`; 0 when either side is invalid.
pub fn days_between(start: &str, end: &str) -> i64 {
    match (parse_storage_date(start), parse_storage_date(end)) {
        (Some(a), Some(b)) => (b - a).num_days(),
        _ => 0,
    }
}

/// Every date of the month in storage format. Empty for an invalid year/month.
pub fn dates_in_month(year: i32, month: u32) -> Vec<String> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    first
        .iter_days()
        .take_while(|d| d.month() == month)
        .map(format_for_storage)
        .collect()
}

/// Inclusive run of dates from `start` to `end`. Empty when either side is invalid or
/// `end` precedes `start`.
pub fn dates_between(start: &str, end: &str) -> Vec<String> {
    let (Some(a), Some(b)) = (parse_storage_date(start), parse_storage_date(end)) else {
        return Vec::new();
    };
    a.iter_days()
        .take_while(|d| *d <= b)
        .map(format_for_storage)
        .collect()
}

pub fn today_string(clock: &dyn Clock) -> String {
    format_for_storage(clock.today())
}

/// `None` when the result falls outside the representable calendar.
pub fn days_ago(clock: &dyn Clock, days: u64) -> Option<String> {
    clock
        .today()
        .checked_sub_days(Days::new(days))
        .map(format_for_storage)
}

/// `None` when the result falls outside the representable calendar.
pub fn days_from_now(clock: &dyn Clock, days: u64) -> Option<String> {
    clock
        .today()
        .checked_add_days(Days::new(days))
        .map(format_for_storage)
}

pub fn is_today(clock: &dyn Clock, s: &str) -> bool {
    parse_storage_date(s) == Some(clock.today())
}

pub fn is_yesterday(clock: &dyn Clock, s: &str) -> bool {
    let Some(yesterday) = clock.today().pred_opt() else {
        return false;
    };
    parse_storage_date(s) == Some(yesterday)
}

/// "Today", "Yesterday", or the display form of the date.
pub fn relative_label(clock: &dyn Clock, s: &str) -> String {
    if is_today(clock, s) {
        "Today".to_string()
    } else if is_yesterday(clock, s) {
        "Yesterday".to_string()
    } else {
        format_for_display(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock() -> FixedClock {
        FixedClock(NaiveDate::from_ymd_opt(2024, 1, 10).expect("date"))
    }

    #[test]
    fn normalize_pads_and_rejects_garbage() {
        assert_eq!(normalize_storage_date("2024-1-5").expect("ok"), "2024-01-05");
        assert_eq!(normalize_storage_date(" 2024-01-10 ").expect("ok"), "2024-01-10");
        assert!(matches!(
            normalize_storage_date("2024-02-30"),
            Err(TrackError::InvalidDate { .. })
        ));
        assert!(normalize_storage_date("10/01/2024").is_err());
    }

    #[test]
    fn display_formats() {
        assert_eq!(format_for_display("2024-01-10"), "Jan 10, 2024");
        assert_eq!(format_for_short_display("2024-01-10"), "10/01/2024");
        assert_eq!(format_day_month("2024-01-10"), "10 Jan");
        assert_eq!(month_year("2024-01-10"), "Jan 2024");
        assert_eq!(format_for_display("not a date"), "not a date");
        assert_eq!(month_year("not a date"), "");
    }

    #[test]
    fn weekday_and_weekend() {
        assert_eq!(weekday_name("2024-01-10"), "Wednesday");
        assert_eq!(weekday_name("bogus"), "");
        assert!(is_weekend("2024-01-13"));
        assert!(is_weekend("2024-01-14"));
        assert!(!is_weekend("2024-01-15"));
    }

    #[test]
    fn month_listing_handles_leap_years() {
        assert_eq!(dates_in_month(2024, 2).len(), 29);
        assert_eq!(dates_in_month(2023, 2).len(), 28);
        let jan = dates_in_month(2024, 1);
        assert_eq!(jan.first().map(String::as_str), Some("2024-01-01"));
        assert_eq!(jan.last().map(String::as_str), Some("2024-01-31"));
        assert!(dates_in_month(2024, 13).is_empty());
    }

    #[test]
    fn shifts_past_the_calendar_edge_are_none() {
        let c = clock();
        assert_eq!(days_ago(&c, 200_000_000), None);
        assert_eq!(days_from_now(&c, 200_000_000), None);
        assert_eq!(days_ago(&c, u64::MAX), None);

        let edge = FixedClock(NaiveDate::MIN);
        assert_eq!(days_ago(&edge, 1), None);
        assert!(!is_yesterday(&edge, "2024-01-09"));
        assert_eq!(days_from_now(&FixedClock(NaiveDate::MAX), 1), None);
    }

    #[test]
    fn inclusive_ranges() {
        assert_eq!(
            dates_between("2023-12-30", "2024-01-02"),
            vec!["2023-12-30", "2023-12-31", "2024-01-01", "2024-01-02"]
        );
        assert_eq!(dates_between("2024-01-10", "2024-01-10"), vec!["2024-01-10"]);
        assert!(dates_between("2024-01-10", "2024-01-09").is_empty());
        assert!(dates_between("bad", "2024-01-09").is_empty());
    }

    #[test]
    fn day_differences() {
        assert_eq!(days_between("2024-01-01", "2024-01-10"), 9);
        assert_eq!(days_between("2024-01-10", "2024-01-01"), -9);
        assert_eq!(days_between("2024-01-10", "oops"), 0);
    }

    #[test]
    fn relative_to_clock() {
        let c = clock();
        assert_eq!(today_string(&c), "2024-01-10");
        assert_eq!(days_ago(&c, 10).as_deref(), Some("2023-12-31"));
        assert_eq!(days_from_now(&c, 1).as_deref(), Some("2024-01-11"));
        assert!(is_today(&c, "2024-01-10"));
        assert!(is_yesterday(&c, "2024-01-09"));
        assert_eq!(relative_label(&c, "2024-01-10"), "Today");
        assert_eq!(relative_label(&c, "2024-01-09"), "Yesterday");
        assert_eq!(relative_label(&c, "2024-01-02"), "Jan 02, 2024");
    }
}
