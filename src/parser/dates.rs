use std::fmt;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use regex::Regex;
use serde::{Serialize, Serializer};
use thiserror::Error;

static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2})\s*([AaPp][Mm])?$").unwrap());

const MONTHS: &[&str] = &[
    "january", "february", "march", "april", "may", "june",
    "july", "august", "september", "october", "november", "december",
];

const WEEKDAYS: &[&str] = &[
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];

/// Separators accepted between the two halves of a date range.
const RANGE_SEPARATORS: [char; 2] = ['—', '–'];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateParseError {
    #[error("empty date text")]
    Empty,
    #[error("unrecognized month name {0:?}")]
    UnknownMonth(String),
    #[error("invalid day {0:?}")]
    InvalidDay(String),
    #[error("invalid time of day {0:?}")]
    InvalidTime(String),
    #[error("not a calendar date: {year}-{month:02}-{day:02} {hour:02}:{minute:02}")]
    InvalidDate {
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
    },
}

/// A validated wall-clock minute in the configured fixed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarTimestamp(NaiveDateTime);

impl CalendarTimestamp {
    pub fn new(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
    ) -> Result<Self, DateParseError> {
        let invalid = || DateParseError::InvalidDate {
            year,
            month,
            day,
            hour,
            minute,
        };
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;
        let time = NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)?;
        Ok(Self(date.and_time(time)))
    }

    pub fn at_midnight(date: NaiveDate) -> Self {
        Self(date.and_time(NaiveTime::MIN))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    pub fn naive(&self) -> NaiveDateTime {
        self.0
    }

    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }

    pub fn plus_minutes(self, minutes: i64) -> Self {
        Self(self.0 + TimeDelta::minutes(minutes))
    }

    pub fn minus_minutes(self, minutes: i64) -> Self {
        Self(self.0 - TimeDelta::minutes(minutes))
    }

    /// `[year, month, day, hour, minute]`, the array form calendar tools consume.
    pub fn components(&self) -> [i32; 5] {
        [
            self.year(),
            self.month() as i32,
            self.day() as i32,
            self.hour() as i32,
            self.minute() as i32,
        ]
    }
}

impl fmt::Display for CalendarTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M"))
    }
}

impl Serialize for CalendarTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.components().serialize(serializer)
    }
}

/// Turns the date fragments found on the results pages into absolute timestamps.
///
/// Text without a year is placed in the year of the reference date, and the
/// relative labels ("Today", "Yesterday", "Tomorrow") are resolved against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateResolver {
    today: NaiveDate,
}

impl DateResolver {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn year(&self) -> i32 {
        self.today.year()
    }

    /// Resolve `"<Month> <Day> — <Month> <Day>"` into midnight start/end stamps.
    /// A missing end segment (or a literal "TBD") makes a single-day range.
    ///
    /// A year written on one side applies to both; the other side moves a year
    /// when that is the only way to keep the range in order.
    pub fn resolve_range(
        &self,
        text: &str,
    ) -> Result<(CalendarTimestamp, CalendarTimestamp), DateParseError> {
        let mut parts = text.split(RANGE_SEPARATORS).map(str::trim);
        let start_text = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or(DateParseError::Empty)?;
        let start = parse_month_day(start_text)?;
        let end = parts
            .next()
            .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("tbd"))
            .map(parse_month_day)
            .transpose()?;

        let (start, end) = match end {
            None => {
                let day = start.on(start.year.unwrap_or_else(|| self.year()))?;
                (day, day)
            }
            Some(end) => {
                let backwards = end.key() < start.key();
                match (start.year, end.year) {
                    (Some(sy), Some(ey)) => (start.on(sy)?, end.on(ey)?),
                    (Some(y), None) => (start.on(y)?, end.on(if backwards { y + 1 } else { y })?),
                    (None, Some(y)) => (start.on(if backwards { y - 1 } else { y })?, end.on(y)?),
                    (None, None) => {
                        let y = self.year();
                        // Dec → Jan ranges end in the following year
                        (start.on(y)?, end.on(if backwards { y + 1 } else { y })?)
                    }
                }
            }
        };

        Ok((
            CalendarTimestamp::at_midnight(start),
            CalendarTimestamp::at_midnight(end),
        ))
    }

    /// Resolve a day heading such as `"Jan 15"`, `"Thu, January 16, 2025"` or `"Today"`.
    pub fn resolve_day(&self, label: &str) -> Result<NaiveDate, DateParseError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(DateParseError::Empty);
        }
        let out_of_range = || invalid_date(self.today, 0, 0);
        match label.to_lowercase().as_str() {
            "today" => Ok(self.today),
            "yesterday" => self.today.pred_opt().ok_or_else(out_of_range),
            "tomorrow" => self.today.succ_opt().ok_or_else(out_of_range),
            _ => {
                let day = parse_month_day(label)?;
                day.on(day.year.unwrap_or_else(|| self.year()))
            }
        }
    }

    /// `"14:00"`, `"2:00 PM"`; blank or "TBD" means the time is not known yet.
    pub fn resolve_time(&self, text: &str) -> Result<Option<NaiveTime>, DateParseError> {
        let text = text.trim();
        if text.is_empty() || text == "-" || text.eq_ignore_ascii_case("tbd") {
            return Ok(None);
        }

        let invalid = || DateParseError::InvalidTime(text.to_string());
        let caps = TIME_RE.captures(text).ok_or_else(invalid)?;
        let mut hour: u32 = caps[1].parse().map_err(|_| invalid())?;
        let minute: u32 = caps[2].parse().map_err(|_| invalid())?;

        if let Some(meridiem) = caps.get(3) {
            if !(1..=12).contains(&hour) {
                return Err(invalid());
            }
            let pm = meridiem.as_str().eq_ignore_ascii_case("pm");
            hour = match (hour, pm) {
                (12, false) => 0,
                (12, true) => 12,
                (h, true) => h + 12,
                (h, false) => h,
            };
        }

        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(Some)
            .ok_or_else(invalid)
    }

    /// Combine a day heading with a time of day; unknown times fall back to midnight.
    pub fn resolve_datetime(
        &self,
        day_label: &str,
        time_text: &str,
    ) -> Result<CalendarTimestamp, DateParseError> {
        let date = self.resolve_day(day_label)?;
        let time = self.resolve_time(time_text)?.unwrap_or(NaiveTime::MIN);
        Ok(CalendarTimestamp(date.and_time(time)))
    }
}

/// A month and day as written, with the year only if the text carries one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MonthDay {
    month: u32,
    day: u32,
    year: Option<i32>,
}

impl MonthDay {
    fn key(&self) -> (u32, u32) {
        (self.month, self.day)
    }

    fn on(&self, year: i32) -> Result<NaiveDate, DateParseError> {
        NaiveDate::from_ymd_opt(year, self.month, self.day).ok_or(DateParseError::InvalidDate {
            year,
            month: self.month,
            day: self.day,
            hour: 0,
            minute: 0,
        })
    }
}

/// Parse `[Weekday,] Month Day[,] [Year]`.
fn parse_month_day(text: &str) -> Result<MonthDay, DateParseError> {
    let mut tokens = text
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .peekable();

    if tokens.peek().is_some_and(|t| is_weekday(t)) {
        tokens.next();
    }

    let month_token = tokens.next().ok_or(DateParseError::Empty)?;
    let month = month_number(month_token)
        .ok_or_else(|| DateParseError::UnknownMonth(month_token.to_string()))?;

    let day_token = tokens
        .next()
        .ok_or_else(|| DateParseError::InvalidDay(text.to_string()))?;
    let day = parse_day(day_token)?;

    let year = tokens
        .next()
        .filter(|t| t.len() == 4)
        .and_then(|t| t.parse::<i32>().ok());

    Ok(MonthDay { month, day, year })
}

fn month_number(token: &str) -> Option<u32> {
    let lower = token.trim_end_matches('.').to_lowercase();
    if lower.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| m.starts_with(&lower))
        .map(|i| i as u32 + 1)
}

fn is_weekday(token: &str) -> bool {
    let lower = token.trim_end_matches('.').to_lowercase();
    lower.len() >= 3 && WEEKDAYS.iter().any(|d| d.starts_with(&lower))
}

fn parse_day(token: &str) -> Result<u32, DateParseError> {
    let digits = ["st", "nd", "rd", "th"]
        .iter()
        .find_map(|suffix| token.strip_suffix(suffix))
        .unwrap_or(token);
    digits
        .parse::<u32>()
        .ok()
        .filter(|d| (1..=31).contains(d))
        .ok_or_else(|| DateParseError::InvalidDay(token.to_string()))
}

fn invalid_date(date: NaiveDate, hour: u32, minute: u32) -> DateParseError {
    DateParseError::InvalidDate {
        year: date.year(),
        month: date.month(),
        day: date.day(),
        hour,
        minute,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(year: i32) -> DateResolver {
        DateResolver::new(NaiveDate::from_ymd_opt(year, 6, 1).unwrap())
    }

    fn ts(y: i32, m: u32, d: u32, h: u32, mi: u32) -> CalendarTimestamp {
        CalendarTimestamp::new(y, m, d, h, mi).unwrap()
    }

    #[test]
    fn range_with_em_dash() {
        let (start, end) = resolver(2024).resolve_range("Jan 10 — Jan 28").unwrap();
        assert_eq!(start, ts(2024, 1, 10, 0, 0));
        assert_eq!(end, ts(2024, 1, 28, 0, 0));
    }

    #[test]
    fn range_without_spaces() {
        let (start, end) = resolver(2024).resolve_range("Jun 14—Jul 7").unwrap();
        assert_eq!(start.components(), [2024, 6, 14, 0, 0]);
        assert_eq!(end.components(), [2024, 7, 7, 0, 0]);
    }

    #[test]
    fn ranges_stay_ordered_within_the_year() {
        let r = resolver(2025);
        for text in ["Feb 1 — Feb 1", "Mar 3 — Nov 30", "Jan 1 — Dec 31", "Aug 9 — Sep 2"] {
            let (start, end) = r.resolve_range(text).unwrap();
            assert!(start <= end, "{text}");
            assert_eq!(start.year(), 2025);
            assert_eq!(end.year(), 2025);
        }
    }

    #[test]
    fn missing_end_is_single_day() {
        let r = resolver(2024);
        for text in ["Mar 14", "Mar 14 —", "Mar 14 — TBD"] {
            let (start, end) = r.resolve_range(text).unwrap();
            assert_eq!(start, end, "{text}");
            assert_eq!(start, ts(2024, 3, 14, 0, 0));
        }
    }

    #[test]
    fn december_to_january_rolls_over() {
        let (start, end) = resolver(2024).resolve_range("Dec 28 — Jan 5").unwrap();
        assert_eq!(start, ts(2024, 12, 28, 0, 0));
        assert_eq!(end, ts(2025, 1, 5, 0, 0));
    }

    #[test]
    fn explicit_year_wins() {
        let (start, end) = resolver(2024)
            .resolve_range("Jan 10, 2026 — Feb 2, 2026")
            .unwrap();
        assert_eq!(start.year(), 2026);
        assert_eq!(end, ts(2026, 2, 2, 0, 0));
    }

    #[test]
    fn year_on_one_side_applies_to_both() {
        let (start, end) = resolver(2024).resolve_range("Jan 10 — Feb 2, 2026").unwrap();
        assert_eq!(start, ts(2026, 1, 10, 0, 0));
        assert_eq!(end, ts(2026, 2, 2, 0, 0));

        let (start, end) = resolver(2024).resolve_range("Mar 3, 2026 — Mar 9").unwrap();
        assert_eq!(start, ts(2026, 3, 3, 0, 0));
        assert_eq!(end, ts(2026, 3, 9, 0, 0));
    }

    #[test]
    fn one_sided_year_still_rolls_over() {
        let r = resolver(2026);

        let (start, end) = r.resolve_range("Dec 28, 2024 — Jan 5").unwrap();
        assert_eq!(start, ts(2024, 12, 28, 0, 0));
        assert_eq!(end, ts(2025, 1, 5, 0, 0));

        let (start, end) = r.resolve_range("Dec 28 — Jan 5, 2025").unwrap();
        assert_eq!(start, ts(2024, 12, 28, 0, 0));
        assert_eq!(end, ts(2025, 1, 5, 0, 0));

        for text in ["Dec 28, 2024 — Jan 5", "Dec 28 — Jan 5, 2025", "Jan 10 — Feb 2, 2026"] {
            let (start, end) = r.resolve_range(text).unwrap();
            assert!(end.naive() - start.naive() < chrono::TimeDelta::days(60), "{text}");
        }
    }

    #[test]
    fn single_day_keeps_its_year() {
        let (start, end) = resolver(2024).resolve_range("Sep 1, 2027").unwrap();
        assert_eq!(start, ts(2027, 9, 1, 0, 0));
        assert_eq!(start, end);
    }

    #[test]
    fn full_month_names_and_case() {
        let (start, end) = resolver(2024).resolve_range("JANUARY 3rd — february 9th").unwrap();
        assert_eq!(start, ts(2024, 1, 3, 0, 0));
        assert_eq!(end, ts(2024, 2, 9, 0, 0));
    }

    #[test]
    fn unknown_month_is_error() {
        let err = resolver(2024).resolve_range("Smarch 3 — Jan 4").unwrap_err();
        assert_eq!(err, DateParseError::UnknownMonth("Smarch".into()));
        assert_eq!(
            resolver(2024).resolve_range("TBD").unwrap_err(),
            DateParseError::UnknownMonth("TBD".into())
        );
    }

    #[test]
    fn impossible_date_is_error() {
        let err = resolver(2023).resolve_range("Feb 29").unwrap_err();
        assert!(matches!(err, DateParseError::InvalidDate { month: 2, day: 29, .. }));
        assert!(matches!(
            resolver(2024).resolve_range("Jan 40").unwrap_err(),
            DateParseError::InvalidDay(_)
        ));
        assert_eq!(resolver(2024).resolve_range("  ").unwrap_err(), DateParseError::Empty);
    }

    #[test]
    fn day_labels() {
        let r = resolver(2024);
        assert_eq!(r.resolve_day("Jan 15").unwrap(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(
            r.resolve_day("Thu, January 16, 2025").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 16).unwrap()
        );
        assert_eq!(r.resolve_day("today").unwrap(), NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(r.resolve_day("Yesterday").unwrap(), NaiveDate::from_ymd_opt(2024, 5, 31).unwrap());
        assert_eq!(r.resolve_day("Tomorrow").unwrap(), NaiveDate::from_ymd_opt(2024, 6, 2).unwrap());
        assert_eq!(r.resolve_day("").unwrap_err(), DateParseError::Empty);
    }

    #[test]
    fn times_of_day() {
        let r = resolver(2024);
        let hm = |h, m| Some(NaiveTime::from_hms_opt(h, m, 0).unwrap());
        assert_eq!(r.resolve_time("14:00").unwrap(), hm(14, 0));
        assert_eq!(r.resolve_time("2:05 PM").unwrap(), hm(14, 5));
        assert_eq!(r.resolve_time("12:30 am").unwrap(), hm(0, 30));
        assert_eq!(r.resolve_time("12:00pm").unwrap(), hm(12, 0));
        assert_eq!(r.resolve_time("TBD").unwrap(), None);
        assert_eq!(r.resolve_time("").unwrap(), None);
        assert!(r.resolve_time("25:00").is_err());
        assert!(r.resolve_time("13:00 PM").is_err());
        assert!(r.resolve_time("soon").is_err());
    }

    #[test]
    fn datetime_defaults_to_midnight() {
        let r = resolver(2024);
        assert_eq!(r.resolve_datetime("Jan 15", "14:00").unwrap(), ts(2024, 1, 15, 14, 0));
        assert_eq!(r.resolve_datetime("Jan 15", "TBD").unwrap(), ts(2024, 1, 15, 0, 0));
        assert!(r.resolve_datetime("", "14:00").is_err());
    }

    #[test]
    fn timestamp_validation() {
        assert!(CalendarTimestamp::new(2024, 13, 1, 0, 0).is_err());
        assert!(CalendarTimestamp::new(2024, 4, 31, 0, 0).is_err());
        assert!(CalendarTimestamp::new(2024, 4, 30, 24, 0).is_err());
        assert!(CalendarTimestamp::new(2024, 4, 30, 23, 60).is_err());
        assert!(CalendarTimestamp::new(2024, 2, 29, 23, 59).is_ok());
    }

    #[test]
    fn timestamp_arithmetic_and_format() {
        let start = ts(2024, 12, 31, 23, 0);
        assert_eq!(start.plus_minutes(120), ts(2025, 1, 1, 1, 0));
        assert_eq!(start.minus_minutes(30), ts(2024, 12, 31, 22, 30));
        assert_eq!(start.to_string(), "2024-12-31 23:00");
        assert_eq!(serde_json::to_string(&start).unwrap(), "[2024,12,31,23,0]");
    }
}
