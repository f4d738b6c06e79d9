use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::ValidationError;

/// Inclusive calendar-date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateWindow { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every calendar day in the window; empty when the window is inverted.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }
}

/// Parses an ISO `YYYY-MM-DD` date. A full timestamp (`T` followed by a time,
/// optionally with an offset) is accepted too; the result is the calendar day
/// written in the string, never shifted by the offset.
pub fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    let invalid = || ValidationError::InvalidDate(value.to_string());
    let trimmed = value.trim();
    let (day_part, time_part) = match trimmed.split_once('T') {
        Some((day, time)) => (day, Some(time)),
        None => (trimmed, None),
    };

    if !is_iso_day(day_part) {
        return Err(invalid());
    }
    let date = NaiveDate::parse_from_str(day_part, "%Y-%m-%d").map_err(|_| invalid())?;

    if time_part.is_some() && !is_timestamp(trimmed) {
        return Err(invalid());
    }
    Ok(date)
}

/// Exactly `dddd-dd-dd`.
fn is_iso_day(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

fn is_timestamp(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M").is_ok()
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Monday through Sunday of the week containing `today`.
pub fn week_window(today: NaiveDate) -> DateWindow {
    let start = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    DateWindow::new(start, start + Duration::days(6))
}

/// First through last day of the month containing `today`.
pub fn month_window(today: NaiveDate) -> DateWindow {
    let start = today - Duration::days(i64::from(today.day0()));
    let length = days_in_month(today.year(), today.month());
    DateWindow::new(start, start + Duration::days(i64::from(length) - 1))
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 31,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickRange {
    Today,
    Week,
    Month,
}

impl QuickRange {
    pub fn window(&self, today: NaiveDate) -> DateWindow {
        match self {
            QuickRange::Today => DateWindow::new(today, today),
            QuickRange::Week => week_window(today),
            QuickRange::Month => month_window(today),
        }
    }
}

impl FromStr for QuickRange {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(QuickRange::Today),
            "week" => Ok(QuickRange::Week),
            "month" => Ok(QuickRange::Month),
            _ => Err(ValidationError::InvalidRange(s.to_string())),
        }
    }
}

/// Explicit bounds win over a quick range.
pub fn resolve_window(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    range: Option<QuickRange>,
    today: NaiveDate,
) -> Result<DateWindow, ValidationError> {
    match (start, end, range) {
        (Some(start), Some(end), _) => Ok(DateWindow::new(start, end)),
        (None, None, Some(range)) => Ok(range.window(today)),
        _ => Err(ValidationError::MissingRange),
    }
}
