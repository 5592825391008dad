//! ISO week keys.
//!
//! A [`WeekKey`] names one Monday-to-Sunday week using the ISO 8601 week-numbering
//! rule: week 1 of a week-year is the week holding that year's first Thursday, so
//! the days of a week can belong to a different calendar year than its key.
//! Keys order by the instant their week starts, never by their textual pair.

use crate::error::{NewcomersError, Result};
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WeekKey {
    monday: NaiveDate,
}

impl WeekKey {
    /// Build a key from its week number and ISO week-year.
    pub fn new(week: u32, year: i32) -> Result<Self> {
        let weeks = weeks_in_year(year)?;
        if week == 0 || week > weeks {
            return Err(NewcomersError::InvalidWeekKey(format!(
                "week {week} out of range 1..={weeks} for {year}"
            )));
        }
        let monday = first_monday(year)?
            .checked_add_days(Days::new(u64::from(week - 1) * 7))
            .ok_or_else(|| NewcomersError::InvalidWeekKey(format!("{week:02} {year}")))?;
        Ok(Self { monday })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        let offset = u64::from(date.weekday().num_days_from_monday());
        Self {
            monday: date - Days::new(offset),
        }
    }

    pub fn week(&self) -> u32 {
        self.thursday().ordinal0() / 7 + 1
    }

    pub fn year(&self) -> i32 {
        self.thursday().year()
    }

    pub fn monday(&self) -> NaiveDate {
        self.monday
    }

    /// Instant the week begins (Monday 00:00 UTC).
    pub fn start(&self) -> DateTime<Utc> {
        self.monday.and_time(NaiveTime::MIN).and_utc()
    }

    pub fn successor(&self) -> Self {
        Self {
            monday: self.monday + Days::new(7),
        }
    }

    // The Thursday decides which week-year a week belongs to.
    fn thursday(&self) -> NaiveDate {
        self.monday + Days::new(3)
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02} {:04}", self.week(), self.year())
    }
}

impl FromStr for WeekKey {
    type Err = NewcomersError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || NewcomersError::InvalidWeekKey(s.to_string());
        // Only the canonical "WW GGGG" form is accepted.
        let Some((week, year)) = s.split_once(' ') else {
            return Err(invalid());
        };
        let digits = |part: &str, len: usize| part.len() == len && part.bytes().all(|b| b.is_ascii_digit());
        if !digits(week, 2) || !digits(year, 4) {
            return Err(invalid());
        }
        let week: u32 = week.parse().map_err(|_| invalid())?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        WeekKey::new(week, year)
    }
}

impl Serialize for WeekKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WeekKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

pub fn key_of(timestamp: &DateTime<Utc>) -> WeekKey {
    WeekKey::from_date(timestamp.date_naive())
}

/// Number of ISO weeks (52 or 53) in `year`, read off the week holding Dec 28.
pub fn weeks_in_year(year: i32) -> Result<u32> {
    let dec28 = NaiveDate::from_ymd_opt(year, 12, 28)
        .ok_or_else(|| NewcomersError::InvalidWeekKey(format!("year {year} out of range")))?;
    Ok(WeekKey::from_date(dec28).week())
}

fn first_monday(year: i32) -> Result<NaiveDate> {
    let jan4 = NaiveDate::from_ymd_opt(year, 1, 4)
        .ok_or_else(|| NewcomersError::InvalidWeekKey(format!("year {year} out of range")))?;
    Ok(WeekKey::from_date(jan4).monday)
}

/// Parse an RFC 3339 / ISO 8601 instant as sent by the GitHub API.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(input.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| NewcomersError::InvalidTimestamp(format!("'{input}': {e}")))
}
