//! CF time axes: units strings, calendars and conversion to model dates.
//!
//! Climate model output frequently uses non-Gregorian calendars (`noleap`,
//! `360_day`, ...), so converted instants are represented by
//! [`ModelDateTime`] rather than a chrono type: a `360_day` file can
//! legitimately contain February 30th.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Serialize, Serializer};
use tracing::warn;

use crate::error::{NetCdfError, NetCdfResult};

/// Units assumed when a time variable carries no `units` attribute.
pub const LEGACY_TIME_UNITS: &str = "days since 1949-12-01 00:00:00";

const SECONDS_PER_DAY: i64 = 86_400;

/// Offsets beyond this many seconds are rejected instead of overflowing.
const MAX_OFFSET_SECONDS: f64 = 1.0e15;

/// A calendar instant in an arbitrary CF calendar.
///
/// Ordering is chronological within a single calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelDateTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl ModelDateTime {
    /// Midnight on the given day.
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self {
            year,
            month,
            day,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }

    pub fn with_time(self, hour: u32, minute: u32, second: u32) -> Self {
        Self {
            hour,
            minute,
            second,
            ..self
        }
    }

    /// Date in `YYYYMMDD` form, as used in DRS filenames.
    pub fn compact_date(&self) -> String {
        format!("{:04}{:02}{:02}", self.year, self.month, self.day)
    }

    fn seconds_of_day(&self) -> i64 {
        i64::from(self.hour) * 3600 + i64::from(self.minute) * 60 + i64::from(self.second)
    }

    fn from_seconds_of_day(year: i32, month: u32, day: u32, seconds: i64) -> Self {
        // seconds is always in 0..86400 here
        let hour = (seconds / 3600) as u32;
        let minute = ((seconds % 3600) / 60) as u32;
        let second = (seconds % 60) as u32;
        Self::new(year, month, day).with_time(hour, minute, second)
    }
}

impl fmt::Display for ModelDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

impl Serialize for ModelDateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// CF calendar of a time coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Calendar {
    /// `standard`, `gregorian` and `proleptic_gregorian`
    #[default]
    Gregorian,
    /// `noleap` / `365_day`
    NoLeap,
    /// `all_leap` / `366_day`
    AllLeap,
    /// `360_day`: twelve 30-day months
    Day360,
}

impl FromStr for Calendar {
    type Err = NetCdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "standard" | "gregorian" | "proleptic_gregorian" => Ok(Calendar::Gregorian),
            "noleap" | "365_day" => Ok(Calendar::NoLeap),
            "all_leap" | "366_day" => Ok(Calendar::AllLeap),
            "360_day" => Ok(Calendar::Day360),
            other => Err(NetCdfError::UnsupportedTime(format!("calendar '{}'", other))),
        }
    }
}

impl Calendar {
    fn month_lengths(&self) -> [u32; 12] {
        match self {
            Calendar::Day360 => [30; 12],
            Calendar::AllLeap => [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31],
            // Gregorian never reaches here; see TimeUnits::to_datetime
            Calendar::NoLeap | Calendar::Gregorian => {
                [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
            }
        }
    }

    fn year_length(&self) -> i64 {
        self.month_lengths().iter().map(|&d| i64::from(d)).sum()
    }

    /// Day count from year 0 in a fixed-length-year calendar.
    fn day_number(&self, date: &ModelDateTime) -> NetCdfResult<i64> {
        let lengths = self.month_lengths();
        let month_index = date
            .month
            .checked_sub(1)
            .filter(|m| *m < 12)
            .ok_or_else(|| NetCdfError::InvalidFormat(format!("month {}", date.month)))?
            as usize;
        if date.day == 0 || date.day > lengths[month_index] {
            return Err(NetCdfError::InvalidFormat(format!(
                "day {} of month {} in {:?} calendar",
                date.day, date.month, self
            )));
        }
        let before: i64 = lengths[..month_index].iter().map(|&d| i64::from(d)).sum();
        Ok(i64::from(date.year) * self.year_length() + before + i64::from(date.day) - 1)
    }

    fn date_from_day_number(&self, number: i64) -> NetCdfResult<(i32, u32, u32)> {
        let year_length = self.year_length();
        let year = i32::try_from(number.div_euclid(year_length))
            .map_err(|_| NetCdfError::UnsupportedTime(format!("day number {}", number)))?;
        let mut remaining = number.rem_euclid(year_length);
        for (index, length) in self.month_lengths().iter().enumerate() {
            let length = i64::from(*length);
            if remaining < length {
                return Ok((year, index as u32 + 1, remaining as u32 + 1));
            }
            remaining -= length;
        }
        Err(NetCdfError::UnsupportedTime(format!("day number {}", number)))
    }
}

/// Unit of a CF time offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl TimeUnit {
    fn seconds(&self) -> f64 {
        match self {
            TimeUnit::Days => 86_400.0,
            TimeUnit::Hours => 3_600.0,
            TimeUnit::Minutes => 60.0,
            TimeUnit::Seconds => 1.0,
        }
    }
}

impl FromStr for TimeUnit {
    type Err = NetCdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "days" | "day" | "d" => Ok(TimeUnit::Days),
            "hours" | "hour" | "hr" | "h" => Ok(TimeUnit::Hours),
            "minutes" | "minute" | "min" => Ok(TimeUnit::Minutes),
            "seconds" | "second" | "sec" | "s" => Ok(TimeUnit::Seconds),
            other => Err(NetCdfError::UnsupportedTime(format!("time unit '{}'", other))),
        }
    }
}

/// Parsed `"<unit> since <reference>"` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeUnits {
    pub unit: TimeUnit,
    pub reference: ModelDateTime,
}

impl TimeUnits {
    /// Parse a CF units string such as `days since 1949-12-01 00:00:00`.
    pub fn parse(units: &str) -> NetCdfResult<Self> {
        let (unit, reference) = units
            .trim()
            .split_once(" since ")
            .ok_or_else(|| NetCdfError::UnsupportedTime(format!("units '{}'", units)))?;

        Ok(Self {
            unit: unit.parse()?,
            reference: parse_reference(reference)
                .ok_or_else(|| NetCdfError::UnsupportedTime(format!("reference '{}'", reference)))?,
        })
    }

    /// Convert a raw coordinate value to a calendar instant.
    ///
    /// Sub-second fractions are truncated towards the earlier second.
    pub fn to_datetime(&self, value: f64, calendar: Calendar) -> NetCdfResult<ModelDateTime> {
        let offset = (value * self.unit.seconds()).floor();
        if !offset.is_finite() || offset.abs() > MAX_OFFSET_SECONDS {
            return Err(NetCdfError::UnsupportedTime(format!("time value {}", value)));
        }
        let offset = offset as i64;

        let mut days = offset.div_euclid(SECONDS_PER_DAY);
        let mut seconds = self.reference.seconds_of_day() + offset.rem_euclid(SECONDS_PER_DAY);
        days += seconds / SECONDS_PER_DAY;
        seconds %= SECONDS_PER_DAY;

        let (year, month, day) = match calendar {
            Calendar::Gregorian => self.add_gregorian_days(days)?,
            fixed => {
                let start = fixed.day_number(&self.reference)?;
                fixed.date_from_day_number(start + days)?
            }
        };

        Ok(ModelDateTime::from_seconds_of_day(year, month, day, seconds))
    }

    fn add_gregorian_days(&self, days: i64) -> NetCdfResult<(i32, u32, u32)> {
        let reference = self.reference;
        let start = NaiveDate::from_ymd_opt(reference.year, reference.month, reference.day)
            .ok_or_else(|| {
                NetCdfError::InvalidFormat(format!("reference date {}", reference))
            })?;

        let shifted = if days >= 0 {
            start.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            start.checked_sub_days(Days::new(days.unsigned_abs()))
        }
        .ok_or_else(|| NetCdfError::UnsupportedTime(format!("{} days from {}", days, reference)))?;

        Ok((shifted.year(), shifted.month(), shifted.day()))
    }
}

fn parse_reference(reference: &str) -> Option<ModelDateTime> {
    let mut tokens = reference.split_whitespace();
    let first = tokens.next()?;
    let (date, time) = match first.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (first, tokens.next()),
    };

    // A leading '-' belongs to the year
    let (sign, date) = match date.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, date),
    };
    let mut parts = date.splitn(3, '-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next().unwrap_or("1").parse().ok()?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }

    let mut datetime = ModelDateTime::new(sign * year, month, day);
    if let Some(time) = time {
        let time = time
            .split(['Z', '+'])
            .next()
            .unwrap_or_default();
        let mut fields = time.split(':');
        let hour: u32 = fields.next().filter(|s| !s.is_empty()).unwrap_or("0").parse().ok()?;
        let minute: u32 = fields.next().unwrap_or("0").parse().ok()?;
        let second = fields.next().unwrap_or("0").parse::<f64>().ok()?.floor() as u32;
        if hour > 23 || minute > 59 || second > 60 {
            return None;
        }
        datetime = datetime.with_time(hour, minute, second.min(59));
    }
    Some(datetime)
}

/// Raw values of a time coordinate together with its CF attributes.
#[derive(Debug, Clone, Default)]
pub struct TimeAxis {
    pub values: Vec<f64>,
    pub units: Option<String>,
    pub calendar: Option<String>,
}

impl TimeAxis {
    pub fn calendar(&self) -> NetCdfResult<Calendar> {
        self.calendar
            .as_deref()
            .map(Calendar::from_str)
            .unwrap_or(Ok(Calendar::Gregorian))
    }

    /// Parsed units, falling back to [`LEGACY_TIME_UNITS`] when absent.
    pub fn units(&self) -> NetCdfResult<TimeUnits> {
        match self.units.as_deref() {
            Some(units) => TimeUnits::parse(units),
            None => {
                warn!(
                    legacy_units = LEGACY_TIME_UNITS,
                    "Time variable has no units attribute, assuming legacy epoch"
                );
                TimeUnits::parse(LEGACY_TIME_UNITS)
            }
        }
    }

    /// First and last instants of the axis, in storage order.
    pub fn endpoints(&self) -> NetCdfResult<(ModelDateTime, ModelDateTime)> {
        let (first, last) = match (self.values.first(), self.values.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Err(NetCdfError::MissingData("time values".to_string())),
        };
        let units = self.units()?;
        let calendar = self.calendar()?;
        Ok((
            units.to_datetime(first, calendar)?,
            units.to_datetime(last, calendar)?,
        ))
    }
}
