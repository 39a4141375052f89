//! Time axis generators.
//!
//! Values are day offsets from 1949-12-01 in the proleptic Gregorian
//! calendar, the reference most model output uses.

use chrono::NaiveDate;

/// Day offset of a date from 1949-12-01 (Gregorian).
///
/// # Panics
///
/// Panics if the date is invalid.
pub fn days_since_legacy_epoch(year: i32, month: u32, day: u32) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1949, 12, 1).expect("valid epoch");
    let date = NaiveDate::from_ymd_opt(year, month, day).expect("valid date");
    (date - epoch).num_days() as f64
}

/// Daily time values from `from` to `to` inclusive, centred at noon.
pub fn daily_axis(from: (i32, u32, u32), to: (i32, u32, u32)) -> Vec<f64> {
    let start = days_since_legacy_epoch(from.0, from.1, from.2);
    let end = days_since_legacy_epoch(to.0, to.1, to.2);
    let days = (end - start) as usize;
    (0..=days).map(|d| start + d as f64 + 0.5).collect()
}

/// The first and last day of a span of whole years.
pub fn year_span(first: i32, last: i32) -> Vec<f64> {
    vec![
        days_since_legacy_epoch(first, 1, 1),
        days_since_legacy_epoch(last, 12, 31),
    ]
}
