//! Timestamp helpers: date numbers, regular date ranges and season filters.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::consts::SUPPORTED_PERIODS_HOURS;
use crate::error::{CloudBandError, Result};

/// Reference instant of date numbers: 1900-01-01 00:00 (proleptic Gregorian).
pub fn date_number_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1900, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Whole hours elapsed since 1900-01-01 00:00. Partial hours truncate toward zero.
pub fn date_to_number(date: NaiveDateTime) -> i64 {
    (date - date_number_epoch()).num_hours()
}

/// Inverse of [`date_to_number`].
pub fn number_to_date(hours: i64) -> NaiveDateTime {
    date_number_epoch() + Duration::hours(hours)
}

/// Regular sequence from `start` to `end` inclusive with a step of `period_hours`.
///
/// Only 1, 3, 6, 12 and 24-hour periods are accepted.
pub fn date_range(
    start: NaiveDateTime,
    end: NaiveDateTime,
    period_hours: u32,
) -> Result<Vec<NaiveDateTime>> {
    check_period(period_hours)?;
    if end < start {
        return Err(CloudBandError::InvalidTimeAxis(format!(
            "date range ends ({end}) before it starts ({start})"
        )));
    }
    let step = Duration::hours(period_hours as i64);
    let mut dates = Vec::new();
    let mut current = start;
    while current <= end {
        dates.push(current);
        current += step;
    }
    Ok(dates)
}

pub(crate) fn check_period(period_hours: u32) -> Result<()> {
    if SUPPORTED_PERIODS_HOURS.contains(&period_hours) {
        Ok(())
    } else {
        Err(CloudBandError::InvalidPeriod {
            hours: period_hours,
        })
    }
}

/// True if the sequence starts on January 1st and ends on December 31st.
pub fn covers_full_years(dates: &[NaiveDateTime]) -> bool {
    match (dates.first(), dates.last()) {
        (Some(first), Some(last)) => {
            first.month() == 1 && first.day() == 1 && last.month() == 12 && last.day() == 31
        }
        _ => false,
    }
}

/// Number of distinct calendar years touched by the sequence.
pub fn distinct_years(dates: &[NaiveDateTime]) -> usize {
    let mut years: Vec<i32> = dates.iter().map(|d| d.year()).collect();
    years.sort_unstable();
    years.dedup();
    years.len()
}

/// December to March, the austral wet season.
pub fn is_djfm(date: &NaiveDateTime) -> bool {
    matches!(date.month(), 12 | 1 | 2 | 3)
}

/// Indices of the DJFM dates in `dates`, in order.
pub fn djfm_indices(dates: &[NaiveDateTime]) -> Vec<usize> {
    dates
        .iter()
        .enumerate()
        .filter(|(_, d)| is_djfm(d))
        .map(|(i, _)| i)
        .collect()
}
