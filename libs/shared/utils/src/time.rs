use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use shared_models::error::AppError;

/// `DD-MM-YYYY HH:MM`, as typed by clinic staff.
pub const DISPLAY_FORMAT: &str = "%d-%m-%Y %H:%M";
pub const SECONDS_PER_DAY: i64 = 86_400;

/// A point in time as it arrives over the wire: epoch seconds or a
/// display-format string in the clinic's zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeInput {
    Epoch(i64),
    Display(String),
}

impl TimeInput {
    pub fn resolve(&self, utc_offset_seconds: i32) -> Result<i64, AppError> {
        match self {
            TimeInput::Epoch(seconds) => Ok(*seconds),
            TimeInput::Display(raw) => parse_time_param(raw, utc_offset_seconds),
        }
    }
}

pub fn now_timestamp() -> i64 {
    Utc::now().timestamp()
}

fn display_zone(utc_offset_seconds: i32) -> Result<FixedOffset, AppError> {
    FixedOffset::east_opt(utc_offset_seconds)
        .ok_or_else(|| AppError::Internal(format!("Invalid UTC offset {}", utc_offset_seconds)))
}

/// Parses `DD-MM-YYYY HH:MM` in the zone `utc_offset_seconds` east of UTC.
pub fn parse_display_time(input: &str, utc_offset_seconds: i32) -> Result<i64, AppError> {
    let cleaned = input.trim();
    if cleaned.is_empty() {
        return Err(AppError::ValidationError("Time string is empty".to_string()));
    }

    let naive = NaiveDateTime::parse_from_str(cleaned, DISPLAY_FORMAT).map_err(|e| {
        AppError::ValidationError(format!(
            "Cannot parse '{}' as DD-MM-YYYY HH:MM: {}",
            cleaned, e
        ))
    })?;

    if naive.year() < 1970 {
        return Err(AppError::ValidationError("Year must be 1970 or later".to_string()));
    }

    display_zone(utc_offset_seconds)?
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.timestamp())
        .ok_or_else(|| {
            AppError::ValidationError(format!("'{}' is not a valid local time", cleaned))
        })
}

/// Accepts either raw epoch seconds or the display format.
pub fn parse_time_param(raw: &str, utc_offset_seconds: i32) -> Result<i64, AppError> {
    match raw.trim().parse::<i64>() {
        Ok(seconds) => Ok(seconds),
        Err(_) => parse_display_time(raw, utc_offset_seconds),
    }
}

pub fn format_display_time(timestamp: i64, utc_offset_seconds: i32) -> String {
    let zone = match FixedOffset::east_opt(utc_offset_seconds) {
        Some(zone) => zone,
        None => return timestamp.to_string(),
    };

    match DateTime::<Utc>::from_timestamp(timestamp, 0) {
        Some(instant) => instant.with_timezone(&zone).format(DISPLAY_FORMAT).to_string(),
        None => timestamp.to_string(),
    }
}

/// Inclusive bounds of the local calendar day containing `now`.
pub fn local_day_bounds(now: i64, utc_offset_seconds: i32) -> (i64, i64) {
    let local_seconds = now + i64::from(utc_offset_seconds);
    let start = now - local_seconds.rem_euclid(SECONDS_PER_DAY);
    (start, start + SECONDS_PER_DAY - 1)
}
