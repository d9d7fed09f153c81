//! Time-axis conversion and output file naming
//!
//! WAVEWATCH III writes time as fractional days since 1990-01-01. Files that
//! carry a CF `units` attribute (`<unit> since <date> [<time>]`) override
//! that default.

use crate::errors::{Result, Ww3VisError};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

/// Reference epoch and unit for a time variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeAxis {
    pub epoch: NaiveDateTime,
    pub unit_seconds: i64,
}

impl Default for TimeAxis {
    /// The WW3 `ww3_ounf` convention: days since 1990-01-01 00:00:00
    fn default() -> Self {
        let epoch = NaiveDate::from_ymd_opt(1990, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        Self {
            epoch,
            unit_seconds: 86_400,
        }
    }
}

impl TimeAxis {
    /// Parse a CF-style `units` attribute, e.g. `days since 1990-01-01 00:00:00`
    pub fn from_units(units: &str) -> Result<Self> {
        let invalid = || Ww3VisError::InvalidTimeUnits {
            units: units.to_string(),
        };

        let lowered = units.trim().to_lowercase();
        let (unit, reference) = lowered.split_once(" since ").ok_or_else(invalid)?;

        let unit_seconds = match unit.trim() {
            "days" | "day" | "d" => 86_400,
            "hours" | "hour" | "h" | "hr" | "hrs" => 3_600,
            "minutes" | "minute" | "min" | "mins" => 60,
            "seconds" | "second" | "s" | "sec" | "secs" => 1,
            _ => return Err(invalid()),
        };

        let reference = reference.trim().trim_end_matches('z').trim_end_matches(" utc");
        let (date_part, time_part) = match reference.split_once(['t', ' ']) {
            Some((d, t)) => (d, Some(t.trim())),
            None => (reference, None),
        };

        let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| invalid())?;
        let time = match time_part {
            None | Some("") => NaiveTime::MIN,
            Some(t) => NaiveTime::parse_from_str(t, "%H:%M:%S%.f")
                .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M:%S"))
                .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M"))
                .map_err(|_| invalid())?,
        };

        Ok(Self {
            epoch: date.and_time(time),
            unit_seconds,
        })
    }

    /// Convert an offset on this axis to a calendar time, rounded to the second
    pub fn offset_to_datetime(&self, offset: f64) -> Result<NaiveDateTime> {
        if !offset.is_finite() {
            return Err(Ww3VisError::Generic(format!(
                "Non-finite time offset {offset}"
            )));
        }
        let seconds = (offset * self.unit_seconds as f64).round() as i64;
        TimeDelta::try_seconds(seconds)
            .and_then(|delta| self.epoch.checked_add_signed(delta))
            .ok_or_else(|| Ww3VisError::Generic(format!("Time offset {offset} out of range")))
    }
}

/// Convert a WW3 day offset (days since 1990-01-01) to a calendar time
pub fn offset_to_datetime(days: f64) -> Result<NaiveDateTime> {
    TimeAxis::default().offset_to_datetime(days)
}

/// `YYYYMMDD HH:MM:SS`, used in plot titles and progress messages
pub fn title_stamp(dt: &NaiveDateTime) -> String {
    dt.format("%Y%m%d %H:%M:%S").to_string()
}

/// `YYYYMMDD_HHMMSS`, used in output file names
pub fn file_label(dt: &NaiveDateTime) -> String {
    dt.format("%Y%m%d_%H%M%S").to_string()
}

/// `YYYYMMDD` of the given date
pub fn generation_stamp(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Generation stamp for today's local date
pub fn today_stamp() -> String {
    generation_stamp(Local::now().date_naive())
}

/// `{generation}_{site}_{YYYYMMDD_HHMMSS}{suffix}.png`
pub fn output_file_name(generation: &str, site: &str, dt: &NaiveDateTime, suffix: &str) -> String {
    format!("{}_{}_{}{}.png", generation, site, file_label(dt), suffix)
}
