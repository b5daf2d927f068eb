//! Alarm records as stored remotely and cached locally.
//!
//! An alarm is written in 12-hour clock notation (`"07:30"` plus `AM`/`PM`)
//! because that is how the shared store holds it. Triggering works in
//! 24-hour local time, so every record can be projected with
//! [`AlarmRecord::hour_minute`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from parsing user- or store-supplied alarm fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid alarm time {0:?}, expected HH:MM")]
    TimeFormat(String),

    #[error("hour {0} out of range 01-12")]
    Hour(u8),

    #[error("minute {0} out of range 00-59")]
    Minute(u8),

    #[error("invalid period {0:?}, expected AM or PM")]
    Period(String),
}

/// Opaque record identifier assigned by the remote store.
///
/// Ordering is lexicographic, which is what trigger tie-breaking relies on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlarmId(String);

impl AlarmId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AlarmId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AlarmId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Half of the day an [`AlarmTime`] refers to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Period {
    #[serde(rename = "AM")]
    #[strum(serialize = "AM")]
    Am,

    #[serde(rename = "PM")]
    #[strum(serialize = "PM")]
    Pm,
}

impl Period {
    /// Parse `"AM"`/`"PM"` (case-insensitive).
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        s.trim()
            .parse()
            .map_err(|_| ParseError::Period(s.to_string()))
    }
}

/// A 12-hour clock time, hour 1--12 and minute 0--59.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AlarmTime {
    hour: u8,
    minute: u8,
}

impl AlarmTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self, ParseError> {
        if !(1..=12).contains(&hour) {
            return Err(ParseError::Hour(hour));
        }
        if minute > 59 {
            return Err(ParseError::Minute(minute));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Map to 24-hour `(hour, minute)`.
    ///
    /// | 12-hour | period | 24-hour |
    /// |---------|--------|---------|
    /// | 12      | AM     | 0       |
    /// | 12      | PM     | 12      |
    /// | 1--11   | AM     | 1--11   |
    /// | 1--11   | PM     | 13--23  |
    pub fn to_24_hour(self, period: Period) -> (u8, u8) {
        let hour = match (period, self.hour) {
            (Period::Am, 12) => 0,
            (Period::Am, h) => h,
            (Period::Pm, 12) => 12,
            (Period::Pm, h) => h + 12,
        };
        (hour, self.minute)
    }
}

impl FromStr for AlarmTime {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format_err = || ParseError::TimeFormat(s.to_string());

        let (hour, minute) = s.trim().split_once(':').ok_or_else(format_err)?;
        let digits = |part: &str, max_len: usize| {
            !part.is_empty() && part.len() <= max_len && part.bytes().all(|b| b.is_ascii_digit())
        };
        if !digits(hour, 2) || minute.len() != 2 || !digits(minute, 2) {
            return Err(format_err());
        }

        let hour = hour.parse().map_err(|_| format_err())?;
        let minute = minute.parse().map_err(|_| format_err())?;
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for AlarmTime {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<AlarmTime> for String {
    fn from(time: AlarmTime) -> Self {
        time.to_string()
    }
}

impl fmt::Display for AlarmTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Record body as exchanged with the store: every field except the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmFields {
    pub time: AlarmTime,
    pub period: Period,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl AlarmFields {
    /// Fields for a freshly added alarm: enabled, stamped now.
    pub fn new_enabled(time: AlarmTime, period: Period) -> Self {
        Self {
            time,
            period,
            enabled: true,
            created_at: Utc::now(),
        }
    }
}

/// Partial update body. Only `enabled` is ever changed after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmPatch {
    pub enabled: bool,
}

/// A stored alarm together with its store-assigned id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmRecord {
    pub id: AlarmId,
    pub time: AlarmTime,
    pub period: Period,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl AlarmRecord {
    pub fn new(id: AlarmId, fields: AlarmFields) -> Self {
        Self {
            id,
            time: fields.time,
            period: fields.period,
            enabled: fields.enabled,
            created_at: fields.created_at,
        }
    }

    /// 24-hour `(hour, minute)` this alarm rings at.
    pub fn hour_minute(&self) -> (u8, u8) {
        self.time.to_24_hour(self.period)
    }

    pub fn fields(&self) -> AlarmFields {
        AlarmFields {
            time: self.time,
            period: self.period,
            enabled: self.enabled,
            created_at: self.created_at,
        }
    }
}

/// All known alarms keyed by id.
///
/// Always built whole from one store listing; never patched in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlarmCollection(BTreeMap<AlarmId, AlarmRecord>);

impl AlarmCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &AlarmId) -> Option<&AlarmRecord> {
        self.0.get(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Records in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &AlarmRecord> {
        self.0.values()
    }

    /// Enabled records in ascending id order.
    pub fn enabled(&self) -> impl Iterator<Item = &AlarmRecord> {
        self.iter().filter(|alarm| alarm.enabled)
    }
}

impl FromIterator<AlarmRecord> for AlarmCollection {
    fn from_iter<I: IntoIterator<Item = AlarmRecord>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|alarm| (alarm.id.clone(), alarm))
                .collect(),
        )
    }
}
