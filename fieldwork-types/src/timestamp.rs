//! UTC instants with ISO-8601 text and Unix-epoch forms.
//!
//! Parsing accepts, in order:
//! - RFC 3339 text with any offset (converted to UTC)
//! - naive date-times, which are assumed to already be UTC
//! - bare dates, taken as midnight UTC
//!
//! Generation always emits UTC with a `Z` suffix and only as many
//! sub-second digits as the instant needs, so `parse(to_iso8601(t)) == t`.
//!
//! Instants are limited to the four-digit years 0000 through 9999; the
//! fallible constructors reject anything outside with `InvalidTimestamp`.

use crate::{Error, Result};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// Years ISO-8601 text can carry without a sign.
const MIN_YEAR: i32 = 0;
const MAX_YEAR: i32 = 9999;

/// Naive layouts tried after RFC 3339. `%.f` also matches an absent fraction.
const NAIVE_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// A timezone-aware instant, always held in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current instant.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Wraps an existing UTC date-time without checking its year. Use
    /// [`Timestamp::try_from_datetime`] for untrusted instants.
    #[must_use]
    pub const fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Wraps a UTC date-time, rejecting years outside 0000..=9999.
    pub fn try_from_datetime(dt: DateTime<Utc>) -> Result<Self> {
        if (MIN_YEAR..=MAX_YEAR).contains(&dt.year()) {
            Ok(Self(dt))
        } else {
            Err(Error::InvalidTimestamp(format!(
                "year {} is outside {MIN_YEAR:04}..={MAX_YEAR}",
                dt.year()
            )))
        }
    }

    /// Returns the underlying date-time.
    #[must_use]
    pub const fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Builds a timestamp from whole seconds since the Unix epoch.
    pub fn from_epoch_seconds(secs: i64) -> Result<Self> {
        DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| Error::InvalidTimestamp(format!("epoch seconds out of range: {secs}")))
            .and_then(Self::try_from_datetime)
    }

    /// Builds a timestamp from fractional seconds since the Unix epoch.
    ///
    /// The fraction is rounded to the nearest nanosecond.
    pub fn from_epoch_f64(secs: f64) -> Result<Self> {
        if !secs.is_finite() {
            return Err(Error::InvalidTimestamp(format!("epoch seconds not finite: {secs}")));
        }
        let whole = secs.floor();
        let mut nanos = ((secs - whole) * NANOS_PER_SECOND).round() as u32;
        let mut whole = whole as i64;
        if nanos >= 1_000_000_000 {
            whole = whole.saturating_add(1);
            nanos = 0;
        }
        DateTime::from_timestamp(whole, nanos)
            .ok_or_else(|| Error::InvalidTimestamp(format!("epoch seconds out of range: {secs}")))
            .and_then(Self::try_from_datetime)
    }

    /// Whole seconds since the Unix epoch (sub-second part truncated).
    #[must_use]
    pub fn epoch_seconds(&self) -> i64 {
        self.0.timestamp()
    }

    /// Parses ISO-8601 text. See the module docs for the accepted layouts.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Self::try_from_datetime(dt.with_timezone(&Utc));
        }

        for layout in NAIVE_LAYOUTS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(text, layout) {
                return Self::try_from_datetime(naive.and_utc());
            }
        }

        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
                return Self::try_from_datetime(midnight.and_utc());
            }
        }

        Err(Error::InvalidTimestamp(format!(
            "unrecognised ISO-8601 text: {text:?}"
        )))
    }

    /// Renders ISO-8601 UTC text, e.g. `2024-03-01T12:00:00Z`.
    #[must_use]
    pub fn to_iso8601(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl FromStr for Timestamp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
