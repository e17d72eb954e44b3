//! Timezone-aware timestamp rendering.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;

/// Renders instants in the configured display timezone.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    tz: Tz,
}

impl Default for Clock {
    fn default() -> Self {
        Self { tz: Tz::UTC }
    }
}

impl Clock {
    /// Create a clock for an IANA timezone name.
    ///
    /// Unknown names fall back to UTC with a warning.
    #[must_use]
    pub fn new(tz_name: &str) -> Self {
        let tz = tz_name.parse::<Tz>().unwrap_or_else(|_| {
            tracing::warn!(timezone = %tz_name, "Unrecognised timezone, falling back to UTC");
            Tz::UTC
        });
        Self { tz }
    }

    #[must_use]
    pub fn timezone(&self) -> Tz {
        self.tz
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    /// RFC 3339 with millisecond precision, offset of the display zone.
    #[must_use]
    pub fn iso(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.tz)
            .to_rfc3339_opts(SecondsFormat::Millis, false)
    }

    /// `HH:MM:SS` in the display zone.
    #[must_use]
    pub fn time(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.tz).format("%H:%M:%S").to_string()
    }

    /// `YYYY-MM-DD HH:MM:SS` in the display zone.
    #[must_use]
    pub fn datetime(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.tz)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }

    /// The `timestamp` / `displayTime` pair stamped on every slot.
    #[must_use]
    pub fn stamp(&self) -> (String, String) {
        let now = self.now();
        (self.iso(now), self.time(now))
    }
}

/// Convert epoch milliseconds into a UTC instant.
#[must_use]
pub fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

/// Convert a filesystem time into epoch milliseconds.
#[must_use]
pub fn system_time_millis(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_millis()).unwrap_or(i64::MAX),
        Err(e) => -i64::try_from(e.duration().as_millis()).unwrap_or(i64::MAX),
    }
}

/// Human-readable duration such as `1h 5m 3s`.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    match (hours, minutes) {
        (0, 0) => format!("{seconds}s"),
        (0, _) => format!("{minutes}m {seconds}s"),
        _ => format!("{hours}h {minutes}m {seconds}s"),
    }
}

/// Like [`format_duration`] for a millisecond span; negative spans render as zero.
#[must_use]
pub fn format_millis(ms: i64) -> String {
    format_duration(Duration::from_millis(u64::try_from(ms).unwrap_or(0)))
}
