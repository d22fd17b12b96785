//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Checks if this timestamp is after another.
    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }

    /// Returns the duration from another timestamp to this one.
    ///
    /// Returns negative duration if other is after self.
    pub fn duration_since(&self, other: &Timestamp) -> Duration {
        self.0.signed_duration_since(other.0)
    }

    /// Creates a new timestamp by adding the specified number of seconds.
    pub fn plus_secs(&self, secs: u64) -> Self {
        Self(self.0 + Duration::seconds(secs as i64))
    }

    /// Creates a new timestamp by adding the specified number of minutes.
    pub fn plus_mins(&self, mins: u64) -> Self {
        Self(self.0 + Duration::minutes(mins as i64))
    }

    /// Creates a new timestamp by subtracting the specified number of minutes.
    pub fn minus_mins(&self, mins: u64) -> Self {
        Self(self.0 - Duration::minutes(mins as i64))
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_ordered_with_offsets() {
        let now = Timestamp::now();
        let later = now.plus_secs(60);
        assert!(now.is_before(&later));
        assert!(later.is_after(&now));
    }

    #[test]
    fn duration_since_measures_gap() {
        let start = Timestamp::now();
        let end = start.plus_mins(30);
        assert_eq!(end.duration_since(&start), Duration::minutes(30));
    }

    #[test]
    fn minus_mins_moves_backward() {
        let now = Timestamp::now();
        let earlier = now.minus_mins(45);
        assert!(earlier.is_before(&now));
        assert_eq!(now.duration_since(&earlier), Duration::minutes(45));
    }

    #[test]
    fn serializes_transparently() {
        let ts = Timestamp::now();
        let json = serde_json::to_string(&ts).unwrap();
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, back);
    }
}
