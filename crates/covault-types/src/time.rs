//! Wall-clock time types.
//!
//! Deadlines are absolute unix timestamps. The current time is passed into
//! every operation that needs it, so callers own the clock and tests can
//! drive it directly; no background timer fires anywhere in the engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// Seconds since the unix epoch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const EPOCH: Self = Self(0);

    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub const fn as_secs(&self) -> u64 {
        self.0
    }

    pub fn saturating_add(&self, duration: Duration) -> Timestamp {
        Timestamp(self.0.saturating_add(duration.as_secs()))
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        self.saturating_add(rhs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// A span of wall-clock seconds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Duration(u64);

impl Duration {
    pub const ZERO: Self = Self(0);

    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub const fn from_hours(hours: u64) -> Self {
        Self(hours * 3_600)
    }

    pub const fn from_days(days: u64) -> Self {
        Self(days * 86_400)
    }

    pub const fn as_secs(&self) -> u64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_arithmetic() {
        let created = Timestamp::from_secs(1_000);
        let deadline = created + Duration::from_days(7);
        assert_eq!(deadline.as_secs(), 1_000 + 7 * 86_400);
        assert!(created < deadline);
    }

    #[test]
    fn test_saturating_add() {
        let far = Timestamp::from_secs(u64::MAX);
        assert_eq!(far.saturating_add(Duration::from_secs(10)), far);
    }

    #[test]
    fn test_duration_constructors() {
        assert_eq!(Duration::from_hours(2).as_secs(), 7_200);
        assert_eq!(Duration::from_days(1).as_secs(), 86_400);
        assert!(Duration::ZERO.is_zero());
        assert!(!Duration::from_secs(1).is_zero());
    }

    #[test]
    fn test_timestamp_serde_transparent() {
        let ts = Timestamp::from_secs(12_345);
        assert_eq!(serde_json::to_string(&ts).unwrap(), "12345");
        let back: Timestamp = serde_json::from_str("12345").unwrap();
        assert_eq!(ts, back);
    }
}
