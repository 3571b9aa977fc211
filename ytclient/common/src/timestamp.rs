//! Cluster timestamps.
//!
//! Timestamps are issued by the cluster's timestamp provider. The upper bits
//! carry unix time in seconds and the lower [`Timestamp::COUNTER_BITS`] bits
//! carry a per-second counter, so raw values are totally ordered in time.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A cluster timestamp used to stamp reads with a consistent snapshot.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Number of low bits holding the per-second counter.
    pub const COUNTER_BITS: u32 = 30;

    /// Uninitialized timestamp.
    pub const NULL: Self = Self(0);
    /// Smallest valid timestamp.
    pub const MIN: Self = Self(0x0000_0000_0000_0001);
    /// Largest valid timestamp; everything above is a sentinel.
    pub const MAX: Self = Self(0x3fff_ffff_ffff_ff00);
    /// Read the last committed data, waiting for prepared transactions.
    pub const SYNC_LAST_COMMITTED: Self = Self(0x3fff_ffff_ffff_ff01);
    /// Read all committed versions.
    pub const ALL_COMMITTED: Self = Self(0x3fff_ffff_ffff_ff03);
    /// Read the last committed data without waiting.
    pub const ASYNC_LAST_COMMITTED: Self = Self(0x3fff_ffff_ffff_ff04);

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Builds a timestamp from unix seconds and a counter value.
    pub const fn from_unix_seconds(seconds: u64, counter: u32) -> Self {
        let counter_mask = (1u64 << Self::COUNTER_BITS) - 1;
        Self((seconds << Self::COUNTER_BITS) | (counter as u64 & counter_mask))
    }

    /// Returns the raw value of the timestamp.
    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    /// Returns true for the special read modes above [`Timestamp::MAX`].
    pub fn is_sentinel(&self) -> bool {
        self.0 > Self::MAX.0
    }

    pub fn unix_seconds(&self) -> u64 {
        self.0 >> Self::COUNTER_BITS
    }

    pub fn counter(&self) -> u32 {
        (self.0 & ((1u64 << Self::COUNTER_BITS) - 1)) as u32
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_seconds_round_trip() {
        let ts = Timestamp::from_unix_seconds(1_700_000_000, 42);
        assert_eq!(ts.unix_seconds(), 1_700_000_000);
        assert_eq!(ts.counter(), 42);
        assert!(!ts.is_sentinel());
        assert!(ts > Timestamp::from_unix_seconds(1_699_999_999, 1 << 20));
    }

    #[test]
    fn test_sentinels() {
        assert!(Timestamp::NULL.is_null());
        assert!(!Timestamp::MIN.is_null());
        assert!(!Timestamp::MAX.is_sentinel());
        assert!(Timestamp::SYNC_LAST_COMMITTED.is_sentinel());
        assert!(Timestamp::ASYNC_LAST_COMMITTED.is_sentinel());
        assert!(Timestamp::ALL_COMMITTED.is_sentinel());
    }

    #[test]
    fn test_display_is_hex() {
        assert_eq!(Timestamp::from_raw(255).to_string(), "ff");
    }
}
