// polyglot-core/src/core/time.rs
// ============================================================================
// Module: Polyglot Timestamps
// Description: Wall-clock timestamps for entry and account bookkeeping.
// Purpose: Store millisecond timestamps and render them as RFC 3339.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Timestamps are stored as unix milliseconds (the natural `SQLite` integer
//! form) and serialize as RFC 3339 strings at API boundaries.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;
use serde::Serializer;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Unix timestamp in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        Self(i64::try_from(now.as_millis()).unwrap_or(i64::MAX))
    }

    /// Returns the timestamp as unix milliseconds.
    #[must_use]
    pub const fn unix_millis(self) -> i64 {
        self.0
    }

    /// Returns a timestamp shifted forward by the given number of seconds.
    #[must_use]
    pub fn plus_secs(self, secs: u64) -> Self {
        let delta = i64::try_from(secs.saturating_mul(1_000)).unwrap_or(i64::MAX);
        Self(self.0.saturating_add(delta))
    }

    /// Renders the timestamp as an RFC 3339 string.
    ///
    /// Out-of-range values fall back to the raw millisecond count.
    #[must_use]
    pub fn to_rfc3339(self) -> String {
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(self.0) * 1_000_000)
            .ok()
            .and_then(|value| value.format(&Rfc3339).ok())
            .unwrap_or_else(|| self.0.to_string())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
