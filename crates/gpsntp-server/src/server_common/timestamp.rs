// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Conversion of GPS snapshots into NTP timestamps.
//!
//! GPS time only resolves to centiseconds and only changes when the receiver
//! publishes a new fix. Between updates the engine interpolates with a
//! monotonic clock: the first time it sees a new `updated_at_ms` it latches
//! the current [`Instant`], and every later call adds the elapsed time since
//! that latch to the GPS base.

use std::time::{Duration, Instant};

use crate::protocol::TimestampFormat;
use crate::time_source::TimeQualitySnapshot;
use crate::unix_time;

/// Advance `base` by `elapsed`, at microsecond resolution, carrying fraction
/// overflow into the seconds field.
pub fn advance(base: TimestampFormat, elapsed: Duration) -> TimestampFormat {
    let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
    base.add_fraction(unix_time::micros_to_fraction(micros))
}

/// Produces NTP timestamps from GPS snapshots with sub-update interpolation.
#[derive(Clone, Debug, Default)]
pub struct TimestampEngine {
    latch: Option<(u64, Instant)>,
}

impl TimestampEngine {
    /// Create an engine with no latch.
    pub fn new() -> Self {
        Self::default()
    }

    /// The GPS time of `snapshot` as an NTP timestamp, with no interpolation.
    pub fn to_ntp_time(snapshot: &TimeQualitySnapshot) -> TimestampFormat {
        TimestampFormat {
            seconds: unix_time::unix_to_ntp_seconds(snapshot.unix_time),
            fraction: unix_time::centis_to_fraction(snapshot.centiseconds),
        }
    }

    /// The GPS time at `now`, interpolated from the last snapshot change.
    ///
    /// The latch moves only when `snapshot.updated_at_ms` differs from the
    /// value last seen.
    pub fn micros_to_ntp(&mut self, snapshot: &TimeQualitySnapshot, now: Instant) -> TimestampFormat {
        let latched_at = match self.latch {
            Some((updated_at, at)) if updated_at == snapshot.updated_at_ms => at,
            _ => {
                self.latch = Some((snapshot.updated_at_ms, now));
                now
            }
        };
        advance(
            Self::to_ntp_time(snapshot),
            now.saturating_duration_since(latched_at),
        )
    }

    /// The instant the receiver acquired its current lock, as an NTP timestamp.
    ///
    /// Whole seconds between lock acquisition and the snapshot's update are
    /// subtracted from the snapshot's Unix time.
    pub fn reference_timestamp(snapshot: &TimeQualitySnapshot) -> TimestampFormat {
        let lock = snapshot.lock_acquired;
        let since_lock_secs = snapshot.updated_at_ms.saturating_sub(lock.monotonic_ms) / 1000;
        let since_lock_secs = u32::try_from(since_lock_secs).unwrap_or(u32::MAX);
        TimestampFormat {
            seconds: unix_time::unix_to_ntp_seconds(snapshot.unix_time.saturating_sub(since_lock_secs)),
            fraction: unix_time::centis_to_fraction(lock.centiseconds),
        }
    }

    /// Root delay and root dispersion in seconds.
    ///
    /// Delay steps with PDOP. Dispersion grows with fix age and HDOP and is
    /// capped at one second.
    pub fn root_delay_dispersion(snapshot: &TimeQualitySnapshot) -> (f64, f64) {
        let pdop = f64::from(snapshot.pdop);
        let delay = if pdop < 2.0 {
            0.001
        } else if pdop < 5.0 {
            0.005
        } else {
            0.010
        };
        let dispersion = f64::from(snapshot.fix_age_ms) / 1000.0 + f64::from(snapshot.hdop) * 0.001;
        (delay, dispersion.min(1.0))
    }

    /// The `updated_at_ms` value currently latched, if any.
    pub fn latched_update(&self) -> Option<u64> {
        self.latch.map(|(updated_at, _)| updated_at)
    }
}
