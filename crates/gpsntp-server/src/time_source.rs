// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! The engine's only view of the GPS receiver.
//!
//! The GPS subsystem (out of scope for this crate) publishes a
//! [`TimeQualitySnapshot`] whenever it parses a new fix. The engine reads one
//! snapshot per processing cycle through the [`TimeSource`] trait and never
//! writes back.
//!
//! All monotonic millisecond values share one clock chosen by the publisher
//! (typically milliseconds since boot).

use std::sync::{Arc, PoisonError, RwLock};

/// The instant the receiver acquired its current lock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LockInstant {
    /// Monotonic milliseconds at lock acquisition.
    pub monotonic_ms: u64,
    /// Sub-second part of the GPS time at lock acquisition, in centiseconds (0-99).
    pub centiseconds: u8,
}

/// A read-only view of GPS time and fix quality at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeQualitySnapshot {
    /// Whether the receiver reports valid UTC time.
    pub time_valid: bool,
    /// UTC seconds since the Unix epoch at the last update.
    pub unix_time: u32,
    /// Sub-second part of `unix_time`, in centiseconds (0-99).
    pub centiseconds: u8,
    /// When the current lock was acquired.
    pub lock_acquired: LockInstant,
    /// Satellites used in the fix.
    pub satellites: u8,
    /// Horizontal dilution of precision.
    pub hdop: f32,
    /// Position dilution of precision.
    pub pdop: f32,
    /// Age of the fix in milliseconds.
    pub fix_age_ms: u32,
    /// Monotonic milliseconds at which this snapshot was published.
    ///
    /// A change in this value tells the timestamp engine to re-latch its
    /// interpolation base.
    pub updated_at_ms: u64,
}

impl Default for TimeQualitySnapshot {
    /// No fix: invalid time, no satellites, worst-case dilution.
    fn default() -> Self {
        TimeQualitySnapshot {
            time_valid: false,
            unix_time: 0,
            centiseconds: 0,
            lock_acquired: LockInstant::default(),
            satellites: 0,
            hdop: 99.9,
            pdop: 99.9,
            fix_age_ms: u32::MAX,
            updated_at_ms: 0,
        }
    }
}

/// Read-only access to the current GPS snapshot.
pub trait TimeSource {
    /// Return the most recently published snapshot.
    fn snapshot(&self) -> TimeQualitySnapshot;
}

/// A fixed snapshot is its own source.
impl TimeSource for TimeQualitySnapshot {
    fn snapshot(&self) -> TimeQualitySnapshot {
        *self
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn snapshot(&self) -> TimeQualitySnapshot {
        (**self).snapshot()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Box<T> {
    fn snapshot(&self) -> TimeQualitySnapshot {
        (**self).snapshot()
    }
}

/// A cloneable snapshot cell shared between the GPS task and the server.
///
/// The GPS side calls [`publish`](SharedTimeSource::publish); the server side
/// reads through [`TimeSource::snapshot`]. Cloning shares the inner `Arc`.
///
/// # Examples
///
/// ```
/// use gpsntp_server::time_source::{SharedTimeSource, TimeQualitySnapshot, TimeSource};
///
/// let source = SharedTimeSource::default();
/// let gps_side = source.clone();
/// gps_side.update(|s| {
///     s.time_valid = true;
///     s.satellites = 9;
/// });
/// assert!(source.snapshot().time_valid);
/// ```
#[derive(Clone, Debug, Default)]
pub struct SharedTimeSource {
    inner: Arc<RwLock<TimeQualitySnapshot>>,
}

impl SharedTimeSource {
    /// Create a cell holding `initial`.
    pub fn new(initial: TimeQualitySnapshot) -> Self {
        SharedTimeSource {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    /// Replace the published snapshot.
    pub fn publish(&self, snapshot: TimeQualitySnapshot) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = snapshot;
    }

    /// Mutate the published snapshot in place.
    ///
    /// The write lock is held only for the duration of the closure.
    pub fn update(&self, f: impl FnOnce(&mut TimeQualitySnapshot)) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
    }
}

impl TimeSource for SharedTimeSource {
    fn snapshot(&self) -> TimeQualitySnapshot {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }
}
