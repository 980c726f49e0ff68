// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! GPS quality gate and operator status.

use std::fmt;

use super::config::QualityThresholds;
use crate::time_source::TimeQualitySnapshot;

/// Whether the snapshot is good enough to serve time from.
///
/// All of valid time, enough satellites, HDOP at or below the ceiling, and a
/// fresh enough fix are required. A NaN HDOP fails.
pub fn quality_passes(snapshot: &TimeQualitySnapshot, thresholds: &QualityThresholds) -> bool {
    snapshot.time_valid
        && snapshot.satellites >= thresholds.min_satellites
        && snapshot.hdop <= thresholds.max_hdop
        && u128::from(snapshot.fix_age_ms) <= thresholds.max_fix_age.as_millis()
}

/// Human-readable serving state, reporting the first failing condition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ServingStatus {
    /// The engine is disabled.
    Disabled,
    /// The receiver has no valid UTC time.
    NoGpsTime,
    /// Too few satellites in the fix.
    LowSatellites(u8),
    /// HDOP above the ceiling.
    HighHdop(f32),
    /// The fix is older than allowed.
    StaleFix,
    /// Quality fails for a reason not covered above (for example a NaN HDOP).
    QualityInsufficient,
    /// Serving time at the given stratum.
    Serving(u8),
}

impl ServingStatus {
    /// Evaluate the status in priority order.
    pub fn evaluate(
        enabled: bool,
        snapshot: &TimeQualitySnapshot,
        thresholds: &QualityThresholds,
        stratum: u8,
    ) -> Self {
        if !enabled {
            return ServingStatus::Disabled;
        }
        if !snapshot.time_valid {
            return ServingStatus::NoGpsTime;
        }
        if snapshot.satellites < thresholds.min_satellites {
            return ServingStatus::LowSatellites(snapshot.satellites);
        }
        if snapshot.hdop > thresholds.max_hdop {
            return ServingStatus::HighHdop(snapshot.hdop);
        }
        if u128::from(snapshot.fix_age_ms) > thresholds.max_fix_age.as_millis() {
            return ServingStatus::StaleFix;
        }
        if !quality_passes(snapshot, thresholds) {
            return ServingStatus::QualityInsufficient;
        }
        ServingStatus::Serving(stratum)
    }

    /// Whether this status means requests are being answered.
    pub fn is_serving(&self) -> bool {
        matches!(self, ServingStatus::Serving(_))
    }
}

impl fmt::Display for ServingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServingStatus::Disabled => write!(f, "Disabled"),
            ServingStatus::NoGpsTime => write!(f, "No GPS Time"),
            ServingStatus::LowSatellites(n) => write!(f, "Low Satellites ({n})"),
            ServingStatus::HighHdop(h) => write!(f, "High HDOP ({h:.1})"),
            ServingStatus::StaleFix => write!(f, "Stale GPS Fix"),
            ServingStatus::QualityInsufficient => write!(f, "GPS Quality Insufficient"),
            ServingStatus::Serving(stratum) => write!(f, "Serving - Stratum {stratum}"),
        }
    }
}
