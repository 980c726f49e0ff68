// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

/// The number of seconds from 1st January 1900 UTC to the start of the Unix epoch.
pub const EPOCH_DELTA: i64 = 2_208_988_800;

// One second in 2^-32 units.
const FRACTION_SCALE: u64 = 1 << 32;

/// Convert Unix seconds to NTP era-0 seconds, wrapping at the era boundary.
pub fn unix_to_ntp_seconds(unix_secs: u32) -> u32 {
    (i64::from(unix_secs) + EPOCH_DELTA) as u32
}

/// Scale a centisecond count (0-99) to a 32-bit NTP fraction.
///
/// Values of 100 or more are treated as 99 so the result never spills into the
/// seconds field.
pub fn centis_to_fraction(centis: u8) -> u32 {
    let centis = u64::from(centis.min(99));
    (centis * FRACTION_SCALE / 100) as u32
}

/// Scale a microsecond count to 2^-32 second units.
///
/// The result may exceed `u32::MAX` when `micros` spans more than one second.
pub fn micros_to_fraction(micros: u64) -> u64 {
    (u128::from(micros) * u128::from(FRACTION_SCALE) / 1_000_000) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_to_ntp_seconds_offset() {
        assert_eq!(unix_to_ntp_seconds(0), 2_208_988_800);
        // 2024-01-01 00:00:00 UTC
        assert_eq!(unix_to_ntp_seconds(1_704_067_200), 3_913_056_000);
    }

    #[test]
    fn unix_to_ntp_seconds_wraps_into_era1() {
        // 2036-02-07 06:28:16 UTC is NTP era 1, offset 0.
        assert_eq!(unix_to_ntp_seconds(2_085_978_496), 0);
    }

    #[test]
    fn centis_scale() {
        assert_eq!(centis_to_fraction(0), 0);
        assert_eq!(centis_to_fraction(50), 0x8000_0000);
        assert_eq!(centis_to_fraction(25), 0x4000_0000);
        assert_eq!(centis_to_fraction(99), 4_252_017_623);
        assert_eq!(centis_to_fraction(200), centis_to_fraction(99));
    }

    #[test]
    fn micros_scale() {
        assert_eq!(micros_to_fraction(0), 0);
        assert_eq!(micros_to_fraction(1), 4294);
        assert_eq!(micros_to_fraction(500_000), 0x8000_0000);
        assert_eq!(micros_to_fraction(1_000_000), 1 << 32);
        assert_eq!(micros_to_fraction(2_500_000), (5u64 << 32) / 2);
    }
}
