// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use std::io;

use super::config::ServerConfig;
use super::timestamp::TimestampEngine;
use super::validation::RequestDescriptor;
use crate::broadcast::BROADCAST_POLL;
use crate::protocol::{self, ConstPackedSizeBytes, WriteBytes};
use crate::time_source::TimeQualitySnapshot;

/// Advertised clock precision, about one microsecond (2^-20 s).
pub const PRECISION: i8 = -20;

/// Fix age above which responses carry the unsynchronized leap indicator.
pub const LEAP_ALARM_FIX_AGE_MS: u32 = 2000;

fn leap_indicator(snapshot: &TimeQualitySnapshot) -> protocol::LeapIndicator {
    if !snapshot.time_valid || snapshot.fix_age_ms > LEAP_ALARM_FIX_AGE_MS {
        protocol::LeapIndicator::Unknown
    } else {
        protocol::LeapIndicator::NoWarning
    }
}

fn encode(packet: &protocol::Packet) -> io::Result<[u8; protocol::Packet::PACKED_SIZE_BYTES]> {
    let mut buf = [0u8; protocol::Packet::PACKED_SIZE_BYTES];
    (&mut buf[..]).write_bytes(packet)?;
    Ok(buf)
}

fn server_packet(
    request: &RequestDescriptor,
    snapshot: &TimeQualitySnapshot,
    config: &ServerConfig,
    receive: protocol::TimestampFormat,
    transmit: protocol::TimestampFormat,
) -> protocol::Packet {
    let (delay, dispersion) = TimestampEngine::root_delay_dispersion(snapshot);
    protocol::Packet {
        leap_indicator: leap_indicator(snapshot),
        version: request.version,
        mode: protocol::Mode::Server,
        stratum: config.stratum,
        poll: request.poll.clamp(protocol::MINPOLL, protocol::MAXPOLL),
        precision: PRECISION,
        root_delay: protocol::ShortFormat::from_seconds(delay),
        root_dispersion: protocol::ShortFormat::from_seconds(dispersion),
        reference_id: protocol::ReferenceIdentifier::from_bytes_with_stratum(
            config.reference_id,
            config.stratum,
        ),
        reference_timestamp: TimestampEngine::reference_timestamp(snapshot),
        origin_timestamp: request.transmit_timestamp,
        receive_timestamp: receive,
        transmit_timestamp: transmit,
    }
}

/// Build a mode 4 response to a validated client request.
///
/// The originate field is the request's transmit timestamp, unchanged.
pub fn build_response(
    request: &RequestDescriptor,
    snapshot: &TimeQualitySnapshot,
    config: &ServerConfig,
    receive: protocol::TimestampFormat,
    transmit: protocol::TimestampFormat,
) -> io::Result<[u8; 48]> {
    encode(&server_packet(request, snapshot, config, receive, transmit))
}

/// Build a Kiss-o'-Death packet carrying `code`.
///
/// Leap indicator 3, version 4, mode 4, stratum 0, and every timestamp zero.
pub fn build_kiss_of_death(code: protocol::KissOfDeath) -> io::Result<[u8; 48]> {
    encode(&protocol::Packet {
        leap_indicator: protocol::LeapIndicator::Unknown,
        version: protocol::Version::V4,
        mode: protocol::Mode::Server,
        stratum: protocol::Stratum::UNSPECIFIED,
        poll: 0,
        precision: 0,
        root_delay: protocol::ShortFormat::default(),
        root_dispersion: protocol::ShortFormat::default(),
        reference_id: protocol::ReferenceIdentifier::KissOfDeath(code),
        reference_timestamp: protocol::TimestampFormat::default(),
        origin_timestamp: protocol::TimestampFormat::default(),
        receive_timestamp: protocol::TimestampFormat::default(),
        transmit_timestamp: protocol::TimestampFormat::default(),
    })
}

/// Build a mode 5 broadcast packet.
///
/// The unicast path is reused with a synthetic zeroed NTPv4 request, so the
/// originate field is zero.
pub fn build_broadcast(
    snapshot: &TimeQualitySnapshot,
    config: &ServerConfig,
    transmit: protocol::TimestampFormat,
) -> io::Result<[u8; 48]> {
    let synthetic = RequestDescriptor {
        version: protocol::Version::V4,
        poll: BROADCAST_POLL,
        stratum: protocol::Stratum::UNSPECIFIED,
        transmit_timestamp: protocol::TimestampFormat::default(),
    };
    let mut packet = server_packet(&synthetic, snapshot, config, transmit, transmit);
    packet.mode = protocol::Mode::Broadcast;
    encode(&packet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ReadBytes;
    use crate::server_common::validation::parse_request;
    use crate::time_source::LockInstant;

    fn snapshot() -> TimeQualitySnapshot {
        TimeQualitySnapshot {
            time_valid: true,
            unix_time: 1_700_000_000,
            centiseconds: 0,
            lock_acquired: LockInstant {
                monotonic_ms: 1_000,
                centiseconds: 50,
            },
            satellites: 9,
            hdop: 0.9,
            pdop: 1.4,
            fix_age_ms: 120,
            updated_at_ms: 61_000,
        }
    }

    fn request() -> RequestDescriptor {
        let mut buf = [0u8; 48];
        buf[0] = 0x1B; // v3 client
        buf[2] = 17;
        buf[40..48].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        parse_request(&buf).unwrap()
    }

    fn stamp(seconds: u32) -> protocol::TimestampFormat {
        protocol::TimestampFormat {
            seconds,
            fraction: 0xABCD_0000,
        }
    }

    #[test]
    fn response_header_fields() {
        let config = ServerConfig::default();
        let out = build_response(&request(), &snapshot(), &config, stamp(10), stamp(11)).unwrap();
        // LI 0, VN 3, mode 4.
        assert_eq!(out[0], 0x1C);
        assert_eq!(out[1], 1);
        assert_eq!(out[2], 10, "poll clamped to 10");
        assert_eq!(out[3], 0xEC);
        // PDOP 1.4 -> 0.001 s -> 65 units.
        assert_eq!(&out[4..8], &[0, 0, 0, 65]);
        // 0.12 + 0.0009 s.
        let dispersion = u32::from_be_bytes([out[8], out[9], out[10], out[11]]);
        assert_eq!(dispersion, (0.1209f64 * 65536.0) as u32);
        assert_eq!(&out[12..16], b"GPS\0");
    }

    #[test]
    fn response_timestamps() {
        let config = ServerConfig::default();
        let out = build_response(&request(), &snapshot(), &config, stamp(10), stamp(11)).unwrap();
        // 60 s after lock, lock centiseconds 50.
        let reference_secs = u32::from_be_bytes([out[16], out[17], out[18], out[19]]);
        assert_eq!(reference_secs, 3_908_988_800 - 60);
        assert_eq!(&out[20..24], &[0x80, 0, 0, 0]);
        assert_eq!(&out[24..32], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(&out[32..36], &10u32.to_be_bytes());
        assert_eq!(&out[40..44], &11u32.to_be_bytes());
        assert_eq!(&out[44..48], &[0xAB, 0xCD, 0, 0]);
    }

    #[test]
    fn response_decodes_with_packet_codec() {
        let config = ServerConfig::default();
        let out = build_response(&request(), &snapshot(), &config, stamp(10), stamp(11)).unwrap();
        let packet: protocol::Packet = (&out[..]).read_bytes().unwrap();
        assert_eq!(packet.mode, protocol::Mode::Server);
        assert_eq!(packet.version, protocol::Version::V3);
        assert_eq!(
            packet.reference_id,
            protocol::ReferenceIdentifier::PrimarySource(protocol::PrimarySource::Gps)
        );
        assert_eq!(packet.receive_timestamp, stamp(10));
        assert_eq!(packet.transmit_timestamp, stamp(11));
    }

    #[test]
    fn poll_clamped_low() {
        let mut req = request();
        req.poll = -3;
        let out = build_response(&req, &snapshot(), &ServerConfig::default(), stamp(1), stamp(1)).unwrap();
        assert_eq!(out[2], 4);
    }

    #[test]
    fn leap_alarm_when_fix_is_old_or_time_invalid() {
        let config = ServerConfig::default();
        let old = TimeQualitySnapshot {
            fix_age_ms: 2001,
            ..snapshot()
        };
        let out = build_response(&request(), &old, &config, stamp(1), stamp(1)).unwrap();
        assert_eq!(out[0] >> 6, 3);

        let edge = TimeQualitySnapshot {
            fix_age_ms: 2000,
            ..snapshot()
        };
        let out = build_response(&request(), &edge, &config, stamp(1), stamp(1)).unwrap();
        assert_eq!(out[0] >> 6, 0);

        let invalid = TimeQualitySnapshot {
            time_valid: false,
            ..snapshot()
        };
        let out = build_response(&request(), &invalid, &config, stamp(1), stamp(1)).unwrap();
        assert_eq!(out[0] >> 6, 3);
    }

    #[test]
    fn configured_identity() {
        let config = ServerConfig::builder()
            .stratum(2)
            .reference_id("PPS")
            .build()
            .unwrap();
        let out = build_response(&request(), &snapshot(), &config, stamp(1), stamp(1)).unwrap();
        assert_eq!(out[1], 2);
        assert_eq!(&out[12..16], b"PPS\0");
    }

    #[test]
    fn kiss_of_death_shape() {
        for (code, text) in [
            (protocol::KissOfDeath::Deny, b"DENY"),
            (protocol::KissOfDeath::Rate, b"RATE"),
        ] {
            let out = build_kiss_of_death(code).unwrap();
            assert_eq!(out[0], 0xE4);
            assert_eq!(out[1], 0);
            assert_eq!(&out[12..16], text);
            assert!(out[16..48].iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn broadcast_packet() {
        let out = build_broadcast(&snapshot(), &ServerConfig::default(), stamp(42)).unwrap();
        assert_eq!(out[0] & 0x07, 5);
        assert_eq!((out[0] >> 3) & 0x07, 4);
        assert_eq!(out[1], 1);
        assert_eq!(out[2], 6);
        assert!(out[24..32].iter().all(|&b| b == 0));
        assert_eq!(&out[40..44], &42u32.to_be_bytes());
    }
}
