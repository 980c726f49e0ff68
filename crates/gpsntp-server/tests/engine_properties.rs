// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! End-to-end properties of the request pipeline, driven with injected time.

mod common;

use std::net::IpAddr;
use std::time::{Duration, Instant};

use gpsntp_server::protocol::{KissOfDeath, TimestampFormat};
use gpsntp_server::server_common::{
    HandleResult, NtpEngine, ServerConfig, TimestampEngine, advance, build_kiss_of_death,
    parse_request,
};
use gpsntp_server::time_source::{SharedTimeSource, TimeQualitySnapshot};
use proptest::prelude::*;

use common::{build_client_packet, client_addr, client_request, good_fix};

fn engine_with(config: ServerConfig, fix: TimeQualitySnapshot) -> NtpEngine<SharedTimeSource> {
    NtpEngine::new(config, SharedTimeSource::new(fix)).unwrap()
}

proptest! {
    #[test]
    fn parse_accepts_exactly_client_requests(bytes in proptest::collection::vec(any::<u8>(), 48)) {
        let version = (bytes[0] >> 3) & 0x07;
        let mode = bytes[0] & 0x07;
        let stratum = bytes[1];
        let expected = (version == 3 || version == 4) && mode == 3 && stratum <= 16;
        prop_assert_eq!(parse_request(&bytes).is_ok(), expected);
    }

    #[test]
    fn parse_rejects_every_other_length(len in 0usize..256) {
        prop_assume!(len != 48);
        let mut bytes = vec![0u8; len];
        if let Some(first) = bytes.first_mut() {
            *first = 0x23;
        }
        prop_assert!(parse_request(&bytes).is_err());
    }

    #[test]
    fn response_originate_is_request_transmit(seconds in any::<u32>(), fraction in any::<u32>()) {
        let mut engine = engine_with(ServerConfig::default(), good_fix());
        let request = client_request(4, 6, TimestampFormat { seconds, fraction });
        let result = engine.handle_request(&request, client_addr(1), Instant::now());
        let HandleResult::Response(response) = result else {
            return Err(TestCaseError::fail("expected a response"));
        };
        prop_assert_eq!(&response[24..32], &request[40..48]);
    }

    #[test]
    fn kiss_of_death_shape(deny in any::<bool>()) {
        let code = if deny { KissOfDeath::Deny } else { KissOfDeath::Rate };
        let packet = build_kiss_of_death(code).unwrap();
        let refid = code.bytes();
        prop_assert_eq!(packet[0], 0xE4);
        prop_assert_eq!(packet[1], 0);
        prop_assert_eq!(&packet[12..16], &refid[..]);
        prop_assert!(packet[16..48].iter().all(|&b| b == 0));
    }

    #[test]
    fn timestamps_never_decrease_between_updates(
        offsets in proptest::collection::vec(0u64..2_000_000, 1..20),
    ) {
        let fix = good_fix();
        let mut engine = TimestampEngine::new();
        let base = Instant::now();
        let mut sorted = offsets;
        sorted.sort_unstable();
        let mut last = engine.micros_to_ntp(&fix, base);
        for micros in sorted {
            let ts = engine.micros_to_ntp(&fix, base + Duration::from_micros(micros));
            prop_assert!(ts >= last);
            last = ts;
        }
    }
}

#[test]
fn fraction_overflow_carries_exactly_one_second() {
    let base = TimestampFormat {
        seconds: 1000,
        fraction: u32::MAX - 100,
    };
    let carried = advance(base, Duration::from_micros(1));
    assert_eq!(carried.seconds, 1001);
    assert!(carried.fraction < 5_000);

    let unchanged = advance(base, Duration::ZERO);
    assert_eq!(unchanged, base);
}

#[test]
fn repeated_reads_at_one_instant_are_identical() {
    let fix = good_fix();
    let mut engine = TimestampEngine::new();
    let now = Instant::now();
    let first = engine.micros_to_ntp(&fix, now);
    let second = engine.micros_to_ntp(&fix, now);
    assert_eq!(first, second);
    assert_eq!(first, TimestampEngine::to_ntp_time(&fix));
}

#[test]
fn per_client_interval_is_enforced() {
    let mut engine = engine_with(ServerConfig::default(), good_fix());
    let client = client_addr(7);
    let t0 = Instant::now();

    let first = engine.handle_request(&build_client_packet(), client, t0);
    assert!(matches!(first, HandleResult::Response(_)));

    let second = engine.handle_request(&build_client_packet(), client, t0 + Duration::from_millis(500));
    assert!(matches!(second, HandleResult::KissOfDeath(KissOfDeath::Rate, _)));

    let third = engine.handle_request(&build_client_packet(), client, t0 + Duration::from_millis(1500));
    assert!(matches!(third, HandleResult::Response(_)));

    let entry = engine.clients().get(&client.ip()).unwrap();
    assert_eq!(entry.aggressive_count(), 1);
    assert_eq!(entry.request_count(), 2);
    assert!(!entry.is_aggressive());

    let snap = engine.metrics().snapshot();
    assert_eq!(snap.valid_responses, 2);
    assert_eq!(snap.rate_limited, 1);
    assert_eq!(snap.kod_sent, 1);
}

#[test]
fn global_ceiling_drops_without_reply() {
    let config = ServerConfig::builder()
        .global_max_per_second(5)
        .build()
        .unwrap();
    let mut engine = engine_with(config, good_fix());
    let now = Instant::now();

    for i in 0..5 {
        let result = engine.handle_request(&build_client_packet(), client_addr(i), now);
        assert!(matches!(result, HandleResult::Response(_)), "request {i}");
    }
    let sixth = engine.handle_request(&build_client_packet(), client_addr(5), now);
    assert_eq!(sixth, HandleResult::Drop);

    let snap = engine.metrics().snapshot();
    assert_eq!(snap.requests_received, 6);
    assert_eq!(snap.valid_responses, 5);
    assert_eq!(snap.rate_limited, 1);
    assert_eq!(snap.kod_sent, 0);

    let later = engine.handle_request(
        &build_client_packet(),
        client_addr(6),
        now + Duration::from_millis(1100),
    );
    assert!(matches!(later, HandleResult::Response(_)));
}

#[test]
fn too_few_satellites_denies_everyone() {
    let fix = TimeQualitySnapshot {
        satellites: 3,
        ..good_fix()
    };
    let mut engine = engine_with(ServerConfig::default(), fix);
    let now = Instant::now();

    for i in 0..10 {
        let result = engine.handle_request(&build_client_packet(), client_addr(i), now);
        match result {
            HandleResult::KissOfDeath(KissOfDeath::Deny, packet) => {
                assert_eq!(&packet[12..16], b"DENY");
            }
            other => panic!("expected DENY, got {other:?}"),
        }
    }

    let snap = engine.metrics().snapshot();
    assert_eq!(snap.valid_responses, 0);
    assert_eq!(snap.quality_dropped, 10);
    assert_eq!(snap.kod_sent, 10);
    // Denied clients never reach the client table.
    assert!(engine.clients().is_empty());
}

#[test]
fn full_table_evicts_least_recently_seen() {
    let config = ServerConfig::builder().max_clients(3).build().unwrap();
    let mut engine = engine_with(config, good_fix());
    let t0 = Instant::now();

    for i in 1..=3u8 {
        let at = t0 + Duration::from_secs(u64::from(i));
        engine.handle_request(&build_client_packet(), client_addr(i), at);
    }
    // Client 1 refreshes, leaving client 2 as the oldest entry.
    engine.handle_request(&build_client_packet(), client_addr(1), t0 + Duration::from_secs(10));
    engine.handle_request(&build_client_packet(), client_addr(4), t0 + Duration::from_secs(11));

    let ips: Vec<IpAddr> = engine.clients().iter().map(|e| e.ip()).collect();
    assert_eq!(ips.len(), 3);
    assert!(ips.contains(&client_addr(1).ip()));
    assert!(!ips.contains(&client_addr(2).ip()));
    assert!(ips.contains(&client_addr(3).ip()));
    assert!(ips.contains(&client_addr(4).ip()));
    assert_eq!(engine.metrics().snapshot().unique_clients, 3);
}

#[test]
fn zero_transmit_timestamp_is_answered() {
    let mut engine = engine_with(ServerConfig::default(), good_fix());
    let request = client_request(4, 6, TimestampFormat::default());
    let result = engine.handle_request(&request, client_addr(9), Instant::now());
    let HandleResult::Response(response) = result else {
        panic!("expected a response, got {result:?}");
    };
    assert!(response[24..32].iter().all(|&b| b == 0));
}

#[test]
fn stale_fix_sets_leap_alarm_but_still_serves() {
    let fix = TimeQualitySnapshot {
        fix_age_ms: 3_000,
        ..good_fix()
    };
    let mut engine = engine_with(ServerConfig::default(), fix);
    let result = engine.handle_request(&build_client_packet(), client_addr(3), Instant::now());
    let HandleResult::Response(response) = result else {
        panic!("expected a response, got {result:?}");
    };
    assert_eq!(response[0] >> 6, 3);
}
