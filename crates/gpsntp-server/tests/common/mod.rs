// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Shared test helpers for engine and server integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use gpsntp_server::protocol::{self, Packet, ReadBytes};
use gpsntp_server::time_source::{LockInstant, TimeQualitySnapshot};

/// A healthy fix: valid time, eight satellites, low HDOP, fresh.
pub(crate) fn good_fix() -> TimeQualitySnapshot {
    TimeQualitySnapshot {
        time_valid: true,
        unix_time: 1_700_000_000,
        centiseconds: 25,
        lock_acquired: LockInstant {
            monotonic_ms: 1_000,
            centiseconds: 50,
        },
        satellites: 8,
        hdop: 0.9,
        pdop: 1.4,
        fix_age_ms: 120,
        updated_at_ms: 61_000,
    }
}

/// Build a 48-byte client request with the given version byte and poll.
pub(crate) fn client_request(version: u8, poll: i8, transmit: protocol::TimestampFormat) -> [u8; 48] {
    let mut buf = [0u8; 48];
    buf[0] = (version << 3) | 3;
    buf[2] = poll as u8;
    buf[40..44].copy_from_slice(&transmit.seconds.to_be_bytes());
    buf[44..48].copy_from_slice(&transmit.fraction.to_be_bytes());
    buf
}

/// A well-formed NTPv4 request with a recognisable transmit timestamp.
pub(crate) fn build_client_packet() -> [u8; 48] {
    client_request(
        4,
        6,
        protocol::TimestampFormat {
            seconds: 0xE000_0000,
            fraction: 0x1234_5678,
        },
    )
}

/// A client address on the documentation network.
pub(crate) fn client_addr(last: u8) -> SocketAddr {
    SocketAddr::from(([192, 0, 2, last], 40_000 + last as u16))
}

/// Parse a response buffer into a Packet.
pub(crate) fn parse_response(buf: &[u8]) -> Packet {
    let mut reader = buf;
    reader.read_bytes().expect("failed to parse response")
}

/// Send a raw UDP packet to `addr` and receive the response with a timeout.
///
/// Returns `None` if the server doesn't respond within the timeout.
#[cfg(feature = "tokio")]
pub(crate) async fn send_receive_raw(
    addr: SocketAddr,
    packet: &[u8],
    timeout: Duration,
) -> Option<Vec<u8>> {
    let sock = tokio::net::UdpSocket::bind("127.0.0.1:0")
        .await
        .expect("bind failed");
    sock.send_to(packet, addr).await.expect("send failed");

    let mut buf = vec![0u8; 2048];
    match tokio::time::timeout(timeout, sock.recv_from(&mut buf)).await {
        Ok(Ok((len, _))) => {
            buf.truncate(len);
            Some(buf)
        }
        _ => None,
    }
}

/// Spawn a test server on an ephemeral loopback port and return its address.
///
/// The server runs in a background tokio task and stops when the runtime is
/// dropped.
#[cfg(feature = "tokio")]
pub(crate) async fn spawn_test_server<S>(
    builder: gpsntp_server::server::NtpServerBuilder<S>,
) -> SocketAddr
where
    S: gpsntp_server::time_source::TimeSource + Send + 'static,
{
    let server = builder
        .listen("127.0.0.1:0")
        .build()
        .await
        .expect("failed to bind test server");
    let addr = server.local_addr().expect("failed to get local addr");
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}
