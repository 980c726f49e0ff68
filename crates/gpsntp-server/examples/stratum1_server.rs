// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

// Stratum 1 NTP Server fed by a simulated GPS receiver
//
// A background thread stands in for the GPS subsystem: once per second it
// publishes a fresh snapshot built from the system clock. Every fifth minute
// it drops to three satellites so the quality gate and DENY replies can be
// observed.
//
// Usage:
//   cargo run -p gpsntp-server --example stratum1_server [LISTEN_ADDR]
//
// LISTEN_ADDR defaults to 0.0.0.0:1123 so the example runs without root.
//
// Testing:
//   ntpdate -q -p 1 -u 127.0.0.1   (with LISTEN_ADDR on port 123)
//   sntp 127.0.0.1

use std::io;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use gpsntp_server::server::NtpServer;
use gpsntp_server::server_common::{BroadcastConfig, ServerConfig};
use gpsntp_server::time_source::{LockInstant, SharedTimeSource, TimeQualitySnapshot};

fn simulate_gps(source: SharedTimeSource) {
    let boot = Instant::now();
    let lock_acquired = LockInstant {
        monotonic_ms: 0,
        centiseconds: 0,
    };
    loop {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let minute = now.as_secs() / 60;
        source.publish(TimeQualitySnapshot {
            time_valid: true,
            unix_time: now.as_secs() as u32,
            centiseconds: (now.subsec_millis() / 10) as u8,
            lock_acquired,
            satellites: if minute % 5 == 4 { 3 } else { 9 },
            hdop: 0.8,
            pdop: 1.3,
            fix_age_ms: 40,
            updated_at_ms: boot.elapsed().as_millis() as u64,
        });
        thread::sleep(Duration::from_secs(1));
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let listen = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "0.0.0.0:1123".to_string());

    let gps = SharedTimeSource::default();
    let feed = gps.clone();
    thread::spawn(move || simulate_gps(feed));

    let config = ServerConfig::builder()
        .stratum(1)
        .reference_id("GPS")
        .min_client_interval(Duration::from_secs(1))
        .broadcast(BroadcastConfig {
            enabled: false,
            ..BroadcastConfig::default()
        })
        .build()?;

    let server = NtpServer::builder(gps)
        .listen(listen)
        .config(config)
        .build()
        .await?;

    println!("Stratum 1 NTP server listening on {}", server.local_addr()?);
    println!("Serving status: {}", server.status());

    let metrics = server.metrics();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(30));
        loop {
            ticker.tick().await;
            let m = metrics.snapshot();
            println!(
                "requests={} served={} kod={} rate_limited={} invalid={} clients={} avg={:.1}us",
                m.requests_received,
                m.valid_responses,
                m.kod_sent,
                m.rate_limited,
                m.invalid_requests,
                m.unique_clients,
                m.avg_response_us,
            );
        }
    });

    server.run().await
}
