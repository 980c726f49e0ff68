// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! NTP broadcast mode (mode 5) scheduling and destinations.
//!
//! When enabled, the engine periodically emits an unsolicited server packet
//! with mode 5 to a broadcast address. A packet goes out only while the GPS
//! quality gate passes, so a receiver never hears broadcast time from a bad
//! fix.
//!
//! # Security Warning
//!
//! Broadcast mode provides no authentication and is vulnerable to spoofing.
//! Use it only on trusted networks.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::{Duration, Instant};

/// Shortest interval accepted between broadcast packets.
pub const MIN_BROADCAST_INTERVAL: Duration = Duration::from_secs(10);

/// Poll exponent advertised in broadcast packets (64 s).
pub const BROADCAST_POLL: i8 = 6;

/// Configuration for broadcast mode transmission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BroadcastConfig {
    /// Whether broadcast mode is available at all.
    pub enabled: bool,
    /// Whether the engine's tick sends broadcasts on its own. When false,
    /// packets only go out through an explicit send.
    pub auto_broadcast: bool,
    /// Interval between broadcast packets. Must be at least
    /// [`MIN_BROADCAST_INTERVAL`].
    pub interval: Duration,
    /// Destination for broadcast packets.
    ///
    /// `None` means the limited broadcast address `255.255.255.255` on the
    /// server's port.
    pub destination: Option<SocketAddr>,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        BroadcastConfig {
            enabled: false,
            auto_broadcast: true,
            interval: Duration::from_secs(64),
            destination: None,
        }
    }
}

impl BroadcastConfig {
    /// Resolve where broadcast packets are sent for a server on `port`.
    pub fn destination_for(&self, port: u16) -> SocketAddr {
        self.destination
            .unwrap_or(SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::BROADCAST, port)))
    }
}

/// Tracks when the last broadcast went out.
#[derive(Clone, Debug, Default)]
pub(crate) struct BroadcastSchedule {
    last_sent: Option<Instant>,
}

impl BroadcastSchedule {
    /// Whether an automatic broadcast is due at `now`.
    ///
    /// Quality is checked separately by the caller.
    pub(crate) fn is_due(&self, config: &BroadcastConfig, now: Instant) -> bool {
        if !config.enabled || !config.auto_broadcast {
            return false;
        }
        match self.last_sent {
            None => true,
            Some(last) => now.saturating_duration_since(last) > config.interval,
        }
    }

    pub(crate) fn mark_sent(&mut self, now: Instant) {
        self.last_sent = Some(now);
    }

    pub(crate) fn last_sent(&self) -> Option<Instant> {
        self.last_sent
    }
}
