// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use std::net::IpAddr;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use super::config::RateLimitConfig;

const WINDOW: Duration = Duration::from_secs(1);

/// Result of a rate limit check.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum RateLimitResult {
    /// Request is within limits.
    Allow,
    /// Request exceeds the limit.
    RateExceeded,
}

/// Server-wide request ceiling over a coarse one-second window.
///
/// The window restarts when more than one second has elapsed since it began,
/// as observed by the caller's cadence; it is not aligned to wall-clock
/// seconds.
#[derive(Clone, Debug)]
pub struct GlobalRateWindow {
    count: u32,
    window_start: Instant,
    dropped_in_window: u32,
}

impl GlobalRateWindow {
    /// Start an empty window at `now`.
    pub fn new(now: Instant) -> Self {
        GlobalRateWindow {
            count: 0,
            window_start: now,
            dropped_in_window: 0,
        }
    }

    /// Admit or drop one request against a ceiling of `max_per_second`.
    pub(crate) fn check(&mut self, now: Instant, max_per_second: u32) -> RateLimitResult {
        if now.saturating_duration_since(self.window_start) > WINDOW {
            if self.dropped_in_window > 0 {
                warn!(
                    "global rate limit dropped {} requests in the last window",
                    self.dropped_in_window
                );
            }
            self.window_start = now;
            self.count = 0;
            self.dropped_in_window = 0;
        }

        if self.count >= max_per_second {
            self.dropped_in_window = self.dropped_in_window.saturating_add(1);
            return RateLimitResult::RateExceeded;
        }
        self.count += 1;
        RateLimitResult::Allow
    }

    /// Requests admitted in the current window.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Requests dropped in the current window.
    pub fn dropped_in_window(&self) -> u32 {
        self.dropped_in_window
    }
}

/// Per-client tracking state, keyed by IP address (not port).
#[derive(Clone, Debug)]
pub struct ClientEntry {
    ip: IpAddr,
    last_request: Instant,
    request_count: u32,
    last_poll: i8,
    avg_interval: Option<Duration>,
    aggressive_count: u32,
    aggressive: bool,
    rate_limited: bool,
    last_version: u8,
}

impl ClientEntry {
    fn new(ip: IpAddr, now: Instant, poll: i8, version: u8) -> Self {
        ClientEntry {
            ip,
            last_request: now,
            request_count: 1,
            last_poll: poll,
            avg_interval: None,
            aggressive_count: 0,
            aggressive: false,
            rate_limited: false,
            last_version: version,
        }
    }

    /// Client address.
    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    /// Instant of the last admitted request.
    pub fn last_request(&self) -> Instant {
        self.last_request
    }

    /// Admitted requests since the entry was created.
    pub fn request_count(&self) -> u32 {
        self.request_count
    }

    /// Poll exponent carried by the last admitted request.
    pub fn last_poll(&self) -> i8 {
        self.last_poll
    }

    /// Smoothed spacing of admitted requests, once two have been seen.
    pub fn avg_interval(&self) -> Option<Duration> {
        self.avg_interval
    }

    /// Requests rejected for arriving too soon.
    pub fn aggressive_count(&self) -> u32 {
        self.aggressive_count
    }

    /// Whether the client crossed the aggressiveness threshold.
    pub fn is_aggressive(&self) -> bool {
        self.aggressive
    }

    /// Whether the most recent request was rejected.
    pub fn is_rate_limited(&self) -> bool {
        self.rate_limited
    }

    /// NTP version of the last admitted request.
    pub fn last_version(&self) -> u8 {
        self.last_version
    }

    fn admit(&mut self, now: Instant, poll: i8, version: u8) {
        let interval = now.saturating_duration_since(self.last_request);
        // History weighted 3:1 against the new sample.
        self.avg_interval = Some(match self.avg_interval {
            None => interval,
            Some(avg) => (avg * 3 + interval) / 4,
        });
        self.request_count = self.request_count.saturating_add(1);
        self.last_poll = poll;
        self.last_version = version;
        self.last_request = now;
        self.rate_limited = false;
    }
}

/// Bounded client table with a linear scan.
///
/// When full, a new address replaces the entry with the smallest
/// `last_request`. Idle entries are removed by a periodic sweep that keeps the
/// order of the survivors.
#[derive(Debug)]
pub struct ClientTable {
    entries: Vec<ClientEntry>,
    capacity: usize,
    last_sweep: Instant,
}

impl ClientTable {
    /// Create an empty table holding at most `capacity` clients.
    pub fn new(capacity: usize, now: Instant) -> Self {
        ClientTable {
            entries: Vec::with_capacity(capacity),
            capacity,
            last_sweep: now,
        }
    }

    /// Run the per-client gate for a request from `ip` at `now`.
    ///
    /// The first request from an unseen address is always admitted. A
    /// rejected request does not move the client's `last_request`.
    pub(crate) fn check(
        &mut self,
        ip: IpAddr,
        now: Instant,
        poll: i8,
        version: u8,
        config: &RateLimitConfig,
    ) -> RateLimitResult {
        let Some(index) = self.entries.iter().position(|e| e.ip == ip) else {
            self.insert(ClientEntry::new(ip, now, poll, version));
            return RateLimitResult::Allow;
        };

        let entry = &mut self.entries[index];
        if now.saturating_duration_since(entry.last_request) < config.min_interval {
            entry.rate_limited = true;
            entry.aggressive_count = entry.aggressive_count.saturating_add(1);
            if entry.aggressive_count > config.aggressive_threshold && !entry.aggressive {
                entry.aggressive = true;
                warn!("client {ip} flagged as aggressive");
            }
            return RateLimitResult::RateExceeded;
        }

        entry.admit(now, poll, version);
        RateLimitResult::Allow
    }

    fn insert(&mut self, entry: ClientEntry) {
        if self.entries.len() >= self.capacity {
            if let Some(oldest) = self
                .entries
                .iter()
                .enumerate()
                .min_by_key(|(_, e)| e.last_request)
                .map(|(i, _)| i)
            {
                debug!("client table full, evicting {}", self.entries[oldest].ip);
                self.entries[oldest] = entry;
            }
            return;
        }
        self.entries.push(entry);
    }

    /// Remove clients idle for longer than `idle_timeout`. Returns how many
    /// were removed.
    pub fn sweep(&mut self, now: Instant, idle_timeout: Duration) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|e| now.saturating_duration_since(e.last_request) <= idle_timeout);
        self.last_sweep = now;
        let removed = before - self.entries.len();
        if removed > 0 {
            info!("removed {removed} idle clients");
        }
        removed
    }

    /// Sweep if the configured sweep period has elapsed.
    pub(crate) fn sweep_if_due(&mut self, now: Instant, config: &RateLimitConfig) -> usize {
        if now.saturating_duration_since(self.last_sweep) < config.sweep_interval {
            return 0;
        }
        self.sweep(now, config.client_idle_timeout)
    }

    /// Change the capacity, evicting the least recently seen clients if the
    /// table is now over it.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        while self.entries.len() > capacity {
            if let Some(oldest) = self
                .entries
                .iter()
                .enumerate()
                .min_by_key(|(_, e)| e.last_request)
                .map(|(i, _)| i)
            {
                self.entries.remove(oldest);
            }
        }
    }

    /// Look up a client.
    pub fn get(&self, ip: &IpAddr) -> Option<&ClientEntry> {
        self.entries.iter().find(|e| e.ip == *ip)
    }

    /// Iterate over tracked clients in table order.
    pub fn iter(&self) -> impl Iterator<Item = &ClientEntry> {
        self.entries.iter()
    }

    /// Number of tracked clients.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no clients are tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of tracked clients.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
