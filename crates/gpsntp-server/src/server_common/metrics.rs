// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Lock-free server metrics using atomic counters.
//!
//! All counters use relaxed ordering for maximum performance on the hot path.
//! Consumers that need a consistent snapshot should accept that individual
//! values are approximate when read concurrently.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Number of NTP version histogram buckets: v1 to v4 plus one for anything else.
pub const VERSION_BUCKETS: usize = 5;

/// Number of stratum histogram buckets (0 to 16).
pub const STRATUM_BUCKETS: usize = 17;

const NEVER: u64 = u64::MAX;

/// Runtime server metrics, updated by the engine and readable from any thread.
///
/// Share it by wrapping in `Arc` and passing to the engine or server builder.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use gpsntp_server::server_common::ServerMetrics;
///
/// let metrics = Arc::new(ServerMetrics::new());
/// let snap = metrics.snapshot();
/// assert_eq!(snap.requests_received, 0);
/// assert!(!snap.currently_serving);
/// ```
#[derive(Debug)]
pub struct ServerMetrics {
    epoch: Instant,
    requests_received: AtomicU64,
    valid_responses: AtomicU64,
    invalid_requests: AtomicU64,
    rate_limited: AtomicU64,
    kod_sent: AtomicU64,
    quality_dropped: AtomicU64,
    broadcasts_sent: AtomicU64,
    send_errors: AtomicU64,
    unique_clients: AtomicU64,
    last_request_ms: AtomicU64,
    // f64 bits, microseconds.
    avg_response_us: AtomicU64,
    peak_response_us: AtomicU64,
    versions: [AtomicU64; VERSION_BUCKETS],
    strata: [AtomicU64; STRATUM_BUCKETS],
    currently_serving: AtomicBool,
    serving_start_ms: AtomicU64,
    last_serving_stop_ms: AtomicU64,
}

impl ServerMetrics {
    /// Create a new metrics instance with all counters at zero.
    pub fn new() -> Self {
        ServerMetrics {
            epoch: Instant::now(),
            requests_received: AtomicU64::new(0),
            valid_responses: AtomicU64::new(0),
            invalid_requests: AtomicU64::new(0),
            rate_limited: AtomicU64::new(0),
            kod_sent: AtomicU64::new(0),
            quality_dropped: AtomicU64::new(0),
            broadcasts_sent: AtomicU64::new(0),
            send_errors: AtomicU64::new(0),
            unique_clients: AtomicU64::new(0),
            last_request_ms: AtomicU64::new(NEVER),
            avg_response_us: AtomicU64::new(0f64.to_bits()),
            peak_response_us: AtomicU64::new(0),
            versions: Default::default(),
            strata: Default::default(),
            currently_serving: AtomicBool::new(false),
            serving_start_ms: AtomicU64::new(NEVER),
            last_serving_stop_ms: AtomicU64::new(NEVER),
        }
    }

    /// Return a point-in-time snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let since = |cell: &AtomicU64| match cell.load(Ordering::Relaxed) {
            NEVER => None,
            ms => Some(Duration::from_millis(ms)),
        };
        MetricsSnapshot {
            requests_received: self.requests_received.load(Ordering::Relaxed),
            valid_responses: self.valid_responses.load(Ordering::Relaxed),
            invalid_requests: self.invalid_requests.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            kod_sent: self.kod_sent.load(Ordering::Relaxed),
            quality_dropped: self.quality_dropped.load(Ordering::Relaxed),
            broadcasts_sent: self.broadcasts_sent.load(Ordering::Relaxed),
            send_errors: self.send_errors.load(Ordering::Relaxed),
            unique_clients: self.unique_clients.load(Ordering::Relaxed),
            last_request: since(&self.last_request_ms),
            avg_response_us: f64::from_bits(self.avg_response_us.load(Ordering::Relaxed)),
            peak_response_us: self.peak_response_us.load(Ordering::Relaxed),
            versions: std::array::from_fn(|i| self.versions[i].load(Ordering::Relaxed)),
            strata: std::array::from_fn(|i| self.strata[i].load(Ordering::Relaxed)),
            currently_serving: self.currently_serving.load(Ordering::Relaxed),
            serving_since: since(&self.serving_start_ms),
            last_serving_stop: since(&self.last_serving_stop_ms),
        }
    }

    /// Zero every counter, timing, and histogram.
    ///
    /// The tracked client count and the serving state describe the present
    /// rather than history, so they are kept.
    pub fn reset(&self) {
        for counter in [
            &self.requests_received,
            &self.valid_responses,
            &self.invalid_requests,
            &self.rate_limited,
            &self.kod_sent,
            &self.quality_dropped,
            &self.broadcasts_sent,
            &self.send_errors,
            &self.peak_response_us,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        for bucket in self.versions.iter().chain(self.strata.iter()) {
            bucket.store(0, Ordering::Relaxed);
        }
        self.avg_response_us.store(0f64.to_bits(), Ordering::Relaxed);
        self.last_request_ms.store(NEVER, Ordering::Relaxed);
    }

    fn millis_since_epoch(&self, now: Instant) -> u64 {
        let ms = now.saturating_duration_since(self.epoch).as_millis();
        u64::try_from(ms).unwrap_or(NEVER - 1)
    }

    #[inline]
    pub(crate) fn inc_requests_received(&self, now: Instant) {
        self.requests_received.fetch_add(1, Ordering::Relaxed);
        self.last_request_ms
            .store(self.millis_since_epoch(now), Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn inc_invalid_requests(&self) {
        self.invalid_requests.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn inc_rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn inc_kod_sent(&self) {
        self.kod_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn inc_quality_dropped(&self) {
        self.quality_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn inc_broadcasts_sent(&self) {
        self.broadcasts_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn inc_send_errors(&self) {
        self.send_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn set_unique_clients(&self, count: usize) {
        self.unique_clients.store(count as u64, Ordering::Relaxed);
    }

    /// Count a normal response and fold its service time and header fields
    /// into the running statistics.
    pub(crate) fn record_response(&self, elapsed: Duration, version: u8, client_stratum: u8) {
        self.valid_responses.fetch_add(1, Ordering::Relaxed);

        let us = elapsed.as_secs_f64() * 1e6;
        let prev = f64::from_bits(self.avg_response_us.load(Ordering::Relaxed));
        let avg = if prev == 0.0 { us } else { prev * 0.9 + us * 0.1 };
        self.avg_response_us.store(avg.to_bits(), Ordering::Relaxed);
        let us_whole = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.peak_response_us.fetch_max(us_whole, Ordering::Relaxed);

        let version_bucket = match version {
            1..=4 => usize::from(version) - 1,
            _ => VERSION_BUCKETS - 1,
        };
        self.versions[version_bucket].fetch_add(1, Ordering::Relaxed);
        if let Some(bucket) = self.strata.get(usize::from(client_stratum)) {
            bucket.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record the serving state. Returns true if it changed.
    pub(crate) fn set_serving(&self, serving: bool, now: Instant) -> bool {
        let was = self.currently_serving.swap(serving, Ordering::Relaxed);
        if was == serving {
            return false;
        }
        let ms = self.millis_since_epoch(now);
        if serving {
            self.serving_start_ms.store(ms, Ordering::Relaxed);
        } else {
            self.last_serving_stop_ms.store(ms, Ordering::Relaxed);
        }
        true
    }
}

impl Default for ServerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of server metrics (non-atomic, copyable).
///
/// Durations are measured from when the [`ServerMetrics`] was created.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MetricsSnapshot {
    /// Datagrams that reached the engine, valid or not.
    pub requests_received: u64,
    /// Normal (mode 4) responses built.
    pub valid_responses: u64,
    /// Requests dropped for size, version, mode, or stratum.
    pub invalid_requests: u64,
    /// Requests refused by the global or per-client gate.
    pub rate_limited: u64,
    /// Kiss-o'-Death packets built.
    pub kod_sent: u64,
    /// Requests refused because GPS quality was insufficient.
    pub quality_dropped: u64,
    /// Broadcast packets built.
    pub broadcasts_sent: u64,
    /// Datagrams the driver failed to send.
    pub send_errors: u64,
    /// Clients currently tracked.
    pub unique_clients: u64,
    /// When the last datagram arrived.
    pub last_request: Option<Duration>,
    /// Smoothed time from receive to transmit stamp, in microseconds.
    pub avg_response_us: f64,
    /// Largest observed time from receive to transmit stamp, in microseconds.
    pub peak_response_us: u64,
    /// Responses by request version: v1, v2, v3, v4, other.
    pub versions: [u64; VERSION_BUCKETS],
    /// Responses by the stratum carried in the client's request.
    pub strata: [u64; STRATUM_BUCKETS],
    /// Whether the quality gate currently passes.
    pub currently_serving: bool,
    /// When serving last started.
    pub serving_since: Option<Duration>,
    /// When serving last stopped.
    pub last_serving_stop: Option<Duration>,
}
