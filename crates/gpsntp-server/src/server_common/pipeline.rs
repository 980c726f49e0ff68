// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use super::config::{ConfigHandle, ServerConfig};
use super::metrics::ServerMetrics;
use super::observer::{LogObserver, RequestOutcome, ServerObserver};
use super::quality::{ServingStatus, quality_passes};
use super::rate_limit::{ClientTable, GlobalRateWindow, RateLimitResult};
use super::response::{build_broadcast, build_kiss_of_death, build_response};
use super::timestamp::TimestampEngine;
use super::validation::parse_request;
use crate::broadcast::BroadcastSchedule;
use crate::error::ProtocolError;
use crate::protocol::{self, ConstPackedSizeBytes};
use crate::time_source::TimeSource;

/// The complete result of handling one datagram.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleResult {
    /// Send this normal response to the client.
    Response([u8; protocol::Packet::PACKED_SIZE_BYTES]),
    /// Send this Kiss-o'-Death packet to the client.
    KissOfDeath(protocol::KissOfDeath, [u8; protocol::Packet::PACKED_SIZE_BYTES]),
    /// Send nothing.
    Drop,
}

impl HandleResult {
    /// The bytes to send back, if any.
    pub fn packet(&self) -> Option<&[u8; protocol::Packet::PACKED_SIZE_BYTES]> {
        match self {
            HandleResult::Response(buf) | HandleResult::KissOfDeath(_, buf) => Some(buf),
            HandleResult::Drop => None,
        }
    }
}

/// A broadcast packet and where to send it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BroadcastPacket {
    /// Destination address.
    pub destination: SocketAddr,
    /// Serialized mode 5 packet.
    pub packet: [u8; protocol::Packet::PACKED_SIZE_BYTES],
}

/// Whether the engine is answering requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    /// Disabled; every datagram is ignored.
    Idle,
    /// Enabled and processing datagrams.
    Listening,
}

/// The request-handling state machine (pure logic, no I/O).
///
/// Drivers feed it datagrams through [`handle_request`](Self::handle_request)
/// and call [`tick`](Self::tick) periodically for broadcast, client sweeping,
/// and serving-state tracking. Time is always passed in, never read, except
/// for the transmit stamp which is taken as late as possible.
pub struct NtpEngine<S> {
    config: ServerConfig,
    handle: ConfigHandle,
    seen_generation: u64,
    source: S,
    timestamps: TimestampEngine,
    global: GlobalRateWindow,
    clients: ClientTable,
    broadcast: BroadcastSchedule,
    metrics: Arc<ServerMetrics>,
    observer: Box<dyn ServerObserver>,
}

impl<S: TimeSource> NtpEngine<S> {
    /// Create an engine after validating `config`.
    pub fn new(config: ServerConfig, source: S) -> io::Result<Self> {
        config.validate()?;
        let now = Instant::now();
        let capacity = config.rate_limit.max_clients;
        Ok(NtpEngine {
            handle: ConfigHandle::new(config.clone()),
            config,
            seen_generation: 0,
            source,
            timestamps: TimestampEngine::new(),
            global: GlobalRateWindow::new(now),
            clients: ClientTable::new(capacity, now),
            broadcast: BroadcastSchedule::default(),
            metrics: Arc::new(ServerMetrics::new()),
            observer: Box::new(LogObserver),
        })
    }

    /// Share an externally owned metrics instance.
    pub fn with_metrics(mut self, metrics: Arc<ServerMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Replace the default [`LogObserver`].
    pub fn with_observer(mut self, observer: impl ServerObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Handle one inbound datagram from `src`, read at `received_at`.
    pub fn handle_request(&mut self, buf: &[u8], src: SocketAddr, received_at: Instant) -> HandleResult {
        self.sync_config();
        if !self.config.enabled {
            return HandleResult::Drop;
        }
        self.metrics.inc_requests_received(received_at);

        if buf.len() != protocol::Packet::PACKED_SIZE_BYTES {
            return self.drop_invalid(src, ProtocolError::WrongSize { received: buf.len() });
        }

        if self
            .global
            .check(received_at, self.config.rate_limit.global_max_per_second)
            == RateLimitResult::RateExceeded
        {
            self.metrics.inc_rate_limited();
            self.observer.on_request(src, &RequestOutcome::GlobalRateLimited);
            return HandleResult::Drop;
        }

        let request = match parse_request(buf) {
            Ok(request) => request,
            Err(e) => return self.drop_invalid(src, e),
        };

        let snapshot = self.source.snapshot();
        let receive = self.timestamps.micros_to_ntp(&snapshot, received_at);

        if !quality_passes(&snapshot, &self.config.quality) {
            self.metrics.inc_quality_dropped();
            return self.kiss_of_death(src, protocol::KissOfDeath::Deny, RequestOutcome::QualityDenied);
        }

        if self.config.rate_limit.enabled {
            let verdict = self.clients.check(
                src.ip(),
                received_at,
                request.poll,
                request.version.value(),
                &self.config.rate_limit,
            );
            self.metrics.set_unique_clients(self.clients.len());
            if verdict == RateLimitResult::RateExceeded {
                self.metrics.inc_rate_limited();
                return self.kiss_of_death(src, protocol::KissOfDeath::Rate, RequestOutcome::ClientRateLimited);
            }
        }

        let transmit_at = Instant::now().max(received_at);
        let transmit = self.timestamps.micros_to_ntp(&snapshot, transmit_at);
        let response = match build_response(&request, &snapshot, &self.config, receive, transmit) {
            Ok(response) => response,
            Err(e) => return self.encode_failed(e),
        };

        self.metrics.record_response(
            transmit_at.saturating_duration_since(received_at),
            request.version.value(),
            request.stratum.0,
        );
        self.observer.on_request(src, &RequestOutcome::Served);
        HandleResult::Response(response)
    }

    fn drop_invalid(&mut self, src: SocketAddr, err: ProtocolError) -> HandleResult {
        self.metrics.inc_invalid_requests();
        self.observer.on_request(src, &RequestOutcome::Invalid(err));
        HandleResult::Drop
    }

    fn kiss_of_death(
        &mut self,
        src: SocketAddr,
        code: protocol::KissOfDeath,
        outcome: RequestOutcome,
    ) -> HandleResult {
        let packet = match build_kiss_of_death(code) {
            Ok(packet) => packet,
            Err(e) => return self.encode_failed(e),
        };
        self.metrics.inc_kod_sent();
        self.observer.on_request(src, &outcome);
        HandleResult::KissOfDeath(code, packet)
    }

    fn encode_failed(&self, err: io::Error) -> HandleResult {
        warn!("failed to encode NTP packet: {err}");
        self.metrics.inc_send_errors();
        HandleResult::Drop
    }

    /// Run the periodic duties at `now`: serving-state tracking, the idle
    /// client sweep, and automatic broadcast.
    ///
    /// Returns a broadcast packet when one is due and the quality gate passes.
    pub fn tick(&mut self, now: Instant) -> Option<BroadcastPacket> {
        self.sync_config();
        let snapshot = self.source.snapshot();
        let passes = self.config.enabled && quality_passes(&snapshot, &self.config.quality);
        if self.metrics.set_serving(passes, now) {
            let status = self.status();
            self.observer.on_serving_changed(passes, &status);
        }
        if !self.config.enabled {
            return None;
        }

        if self.clients.sweep_if_due(now, &self.config.rate_limit) > 0 {
            self.metrics.set_unique_clients(self.clients.len());
        }

        if passes && self.broadcast.is_due(&self.config.broadcast, now) {
            return self.emit_broadcast(now);
        }
        None
    }

    /// Build a broadcast packet immediately, regardless of the interval.
    ///
    /// Returns `None` if the engine or broadcast mode is disabled, or the
    /// quality gate fails.
    pub fn send_broadcast(&mut self, now: Instant) -> Option<BroadcastPacket> {
        self.sync_config();
        if !self.config.enabled || !self.config.broadcast.enabled {
            return None;
        }
        if !quality_passes(&self.source.snapshot(), &self.config.quality) {
            debug!("broadcast skipped, GPS quality insufficient");
            return None;
        }
        self.emit_broadcast(now)
    }

    fn emit_broadcast(&mut self, now: Instant) -> Option<BroadcastPacket> {
        let snapshot = self.source.snapshot();
        let transmit = self.timestamps.micros_to_ntp(&snapshot, now);
        let packet = match build_broadcast(&snapshot, &self.config, transmit) {
            Ok(packet) => packet,
            Err(e) => {
                warn!("failed to encode NTP broadcast: {e}");
                self.metrics.inc_send_errors();
                return None;
            }
        };
        let destination = self.config.broadcast.destination_for(self.config.port);
        self.broadcast.mark_sent(now);
        self.metrics.inc_broadcasts_sent();
        info!("NTP broadcast sent to {destination}");
        Some(BroadcastPacket {
            destination,
            packet,
        })
    }

    /// Replace the configuration. Invalid configurations are rejected and
    /// the running one is kept.
    pub fn apply_config(&mut self, config: ServerConfig) -> io::Result<()> {
        self.handle.update(|c| *c = config)?;
        self.sync_config();
        Ok(())
    }

    /// Replace the per-client interval and the global ceiling.
    pub fn set_rate_limits(&mut self, min_interval: Duration, global_max_per_second: u32) -> io::Result<()> {
        self.handle.set_rate_limits(min_interval, global_max_per_second)?;
        self.sync_config();
        info!(
            "rate limits set: {} ms per client, {} requests/s global",
            min_interval.as_millis(),
            global_max_per_second
        );
        Ok(())
    }

    /// Enable or disable the engine.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.handle.set_enabled(enabled);
        self.sync_config();
    }

    fn sync_config(&mut self) {
        let Some(config) = self.handle.take_update(&mut self.seen_generation) else {
            return;
        };
        if config.rate_limit.max_clients != self.clients.capacity() {
            self.clients.set_capacity(config.rate_limit.max_clients);
            self.metrics.set_unique_clients(self.clients.len());
        }
        if config.enabled != self.config.enabled {
            info!(
                "NTP server {}",
                if config.enabled { "enabled" } else { "disabled" }
            );
        }
        if changed_beyond_enabled(&self.config, &config) {
            info!(
                "NTP configuration updated: stratum {}, reference ID {}",
                config.stratum.0,
                protocol::ReferenceIdentifier::from_bytes_with_stratum(config.reference_id, config.stratum)
            );
        }
        self.config = config;
    }

    /// A handle for replacing the configuration from another task.
    ///
    /// Changes take effect at the start of the engine's next call.
    pub fn config_handle(&self) -> ConfigHandle {
        self.handle.clone()
    }

    /// The configuration in effect.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Current state.
    pub fn state(&self) -> EngineState {
        if self.config.enabled {
            EngineState::Listening
        } else {
            EngineState::Idle
        }
    }

    /// Human-readable serving status for operators.
    pub fn status(&self) -> ServingStatus {
        ServingStatus::evaluate(
            self.config.enabled,
            &self.source.snapshot(),
            &self.config.quality,
            self.config.stratum.0,
        )
    }

    /// Shared metrics.
    pub fn metrics(&self) -> Arc<ServerMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Tracked clients.
    pub fn clients(&self) -> &ClientTable {
        &self.clients
    }

    /// The time source the engine reads.
    pub fn time_source(&self) -> &S {
        &self.source
    }
}

fn changed_beyond_enabled(old: &ServerConfig, new: &ServerConfig) -> bool {
    let mut old = old.clone();
    old.enabled = new.enabled;
    old != *new
}
