// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! NTP server using the Tokio runtime.
//!
//! Runs the same [`NtpEngine`] as the poll-cycle service on a tokio
//! `UdpSocket`. A single task waits on both the socket and a tick timer, so
//! broadcasts and client sweeps happen even when no requests arrive.
//!
//! # Examples
//!
//! ```no_run
//! # async fn example() -> std::io::Result<()> {
//! use gpsntp_server::server::NtpServer;
//! use gpsntp_server::server_common::ServerConfig;
//! use gpsntp_server::time_source::SharedTimeSource;
//!
//! let gps = SharedTimeSource::default();
//! let server = NtpServer::builder(gps.clone())
//!     .listen("0.0.0.0:123")
//!     .config(ServerConfig::builder().stratum(1).reference_id("GPS").build()?)
//!     .build()
//!     .await?;
//!
//! server.run().await
//! # }
//! ```

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::net::UdpSocket;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::server_common::{
    ConfigHandle, NtpEngine, ServerConfig, ServerMetrics, ServerObserver, ServingStatus,
};
use crate::service::RECV_BUFFER_SIZE;
use crate::time_source::TimeSource;

/// Default period of the engine's periodic duties.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Builder for configuring and creating an [`NtpServer`].
pub struct NtpServerBuilder<S> {
    source: S,
    listen_addr: Option<String>,
    config: ServerConfig,
    metrics: Option<Arc<ServerMetrics>>,
    observer: Option<Box<dyn ServerObserver>>,
    tick_interval: Duration,
}

impl<S: TimeSource> NtpServerBuilder<S> {
    fn new(source: S) -> Self {
        NtpServerBuilder {
            source,
            listen_addr: None,
            config: ServerConfig::default(),
            metrics: None,
            observer: None,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    /// Set the listen address. Defaults to `0.0.0.0` on the configured port.
    pub fn listen(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = Some(addr.into());
        self
    }

    /// Set the engine configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach a metrics instance shared with other tasks.
    pub fn metrics(mut self, metrics: Arc<ServerMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Replace the default logging observer.
    pub fn observer(mut self, observer: impl ServerObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Set how often broadcast, sweep, and serving-state checks run.
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    fn resolve_listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        match &self.listen_addr {
            None => Ok(SocketAddr::V4(SocketAddrV4::new(
                Ipv4Addr::UNSPECIFIED,
                self.config.port,
            ))),
            Some(text) => text.parse().map_err(|e| ConfigError::InvalidListenAddress {
                address: text.clone(),
                detail: format!("{e}"),
            }),
        }
    }

    /// Validate the configuration and bind the socket.
    pub async fn build(self) -> io::Result<NtpServer<S>> {
        let listen_addr = self.resolve_listen_addr()?;
        if self.tick_interval.is_zero() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "tick interval must be non-zero",
            ));
        }
        let broadcast = self.config.broadcast.enabled;
        let mut engine = NtpEngine::new(self.config, self.source)?;
        if let Some(metrics) = self.metrics {
            engine = engine.with_metrics(metrics);
        }
        if let Some(observer) = self.observer {
            engine = engine.with_observer(BoxedObserver(observer));
        }

        let sock = UdpSocket::bind(listen_addr).await?;
        if broadcast {
            sock.set_broadcast(true)?;
        }
        debug!("NTP server listening on {}", sock.local_addr()?);

        Ok(NtpServer {
            sock,
            engine,
            tick_interval: self.tick_interval,
        })
    }
}

struct BoxedObserver(Box<dyn ServerObserver>);

impl ServerObserver for BoxedObserver {
    fn on_request(&mut self, client: SocketAddr, outcome: &crate::server_common::RequestOutcome) {
        self.0.on_request(client, outcome);
    }

    fn on_serving_changed(&mut self, serving: bool, status: &ServingStatus) {
        self.0.on_serving_changed(serving, status);
    }
}

/// An NTP server that answers client requests from a GPS time source.
///
/// Created via [`NtpServer::builder()`]. Call [`run()`](NtpServer::run) to
/// start serving.
pub struct NtpServer<S> {
    sock: UdpSocket,
    engine: NtpEngine<S>,
    tick_interval: Duration,
}

impl<S: TimeSource> NtpServer<S> {
    /// Create a builder reading time from `source`.
    pub fn builder(source: S) -> NtpServerBuilder<S> {
        NtpServerBuilder::new(source)
    }

    /// Get a handle for updating the configuration at runtime.
    ///
    /// Updates take effect on the next request or tick.
    pub fn config_handle(&self) -> ConfigHandle {
        self.engine.config_handle()
    }

    /// Shared metrics.
    pub fn metrics(&self) -> Arc<ServerMetrics> {
        self.engine.metrics()
    }

    /// Operator status string.
    pub fn status(&self) -> ServingStatus {
        self.engine.status()
    }

    /// Get the local address the server is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.sock.local_addr()
    }

    /// Run the server indefinitely.
    ///
    /// Socket errors on individual datagrams are logged and counted, never
    /// returned. Use `tokio::select!` or abort the task to stop the server.
    pub async fn run(mut self) -> io::Result<()> {
        let mut recv_buf = [0u8; RECV_BUFFER_SIZE];
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                recv = self.sock.recv_from(&mut recv_buf) => {
                    let (len, src) = match recv {
                        Ok(received) => received,
                        Err(e) => {
                            warn!("NTP receive failed: {}", e);
                            continue;
                        }
                    };
                    let received_at = Instant::now();
                    let result = self.engine.handle_request(&recv_buf[..len], src, received_at);
                    match result.packet() {
                        Some(packet) => {
                            if let Err(e) = self.sock.send_to(packet, src).await {
                                self.engine.metrics().inc_send_errors();
                                warn!("failed to send NTP reply to {}: {}", src, e);
                            }
                        }
                        None => debug!("dropped packet from {}", src),
                    }
                }
                _ = ticker.tick() => {
                    if let Some(broadcast) = self.engine.tick(Instant::now())
                        && let Err(e) = self.sock.send_to(&broadcast.packet, broadcast.destination).await
                    {
                        self.engine.metrics().inc_send_errors();
                        warn!("failed to send NTP broadcast to {}: {}", broadcast.destination, e);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_source::SharedTimeSource;

    #[test]
    fn test_builder_defaults() {
        let builder = NtpServer::builder(SharedTimeSource::default());
        assert!(builder.listen_addr.is_none());
        assert!(builder.metrics.is_none());
        assert_eq!(builder.tick_interval, DEFAULT_TICK_INTERVAL);
        assert_eq!(builder.config, ServerConfig::default());
        assert_eq!(
            builder.resolve_listen_addr().unwrap(),
            "0.0.0.0:123".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_builder_listen() {
        let builder = NtpServer::builder(SharedTimeSource::default()).listen("127.0.0.1:1234");
        assert_eq!(
            builder.resolve_listen_addr().unwrap(),
            "127.0.0.1:1234".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_builder_rejects_bad_listen_addr() {
        let builder = NtpServer::builder(SharedTimeSource::default()).listen("not-an-address");
        assert!(matches!(
            builder.resolve_listen_addr(),
            Err(ConfigError::InvalidListenAddress { .. })
        ));
    }

    #[tokio::test]
    async fn test_builder_build_binds_socket() {
        let server = NtpServer::builder(SharedTimeSource::default())
            .listen("127.0.0.1:0")
            .build()
            .await
            .expect("should bind to ephemeral port");
        assert!(server.local_addr().unwrap().port() > 0);
        assert_eq!(server.status().to_string(), "No GPS Time");
    }

    #[tokio::test]
    async fn test_builder_build_with_metrics() {
        let metrics = Arc::new(ServerMetrics::new());
        let server = NtpServer::builder(SharedTimeSource::default())
            .listen("127.0.0.1:0")
            .metrics(metrics.clone())
            .build()
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&server.metrics(), &metrics));
    }

    #[tokio::test]
    async fn test_build_rejects_zero_tick() {
        let err = NtpServer::builder(SharedTimeSource::default())
            .listen("127.0.0.1:0")
            .tick_interval(Duration::ZERO)
            .build()
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_server_config_handle() {
        let server = NtpServer::builder(SharedTimeSource::default())
            .listen("127.0.0.1:0")
            .build()
            .await
            .unwrap();
        let handle = server.config_handle();
        handle.update(|c| c.stratum = crate::protocol::Stratum(2)).unwrap();
        assert_eq!(handle.snapshot().stratum, crate::protocol::Stratum(2));
    }
}
