// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! A non-blocking, single-threaded driver for [`NtpEngine`].
//!
//! The host calls [`NtpService::poll`] from its main loop. Each call drains
//! the datagrams that are already waiting, answers them, then runs the
//! engine's periodic duties. It never blocks: an empty socket is a normal
//! "no work" result.
//!
//! # Examples
//!
//! ```no_run
//! use gpsntp_server::server_common::ServerConfig;
//! use gpsntp_server::service::NtpService;
//! use gpsntp_server::time_source::SharedTimeSource;
//!
//! # fn main() -> std::io::Result<()> {
//! let gps = SharedTimeSource::default();
//! let config = ServerConfig::builder().port(1123).build()?;
//! let mut service = NtpService::bind(config, gps.clone())?;
//! loop {
//!     service.poll();
//!     std::thread::sleep(std::time::Duration::from_millis(5));
//! }
//! # }
//! ```

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::time::Instant;

use log::{debug, warn};

use crate::server_common::{ConfigHandle, NtpEngine, ServerConfig, ServerMetrics, ServingStatus};
use crate::time_source::TimeSource;

/// Receive buffer size. Larger than any valid request so oversized datagrams
/// are seen at their true length instead of being truncated to 48 bytes.
pub const RECV_BUFFER_SIZE: usize = 1024;

/// Most datagrams handled in one [`NtpService::poll`] call.
pub const MAX_DATAGRAMS_PER_POLL: usize = 64;

/// A datagram socket the service can poll without blocking.
pub trait Transport {
    /// Receive one datagram if one is waiting.
    ///
    /// Returns `Ok(None)` when nothing is available.
    fn try_recv_from(&mut self, buf: &mut [u8]) -> io::Result<Option<(usize, SocketAddr)>>;

    /// Send one datagram.
    fn send_to(&mut self, buf: &[u8], dest: SocketAddr) -> io::Result<usize>;
}

/// A `std` socket in non-blocking mode.
impl Transport for UdpSocket {
    fn try_recv_from(&mut self, buf: &mut [u8]) -> io::Result<Option<(usize, SocketAddr)>> {
        match self.recv_from(buf) {
            Ok(received) => Ok(Some(received)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn send_to(&mut self, buf: &[u8], dest: SocketAddr) -> io::Result<usize> {
        UdpSocket::send_to(self, buf, dest)
    }
}

/// Poll-cycle NTP service over any [`Transport`].
pub struct NtpService<T, S> {
    transport: T,
    engine: NtpEngine<S>,
    buf: [u8; RECV_BUFFER_SIZE],
}

impl<S: TimeSource> NtpService<UdpSocket, S> {
    /// Bind a non-blocking UDP socket on all IPv4 interfaces at the
    /// configured port and wrap it in a service.
    pub fn bind(config: ServerConfig, source: S) -> io::Result<Self> {
        let addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, config.port));
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(true)?;
        if config.broadcast.enabled {
            socket.set_broadcast(true)?;
        }
        debug!("NTP service listening on {}", socket.local_addr()?);
        let engine = NtpEngine::new(config, source)?;
        Ok(NtpService::new(socket, engine))
    }

    /// The local address of the socket.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.transport.local_addr()
    }
}

impl<T: Transport, S: TimeSource> NtpService<T, S> {
    /// Wrap an existing transport and engine.
    pub fn new(transport: T, engine: NtpEngine<S>) -> Self {
        NtpService {
            transport,
            engine,
            buf: [0u8; RECV_BUFFER_SIZE],
        }
    }

    /// Run one cycle: answer waiting datagrams, then the periodic duties.
    ///
    /// Returns the number of datagrams received. Socket errors are logged
    /// and counted, never returned.
    pub fn poll(&mut self) -> usize {
        let mut handled = 0;
        while handled < MAX_DATAGRAMS_PER_POLL {
            let (len, src) = match self.transport.try_recv_from(&mut self.buf) {
                Ok(Some(received)) => received,
                Ok(None) => break,
                Err(e) => {
                    warn!("NTP receive failed: {e}");
                    break;
                }
            };
            let received_at = Instant::now();
            handled += 1;

            let result = self.engine.handle_request(&self.buf[..len], src, received_at);
            if let Some(packet) = result.packet()
                && let Err(e) = self.transport.send_to(packet, src)
            {
                self.engine.metrics().inc_send_errors();
                warn!("failed to send NTP reply to {src}: {e}");
            }
        }

        if let Some(broadcast) = self.engine.tick(Instant::now())
            && let Err(e) = self.transport.send_to(&broadcast.packet, broadcast.destination)
        {
            self.engine.metrics().inc_send_errors();
            warn!("failed to send NTP broadcast to {}: {e}", broadcast.destination);
        }
        handled
    }

    /// Send a broadcast packet now, if broadcast is enabled and quality passes.
    ///
    /// Returns whether a packet was sent.
    pub fn send_broadcast(&mut self) -> bool {
        let Some(broadcast) = self.engine.send_broadcast(Instant::now()) else {
            return false;
        };
        match self.transport.send_to(&broadcast.packet, broadcast.destination) {
            Ok(_) => true,
            Err(e) => {
                self.engine.metrics().inc_send_errors();
                warn!("failed to send NTP broadcast to {}: {e}", broadcast.destination);
                false
            }
        }
    }

    /// The engine driven by this service.
    pub fn engine(&self) -> &NtpEngine<S> {
        &self.engine
    }

    /// Mutable access to the engine, for configuration changes.
    pub fn engine_mut(&mut self) -> &mut NtpEngine<S> {
        &mut self.engine
    }

    /// Handle for runtime configuration updates.
    pub fn config_handle(&self) -> ConfigHandle {
        self.engine.config_handle()
    }

    /// Shared metrics.
    pub fn metrics(&self) -> std::sync::Arc<ServerMetrics> {
        self.engine.metrics()
    }

    /// Operator status string.
    pub fn status(&self) -> ServingStatus {
        self.engine.status()
    }
}
