// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Protocol engine for a GPS-disciplined Stratum-1 NTP server.
//!
//! The engine answers NTPv3/NTPv4 client requests with timestamps derived from
//! a GPS time snapshot, refuses service with Kiss-o'-Death packets when the
//! fix is not trustworthy or a client polls too fast, optionally emits
//! broadcast-mode packets, and keeps operational metrics.
//!
//! The core ([`server_common`]) is pure logic with injected time. Two drivers
//! run it against a socket:
//!
//! - [`service::NtpService`]: a non-blocking poll cycle over any
//!   [`service::Transport`], for single-threaded main loops.
//! - [`server::NtpServer`] (feature `tokio`): an async UDP server.
//!
//! # Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `tokio` | yes | Async UDP server using the tokio runtime. |

#![warn(missing_docs)]

// Re-export protocol types from gpsntp_proto for convenience.
pub use gpsntp_proto::{protocol, unix_time};

/// Error types for the server engine.
pub mod error;

/// Read-only access to the GPS time and quality snapshot.
pub mod time_source;

/// Shared types and logic for the NTP server engine.
///
/// Provides request validation, response building, the quality gate, rate
/// limiting, timestamp generation, metrics, and the orchestrating pipeline.
pub mod server_common;

/// Broadcast destination handling.
pub mod broadcast;

/// Non-blocking poll-cycle driver.
pub mod service;

/// NTP server using the Tokio runtime.
#[cfg(feature = "tokio")]
pub mod server;
