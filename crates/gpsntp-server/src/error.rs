// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Custom error types for the NTP server engine.
//!
//! Public fallible APIs return `io::Result<T>`. Internally, errors are
//! constructed as `NtpServerError` variants and converted to `io::Error` via
//! `From<NtpServerError> for io::Error`.
//!
//! Callers that want programmatic error matching can downcast via
//! `io::Error::get_ref()`:
//!
//! ```
//! use gpsntp_server::error::{ConfigError, NtpServerError};
//! use gpsntp_server::server_common::ServerConfig;
//!
//! let err = ServerConfig::builder().stratum(0).build().unwrap_err();
//! let srv_err = err
//!     .get_ref()
//!     .and_then(|inner| inner.downcast_ref::<NtpServerError>())
//!     .unwrap();
//! assert!(matches!(
//!     srv_err,
//!     NtpServerError::Config(ConfigError::InvalidStratum { stratum: 0 })
//! ));
//! ```

pub use gpsntp_proto::error::ParseError;

use std::fmt;
use std::io;

/// Errors that can occur during NTP server operations.
#[derive(Debug)]
pub enum NtpServerError {
    /// A client request failed validation.
    Protocol(ProtocolError),
    /// Invalid configuration.
    Config(ConfigError),
    /// Underlying I/O error (socket bind, send/recv, etc.).
    Io(io::Error),
}

/// Validation errors for incoming client requests.
///
/// These never leave the engine as errors; a rejected request is counted and
/// dropped. They exist so the drop reason can be logged and tested.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProtocolError {
    /// The datagram is not exactly 48 bytes long.
    WrongSize {
        /// Number of bytes received.
        received: usize,
    },
    /// The request carries a version other than 3 or 4.
    UnsupportedVersion {
        /// The version value received.
        version: u8,
    },
    /// The request is not a client-mode (3) packet.
    UnexpectedMode {
        /// The mode value received.
        mode: u8,
    },
    /// The request carries a stratum above 16.
    InvalidStratum {
        /// The stratum value received.
        stratum: u8,
    },
}

/// Server configuration errors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    /// Stratum outside 1..=15.
    InvalidStratum {
        /// The rejected stratum.
        stratum: u8,
    },
    /// Reference identifier is empty, too long, or not printable ASCII.
    InvalidReferenceId {
        /// Detail about why it is invalid.
        detail: String,
    },
    /// A rate limit or client table bound is out of range.
    InvalidRateLimit {
        /// Detail about why it is invalid.
        detail: String,
    },
    /// A GPS quality threshold is out of range.
    InvalidQualityThreshold {
        /// Detail about why it is invalid.
        detail: String,
    },
    /// Broadcast interval below the 10 second minimum.
    InvalidBroadcastInterval {
        /// The rejected interval in seconds.
        secs: u64,
    },
    /// Invalid listen address.
    InvalidListenAddress {
        /// The address that was invalid.
        address: String,
        /// Detail about why it is invalid.
        detail: String,
    },
}

// ── Display implementations ─────────────────────────────────────────

impl fmt::Display for NtpServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NtpServerError::Protocol(e) => write!(f, "NTP server protocol error: {e}"),
            NtpServerError::Config(e) => write!(f, "NTP server config error: {e}"),
            NtpServerError::Io(e) => write!(f, "{e}"),
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::WrongSize { received } => {
                write!(f, "NTP request must be 48 bytes, got {received}")
            }
            ProtocolError::UnsupportedVersion { version } => {
                write!(f, "unsupported NTP version: {version}")
            }
            ProtocolError::UnexpectedMode { mode } => {
                write!(f, "unexpected request mode: {mode}")
            }
            ProtocolError::InvalidStratum { stratum } => {
                write!(f, "invalid request stratum: {stratum}")
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidStratum { stratum } => {
                write!(f, "stratum must be between 1 and 15, got {stratum}")
            }
            ConfigError::InvalidReferenceId { detail } => {
                write!(f, "invalid reference ID: {detail}")
            }
            ConfigError::InvalidRateLimit { detail } => {
                write!(f, "invalid rate limit: {detail}")
            }
            ConfigError::InvalidQualityThreshold { detail } => {
                write!(f, "invalid quality threshold: {detail}")
            }
            ConfigError::InvalidBroadcastInterval { secs } => {
                write!(f, "broadcast interval must be at least 10 s, got {secs} s")
            }
            ConfigError::InvalidListenAddress { address, detail } => {
                write!(f, "invalid listen address '{address}': {detail}")
            }
        }
    }
}

// ── Error trait implementations ─────────────────────────────────────

impl std::error::Error for NtpServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NtpServerError::Protocol(e) => Some(e),
            NtpServerError::Config(e) => Some(e),
            NtpServerError::Io(e) => Some(e),
        }
    }
}

impl std::error::Error for ProtocolError {}
impl std::error::Error for ConfigError {}

// ── From conversions ────────────────────────────────────────────────

impl From<NtpServerError> for io::Error {
    fn from(err: NtpServerError) -> io::Error {
        let kind = match &err {
            NtpServerError::Protocol(_) => io::ErrorKind::InvalidData,
            NtpServerError::Config(_) => io::ErrorKind::InvalidInput,
            NtpServerError::Io(e) => e.kind(),
        };
        // Preserve the original io::Error directly for the Io variant.
        if let NtpServerError::Io(e) = err {
            return e;
        }
        io::Error::new(kind, err)
    }
}

impl From<io::Error> for NtpServerError {
    fn from(err: io::Error) -> NtpServerError {
        NtpServerError::Io(err)
    }
}

impl From<ProtocolError> for NtpServerError {
    fn from(err: ProtocolError) -> NtpServerError {
        NtpServerError::Protocol(err)
    }
}

impl From<ConfigError> for NtpServerError {
    fn from(err: ConfigError) -> NtpServerError {
        NtpServerError::Config(err)
    }
}

impl From<ConfigError> for io::Error {
    fn from(err: ConfigError) -> io::Error {
        NtpServerError::Config(err).into()
    }
}

// ── Tests ───────────────────────────────────────────────────────────
