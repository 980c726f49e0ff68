// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::net::SocketAddr;

use log::{debug, info};

use super::quality::ServingStatus;
use crate::error::ProtocolError;

/// What the engine did with one inbound datagram.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A normal response was built.
    Served,
    /// Dropped by the server-wide ceiling.
    GlobalRateLimited,
    /// Dropped as malformed.
    Invalid(ProtocolError),
    /// Refused with Kiss-o'-Death DENY because GPS quality failed.
    QualityDenied,
    /// Refused with Kiss-o'-Death RATE because the client polled too fast.
    ClientRateLimited,
}

impl fmt::Display for RequestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestOutcome::Served => write!(f, "served"),
            RequestOutcome::GlobalRateLimited => write!(f, "dropped by global rate limit"),
            RequestOutcome::Invalid(e) => write!(f, "invalid: {e}"),
            RequestOutcome::QualityDenied => write!(f, "denied, GPS quality insufficient"),
            RequestOutcome::ClientRateLimited => write!(f, "rate limited"),
        }
    }
}

/// Receives engine events for logging or telemetry.
///
/// Both methods default to doing nothing.
pub trait ServerObserver: Send {
    /// Called once per datagram after the engine decides what to do with it.
    fn on_request(&mut self, client: SocketAddr, outcome: &RequestOutcome) {
        let _ = (client, outcome);
    }

    /// Called when the quality gate starts or stops passing.
    fn on_serving_changed(&mut self, serving: bool, status: &ServingStatus) {
        let _ = (serving, status);
    }
}

/// Forwards engine events to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogObserver;

impl ServerObserver for LogObserver {
    fn on_request(&mut self, client: SocketAddr, outcome: &RequestOutcome) {
        debug!("NTP request from {client}: {outcome}");
    }

    fn on_serving_changed(&mut self, serving: bool, status: &ServingStatus) {
        if serving {
            info!("now serving NTP time ({status})");
        } else {
            info!("stopped serving NTP time: {status}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Silent;
    impl ServerObserver for Silent {}

    #[test]
    fn outcome_display() {
        assert_eq!(RequestOutcome::Served.to_string(), "served");
        assert_eq!(
            RequestOutcome::Invalid(ProtocolError::UnexpectedMode { mode: 4 }).to_string(),
            "invalid: unexpected request mode: 4"
        );
        assert_eq!(RequestOutcome::ClientRateLimited.to_string(), "rate limited");
    }

    #[test]
    fn default_methods_are_no_ops() {
        let mut observer = Silent;
        let addr: SocketAddr = "127.0.0.1:123".parse().unwrap();
        observer.on_request(addr, &RequestOutcome::Served);
        observer.on_serving_changed(true, &ServingStatus::Serving(1));
        let mut log_observer = LogObserver;
        log_observer.on_request(addr, &RequestOutcome::QualityDenied);
        log_observer.on_serving_changed(false, &ServingStatus::StaleFix);
    }
}
