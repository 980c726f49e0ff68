// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Shared types and logic for the NTP server engine, used by both the
//! poll-cycle [`crate::service`] driver and the tokio [`crate::server`].
//!
//! Provides request validation, response building, the GPS quality gate,
//! rate limiting, timestamp generation, metrics, and the orchestrating
//! [`NtpEngine`].

mod config;
mod metrics;
mod observer;
mod pipeline;
mod quality;
mod rate_limit;
mod response;
mod timestamp;
mod validation;

pub use self::config::{
    ConfigHandle, DEFAULT_REFERENCE_ID, QualityThresholds, RateLimitConfig, ServerConfig,
    ServerConfigBuilder, parse_reference_id,
};
pub use self::metrics::{MetricsSnapshot, STRATUM_BUCKETS, ServerMetrics, VERSION_BUCKETS};
pub use self::observer::{LogObserver, RequestOutcome, ServerObserver};
pub use self::pipeline::{BroadcastPacket, EngineState, HandleResult, NtpEngine};
pub use self::quality::{ServingStatus, quality_passes};
pub use self::rate_limit::{ClientEntry, ClientTable, GlobalRateWindow};
pub use self::response::{
    LEAP_ALARM_FIX_AGE_MS, PRECISION, build_broadcast, build_kiss_of_death, build_response,
};
pub use self::timestamp::{TimestampEngine, advance};
pub use self::validation::{RequestDescriptor, parse_request};

pub use crate::broadcast::BroadcastConfig;
