// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Validated server configuration.
//!
//! [`ServerConfig`] gathers identity (stratum, reference ID), rate limits,
//! GPS quality thresholds, and broadcast settings. Every path into the engine
//! runs [`ServerConfig::validate`], so out-of-range values are rejected with a
//! [`ConfigError`] instead of being clamped.
//!
//! A [`ConfigHandle`] lets another task replace the configuration while a
//! driver is running; the driver picks the change up at the start of its next
//! cycle.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use gpsntp_server::server_common::ServerConfig;
//!
//! let config = ServerConfig::builder()
//!     .stratum(1)
//!     .reference_id("GPS")
//!     .min_client_interval(Duration::from_secs(2))
//!     .global_max_per_second(500)
//!     .build()
//!     .unwrap();
//! assert_eq!(&config.reference_id, b"GPS\0");
//! ```

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crate::broadcast::{BroadcastConfig, MIN_BROADCAST_INTERVAL};
use crate::error::ConfigError;
use crate::protocol;

/// Default NTP reference identifier for a GPS-disciplined clock.
pub const DEFAULT_REFERENCE_ID: [u8; 4] = *b"GPS\0";

/// Rate limiting and client tracking configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct RateLimitConfig {
    /// Whether the per-client gate runs. The global gate is always active.
    pub enabled: bool,
    /// Minimum spacing between admitted requests from one client.
    pub min_interval: Duration,
    /// Ceiling on requests accepted across all clients per one-second window.
    pub global_max_per_second: u32,
    /// Maximum number of tracked clients.
    pub max_clients: usize,
    /// Clients idle longer than this are removed by the periodic sweep.
    pub client_idle_timeout: Duration,
    /// How often the idle sweep runs.
    pub sweep_interval: Duration,
    /// Rejections after which a client is flagged aggressive.
    pub aggressive_threshold: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        RateLimitConfig {
            enabled: true,
            min_interval: Duration::from_millis(1000),
            global_max_per_second: 1000,
            max_clients: 50,
            client_idle_timeout: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(300),
            aggressive_threshold: 10,
        }
    }
}

/// GPS fix quality required before time is served.
#[derive(Clone, Debug, PartialEq)]
pub struct QualityThresholds {
    /// Minimum satellites in the fix.
    pub min_satellites: u8,
    /// Maximum horizontal dilution of precision.
    pub max_hdop: f32,
    /// Maximum age of the fix.
    pub max_fix_age: Duration,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        QualityThresholds {
            min_satellites: 4,
            max_hdop: 10.0,
            max_fix_age: Duration::from_millis(5000),
        }
    }
}

/// Complete engine configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    /// When false the engine is idle: datagrams are ignored and nothing is counted.
    pub enabled: bool,
    /// UDP port to serve on. Zero asks the OS for an ephemeral port.
    pub port: u16,
    /// Advertised stratum (1-15).
    pub stratum: protocol::Stratum,
    /// Four-byte, zero-padded ASCII reference identifier.
    pub reference_id: [u8; 4],
    /// Rate limiting and client tracking.
    pub rate_limit: RateLimitConfig,
    /// GPS quality gate.
    pub quality: QualityThresholds,
    /// Broadcast mode.
    pub broadcast: BroadcastConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            enabled: true,
            port: protocol::PORT,
            stratum: protocol::Stratum::PRIMARY,
            reference_id: DEFAULT_REFERENCE_ID,
            rate_limit: RateLimitConfig::default(),
            quality: QualityThresholds::default(),
            broadcast: BroadcastConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a builder starting from the defaults.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::new()
    }

    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let stratum = self.stratum.0;
        if !(1..=15).contains(&stratum) {
            return Err(ConfigError::InvalidStratum { stratum });
        }
        validate_reference_id(&self.reference_id)?;

        let rl = &self.rate_limit;
        if rl.global_max_per_second == 0 {
            return Err(ConfigError::InvalidRateLimit {
                detail: "global ceiling must be at least 1 request per second".to_string(),
            });
        }
        if rl.max_clients == 0 {
            return Err(ConfigError::InvalidRateLimit {
                detail: "client table must hold at least 1 entry".to_string(),
            });
        }
        if rl.enabled && rl.min_interval.is_zero() {
            return Err(ConfigError::InvalidRateLimit {
                detail: "per-client minimum interval must be non-zero when enabled".to_string(),
            });
        }
        if rl.client_idle_timeout.is_zero() || rl.sweep_interval.is_zero() {
            return Err(ConfigError::InvalidRateLimit {
                detail: "idle timeout and sweep interval must be non-zero".to_string(),
            });
        }

        let q = &self.quality;
        if q.min_satellites == 0 {
            return Err(ConfigError::InvalidQualityThreshold {
                detail: "minimum satellites must be at least 1".to_string(),
            });
        }
        if !q.max_hdop.is_finite() || q.max_hdop <= 0.0 {
            return Err(ConfigError::InvalidQualityThreshold {
                detail: format!("maximum HDOP must be a positive number, got {}", q.max_hdop),
            });
        }
        if q.max_fix_age.is_zero() {
            return Err(ConfigError::InvalidQualityThreshold {
                detail: "maximum fix age must be non-zero".to_string(),
            });
        }

        if self.broadcast.interval < MIN_BROADCAST_INTERVAL {
            return Err(ConfigError::InvalidBroadcastInterval {
                secs: self.broadcast.interval.as_secs(),
            });
        }
        Ok(())
    }
}

fn validate_reference_id(id: &[u8; 4]) -> Result<(), ConfigError> {
    if id[0] == 0 {
        return Err(ConfigError::InvalidReferenceId {
            detail: "must not be empty".to_string(),
        });
    }
    // Printable ASCII, left-justified, zero-padded.
    let len = id.iter().position(|&b| b == 0).unwrap_or(4);
    if !id[..len].iter().all(|b| b.is_ascii_graphic()) || id[len..].iter().any(|&b| b != 0) {
        return Err(ConfigError::InvalidReferenceId {
            detail: format!("{id:?} is not zero-padded printable ASCII"),
        });
    }
    Ok(())
}

/// Parse a one to four character reference identifier into its padded wire form.
pub fn parse_reference_id(text: &str) -> Result<[u8; 4], ConfigError> {
    let bytes = text.as_bytes();
    if bytes.is_empty() || bytes.len() > 4 {
        return Err(ConfigError::InvalidReferenceId {
            detail: format!("'{text}' must be 1 to 4 characters"),
        });
    }
    let mut id = [0u8; 4];
    id[..bytes.len()].copy_from_slice(bytes);
    validate_reference_id(&id)?;
    Ok(id)
}

/// Builder for [`ServerConfig`]. Validation happens in [`build`](Self::build).
#[derive(Clone, Debug)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
    reference_id_text: Option<String>,
}

impl ServerConfigBuilder {
    /// Start from [`ServerConfig::default`].
    pub fn new() -> Self {
        ServerConfigBuilder {
            config: ServerConfig::default(),
            reference_id_text: None,
        }
    }

    /// Enable or disable the engine.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    /// Set the UDP port.
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the advertised stratum (1-15).
    pub fn stratum(mut self, stratum: u8) -> Self {
        self.config.stratum = protocol::Stratum(stratum);
        self
    }

    /// Set the reference identifier, e.g. `"GPS"` or `"PPS"`.
    pub fn reference_id(mut self, id: &str) -> Self {
        self.reference_id_text = Some(id.to_string());
        self
    }

    /// Enable or disable the per-client gate.
    pub fn rate_limit_enabled(mut self, enabled: bool) -> Self {
        self.config.rate_limit.enabled = enabled;
        self
    }

    /// Set the per-client minimum request spacing.
    pub fn min_client_interval(mut self, interval: Duration) -> Self {
        self.config.rate_limit.min_interval = interval;
        self
    }

    /// Set the global requests-per-second ceiling.
    pub fn global_max_per_second(mut self, max: u32) -> Self {
        self.config.rate_limit.global_max_per_second = max;
        self
    }

    /// Set the client table capacity.
    pub fn max_clients(mut self, max: usize) -> Self {
        self.config.rate_limit.max_clients = max;
        self
    }

    /// Replace the whole rate limiting section.
    pub fn rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.config.rate_limit = rate_limit;
        self
    }

    /// Replace the GPS quality thresholds.
    pub fn quality(mut self, quality: QualityThresholds) -> Self {
        self.config.quality = quality;
        self
    }

    /// Replace the broadcast settings.
    pub fn broadcast(mut self, broadcast: BroadcastConfig) -> Self {
        self.config.broadcast = broadcast;
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> io::Result<ServerConfig> {
        let mut config = self.config;
        if let Some(text) = self.reference_id_text {
            config.reference_id = parse_reference_id(&text)?;
        }
        config.validate()?;
        Ok(config)
    }
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A cloneable handle for replacing the configuration at runtime.
///
/// Updates are validated before they are stored. Drivers poll
/// [`take_update`](Self::take_update) once per cycle and apply whatever
/// changed since they last looked.
#[derive(Clone, Debug)]
pub struct ConfigHandle {
    inner: Arc<RwLock<ServerConfig>>,
    generation: Arc<AtomicU64>,
}

impl ConfigHandle {
    /// Wrap an already validated configuration.
    pub(crate) fn new(config: ServerConfig) -> Self {
        ConfigHandle {
            inner: Arc::new(RwLock::new(config)),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Apply a mutation to a copy of the configuration, validate it, and
    /// publish it if valid. On error the running configuration is unchanged.
    pub fn update(&self, f: impl FnOnce(&mut ServerConfig)) -> io::Result<()> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let mut candidate = guard.clone();
        f(&mut candidate);
        candidate.validate()?;
        *guard = candidate;
        self.generation.fetch_add(1, Ordering::Release);
        Ok(())
    }

    /// Replace the per-client interval and global ceiling.
    pub fn set_rate_limits(&self, min_interval: Duration, global_max_per_second: u32) -> io::Result<()> {
        self.update(|c| {
            c.rate_limit.min_interval = min_interval;
            c.rate_limit.global_max_per_second = global_max_per_second;
        })
    }

    /// Turn the server on or off.
    ///
    /// The flag is outside validation, so this cannot fail. Setting the
    /// current value publishes nothing.
    pub fn set_enabled(&self, enabled: bool) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if guard.enabled != enabled {
            guard.enabled = enabled;
            self.generation.fetch_add(1, Ordering::Release);
        }
    }

    /// Return a copy of the current configuration.
    pub fn snapshot(&self) -> ServerConfig {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Return the configuration if it changed since `seen_generation`,
    /// advancing `seen_generation`.
    pub(crate) fn take_update(&self, seen_generation: &mut u64) -> Option<ServerConfig> {
        let current = self.generation.load(Ordering::Acquire);
        if current == *seen_generation {
            return None;
        }
        *seen_generation = current;
        Some(self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_err(result: io::Result<ServerConfig>) -> ConfigError {
        let err = result.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        match err
            .get_ref()
            .and_then(|e| e.downcast_ref::<crate::error::NtpServerError>())
        {
            Some(crate::error::NtpServerError::Config(c)) => c.clone(),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn defaults_are_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.port, 123);
        assert_eq!(config.stratum, protocol::Stratum::PRIMARY);
        assert_eq!(config.reference_id, *b"GPS\0");
        assert_eq!(config.rate_limit.min_interval, Duration::from_secs(1));
        assert_eq!(config.rate_limit.global_max_per_second, 1000);
        assert_eq!(config.rate_limit.max_clients, 50);
        assert_eq!(config.quality.min_satellites, 4);
        assert_eq!(config.quality.max_hdop, 10.0);
        assert_eq!(config.quality.max_fix_age, Duration::from_secs(5));
        assert!(!config.broadcast.enabled);
        assert_eq!(config.broadcast.interval, Duration::from_secs(64));
    }

    #[test]
    fn rejects_stratum_out_of_range() {
        for stratum in [0u8, 16, 255] {
            let err = config_err(ServerConfig::builder().stratum(stratum).build());
            assert_eq!(err, ConfigError::InvalidStratum { stratum });
        }
        assert!(ServerConfig::builder().stratum(15).build().is_ok());
    }

    #[test]
    fn parses_reference_ids() {
        assert_eq!(parse_reference_id("GPS").unwrap(), *b"GPS\0");
        assert_eq!(parse_reference_id("PPS1").unwrap(), *b"PPS1");
        assert!(parse_reference_id("").is_err());
        assert!(parse_reference_id("TOOLONG").is_err());
        assert!(parse_reference_id("G S").is_err());
    }

    #[test]
    fn rejects_gapped_reference_id() {
        let config = ServerConfig {
            reference_id: [b'G', 0, b'S', 0],
            ..ServerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidReferenceId { .. })
        ));
    }

    #[test]
    fn rejects_zero_global_ceiling() {
        let err = config_err(ServerConfig::builder().global_max_per_second(0).build());
        assert!(matches!(err, ConfigError::InvalidRateLimit { .. }));
    }

    #[test]
    fn rejects_zero_client_interval_only_when_enabled() {
        let err = config_err(
            ServerConfig::builder()
                .min_client_interval(Duration::ZERO)
                .build(),
        );
        assert!(matches!(err, ConfigError::InvalidRateLimit { .. }));

        assert!(
            ServerConfig::builder()
                .rate_limit_enabled(false)
                .min_client_interval(Duration::ZERO)
                .build()
                .is_ok()
        );
    }

    #[test]
    fn rejects_bad_quality_thresholds() {
        let bad = [
            QualityThresholds {
                min_satellites: 0,
                ..QualityThresholds::default()
            },
            QualityThresholds {
                max_hdop: f32::NAN,
                ..QualityThresholds::default()
            },
            QualityThresholds {
                max_hdop: -1.0,
                ..QualityThresholds::default()
            },
            QualityThresholds {
                max_fix_age: Duration::ZERO,
                ..QualityThresholds::default()
            },
        ];
        for q in bad {
            let err = config_err(ServerConfig::builder().quality(q).build());
            assert!(matches!(err, ConfigError::InvalidQualityThreshold { .. }));
        }
    }

    #[test]
    fn rejects_short_broadcast_interval() {
        let err = config_err(
            ServerConfig::builder()
                .broadcast(BroadcastConfig {
                    enabled: true,
                    interval: Duration::from_secs(9),
                    ..BroadcastConfig::default()
                })
                .build(),
        );
        assert_eq!(err, ConfigError::InvalidBroadcastInterval { secs: 9 });
    }

    #[test]
    fn handle_update_validates_before_publishing() {
        let handle = ConfigHandle::new(ServerConfig::default());
        let mut seen = 0;
        assert!(handle.take_update(&mut seen).is_none());

        assert!(handle.update(|c| c.stratum = protocol::Stratum(0)).is_err());
        assert!(handle.take_update(&mut seen).is_none());
        assert_eq!(handle.snapshot().stratum, protocol::Stratum::PRIMARY);

        handle.update(|c| c.stratum = protocol::Stratum(2)).unwrap();
        let updated = handle.take_update(&mut seen).unwrap();
        assert_eq!(updated.stratum, protocol::Stratum(2));
        assert!(handle.take_update(&mut seen).is_none());
    }

    #[test]
    fn handle_set_rate_limits() {
        let handle = ConfigHandle::new(ServerConfig::default());
        let mut seen = 0;
        handle
            .set_rate_limits(Duration::from_millis(250), 20)
            .unwrap();
        let updated = handle.take_update(&mut seen).unwrap();
        assert_eq!(updated.rate_limit.min_interval, Duration::from_millis(250));
        assert_eq!(updated.rate_limit.global_max_per_second, 20);
        assert!(handle.set_rate_limits(Duration::from_secs(1), 0).is_err());
    }

    #[test]
    fn handle_set_enabled_publishes_only_changes() {
        let handle = ConfigHandle::new(ServerConfig::default());
        let mut seen = 0;
        handle.set_enabled(true);
        assert!(handle.take_update(&mut seen).is_none());

        handle.set_enabled(false);
        let updated = handle.take_update(&mut seen).unwrap();
        assert!(!updated.enabled);
        assert_eq!(updated.stratum, protocol::Stratum::PRIMARY);
        assert!(handle.take_update(&mut seen).is_none());
    }
}
