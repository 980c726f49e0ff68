// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! NTP wire types for a GPS-disciplined Stratum-1 server.
//!
//! This crate provides the RFC 5905 packet header types, a `byteorder`-based
//! codec over `std::io` readers and writers, and helpers for converting
//! between Unix time and the NTP timestamp format.

#![warn(missing_docs)]

/// Error type for NTP header decoding.
pub mod error;

/// NTP protocol types and constants (RFC 5905).
pub mod protocol;

/// Unix time conversion utilities for NTP timestamps.
pub mod unix_time;
