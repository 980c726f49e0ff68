// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Types and constants for the RFC 5905 packet header.
//!
//! Encoding and decoding go through [`WriteBytes`] and [`ReadBytes`], which
//! extend the `byteorder` `WriteBytesExt` and `ReadBytesExt` traits, so the
//! same code serves a `&mut [u8]` datagram buffer, a `Vec<u8>`, or a cursor.

/// NTP port number.
pub const PORT: u16 = 123;

/// Minimum poll exponent a server advertises (16 s).
pub const MINPOLL: i8 = 4;

/// Maximum poll exponent a server advertises (1024 s).
pub const MAXPOLL: i8 = 10;

/// Maximum stratum number.
pub const MAXSTRAT: u8 = 16;

// Convert an ascii string to a big-endian u32.
macro_rules! code_to_u32 {
    ($w:expr) => {
        u32::from_be_bytes(*$w)
    };
}

mod io;
mod traits;
mod types;

pub use self::traits::*;
pub use self::types::*;
