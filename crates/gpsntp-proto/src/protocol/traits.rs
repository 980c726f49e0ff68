// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use byteorder::{ReadBytesExt, WriteBytesExt};
use std::io;

/// Fixed on-the-wire size of a header type.
pub trait ConstPackedSizeBytes {
    /// Encoded length in bytes.
    const PACKED_SIZE_BYTES: usize;
}

/// A header type that can be encoded big-endian onto a `byteorder` writer.
pub trait WriteToBytes {
    /// Encode `self` onto `writer`.
    fn write_to_bytes<W: WriteBytesExt>(&self, writer: W) -> io::Result<()>;
}

/// A header type that can be decoded big-endian from a `byteorder` reader.
pub trait ReadFromBytes: Sized {
    /// Decode one value from `reader`.
    fn read_from_bytes<R: ReadBytesExt>(reader: R) -> io::Result<Self>;
}

/// Extension for any writer: `writer.write_bytes(packet)`.
///
/// Writing into a `&mut [u8]` that is too small fails with
/// [`io::ErrorKind::WriteZero`].
pub trait WriteBytes {
    /// Encode `value` onto this writer.
    fn write_bytes<P: WriteToBytes>(&mut self, value: P) -> io::Result<()>;
}

/// Extension for any reader: `let packet: Packet = reader.read_bytes()?`.
///
/// Reading from a short slice fails with [`io::ErrorKind::UnexpectedEof`].
pub trait ReadBytes {
    /// Decode one value from this reader.
    fn read_bytes<P: ReadFromBytes>(&mut self) -> io::Result<P>;
}
