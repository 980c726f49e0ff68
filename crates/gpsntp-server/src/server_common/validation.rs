// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use crate::error::ProtocolError;
use crate::protocol::{self, ConstPackedSizeBytes, ReadBytes};

/// The fields of a validated client request that the response needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestDescriptor {
    /// Request version (3 or 4), echoed in the response.
    pub version: protocol::Version,
    /// Poll exponent advertised by the client, unclamped.
    pub poll: i8,
    /// Stratum carried by the request.
    pub stratum: protocol::Stratum,
    /// The client's transmit timestamp, copied into the response's originate field.
    pub transmit_timestamp: protocol::TimestampFormat,
}

/// Validate an incoming NTP client request.
///
/// The datagram must be exactly 48 bytes, version 3 or 4, mode 3 (client),
/// with a stratum of at most 16. A zero originate or transmit timestamp is
/// accepted, as sent by a client on first contact.
pub fn parse_request(buf: &[u8]) -> Result<RequestDescriptor, ProtocolError> {
    if buf.len() != protocol::Packet::PACKED_SIZE_BYTES {
        return Err(ProtocolError::WrongSize {
            received: buf.len(),
        });
    }
    let request: protocol::Packet = (&buf[..]).read_bytes().map_err(|_| ProtocolError::WrongSize {
        received: buf.len(),
    })?;

    let version = request.version.value();
    if version != 3 && version != 4 {
        return Err(ProtocolError::UnsupportedVersion { version });
    }
    if request.mode != protocol::Mode::Client {
        return Err(ProtocolError::UnexpectedMode {
            mode: request.mode as u8,
        });
    }
    if request.stratum.0 > protocol::MAXSTRAT {
        return Err(ProtocolError::InvalidStratum {
            stratum: request.stratum.0,
        });
    }

    Ok(RequestDescriptor {
        version: request.version,
        poll: request.poll,
        stratum: request.stratum,
        transmit_timestamp: request.transmit_timestamp,
    })
}
