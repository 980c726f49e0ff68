// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use core::fmt;

use super::ConstPackedSizeBytes;

/// **NTP Short Format** - Used in delay and dispersion header fields where the full resolution and
/// range of the other formats are not justified. It includes a 16-bit unsigned seconds field and a
/// 16-bit fraction field.
///
/// ### Layout
///
/// ```ignore
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |          Seconds              |           Fraction            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ShortFormat {
    /// Seconds component (16-bit unsigned).
    pub seconds: u16,
    /// Fractional seconds component (16-bit unsigned).
    pub fraction: u16,
}

/// **NTP Timestamp Format** - Used in packet headers and other places with limited word size. It
/// includes a 32-bit unsigned seconds field spanning 136 years and a 32-bit fraction field
/// resolving 232 picoseconds.
///
/// The prime epoch is 0 h 1 January 1900 UTC, when all bits are zero.
///
/// ### Layout
///
/// ```ignore
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                            Seconds                            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                            Fraction                           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TimestampFormat {
    /// Seconds since 1900-01-01 00:00:00 UTC (32-bit unsigned).
    pub seconds: u32,
    /// Fractional seconds (32-bit unsigned, resolution of ~232 picoseconds).
    pub fraction: u32,
}

/// A 2-bit integer warning of an impending leap second to be inserted or deleted in the last
/// minute of the current month.
///
/// Note that this field is packed in the actual header.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
pub enum LeapIndicator {
    /// No leap required.
    #[default]
    NoWarning = 0,
    /// Last minute of the day has 61 seconds.
    AddOne = 1,
    /// Last minute of the day has 59 seconds.
    SubOne = 2,
    /// Clock unsynchronized.
    Unknown = 3,
}

impl TryFrom<u8> for LeapIndicator {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(LeapIndicator::NoWarning),
            1 => Ok(LeapIndicator::AddOne),
            2 => Ok(LeapIndicator::SubOne),
            3 => Ok(LeapIndicator::Unknown),
            _ => Err(()),
        }
    }
}

/// A 3-bit integer representing the NTP version number.
///
/// Note that while this struct is 8-bits, this field is packed to 3 in the actual header, so
/// values outside 0..=7 cannot be decoded from the wire.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Version(pub(super) u8);

/// A 3-bit integer representing the association mode.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
pub enum Mode {
    /// Reserved mode (value 0).
    Reserved = 0,
    /// Symmetric active mode (value 1).
    SymmetricActive = 1,
    /// Symmetric passive mode (value 2).
    SymmetricPassive = 2,
    /// Client mode (value 3).
    #[default]
    Client = 3,
    /// Server mode (value 4).
    Server = 4,
    /// Broadcast mode (value 5).
    Broadcast = 5,
    /// NTP control message mode (value 6).
    NtpControlMessage = 6,
    /// Reserved for private use (value 7).
    ReservedForPrivateUse = 7,
}

impl TryFrom<u8> for Mode {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Mode::Reserved),
            1 => Ok(Mode::SymmetricActive),
            2 => Ok(Mode::SymmetricPassive),
            3 => Ok(Mode::Client),
            4 => Ok(Mode::Server),
            5 => Ok(Mode::Broadcast),
            6 => Ok(Mode::NtpControlMessage),
            7 => Ok(Mode::ReservedForPrivateUse),
            _ => Err(()),
        }
    }
}

/// An 8-bit integer representing the stratum.
///
/// ```ignore
/// +--------+-----------------------------------------------------+
/// | Value  | Meaning                                             |
/// +--------+-----------------------------------------------------+
/// | 0      | unspecified or invalid                              |
/// | 1      | primary server (e.g., equipped with a GPS receiver) |
/// | 2-15   | secondary server (via NTP)                          |
/// | 16     | unsynchronized                                      |
/// | 17-255 | reserved                                            |
/// +--------+-----------------------------------------------------+
/// ```
#[derive(Copy, Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Stratum(pub u8);

/// A 32-bit code identifying the particular server or reference clock.
///
/// For stratum 0 this is a kiss code. For stratum 1 it is a four-octet, left-justified,
/// zero-padded ASCII string assigned to the reference clock.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ReferenceIdentifier {
    /// Primary reference source (stratum 1) identifier.
    PrimarySource(PrimarySource),
    /// The reference identifier of a secondary server or client, usually an IPv4 address.
    SecondaryOrClient([u8; 4]),
    /// Kiss-o'-Death packet code (stratum 0).
    KissOfDeath(KissOfDeath),
    /// An unrecognized 4-byte reference identifier.
    ///
    /// Used for non-standard kiss codes, unregistered primary source names (for example the
    /// experimental `X...` range), and stratum 16+ packets.
    Unknown([u8; 4]),
}

/// A four-octet, left-justified, zero-padded ASCII string assigned to the reference clock.
///
/// Only the radio and satellite sources a GPS-disciplined server is likely to report are
/// listed; anything else decodes as [`ReferenceIdentifier::Unknown`].
#[repr(u32)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[allow(missing_docs)]
pub enum PrimarySource {
    /// Global Position System.
    Gps = code_to_u32!(b"GPS\0"),
    /// Galileo Positioning System.
    Gal = code_to_u32!(b"GAL\0"),
    /// Geosynchronous Orbit Environment Satellite.
    Goes = code_to_u32!(b"GOES"),
    /// Generic pulse-per-second.
    Pps = code_to_u32!(b"PPS\0"),
    Irig = code_to_u32!(b"IRIG"),
    Wwvb = code_to_u32!(b"WWVB"),
    Dcf = code_to_u32!(b"DCF\0"),
    Msf = code_to_u32!(b"MSF\0"),
    Jjy = code_to_u32!(b"JJY\0"),
    Locl = code_to_u32!(b"LOCL"),
    Atom = code_to_u32!(b"ATOM"),
    Null = 0,
}

impl TryFrom<u32> for PrimarySource {
    type Error = ();

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            v if v == code_to_u32!(b"GPS\0") => Ok(PrimarySource::Gps),
            v if v == code_to_u32!(b"GAL\0") => Ok(PrimarySource::Gal),
            v if v == code_to_u32!(b"GOES") => Ok(PrimarySource::Goes),
            v if v == code_to_u32!(b"PPS\0") => Ok(PrimarySource::Pps),
            v if v == code_to_u32!(b"IRIG") => Ok(PrimarySource::Irig),
            v if v == code_to_u32!(b"WWVB") => Ok(PrimarySource::Wwvb),
            v if v == code_to_u32!(b"DCF\0") => Ok(PrimarySource::Dcf),
            v if v == code_to_u32!(b"MSF\0") => Ok(PrimarySource::Msf),
            v if v == code_to_u32!(b"JJY\0") => Ok(PrimarySource::Jjy),
            v if v == code_to_u32!(b"LOCL") => Ok(PrimarySource::Locl),
            v if v == code_to_u32!(b"ATOM") => Ok(PrimarySource::Atom),
            0 => Ok(PrimarySource::Null),
            _ => Err(()),
        }
    }
}

/// If the Stratum field is 0, the Reference Identifier field carries a **Kiss-o'-Death** code
/// telling the client how to behave toward this server.
#[repr(u32)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum KissOfDeath {
    /// The server refuses service. The client must stop sending packets to it.
    Deny = code_to_u32!(b"DENY"),
    /// The client must reduce its polling interval to this server.
    Rate = code_to_u32!(b"RATE"),
}

impl TryFrom<u32> for KissOfDeath {
    type Error = ();

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            v if v == code_to_u32!(b"DENY") => Ok(KissOfDeath::Deny),
            v if v == code_to_u32!(b"RATE") => Ok(KissOfDeath::Rate),
            _ => Err(()),
        }
    }
}

/// **Packet Header** - the 48-byte NTPv4 header without extension fields or MAC.
///
/// ```ignore
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |LI | VN  |Mode |    Stratum     |     Poll      |  Precision   |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                         Root Delay                            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                         Root Dispersion                       |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                          Reference ID                         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// +                     Reference Timestamp (64)                  +
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// +                      Origin Timestamp (64)                    +
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// +                      Receive Timestamp (64)                   +
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// +                      Transmit Timestamp (64)                  +
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Packet {
    /// Leap indicator warning of impending leap second.
    pub leap_indicator: LeapIndicator,
    /// NTP protocol version number.
    pub version: Version,
    /// Association mode (client, server, broadcast, etc.).
    pub mode: Mode,
    /// Stratum level of the time source.
    pub stratum: Stratum,
    /// Maximum interval between successive messages, in log2 seconds.
    pub poll: i8,
    /// Precision of the system clock, in log2 seconds. -20 is roughly one microsecond.
    pub precision: i8,
    /// Total round-trip delay to the reference clock, in NTP short format.
    pub root_delay: ShortFormat,
    /// Total dispersion to the reference clock, in NTP short format.
    pub root_dispersion: ShortFormat,
    /// Reference identifier (clock source, kiss code, or server address).
    pub reference_id: ReferenceIdentifier,
    /// Time when the system clock was last set or corrected.
    pub reference_timestamp: TimestampFormat,
    /// Time at the client when the request departed for the server.
    pub origin_timestamp: TimestampFormat,
    /// Time at the server when the request arrived from the client.
    pub receive_timestamp: TimestampFormat,
    /// Time at the server when the response left for the client.
    pub transmit_timestamp: TimestampFormat,
}

/// The consecutive types within the first packed byte in the NTP packet.
pub type PacketByte1 = (LeapIndicator, Version, Mode);

// Inherent implementations.

impl ShortFormat {
    /// Convert a non-negative duration in seconds to 16.16 fixed point.
    ///
    /// The value is scaled by 65536 and truncated. Negative inputs map to zero and values
    /// beyond the representable range saturate.
    pub fn from_seconds(seconds: f64) -> Self {
        let fixed = (seconds * 65536.0) as u32;
        ShortFormat {
            seconds: (fixed >> 16) as u16,
            fraction: (fixed & 0xFFFF) as u16,
        }
    }

    /// The 16.16 fixed point value as a single 32-bit word.
    pub fn to_bits(&self) -> u32 {
        (u32::from(self.seconds) << 16) | u32::from(self.fraction)
    }
}

impl TimestampFormat {
    /// Whether both the seconds and fraction fields are zero.
    pub fn is_zero(&self) -> bool {
        self.seconds == 0 && self.fraction == 0
    }

    /// Add a count of 2^-32 second units, carrying overflow of the fraction into seconds.
    ///
    /// Seconds wrap at the end of the NTP era.
    pub fn add_fraction(self, units: u64) -> Self {
        let total = u64::from(self.fraction) + units;
        TimestampFormat {
            seconds: self.seconds.wrapping_add((total >> 32) as u32),
            fraction: (total & 0xFFFF_FFFF) as u32,
        }
    }
}

impl ReferenceIdentifier {
    /// Interpret the four reference ID bytes of a header carrying `stratum`.
    ///
    /// Stratum 0 holds a Kiss-o'-Death code, stratum 1 a primary source,
    /// strata 2-15 an upstream address or hash. Anything unrecognised is kept
    /// as [`ReferenceIdentifier::Unknown`].
    pub fn from_bytes_with_stratum(bytes: [u8; 4], stratum: Stratum) -> Self {
        let code = u32::from_be_bytes(bytes);
        let known = match stratum {
            Stratum::UNSPECIFIED => KissOfDeath::try_from(code)
                .ok()
                .map(ReferenceIdentifier::KissOfDeath),
            Stratum::PRIMARY => PrimarySource::try_from(code)
                .ok()
                .map(ReferenceIdentifier::PrimarySource),
            s if s.is_secondary() => Some(ReferenceIdentifier::SecondaryOrClient(bytes)),
            _ => None,
        };
        known.unwrap_or(ReferenceIdentifier::Unknown(bytes))
    }

    /// Returns the raw 4-byte representation of the reference identifier.
    pub fn as_bytes(&self) -> [u8; 4] {
        match *self {
            ReferenceIdentifier::PrimarySource(src) => src.bytes(),
            ReferenceIdentifier::SecondaryOrClient(arr) => arr,
            ReferenceIdentifier::KissOfDeath(kod) => (kod as u32).to_be_bytes(),
            ReferenceIdentifier::Unknown(arr) => arr,
        }
    }

    /// Returns true if this is a Kiss-o'-Death reference identifier.
    pub fn is_kiss_of_death(&self) -> bool {
        matches!(self, ReferenceIdentifier::KissOfDeath(_))
    }
}

impl PrimarySource {
    /// The bytestring representation of the primary source.
    pub fn bytes(&self) -> [u8; 4] {
        (*self as u32).to_be_bytes()
    }
}

impl KissOfDeath {
    /// The four ASCII bytes of the kiss code.
    pub fn bytes(&self) -> [u8; 4] {
        (*self as u32).to_be_bytes()
    }
}

impl Version {
    /// NTP version 1.
    pub const V1: Self = Version(1);
    /// NTP version 2.
    pub const V2: Self = Version(2);
    /// NTP version 3.
    pub const V3: Self = Version(3);
    /// NTP version 4 (current standard).
    pub const V4: Self = Version(4);

    /// Create a `Version` from a raw 3-bit version number.
    ///
    /// Returns `None` if the value does not fit in the 3-bit header field.
    pub fn new(v: u8) -> Option<Self> {
        if v <= 7 { Some(Version(v)) } else { None }
    }

    /// Returns the raw version number as a `u8`.
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Whether or not the version is a published NTP version (1-4).
    pub fn is_known(&self) -> bool {
        self.0 >= 1 && self.0 <= 4
    }
}

impl Stratum {
    /// Unspecified or invalid. Also the stratum of a Kiss-o'-Death packet.
    pub const UNSPECIFIED: Self = Stratum(0);
    /// The primary server (e.g. equipped with a GPS receiver).
    pub const PRIMARY: Self = Stratum(1);
    /// The minimum value specifying a secondary server (via NTP).
    pub const SECONDARY_MIN: Self = Stratum(2);
    /// The maximum value specifying a secondary server (via NTP).
    pub const SECONDARY_MAX: Self = Stratum(15);
    /// An unsynchronized stratum.
    pub const UNSYNCHRONIZED: Self = Stratum(16);
    /// The maximum valid stratum value.
    pub const MAX: Self = Stratum(16);

    /// Whether or not the stratum represents a secondary server.
    pub fn is_secondary(&self) -> bool {
        Self::SECONDARY_MIN <= *self && *self <= Self::SECONDARY_MAX
    }

    /// Whether or not the stratum is in the reserved range.
    pub fn is_reserved(&self) -> bool {
        *self > Self::MAX
    }
}

// Size implementations.

impl ConstPackedSizeBytes for ShortFormat {
    const PACKED_SIZE_BYTES: usize = 4;
}

impl ConstPackedSizeBytes for TimestampFormat {
    const PACKED_SIZE_BYTES: usize = 8;
}

impl ConstPackedSizeBytes for Stratum {
    const PACKED_SIZE_BYTES: usize = 1;
}

impl ConstPackedSizeBytes for ReferenceIdentifier {
    const PACKED_SIZE_BYTES: usize = 4;
}

impl ConstPackedSizeBytes for PacketByte1 {
    const PACKED_SIZE_BYTES: usize = 1;
}

impl ConstPackedSizeBytes for Packet {
    const PACKED_SIZE_BYTES: usize = PacketByte1::PACKED_SIZE_BYTES
        + Stratum::PACKED_SIZE_BYTES
        + 2
        + ShortFormat::PACKED_SIZE_BYTES * 2
        + ReferenceIdentifier::PACKED_SIZE_BYTES
        + TimestampFormat::PACKED_SIZE_BYTES * 4;
}

// Default implementations.

impl Default for Version {
    /// Defaults to NTPv4, the current standard (RFC 5905).
    fn default() -> Self {
        Version::V4
    }
}

impl Default for ReferenceIdentifier {
    /// Defaults to `Unknown([0; 4])` (unset reference identifier).
    fn default() -> Self {
        ReferenceIdentifier::Unknown([0; 4])
    }
}

impl Default for Packet {
    /// Defaults to an NTPv4 client request template with every timestamp zeroed.
    fn default() -> Self {
        Packet {
            leap_indicator: LeapIndicator::default(),
            version: Version::default(),
            mode: Mode::default(),
            stratum: Stratum::default(),
            poll: 0,
            precision: 0,
            root_delay: ShortFormat::default(),
            root_dispersion: ShortFormat::default(),
            reference_id: ReferenceIdentifier::default(),
            reference_timestamp: TimestampFormat::default(),
            origin_timestamp: TimestampFormat::default(),
            receive_timestamp: TimestampFormat::default(),
            transmit_timestamp: TimestampFormat::default(),
        }
    }
}

// Display implementations.

fn write_ascii_code(f: &mut fmt::Formatter, bytes: [u8; 4]) -> fmt::Result {
    for &b in &bytes {
        if b == 0 {
            break;
        }
        if b.is_ascii_graphic() {
            write!(f, "{}", b as char)?;
        } else {
            write!(f, "?")?;
        }
    }
    Ok(())
}

impl fmt::Display for PrimarySource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_ascii_code(f, self.bytes())
    }
}

impl fmt::Display for KissOfDeath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_ascii_code(f, self.bytes())
    }
}

impl fmt::Display for ReferenceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ReferenceIdentifier::PrimarySource(src) => src.fmt(f),
            ReferenceIdentifier::KissOfDeath(kod) => kod.fmt(f),
            ReferenceIdentifier::SecondaryOrClient(arr) => {
                write!(f, "{}.{}.{}.{}", arr[0], arr[1], arr[2], arr[3])
            }
            ReferenceIdentifier::Unknown(arr) => write_ascii_code(f, arr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_format_from_seconds_truncates() {
        // 0.001 s * 65536 = 65.536 -> 65
        assert_eq!(ShortFormat::from_seconds(0.001).to_bits(), 65);
        assert_eq!(ShortFormat::from_seconds(0.005).to_bits(), 327);
        assert_eq!(ShortFormat::from_seconds(1.0).to_bits(), 65536);
        assert_eq!(
            ShortFormat::from_seconds(1.5),
            ShortFormat {
                seconds: 1,
                fraction: 0x8000
            }
        );
    }

    #[test]
    fn short_format_from_negative_is_zero() {
        assert_eq!(ShortFormat::from_seconds(-3.0), ShortFormat::default());
    }

    #[test]
    fn timestamp_add_fraction_carries() {
        let base = TimestampFormat {
            seconds: 10,
            fraction: 0xFFFF_FFFE,
        };
        let next = base.add_fraction(4);
        assert_eq!(next.seconds, 11);
        assert_eq!(next.fraction, 2);

        let same = base.add_fraction(1);
        assert_eq!(same.seconds, 10);
        assert_eq!(same.fraction, 0xFFFF_FFFF);
    }

    #[test]
    fn timestamp_add_fraction_multiple_seconds() {
        let base = TimestampFormat {
            seconds: 0,
            fraction: 0,
        };
        let next = base.add_fraction(3 << 32);
        assert_eq!(next.seconds, 3);
        assert_eq!(next.fraction, 0);
    }

    #[test]
    fn timestamp_add_fraction_wraps_era() {
        let base = TimestampFormat {
            seconds: u32::MAX,
            fraction: u32::MAX,
        };
        let next = base.add_fraction(1);
        assert_eq!(next.seconds, 0);
        assert_eq!(next.fraction, 0);
    }

    #[test]
    fn kiss_codes_are_ascii() {
        assert_eq!(&KissOfDeath::Deny.bytes(), b"DENY");
        assert_eq!(&KissOfDeath::Rate.bytes(), b"RATE");
        assert_eq!(KissOfDeath::try_from(u32::from_be_bytes(*b"RATE")), Ok(KissOfDeath::Rate));
        assert!(KissOfDeath::try_from(u32::from_be_bytes(*b"RSTR")).is_err());
    }

    #[test]
    fn primary_source_display() {
        assert_eq!(PrimarySource::Gps.to_string(), "GPS");
        assert_eq!(PrimarySource::Wwvb.to_string(), "WWVB");
    }

    #[test]
    fn reference_id_display() {
        assert_eq!(
            ReferenceIdentifier::KissOfDeath(KissOfDeath::Deny).to_string(),
            "DENY"
        );
        assert_eq!(
            ReferenceIdentifier::SecondaryOrClient([192, 168, 1, 1]).to_string(),
            "192.168.1.1"
        );
        assert_eq!(ReferenceIdentifier::Unknown(*b"XGP\0").to_string(), "XGP");
    }

    #[test]
    fn version_bounds() {
        assert_eq!(Version::new(3), Some(Version::V3));
        assert!(Version::new(8).is_none());
        assert!(Version::V4.is_known());
        assert!(!Version(0).is_known());
        assert!(!Version(5).is_known());
    }

    #[test]
    fn packet_size_is_48() {
        assert_eq!(Packet::PACKED_SIZE_BYTES, 48);
    }
}
