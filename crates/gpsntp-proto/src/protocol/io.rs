// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use byteorder::{BE, ReadBytesExt, WriteBytesExt};
use std::io;

use super::{
    LeapIndicator, Mode, Packet, PacketByte1, ReadBytes, ReadFromBytes, ReferenceIdentifier,
    ShortFormat, Stratum, TimestampFormat, Version, WriteBytes, WriteToBytes,
};
use crate::error::ParseError;

impl<W: WriteBytesExt> WriteBytes for W {
    fn write_bytes<P: WriteToBytes>(&mut self, value: P) -> io::Result<()> {
        value.write_to_bytes(self)
    }
}

impl<R: ReadBytesExt> ReadBytes for R {
    fn read_bytes<P: ReadFromBytes>(&mut self) -> io::Result<P> {
        P::read_from_bytes(self)
    }
}

impl<P: WriteToBytes> WriteToBytes for &P {
    fn write_to_bytes<W: WriteBytesExt>(&self, writer: W) -> io::Result<()> {
        (**self).write_to_bytes(writer)
    }
}

// Fixed-point formats.

impl WriteToBytes for ShortFormat {
    fn write_to_bytes<W: WriteBytesExt>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u16::<BE>(self.seconds)?;
        writer.write_u16::<BE>(self.fraction)
    }
}

impl ReadFromBytes for ShortFormat {
    fn read_from_bytes<R: ReadBytesExt>(mut reader: R) -> io::Result<Self> {
        Ok(ShortFormat {
            seconds: reader.read_u16::<BE>()?,
            fraction: reader.read_u16::<BE>()?,
        })
    }
}

impl WriteToBytes for TimestampFormat {
    fn write_to_bytes<W: WriteBytesExt>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u32::<BE>(self.seconds)?;
        writer.write_u32::<BE>(self.fraction)
    }
}

impl ReadFromBytes for TimestampFormat {
    fn read_from_bytes<R: ReadBytesExt>(mut reader: R) -> io::Result<Self> {
        Ok(TimestampFormat {
            seconds: reader.read_u32::<BE>()?,
            fraction: reader.read_u32::<BE>()?,
        })
    }
}

// Header byte 0: LI(2) | VN(3) | Mode(3).

impl WriteToBytes for PacketByte1 {
    fn write_to_bytes<W: WriteBytesExt>(&self, mut writer: W) -> io::Result<()> {
        let (li, vn, mode) = *self;
        writer.write_u8(((li as u8) << 6) | ((vn.0 & 0b111) << 3) | (mode as u8))
    }
}

impl ReadFromBytes for PacketByte1 {
    fn read_from_bytes<R: ReadBytesExt>(mut reader: R) -> io::Result<Self> {
        let byte = reader.read_u8()?;
        let li = LeapIndicator::try_from(byte >> 6).map_err(|_| ParseError::InvalidField {
            field: "leap indicator",
            value: u32::from(byte >> 6),
        })?;
        let mode = Mode::try_from(byte & 0b111).map_err(|_| ParseError::InvalidField {
            field: "mode",
            value: u32::from(byte & 0b111),
        })?;
        Ok((li, Version((byte >> 3) & 0b111), mode))
    }
}

impl WriteToBytes for Stratum {
    fn write_to_bytes<W: WriteBytesExt>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u8(self.0)
    }
}

impl ReadFromBytes for Stratum {
    fn read_from_bytes<R: ReadBytesExt>(mut reader: R) -> io::Result<Self> {
        Ok(Stratum(reader.read_u8()?))
    }
}

impl WriteToBytes for ReferenceIdentifier {
    fn write_to_bytes<W: WriteBytesExt>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(&self.as_bytes())
    }
}

// The reference ID is decoded as part of the packet, where the stratum that
// disambiguates it is known.

impl WriteToBytes for Packet {
    fn write_to_bytes<W: WriteBytesExt>(&self, mut writer: W) -> io::Result<()> {
        writer.write_bytes((self.leap_indicator, self.version, self.mode))?;
        writer.write_bytes(self.stratum)?;
        writer.write_i8(self.poll)?;
        writer.write_i8(self.precision)?;
        writer.write_bytes(self.root_delay)?;
        writer.write_bytes(self.root_dispersion)?;
        writer.write_bytes(self.reference_id)?;
        writer.write_bytes(self.reference_timestamp)?;
        writer.write_bytes(self.origin_timestamp)?;
        writer.write_bytes(self.receive_timestamp)?;
        writer.write_bytes(self.transmit_timestamp)
    }
}

impl ReadFromBytes for Packet {
    fn read_from_bytes<R: ReadBytesExt>(mut reader: R) -> io::Result<Self> {
        let (leap_indicator, version, mode) = reader.read_bytes()?;
        let stratum: Stratum = reader.read_bytes()?;
        let poll = reader.read_i8()?;
        let precision = reader.read_i8()?;
        let root_delay = reader.read_bytes()?;
        let root_dispersion = reader.read_bytes()?;
        let mut raw_id = [0u8; 4];
        reader.read_exact(&mut raw_id)?;
        Ok(Packet {
            leap_indicator,
            version,
            mode,
            stratum,
            poll,
            precision,
            root_delay,
            root_dispersion,
            reference_id: ReferenceIdentifier::from_bytes_with_stratum(raw_id, stratum),
            reference_timestamp: reader.read_bytes()?,
            origin_timestamp: reader.read_bytes()?,
            receive_timestamp: reader.read_bytes()?,
            transmit_timestamp: reader.read_bytes()?,
        })
    }
}
