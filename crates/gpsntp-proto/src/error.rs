// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Error type for NTP header decoding.
//!
//! Truncation surfaces as [`std::io::ErrorKind::UnexpectedEof`] from the
//! reader itself; [`ParseError`] covers fields whose bits do not map to a
//! known value and converts into [`std::io::Error`] so the codec can use `?`.

use std::fmt;
use std::io;

/// A header field held a value the codec cannot represent.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseError {
    /// An invalid or unrecognized field value was encountered.
    InvalidField {
        /// Name of the field that was invalid.
        field: &'static str,
        /// The invalid value.
        value: u32,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidField { field, value } => {
                write!(f, "invalid {} value: {}", field, value)
            }
        }
    }
}

impl From<ParseError> for io::Error {
    fn from(err: ParseError) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidData, err)
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_invalid_field() {
        let err = ParseError::InvalidField {
            field: "mode",
            value: 9,
        };
        assert_eq!(err.to_string(), "invalid mode value: 9");
    }

    #[test]
    fn test_into_io_error_kind() {
        let field: io::Error = ParseError::InvalidField {
            field: "leap indicator",
            value: 4,
        }
        .into();
        assert_eq!(field.kind(), io::ErrorKind::InvalidData);
        assert!(field.to_string().contains("leap indicator"));
    }
}
