// ABOUTME: Error types for MessagePack encoding and decoding.
// ABOUTME: Decode failures carry the classifier's name for the byte that caused them.

use crate::types::Format;
use std::fmt;

/// The result type for MessagePack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during MessagePack encoding or decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A read ran past the end of the input buffer.
    Truncated,

    /// Unconsumed bytes after decoding a complete document.
    TrailingBytes,

    /// The observed leading byte's category differs from what the caller
    /// requested. Both names are the classifier's title-cased format names.
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// The one permanently unassigned byte (0xc1) was observed.
    ReservedMarker,

    /// A declared 32-bit length or count has its sign bit set,
    /// named for the format that carried it.
    MalformedSize(&'static str),

    /// A declared string/binary length at or beyond 2^31 - 1.
    TooLarge(&'static str),

    /// A decoded numeric magnitude exceeds the requested target width,
    /// named for the source stored format ("Uint16", "Int32", ...).
    IntegerOverflow(&'static str),

    /// A timestamp extension payload length not in {4, 8, 12},
    /// carrying the offending length.
    MalformedExtLength(u32),

    /// Invalid UTF-8 byte sequence in a string payload.
    InvalidUtf8,

    /// A sequence or map of unknown length was handed to the serializer;
    /// MessagePack headers are length-prefixed.
    LengthRequired,

    /// IO error during encoding.
    Io(String),

    /// Custom error message (for serde integration).
    Custom(String),
}

impl Error {
    /// Build the mismatch error for an observed leading byte: the reserved
    /// byte gets its own condition, anything else reports the classified
    /// format name against the expected category.
    #[must_use]
    pub fn mismatch(expected: &'static str, byte: u8) -> Error {
        let format = Format::from_byte(byte);
        if format == Format::NeverUsed {
            return Error::ReservedMarker;
        }
        Error::TypeMismatch {
            expected,
            found: format.name(),
        }
    }

    /// Returns the standardized error type name for test matching.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Error::Truncated => "truncated",
            Error::TrailingBytes => "trailing_bytes",
            Error::TypeMismatch { .. } => "type_mismatch",
            Error::ReservedMarker => "reserved_marker",
            Error::MalformedSize(_) => "malformed_size",
            Error::TooLarge(_) => "too_large",
            Error::IntegerOverflow(_) => "integer_overflow",
            Error::MalformedExtLength(_) => "malformed_ext_length",
            Error::InvalidUtf8 => "invalid_utf8",
            Error::LengthRequired => "length_required",
            Error::Io(_) => "io_error",
            Error::Custom(_) => "custom",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Truncated => write!(f, "unexpected end of input"),
            Error::TrailingBytes => write!(f, "trailing bytes after document"),
            Error::TypeMismatch { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            Error::ReservedMarker => write!(f, "reserved marker byte 0xc1"),
            Error::MalformedSize(format) => write!(f, "{format} size has sign bit set"),
            Error::TooLarge(format) => write!(f, "{format} length too large to represent"),
            Error::IntegerOverflow(format) => write!(f, "{format} value overflows target width"),
            Error::MalformedExtLength(len) => {
                write!(f, "invalid timestamp payload length: {len}")
            }
            Error::InvalidUtf8 => write!(f, "invalid UTF-8 sequence"),
            Error::LengthRequired => write!(f, "sequence length must be known up front"),
            Error::Io(msg) => write!(f, "I/O error: {msg}"),
            Error::Custom(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(_: std::str::Utf8Error) -> Self {
        Error::InvalidUtf8
    }
}
