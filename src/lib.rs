// ABOUTME: MessagePack encoder/decoder for Rust.
// ABOUTME: Provides serde integration and a dynamic Value API for encoding/decoding.

//! # MessagePack for serde
//!
//! A high-performance MessagePack encoder and decoder for Rust.
//!
//! MessagePack is a compact, self-describing binary serialization format:
//! a single leading byte encodes both a value's type and, for small values,
//! its payload or length inline; larger values carry explicit big-endian
//! length fields.
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_msgpack::{to_vec, from_slice};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! struct Person {
//!     name: String,
//!     age: u32,
//! }
//!
//! let person = Person {
//!     name: "Alice".to_string(),
//!     age: 30,
//! };
//!
//! // Serialize to MessagePack
//! let bytes = to_vec(&person).unwrap();
//!
//! // Deserialize from MessagePack
//! let decoded: Person = from_slice(&bytes).unwrap();
//! assert_eq!(person, decoded);
//! ```
//!
//! ## Working with Dynamic Values
//!
//! ```rust
//! use serde_msgpack::{decode_value, Value};
//!
//! let bytes = vec![0x93, 0x01, 0x02, 0x03]; // [1, 2, 3]
//! let value = decode_value(&bytes).unwrap();
//! assert!(value.is_array());
//! assert_eq!(value.get(0).and_then(|v| v.as_i64()), Some(1));
//! ```
//!
//! ## Decoding at an offset
//!
//! The [`Decoder`] exposes the full typed surface for callers that manage
//! their own cursor: seek to an absolute offset, read one value, and the
//! position delta is exactly the bytes that value spanned.
//!
//! ```rust
//! use serde_msgpack::Decoder;
//!
//! let data = [0xc0, 0x2a]; // nil, 42
//! let mut dec = Decoder::new(&data);
//! dec.seek(1);
//! assert_eq!(dec.read_i64().unwrap(), 42);
//! assert_eq!(dec.position(), 2);
//! ```

pub mod de;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod reader;
pub mod ser;
pub mod types;
pub mod value;

// Re-export commonly used items at the crate root
pub use de::{from_slice, Deserializer};
pub use decoder::{Decoder, ExtHeader};
pub use encoder::Encoder;
pub use error::{Error, Result};
pub use reader::Reader;
pub use ser::Serializer;
pub use types::{marker, Format, TIMESTAMP_TYPE};
pub use value::{Ext, Timestamp, Value};

use serde::Serialize;
use std::io::Write;

/// Serialize a value to a MessagePack byte vector.
///
/// # Example
///
/// ```rust
/// use serde_msgpack::to_vec;
///
/// let bytes = to_vec(&42i32).unwrap();
/// assert_eq!(bytes, vec![0x2a]); // positive fixint 42
/// ```
pub fn to_vec<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    to_writer(&mut buf, value)?;
    Ok(buf)
}

/// Serialize a value to a writer.
///
/// # Example
///
/// ```rust
/// use serde_msgpack::to_writer;
///
/// let mut buf = Vec::new();
/// to_writer(&mut buf, &"hello").unwrap();
/// ```
pub fn to_writer<W: Write, T: Serialize>(writer: W, value: &T) -> Result<()> {
    let mut encoder = Encoder::new(writer);
    let mut serializer = Serializer::new(&mut encoder);
    value.serialize(&mut serializer)
}

/// Decode a MessagePack document into a [`Value`].
///
/// The input must contain exactly one encoded value; trailing bytes are
/// rejected.
///
/// # Example
///
/// ```rust
/// use serde_msgpack::{decode_value, Value};
///
/// let value = decode_value(&[0x92, 0xc3, 0xa2, b'h', b'i']).unwrap();
/// assert_eq!(value.get(0), Some(&Value::Bool(true)));
/// assert_eq!(value.get(1).and_then(|v| v.as_str()), Some("hi"));
/// ```
pub fn decode_value(data: &[u8]) -> Result<Value> {
    let mut decoder = Decoder::new(data);
    let value = decoder.read_value()?;
    decoder.finish()?;
    Ok(value)
}

/// Encode a [`Value`] to MessagePack bytes.
///
/// # Example
///
/// ```rust
/// use serde_msgpack::{encode_value, Value};
///
/// let bytes = encode_value(&Value::Int(42)).unwrap();
/// assert_eq!(bytes, vec![0x2a]);
/// ```
pub fn encode_value(value: &Value) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_value_to_writer(&mut buf, value)?;
    Ok(buf)
}

/// Encode a [`Value`] to a writer.
pub fn encode_value_to_writer<W: Write>(writer: W, value: &Value) -> Result<()> {
    let mut encoder = Encoder::new(writer);
    encode_value_recursive(&mut encoder, value)
}

fn encode_value_recursive<W: Write>(encoder: &mut Encoder<W>, value: &Value) -> Result<()> {
    match value {
        Value::Nil => encoder.write_nil(),
        Value::Bool(b) => encoder.write_bool(*b),
        Value::Int(n) => encoder.write_i64(*n),
        Value::UInt(n) => encoder.write_u64(*n),
        Value::Float(f) => encoder.write_f64(*f),
        Value::Str(s) => encoder.write_str(s),
        Value::Bin(b) => encoder.write_bin(b),
        Value::Ext(e) => encoder.write_ext(e.tag, &e.data),
        Value::Timestamp(t) => encoder.write_timestamp(*t),
        Value::Array(arr) => {
            encoder.write_array_len(arr.len())?;
            for item in arr {
                encode_value_recursive(encoder, item)?;
            }
            Ok(())
        }
        Value::Map(entries) => {
            encoder.write_map_len(entries.len())?;
            for (key, val) in entries {
                encode_value_recursive(encoder, key)?;
                encode_value_recursive(encoder, val)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_roundtrip_primitives() {
        // Integer
        let bytes = to_vec(&42i32).unwrap();
        let decoded: i32 = from_slice(&bytes).unwrap();
        assert_eq!(decoded, 42);

        // String
        let bytes = to_vec(&"hello").unwrap();
        let decoded: String = from_slice(&bytes).unwrap();
        assert_eq!(decoded, "hello");

        // Bool
        let bytes = to_vec(&true).unwrap();
        let decoded: bool = from_slice(&bytes).unwrap();
        assert!(decoded);
    }

    #[test]
    fn test_roundtrip_containers() {
        // Vec
        let original = vec![1, 2, 3, 4, 5];
        let bytes = to_vec(&original).unwrap();
        let decoded: Vec<i32> = from_slice(&bytes).unwrap();
        assert_eq!(decoded, original);

        // Nested
        let original = vec![vec![1, 2], vec![3, 4]];
        let bytes = to_vec(&original).unwrap();
        let decoded: Vec<Vec<i32>> = from_slice(&bytes).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_roundtrip_struct() {
        #[derive(Debug, Serialize, Deserialize, PartialEq)]
        struct Person {
            name: String,
            age: u32,
            active: bool,
        }

        let original = Person {
            name: "Alice".to_string(),
            age: 30,
            active: true,
        };

        let bytes = to_vec(&original).unwrap();
        let decoded: Person = from_slice(&bytes).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_value_roundtrip() {
        let value = Value::Map(vec![
            (Value::Str("name".into()), Value::Str("test".into())),
            (
                Value::Str("values".into()),
                Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
            ),
            (
                Value::Str("nested".into()),
                Value::Map(vec![(Value::Str("flag".into()), Value::Bool(true))]),
            ),
        ]);

        let bytes = encode_value(&value).unwrap();
        let decoded = decode_value(&bytes).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_decode_known_bytes() {
        // {"number": 50}
        let bytes = vec![
            0x81, // fixmap, 1 pair
            0xa6, b'n', b'u', b'm', b'b', b'e', b'r', // "number"
            0x32, // 50
        ];

        let value = decode_value(&bytes).unwrap();
        assert!(value.is_map());
        assert_eq!(value.get_key("number").and_then(|v| v.as_i64()), Some(50));
    }

    #[test]
    fn test_decode_value_rejects_trailing() {
        assert_eq!(
            decode_value(&[0x01, 0x02]).unwrap_err(),
            Error::TrailingBytes
        );
    }

    #[test]
    fn test_value_roundtrip_ext_and_timestamp() {
        let value = Value::Array(vec![
            Value::Ext(Ext::new(5, vec![0xab])),
            Value::Timestamp(Timestamp::new(1_000_000_000, 0)),
            Value::Bin(vec![1, 2, 3]),
        ]);
        let bytes = encode_value(&value).unwrap();
        assert_eq!(decode_value(&bytes).unwrap(), value);
    }
}
