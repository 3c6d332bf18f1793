// ABOUTME: Dynamic value type for decoded MessagePack documents.
// ABOUTME: Covers every decodable shape including extensions and timestamps.

use std::fmt;

/// An application-defined extension value: a signed type tag plus an
/// opaque payload the codec never interprets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ext {
    /// Application-defined type tag. Negative tags are reserved by the format.
    pub tag: i8,
    /// Opaque payload bytes.
    pub data: Vec<u8>,
}

impl Ext {
    #[must_use]
    pub fn new(tag: i8, data: Vec<u8>) -> Self {
        Self { tag, data }
    }
}

/// The built-in timestamp extension: seconds since the epoch plus a
/// nanosecond part.
///
/// The wire can carry nanoseconds above 999 999 999 in its 30/32-bit
/// fields; decoding preserves them untouched, encoding rejects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub sec: i64,
    pub nsec: u32,
}

impl Timestamp {
    #[must_use]
    pub const fn new(sec: i64, nsec: u32) -> Self {
        Self { sec, nsec }
    }
}

/// A MessagePack value that can hold any decodable shape.
///
/// Integers take the narrowest representation that holds the decoded
/// magnitude: `Int` for anything a signed 64-bit value can hold, `UInt`
/// only for unsigned-64-encoded values above `i64::MAX`. Map entries keep
/// their pairs as decoded; iteration order is not part of the contract.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    /// A signed 64-bit integer.
    Int(i64),
    /// An unsigned 64-bit integer that does not fit `Int`.
    UInt(u64),
    /// A 64-bit floating point number (32-bit encodings widen on decode).
    Float(f64),
    /// A UTF-8 string.
    Str(String),
    /// Raw binary data.
    Bin(Vec<u8>),
    /// An application-defined extension value.
    Ext(Ext),
    /// The built-in timestamp extension.
    Timestamp(Timestamp),
    /// An ordered sequence of values.
    Array(Vec<Value>),
    /// Key/value pairs; keys may be any value.
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Returns true if this value is nil.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Returns true if this value is a boolean.
    #[must_use]
    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    /// Returns true if this value is any numeric type.
    #[must_use]
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::UInt(_) | Value::Float(_))
    }

    /// Returns true if this value is a string.
    #[must_use]
    pub fn is_str(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    /// Returns true if this value is binary data.
    #[must_use]
    pub fn is_bin(&self) -> bool {
        matches!(self, Value::Bin(_))
    }

    /// Returns true if this value is an array.
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Returns true if this value is a map.
    #[must_use]
    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    /// If this is a boolean, returns the value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// If this is an integer that fits, returns the value as i64.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::UInt(n) if i64::try_from(*n).is_ok() => Some(*n as i64),
            _ => None,
        }
    }

    /// If this is a non-negative integer, returns the value as u64.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt(n) => Some(*n),
            Value::Int(n) if *n >= 0 => Some(*n as u64),
            _ => None,
        }
    }

    /// If this is a number, returns the value as f64.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(n) => Some(*n as f64),
            Value::UInt(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// If this is a string, returns a reference to it.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// If this is binary data, returns the bytes.
    #[must_use]
    pub fn as_bin(&self) -> Option<&[u8]> {
        match self {
            Value::Bin(b) => Some(b),
            _ => None,
        }
    }

    /// If this is an extension, returns it.
    #[must_use]
    pub fn as_ext(&self) -> Option<&Ext> {
        match self {
            Value::Ext(e) => Some(e),
            _ => None,
        }
    }

    /// If this is a timestamp, returns it.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// If this is an array, returns a reference to it.
    #[must_use]
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// If this is a map, returns its entries.
    #[must_use]
    pub fn as_map(&self) -> Option<&Vec<(Value, Value)>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Index into an array. Returns None if not an array or index out of bounds.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.as_array().and_then(|a| a.get(index))
    }

    /// Look up a string key in a map. Returns None if not a map or the key
    /// is absent.
    #[must_use]
    pub fn get_key(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| {
            m.iter()
                .find(|(k, _)| k.as_str() == Some(key))
                .map(|(_, v)| v)
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::UInt(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Bin(b) => {
                write!(f, "b\"")?;
                for byte in b {
                    write!(f, "\\x{byte:02x}")?;
                }
                write!(f, "\"")
            }
            Value::Ext(e) => write!(f, "ext({}, {} bytes)", e.tag, e.data.len()),
            Value::Timestamp(t) => write!(f, "timestamp({}.{:09})", t.sec, t.nsec),
            Value::Array(a) => {
                write!(f, "[")?;
                for (i, v) in a.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Value::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u64> for Value {
    #[allow(clippy::cast_possible_wrap)]
    fn from(v: u64) -> Self {
        if v <= i64::MAX as u64 {
            Value::Int(v as i64)
        } else {
            Value::UInt(v)
        }
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<Ext> for Value {
    fn from(v: Ext) -> Self {
        Value::Ext(v)
    }
}

impl From<Timestamp> for Value {
    fn from(v: Timestamp) -> Self {
        Value::Timestamp(v)
    }
}
