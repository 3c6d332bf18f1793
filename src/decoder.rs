// ABOUTME: MessagePack binary decoder: typed readers plus generic value decode.
// ABOUTME: Dispatches on the classified leading byte; the cursor records consumed bytes.

#![allow(clippy::missing_errors_doc)]

use crate::error::{Error, Result};
use crate::reader::Reader;
use crate::types::{Format, TIMESTAMP_TYPE};
use crate::value::{Ext, Timestamp, Value};

/// Validate and convert bytes to a UTF-8 string.
/// Uses simdutf8 for SIMD-accelerated validation when the feature is enabled.
#[cfg(feature = "simd-utf8")]
#[inline]
fn validate_utf8(bytes: &[u8]) -> Result<&str> {
    simdutf8::basic::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)
}

#[cfg(not(feature = "simd-utf8"))]
#[inline]
fn validate_utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)
}

/// Lengths at or beyond this cannot be represented downstream.
const MAX_CONTENT_LEN: u32 = 0x7fff_ffff;

/// A decoded extension header: the application type tag and the declared
/// payload length (always below 2^31).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtHeader {
    pub tag: i8,
    pub len: u32,
}

/// A MessagePack decoder that reads from a byte slice.
///
/// The decoder owns a single cursor into the input. Every successful
/// operation advances it by exactly the bytes spanned by what it decoded,
/// so the consumed length of any call is the [`position`](Self::position)
/// delta around it; for composite values that is the total span, header
/// plus nested content. After a failed operation the cursor is
/// unspecified; reposition with [`seek`](Self::seek) before reusing the
/// decoder.
pub struct Decoder<'a> {
    reader: Reader<'a>,
    pos: usize,
}

impl<'a> Decoder<'a> {
    /// Create a new decoder for the given data, positioned at offset 0.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            reader: Reader::new(data),
            pos: 0,
        }
    }

    /// Get the current position in the input.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Reposition the cursor to an absolute offset.
    pub fn seek(&mut self, offset: usize) {
        self.pos = offset;
    }

    /// Get the bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.reader.len().saturating_sub(self.pos)
    }

    /// Check if the cursor has reached the end of input.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.reader.len()
    }

    /// Check that the whole input was consumed.
    pub fn finish(&self) -> Result<()> {
        if self.pos < self.reader.len() {
            return Err(Error::TrailingBytes);
        }
        Ok(())
    }

    // =========================================================================
    // Cursor-advancing primitives over the byte source
    // =========================================================================

    /// Look at the leading byte at the current position without consuming it.
    #[inline]
    pub fn peek(&self) -> Result<u8> {
        self.reader.u8_at(self.pos)
    }

    #[inline]
    fn take_u8(&mut self) -> Result<u8> {
        let v = self.reader.u8_at(self.pos)?;
        self.pos += 1;
        Ok(v)
    }

    #[inline]
    fn take_i8(&mut self) -> Result<i8> {
        let v = self.reader.i8_at(self.pos)?;
        self.pos += 1;
        Ok(v)
    }

    #[inline]
    fn take_u16(&mut self) -> Result<u16> {
        let v = self.reader.u16_at(self.pos)?;
        self.pos += 2;
        Ok(v)
    }

    #[inline]
    fn take_i16(&mut self) -> Result<i16> {
        let v = self.reader.i16_at(self.pos)?;
        self.pos += 2;
        Ok(v)
    }

    #[inline]
    fn take_u32(&mut self) -> Result<u32> {
        let v = self.reader.u32_at(self.pos)?;
        self.pos += 4;
        Ok(v)
    }

    #[inline]
    fn take_i32(&mut self) -> Result<i32> {
        let v = self.reader.i32_at(self.pos)?;
        self.pos += 4;
        Ok(v)
    }

    #[inline]
    fn take_u64(&mut self) -> Result<u64> {
        let v = self.reader.u64_at(self.pos)?;
        self.pos += 8;
        Ok(v)
    }

    #[inline]
    fn take_i64(&mut self) -> Result<i64> {
        let v = self.reader.i64_at(self.pos)?;
        self.pos += 8;
        Ok(v)
    }

    #[inline]
    fn take_f32(&mut self) -> Result<f32> {
        let v = self.reader.f32_at(self.pos)?;
        self.pos += 4;
        Ok(v)
    }

    #[inline]
    fn take_f64(&mut self) -> Result<f64> {
        let v = self.reader.f64_at(self.pos)?;
        self.pos += 8;
        Ok(v)
    }

    #[inline]
    fn take_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let bytes = self.reader.bytes_at(self.pos, n)?;
        self.pos += n;
        Ok(bytes)
    }

    // =========================================================================
    // Scalar readers
    // =========================================================================

    /// Read a nil value.
    pub fn read_nil(&mut self) -> Result<()> {
        let byte = self.peek()?;
        match Format::from_byte(byte) {
            Format::Nil => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(Error::mismatch("Nil", byte)),
        }
    }

    /// Read a boolean.
    pub fn read_bool(&mut self) -> Result<bool> {
        let byte = self.peek()?;
        match Format::from_byte(byte) {
            Format::False => {
                self.pos += 1;
                Ok(false)
            }
            Format::True => {
                self.pos += 1;
                Ok(true)
            }
            _ => Err(Error::mismatch("Boolean", byte)),
        }
    }

    /// Decode any integer format into an i128 that holds every stored
    /// magnitude exactly, together with the source format name used to
    /// label overflows when narrowing to the caller's target width.
    fn take_int(&mut self, expected: &'static str) -> Result<(i128, &'static str)> {
        let byte = self.peek()?;
        let format = Format::from_byte(byte);
        match format {
            Format::PositiveFixInt(v) => {
                self.pos += 1;
                Ok((i128::from(v), format.name()))
            }
            Format::NegativeFixInt(v) => {
                self.pos += 1;
                Ok((i128::from(v), format.name()))
            }
            Format::Uint8 => {
                self.pos += 1;
                Ok((i128::from(self.take_u8()?), format.name()))
            }
            Format::Uint16 => {
                self.pos += 1;
                Ok((i128::from(self.take_u16()?), format.name()))
            }
            // An unsigned 32-bit payload is taken as the unsigned value,
            // never sign-extended, so it always fits a 64-bit target.
            Format::Uint32 => {
                self.pos += 1;
                Ok((i128::from(self.take_u32()?), format.name()))
            }
            Format::Uint64 => {
                self.pos += 1;
                Ok((i128::from(self.take_u64()?), format.name()))
            }
            Format::Int8 => {
                self.pos += 1;
                Ok((i128::from(self.take_i8()?), format.name()))
            }
            Format::Int16 => {
                self.pos += 1;
                Ok((i128::from(self.take_i16()?), format.name()))
            }
            Format::Int32 => {
                self.pos += 1;
                Ok((i128::from(self.take_i32()?), format.name()))
            }
            Format::Int64 => {
                self.pos += 1;
                Ok((i128::from(self.take_i64()?), format.name()))
            }
            _ => Err(Error::mismatch(expected, byte)),
        }
    }

    /// Read an integer into a signed 8-bit target.
    pub fn read_i8(&mut self) -> Result<i8> {
        let (v, src) = self.take_int("Integer")?;
        i8::try_from(v).map_err(|_| Error::IntegerOverflow(src))
    }

    /// Read an integer into a signed 16-bit target.
    pub fn read_i16(&mut self) -> Result<i16> {
        let (v, src) = self.take_int("Integer")?;
        i16::try_from(v).map_err(|_| Error::IntegerOverflow(src))
    }

    /// Read an integer into a signed 32-bit target.
    pub fn read_i32(&mut self) -> Result<i32> {
        let (v, src) = self.take_int("Integer")?;
        i32::try_from(v).map_err(|_| Error::IntegerOverflow(src))
    }

    /// Read an integer into a signed 64-bit target.
    ///
    /// An unsigned-64 payload with its top bit set does not fit and fails
    /// with an overflow named for the source format.
    pub fn read_i64(&mut self) -> Result<i64> {
        let (v, src) = self.take_int("Integer")?;
        i64::try_from(v).map_err(|_| Error::IntegerOverflow(src))
    }

    /// Read an integer into an unsigned 64-bit target.
    ///
    /// Accepts every integer format; the full unsigned-64 range passes
    /// through unchanged. Negative stored values fail with an overflow
    /// named for the source format.
    pub fn read_u64(&mut self) -> Result<u64> {
        let (v, src) = self.take_int("Integer")?;
        u64::try_from(v).map_err(|_| Error::IntegerOverflow(src))
    }

    /// Read a float, widening 32-bit payloads to f64.
    pub fn read_f64(&mut self) -> Result<f64> {
        let byte = self.peek()?;
        match Format::from_byte(byte) {
            Format::Float32 => {
                self.pos += 1;
                Ok(f64::from(self.take_f32()?))
            }
            Format::Float64 => {
                self.pos += 1;
                self.take_f64()
            }
            _ => Err(Error::mismatch("Float", byte)),
        }
    }

    /// Read a float, narrowing the decoded f64 back to single precision.
    #[allow(clippy::cast_possible_truncation)]
    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_f64().map(|v| v as f32)
    }

    // =========================================================================
    // String / binary headers and payloads
    // =========================================================================

    /// Validate an explicit 32-bit content length before any payload read.
    fn check_len32(len: u32, format: &'static str) -> Result<u32> {
        if len & 0x8000_0000 != 0 {
            return Err(Error::MalformedSize(format));
        }
        if len >= MAX_CONTENT_LEN {
            return Err(Error::TooLarge(format));
        }
        Ok(len)
    }

    /// Try the string-length family; `Ok(None)` means the byte belongs to
    /// another family and the caller may fall back.
    fn try_str_len(&mut self) -> Result<Option<usize>> {
        let byte = self.peek()?;
        let len = match Format::from_byte(byte) {
            Format::FixStr(n) => {
                self.pos += 1;
                usize::from(n)
            }
            Format::Str8 => {
                self.pos += 1;
                usize::from(self.take_u8()?)
            }
            Format::Str16 => {
                self.pos += 1;
                usize::from(self.take_u16()?)
            }
            Format::Str32 => {
                self.pos += 1;
                let len = Self::check_len32(self.take_u32()?, "Str32")?;
                len as usize
            }
            _ => return Ok(None),
        };
        Ok(Some(len))
    }

    /// Try the binary-length family; `Ok(None)` means fall back.
    fn try_bin_len(&mut self) -> Result<Option<usize>> {
        let byte = self.peek()?;
        let len = match Format::from_byte(byte) {
            Format::Bin8 => {
                self.pos += 1;
                usize::from(self.take_u8()?)
            }
            Format::Bin16 => {
                self.pos += 1;
                usize::from(self.take_u16()?)
            }
            Format::Bin32 => {
                self.pos += 1;
                let len = Self::check_len32(self.take_u32()?, "Bin32")?;
                len as usize
            }
            _ => return Ok(None),
        };
        Ok(Some(len))
    }

    /// Read a string length header.
    ///
    /// Accepts the binary-length family as a fallback, so a value physically
    /// encoded with bin formats can still be read as a string.
    pub fn read_str_len(&mut self) -> Result<usize> {
        if let Some(len) = self.try_str_len()? {
            return Ok(len);
        }
        if let Some(len) = self.try_bin_len()? {
            return Ok(len);
        }
        Err(Error::mismatch("String", self.peek()?))
    }

    /// Read a binary length header.
    ///
    /// Accepts the string-length family as a fallback, mirroring
    /// [`read_str_len`](Self::read_str_len).
    pub fn read_bin_len(&mut self) -> Result<usize> {
        if let Some(len) = self.try_bin_len()? {
            return Ok(len);
        }
        if let Some(len) = self.try_str_len()? {
            return Ok(len);
        }
        Err(Error::mismatch("Binary", self.peek()?))
    }

    /// Read a string: header plus exactly that many UTF-8 payload bytes.
    pub fn read_str(&mut self) -> Result<&'a str> {
        let len = self.read_str_len()?;
        if len == 0 {
            return Ok("");
        }
        let bytes = self.take_bytes(len)?;
        validate_utf8(bytes)
    }

    /// Read binary data: header plus exactly that many payload bytes.
    pub fn read_bin(&mut self) -> Result<&'a [u8]> {
        let len = self.read_bin_len()?;
        self.take_bytes(len)
    }

    // =========================================================================
    // Container headers
    // =========================================================================

    /// Read an array element count.
    pub fn read_array_len(&mut self) -> Result<usize> {
        let byte = self.peek()?;
        match Format::from_byte(byte) {
            Format::FixArray(n) => {
                self.pos += 1;
                Ok(usize::from(n))
            }
            Format::Array16 => {
                self.pos += 1;
                Ok(usize::from(self.take_u16()?))
            }
            Format::Array32 => {
                self.pos += 1;
                let count = self.take_u32()?;
                if count & 0x8000_0000 != 0 {
                    return Err(Error::MalformedSize("Array32"));
                }
                Ok(count as usize)
            }
            _ => Err(Error::mismatch("Array", byte)),
        }
    }

    /// Read a map pair count.
    pub fn read_map_len(&mut self) -> Result<usize> {
        let byte = self.peek()?;
        match Format::from_byte(byte) {
            Format::FixMap(n) => {
                self.pos += 1;
                Ok(usize::from(n))
            }
            Format::Map16 => {
                self.pos += 1;
                Ok(usize::from(self.take_u16()?))
            }
            Format::Map32 => {
                self.pos += 1;
                let count = self.take_u32()?;
                if count & 0x8000_0000 != 0 {
                    return Err(Error::MalformedSize("Map32"));
                }
                Ok(count as usize)
            }
            _ => Err(Error::mismatch("Map", byte)),
        }
    }

    // =========================================================================
    // Extension types and timestamps
    // =========================================================================

    fn take_ext_header(&mut self, expected: &'static str) -> Result<ExtHeader> {
        let byte = self.peek()?;
        match Format::from_byte(byte) {
            Format::FixExt1 => {
                self.pos += 1;
                Ok(ExtHeader {
                    tag: self.take_i8()?,
                    len: 1,
                })
            }
            Format::FixExt2 => {
                self.pos += 1;
                Ok(ExtHeader {
                    tag: self.take_i8()?,
                    len: 2,
                })
            }
            Format::FixExt4 => {
                self.pos += 1;
                Ok(ExtHeader {
                    tag: self.take_i8()?,
                    len: 4,
                })
            }
            Format::FixExt8 => {
                self.pos += 1;
                Ok(ExtHeader {
                    tag: self.take_i8()?,
                    len: 8,
                })
            }
            Format::FixExt16 => {
                self.pos += 1;
                Ok(ExtHeader {
                    tag: self.take_i8()?,
                    len: 16,
                })
            }
            Format::Ext8 => {
                self.pos += 1;
                let len = u32::from(self.take_u8()?);
                Ok(ExtHeader {
                    len,
                    tag: self.take_i8()?,
                })
            }
            Format::Ext16 => {
                self.pos += 1;
                let len = u32::from(self.take_u16()?);
                Ok(ExtHeader {
                    len,
                    tag: self.take_i8()?,
                })
            }
            Format::Ext32 => {
                self.pos += 1;
                let len = self.take_u32()?;
                if len & 0x8000_0000 != 0 {
                    return Err(Error::MalformedSize("Ext32"));
                }
                Ok(ExtHeader {
                    len,
                    tag: self.take_i8()?,
                })
            }
            _ => Err(Error::mismatch(expected, byte)),
        }
    }

    /// Read an extension header: type tag plus declared payload length.
    pub fn read_ext_header(&mut self) -> Result<ExtHeader> {
        self.take_ext_header("Ext")
    }

    /// Read a whole extension value, payload copied verbatim.
    pub fn read_ext(&mut self) -> Result<Ext> {
        let header = self.take_ext_header("Ext")?;
        let data = self.take_bytes(header.len as usize)?.to_vec();
        Ok(Ext::new(header.tag, data))
    }

    /// Read the built-in timestamp extension.
    pub fn read_timestamp(&mut self) -> Result<Timestamp> {
        let header = self.take_ext_header("Timestamp")?;
        if header.tag != TIMESTAMP_TYPE {
            return Err(Error::TypeMismatch {
                expected: "Timestamp",
                found: "Ext",
            });
        }
        self.take_timestamp_payload(header.len)
    }

    /// Decode a timestamp payload after its ext header, by declared length.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn take_timestamp_payload(&mut self, len: u32) -> Result<Timestamp> {
        match len {
            4 => {
                let sec = self.take_u32()?;
                Ok(Timestamp::new(i64::from(sec), 0))
            }
            8 => {
                // Low 34 bits are seconds, high 30 bits are nanoseconds.
                let data = self.take_u64()?;
                let sec = (data & 0x3_ffff_ffff) as i64;
                let nsec = (data >> 34) as u32;
                Ok(Timestamp::new(sec, nsec))
            }
            12 => {
                // Nanoseconds precede seconds on the wire.
                let nsec = self.take_u32()?;
                let sec = self.take_i64()?;
                Ok(Timestamp::new(sec, nsec))
            }
            other => Err(Error::MalformedExtLength(other)),
        }
    }

    // =========================================================================
    // Generic value decode
    // =========================================================================

    /// Decode one value of any shape at the current position.
    ///
    /// Composite values recurse; the cursor ends exactly past the last
    /// nested byte, so the position delta is the value's total span.
    pub fn read_value(&mut self) -> Result<Value> {
        let byte = self.peek()?;
        match Format::from_byte(byte) {
            Format::PositiveFixInt(v) => {
                self.pos += 1;
                Ok(Value::Int(i64::from(v)))
            }
            Format::NegativeFixInt(v) => {
                self.pos += 1;
                Ok(Value::Int(i64::from(v)))
            }
            Format::Nil => {
                self.pos += 1;
                Ok(Value::Nil)
            }
            Format::NeverUsed => Err(Error::ReservedMarker),
            Format::False => {
                self.pos += 1;
                Ok(Value::Bool(false))
            }
            Format::True => {
                self.pos += 1;
                Ok(Value::Bool(true))
            }
            Format::Uint8 => {
                self.pos += 1;
                Ok(Value::Int(i64::from(self.take_u8()?)))
            }
            Format::Uint16 => {
                self.pos += 1;
                Ok(Value::Int(i64::from(self.take_u16()?)))
            }
            Format::Uint32 => {
                self.pos += 1;
                Ok(Value::Int(i64::from(self.take_u32()?)))
            }
            Format::Uint64 => {
                self.pos += 1;
                Ok(Value::from(self.take_u64()?))
            }
            Format::Int8 => {
                self.pos += 1;
                Ok(Value::Int(i64::from(self.take_i8()?)))
            }
            Format::Int16 => {
                self.pos += 1;
                Ok(Value::Int(i64::from(self.take_i16()?)))
            }
            Format::Int32 => {
                self.pos += 1;
                Ok(Value::Int(i64::from(self.take_i32()?)))
            }
            Format::Int64 => {
                self.pos += 1;
                Ok(Value::Int(self.take_i64()?))
            }
            Format::Float32 | Format::Float64 => Ok(Value::Float(self.read_f64()?)),
            Format::FixStr(_) | Format::Str8 | Format::Str16 | Format::Str32 => {
                Ok(Value::Str(self.read_str()?.to_owned()))
            }
            Format::Bin8 | Format::Bin16 | Format::Bin32 => {
                Ok(Value::Bin(self.read_bin()?.to_vec()))
            }
            Format::FixArray(_) | Format::Array16 | Format::Array32 => {
                let count = self.read_array_len()?;
                let mut arr = Vec::with_capacity(count.min(self.remaining()));
                for _ in 0..count {
                    arr.push(self.read_value()?);
                }
                Ok(Value::Array(arr))
            }
            Format::FixMap(_) | Format::Map16 | Format::Map32 => {
                let count = self.read_map_len()?;
                let mut entries: Vec<(Value, Value)> =
                    Vec::with_capacity(count.min(self.remaining()));
                for _ in 0..count {
                    let key = self.read_value()?;
                    let val = self.read_value()?;
                    // Later entries overwrite earlier ones with the same key.
                    if let Some(slot) = entries.iter_mut().find(|(k, _)| *k == key) {
                        slot.1 = val;
                    } else {
                        entries.push((key, val));
                    }
                }
                Ok(Value::Map(entries))
            }
            Format::FixExt1
            | Format::FixExt2
            | Format::FixExt4
            | Format::FixExt8
            | Format::FixExt16
            | Format::Ext8
            | Format::Ext16
            | Format::Ext32 => {
                let header = self.take_ext_header("Ext")?;
                if header.tag == TIMESTAMP_TYPE {
                    return Ok(Value::Timestamp(self.take_timestamp_payload(header.len)?));
                }
                let data = self.take_bytes(header.len as usize)?.to_vec();
                Ok(Value::Ext(Ext::new(header.tag, data)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn consumed<'a, T>(data: &'a [u8], f: impl FnOnce(&mut Decoder<'a>) -> Result<T>) -> (T, usize) {
        let mut dec = Decoder::new(data);
        let v = f(&mut dec).unwrap();
        (v, dec.position())
    }

    #[test]
    fn test_read_nil_and_bool() {
        assert_eq!(consumed(&[0xc0], Decoder::read_nil), ((), 1));
        assert_eq!(consumed(&[0xc2], Decoder::read_bool), (false, 1));
        assert_eq!(consumed(&[0xc3], Decoder::read_bool), (true, 1));

        let mut dec = Decoder::new(&[0xc3]);
        assert_eq!(
            dec.read_nil(),
            Err(Error::TypeMismatch {
                expected: "Nil",
                found: "True"
            })
        );
    }

    #[test]
    fn test_fixints() {
        assert_eq!(consumed(&[0x00], Decoder::read_i64), (0, 1));
        assert_eq!(consumed(&[0x7f], Decoder::read_i64), (127, 1));
        assert_eq!(consumed(&[0xff], Decoder::read_i64), (-1, 1));
        assert_eq!(consumed(&[0xe0], Decoder::read_i64), (-32, 1));
        // Fixints fit every target width by construction.
        assert_eq!(consumed(&[0x7f], Decoder::read_i8), (127, 1));
        assert_eq!(consumed(&[0xe0], Decoder::read_i8), (-32, 1));
    }

    #[test]
    fn test_stored_formats_consume_header_plus_payload() {
        assert_eq!(consumed(&[0xcc, 0xff], Decoder::read_i64), (255, 2));
        assert_eq!(consumed(&[0xcd, 0x01, 0x00], Decoder::read_i64), (256, 3));
        assert_eq!(
            consumed(&[0xce, 0x00, 0x01, 0x00, 0x00], Decoder::read_i64),
            (65536, 5)
        );
        assert_eq!(
            consumed(
                &[0xcf, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00],
                Decoder::read_i64
            ),
            (1 << 32, 9)
        );
        assert_eq!(consumed(&[0xd0, 0x80], Decoder::read_i64), (-128, 2));
        assert_eq!(consumed(&[0xd1, 0xff, 0x00], Decoder::read_i64), (-256, 3));
        assert_eq!(
            consumed(&[0xd2, 0xff, 0xff, 0xff, 0xff], Decoder::read_i64),
            (-1, 5)
        );
        let data = [0xd3, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
        assert_eq!(consumed(&data, Decoder::read_i64), (-1, 9));
    }

    #[test]
    fn test_overflow_named_for_source_format() {
        // uint16 value 300 into an 8-bit target
        let mut dec = Decoder::new(&[0xcd, 0x01, 0x2c]);
        assert_eq!(dec.read_i8(), Err(Error::IntegerOverflow("Uint16")));

        // uint8 value 200 into an 8-bit target
        let mut dec = Decoder::new(&[0xcc, 0xc8]);
        assert_eq!(dec.read_i8(), Err(Error::IntegerOverflow("Uint8")));

        // int32 value -70000 into a 16-bit target
        let mut dec = Decoder::new(&[0xd2, 0xff, 0xfe, 0xee, 0x90]);
        assert_eq!(dec.read_i16(), Err(Error::IntegerOverflow("Int32")));

        // int64 minimum into a 32-bit target
        let mut dec = Decoder::new(&[0xd3, 0x80, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(dec.read_i32(), Err(Error::IntegerOverflow("Int64")));
    }

    #[test]
    fn test_uint32_never_overflows_i64() {
        // Raw pattern with the sign bit set reads as the unsigned value.
        let (v, n) = consumed(&[0xce, 0xff, 0xff, 0xff, 0xff], Decoder::read_i64);
        assert_eq!(v, 4_294_967_295);
        assert_eq!(n, 5);
    }

    #[test]
    fn test_uint64_top_bit_set() {
        let data = [0xcf, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
        let mut dec = Decoder::new(&data);
        assert_eq!(dec.read_i64(), Err(Error::IntegerOverflow("Uint64")));

        // The unsigned target accepts the full range.
        let (v, n) = consumed(&data, Decoder::read_u64);
        assert_eq!(v, u64::MAX);
        assert_eq!(n, 9);
    }

    #[test]
    fn test_negative_into_unsigned_target() {
        let mut dec = Decoder::new(&[0xd0, 0xff]);
        assert_eq!(dec.read_u64(), Err(Error::IntegerOverflow("Int8")));
        let mut dec = Decoder::new(&[0xfe]);
        assert_eq!(dec.read_u64(), Err(Error::IntegerOverflow("NegativeFixInt")));
    }

    #[test]
    fn test_non_integer_is_mismatch() {
        let mut dec = Decoder::new(&[0xa1, b'x']);
        assert_eq!(
            dec.read_i64(),
            Err(Error::TypeMismatch {
                expected: "Integer",
                found: "FixStr"
            })
        );
    }

    #[test]
    fn test_floats() {
        let mut data = vec![0xca];
        data.extend_from_slice(&1.5f32.to_be_bytes());
        assert_eq!(consumed(&data, Decoder::read_f64), (1.5, 5));

        let mut data = vec![0xcb];
        data.extend_from_slice(&(-0.25f64).to_be_bytes());
        assert_eq!(consumed(&data, Decoder::read_f64), (-0.25, 9));

        // Single-precision entry point narrows a double payload.
        assert_eq!(consumed(&data, Decoder::read_f32), (-0.25f32, 9));

        let mut dec = Decoder::new(&[0x01]);
        assert_eq!(
            dec.read_f64(),
            Err(Error::TypeMismatch {
                expected: "Float",
                found: "PositiveFixInt"
            })
        );
    }

    #[test]
    fn test_empty_string_consumes_one_byte() {
        let (s, n) = consumed(&[0xa0], Decoder::read_str);
        assert_eq!(s, "");
        assert_eq!(n, 1);
    }

    #[test]
    fn test_str_formats() {
        let (s, n) = consumed(&[0xa5, b'h', b'e', b'l', b'l', b'o'], Decoder::read_str);
        assert_eq!(s, "hello");
        assert_eq!(n, 6);

        let (s, n) = consumed(&[0xd9, 0x02, b'h', b'i'], Decoder::read_str);
        assert_eq!(s, "hi");
        assert_eq!(n, 4);

        let (s, n) = consumed(&[0xda, 0x00, 0x01, b'x'], Decoder::read_str);
        assert_eq!(s, "x");
        assert_eq!(n, 4);

        let (s, n) = consumed(&[0xdb, 0x00, 0x00, 0x00, 0x01, b'x'], Decoder::read_str);
        assert_eq!(s, "x");
        assert_eq!(n, 6);
    }

    #[test]
    fn test_str_bin_header_fallback() {
        // A bin8-encoded payload read through the string entry point.
        let (s, n) = consumed(&[0xc4, 0x02, b'o', b'k'], Decoder::read_str);
        assert_eq!(s, "ok");
        assert_eq!(n, 4);

        // A fixstr-encoded payload read through the binary entry point.
        let (b, n) = consumed(&[0xa2, 0x01, 0x02], Decoder::read_bin);
        assert_eq!(b, &[0x01, 0x02]);
        assert_eq!(n, 3);

        // Neither family: mismatch names the entry point that was asked for.
        let mut dec = Decoder::new(&[0x90]);
        assert_eq!(
            dec.read_str_len(),
            Err(Error::TypeMismatch {
                expected: "String",
                found: "FixArray"
            })
        );
        let mut dec = Decoder::new(&[0x90]);
        assert_eq!(
            dec.read_bin_len(),
            Err(Error::TypeMismatch {
                expected: "Binary",
                found: "FixArray"
            })
        );
    }

    #[test]
    fn test_invalid_utf8() {
        let mut dec = Decoder::new(&[0xa2, 0xff, 0xfe]);
        assert_eq!(dec.read_str(), Err(Error::InvalidUtf8));
    }

    #[test]
    fn test_str32_size_checks() {
        let mut dec = Decoder::new(&[0xdb, 0x80, 0x00, 0x00, 0x00]);
        assert_eq!(dec.read_str_len(), Err(Error::MalformedSize("Str32")));

        let mut dec = Decoder::new(&[0xdb, 0x7f, 0xff, 0xff, 0xff]);
        assert_eq!(dec.read_str_len(), Err(Error::TooLarge("Str32")));

        let mut dec = Decoder::new(&[0xc6, 0x80, 0x00, 0x00, 0x00]);
        assert_eq!(dec.read_bin_len(), Err(Error::MalformedSize("Bin32")));
    }

    #[test]
    fn test_bin_formats() {
        let (b, n) = consumed(&[0xc4, 0x03, 1, 2, 3], Decoder::read_bin);
        assert_eq!(b, &[1, 2, 3]);
        assert_eq!(n, 5);

        let (b, n) = consumed(&[0xc5, 0x00, 0x02, 9, 8], Decoder::read_bin);
        assert_eq!(b, &[9, 8]);
        assert_eq!(n, 5);
    }

    #[test]
    fn test_array_and_map_headers() {
        assert_eq!(consumed(&[0x93], Decoder::read_array_len), (3, 1));
        assert_eq!(
            consumed(&[0xdc, 0x01, 0x00], Decoder::read_array_len),
            (256, 3)
        );
        assert_eq!(
            consumed(&[0xdd, 0x00, 0x01, 0x00, 0x00], Decoder::read_array_len),
            (65536, 5)
        );
        assert_eq!(consumed(&[0x82], Decoder::read_map_len), (2, 1));
        assert_eq!(consumed(&[0xde, 0x00, 0x10], Decoder::read_map_len), (16, 3));

        let mut dec = Decoder::new(&[0xdd, 0x80, 0x00, 0x00, 0x00]);
        assert_eq!(dec.read_array_len(), Err(Error::MalformedSize("Array32")));
        let mut dec = Decoder::new(&[0xdf, 0xff, 0xff, 0xff, 0xff]);
        assert_eq!(dec.read_map_len(), Err(Error::MalformedSize("Map32")));
    }

    #[test]
    fn test_empty_containers_consume_header_only() {
        let (v, n) = consumed(&[0x90], Decoder::read_value);
        assert_eq!(v, Value::Array(vec![]));
        assert_eq!(n, 1);

        let (v, n) = consumed(&[0xde, 0x00, 0x00], Decoder::read_value);
        assert_eq!(v, Value::Map(vec![]));
        assert_eq!(n, 3);
    }

    #[test]
    fn test_ext_headers() {
        let (h, n) = consumed(&[0xd4, 0x05], Decoder::read_ext_header);
        assert_eq!(h, ExtHeader { tag: 5, len: 1 });
        assert_eq!(n, 2);

        let (h, n) = consumed(&[0xc7, 0x0a, 0x20], Decoder::read_ext_header);
        assert_eq!(h, ExtHeader { tag: 32, len: 10 });
        assert_eq!(n, 3);

        let (h, n) = consumed(&[0xc8, 0x01, 0x00, 0xff], Decoder::read_ext_header);
        assert_eq!(h, ExtHeader { tag: -1, len: 256 });
        assert_eq!(n, 4);

        let (h, n) = consumed(&[0xc9, 0x00, 0x00, 0x00, 0x05, 0x07], Decoder::read_ext_header);
        assert_eq!(h, ExtHeader { tag: 7, len: 5 });
        assert_eq!(n, 6);

        let mut dec = Decoder::new(&[0xc9, 0x80, 0x00, 0x00, 0x00, 0x07]);
        assert_eq!(dec.read_ext_header(), Err(Error::MalformedSize("Ext32")));
    }

    #[test]
    fn test_fixext1_value() {
        let (v, n) = consumed(&[0xd4, 0x05, 0xab], Decoder::read_ext);
        assert_eq!(v, Ext::new(5, vec![0xab]));
        assert_eq!(n, 3);
    }

    #[test]
    fn test_timestamp_32() {
        let mut data = vec![0xd6, 0xff];
        data.extend_from_slice(&1_000_000_000u32.to_be_bytes());
        let (t, n) = consumed(&data, Decoder::read_timestamp);
        assert_eq!(t, Timestamp::new(1_000_000_000, 0));
        assert_eq!(n, 6);
    }

    #[test]
    fn test_timestamp_64() {
        // nsec=1, sec=2 packed as (nsec << 34) | sec
        let payload: u64 = (1 << 34) | 2;
        let mut data = vec![0xd7, 0xff];
        data.extend_from_slice(&payload.to_be_bytes());
        let (t, n) = consumed(&data, Decoder::read_timestamp);
        assert_eq!(t, Timestamp::new(2, 1));
        assert_eq!(n, 10);
    }

    #[test]
    fn test_timestamp_96_field_order() {
        // Nanoseconds first, then signed seconds.
        let mut data = vec![0xc7, 0x0c, 0xff];
        data.extend_from_slice(&500_000_000u32.to_be_bytes());
        data.extend_from_slice(&(-1i64).to_be_bytes());
        let (t, n) = consumed(&data, Decoder::read_timestamp);
        assert_eq!(t, Timestamp::new(-1, 500_000_000));
        assert_eq!(n, 15);
    }

    #[test]
    fn test_timestamp_bad_payload_length() {
        let mut dec = Decoder::new(&[0xd5, 0xff, 0x00, 0x00]);
        assert_eq!(dec.read_timestamp(), Err(Error::MalformedExtLength(2)));
    }

    #[test]
    fn test_timestamp_wrong_tag() {
        let mut dec = Decoder::new(&[0xd6, 0x05, 0, 0, 0, 0]);
        assert_eq!(
            dec.read_timestamp(),
            Err(Error::TypeMismatch {
                expected: "Timestamp",
                found: "Ext"
            })
        );
    }

    #[test]
    fn test_read_value_scalars() {
        assert_eq!(consumed(&[0xc0], Decoder::read_value), (Value::Nil, 1));
        assert_eq!(
            consumed(&[0xc3], Decoder::read_value),
            (Value::Bool(true), 1)
        );
        assert_eq!(consumed(&[0x2a], Decoder::read_value), (Value::Int(42), 1));
        assert_eq!(
            consumed(&[0xd0, 0x80], Decoder::read_value),
            (Value::Int(-128), 2)
        );
    }

    #[test]
    fn test_read_value_uint64_narrowest() {
        // Fits i64: becomes Int.
        let (v, _) = consumed(
            &[0xcf, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x07],
            Decoder::read_value,
        );
        assert_eq!(v, Value::Int(7));

        // Top half of the unsigned range: stays UInt.
        let (v, _) = consumed(
            &[0xcf, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff],
            Decoder::read_value,
        );
        assert_eq!(v, Value::UInt(u64::MAX));
    }

    #[test]
    fn test_read_value_nested_consumed_total() {
        // {"a": [1, 2], "b": "xy"}
        let data = [
            0x82, 0xa1, b'a', 0x92, 0x01, 0x02, 0xa1, b'b', 0xa2, b'x', b'y',
        ];
        let (v, n) = consumed(&data, Decoder::read_value);
        assert_eq!(n, data.len());
        assert_eq!(
            v.get_key("a"),
            Some(&Value::Array(vec![Value::Int(1), Value::Int(2)]))
        );
        assert_eq!(v.get_key("b"), Some(&Value::Str("xy".into())));
    }

    #[test]
    fn test_read_value_duplicate_keys_keep_last() {
        // {"k": 1, "k": 2}
        let data = [0x82, 0xa1, b'k', 0x01, 0xa1, b'k', 0x02];
        let (v, _) = consumed(&data, Decoder::read_value);
        let map = v.as_map().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(v.get_key("k"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_read_value_timestamp_and_ext() {
        let mut data = vec![0xd6, 0xff];
        data.extend_from_slice(&7u32.to_be_bytes());
        let (v, _) = consumed(&data, Decoder::read_value);
        assert_eq!(v, Value::Timestamp(Timestamp::new(7, 0)));

        let (v, n) = consumed(&[0xd5, 0x02, 0xde, 0xad], Decoder::read_value);
        assert_eq!(v, Value::Ext(Ext::new(2, vec![0xde, 0xad])));
        assert_eq!(n, 4);
    }

    #[test]
    fn test_read_value_reserved_byte() {
        let mut dec = Decoder::new(&[0xc1]);
        assert_eq!(dec.read_value(), Err(Error::ReservedMarker));
    }

    #[test]
    fn test_truncated_payload() {
        let mut dec = Decoder::new(&[0xcd, 0x01]);
        assert_eq!(dec.read_i64(), Err(Error::Truncated));

        let mut dec = Decoder::new(&[0xa5, b'h', b'i']);
        assert_eq!(dec.read_str(), Err(Error::Truncated));

        // Declared length larger than the buffer surfaces as a bounds failure.
        let mut dec = Decoder::new(&[0xc4, 0xff, 0x00]);
        assert_eq!(dec.read_bin(), Err(Error::Truncated));
    }

    #[test]
    fn test_decode_at_offset() {
        let data = [0xc0, 0xc0, 0x2a];
        let mut dec = Decoder::new(&data);
        dec.seek(2);
        assert_eq!(dec.read_i64().unwrap(), 42);
        assert_eq!(dec.position(), 3);
        dec.finish().unwrap();
    }

    #[test]
    fn test_sequential_reads_share_cursor() {
        let data = [0x01, 0xa1, b'z', 0xc3];
        let mut dec = Decoder::new(&data);
        assert_eq!(dec.read_i64().unwrap(), 1);
        assert_eq!(dec.remaining(), 3);
        assert_eq!(dec.read_str().unwrap(), "z");
        assert!(dec.read_bool().unwrap());
        assert!(dec.is_empty());
        dec.finish().unwrap();
    }
}
