// ABOUTME: MessagePack binary encoder producing canonical (shortest) encodings.
// ABOUTME: Writes to any std::io::Write sink; headers always precede payloads.

use crate::error::{Error, Result};
use crate::types::{marker, TIMESTAMP_TYPE};
use crate::value::Timestamp;
use std::io::Write;

/// Lengths at or beyond this cannot be decoded again.
const MAX_CONTENT_LEN: usize = 0x7fff_ffff;

/// A MessagePack encoder that writes to the given sink.
///
/// Every value is written in its canonical form: the shortest format whose
/// range holds it. Container headers carry their counts up front, so the
/// caller must know element counts before writing them.
pub struct Encoder<W: Write> {
    writer: W,
}

impl<W: Write> Encoder<W> {
    /// Create a new encoder that writes to the given writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consume the encoder and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Get a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    #[inline]
    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.writer.write_all(&[byte])?;
        Ok(())
    }

    #[inline]
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes)?;
        Ok(())
    }

    /// Encode a nil value.
    pub fn write_nil(&mut self) -> Result<()> {
        self.write_byte(marker::NIL)
    }

    /// Encode a boolean.
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_byte(if value { marker::TRUE } else { marker::FALSE })
    }

    /// Encode an unsigned integer in its shortest format.
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        if value < 0x80 {
            return self.write_byte(value as u8);
        }
        if value <= u64::from(u8::MAX) {
            self.write_byte(marker::UINT8)?;
            return self.write_byte(value as u8);
        }
        if value <= u64::from(u16::MAX) {
            self.write_byte(marker::UINT16)?;
            return self.write_bytes(&(value as u16).to_be_bytes());
        }
        if value <= u64::from(u32::MAX) {
            self.write_byte(marker::UINT32)?;
            return self.write_bytes(&(value as u32).to_be_bytes());
        }
        self.write_byte(marker::UINT64)?;
        self.write_bytes(&value.to_be_bytes())
    }

    /// Encode a signed integer in its shortest format.
    ///
    /// Non-negative values use the unsigned family, so the same number
    /// always produces the same bytes regardless of how the caller held it.
    #[allow(clippy::cast_sign_loss)]
    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        if value >= 0 {
            return self.write_u64(value as u64);
        }
        if value >= -32 {
            return self.write_byte(value as u8);
        }
        if value >= i64::from(i8::MIN) {
            self.write_byte(marker::INT8)?;
            return self.write_byte(value as u8);
        }
        if value >= i64::from(i16::MIN) {
            self.write_byte(marker::INT16)?;
            return self.write_bytes(&(value as i16).to_be_bytes());
        }
        if value >= i64::from(i32::MIN) {
            self.write_byte(marker::INT32)?;
            return self.write_bytes(&(value as i32).to_be_bytes());
        }
        self.write_byte(marker::INT64)?;
        self.write_bytes(&value.to_be_bytes())
    }

    /// Encode a 32-bit float.
    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.write_byte(marker::FLOAT32)?;
        self.write_bytes(&value.to_be_bytes())
    }

    /// Encode a 64-bit float.
    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.write_byte(marker::FLOAT64)?;
        self.write_bytes(&value.to_be_bytes())
    }

    /// Encode a string: length header plus UTF-8 payload.
    #[allow(clippy::cast_possible_truncation)]
    pub fn write_str(&mut self, value: &str) -> Result<()> {
        let bytes = value.as_bytes();
        let len = bytes.len();
        if len < 32 {
            self.write_byte(marker::FIXSTR_MIN | len as u8)?;
        } else if len <= usize::from(u8::MAX) {
            self.write_byte(marker::STR8)?;
            self.write_byte(len as u8)?;
        } else if len <= usize::from(u16::MAX) {
            self.write_byte(marker::STR16)?;
            self.write_bytes(&(len as u16).to_be_bytes())?;
        } else if len < MAX_CONTENT_LEN {
            self.write_byte(marker::STR32)?;
            self.write_bytes(&(len as u32).to_be_bytes())?;
        } else {
            return Err(Error::TooLarge("Str32"));
        }
        self.write_bytes(bytes)
    }

    /// Encode binary data: length header plus payload.
    #[allow(clippy::cast_possible_truncation)]
    pub fn write_bin(&mut self, value: &[u8]) -> Result<()> {
        let len = value.len();
        if len <= usize::from(u8::MAX) {
            self.write_byte(marker::BIN8)?;
            self.write_byte(len as u8)?;
        } else if len <= usize::from(u16::MAX) {
            self.write_byte(marker::BIN16)?;
            self.write_bytes(&(len as u16).to_be_bytes())?;
        } else if len < MAX_CONTENT_LEN {
            self.write_byte(marker::BIN32)?;
            self.write_bytes(&(len as u32).to_be_bytes())?;
        } else {
            return Err(Error::TooLarge("Bin32"));
        }
        self.write_bytes(value)
    }

    /// Encode an array header for `count` elements; the caller writes the
    /// elements afterwards.
    #[allow(clippy::cast_possible_truncation)]
    pub fn write_array_len(&mut self, count: usize) -> Result<()> {
        if count < 16 {
            return self.write_byte(marker::FIXARRAY_MIN | count as u8);
        }
        if count <= usize::from(u16::MAX) {
            self.write_byte(marker::ARRAY16)?;
            return self.write_bytes(&(count as u16).to_be_bytes());
        }
        if count < 0x8000_0000 {
            self.write_byte(marker::ARRAY32)?;
            return self.write_bytes(&(count as u32).to_be_bytes());
        }
        Err(Error::TooLarge("Array32"))
    }

    /// Encode a map header for `count` key/value pairs; the caller writes
    /// the pairs afterwards, each key before its value.
    #[allow(clippy::cast_possible_truncation)]
    pub fn write_map_len(&mut self, count: usize) -> Result<()> {
        if count < 16 {
            return self.write_byte(marker::FIXMAP_MIN | count as u8);
        }
        if count <= usize::from(u16::MAX) {
            self.write_byte(marker::MAP16)?;
            return self.write_bytes(&(count as u16).to_be_bytes());
        }
        if count < 0x8000_0000 {
            self.write_byte(marker::MAP32)?;
            return self.write_bytes(&(count as u32).to_be_bytes());
        }
        Err(Error::TooLarge("Map32"))
    }

    /// Encode an extension value: type tag plus opaque payload.
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub fn write_ext(&mut self, tag: i8, data: &[u8]) -> Result<()> {
        match data.len() {
            1 => self.write_byte(marker::FIXEXT1)?,
            2 => self.write_byte(marker::FIXEXT2)?,
            4 => self.write_byte(marker::FIXEXT4)?,
            8 => self.write_byte(marker::FIXEXT8)?,
            16 => self.write_byte(marker::FIXEXT16)?,
            len if len <= usize::from(u8::MAX) => {
                self.write_byte(marker::EXT8)?;
                self.write_byte(len as u8)?;
            }
            len if len <= usize::from(u16::MAX) => {
                self.write_byte(marker::EXT16)?;
                self.write_bytes(&(len as u16).to_be_bytes())?;
            }
            len if len < 0x8000_0000 => {
                self.write_byte(marker::EXT32)?;
                self.write_bytes(&(len as u32).to_be_bytes())?;
            }
            _ => return Err(Error::TooLarge("Ext32")),
        }
        self.write_byte(tag as u8)?;
        self.write_bytes(data)
    }

    /// Encode a timestamp in its shortest extension form.
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub fn write_timestamp(&mut self, ts: Timestamp) -> Result<()> {
        if ts.nsec > 999_999_999 {
            return Err(Error::Custom(format!(
                "timestamp nanoseconds out of range: {}",
                ts.nsec
            )));
        }
        if ts.nsec == 0 && ts.sec >= 0 && ts.sec <= i64::from(u32::MAX) {
            self.write_byte(marker::FIXEXT4)?;
            self.write_byte(TIMESTAMP_TYPE as u8)?;
            return self.write_bytes(&(ts.sec as u32).to_be_bytes());
        }
        if ts.sec >= 0 && ts.sec < (1 << 34) {
            let payload = (u64::from(ts.nsec) << 34) | ts.sec as u64;
            self.write_byte(marker::FIXEXT8)?;
            self.write_byte(TIMESTAMP_TYPE as u8)?;
            return self.write_bytes(&payload.to_be_bytes());
        }
        self.write_byte(marker::EXT8)?;
        self.write_byte(12)?;
        self.write_byte(TIMESTAMP_TYPE as u8)?;
        self.write_bytes(&ts.nsec.to_be_bytes())?;
        self.write_bytes(&ts.sec.to_be_bytes())
    }
}
