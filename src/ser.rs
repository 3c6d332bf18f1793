// ABOUTME: Serde Serializer implementation for MessagePack encoding.
// ABOUTME: Allows any serde-serializable Rust type to be encoded to MessagePack bytes.

use crate::encoder::Encoder;
use crate::error::{Error, Result};
use serde::ser::{self, Serialize};
use std::io::Write;

/// A serde Serializer that writes MessagePack.
///
/// MessagePack container headers are length-prefixed, so sequences and maps
/// must report their lengths up front; serializing an unsized stream fails
/// with [`Error::LengthRequired`].
pub struct Serializer<'a, W: Write> {
    encoder: &'a mut Encoder<W>,
}

impl<'a, W: Write> Serializer<'a, W> {
    /// Create a new Serializer wrapping an Encoder.
    pub fn new(encoder: &'a mut Encoder<W>) -> Self {
        Self { encoder }
    }
}

impl<W: Write> ser::Serializer for &mut Serializer<'_, W> {
    type Ok = ();
    type Error = Error;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.encoder.write_bool(v)
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.encoder.write_i64(i64::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.encoder.write_i64(i64::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.encoder.write_i64(i64::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.encoder.write_i64(v)
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.encoder.write_u64(u64::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.encoder.write_u64(u64::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.encoder.write_u64(u64::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.encoder.write_u64(v)
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        self.encoder.write_f32(v)
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        self.encoder.write_f64(v)
    }

    fn serialize_char(self, v: char) -> Result<()> {
        let mut buf = [0u8; 4];
        let s = v.encode_utf8(&mut buf);
        self.encoder.write_str(s)
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.encoder.write_str(v)
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.encoder.write_bin(v)
    }

    fn serialize_none(self) -> Result<()> {
        self.encoder.write_nil()
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        self.encoder.write_nil()
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        self.encoder.write_nil()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.encoder.write_str(variant)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<()> {
        self.encoder.write_map_len(1)?;
        self.encoder.write_str(variant)?;
        value.serialize(self)
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        let len = len.ok_or(Error::LengthRequired)?;
        self.encoder.write_array_len(len)?;
        Ok(self)
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.encoder.write_array_len(len)?;
        Ok(self)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.encoder.write_array_len(len)?;
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        self.encoder.write_map_len(1)?;
        self.encoder.write_str(variant)?;
        self.encoder.write_array_len(len)?;
        Ok(self)
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap> {
        let len = len.ok_or(Error::LengthRequired)?;
        self.encoder.write_map_len(len)?;
        Ok(self)
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<Self::SerializeStruct> {
        self.encoder.write_map_len(len)?;
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        self.encoder.write_map_len(1)?;
        self.encoder.write_str(variant)?;
        self.encoder.write_map_len(len)?;
        Ok(self)
    }
}

impl<W: Write> ser::SerializeSeq for &mut Serializer<'_, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<W: Write> ser::SerializeTuple for &mut Serializer<'_, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<W: Write> ser::SerializeTupleStruct for &mut Serializer<'_, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<W: Write> ser::SerializeTupleVariant for &mut Serializer<'_, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<W: Write> ser::SerializeMap for &mut Serializer<'_, W> {
    type Ok = ();
    type Error = Error;

    // MessagePack map keys may be any value; keys go through the main
    // serializer unchanged.
    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<()> {
        key.serialize(&mut **self)
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<W: Write> ser::SerializeStruct for &mut Serializer<'_, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.encoder.write_str(key)?;
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<W: Write> ser::SerializeStructVariant for &mut Serializer<'_, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.encoder.write_str(key)?;
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}
