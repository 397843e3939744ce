//! Primitive syntax adapter.
//!
//! [`Wire`] is the tree of primitive events both syntaxes share: nested
//! arrays, ordered maps, strings, numbers. JSON map keys are always strings;
//! MessagePack map keys may be any primitive. The JSON syntax is
//! carried by `serde_json`, MessagePack by `rmp-serde`.

use std::fmt;
use std::io;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::error::{ReadError, WriteError};

/// Output/input syntax of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Compact JSON: maps as arrays, rolling cache on.
    Json,
    /// Human-readable JSON: native objects, ISO timestamps, no cache codes.
    JsonVerbose,
    /// Compact MessagePack.
    MessagePack,
}

impl Format {
    pub fn is_verbose(self) -> bool {
        matches!(self, Format::JsonVerbose)
    }

    /// True for both JSON variants. JSON numbers are only exact up to 2^53.
    pub fn is_json(self) -> bool {
        matches!(self, Format::Json | Format::JsonVerbose)
    }

    pub fn name(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::JsonVerbose => "json-verbose",
            Format::MessagePack => "msgpack",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A primitive syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Wire {
    Null,
    Bool(bool),
    Int(i64),
    /// Only produced by parsers, for unsigned values above `i64::MAX`.
    UInt(u64),
    Float(f64),
    Str(String),
    Array(Vec<Wire>),
    /// Ordered map. Keys are strings except in MessagePack from other writers.
    Map(Vec<(Wire, Wire)>),
}

impl Wire {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Wire::Str(s) => Some(s),
            _ => None,
        }
    }

    /// True for anything other than arrays and maps.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Wire::Array(_) | Wire::Map(_))
    }
}

impl From<&str> for Wire {
    fn from(s: &str) -> Self {
        Wire::Str(s.to_string())
    }
}

impl From<String> for Wire {
    fn from(s: String) -> Self {
        Wire::Str(s)
    }
}

impl From<i64> for Wire {
    fn from(i: i64) -> Self {
        Wire::Int(i)
    }
}

// =============================================================================
// SERDE
// =============================================================================

impl Serialize for Wire {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Wire::Null => serializer.serialize_unit(),
            Wire::Bool(b) => serializer.serialize_bool(*b),
            Wire::Int(i) => serializer.serialize_i64(*i),
            Wire::UInt(u) => serializer.serialize_u64(*u),
            Wire::Float(f) => serializer.serialize_f64(*f),
            Wire::Str(s) => serializer.serialize_str(s),
            Wire::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Wire::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

struct WireVisitor;

impl<'de> Visitor<'de> for WireVisitor {
    type Value = Wire;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON or MessagePack value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Wire, E> {
        Ok(Wire::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Wire, E> {
        Ok(Wire::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Wire, D::Error> {
        Wire::deserialize(d)
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> Result<Wire, E> {
        Ok(Wire::Bool(b))
    }

    fn visit_i64<E: de::Error>(self, i: i64) -> Result<Wire, E> {
        Ok(Wire::Int(i))
    }

    fn visit_u64<E: de::Error>(self, u: u64) -> Result<Wire, E> {
        Ok(i64::try_from(u).map_or(Wire::UInt(u), Wire::Int))
    }

    fn visit_f64<E: de::Error>(self, f: f64) -> Result<Wire, E> {
        Ok(Wire::Float(f))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Wire, E> {
        Ok(Wire::Str(s.to_string()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<Wire, E> {
        Ok(Wire::Str(s))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Wire, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(4096));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Wire::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Wire, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0).min(4096));
        while let Some((k, v)) = map.next_entry::<Wire, Wire>()? {
            entries.push((k, v));
        }
        Ok(Wire::Map(entries))
    }
}

impl<'de> Deserialize<'de> for Wire {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(WireVisitor)
    }
}

// =============================================================================
// ENCODING
// =============================================================================

fn syntax_write_error(e: impl fmt::Display) -> WriteError {
    WriteError::Syntax(e.to_string())
}

/// Serializes a wire tree in the given syntax.
pub fn to_bytes(wire: &Wire, format: Format) -> Result<Vec<u8>, WriteError> {
    match format {
        Format::Json | Format::JsonVerbose => serde_json::to_vec(wire).map_err(syntax_write_error),
        Format::MessagePack => rmp_serde::to_vec(wire).map_err(syntax_write_error),
    }
}

/// Serializes a wire tree into an `io::Write` sink.
pub fn to_writer<W: io::Write>(wire: &Wire, format: Format, mut out: W) -> Result<(), WriteError> {
    match format {
        Format::Json | Format::JsonVerbose => {
            serde_json::to_writer(&mut out, wire).map_err(syntax_write_error)?
        }
        Format::MessagePack => rmp_serde::encode::write(&mut out, wire).map_err(syntax_write_error)?,
    }
    out.flush().map_err(syntax_write_error)
}

// =============================================================================
// DECODING
// =============================================================================

fn syntax_read_error(e: impl fmt::Display) -> ReadError {
    ReadError::Syntax(e.to_string())
}

/// Parses one wire tree. Trailing data is an error.
pub fn from_slice(bytes: &[u8], format: Format) -> Result<Wire, ReadError> {
    match format {
        Format::Json | Format::JsonVerbose => serde_json::from_slice(bytes).map_err(syntax_read_error),
        Format::MessagePack => {
            let mut de = rmp_serde::Deserializer::new(bytes);
            let wire = Wire::deserialize(&mut de).map_err(syntax_read_error)?;
            if de.get_ref().is_empty() {
                Ok(wire)
            } else {
                Err(ReadError::Syntax("trailing bytes after message".to_string()))
            }
        }
    }
}

/// Parses one wire tree from an `io::Read` source.
pub fn from_reader<R: io::Read>(input: R, format: Format) -> Result<Wire, ReadError> {
    match format {
        Format::Json | Format::JsonVerbose => serde_json::from_reader(input).map_err(syntax_read_error),
        Format::MessagePack => rmp_serde::from_read(input).map_err(syntax_read_error),
    }
}

/// Parses every wire tree in a buffer of concatenated messages.
pub fn stream_from_slice(bytes: &[u8], format: Format) -> Result<Vec<Wire>, ReadError> {
    match format {
        Format::Json | Format::JsonVerbose => serde_json::Deserializer::from_slice(bytes)
            .into_iter::<Wire>()
            .map(|w| w.map_err(syntax_read_error))
            .collect(),
        Format::MessagePack => {
            let mut de = rmp_serde::Deserializer::new(bytes);
            let mut out = Vec::new();
            while !de.get_ref().is_empty() {
                out.push(Wire::deserialize(&mut de).map_err(syntax_read_error)?);
            }
            Ok(out)
        }
    }
}
