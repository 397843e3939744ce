//! Value tree to message encoding.
//!
//! The encoder resolves a write handler for every value and lays out its
//! tag and representation:
//!
//! - ground tags (`_ s ? i d array map`) map onto native syntax;
//! - other single-character tags are inlined as `"~" + tag + string_rep`;
//! - longer tags become `["~#tag", rep]`, or `{"~#tag": rep}` in verbose JSON.
//!
//! A top-level value with a single-character tag is wrapped in the quote
//! tag so every message is an array or a map.

use std::any::TypeId;
use std::borrow::Cow;
use std::io;
use std::sync::Arc;

use tracing::debug;

use crate::codec::cache::WriteCache;
use crate::codec::handlers::WriteHandler;
use crate::codec::registry::{HandlerKey, WriteHandlerTable};
use crate::codec::wire::{self, Format, Wire};
use crate::error::WriteError;
use crate::limits::{ESC, JSON_MAX_INT, JSON_MIN_INT, MAP_AS_ARRAY, QUOTE, RES, SUB, TAG};
use crate::model::{Extension, Value, ValueKind};

/// Tags the encoder maps onto native syntax.
const GROUND_TAGS: [&str; 7] = ["_", "s", "?", "i", "d", "array", "map"];

fn is_single_char(tag: &str) -> bool {
    let mut chars = tag.chars();
    chars.next().is_some() && chars.next().is_none()
}

/// Prefixes strings that would otherwise read back as markers.
fn escape(s: &str) -> Cow<'_, str> {
    if s.starts_with([ESC, SUB, RES]) {
        Cow::Owned(format!("{}{}", ESC, s))
    } else {
        Cow::Borrowed(s)
    }
}

/// Caller overrides for write handlers.
#[derive(Clone, Default)]
pub struct WriteOptions {
    handlers: Vec<(HandlerKey, Arc<dyn WriteHandler>)>,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under an explicit key. Later registrations for
    /// the same key win.
    pub fn handler(mut self, key: HandlerKey, handler: impl WriteHandler + 'static) -> Self {
        self.handlers.push((key, Arc::new(handler)));
        self
    }

    /// Overrides the built-in handler for a value kind.
    pub fn kind_handler(self, kind: ValueKind, handler: impl WriteHandler + 'static) -> Self {
        self.handler(HandlerKey::Kind(kind), handler)
    }

    /// Registers a handler for one caller-defined extension type.
    pub fn type_handler<T: Extension>(self, handler: impl WriteHandler + 'static) -> Self {
        self.handler(HandlerKey::Type(TypeId::of::<T>()), handler)
    }

    /// Registers a handler for every extension type declaring `capability`.
    pub fn capability_handler(self, capability: &'static str, handler: impl WriteHandler + 'static) -> Self {
        self.handler(HandlerKey::Capability(capability), handler)
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Writes values as messages in one format.
///
/// A writer holds no per-message state and can be shared; every call gets a
/// fresh rolling cache.
#[derive(Clone)]
pub struct Writer {
    format: Format,
    handlers: Arc<WriteHandlerTable>,
}

impl Writer {
    pub fn new(format: Format) -> Self {
        Self {
            format,
            handlers: WriteHandlerTable::shared(format.is_verbose()),
        }
    }

    pub fn with_options(format: Format, options: &WriteOptions) -> Self {
        Self {
            format,
            handlers: WriteHandlerTable::with_overrides(format.is_verbose(), &options.handlers),
        }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// The handler table this writer resolves against.
    pub fn handlers(&self) -> &Arc<WriteHandlerTable> {
        &self.handlers
    }

    /// Encodes a value into its primitive syntax tree.
    pub fn to_wire(&self, value: &Value) -> Result<Wire, WriteError> {
        let cache = if self.format.is_verbose() {
            WriteCache::disabled()
        } else {
            WriteCache::new()
        };
        let mut encoder = Encoder {
            handlers: &self.handlers,
            cache,
            json: self.format.is_json(),
            verbose: self.format.is_verbose(),
        };
        encoder.marshal_top(value)
    }

    /// Encodes a value into a complete message.
    pub fn write(&self, value: &Value) -> Result<Vec<u8>, WriteError> {
        let wire = self.to_wire(value)?;
        let bytes = wire::to_bytes(&wire, self.format)?;
        debug!(format = %self.format, bytes = bytes.len(), "wrote message");
        Ok(bytes)
    }

    /// Encodes a value into `out`. On error, `out` may hold a partial message.
    pub fn write_to<W: io::Write>(&self, value: &Value, out: W) -> Result<(), WriteError> {
        let wire = self.to_wire(value)?;
        wire::to_writer(&wire, self.format, out)?;
        debug!(format = %self.format, "wrote message to sink");
        Ok(())
    }
}

// =============================================================================
// ENCODER
// =============================================================================

/// Per-message encoding state.
struct Encoder<'a> {
    handlers: &'a WriteHandlerTable,
    cache: WriteCache,
    json: bool,
    verbose: bool,
}

impl Encoder<'_> {
    fn resolve(&self, value: &Value) -> Result<Arc<dyn WriteHandler>, WriteError> {
        self.handlers.resolve(value)
    }

    fn marshal_top(&mut self, value: &Value) -> Result<Wire, WriteError> {
        let handler = self.resolve(value)?;
        let tag = handler.tag(value);
        if tag.is_empty() {
            return Err(WriteError::InvalidWriteHandler {
                type_name: value.type_name(),
            });
        }
        if is_single_char(tag) {
            self.emit_tagged(QUOTE, value)
        } else {
            self.marshal(value, false)
        }
    }

    fn marshal(&mut self, value: &Value, as_map_key: bool) -> Result<Wire, WriteError> {
        let handler = self.resolve(value)?;
        let tag = handler.tag(value);
        if tag.is_empty() {
            return Err(WriteError::InvalidWriteHandler {
                type_name: value.type_name(),
            });
        }
        let rep = handler.rep(value)?;
        let mismatch = |expected| WriteError::InvalidRepresentation {
            tag: tag.to_string(),
            expected,
        };

        match tag {
            "_" => Ok(if as_map_key {
                self.emit_string(format!("{}_", ESC), true)
            } else {
                Wire::Null
            }),
            "s" => {
                let s = rep.as_str().ok_or_else(|| mismatch("a string"))?;
                Ok(self.emit_string(escape(s).into_owned(), as_map_key))
            }
            "?" => {
                let b = rep.as_bool().ok_or_else(|| mismatch("a boolean"))?;
                Ok(if as_map_key {
                    self.emit_string(format!("{}?{}", ESC, if b { 't' } else { 'f' }), true)
                } else {
                    Wire::Bool(b)
                })
            }
            "i" => match &*rep {
                Value::Integer(i) => {
                    let native = rep.as_i64().filter(|n| {
                        !as_map_key && (!self.json || (JSON_MIN_INT..=JSON_MAX_INT).contains(n))
                    });
                    Ok(match native {
                        Some(n) => Wire::Int(n),
                        None => self.emit_string(format!("{}i{}", ESC, i), as_map_key),
                    })
                }
                _ => Err(mismatch("an integer")),
            },
            "d" => {
                let f = rep.as_f64().ok_or_else(|| mismatch("a float"))?;
                Ok(self.emit_float(f, as_map_key))
            }
            "array" => {
                if as_map_key {
                    return Err(WriteError::NotStringable { tag: tag.to_string() });
                }
                let items = rep.as_array().ok_or_else(|| mismatch("an array"))?;
                self.emit_array(items)
            }
            "map" => {
                if as_map_key {
                    return Err(WriteError::NotStringable { tag: tag.to_string() });
                }
                let pairs = rep.as_map().ok_or_else(|| mismatch("a map"))?;
                self.emit_map(pairs)
            }
            QUOTE => self.emit_tagged(QUOTE, &rep),
            _ => self.emit_encoded(handler.as_ref(), tag, value, &rep, as_map_key),
        }
    }

    /// Runs a string through the cache and wraps it.
    fn emit_string(&mut self, s: String, as_map_key: bool) -> Wire {
        Wire::Str(self.cache.encode(s, as_map_key))
    }

    fn emit_float(&mut self, f: f64, as_map_key: bool) -> Wire {
        if !f.is_finite() {
            let name = if f.is_nan() {
                "NaN"
            } else if f > 0.0 {
                "INF"
            } else {
                "-INF"
            };
            return self.emit_string(format!("{}z{}", ESC, name), as_map_key);
        }
        if as_map_key {
            self.emit_string(format!("{}d{:?}", ESC, f), true)
        } else {
            Wire::Float(f)
        }
    }

    fn emit_array(&mut self, items: &[Value]) -> Result<Wire, WriteError> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(self.marshal(item, false)?);
        }
        Ok(Wire::Array(out))
    }

    fn emit_map(&mut self, pairs: &[(Value, Value)]) -> Result<Wire, WriteError> {
        if !self.stringable_keys(pairs)? {
            let flat = pairs
                .iter()
                .flat_map(|(k, v)| [k.clone(), v.clone()])
                .collect();
            return self.emit_tagged("cmap", &Value::Array(flat));
        }

        if self.verbose {
            let mut entries = Vec::with_capacity(pairs.len());
            for (k, v) in pairs {
                let key = match self.marshal(k, true)? {
                    Wire::Str(s) => s,
                    _ => {
                        return Err(WriteError::NotStringable {
                            tag: self.resolve(k)?.tag(k).to_string(),
                        });
                    }
                };
                entries.push((Wire::Str(key), self.marshal(v, false)?));
            }
            return Ok(Wire::Map(entries));
        }

        let mut items = Vec::with_capacity(pairs.len() * 2 + 1);
        items.push(Wire::from(MAP_AS_ARRAY));
        for (k, v) in pairs {
            items.push(self.marshal(k, true)?);
            items.push(self.marshal(v, false)?);
        }
        Ok(Wire::Array(items))
    }

    /// True if every key can be written as a string.
    fn stringable_keys(&self, pairs: &[(Value, Value)]) -> Result<bool, WriteError> {
        for (k, _) in pairs {
            let handler = self.resolve(k)?;
            let tag = handler.tag(k);
            let stringable = is_single_char(tag)
                && (GROUND_TAGS.contains(&tag) || tag == QUOTE || handler.string_rep(k).is_some());
            if !stringable {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Writes a non-ground tag.
    fn emit_encoded(
        &mut self,
        handler: &dyn WriteHandler,
        tag: &str,
        value: &Value,
        rep: &Value,
        as_map_key: bool,
    ) -> Result<Wire, WriteError> {
        if is_single_char(tag) {
            match handler.string_rep(value) {
                Some(s) => Ok(self.emit_string(format!("{}{}{}", ESC, tag, s), as_map_key)),
                None if as_map_key => Err(WriteError::NotStringable { tag: tag.to_string() }),
                None => self.emit_tagged(tag, rep),
            }
        } else if as_map_key {
            Err(WriteError::NotStringable { tag: tag.to_string() })
        } else {
            self.emit_tagged(tag, rep)
        }
    }

    /// Writes `tag` and `rep` as a tagged pair.
    fn emit_tagged(&mut self, tag: &str, rep: &Value) -> Result<Wire, WriteError> {
        let marker = self.cache.encode(format!("{}{}", TAG, tag), false);
        let rep = self.marshal(rep, false)?;
        Ok(if self.verbose {
            Wire::Map(vec![(Wire::Str(marker), rep)])
        } else {
            Wire::Array(vec![Wire::Str(marker), rep])
        })
    }
}
