//! Message decoding to value tree.
//!
//! Reading runs in two passes. The [`Decoder`] undoes the rolling cache and
//! the map-as-array layout; the reader then interprets escaped strings,
//! inline tags and tagged pairs, dispatching each tag to its read handler.

use std::io;
use std::sync::Arc;

use num_bigint::BigInt;
use tracing::{debug, trace};

use crate::codec::decoder::{Decoder, Node};
use crate::codec::read_handlers::{DefaultReadHandler, ReadHandler};
use crate::codec::registry::ReadHandlerTable;
use crate::codec::wire::{self, Format, Wire};
use crate::error::ReadError;
use crate::limits::{ESC, RES, SUB, TAG};
use crate::model::Value;

/// Caller overrides for read handlers.
#[derive(Clone, Default)]
pub struct ReadOptions {
    handlers: Vec<(String, Arc<dyn ReadHandler>)>,
    default_handler: Option<Arc<dyn DefaultReadHandler>>,
    strict_tags: bool,
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for `tag`, replacing any built-in one.
    pub fn handler(mut self, tag: impl Into<String>, handler: impl ReadHandler + 'static) -> Self {
        self.handlers.push((tag.into(), Arc::new(handler)));
        self
    }

    /// Replaces the fallback used for tags with no handler.
    pub fn default_handler(mut self, handler: impl DefaultReadHandler + 'static) -> Self {
        self.default_handler = Some(Arc::new(handler));
        self
    }

    /// Fails with [`ReadError::UnknownTag`] instead of using the fallback.
    pub fn strict_tags(mut self, strict: bool) -> Self {
        self.strict_tags = strict;
        self
    }
}

/// Reads messages in one format.
///
/// Like [`Writer`](crate::codec::Writer), a reader is stateless between
/// messages; every message starts with an empty cache.
#[derive(Clone)]
pub struct Reader {
    format: Format,
    handlers: Arc<ReadHandlerTable>,
    strict_tags: bool,
}

impl Reader {
    pub fn new(format: Format) -> Self {
        Self {
            format,
            handlers: ReadHandlerTable::shared(),
            strict_tags: false,
        }
    }

    pub fn with_options(format: Format, options: &ReadOptions) -> Self {
        Self {
            format,
            handlers: ReadHandlerTable::with_overrides(&options.handlers, options.default_handler.clone()),
            strict_tags: options.strict_tags,
        }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Reads one complete message.
    pub fn read(&self, bytes: &[u8]) -> Result<Value, ReadError> {
        let wire = wire::from_slice(bytes, self.format)?;
        debug!(format = %self.format, bytes = bytes.len(), "read message");
        self.read_wire(wire)
    }

    /// Reads one message from an `io::Read` source.
    pub fn read_from<R: io::Read>(&self, input: R) -> Result<Value, ReadError> {
        let wire = wire::from_reader(input, self.format)?;
        debug!(format = %self.format, "read message from source");
        self.read_wire(wire)
    }

    /// Reads every message in a buffer of concatenated messages.
    pub fn read_many(&self, bytes: &[u8]) -> Result<Vec<Value>, ReadError> {
        let wires = wire::stream_from_slice(bytes, self.format)?;
        debug!(format = %self.format, messages = wires.len(), "read message stream");
        wires.into_iter().map(|w| self.read_wire(w)).collect()
    }

    /// Interprets an already parsed primitive syntax tree.
    pub fn read_wire(&self, wire: Wire) -> Result<Value, ReadError> {
        let node = Decoder::new().decode(wire)?;
        self.parse(node)
    }

    fn parse(&self, node: Node) -> Result<Value, ReadError> {
        match node {
            Node::Null => Ok(Value::Null),
            Node::Bool(b) => Ok(Value::Bool(b)),
            Node::Int(i) => Ok(Value::Integer(BigInt::from(i))),
            Node::UInt(u) => Ok(Value::Integer(BigInt::from(u))),
            Node::Float(f) => Ok(Value::Float(f)),
            Node::Str(s) => self.parse_string(s),
            Node::Array(items) => self.parse_array(items),
            Node::Map(pairs) => self.parse_map(pairs),
        }
    }

    fn parse_string(&self, s: String) -> Result<Value, ReadError> {
        let Some(rest) = s.strip_prefix(ESC) else {
            return Ok(Value::String(s));
        };
        let mut chars = rest.chars();
        match chars.next() {
            Some(c) if c == ESC || c == SUB || c == RES => Ok(Value::String(rest.to_string())),
            // A marker outside a pair position is plain text.
            Some('#') | None => Ok(Value::String(s)),
            Some(c) => {
                let mut tag = [0u8; 4];
                let tag = c.encode_utf8(&mut tag);
                self.dispatch(tag, Value::String(chars.as_str().to_string()))
            }
        }
    }

    fn parse_array(&self, items: Vec<Node>) -> Result<Value, ReadError> {
        if items.len() == 2 {
            if let Some(tag) = pair_tag(&items[0]) {
                let tag = tag.to_string();
                let rep = items.into_iter().nth(1).unwrap_or(Node::Null);
                let rep = self.parse(rep)?;
                return self.dispatch(&tag, rep);
            }
        }
        items
            .into_iter()
            .map(|item| self.parse(item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }

    fn parse_map(&self, pairs: Vec<(Node, Node)>) -> Result<Value, ReadError> {
        if pairs.len() == 1 {
            if let Some(tag) = pair_tag(&pairs[0].0) {
                let tag = tag.to_string();
                let (_, rep) = pairs.into_iter().next().unwrap_or((Node::Null, Node::Null));
                let rep = self.parse(rep)?;
                return self.dispatch(&tag, rep);
            }
        }
        let mut out = Vec::with_capacity(pairs.len());
        for (k, v) in pairs {
            out.push((self.parse(k)?, self.parse(v)?));
        }
        Ok(Value::Map(out))
    }

    fn dispatch(&self, tag: &str, rep: Value) -> Result<Value, ReadError> {
        if let Some(handler) = self.handlers.get(tag) {
            return handler.from_rep(rep);
        }
        if self.strict_tags {
            return Err(ReadError::UnknownTag { tag: tag.to_string() });
        }
        trace!(tag, "no read handler, using default");
        self.handlers.default_handler().from_rep(tag, rep)
    }
}

/// Returns the tag when `node` is a `"~#tag"` marker.
fn pair_tag(node: &Node) -> Option<&str> {
    node.as_str()?.strip_prefix(TAG)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Keyword, Ratio, TaggedValue, Timestamp};

    fn read_json(json: &str) -> Result<Value, ReadError> {
        Reader::new(Format::Json).read(json.as_bytes())
    }

    #[test]
    fn test_scalars_in_quote() {
        assert_eq!(read_json(r#"["~#'","this"]"#).unwrap(), Value::from("this"));
        assert_eq!(read_json(r#"{"~#'":1}"#).unwrap(), Value::from(1));
        assert_eq!(read_json(r#"["~#'",null]"#).unwrap(), Value::Null);
    }

    #[test]
    fn test_escaped_strings() {
        assert_eq!(
            read_json(r#"["~~tilde","~^caret","~`back","~#stray","~"]"#).unwrap(),
            Value::array(["~tilde", "^caret", "`back", "~#stray", "~"])
        );
    }

    #[test]
    fn test_inline_tags() {
        let v = read_json(r#"["~:color","~i9007199254740993","~zNaN","~m1000"]"#).unwrap();
        let items = v.as_array().unwrap();
        assert_eq!(items[0], Value::keyword("color"));
        assert_eq!(items[1], Value::from(9007199254740993i64));
        assert!(items[2].as_f64().unwrap().is_nan());
        assert_eq!(items[3], Value::Timestamp(Timestamp::from_millis(1000)));
    }

    #[test]
    fn test_cached_keys_and_tags() {
        let v = read_json(r#"[["^ ","~:abc",["~#ratio",[1,3]]],["^ ","^0",["^1",[2,3]]]]"#).unwrap();
        let third = |n| Value::from(Ratio::new(BigInt::from(n), BigInt::from(3)));
        assert_eq!(
            v,
            Value::array([
                Value::map([(Value::keyword("abc"), third(1))]),
                Value::map([(Value::keyword("abc"), third(2))]),
            ])
        );
    }

    #[test]
    fn test_verbose_tagged_map() {
        let reader = Reader::new(Format::JsonVerbose);
        let v = reader.read(br#"{"~#set":[1,2],"other":3}"#).unwrap();
        // Two entries, so not a tagged pair.
        assert_eq!(v.get("other"), Some(&Value::from(3)));
        let v = reader.read(br#"{"~#set":[1,2]}"#).unwrap();
        assert_eq!(v, Value::Set(vec![Value::from(1), Value::from(2)]));
    }

    #[test]
    fn test_unknown_tag_fallback() {
        let v = read_json(r#"[["~#point",[1,2]],"~xyz"]"#).unwrap();
        assert_eq!(
            v,
            Value::array([
                Value::tagged("point", Value::array([1, 2])),
                Value::tagged("x", "yz"),
            ])
        );
    }

    #[test]
    fn test_strict_tags() {
        let reader = Reader::with_options(Format::Json, &ReadOptions::new().strict_tags(true));
        assert_eq!(
            reader.read(br#"["~#point",[1,2]]"#),
            Err(ReadError::UnknownTag { tag: "point".into() })
        );
        assert!(reader.read(br#"["~:ok"]"#).is_ok());
    }

    #[test]
    fn test_custom_default_handler() {
        struct Reject;

        impl DefaultReadHandler for Reject {
            fn from_rep(&self, tag: &str, _rep: Value) -> Result<Value, ReadError> {
                Ok(Value::String(format!("unknown {tag}")))
            }
        }

        let reader = Reader::with_options(Format::Json, &ReadOptions::new().default_handler(Reject));
        assert_eq!(reader.read(br#"["~#point",1]"#).unwrap(), Value::from("unknown point"));
    }

    #[test]
    fn test_handler_override() {
        let options = ReadOptions::new().handler("point", |rep: Value| -> Result<Value, ReadError> {
            let xs = rep.as_array().map(<[Value]>::len).unwrap_or(0);
            Ok(Value::from(xs as i64))
        });
        let reader = Reader::with_options(Format::Json, &options);
        assert_eq!(reader.read(br#"["~#point",[1,2,3]]"#).unwrap(), Value::from(3));
    }

    #[test]
    fn test_tagged_rep_read_first() {
        let v = read_json(r#"["~#foo",["~:a","~i1"]]"#).unwrap();
        assert_eq!(
            v,
            Value::Tagged(Box::new(TaggedValue::new(
                "foo",
                Value::array([Value::Keyword(Keyword::new("a")), Value::from(1)])
            )))
        );
    }

    #[test]
    fn test_msgpack_stream() {
        let mut bytes = rmp_serde::to_vec(&Wire::Array(vec![Wire::from("~:a")])).unwrap();
        bytes.extend(rmp_serde::to_vec(&Wire::Array(vec![Wire::from("~:b"), Wire::Int(1)])).unwrap());
        let values = Reader::new(Format::MessagePack).read_many(&bytes).unwrap();
        assert_eq!(
            values,
            vec![
                Value::array([Value::keyword("a")]),
                Value::array([Value::keyword("b"), Value::from(1)]),
            ]
        );
    }

    #[test]
    fn test_each_message_has_own_cache() {
        let stream = br#"["~:abcd","^0"] ["^0"]"#;
        assert_eq!(
            Reader::new(Format::Json).read_many(stream),
            Err(ReadError::MalformedCacheCode { code: "^0".into() })
        );
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(read_json("[1,"), Err(ReadError::Syntax(_))));
    }
}
