//! Built-in write handlers.
//!
//! A write handler maps a value to a tag and a representation. The writer
//! lays the pair out on the wire: ground tags (`_ s ? i d array map`) are
//! emitted natively, other single-character tags are inlined as
//! `"~" + tag + string_rep`, and multi-character tags become a tagged pair.

use std::borrow::Cow;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use num_traits::ToPrimitive;

use crate::error::WriteError;
use crate::model::{Value, ValueKind, format_uuid};
use crate::util::has_rfc3339_form;

/// Converts a value to its wire tag and representation.
///
/// `tag` must be non-empty. `string_rep` is consulted only for
/// single-character tags; returning `None` there makes the value
/// unusable as a map key and falls back to the tagged-pair layout
/// elsewhere.
pub trait WriteHandler: Send + Sync {
    fn tag<'a>(&'a self, value: &'a Value) -> &'a str;

    fn rep<'a>(&self, value: &'a Value) -> Result<Cow<'a, Value>, WriteError>;

    fn string_rep(&self, _value: &Value) -> Option<String> {
        None
    }

    /// Handler to use instead of this one when writing verbose JSON.
    fn verbose_handler(&self) -> Option<Arc<dyn WriteHandler>> {
        None
    }
}

fn mismatch(tag: &str, expected: &'static str) -> WriteError {
    WriteError::InvalidRepresentation {
        tag: tag.to_string(),
        expected,
    }
}

// =============================================================================
// GROUND TYPES
// =============================================================================

pub struct NullHandler;

impl WriteHandler for NullHandler {
    fn tag<'a>(&'a self, _value: &'a Value) -> &'a str {
        "_"
    }

    fn rep<'a>(&self, _value: &'a Value) -> Result<Cow<'a, Value>, WriteError> {
        Ok(Cow::Owned(Value::Null))
    }

    fn string_rep(&self, _value: &Value) -> Option<String> {
        Some(String::new())
    }
}

pub struct BoolHandler;

impl WriteHandler for BoolHandler {
    fn tag<'a>(&'a self, _value: &'a Value) -> &'a str {
        "?"
    }

    fn rep<'a>(&self, value: &'a Value) -> Result<Cow<'a, Value>, WriteError> {
        Ok(Cow::Borrowed(value))
    }

    fn string_rep(&self, value: &Value) -> Option<String> {
        value.as_bool().map(|b| String::from(if b { "t" } else { "f" }))
    }
}

pub struct StringHandler;

impl WriteHandler for StringHandler {
    fn tag<'a>(&'a self, _value: &'a Value) -> &'a str {
        "s"
    }

    fn rep<'a>(&self, value: &'a Value) -> Result<Cow<'a, Value>, WriteError> {
        Ok(Cow::Borrowed(value))
    }

    fn string_rep(&self, value: &Value) -> Option<String> {
        value.as_str().map(str::to_string)
    }
}

/// Integers: tag `i` inside the signed 64-bit range, `n` outside it.
pub struct IntegerHandler;

impl WriteHandler for IntegerHandler {
    fn tag<'a>(&'a self, value: &'a Value) -> &'a str {
        match value {
            Value::Integer(i) if i.to_i64().is_none() => "n",
            _ => "i",
        }
    }

    fn rep<'a>(&self, value: &'a Value) -> Result<Cow<'a, Value>, WriteError> {
        match value {
            Value::Integer(i) if i.to_i64().is_none() => Ok(Cow::Owned(Value::String(i.to_string()))),
            Value::Integer(_) => Ok(Cow::Borrowed(value)),
            _ => Err(mismatch("i", "an integer")),
        }
    }

    fn string_rep(&self, value: &Value) -> Option<String> {
        match value {
            Value::Integer(i) => Some(i.to_string()),
            _ => None,
        }
    }
}

/// Floats: tag `d`, or `z` for NaN and the infinities.
pub struct FloatHandler;

impl FloatHandler {
    fn special(f: f64) -> Option<&'static str> {
        if f.is_nan() {
            Some("NaN")
        } else if f == f64::INFINITY {
            Some("INF")
        } else if f == f64::NEG_INFINITY {
            Some("-INF")
        } else {
            None
        }
    }
}

impl WriteHandler for FloatHandler {
    fn tag<'a>(&'a self, value: &'a Value) -> &'a str {
        match value.as_f64().and_then(Self::special) {
            Some(_) => "z",
            None => "d",
        }
    }

    fn rep<'a>(&self, value: &'a Value) -> Result<Cow<'a, Value>, WriteError> {
        let f = value.as_f64().ok_or_else(|| mismatch("d", "a float"))?;
        Ok(match Self::special(f) {
            Some(name) => Cow::Owned(Value::from(name)),
            None => Cow::Borrowed(value),
        })
    }

    fn string_rep(&self, value: &Value) -> Option<String> {
        let f = value.as_f64()?;
        Some(match Self::special(f) {
            Some(name) => name.to_string(),
            None => format!("{:?}", f),
        })
    }
}

pub struct ArrayHandler;

impl WriteHandler for ArrayHandler {
    fn tag<'a>(&'a self, _value: &'a Value) -> &'a str {
        "array"
    }

    fn rep<'a>(&self, value: &'a Value) -> Result<Cow<'a, Value>, WriteError> {
        Ok(Cow::Borrowed(value))
    }
}

/// Maps. The writer switches to the `cmap` layout itself when a key cannot
/// be written as a string.
pub struct MapHandler;

impl WriteHandler for MapHandler {
    fn tag<'a>(&'a self, _value: &'a Value) -> &'a str {
        "map"
    }

    fn rep<'a>(&self, value: &'a Value) -> Result<Cow<'a, Value>, WriteError> {
        Ok(Cow::Borrowed(value))
    }
}

// =============================================================================
// SCALAR EXTENSIONS
// =============================================================================

/// Handler for extension types whose representation is a single string.
///
/// `to_string` returns `None` if the value has the wrong kind.
pub struct StringRepHandler {
    tag: &'static str,
    expected: &'static str,
    to_string: fn(&Value) -> Option<String>,
}

impl StringRepHandler {
    pub const fn new(tag: &'static str, expected: &'static str, to_string: fn(&Value) -> Option<String>) -> Self {
        Self {
            tag,
            expected,
            to_string,
        }
    }
}

impl WriteHandler for StringRepHandler {
    fn tag<'a>(&'a self, _value: &'a Value) -> &'a str {
        self.tag
    }

    fn rep<'a>(&self, value: &'a Value) -> Result<Cow<'a, Value>, WriteError> {
        (self.to_string)(value)
            .map(|s| Cow::Owned(Value::String(s)))
            .ok_or_else(|| mismatch(self.tag, self.expected))
    }

    fn string_rep(&self, value: &Value) -> Option<String> {
        (self.to_string)(value)
    }
}

pub fn keyword_handler() -> StringRepHandler {
    StringRepHandler::new(":", "a keyword", |v| match v {
        Value::Keyword(k) => Some(k.as_str().to_string()),
        _ => None,
    })
}

pub fn symbol_handler() -> StringRepHandler {
    StringRepHandler::new("$", "a symbol", |v| match v {
        Value::Symbol(s) => Some(s.as_str().to_string()),
        _ => None,
    })
}

pub fn decimal_handler() -> StringRepHandler {
    StringRepHandler::new("f", "a decimal", |v| match v {
        Value::Decimal(d) => Some(d.to_string()),
        _ => None,
    })
}

pub fn bytes_handler() -> StringRepHandler {
    StringRepHandler::new("b", "a byte array", |v| match v {
        Value::Bytes(b) => Some(STANDARD.encode(b)),
        _ => None,
    })
}

pub fn uuid_handler() -> StringRepHandler {
    StringRepHandler::new("u", "a UUID", |v| match v {
        Value::Uuid(u) => Some(format_uuid(u)),
        _ => None,
    })
}

pub fn uri_handler() -> StringRepHandler {
    StringRepHandler::new("r", "a URI", |v| match v {
        Value::Uri(u) => Some(u.as_str().to_string()),
        _ => None,
    })
}

/// Timestamps as epoch milliseconds (tag `m`); verbose JSON uses
/// [`VerboseTimestampHandler`].
pub struct TimestampHandler;

impl WriteHandler for TimestampHandler {
    fn tag<'a>(&'a self, _value: &'a Value) -> &'a str {
        "m"
    }

    fn rep<'a>(&self, value: &'a Value) -> Result<Cow<'a, Value>, WriteError> {
        match value {
            Value::Timestamp(t) => Ok(Cow::Owned(Value::from(t.millis()))),
            _ => Err(mismatch("m", "a timestamp")),
        }
    }

    fn string_rep(&self, value: &Value) -> Option<String> {
        match value {
            Value::Timestamp(t) => Some(t.millis().to_string()),
            _ => None,
        }
    }

    fn verbose_handler(&self) -> Option<Arc<dyn WriteHandler>> {
        Some(Arc::new(VerboseTimestampHandler))
    }
}

/// Timestamps as `YYYY-MM-DDTHH:MM:SS.mmmZ` (tag `t`).
///
/// Years outside 0000-9999 have no such form and fall back to tag `m`.
pub struct VerboseTimestampHandler;

impl WriteHandler for VerboseTimestampHandler {
    fn tag<'a>(&'a self, value: &'a Value) -> &'a str {
        match value {
            Value::Timestamp(t) if !has_rfc3339_form(t.millis()) => "m",
            _ => "t",
        }
    }

    fn rep<'a>(&self, value: &'a Value) -> Result<Cow<'a, Value>, WriteError> {
        self.string_rep(value)
            .map(|s| Cow::Owned(Value::String(s)))
            .ok_or_else(|| mismatch("t", "a timestamp"))
    }

    fn string_rep(&self, value: &Value) -> Option<String> {
        match value {
            Value::Timestamp(t) if has_rfc3339_form(t.millis()) => Some(t.to_rfc3339()),
            Value::Timestamp(t) => Some(t.millis().to_string()),
            _ => None,
        }
    }
}

// =============================================================================
// COMPOSITE EXTENSIONS
// =============================================================================

pub struct SetHandler;

impl WriteHandler for SetHandler {
    fn tag<'a>(&'a self, _value: &'a Value) -> &'a str {
        "set"
    }

    fn rep<'a>(&self, value: &'a Value) -> Result<Cow<'a, Value>, WriteError> {
        match value {
            Value::Set(items) => Ok(Cow::Owned(Value::Array(items.clone()))),
            _ => Err(mismatch("set", "a set")),
        }
    }
}

pub struct LinkHandler;

impl WriteHandler for LinkHandler {
    fn tag<'a>(&'a self, _value: &'a Value) -> &'a str {
        "link"
    }

    fn rep<'a>(&self, value: &'a Value) -> Result<Cow<'a, Value>, WriteError> {
        match value {
            Value::Link(link) => Ok(Cow::Owned(link.to_map())),
            _ => Err(mismatch("link", "a link")),
        }
    }
}

pub struct RatioHandler;

impl WriteHandler for RatioHandler {
    fn tag<'a>(&'a self, _value: &'a Value) -> &'a str {
        "ratio"
    }

    fn rep<'a>(&self, value: &'a Value) -> Result<Cow<'a, Value>, WriteError> {
        match value {
            Value::Ratio(r) => Ok(Cow::Owned(Value::Array(vec![
                Value::Integer(r.numerator.clone()),
                Value::Integer(r.denominator.clone()),
            ]))),
            _ => Err(mismatch("ratio", "a ratio")),
        }
    }
}

/// Generic tagged values carry their own tag. A single-character tag is
/// inlined only when the representation is a string.
pub struct TaggedValueHandler;

impl WriteHandler for TaggedValueHandler {
    fn tag<'a>(&'a self, value: &'a Value) -> &'a str {
        match value {
            Value::Tagged(tv) => &tv.tag,
            _ => "",
        }
    }

    fn rep<'a>(&self, value: &'a Value) -> Result<Cow<'a, Value>, WriteError> {
        match value {
            Value::Tagged(tv) => Ok(Cow::Borrowed(&tv.rep)),
            _ => Err(mismatch("", "a tagged value")),
        }
    }

    fn string_rep(&self, value: &Value) -> Option<String> {
        match value {
            Value::Tagged(tv) => tv.rep.as_str().map(str::to_string),
            _ => None,
        }
    }
}

/// Returns the built-in handler for a value kind.
///
/// Custom values have no built-in handler.
pub fn builtin_handler(kind: ValueKind) -> Option<Arc<dyn WriteHandler>> {
    let handler: Arc<dyn WriteHandler> = match kind {
        ValueKind::Null => Arc::new(NullHandler),
        ValueKind::Bool => Arc::new(BoolHandler),
        ValueKind::String => Arc::new(StringHandler),
        ValueKind::Integer => Arc::new(IntegerHandler),
        ValueKind::Float => Arc::new(FloatHandler),
        ValueKind::Decimal => Arc::new(decimal_handler()),
        ValueKind::Keyword => Arc::new(keyword_handler()),
        ValueKind::Symbol => Arc::new(symbol_handler()),
        ValueKind::Bytes => Arc::new(bytes_handler()),
        ValueKind::Uuid => Arc::new(uuid_handler()),
        ValueKind::Uri => Arc::new(uri_handler()),
        ValueKind::Timestamp => Arc::new(TimestampHandler),
        ValueKind::Link => Arc::new(LinkHandler),
        ValueKind::Ratio => Arc::new(RatioHandler),
        ValueKind::Array => Arc::new(ArrayHandler),
        ValueKind::Set => Arc::new(SetHandler),
        ValueKind::Map => Arc::new(MapHandler),
        ValueKind::Tagged => Arc::new(TaggedValueHandler),
        ValueKind::Custom => return None,
    };
    Some(handler)
}

/// Every kind with a built-in handler.
pub const BUILTIN_KINDS: [ValueKind; 18] = [
    ValueKind::Null,
    ValueKind::Bool,
    ValueKind::String,
    ValueKind::Integer,
    ValueKind::Float,
    ValueKind::Decimal,
    ValueKind::Keyword,
    ValueKind::Symbol,
    ValueKind::Bytes,
    ValueKind::Uuid,
    ValueKind::Uri,
    ValueKind::Timestamp,
    ValueKind::Link,
    ValueKind::Ratio,
    ValueKind::Array,
    ValueKind::Set,
    ValueKind::Map,
    ValueKind::Tagged,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Keyword, Ratio, Timestamp};
    use num_bigint::BigInt;

    fn tag_of(value: &Value) -> String {
        builtin_handler(value.kind()).unwrap().tag(value).to_string()
    }

    #[test]
    fn test_integer_boundary_tags() {
        let max = BigInt::from(i64::MAX);
        for n in 0..5i64 {
            assert_eq!(tag_of(&Value::Integer(&max - n)), "i");
            assert_eq!(tag_of(&Value::Integer(&max + 1 + n)), "n");
        }
        assert_eq!(tag_of(&Value::Integer(BigInt::from(i64::MIN))), "i");
        assert_eq!(tag_of(&Value::Integer(BigInt::from(i64::MIN) - 1)), "n");
    }

    #[test]
    fn test_big_integer_rep_is_decimal_string() {
        let v = Value::from(i128::from(i64::MAX) + 1);
        let rep = IntegerHandler.rep(&v).unwrap();
        assert_eq!(rep.as_ref(), &Value::from("9223372036854775808"));
    }

    #[test]
    fn test_special_floats() {
        assert_eq!(tag_of(&Value::Float(f64::NAN)), "z");
        assert_eq!(FloatHandler.string_rep(&Value::Float(f64::NEG_INFINITY)).unwrap(), "-INF");
        assert_eq!(tag_of(&Value::Float(2.5)), "d");
        assert_eq!(FloatHandler.string_rep(&Value::Float(1.0)).unwrap(), "1.0");
    }

    #[test]
    fn test_timestamp_verbose_variant() {
        let v = Value::Timestamp(Timestamp::from_millis(1_388_631_845_678));
        assert_eq!(TimestampHandler.string_rep(&v).unwrap(), "1388631845678");

        let verbose = TimestampHandler.verbose_handler().unwrap();
        assert_eq!(verbose.tag(&v), "t");
        assert_eq!(verbose.string_rep(&v).unwrap(), "2014-01-02T03:04:05.678Z");

        let far = Value::Timestamp(Timestamp::from_millis(253_402_300_800_000));
        assert_eq!(verbose.tag(&far), "m");
        assert_eq!(verbose.string_rep(&far).unwrap(), "253402300800000");
    }

    #[test]
    fn test_string_rep_handlers() {
        let kw = Value::Keyword(Keyword::new("a/b"));
        assert_eq!(tag_of(&kw), ":");
        assert_eq!(keyword_handler().string_rep(&kw).unwrap(), "a/b");

        let bytes = Value::Bytes(b"hello".to_vec());
        assert_eq!(bytes_handler().string_rep(&bytes).unwrap(), "aGVsbG8=");

        assert!(keyword_handler().rep(&bytes).is_err());
    }

    #[test]
    fn test_tagged_value_uses_own_tag() {
        let v = Value::tagged("point", Value::array([1, 2]));
        assert_eq!(tag_of(&v), "point");
        assert_eq!(TaggedValueHandler.string_rep(&v), None);
        assert_eq!(TaggedValueHandler.string_rep(&Value::tagged("a", "bc")).unwrap(), "bc");
    }

    #[test]
    fn test_ratio_rep() {
        let v = Value::from(Ratio::new(1, 3));
        assert_eq!(RatioHandler.rep(&v).unwrap().as_ref(), &Value::array([1, 3]));
    }

    #[test]
    fn test_no_builtin_for_custom() {
        assert!(builtin_handler(ValueKind::Custom).is_none());
        for kind in BUILTIN_KINDS {
            assert!(builtin_handler(kind).is_some(), "{:?}", kind);
        }
    }
}
