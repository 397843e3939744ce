//! The universal in-memory value tree.

use num_bigint::BigInt;
use num_traits::ToPrimitive;
use uuid::Uuid;

use crate::model::{BigDecimal, CustomValue, Keyword, Link, Ratio, Symbol, TaggedValue, Timestamp, Uri};

/// Category of a [`Value`], used as the registry key for built-in handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    String,
    Integer,
    Float,
    Decimal,
    Keyword,
    Symbol,
    Bytes,
    Uuid,
    Uri,
    Timestamp,
    Link,
    Ratio,
    Array,
    Set,
    Map,
    Tagged,
    Custom,
}

impl ValueKind {
    /// Human-readable name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::String => "string",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Decimal => "decimal",
            ValueKind::Keyword => "keyword",
            ValueKind::Symbol => "symbol",
            ValueKind::Bytes => "bytes",
            ValueKind::Uuid => "uuid",
            ValueKind::Uri => "uri",
            ValueKind::Timestamp => "timestamp",
            ValueKind::Link => "link",
            ValueKind::Ratio => "ratio",
            ValueKind::Array => "array",
            ValueKind::Set => "set",
            ValueKind::Map => "map",
            ValueKind::Tagged => "tagged value",
            ValueKind::Custom => "custom value",
        }
    }
}

/// A value that can be written to and read from a transito message.
///
/// Ground types (`Null` through `Float`, `Array`, `Map`) map directly onto
/// the primitive syntax. Every other variant is an extension type carried on
/// the wire as a `(tag, representation)` pair.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    String(String),
    /// Arbitrary-precision integer. Values outside the signed 64-bit range
    /// are written with the `n` tag.
    Integer(BigInt),
    Float(f64),
    Decimal(BigDecimal),
    Keyword(Keyword),
    Symbol(Symbol),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Uri(Uri),
    /// Millisecond-resolution UTC instant.
    Timestamp(Timestamp),
    Link(Box<Link>),
    Ratio(Box<Ratio>),
    Array(Vec<Value>),
    /// Unordered collection; element order is kept as given.
    Set(Vec<Value>),
    /// Ordered key/value pairs. Keys need not be strings.
    Map(Vec<(Value, Value)>),
    /// Generic extension value: a tag with no more specific type.
    Tagged(Box<TaggedValue>),
    /// Caller-defined extension type.
    Custom(CustomValue),
}

impl Value {
    /// Returns the category of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::String(_) => ValueKind::String,
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
            Value::Decimal(_) => ValueKind::Decimal,
            Value::Keyword(_) => ValueKind::Keyword,
            Value::Symbol(_) => ValueKind::Symbol,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Uuid(_) => ValueKind::Uuid,
            Value::Uri(_) => ValueKind::Uri,
            Value::Timestamp(_) => ValueKind::Timestamp,
            Value::Link(_) => ValueKind::Link,
            Value::Ratio(_) => ValueKind::Ratio,
            Value::Array(_) => ValueKind::Array,
            Value::Set(_) => ValueKind::Set,
            Value::Map(_) => ValueKind::Map,
            Value::Tagged(_) => ValueKind::Tagged,
            Value::Custom(_) => ValueKind::Custom,
        }
    }

    /// Name of the value's runtime type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Custom(c) => c.type_name(),
            other => other.kind().name(),
        }
    }

    /// Builds a map from key/value pairs.
    pub fn map<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Value>,
        V: Into<Value>,
    {
        Value::Map(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Builds an array from values.
    pub fn array<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }

    /// Builds a generic tagged value.
    pub fn tagged(tag: impl Into<String>, rep: impl Into<Value>) -> Self {
        Value::Tagged(Box::new(TaggedValue::new(tag, rep)))
    }

    /// Builds a keyword.
    pub fn keyword(name: impl Into<String>) -> Self {
        Value::Keyword(Keyword::new(name))
    }

    /// Builds a symbol.
    pub fn symbol(name: impl Into<String>) -> Self {
        Value::Symbol(Symbol::new(name))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer if it fits in an `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => i.to_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// Looks up a string key in a map. Returns `None` for non-maps.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(BigInt::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(BigInt::from(i))
    }
}

impl From<u64> for Value {
    fn from(i: u64) -> Self {
        Value::Integer(BigInt::from(i))
    }
}

impl From<i128> for Value {
    fn from(i: i128) -> Self {
        Value::Integer(BigInt::from(i))
    }
}

impl From<BigInt> for Value {
    fn from(i: BigInt) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Value::Uuid(u)
    }
}

impl From<Keyword> for Value {
    fn from(k: Keyword) -> Self {
        Value::Keyword(k)
    }
}

impl From<Symbol> for Value {
    fn from(s: Symbol) -> Self {
        Value::Symbol(s)
    }
}

impl From<Uri> for Value {
    fn from(u: Uri) -> Self {
        Value::Uri(u)
    }
}

impl From<Timestamp> for Value {
    fn from(t: Timestamp) -> Self {
        Value::Timestamp(t)
    }
}

impl From<BigDecimal> for Value {
    fn from(d: BigDecimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<Link> for Value {
    fn from(l: Link) -> Self {
        Value::Link(Box::new(l))
    }
}

impl From<Ratio> for Value {
    fn from(r: Ratio) -> Self {
        Value::Ratio(Box::new(r))
    }
}

impl From<TaggedValue> for Value {
    fn from(t: TaggedValue) -> Self {
        Value::Tagged(Box::new(t))
    }
}

impl From<CustomValue> for Value {
    fn from(c: CustomValue) -> Self {
        Value::Custom(c)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_type_name() {
        assert_eq!(Value::Null.kind(), ValueKind::Null);
        assert_eq!(Value::from(3).kind(), ValueKind::Integer);
        assert_eq!(Value::keyword("a").type_name(), "keyword");
        assert_eq!(Value::tagged("point", 1).kind(), ValueKind::Tagged);
    }

    #[test]
    fn test_map_get() {
        let m = Value::map([("a", Value::from(1)), ("b", Value::from("two"))]);
        assert_eq!(m.get("b"), Some(&Value::from("two")));
        assert_eq!(m.get("c"), None);
        assert_eq!(Value::from(1).get("a"), None);
    }

    #[test]
    fn test_as_i64_bounds() {
        assert_eq!(Value::from(i64::MAX).as_i64(), Some(i64::MAX));
        assert_eq!(Value::from(i64::MAX as i128 + 1).as_i64(), None);
    }

    #[test]
    fn test_option_into_value() {
        assert_eq!(Value::from(None::<&str>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::from("x"));
    }
}
