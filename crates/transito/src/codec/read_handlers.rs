//! Built-in read handlers.
//!
//! A read handler rebuilds a value from the fully read representation of
//! one tag. Inline tags (`"~i42"`) hand their handler the string body;
//! tagged pairs hand it the decoded representation, so handlers that can
//! appear in both layouts accept both shapes.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::error::ReadError;
use crate::model::{
    BigDecimal, Keyword, Link, Ratio, Symbol, TaggedValue, Timestamp, Uri, Value, parse_uuid,
    uuid_from_halves,
};

/// Rebuilds a value from the representation of a registered tag.
pub trait ReadHandler: Send + Sync {
    fn from_rep(&self, rep: Value) -> Result<Value, ReadError>;
}

impl<F> ReadHandler for F
where
    F: Fn(Value) -> Result<Value, ReadError> + Send + Sync,
{
    fn from_rep(&self, rep: Value) -> Result<Value, ReadError> {
        self(rep)
    }
}

/// Builds the value for a tag that has no registered handler.
pub trait DefaultReadHandler: Send + Sync {
    fn from_rep(&self, tag: &str, rep: Value) -> Result<Value, ReadError>;
}

/// Keeps unknown tags as [`TaggedValue`]s so they survive a round trip.
pub struct TaggedValueReadHandler;

impl DefaultReadHandler for TaggedValueReadHandler {
    fn from_rep(&self, tag: &str, rep: Value) -> Result<Value, ReadError> {
        Ok(Value::Tagged(Box::new(TaggedValue::new(tag, rep))))
    }
}

fn expect_string(tag: &str, rep: Value) -> Result<String, ReadError> {
    match rep {
        Value::String(s) => Ok(s),
        other => Err(ReadError::invalid_rep(
            tag,
            format!("expected a string, got {}", other.type_name()),
        )),
    }
}

fn expect_array(tag: &str, rep: Value) -> Result<Vec<Value>, ReadError> {
    match rep {
        Value::Array(items) => Ok(items),
        other => Err(ReadError::invalid_rep(
            tag,
            format!("expected an array, got {}", other.type_name()),
        )),
    }
}

fn parse_integer(tag: &str, rep: Value) -> Result<BigInt, ReadError> {
    match rep {
        Value::Integer(i) => Ok(i),
        Value::String(s) => BigInt::parse_bytes(s.as_bytes(), 10)
            .ok_or_else(|| ReadError::invalid_rep(tag, format!("invalid integer {:?}", s))),
        other => Err(ReadError::invalid_rep(
            tag,
            format!("expected an integer, got {}", other.type_name()),
        )),
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

fn read_null(_rep: Value) -> Result<Value, ReadError> {
    Ok(Value::Null)
}

fn read_bool(rep: Value) -> Result<Value, ReadError> {
    match rep {
        Value::Bool(b) => Ok(Value::Bool(b)),
        other => Ok(Value::Bool(expect_string("?", other)? == "t")),
    }
}

fn read_integer(rep: Value) -> Result<Value, ReadError> {
    parse_integer("i", rep).map(Value::Integer)
}

fn read_big_integer(rep: Value) -> Result<Value, ReadError> {
    parse_integer("n", rep).map(Value::Integer)
}

fn read_float(rep: Value) -> Result<Value, ReadError> {
    match rep {
        Value::Float(f) => Ok(Value::Float(f)),
        Value::Integer(i) => i
            .to_f64()
            .map(Value::Float)
            .ok_or_else(|| ReadError::invalid_rep("d", "integer out of float range")),
        other => {
            let s = expect_string("d", other)?;
            s.parse::<f64>()
                .map(Value::Float)
                .map_err(|_| ReadError::invalid_rep("d", format!("invalid float {:?}", s)))
        }
    }
}

fn read_special_number(rep: Value) -> Result<Value, ReadError> {
    let s = expect_string("z", rep)?;
    match s.as_str() {
        "NaN" => Ok(Value::Float(f64::NAN)),
        "INF" => Ok(Value::Float(f64::INFINITY)),
        "-INF" => Ok(Value::Float(f64::NEG_INFINITY)),
        _ => Err(ReadError::invalid_rep("z", format!("unknown special number {:?}", s))),
    }
}

fn read_decimal(rep: Value) -> Result<Value, ReadError> {
    let s = expect_string("f", rep)?;
    s.parse::<BigDecimal>()
        .map(Value::Decimal)
        .map_err(|e| ReadError::invalid_rep("f", e.to_string()))
}

fn read_keyword(rep: Value) -> Result<Value, ReadError> {
    expect_string(":", rep).map(|s| Value::Keyword(Keyword::new(s)))
}

fn read_symbol(rep: Value) -> Result<Value, ReadError> {
    expect_string("$", rep).map(|s| Value::Symbol(Symbol::new(s)))
}

fn read_bytes(rep: Value) -> Result<Value, ReadError> {
    let s = expect_string("b", rep)?;
    let compact: String = s.chars().filter(|c| !matches!(c, '\n' | '\r')).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map(Value::Bytes)
        .map_err(|e| ReadError::invalid_rep("b", e.to_string()))
}

fn read_uuid(rep: Value) -> Result<Value, ReadError> {
    match rep {
        Value::String(s) => parse_uuid(&s)
            .map(Value::Uuid)
            .ok_or_else(|| ReadError::invalid_rep("u", format!("invalid UUID {:?}", s))),
        Value::Array(halves) => match halves.as_slice() {
            [msb, lsb] => {
                let half = |v: &Value| {
                    v.as_i64()
                        .ok_or_else(|| ReadError::invalid_rep("u", "UUID halves must be 64-bit integers"))
                };
                Ok(Value::Uuid(uuid_from_halves(half(msb)?, half(lsb)?)))
            }
            _ => Err(ReadError::invalid_rep("u", "expected two UUID halves")),
        },
        other => Err(ReadError::invalid_rep(
            "u",
            format!("expected a string or array, got {}", other.type_name()),
        )),
    }
}

fn read_uri(rep: Value) -> Result<Value, ReadError> {
    expect_string("r", rep).map(|s| Value::Uri(Uri::new(s)))
}

fn read_timestamp_millis(rep: Value) -> Result<Value, ReadError> {
    let millis = parse_integer("m", rep)?
        .to_i64()
        .ok_or_else(|| ReadError::invalid_rep("m", "milliseconds out of range"))?;
    Ok(Value::Timestamp(Timestamp::from_millis(millis)))
}

fn read_timestamp_string(rep: Value) -> Result<Value, ReadError> {
    let s = expect_string("t", rep)?;
    Timestamp::parse_rfc3339(&s)
        .map(Value::Timestamp)
        .map_err(|e| ReadError::invalid_rep("t", e.to_string()))
}

fn read_char(rep: Value) -> Result<Value, ReadError> {
    expect_string("c", rep).map(Value::String)
}

fn read_quote(rep: Value) -> Result<Value, ReadError> {
    Ok(rep)
}

fn read_set(rep: Value) -> Result<Value, ReadError> {
    expect_array("set", rep).map(Value::Set)
}

fn read_list(rep: Value) -> Result<Value, ReadError> {
    expect_array("list", rep).map(Value::Array)
}

fn read_cmap(rep: Value) -> Result<Value, ReadError> {
    let items = expect_array("cmap", rep)?;
    if items.len() % 2 != 0 {
        return Err(ReadError::invalid_rep("cmap", "odd number of elements"));
    }
    let mut pairs = Vec::with_capacity(items.len() / 2);
    let mut iter = items.into_iter();
    while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
        pairs.push((k, v));
    }
    Ok(Value::Map(pairs))
}

fn read_link(rep: Value) -> Result<Value, ReadError> {
    Link::from_map(&rep)
        .map(Value::from)
        .map_err(|reason| ReadError::invalid_rep("link", reason))
}

fn read_ratio(rep: Value) -> Result<Value, ReadError> {
    let items = expect_array("ratio", rep)?;
    let [numerator, denominator]: [Value; 2] = items
        .try_into()
        .map_err(|_| ReadError::invalid_rep("ratio", "expected numerator and denominator"))?;
    Ok(Value::from(Ratio::new(
        parse_integer("ratio", numerator)?,
        parse_integer("ratio", denominator)?,
    )))
}

/// Returns every built-in read handler with its tag.
pub fn builtin_read_handlers() -> Vec<(&'static str, Arc<dyn ReadHandler>)> {
    let handlers: [(&'static str, fn(Value) -> Result<Value, ReadError>); 21] = [
        ("_", read_null),
        ("?", read_bool),
        ("i", read_integer),
        ("n", read_big_integer),
        ("d", read_float),
        ("z", read_special_number),
        ("f", read_decimal),
        (":", read_keyword),
        ("$", read_symbol),
        ("b", read_bytes),
        ("u", read_uuid),
        ("r", read_uri),
        ("m", read_timestamp_millis),
        ("t", read_timestamp_string),
        ("c", read_char),
        ("'", read_quote),
        ("set", read_set),
        ("list", read_list),
        ("cmap", read_cmap),
        ("link", read_link),
        ("ratio", read_ratio),
    ];
    handlers
        .into_iter()
        .map(|(tag, f)| (tag, Arc::new(f) as Arc<dyn ReadHandler>))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler(tag: &str) -> Arc<dyn ReadHandler> {
        builtin_read_handlers()
            .into_iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, h)| h)
            .unwrap()
    }

    #[test]
    fn test_integer_from_string_and_number() {
        let i = handler("i");
        assert_eq!(i.from_rep(Value::from("42")).unwrap(), Value::from(42));
        assert_eq!(i.from_rep(Value::from(42)).unwrap(), Value::from(42));
        assert!(i.from_rep(Value::from("4x")).is_err());
    }

    #[test]
    fn test_uuid_both_shapes() {
        let u = handler("u");
        let from_string = u.from_rep(Value::from("dda5a83f-8f9d-4194-ae88-5745c8ca94a7")).unwrap();
        let halves = Value::array([
            Value::from(-2475387429224365676i64),
            Value::from(-5870346157044362073i64),
        ]);
        let from_halves = u.from_rep(halves).unwrap();
        assert_eq!(from_string, from_halves);
        assert!(u.from_rep(Value::from("nope")).is_err());
    }

    #[test]
    fn test_bytes_ignore_line_breaks() {
        let b = handler("b");
        assert_eq!(
            b.from_rep(Value::from("aGVs\nbG8=\n")).unwrap(),
            Value::Bytes(b"hello".to_vec())
        );
    }

    #[test]
    fn test_special_numbers() {
        let z = handler("z");
        assert!(z.from_rep(Value::from("NaN")).unwrap().as_f64().unwrap().is_nan());
        assert_eq!(z.from_rep(Value::from("-INF")).unwrap(), Value::Float(f64::NEG_INFINITY));
        assert!(z.from_rep(Value::from("Infinity")).is_err());
    }

    #[test]
    fn test_timestamps() {
        let expected = Value::Timestamp(Timestamp::from_millis(1_388_631_845_678));
        assert_eq!(handler("m").from_rep(Value::from("1388631845678")).unwrap(), expected);
        assert_eq!(handler("m").from_rep(Value::from(1_388_631_845_678i64)).unwrap(), expected);
        assert_eq!(
            handler("t").from_rep(Value::from("2014-01-02T03:04:05.678Z")).unwrap(),
            expected
        );
        assert_eq!(
            handler("t").from_rep(Value::from("2014-01-02T04:04:05.678+01:00")).unwrap(),
            expected
        );
    }

    #[test]
    fn test_cmap_and_ratio() {
        let cmap = handler("cmap")
            .from_rep(Value::array([Value::array([1]), Value::from("one")]))
            .unwrap();
        assert_eq!(cmap, Value::Map(vec![(Value::array([1]), Value::from("one"))]));
        assert!(handler("cmap").from_rep(Value::array([1])).is_err());

        let ratio = handler("ratio").from_rep(Value::array([1, 3])).unwrap();
        assert_eq!(ratio, Value::from(Ratio::new(1, 3)));
        assert!(handler("ratio").from_rep(Value::array([1])).is_err());
    }

    #[test]
    fn test_default_handler_keeps_tag() {
        let v = TaggedValueReadHandler.from_rep("point", Value::array([1, 2])).unwrap();
        assert_eq!(v, Value::tagged("point", Value::array([1, 2])));
    }

    #[test]
    fn test_closure_handler() {
        let upper = |rep: Value| -> Result<Value, ReadError> {
            Ok(Value::from(rep.as_str().unwrap_or_default().to_uppercase()))
        };
        assert_eq!(upper.from_rep(Value::from("abc")).unwrap(), Value::from("ABC"));
    }
}
