//! Caller-registered write and read handlers.

use std::any::Any;
use std::borrow::Cow;
use std::sync::Arc;

use transito::{
    CustomValue, Extension, Format, ReadError, ReadOptions, Reader, Value, ValueKind, WriteError,
    WriteHandler, WriteOptions, Writer,
};

#[derive(Debug, Clone, PartialEq)]
struct Person {
    name: String,
    age: i64,
}

impl Extension for Person {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn Extension) -> bool {
        other.as_any().downcast_ref::<Person>() == Some(self)
    }
}

struct PersonHandler;

impl WriteHandler for PersonHandler {
    fn tag<'a>(&'a self, _value: &'a Value) -> &'a str {
        "person"
    }

    fn rep<'a>(&self, value: &'a Value) -> Result<Cow<'a, Value>, WriteError> {
        let person = match value {
            Value::Custom(c) => c.downcast_ref::<Person>(),
            _ => None,
        };
        let person = person.ok_or_else(|| WriteError::InvalidRepresentation {
            tag: "person".into(),
            expected: "a person",
        })?;
        Ok(Cow::Owned(Value::map([
            (Value::from("name"), Value::from(person.name.as_str())),
            (Value::from("age"), Value::from(person.age)),
        ])))
    }
}

fn read_person(rep: Value) -> Result<Value, ReadError> {
    let name = rep.get("name").and_then(Value::as_str);
    let age = rep.get("age").and_then(Value::as_i64);
    match (name, age) {
        (Some(name), Some(age)) => Ok(Value::Custom(CustomValue::new(Person {
            name: name.to_string(),
            age,
        }))),
        _ => Err(ReadError::invalid_rep("person", "expected name and age")),
    }
}

fn person(name: &str, age: i64) -> Value {
    Value::Custom(CustomValue::new(Person {
        name: name.to_string(),
        age,
    }))
}

#[test]
fn test_custom_type_roundtrip() {
    let write_options = WriteOptions::new().type_handler::<Person>(PersonHandler);
    let read_options = ReadOptions::new().handler("person", read_person);
    let people = Value::array([person("Ada", 36), person("Alan", 41)]);

    for format in [Format::Json, Format::JsonVerbose, Format::MessagePack] {
        let bytes = Writer::with_options(format, &write_options).write(&people).unwrap();
        let back = Reader::with_options(format, &read_options).read(&bytes).unwrap();
        assert_eq!(back, people);
    }

    let text = Writer::with_options(Format::Json, &write_options).write(&people).unwrap();
    assert_eq!(
        String::from_utf8(text).unwrap(),
        r#"[["~#person",["^ ","name","Ada","age",36]],["^0",["^ ","^1","Alan","age",41]]]"#
    );
}

#[test]
fn test_custom_type_without_read_handler() {
    let bytes = Writer::with_options(Format::Json, &WriteOptions::new().type_handler::<Person>(PersonHandler))
        .write(&person("Ada", 36))
        .unwrap();
    let back = Reader::new(Format::Json).read(&bytes).unwrap();
    assert_eq!(back, Value::tagged("person", Value::map([("name", Value::from("Ada")), ("age", Value::from(36))])));
}

#[test]
fn test_custom_type_without_write_handler() {
    let err = Writer::new(Format::Json).write(&person("Ada", 36)).unwrap_err();
    assert!(matches!(err, WriteError::NoWriteHandler { type_name } if type_name.ends_with("Person")));
}

// =============================================================================
// KIND OVERRIDES
// =============================================================================

struct LoudStringHandler;

impl WriteHandler for LoudStringHandler {
    fn tag<'a>(&'a self, _value: &'a Value) -> &'a str {
        "s"
    }

    fn rep<'a>(&self, value: &'a Value) -> Result<Cow<'a, Value>, WriteError> {
        Ok(Cow::Owned(Value::String(format!("MYSTRING: {}", value.as_str().unwrap_or_default()))))
    }
}

#[test]
fn test_builtin_kind_override() {
    let options = WriteOptions::new().kind_handler(ValueKind::String, LoudStringHandler);
    let verbose = Writer::with_options(Format::JsonVerbose, &options);
    assert_eq!(
        String::from_utf8(verbose.write(&Value::from("this")).unwrap()).unwrap(),
        r#"{"~#'":"MYSTRING: this"}"#
    );
    // Writers without the override are unaffected.
    assert_eq!(
        String::from_utf8(Writer::new(Format::JsonVerbose).write(&Value::from("this")).unwrap()).unwrap(),
        r#"{"~#'":"this"}"#
    );
}

// =============================================================================
// VERBOSE VARIANTS AND CAPABILITIES
// =============================================================================

#[derive(Debug, PartialEq)]
struct Phone(u64);

impl Extension for Phone {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn Extension) -> bool {
        other.as_any().downcast_ref::<Phone>() == Some(self)
    }

    fn capabilities(&self) -> &'static [&'static str] {
        &["contact", "numeric"]
    }
}

fn phone_number(value: &Value) -> Option<u64> {
    match value {
        Value::Custom(c) => c.downcast_ref::<Phone>().map(|p| p.0),
        _ => None,
    }
}

struct PhoneHandler;

impl WriteHandler for PhoneHandler {
    fn tag<'a>(&'a self, _value: &'a Value) -> &'a str {
        "phone"
    }

    fn rep<'a>(&self, value: &'a Value) -> Result<Cow<'a, Value>, WriteError> {
        let n = phone_number(value).ok_or_else(|| WriteError::InvalidRepresentation {
            tag: "phone".into(),
            expected: "a phone",
        })?;
        Ok(Cow::Owned(Value::from(n)))
    }

    fn verbose_handler(&self) -> Option<Arc<dyn WriteHandler>> {
        Some(Arc::new(VerbosePhoneHandler))
    }
}

struct VerbosePhoneHandler;

impl WriteHandler for VerbosePhoneHandler {
    fn tag<'a>(&'a self, _value: &'a Value) -> &'a str {
        "phone"
    }

    fn rep<'a>(&self, value: &'a Value) -> Result<Cow<'a, Value>, WriteError> {
        let n = phone_number(value).ok_or_else(|| WriteError::InvalidRepresentation {
            tag: "phone".into(),
            expected: "a phone",
        })?;
        let digits = n.to_string();
        let (area, rest) = digits.split_at(digits.len().min(3));
        Ok(Cow::Owned(Value::String(format!("({}) {}", area, rest))))
    }
}

fn read_phone(rep: Value) -> Result<Value, ReadError> {
    let n = match &rep {
        Value::String(s) => s.chars().filter(char::is_ascii_digit).collect::<String>().parse().ok(),
        other => other.as_i64().and_then(|n| u64::try_from(n).ok()),
    };
    n.map(|n| Value::Custom(CustomValue::new(Phone(n))))
        .ok_or_else(|| ReadError::invalid_rep("phone", "expected digits"))
}

#[test]
fn test_verbose_variant_by_capability() {
    let options = WriteOptions::new().capability_handler("numeric", PhoneHandler);
    let phone = Value::array([Value::Custom(CustomValue::new(Phone(5551234567)))]);

    let compact = Writer::with_options(Format::Json, &options).write(&phone).unwrap();
    assert_eq!(String::from_utf8(compact.clone()).unwrap(), r#"[["~#phone",5551234567]]"#);

    let verbose = Writer::with_options(Format::JsonVerbose, &options).write(&phone).unwrap();
    assert_eq!(String::from_utf8(verbose.clone()).unwrap(), r#"[{"~#phone":"(555) 1234567"}]"#);

    let reader_options = ReadOptions::new().handler("phone", read_phone);
    assert_eq!(Reader::with_options(Format::Json, &reader_options).read(&compact).unwrap(), phone);
    assert_eq!(Reader::with_options(Format::JsonVerbose, &reader_options).read(&verbose).unwrap(), phone);
}

#[test]
fn test_type_handler_beats_capability() {
    let options = WriteOptions::new()
        .capability_handler("contact", PersonHandler)
        .type_handler::<Phone>(PhoneHandler);
    let writer = Writer::with_options(Format::Json, &options);
    let bytes = writer.write(&Value::array([Value::Custom(CustomValue::new(Phone(1)))])).unwrap();
    assert_eq!(String::from_utf8(bytes).unwrap(), r#"[["~#phone",1]]"#);
    assert_eq!(writer.handlers().resolved_len(), 1);
}

// =============================================================================
// INVALID HANDLERS
// =============================================================================

struct EmptyTagHandler;

impl WriteHandler for EmptyTagHandler {
    fn tag<'a>(&'a self, _value: &'a Value) -> &'a str {
        ""
    }

    fn rep<'a>(&self, value: &'a Value) -> Result<Cow<'a, Value>, WriteError> {
        Ok(Cow::Borrowed(value))
    }
}

#[test]
fn test_empty_tag_is_rejected() {
    let options = WriteOptions::new().type_handler::<Person>(EmptyTagHandler);
    let writer = Writer::with_options(Format::Json, &options);
    let err = writer.write(&Value::array([person("Ada", 36)])).unwrap_err();
    assert!(matches!(err, WriteError::InvalidWriteHandler { .. }));
    assert!(matches!(
        writer.write(&person("Ada", 36)).unwrap_err(),
        WriteError::InvalidWriteHandler { .. }
    ));
}

#[test]
fn test_single_char_tag_without_string_form_as_key() {
    struct Inline;

    impl WriteHandler for Inline {
        fn tag<'a>(&'a self, _value: &'a Value) -> &'a str {
            "p"
        }

        fn rep<'a>(&self, _value: &'a Value) -> Result<Cow<'a, Value>, WriteError> {
            Ok(Cow::Owned(Value::array([1, 2])))
        }
    }

    let options = WriteOptions::new().type_handler::<Person>(Inline);
    let writer = Writer::with_options(Format::Json, &options);
    let v = Value::map([(person("Ada", 36), Value::from(1))]);
    assert_eq!(
        String::from_utf8(writer.write(&v).unwrap()).unwrap(),
        r#"["~#cmap",[["~#p",[1,2]],1]]"#
    );
}
