//! Transito: a self-describing, extensible value codec.
//!
//! Values are written as JSON or MessagePack documents in which every
//! non-native type carries a tag. Any reader can decode any message: known
//! tags are rebuilt through read handlers, unknown ones come back as
//! [`TaggedValue`]s and survive a round trip.
//!
//! # Quick Start
//!
//! ```rust
//! use transito::{Format, Reader, Value, Writer};
//!
//! let value = Value::map([
//!     (Value::keyword("name"), Value::from("Alice")),
//!     (Value::keyword("tags"), Value::Set(vec![Value::keyword("admin")])),
//! ]);
//!
//! let bytes = Writer::new(Format::Json).write(&value).unwrap();
//! assert_eq!(
//!     std::str::from_utf8(&bytes).unwrap(),
//!     r#"["^ ","~:name","Alice","~:tags",["~#set",["~:admin"]]]"#
//! );
//!
//! let decoded = Reader::new(Format::Json).read(&bytes).unwrap();
//! assert_eq!(decoded, value);
//! ```
//!
//! # Formats
//!
//! - [`Format::Json`]: compact JSON. Maps are written as `["^ ", k, v, ...]`
//!   and repeated keys and tags are replaced by cache codes.
//! - [`Format::JsonVerbose`]: human-readable JSON. Native objects, no
//!   caching, ISO-8601 timestamps.
//! - [`Format::MessagePack`]: compact layout in MessagePack.
//!
//! # Modules
//!
//! - [`model`]: the value tree and extension types
//! - [`codec`]: writer, reader, handlers and the rolling cache
//! - [`error`]: error types
//! - [`limits`]: wire-format constants

pub mod codec;
pub mod error;
pub mod limits;
pub mod model;
pub mod util;

pub use codec::{
    DefaultReadHandler, Format, HandlerKey, ReadHandler, ReadOptions, Reader, WriteHandler,
    WriteOptions, Writer, decode, encode,
};
pub use error::{ReadError, WriteError};
pub use model::{
    BigDecimal, CustomValue, Extension, Keyword, Link, LinkRender, Ratio, Symbol, TaggedValue,
    Timestamp, Uri, Value, ValueKind,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
