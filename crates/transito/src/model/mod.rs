//! Data model for transito values.
//!
//! - [`Value`]: the value tree the writer consumes and the reader produces
//! - Scalar extension types (keywords, symbols, URIs, timestamps, decimals)
//! - Composite extension types (links, ratios, generic tagged values)
//! - [`Extension`] / [`CustomValue`]: caller-defined types

pub mod composite;
pub mod custom;
pub mod decimal;
pub mod id;
pub mod scalar;
pub mod value;

pub use composite::{Link, LinkRender, Ratio, TaggedValue};
pub use custom::{CustomValue, Extension};
pub use decimal::{BigDecimal, ParseDecimalError};
pub use id::{format_uuid, parse_uuid, uuid_from_halves, uuid_halves, NIL_UUID};
pub use scalar::{Keyword, Symbol, Timestamp, Uri};
pub use value::{Value, ValueKind};
