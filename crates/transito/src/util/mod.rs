//! Utility modules for transito.

pub mod datetime;

pub use datetime::{DateTimeParseError, format_timestamp_millis, has_rfc3339_form, parse_timestamp_millis};
