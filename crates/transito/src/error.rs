//! Error types for writing and reading transito messages.

use thiserror::Error;

/// Error during writing (value tree to bytes).
///
/// A failed write may already have emitted a prefix to the sink; callers
/// must treat the output of a failed write as unusable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WriteError {
    #[error("cannot find a write handler for {type_name}")]
    NoWriteHandler { type_name: &'static str },

    #[error("write handler for {type_name} must provide a non-empty tag")]
    InvalidWriteHandler { type_name: &'static str },

    #[error("representation for tag {tag:?} must be {expected}")]
    InvalidRepresentation { tag: String, expected: &'static str },

    #[error("value tagged {tag:?} has no string form and cannot be used as a map key")]
    NotStringable { tag: String },

    #[error("syntax error: {0}")]
    Syntax(String),
}

/// Error during reading (bytes to value tree).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReadError {
    #[error("cache code {code:?} refers to an unassigned slot")]
    MalformedCacheCode { code: String },

    #[error("map-as-array marker followed by odd number of elements ({len})")]
    MalformedMapMarker { len: usize },

    #[error("no read handler registered for tag {tag:?}")]
    UnknownTag { tag: String },

    #[error("invalid representation for tag {tag:?}: {reason}")]
    InvalidRepresentation { tag: String, reason: String },

    #[error("syntax error: {0}")]
    Syntax(String),
}

impl ReadError {
    /// Shorthand for [`ReadError::InvalidRepresentation`].
    pub fn invalid_rep(tag: impl Into<String>, reason: impl Into<String>) -> Self {
        ReadError::InvalidRepresentation {
            tag: tag.into(),
            reason: reason.into(),
        }
    }
}
