//! Writing and reading transito messages.
//!
//! A message passes through three representations: the [`Value`] tree, the
//! primitive [`Wire`] tree (what JSON or MessagePack can express natively),
//! and bytes. The [`Writer`] and [`Reader`] own the first step in each
//! direction; [`wire`] owns the syntax.

pub mod cache;
pub mod decoder;
pub mod handlers;
pub mod read_handlers;
pub mod reader;
pub mod registry;
pub mod wire;
pub mod writer;

pub use handlers::WriteHandler;
pub use read_handlers::{DefaultReadHandler, ReadHandler, TaggedValueReadHandler};
pub use reader::{ReadOptions, Reader};
pub use registry::{HandlerKey, ReadHandlerTable, WriteHandlerTable};
pub use wire::{Format, Wire};
pub use writer::{WriteOptions, Writer};

use crate::error::{ReadError, WriteError};
use crate::model::Value;

/// Writes `value` as one message with the built-in handlers.
pub fn encode(value: &Value, format: Format) -> Result<Vec<u8>, WriteError> {
    Writer::new(format).write(value)
}

/// Reads one message with the built-in handlers.
pub fn decode(bytes: &[u8], format: Format) -> Result<Value, ReadError> {
    Reader::new(format).read(bytes)
}
