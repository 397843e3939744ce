//! Handler registry.
//!
//! Write handlers are keyed by value kind for built-in types, and by
//! concrete `TypeId` then declared capability for caller-defined extension
//! types. Resolution for extension types walks that chain once per type and
//! memoizes the result. The default compact and verbose tables are built
//! once per process and shared by every writer that has no overrides.

use std::any::TypeId;
use std::sync::Arc;

use dashmap::DashMap;
use lazy_static::lazy_static;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::codec::handlers::{BUILTIN_KINDS, WriteHandler, builtin_handler};
use crate::codec::read_handlers::{
    DefaultReadHandler, ReadHandler, TaggedValueReadHandler, builtin_read_handlers,
};
use crate::error::WriteError;
use crate::model::{Value, ValueKind};

/// What a caller-registered write handler applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HandlerKey {
    /// Every value of a built-in kind.
    Kind(ValueKind),
    /// A caller-defined extension type.
    Type(TypeId),
    /// Any extension type declaring this capability.
    Capability(&'static str),
}

lazy_static! {
    static ref DEFAULT_COMPACT: Arc<WriteHandlerTable> = Arc::new(WriteHandlerTable::build(false, &[]));
    static ref DEFAULT_VERBOSE: Arc<WriteHandlerTable> = Arc::new(WriteHandlerTable::build(true, &[]));
    static ref DEFAULT_READ: Arc<ReadHandlerTable> = Arc::new(ReadHandlerTable::build(&[], None));
}

// =============================================================================
// WRITE HANDLERS
// =============================================================================

/// Resolved write handlers for one mode (compact or verbose).
pub struct WriteHandlerTable {
    verbose: bool,
    by_kind: FxHashMap<ValueKind, Arc<dyn WriteHandler>>,
    by_type: FxHashMap<TypeId, Arc<dyn WriteHandler>>,
    by_capability: FxHashMap<&'static str, Arc<dyn WriteHandler>>,
    resolved: DashMap<TypeId, Arc<dyn WriteHandler>>,
}

impl WriteHandlerTable {
    /// Returns the process-wide table of built-in handlers for a mode.
    pub fn shared(verbose: bool) -> Arc<Self> {
        if verbose {
            Arc::clone(&DEFAULT_VERBOSE)
        } else {
            Arc::clone(&DEFAULT_COMPACT)
        }
    }

    /// Returns a table with caller overrides applied on top of the built-ins.
    ///
    /// With no overrides this is the shared table.
    pub fn with_overrides(verbose: bool, overrides: &[(HandlerKey, Arc<dyn WriteHandler>)]) -> Arc<Self> {
        if overrides.is_empty() {
            Self::shared(verbose)
        } else {
            Arc::new(Self::build(verbose, overrides))
        }
    }

    fn build(verbose: bool, overrides: &[(HandlerKey, Arc<dyn WriteHandler>)]) -> Self {
        let for_mode = |handler: Arc<dyn WriteHandler>| -> Arc<dyn WriteHandler> {
            if verbose {
                handler.verbose_handler().unwrap_or(handler)
            } else {
                handler
            }
        };

        let mut by_kind = FxHashMap::default();
        for kind in BUILTIN_KINDS {
            if let Some(handler) = builtin_handler(kind) {
                by_kind.insert(kind, for_mode(handler));
            }
        }

        let mut by_type = FxHashMap::default();
        let mut by_capability = FxHashMap::default();
        for (key, handler) in overrides {
            let handler = for_mode(Arc::clone(handler));
            match key {
                HandlerKey::Kind(kind) => {
                    by_kind.insert(*kind, handler);
                }
                HandlerKey::Type(type_id) => {
                    by_type.insert(*type_id, handler);
                }
                HandlerKey::Capability(name) => {
                    by_capability.insert(*name, handler);
                }
            }
        }

        Self {
            verbose,
            by_kind,
            by_type,
            by_capability,
            resolved: DashMap::new(),
        }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Finds the handler for a value.
    pub fn resolve(&self, value: &Value) -> Result<Arc<dyn WriteHandler>, WriteError> {
        let custom = match value {
            Value::Custom(custom) => custom,
            other => {
                return self
                    .by_kind
                    .get(&other.kind())
                    .cloned()
                    .ok_or(WriteError::NoWriteHandler {
                        type_name: other.type_name(),
                    });
            }
        };

        let type_id = custom.type_id();
        if let Some(handler) = self.resolved.get(&type_id) {
            return Ok(Arc::clone(handler.value()));
        }

        let handler = self
            .by_type
            .get(&type_id)
            .or_else(|| {
                custom
                    .capabilities()
                    .iter()
                    .find_map(|name| self.by_capability.get(name))
            })
            .or_else(|| self.by_kind.get(&ValueKind::Custom))
            .cloned()
            .ok_or(WriteError::NoWriteHandler {
                type_name: custom.type_name(),
            })?;

        trace!(type_name = custom.type_name(), verbose = self.verbose, "memoized write handler");
        // First insert wins on a race.
        let entry = self.resolved.entry(type_id).or_insert(handler);
        Ok(Arc::clone(entry.value()))
    }

    /// Number of extension types resolved so far.
    pub fn resolved_len(&self) -> usize {
        self.resolved.len()
    }
}

// =============================================================================
// READ HANDLERS
// =============================================================================

/// Read handlers keyed by tag, plus the fallback for unknown tags.
pub struct ReadHandlerTable {
    handlers: FxHashMap<String, Arc<dyn ReadHandler>>,
    default: Arc<dyn DefaultReadHandler>,
}

impl ReadHandlerTable {
    /// Returns the process-wide table of built-in read handlers.
    pub fn shared() -> Arc<Self> {
        Arc::clone(&DEFAULT_READ)
    }

    /// Returns a table with caller handlers added to (or replacing) the
    /// built-ins. With no changes this is the shared table.
    pub fn with_overrides(
        overrides: &[(String, Arc<dyn ReadHandler>)],
        default: Option<Arc<dyn DefaultReadHandler>>,
    ) -> Arc<Self> {
        if overrides.is_empty() && default.is_none() {
            Self::shared()
        } else {
            Arc::new(Self::build(overrides, default))
        }
    }

    fn build(overrides: &[(String, Arc<dyn ReadHandler>)], default: Option<Arc<dyn DefaultReadHandler>>) -> Self {
        let mut handlers: FxHashMap<String, Arc<dyn ReadHandler>> = builtin_read_handlers()
            .into_iter()
            .map(|(tag, handler)| (tag.to_string(), handler))
            .collect();
        for (tag, handler) in overrides {
            handlers.insert(tag.clone(), Arc::clone(handler));
        }
        Self {
            handlers,
            default: default.unwrap_or_else(|| Arc::new(TaggedValueReadHandler)),
        }
    }

    pub fn get(&self, tag: &str) -> Option<&Arc<dyn ReadHandler>> {
        self.handlers.get(tag)
    }

    pub fn default_handler(&self) -> &Arc<dyn DefaultReadHandler> {
        &self.default
    }
}
