//! Caller-defined extension types.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A caller-defined type that can be carried inside a [`Value`](crate::Value).
///
/// Write handlers for extension types are looked up first by the concrete
/// `TypeId`, then by each declared capability in order.
pub trait Extension: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    /// Equality against another extension value of any type.
    fn dyn_eq(&self, other: &dyn Extension) -> bool;

    /// Capability names this type declares, most specific first.
    fn capabilities(&self) -> &'static [&'static str] {
        &[]
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Shared handle to a caller-defined extension value.
#[derive(Clone)]
pub struct CustomValue(Arc<dyn Extension>);

impl CustomValue {
    pub fn new<T: Extension>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    /// `TypeId` of the wrapped concrete type.
    pub fn type_id(&self) -> TypeId {
        self.0.as_any().type_id()
    }

    pub fn capabilities(&self) -> &'static [&'static str] {
        self.0.capabilities()
    }

    pub fn downcast_ref<T: Extension>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    pub fn inner(&self) -> &dyn Extension {
        self.0.as_ref()
    }
}

impl PartialEq for CustomValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.type_id() == other.type_id() && self.0.dyn_eq(other.0.as_ref()))
    }
}

impl fmt::Debug for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.0.as_ref(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Point {
        x: i64,
        y: i64,
    }

    impl Extension for Point {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn dyn_eq(&self, other: &dyn Extension) -> bool {
            other.as_any().downcast_ref::<Point>() == Some(self)
        }

        fn capabilities(&self) -> &'static [&'static str] {
            &["geometry"]
        }
    }

    #[test]
    fn test_equality_by_content() {
        let a = CustomValue::new(Point { x: 1, y: 2 });
        let b = CustomValue::new(Point { x: 1, y: 2 });
        let c = CustomValue::new(Point { x: 3, y: 2 });
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_downcast_and_metadata() {
        let v = CustomValue::new(Point { x: 5, y: 6 });
        assert_eq!(v.type_id(), TypeId::of::<Point>());
        assert_eq!(v.capabilities(), &["geometry"]);
        assert_eq!(v.downcast_ref::<Point>().map(|p| p.x), Some(5));
        assert!(v.type_name().ends_with("Point"));
    }
}
