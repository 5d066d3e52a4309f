//! Request-scoped context passed alongside log events
//!
//! A `RequestContext` is a small type-keyed slot store. Callers populate it
//! once per request and hand a reference to every emit call. Sinks look up
//! the slots they understand:
//! - [`UserProperties`]: caller identity used for enrichment
//! - [`Hub`](crate::sinks::error_tracking::Hub): per-request error-tracking handle

use super::user_properties::UserProperties;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Immutable-by-convention bag of request-scoped values, keyed by type
#[derive(Clone, Default)]
pub struct RequestContext {
    slots: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    /// Store a value in the slot for its type, replacing any previous value
    pub fn with<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.insert(value);
        self
    }

    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        self.slots.insert(TypeId::of::<T>(), Arc::new(value));
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.slots
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.slots.contains_key(&TypeId::of::<T>())
    }

    /// Attach the caller's identity properties
    pub fn with_user_properties(self, properties: UserProperties) -> Self {
        self.with(properties)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("slots", &self.slots.len())
            .field("user_properties", &self.get::<UserProperties>())
            .finish()
    }
}
