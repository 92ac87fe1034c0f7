//! Upcaster registry for event schema evolution.
//!
//! An upcaster rewrites an older serialized event (identified by type URL)
//! into its current shape before it reaches a state builder. Registered
//! transforms are applied repeatedly until no further upcaster matches, so
//! a chain of several schema versions resolves in one pass.

use std::collections::HashMap;

use prost_types::Any;

/// A single schema-evolution step: rewrites one Any payload into another.
pub type Upcast = fn(&Any) -> Any;

/// Registry of old-type-url -> transform mappings, applied to a fixed point.
#[derive(Default)]
pub struct UpcasterRegistry {
    transforms: HashMap<String, Upcast>,
}

impl UpcasterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transform keyed by the type URL it rewrites away from.
    ///
    /// The function's output type_url becomes the next lookup key, so
    /// chains of upcasters compose without extra wiring.
    pub fn register(mut self, old_type_url: impl Into<String>, transform: Upcast) -> Self {
        self.transforms.insert(old_type_url.into(), transform);
        self
    }

    /// Apply registered transforms repeatedly until the payload's type URL
    /// no longer matches any registered upcaster.
    ///
    /// Unknown or already-current type URLs pass through unchanged.
    pub fn upcast(&self, payload: &Any) -> Any {
        let mut current = payload.clone();
        loop {
            match self.transforms.get(&current.type_url) {
                Some(transform) => current = transform(&current),
                None => return current,
            }
        }
    }
}
