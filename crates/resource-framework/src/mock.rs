//! # Mock Resources
//!
//! `MockResource` is a dynamically shaped [`Resource`] for testing descriptors
//! and engines without writing a domain model. Its domain type, id and
//! properties are plain data, and relationships can be wired **after**
//! construction, so cyclic graphs (`a.friend = b`, `b.friend = a`) are easy
//! to build.
//!
//! Cyclic wiring forms `Arc` cycles that are never freed. That is fine for
//! tests and nowhere else.
//!
//! ```rust
//! use resource_framework::mock::MockResource;
//! use resource_framework::{Related, Resource};
//! use serde_json::json;
//!
//! let a = MockResource::new("Person", "a").with_property("name", json!("Ann")).shared();
//! let b = MockResource::new("Person", "b").shared();
//! a.relate("friend", Related::One(b.clone()));
//! b.relate("friend", Related::One(a.clone()));
//!
//! assert_eq!(a.property("name"), Some(json!("Ann")));
//! assert_eq!(a.related("friend").into_vec()[0].resource_id(), "b");
//! ```

use crate::resource::{Related, Resource};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// A test double resource with runtime-defined shape.
pub struct MockResource {
    domain_type: String,
    id: String,
    properties: BTreeMap<String, Value>,
    relations: RwLock<BTreeMap<String, Related>>,
}

impl MockResource {
    pub fn new(domain_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            domain_type: domain_type.into(),
            id: id.into(),
            properties: BTreeMap::new(),
            relations: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    pub fn with_related(self, name: impl Into<String>, related: Related) -> Self {
        self.relate(name, related);
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Sets (or replaces) a relationship on an already shared object.
    pub fn relate(&self, name: impl Into<String>, related: Related) {
        self.relations
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name.into(), related);
    }
}

impl Resource for MockResource {
    fn resource_id(&self) -> String {
        self.id.clone()
    }

    fn domain_type(&self) -> &str {
        &self.domain_type
    }

    fn property(&self, name: &str) -> Option<Value> {
        self.properties.get(name).cloned()
    }

    fn related(&self, name: &str) -> Related {
        self.relations
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .cloned()
            .unwrap_or_default()
    }
}

// Relations are listed by name only; printing them could loop forever.
impl fmt::Debug for MockResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let relations = self
            .relations
            .read()
            .map(|r| r.keys().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        f.debug_struct("MockResource")
            .field("domain_type", &self.domain_type)
            .field("id", &self.id)
            .field("properties", &self.properties)
            .field("relations", &relations)
            .finish()
    }
}
