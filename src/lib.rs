#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
//! # Resource Recipe
//!
//! > **A Recipe for Schema-driven Resource Documents in Rust.**
//!
//! This crate demonstrates a pattern for turning plain domain objects into
//! JSON:API-style documents. Each resource type is described **once** by a
//! descriptor (attributes, meta, relationships, sortable fields), and two
//! engines do the rest:
//!
//! - the **serializer** renders primary data and walks include paths such as
//!   `comments.author`, collecting every related resource exactly once;
//! - the **sort engine** validates `sort=-created_at,title` against the
//!   descriptor and applies it to an in-memory list or a query builder.
//!
//! ## 🏗️ Layout
//!
//! | Crate | Re-exported as | Contents |
//! |-------|----------------|----------|
//! | `resource-framework` | [`framework`] | Descriptors, registry, engines, wire types |
//! | `resource-sample` | [`blog`] | A small blog: models, store, schema, handlers |
//!
//! ## 🚀 Quick Start
//!
//! ```rust
//! use resource_recipe::prelude::*;
//! use serde_json::json;
//!
//! let mut registry = Registry::new();
//! let people = registry
//!     .register(ResourceDescriptor::new("Person").attributes(["name"]))
//!     .unwrap();
//! let engine = SerializationEngine::new(registry.into(), SerializerConfig::default());
//!
//! let ann: ResourceRef = MockResource::new("Person", "1")
//!     .with_property("name", json!("Ann"))
//!     .shared();
//! let doc = engine
//!     .serialize(&people, ann, &Context::new(), &[] as &[&str])
//!     .unwrap();
//!
//! assert_eq!(
//!     serde_json::to_value(&doc).unwrap(),
//!     json!({"data": {"id": "1", "type": "people", "attributes": {"name": "Ann"}}})
//! );
//! ```
//!
//! ## 👩‍💻 Architecture Notes
//!
//! ### Descriptors are values
//! A descriptor is built with a fluent builder and frozen into a
//! [`Registry`](framework::Registry). Inheritance copies the parent's tables,
//! so a child type never leaks fields back into its parent.
//!
//! ### Include resolution is a graph walk
//! Related objects are deduplicated by `(type, id)`, roots are never
//! repeated in `included`, and cycles terminate because a node is expanded
//! only the first time it is reached.
//!
//! ### No global state
//! Engines take their options from an [`EngineConfig`](framework::EngineConfig);
//! two differently configured engines can serve side by side.
//!
//! ## 🔭 Observability
//!
//! Every engine logs through `tracing`. Call
//! [`setup_tracing`](framework::tracing::setup_tracing) once and filter with
//! `RUST_LOG`, e.g. `RUST_LOG=resource_framework=trace`.

pub use resource_framework as framework;
pub use resource_sample as blog;

/// The types most programs need, in one import.
pub mod prelude {
    pub use resource_framework::mock::MockResource;
    pub use resource_framework::{
        Context, Document, EngineConfig, KeyTransform, Primary, Registry, Related,
        RelationshipSpec, Resource, ResourceDescriptor, ResourceList, ResourceRef,
        SerializationEngine, SerializerConfig, SortDirection, SortEngine,
    };
}
