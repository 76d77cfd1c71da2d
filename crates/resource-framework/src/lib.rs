//! # Resource Framework
//!
//! This crate renders domain objects as resource documents driven by
//! declarative, per-type schemas. It is the presentation layer of an API: it
//! decides **what** an object looks like on the wire (attributes, meta,
//! related resources), and how collections of objects are ordered, without
//! knowing anything about where the objects come from.
//!
//! ## Architecture Overview
//!
//! The framework separates concerns into three layers:
//!
//! 1. **Domain Layer** ([`Resource`]) - Your models expose identity, properties and related objects
//! 2. **Schema Layer** ([`ResourceDescriptor`], [`Registry`]) - One immutable descriptor per resource type
//! 3. **Engine Layer** ([`SerializationEngine`], [`SortEngine`]) - Stateless engines driven by the registry
//!
//! You describe a type **once** in its descriptor, and the engines handle
//! include-graph expansion, deduplication, polymorphic rendering and sorting.
//!
//! ## Core Abstractions
//!
//! ### [`ResourceDescriptor`] - The Schema
//!
//! Every field is a tagged slot resolved at registration time, with a fixed
//! precedence: **Override > Transform > Direct**. Descriptors are values:
//! [`ResourceDescriptor::inherit`] copies the parent's tables, so later changes
//! to either side never leak into the other.
//!
//! ```rust
//! use resource_framework::{FieldSpec, Registry, RelationshipSpec, ResourceDescriptor};
//! use serde_json::json;
//!
//! let user = ResourceDescriptor::new("User")
//!     .attributes(["name", "email"])
//!     .has_many("posts");
//! let admin = ResourceDescriptor::inherit(&user, "Admin")
//!     .attribute_with("role", FieldSpec::transform(|_, _| json!("admin")));
//!
//! assert_eq!(user.type_name(), "users");
//! assert_eq!(admin.type_name(), "admins");
//! assert_eq!(admin.attribute_names(), ["name", "email", "role"]);
//! assert_eq!(user.attribute_names(), ["name", "email"]);
//!
//! let mut registry = Registry::new();
//! registry.register(user).unwrap();
//! registry.register(admin).unwrap();
//! assert!(registry.for_domain_type("Admin").is_some());
//! ```
//!
//! ### [`SerializationEngine`] - Documents
//!
//! ```rust
//! use resource_framework::mock::MockResource;
//! use resource_framework::{
//!     Context, Registry, Related, RelationshipSpec, ResourceDescriptor, ResourceRef,
//!     SerializationEngine, SerializerConfig,
//! };
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let mut registry = Registry::new();
//! registry.register(ResourceDescriptor::new("User").attribute("name")).unwrap();
//! let posts = registry
//!     .register(
//!         ResourceDescriptor::new("Post")
//!             .attribute("title")
//!             .relationship(RelationshipSpec::to_one("author").target("users")),
//!     )
//!     .unwrap();
//!
//! let author = MockResource::new("User", "7").with_property("name", json!("Ada")).shared();
//! let post: ResourceRef = MockResource::new("Post", "1")
//!     .with_property("title", json!("Hello"))
//!     .with_related("author", Related::One(author))
//!     .shared();
//!
//! let engine = SerializationEngine::new(Arc::new(registry), SerializerConfig::default());
//! let doc = engine.serialize(&posts, post, &Context::new(), &["author"]).unwrap();
//! assert_eq!(
//!     serde_json::to_value(&doc).unwrap(),
//!     json!({
//!         "data": {"id": "1", "type": "posts", "attributes": {"title": "Hello"}},
//!         "included": [{"id": "7", "type": "users", "attributes": {"name": "Ada"}}]
//!     })
//! );
//! ```
//!
//! ### [`SortEngine`] - Ordering
//!
//! Sort text is parsed into a [`SortDirective`] and applied to anything
//! [`Orderable`]. Every field is validated first; a bad field leaves the
//! collection untouched.
//!
//! ```rust
//! use resource_framework::mock::MockResource;
//! use resource_framework::{ResourceDescriptor, ResourceList, SortEngine, SortError};
//! use serde_json::json;
//!
//! let descriptor = ResourceDescriptor::new("Post").sortable("title");
//! let mut list = ResourceList::new(vec![
//!     MockResource::new("Post", "1").with_property("title", json!("b")).shared(),
//!     MockResource::new("Post", "2").with_property("title", json!("a")).shared(),
//! ]);
//!
//! let engine = SortEngine::default();
//! engine.apply(&mut list, &engine.parse("title"), &descriptor).unwrap();
//! assert_eq!(list.ids(), ["2", "1"]);
//!
//! let err = engine.apply(&mut list, &engine.parse("-title,views"), &descriptor).unwrap_err();
//! assert!(matches!(err, SortError::UnsupportedField { ref field, .. } if field == "views"));
//! assert_eq!(list.ids(), ["2", "1"]);
//! ```
//!
//! ## Concurrency Model
//!
//! - The [`Registry`] is built once with `&mut` access, then shared as `Arc<Registry>`
//! - Descriptors and engines are `Send + Sync`; every call is synchronous
//! - Each serialize call owns its [`IncludedSet`](include::IncludedSet)
//!
//! ## Testing
//!
//! The [`mock`] module provides [`MockResource`](mock::MockResource), a
//! resource whose shape is defined at runtime, so descriptors and engines can
//! be tested without a domain model, including cyclic object graphs.

pub mod config;
pub mod document;
pub mod error;
pub mod include;
pub mod mock;
pub mod resource;
pub mod schema;
pub mod serializer;
pub mod sort;
pub mod tracing;
pub mod value;
pub mod view;

// Re-exports for convenience
pub use config::{EngineConfig, SerializerConfig, SortConfig};
pub use document::{
    Document, Linkage, PrimaryData, Relationship, Relationships, ResourceIdentifier,
    ResourceObject,
};
pub use error::{ConfigError, IncludeError, ResourceError, SchemaError, SortError};
pub use include::IncludeTree;
pub use resource::{Related, Resource, ResourceRef};
pub use schema::{
    infer_type_name, Cardinality, DescriptorShape, FieldSource, FieldSpec, Registry,
    RelationshipShape, RelationshipSpec, ResourceDescriptor,
};
pub use serializer::{Primary, SerializationEngine};
pub use sort::{
    CustomSort, KeyFn, Orderable, ResourceList, SortDirection, SortDirective, SortEngine,
    SortStrategy, SortTerm, StrategyShape,
};
pub use value::{iso8601, Context, KeyTransform, ValueMap};
pub use view::{RelationshipValue, ResourceView};
