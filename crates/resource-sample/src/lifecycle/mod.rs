//! # System Lifecycle
//!
//! Wires the blog together at startup.
//!
//! ## Startup Order
//!
//! 1. **Schema** - every descriptor is registered into one [`Registry`](resource_framework::Registry),
//!    which is then frozen behind an `Arc`
//! 2. **Engines** - serializer and sort engine are built from an [`EngineConfig`](resource_framework::EngineConfig)
//! 3. **Store** - an empty [`BlogStore`](crate::store::BlogStore), optionally seeded with demo data
//! 4. **Handlers** - the [`ApiHandler`](crate::handlers::ApiHandler) shares the store and engines
//!
//! ```rust,ignore
//! let system = BlogSystem::from_config_file("blog.toml")?;
//! let ids = system.seed_demo().await?;
//! let doc = system.api.show("posts", &ids.ownership.to_string(), &ApiQuery::parse("include=author")?).await?;
//! ```
//!
//! ## Configuration
//!
//! ```toml
//! [serializer]
//! key_transform = "camel"       # unaltered | camel | dash | underscore
//! relationship_linkage = true
//!
//! [sort]
//! descending_marker = "-"
//! separator = ","
//! ```
//!
//! Missing keys keep their defaults. There is no global state: a second
//! system with another configuration can run side by side.

pub mod blog_system;

pub use blog_system::*;
