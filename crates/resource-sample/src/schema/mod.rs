//! # Blog Schema
//!
//! One descriptor module per resource type, and [`build_registry`] to
//! register them all at startup.
//!
//! | Type       | Domain type | Relationships                                  |
//! |------------|-------------|------------------------------------------------|
//! | `users`    | `User`      | `posts`, `comments`                            |
//! | `admins`   | `Admin`     | inherited from `users`                         |
//! | `posts`    | `Post`      | `author` (user or admin), `comments`, `tags`   |
//! | `comments` | `Comment`   | `author` (always as `users`), `post`, `tags`   |
//! | `tags`     | `Tag`       | `taggings` (posts and comments)                |
//!
//! Relationship accessors read from the [`BlogData`] snapshot the request
//! handler places in the context. Without one, every relationship is empty.

pub mod comment;
pub mod post;
pub mod tag;
pub mod user;

use crate::store::BlogData;
use resource_framework::{Context, Registry, Related, Resource, SchemaError};
use std::str::FromStr;
use tracing::info;

/// Registers every blog descriptor.
pub fn build_registry() -> Result<Registry, SchemaError> {
    let mut registry = Registry::new();
    let users = user::descriptor();
    registry.register(user::admin_descriptor(&users))?;
    registry.register(users)?;
    registry.register(post::descriptor())?;
    registry.register(comment::descriptor())?;
    registry.register(tag::descriptor())?;
    info!(types = ?registry.type_names().collect::<Vec<_>>(), "Schema registered");
    Ok(registry)
}

/// Runs `f` against the request's data snapshot.
fn with_data(ctx: &Context, f: impl FnOnce(&BlogData) -> Related) -> Related {
    ctx.extension::<BlogData>().map_or(Related::None, f)
}

/// Runs `f` with the object's parsed id, for accessors shared by several
/// domain types.
fn by_id<Id: FromStr>(
    object: &dyn Resource,
    ctx: &Context,
    f: impl FnOnce(&BlogData, Id) -> Related,
) -> Related {
    match object.resource_id().parse::<Id>() {
        Ok(id) => with_data(ctx, |data| f(data, id)),
        Err(_) => Related::None,
    }
}
