//! # Resource Trait
//!
//! The `Resource` trait is the contract between a domain model and the
//! framework. It exposes identity, the runtime (most-derived) domain type
//! name, and direct lookups for properties and related objects. Everything
//! else about how an object is rendered lives in its
//! [`ResourceDescriptor`](crate::schema::ResourceDescriptor).
//!
//! Related objects travel as `Arc<dyn Resource>`, so one relationship may hold
//! objects of several concrete types.

use serde_json::Value;
use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

/// A shared, type-erased domain object.
pub type ResourceRef = Arc<dyn Resource>;

/// Trait that domain objects implement to be rendered as resources.
///
/// # Example
///
/// ```rust
/// use resource_framework::Resource;
/// use serde_json::{json, Value};
///
/// #[derive(Debug)]
/// struct Author { id: u32, name: String }
///
/// impl Resource for Author {
///     fn resource_id(&self) -> String { self.id.to_string() }
///     fn property(&self, name: &str) -> Option<Value> {
///         match name {
///             "name" => Some(json!(self.name)),
///             _ => None,
///         }
///     }
/// }
///
/// let author = Author { id: 1, name: "Ada".into() };
/// assert_eq!(author.domain_type(), "Author");
/// assert_eq!(author.property("name"), Some(json!("Ada")));
/// ```
pub trait Resource: Any + Debug + Send + Sync {
    /// The identity field, rendered as the resource `id`.
    fn resource_id(&self) -> String;

    /// Name of the concrete domain type, used to pick a descriptor for
    /// objects reached through polymorphic relationships.
    ///
    /// Defaults to the unqualified Rust type name (`Post` rather than
    /// `blog::model::post::Post`).
    fn domain_type(&self) -> &str {
        short_type_name::<Self>()
    }

    /// Value of a named property, used by `Direct` fields.
    fn property(&self, name: &str) -> Option<Value>;

    /// Objects related under `name`, used by `Direct` relationship accessors.
    fn related(&self, _name: &str) -> Related {
        Related::None
    }
}

impl dyn Resource {
    /// Downcasts to a concrete domain type.
    pub fn downcast_ref<T: Resource>(&self) -> Option<&T> {
        let any: &dyn Any = self;
        any.downcast_ref::<T>()
    }
}

/// Extracts the last path segment of a type name, dropping generic arguments.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Raw result of a relationship accessor, before normalization.
#[derive(Debug, Clone, Default)]
pub enum Related {
    #[default]
    None,
    One(ResourceRef),
    Many(Vec<ResourceRef>),
}

impl Related {
    /// Wraps any concrete resource.
    pub fn one<T: Resource>(object: Arc<T>) -> Self {
        Related::One(object)
    }

    pub fn optional<T: Resource>(object: Option<Arc<T>>) -> Self {
        match object {
            Some(object) => Related::One(object),
            None => Related::None,
        }
    }

    pub fn many<T: Resource>(objects: impl IntoIterator<Item = Arc<T>>) -> Self {
        Related::Many(
            objects
                .into_iter()
                .map(|object| object as ResourceRef)
                .collect(),
        )
    }

    /// Flattens into an ordered list; `None` becomes empty.
    pub fn into_vec(self) -> Vec<ResourceRef> {
        match self {
            Related::None => Vec::new(),
            Related::One(object) => vec![object],
            Related::Many(objects) => objects,
        }
    }
}

impl From<Option<ResourceRef>> for Related {
    fn from(object: Option<ResourceRef>) -> Self {
        object.map_or(Related::None, Related::One)
    }
}

impl From<Vec<ResourceRef>> for Related {
    fn from(objects: Vec<ResourceRef>) -> Self {
        Related::Many(objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct Widget {
        id: u32,
    }

    impl Resource for Widget {
        fn resource_id(&self) -> String {
            self.id.to_string()
        }

        fn property(&self, name: &str) -> Option<Value> {
            (name == "id").then(|| json!(self.id))
        }
    }

    #[derive(Debug)]
    #[allow(dead_code)]
    struct Wrapper<T>(T);

    #[test]
    fn domain_type_defaults_to_short_name() {
        assert_eq!(Widget { id: 1 }.domain_type(), "Widget");
        assert_eq!(short_type_name::<Wrapper<Widget>>(), "Wrapper");
    }

    #[test]
    fn downcast_through_trait_object() {
        let object: ResourceRef = Arc::new(Widget { id: 3 });
        assert_eq!(object.downcast_ref::<Widget>().map(|w| w.id), Some(3));
        assert_eq!(object.domain_type(), "Widget");
    }

    #[test]
    fn related_flattens_into_list() {
        let one = Related::one(Arc::new(Widget { id: 1 }));
        assert_eq!(one.into_vec().len(), 1);
        assert!(Related::None.into_vec().is_empty());
        let many = Related::many(vec![Arc::new(Widget { id: 1 }), Arc::new(Widget { id: 2 })]);
        let ids: Vec<_> = many.into_vec().iter().map(|r| r.resource_id()).collect();
        assert_eq!(ids, ["1", "2"]);
    }
}
