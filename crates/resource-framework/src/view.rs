//! # Resource Views
//!
//! A [`ResourceView`] binds one domain object to its descriptor and the request
//! context, and computes attribute, meta and relationship values on demand.
//! Views are cheap borrowing wrappers created per object per request.

use crate::error::SchemaError;
use crate::resource::{Related, Resource, ResourceRef};
use crate::schema::{Cardinality, ResourceDescriptor};
use crate::value::{kind_of, Context, ValueMap};
use serde_json::Value;
use tracing::{trace, warn};

/// A relationship value normalized by cardinality.
#[derive(Debug, Clone, Default)]
pub enum RelationshipValue {
    /// A to-one relationship holding nothing.
    #[default]
    None,
    One(ResourceRef),
    /// A to-many relationship; possibly empty.
    Many(Vec<ResourceRef>),
}

impl RelationshipValue {
    pub fn into_vec(self) -> Vec<ResourceRef> {
        match self {
            RelationshipValue::None => Vec::new(),
            RelationshipValue::One(object) => vec![object],
            RelationshipValue::Many(objects) => objects,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RelationshipValue::None => true,
            RelationshipValue::One(_) => false,
            RelationshipValue::Many(objects) => objects.is_empty(),
        }
    }
}

/// One object seen through its descriptor for the duration of a request.
#[derive(Clone, Copy)]
pub struct ResourceView<'a> {
    object: &'a dyn Resource,
    descriptor: &'a ResourceDescriptor,
    context: &'a Context,
}

impl<'a> ResourceView<'a> {
    pub fn new(
        object: &'a dyn Resource,
        descriptor: &'a ResourceDescriptor,
        context: &'a Context,
    ) -> Self {
        Self {
            object,
            descriptor,
            context,
        }
    }

    pub fn object(&self) -> &'a dyn Resource {
        self.object
    }

    pub fn descriptor(&self) -> &'a ResourceDescriptor {
        self.descriptor
    }

    pub fn context(&self) -> &'a Context {
        self.context
    }

    pub fn id(&self) -> String {
        self.object.resource_id()
    }

    pub fn type_name(&self) -> &'a str {
        self.descriptor.type_name()
    }

    /// Every declared attribute, in declaration order.
    pub fn attribute_values(&self) -> ValueMap {
        self.descriptor
            .attributes_table()
            .iter()
            .map(|field| {
                (
                    field.name().to_string(),
                    field.resolve(self.object, self.context),
                )
            })
            .collect()
    }

    /// Declared meta attributes, with the custom meta computation (if any)
    /// merged over them. Fails as a whole if the custom computation does not
    /// return a map.
    pub fn meta_values(&self) -> Result<ValueMap, SchemaError> {
        let mut meta: ValueMap = self
            .descriptor
            .meta_table()
            .iter()
            .map(|field| {
                (
                    field.name().to_string(),
                    field.resolve(self.object, self.context),
                )
            })
            .collect();

        if let Some(custom) = self.descriptor.custom_meta_fn() {
            match custom(self) {
                Value::Object(extra) => meta.extend(extra),
                other => {
                    let found = kind_of(&other);
                    warn!(
                        type_name = self.type_name(),
                        id = %self.id(),
                        found,
                        "Custom meta is not a map"
                    );
                    return Err(SchemaError::MetaNotAMap {
                        type_name: self.type_name().to_string(),
                        found,
                    });
                }
            }
        }
        Ok(meta)
    }

    /// The named relationship, normalized: a to-one relationship yields
    /// `None` or `One`, a to-many relationship always yields `Many`. Unknown
    /// names yield `None`.
    pub fn relationship_value(&self, name: &str) -> RelationshipValue {
        let Some(spec) = self.descriptor.resolve_relationship(name) else {
            return RelationshipValue::None;
        };
        let related = spec.fetch(self.object, self.context);
        match spec.cardinality() {
            Cardinality::One => match related {
                Related::None => RelationshipValue::None,
                Related::One(object) => RelationshipValue::One(object),
                Related::Many(objects) => {
                    trace!(name, count = objects.len(), "To-one accessor returned a list");
                    objects
                        .into_iter()
                        .next()
                        .map_or(RelationshipValue::None, RelationshipValue::One)
                }
            },
            Cardinality::Many => RelationshipValue::Many(related.into_vec()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockResource;
    use crate::schema::{FieldSpec, RelationshipSpec};
    use serde_json::json;
    use std::sync::Arc;

    fn post() -> MockResource {
        MockResource::new("Post", "1")
            .with_property("title", json!("Hello"))
            .with_property("content", json!("World"))
            .with_property("views", json!(3))
    }

    #[test]
    fn identity_delegates_to_object_and_descriptor() {
        let descriptor = ResourceDescriptor::new("Post").type_name_as("post");
        let object = post();
        let ctx = Context::new();
        let view = ResourceView::new(&object, &descriptor, &ctx);
        assert_eq!(view.id(), "1");
        assert_eq!(view.type_name(), "post");
    }

    #[test]
    fn attributes_follow_declaration_order() {
        let descriptor = ResourceDescriptor::new("Post")
            .attributes(["title", "content", "missing"])
            .attribute_with(
                "shout",
                FieldSpec::transform(|object, ctx| {
                    let suffix = ctx.get("suffix").and_then(Value::as_str).unwrap_or("");
                    let title = object.property("title").unwrap_or_default();
                    json!(format!("{}{}", title.as_str().unwrap_or(""), suffix))
                }),
            );
        let object = post();
        let ctx = Context::new().with("suffix", "!");
        let attributes = ResourceView::new(&object, &descriptor, &ctx).attribute_values();
        let keys: Vec<_> = attributes.keys().cloned().collect();
        assert_eq!(keys, ["title", "content", "missing", "shout"]);
        assert_eq!(attributes["missing"], Value::Null);
        assert_eq!(attributes["shout"], json!("Hello!"));
    }

    #[test]
    fn custom_meta_merges_over_declared_meta() {
        let descriptor = ResourceDescriptor::new("Post")
            .meta("views")
            .custom_meta(|view| json!({"views": 10, "type": view.type_name()}));
        let object = post();
        let ctx = Context::new();
        let meta = ResourceView::new(&object, &descriptor, &ctx).meta_values().unwrap();
        assert_eq!(json!(meta), json!({"views": 10, "type": "posts"}));
    }

    #[test]
    fn custom_meta_must_return_a_map() {
        let descriptor = ResourceDescriptor::new("Post")
            .meta("views")
            .custom_meta(|_| json!("oops"));
        let object = post();
        let ctx = Context::new();
        let err = ResourceView::new(&object, &descriptor, &ctx)
            .meta_values()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::MetaNotAMap {
                type_name: "posts".into(),
                found: "string"
            }
        );
    }

    #[test]
    fn relationships_normalize_by_cardinality() {
        let author = MockResource::new("User", "9").shared();
        let object = post()
            .with_related("author", Related::One(author))
            .with_related("editors", Related::None);
        let descriptor = ResourceDescriptor::new("Post")
            .has_one("author")
            .has_one("reviewer")
            .has_many("comments")
            .has_many("editors");
        let ctx = Context::new();
        let view = ResourceView::new(&object, &descriptor, &ctx);

        let is_empty_list = |name: &str| {
            matches!(view.relationship_value(name), RelationshipValue::Many(v) if v.is_empty())
        };
        assert!(matches!(
            view.relationship_value("author"),
            RelationshipValue::One(a) if a.resource_id() == "9"
        ));
        assert!(matches!(view.relationship_value("reviewer"), RelationshipValue::None));
        assert!(is_empty_list("comments"));
        assert!(is_empty_list("editors"));
        assert!(matches!(view.relationship_value("unknown"), RelationshipValue::None));
    }

    #[test]
    fn to_one_accessor_returning_list_keeps_first() {
        let first: ResourceRef = MockResource::new("User", "1").shared();
        let second: ResourceRef = MockResource::new("User", "2").shared();
        let descriptor = ResourceDescriptor::new("Post").relationship(
            RelationshipSpec::to_one("author").accessor(FieldSpec::transform(move |_, _| {
                Related::Many(vec![first.clone(), second.clone()])
            })),
        );
        let object = post();
        let ctx = Context::new();
        let value = ResourceView::new(&object, &descriptor, &ctx).relationship_value("author");
        assert_eq!(value.into_vec()[0].resource_id(), "1");
    }

    #[test]
    fn views_are_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ResourceView<'_>>();
        assert_send_sync::<Arc<ResourceDescriptor>>();
    }
}
