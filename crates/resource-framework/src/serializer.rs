//! # Serialization Engine
//!
//! Turns root objects plus include paths into a [`Document`].
//!
//! 1. Each root is rendered under the top descriptor into `data`, in caller
//!    order. Roots are never deduplicated against each other.
//! 2. Root keys are marked as seen, then the include tree is expanded from
//!    the roots (see [`include`](crate::include)).
//! 3. `included` is attached only when the expansion found something.
//!
//! An absent root yields `{"data": null}` with no `included` member.

use crate::config::SerializerConfig;
use crate::document::{Document, PrimaryData, ResourceIdentifier};
use crate::error::SchemaError;
use crate::include::{IncludeResolver, IncludeTree, IncludedSet};
use crate::resource::ResourceRef;
use crate::schema::{Registry, ResourceDescriptor};
use crate::value::Context;
use std::sync::Arc;
use tracing::debug;

/// The primary data handed to [`SerializationEngine::serialize`].
#[derive(Debug, Clone, Default)]
pub enum Primary {
    #[default]
    None,
    One(ResourceRef),
    Many(Vec<ResourceRef>),
}

impl Primary {
    fn roots(&self) -> &[ResourceRef] {
        match self {
            Primary::None => &[],
            Primary::One(object) => std::slice::from_ref(object),
            Primary::Many(objects) => objects,
        }
    }
}

impl From<ResourceRef> for Primary {
    fn from(object: ResourceRef) -> Self {
        Primary::One(object)
    }
}

impl From<Option<ResourceRef>> for Primary {
    fn from(object: Option<ResourceRef>) -> Self {
        object.map_or(Primary::None, Primary::One)
    }
}

impl From<Vec<ResourceRef>> for Primary {
    fn from(objects: Vec<ResourceRef>) -> Self {
        Primary::Many(objects)
    }
}

/// Renders documents against a shared registry.
#[derive(Debug, Clone)]
pub struct SerializationEngine {
    registry: Arc<Registry>,
    config: SerializerConfig,
}

impl SerializationEngine {
    pub fn new(registry: Arc<Registry>, config: SerializerConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    pub fn serialize<S: AsRef<str>>(
        &self,
        descriptor: &ResourceDescriptor,
        primary: impl Into<Primary>,
        context: &Context,
        include_paths: &[S],
    ) -> Result<Document, SchemaError> {
        let primary = primary.into();
        let tree = IncludeTree::parse(include_paths);
        let resolver = IncludeResolver::new(&self.registry, context, &self.config);
        let roots = primary.roots();
        debug!(
            type_name = descriptor.type_name(),
            roots = roots.len(),
            includes = ?tree.paths(),
            "Serializing"
        );

        let mut rendered = Vec::with_capacity(roots.len());
        for root in roots {
            rendered.push(resolver.render(root.as_ref(), descriptor, &tree)?);
        }

        let mut included = IncludedSet::new();
        if !tree.is_empty() && !roots.is_empty() {
            for object in &rendered {
                included.mark_seen(ResourceIdentifier::new(&object.type_name, &object.id));
            }
            resolver.expand(roots, &tree, descriptor, &mut included)?;
        }
        debug!(
            type_name = descriptor.type_name(),
            included = included.len(),
            "Serialized"
        );

        let data = match primary {
            Primary::None => PrimaryData::Null,
            Primary::One(_) => rendered
                .pop()
                .map_or(PrimaryData::Null, |object| PrimaryData::One(Box::new(object))),
            Primary::Many(_) => PrimaryData::Many(rendered),
        };
        let included = (!included.is_empty()).then(|| included.into_objects());
        Ok(Document { data, included })
    }

    /// Like [`serialize`](Self::serialize), looking the top descriptor up by
    /// wire type name.
    pub fn serialize_type<S: AsRef<str>>(
        &self,
        type_name: &str,
        primary: impl Into<Primary>,
        context: &Context,
        include_paths: &[S],
    ) -> Result<Document, SchemaError> {
        let descriptor = Arc::clone(self.registry.require(type_name)?);
        self.serialize(&descriptor, primary, context, include_paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockResource;
    use crate::resource::Related;
    use crate::schema::RelationshipSpec;
    use crate::value::KeyTransform;
    use serde_json::json;

    fn engine(config: SerializerConfig) -> SerializationEngine {
        let mut registry = Registry::new();
        registry
            .register(
                ResourceDescriptor::new("Person")
                    .attributes(["first_name"])
                    .meta("rank")
                    .has_one("friend"),
            )
            .unwrap();
        SerializationEngine::new(Arc::new(registry), config)
    }

    fn person(id: &str) -> Arc<MockResource> {
        MockResource::new("Person", id)
            .with_property("first_name", json!(format!("p{id}")))
            .shared()
    }

    #[test]
    fn absent_root_is_null_data() {
        let engine = engine(SerializerConfig::default());
        let doc = engine
            .serialize_type("people", Primary::None, &Context::new(), &["friend"])
            .unwrap();
        assert_eq!(doc.to_json().unwrap(), r#"{"data":null}"#);
    }

    #[test]
    fn empty_list_is_empty_array() {
        let engine = engine(SerializerConfig::default());
        let doc = engine
            .serialize_type("people", Vec::<ResourceRef>::new(), &Context::new(), &["friend"])
            .unwrap();
        assert_eq!(serde_json::to_value(&doc).unwrap(), json!({"data": []}));
    }

    #[test]
    fn roots_keep_order_and_multiplicity() {
        let engine = engine(SerializerConfig::default());
        let a = person("a");
        let b = person("b");
        let roots: Vec<ResourceRef> = vec![a.clone(), b, a];
        let doc = engine
            .serialize_type("people", roots, &Context::new(), &[] as &[&str])
            .unwrap();
        let ids: Vec<_> = doc.data.objects().iter().map(|o| o.id.clone()).collect();
        assert_eq!(ids, ["a", "b", "a"]);
        assert!(doc.included.is_none());
    }

    #[test]
    fn meta_is_omitted_when_empty() {
        let engine = engine(SerializerConfig::default());
        let ranked: ResourceRef = MockResource::new("Person", "r")
            .with_property("rank", json!(1))
            .shared();
        let plain: ResourceRef = person("p");

        let doc = engine
            .serialize_type("people", vec![ranked, plain], &Context::new(), &[] as &[&str])
            .unwrap();
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["data"][0]["meta"], json!({"rank": 1}));
        assert_eq!(value["data"][1]["meta"], json!({"rank": null}));

        let bare = SerializationEngine::new(
            Arc::new({
                let mut registry = Registry::new();
                registry.register(ResourceDescriptor::new("Person")).unwrap();
                registry
            }),
            SerializerConfig::default(),
        );
        let doc = bare
            .serialize_type("people", person("p") as ResourceRef, &Context::new(), &[] as &[&str])
            .unwrap();
        assert!(serde_json::to_value(&doc).unwrap()["data"].get("meta").is_none());
    }

    #[test]
    fn root_reached_again_is_not_included() {
        let engine = engine(SerializerConfig::default());
        let a = person("a");
        let b = person("b");
        a.relate("friend", Related::One(b.clone()));
        b.relate("friend", Related::One(a.clone()));

        let doc = engine
            .serialize_type(
                "people",
                a as ResourceRef,
                &Context::new(),
                &["friend", "friend.friend"],
            )
            .unwrap();
        assert_eq!(
            doc.included_identifiers(),
            [ResourceIdentifier::new("people", "b")]
        );
    }

    #[test]
    fn key_transform_and_linkage() {
        let engine = engine(SerializerConfig {
            key_transform: KeyTransform::Camel,
            relationship_linkage: true,
        });
        let a = person("a");
        a.relate("friend", Related::One(person("b")));
        let doc = engine
            .serialize_type("people", a as ResourceRef, &Context::new(), &["friend"])
            .unwrap();
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["data"]["attributes"], json!({"firstName": "pa"}));
        assert_eq!(
            value["data"]["relationships"],
            json!({"friend": {"data": {"type": "people", "id": "b"}}})
        );
        assert!(value["included"][0].get("relationships").is_none());
    }

    #[test]
    fn unknown_type_is_an_error() {
        let engine = engine(SerializerConfig::default());
        let err = engine
            .serialize_type("ghosts", Primary::None, &Context::new(), &[] as &[&str])
            .unwrap_err();
        assert_eq!(err, SchemaError::UnknownType("ghosts".into()));
    }

    #[test]
    fn explicit_relationship_target() {
        let mut registry = Registry::new();
        registry
            .register(ResourceDescriptor::new("User").type_name_as("user"))
            .unwrap();
        let post = registry
            .register(
                ResourceDescriptor::new("Post")
                    .type_name_as("post")
                    .relationship(RelationshipSpec::to_one("author").target("user")),
            )
            .unwrap();
        let engine = SerializationEngine::new(Arc::new(registry), SerializerConfig::default());
        let object: ResourceRef = MockResource::new("Post", "1")
            .with_related("author", Related::One(MockResource::new("Anything", "7").shared()))
            .shared();
        let doc = engine
            .serialize(&post, object, &Context::new(), &["author"])
            .unwrap();
        assert_eq!(doc.included_identifiers(), [ResourceIdentifier::new("user", "7")]);
    }
}
