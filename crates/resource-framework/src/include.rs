//! # Include Graph Resolution
//!
//! Expands the relationships named by dotted include paths
//! (`"author,author.comments"`) into a deduplicated set of related resources.
//!
//! ## Algorithm
//!
//! For each object, for each relationship named at the current level of the
//! [`IncludeTree`] that the object's descriptor declares:
//!
//! 1. Fetch the related objects (normalized to a list).
//! 2. Pick a descriptor for each one: the relationship's declared target
//!    type if it is registered, otherwise the descriptor registered for the
//!    object's own runtime domain type. Objects with neither are skipped.
//! 3. If `(type, id)` has already been seen, stop here. Its nested includes
//!    are **not** walked again, which is what bounds the walk on cyclic
//!    graphs.
//! 4. Otherwise render it, add it to the [`IncludedSet`], and recurse with
//!    the nested part of the tree.
//!
//! Unknown relationship names are ignored here. Callers that want to reject
//! them up front use [`validate`].

use crate::config::SerializerConfig;
use crate::document::{
    Linkage, Relationship, Relationships, ResourceIdentifier, ResourceObject,
};
use crate::error::{IncludeError, SchemaError};
use crate::resource::{Resource, ResourceRef};
use crate::schema::{Cardinality, Registry, RelationshipSpec, ResourceDescriptor};
use crate::value::{Context, ValueMap};
use crate::view::ResourceView;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::trace;

/// Splits dotted paths by their first segment, collecting the remaining
/// nested paths under each first segment in first-seen order.
///
/// `["author", "author.comments", "tags"]` becomes
/// `[("author", ["comments"]), ("tags", [])]`.
pub fn parse_include_paths<S: AsRef<str>>(paths: &[S]) -> Vec<(String, Vec<String>)> {
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for path in paths {
        let path = path.as_ref().trim();
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head.trim(), Some(rest)),
            None => (path, None),
        };
        if head.is_empty() {
            continue;
        }
        let index = match groups.iter().position(|(name, _)| name == head) {
            Some(index) => index,
            None => {
                groups.push((head.to_string(), Vec::new()));
                groups.len() - 1
            }
        };
        if let Some(rest) = rest.filter(|rest| !rest.trim().is_empty()) {
            groups[index].1.push(rest.to_string());
        }
    }
    groups
}

/// Include paths parsed into a tree of relationship names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncludeTree {
    children: Vec<(String, IncludeTree)>,
}

impl IncludeTree {
    pub fn parse<S: AsRef<str>>(paths: &[S]) -> Self {
        let children = parse_include_paths(paths)
            .into_iter()
            .map(|(name, nested)| (name, IncludeTree::parse(&nested)))
            .collect();
        Self { children }
    }

    /// Parses the comma-separated form used in query strings.
    pub fn from_query(text: &str) -> Self {
        let paths: Vec<&str> = text.split(',').collect();
        Self::parse(&paths)
    }

    pub fn get(&self, name: &str) -> Option<&IncludeTree> {
        self.children
            .iter()
            .find(|(child, _)| child == name)
            .map(|(_, tree)| tree)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IncludeTree)> {
        self.children.iter().map(|(name, tree)| (name.as_str(), tree))
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Length of the longest path.
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|(_, tree)| 1 + tree.depth())
            .max()
            .unwrap_or(0)
    }

    /// Every path in the tree, parents before children.
    pub fn paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        for (name, tree) in &self.children {
            out.push(name.clone());
            out.extend(tree.paths().into_iter().map(|p| format!("{name}.{p}")));
        }
        out
    }
}

/// Resources discovered during one serialize call, unique by `(type, id)`,
/// in first-discovered order.
///
/// Keys can be marked as seen without being included; primary data is
/// marked that way so it never reappears in `included`.
#[derive(Debug, Default)]
pub struct IncludedSet {
    seen: HashSet<ResourceIdentifier>,
    objects: Vec<ResourceObject>,
}

impl IncludedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &ResourceIdentifier) -> bool {
        self.seen.contains(key)
    }

    /// Marks a key as seen without including anything.
    pub fn mark_seen(&mut self, key: ResourceIdentifier) -> bool {
        self.seen.insert(key)
    }

    /// Includes `object` unless its key was already seen.
    pub fn insert(&mut self, object: ResourceObject) -> bool {
        if !self.seen.insert(object.identifier()) {
            return false;
        }
        self.objects.push(object);
        true
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn into_objects(self) -> Vec<ResourceObject> {
        self.objects
    }
}

/// Walks relationships for one serialize call.
pub struct IncludeResolver<'a> {
    registry: &'a Registry,
    context: &'a Context,
    config: &'a SerializerConfig,
}

impl<'a> IncludeResolver<'a> {
    pub fn new(registry: &'a Registry, context: &'a Context, config: &'a SerializerConfig) -> Self {
        Self {
            registry,
            context,
            config,
        }
    }

    /// Picks the descriptor that renders `object` when reached through `spec`.
    pub fn resolve_descriptor_for(
        &self,
        object: &dyn Resource,
        spec: &RelationshipSpec,
    ) -> Option<&'a Arc<ResourceDescriptor>> {
        spec.declared_target()
            .and_then(|target| self.registry.get(target))
            .or_else(|| self.registry.for_domain_type(object.domain_type()))
    }

    /// Renders one object. `tree` is the include subtree at this object and
    /// only matters when relationship linkage is enabled.
    pub fn render(
        &self,
        object: &dyn Resource,
        descriptor: &ResourceDescriptor,
        tree: &IncludeTree,
    ) -> Result<ResourceObject, SchemaError> {
        let view = ResourceView::new(object, descriptor, self.context);
        let meta = view.meta_values()?;
        let relationships = self
            .config
            .relationship_linkage
            .then(|| self.linkage(&view, tree))
            .filter(|links| !links.is_empty());
        Ok(ResourceObject {
            id: view.id(),
            type_name: view.type_name().to_string(),
            attributes: self.transform_keys(view.attribute_values()),
            relationships,
            meta: (!meta.is_empty()).then(|| self.transform_keys(meta)),
        })
    }

    fn transform_keys(&self, map: ValueMap) -> ValueMap {
        let transform = self.config.key_transform;
        map.into_iter()
            .map(|(key, value)| (transform.apply(&key), value))
            .collect()
    }

    fn linkage(&self, view: &ResourceView<'_>, tree: &IncludeTree) -> Relationships {
        let mut links = Relationships::new();
        for (name, _) in tree.iter() {
            let Some(spec) = view.descriptor().resolve_relationship(name) else {
                continue;
            };
            let identifiers = view
                .relationship_value(name)
                .into_vec()
                .into_iter()
                .filter_map(|related| {
                    self.resolve_descriptor_for(related.as_ref(), spec)
                        .map(|d| ResourceIdentifier::new(d.type_name(), related.resource_id()))
                });
            let data = match spec.cardinality() {
                Cardinality::One => Linkage::One(identifiers.into_iter().next()),
                Cardinality::Many => Linkage::Many(identifiers.collect()),
            };
            links.insert(self.config.key_transform.apply(name), Relationship { data });
        }
        links
    }

    /// Expands `tree` from `roots` (all rendered by `descriptor`) into `included`.
    pub fn expand(
        &self,
        roots: &[ResourceRef],
        tree: &IncludeTree,
        descriptor: &ResourceDescriptor,
        included: &mut IncludedSet,
    ) -> Result<(), SchemaError> {
        for root in roots {
            let view = ResourceView::new(root.as_ref(), descriptor, self.context);
            for (name, subtree) in tree.iter() {
                let Some(spec) = descriptor.resolve_relationship(name) else {
                    trace!(type_name = descriptor.type_name(), name, "Ignoring unknown include");
                    continue;
                };
                for related in view.relationship_value(name).into_vec() {
                    let related_descriptor =
                        self.resolve_descriptor_for(related.as_ref(), spec);
                    let Some(related_descriptor) = related_descriptor else {
                        trace!(
                            domain_type = related.domain_type(),
                            name,
                            "No descriptor, skipping"
                        );
                        continue;
                    };
                    let key = ResourceIdentifier::new(
                        related_descriptor.type_name(),
                        related.resource_id(),
                    );
                    if included.contains(&key) {
                        trace!(type_name = %key.type_name, id = %key.id, "Already included");
                        continue;
                    }

                    let object = self.render(related.as_ref(), related_descriptor, subtree)?;
                    trace!(type_name = %key.type_name, id = %key.id, via = name, "Included");
                    included.insert(object);

                    if !subtree.is_empty() {
                        self.expand(
                            std::slice::from_ref(&related),
                            subtree,
                            related_descriptor,
                            included,
                        )?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Rejects include trees naming relationships the descriptors do not declare,
/// or nesting deeper than `max_depth`.
///
/// Relationships without a declared target type are polymorphic; paths below
/// them are accepted as-is.
pub fn validate(
    registry: &Registry,
    descriptor: &ResourceDescriptor,
    tree: &IncludeTree,
    max_depth: Option<usize>,
) -> Result<(), IncludeError> {
    if let Some(max) = max_depth {
        if let Some(path) = tree.paths().into_iter().find(|p| p.split('.').count() > max) {
            return Err(IncludeError::TooDeep {
                depth: path.split('.').count(),
                path,
                max,
            });
        }
    }
    validate_level(registry, descriptor, tree, "")
}

fn validate_level(
    registry: &Registry,
    descriptor: &ResourceDescriptor,
    tree: &IncludeTree,
    prefix: &str,
) -> Result<(), IncludeError> {
    for (name, subtree) in tree.iter() {
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };
        let Some(spec) = descriptor.resolve_relationship(name) else {
            return Err(IncludeError::UnknownRelationship {
                type_name: descriptor.type_name().to_string(),
                path,
                segment: name.to_string(),
            });
        };
        if let Some(target) = spec.declared_target().and_then(|t| registry.get(t)) {
            validate_level(registry, target, subtree, &path)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockResource;
    use crate::resource::Related;
    use serde_json::json;

    #[test]
    fn groups_paths_by_first_segment() {
        let groups =
            parse_include_paths(&["author", "author.comments", "tags", "author.posts.tags"]);
        assert_eq!(
            groups,
            vec![
                (
                    "author".to_string(),
                    vec!["comments".to_string(), "posts.tags".to_string()]
                ),
                ("tags".to_string(), vec![]),
            ]
        );
    }

    #[test]
    fn tree_from_query_string() {
        let tree = IncludeTree::from_query("author,author.comments, tags,");
        assert_eq!(tree.paths(), ["author", "author.comments", "tags"]);
        assert_eq!(tree.depth(), 2);
        assert!(tree.get("author").unwrap().get("comments").unwrap().is_empty());
        assert!(IncludeTree::from_query("").is_empty());
    }

    #[test]
    fn included_set_rejects_duplicates_and_seen_keys() {
        let object = |id: &str| ResourceObject {
            id: id.into(),
            type_name: "user".into(),
            attributes: ValueMap::new(),
            relationships: None,
            meta: None,
        };
        let mut set = IncludedSet::new();
        set.mark_seen(ResourceIdentifier::new("user", "root"));
        assert!(set.insert(object("1")));
        assert!(!set.insert(object("1")));
        assert!(!set.insert(object("root")));
        assert_eq!(set.len(), 1);
    }

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry
            .register(
                ResourceDescriptor::new("Post")
                    .type_name_as("post")
                    .attribute("title")
                    .relationship(RelationshipSpec::to_one("author").target("user"))
                    .has_many("taggings"),
            )
            .unwrap();
        registry
            .register(
                ResourceDescriptor::new("User")
                    .type_name_as("user")
                    .attribute("name")
                    .relationship(RelationshipSpec::to_many("comments").target("comment")),
            )
            .unwrap();
        registry
            .register(ResourceDescriptor::new("Comment").type_name_as("comment"))
            .unwrap();
        registry
    }

    #[test]
    fn declared_target_wins_over_runtime_type() {
        let registry = registry();
        let ctx = Context::new();
        let config = SerializerConfig::default();
        let resolver = IncludeResolver::new(&registry, &ctx, &config);
        let post = registry.get("post").unwrap();

        let odd_author = MockResource::new("Comment", "5");
        let spec = post.resolve_relationship("author").unwrap();
        assert_eq!(
            resolver.resolve_descriptor_for(&odd_author, spec).unwrap().type_name(),
            "user"
        );

        let spec = post.resolve_relationship("taggings").unwrap();
        assert_eq!(
            resolver.resolve_descriptor_for(&odd_author, spec).unwrap().type_name(),
            "comment"
        );
        let unknown = MockResource::new("Widget", "1");
        assert!(resolver.resolve_descriptor_for(&unknown, spec).is_none());
    }

    #[test]
    fn expand_skips_unrenderable_objects() {
        let registry = registry();
        let ctx = Context::new();
        let config = SerializerConfig::default();
        let resolver = IncludeResolver::new(&registry, &ctx, &config);

        let widget: ResourceRef = MockResource::new("Widget", "1").shared();
        let comment: ResourceRef = MockResource::new("Comment", "2").shared();
        let post: ResourceRef = MockResource::new("Post", "1")
            .with_related("taggings", Related::Many(vec![widget, comment]))
            .shared();

        let mut included = IncludedSet::new();
        resolver
            .expand(
                &[post],
                &IncludeTree::parse(&["taggings", "nonsense"]),
                registry.get("post").unwrap(),
                &mut included,
            )
            .unwrap();
        let keys: Vec<_> = included.into_objects().iter().map(|o| o.identifier()).collect();
        assert_eq!(keys, [ResourceIdentifier::new("comment", "2")]);
    }

    #[test]
    fn strict_validation_reports_unknown_segments() {
        let registry = registry();
        let post = registry.get("post").unwrap();

        let tree = IncludeTree::from_query("author.comments,taggings.anything");
        validate(&registry, post, &tree, None).unwrap();

        let err =
            validate(&registry, post, &IncludeTree::from_query("author.posts"), None).unwrap_err();
        assert_eq!(
            err,
            IncludeError::UnknownRelationship {
                type_name: "user".into(),
                path: "author.posts".into(),
                segment: "posts".into(),
            }
        );

        let err = validate(&registry, post, &IncludeTree::from_query("author.comments"), Some(1))
            .unwrap_err();
        assert_eq!(
            err,
            IncludeError::TooDeep {
                path: "author.comments".into(),
                depth: 2,
                max: 1
            }
        );
    }

    #[test]
    fn linkage_lists_expanded_relationships() {
        let registry = registry();
        let ctx = Context::new();
        let config = SerializerConfig {
            relationship_linkage: true,
            ..SerializerConfig::default()
        };
        let resolver = IncludeResolver::new(&registry, &ctx, &config);
        let author: ResourceRef = MockResource::new("User", "9").shared();
        let post = MockResource::new("Post", "1")
            .with_property("title", json!("t"))
            .with_related("author", Related::One(author));

        let descriptor = registry.get("post").unwrap();
        let object = resolver
            .render(&post, descriptor, &IncludeTree::from_query("author,taggings"))
            .unwrap();
        assert_eq!(
            serde_json::to_value(object.relationships).unwrap(),
            json!({
                "author": {"data": {"type": "user", "id": "9"}},
                "taggings": {"data": []}
            })
        );

        let object = resolver
            .render(&post, descriptor, &IncludeTree::from_query("taggings,author"))
            .unwrap();
        let relationships = object.relationships.unwrap();
        assert_eq!(relationships.names(), ["taggings", "author"]);
        assert_eq!(
            serde_json::to_string(&relationships).unwrap(),
            r#"{"taggings":{"data":[]},"author":{"data":{"type":"user","id":"9"}}}"#
        );
    }
}
