//! # Resource Schema
//!
//! A [`ResourceDescriptor`] is the static, per-domain-type schema that tells the
//! framework how to render instances: which attributes and meta attributes to
//! emit, which relationships can be expanded, and which fields can be sorted.
//!
//! Descriptors are built once at startup, registered in a [`Registry`], and
//! only read afterwards.
//!
//! ## Field resolution
//!
//! Every named field (attribute, meta attribute or relationship accessor) is a
//! slot that may carry up to three [`FieldSpec`] variants. Lookup picks the
//! first one present in the order **Override > Transform > Direct**, where
//! `Direct` reads the source property of the same name unless told otherwise.
//! Overrides can therefore shadow any declared field after the fact without
//! touching the declaration itself.
//!
//! ## Inheritance
//!
//! [`ResourceDescriptor::inherit`] copies the parent's tables into a new value.
//! The child and the parent never share state afterwards.
//!
//! ```rust
//! use resource_framework::ResourceDescriptor;
//!
//! let mut user = ResourceDescriptor::new("User").attribute("name");
//! let admin = ResourceDescriptor::inherit(&user, "Admin").attribute("permissions");
//! user.add_attribute("email");
//!
//! assert_eq!(admin.type_name(), "admins");
//! assert_eq!(admin.attribute_names(), ["name", "permissions"]);
//! assert_eq!(user.attribute_names(), ["name", "email"]);
//! ```

use crate::error::SchemaError;
use crate::resource::{short_type_name, Related, Resource};
use crate::sort::{SortStrategy, StrategyShape};
use crate::value::{Context, ValueMap};
use crate::view::ResourceView;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// A pure function computing a field from an object and the request context.
pub type Accessor<T> = Arc<dyn Fn(&dyn Resource, &Context) -> T + Send + Sync>;

/// A custom meta computation. Must return a JSON object.
pub type MetaFn = Arc<dyn Fn(&ResourceView<'_>) -> Value + Send + Sync>;

/// How one field obtains its value.
#[derive(Clone)]
pub enum FieldSpec<T> {
    /// Read the named source property straight off the object.
    Direct(String),
    /// Compute the value from the object and context.
    Transform(Accessor<T>),
    /// An explicitly supplied function that shadows any other variant.
    Override(Accessor<T>),
}

impl<T: 'static> FieldSpec<T> {
    pub fn direct(property: impl Into<String>) -> Self {
        FieldSpec::Direct(property.into())
    }

    pub fn transform(f: impl Fn(&dyn Resource, &Context) -> T + Send + Sync + 'static) -> Self {
        FieldSpec::Transform(Arc::new(f))
    }

    pub fn overriding(f: impl Fn(&dyn Resource, &Context) -> T + Send + Sync + 'static) -> Self {
        FieldSpec::Override(Arc::new(f))
    }
}

impl<T: Default + 'static> FieldSpec<T> {
    /// A transform over a concrete domain type. Objects of any other type
    /// yield `T::default()`.
    pub fn transform_as<R: Resource>(
        f: impl Fn(&R, &Context) -> T + Send + Sync + 'static,
    ) -> Self {
        FieldSpec::Transform(typed(f))
    }

    /// An override over a concrete domain type.
    pub fn override_as<R: Resource>(
        f: impl Fn(&R, &Context) -> T + Send + Sync + 'static,
    ) -> Self {
        FieldSpec::Override(typed(f))
    }
}

fn typed<R: Resource, T: Default + 'static>(
    f: impl Fn(&R, &Context) -> T + Send + Sync + 'static,
) -> Accessor<T> {
    Arc::new(move |object: &dyn Resource, ctx: &Context| {
        object
            .downcast_ref::<R>()
            .map(|object| f(object, ctx))
            .unwrap_or_default()
    })
}

/// Output types that can be read directly off an object.
pub trait DirectSource: Default {
    fn read(object: &dyn Resource, property: &str) -> Self;
}

impl DirectSource for Value {
    fn read(object: &dyn Resource, property: &str) -> Self {
        object.property(property).unwrap_or(Value::Null)
    }
}

impl DirectSource for Related {
    fn read(object: &dyn Resource, property: &str) -> Self {
        object.related(property)
    }
}

/// Which variant a field currently resolves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource<'a> {
    Override,
    Transform,
    Direct(&'a str),
}

/// A named field slot holding every variant declared for it.
#[derive(Clone)]
pub struct Field<T> {
    name: String,
    direct: Option<String>,
    transform: Option<Accessor<T>>,
    overridden: Option<Accessor<T>>,
}

impl<T: DirectSource> Field<T> {
    fn new(name: String) -> Self {
        Self {
            name,
            direct: None,
            transform: None,
            overridden: None,
        }
    }

    fn apply(&mut self, spec: FieldSpec<T>) {
        match spec {
            FieldSpec::Direct(property) => self.direct = Some(property),
            FieldSpec::Transform(f) => self.transform = Some(f),
            FieldSpec::Override(f) => self.overridden = Some(f),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> FieldSource<'_> {
        if self.overridden.is_some() {
            FieldSource::Override
        } else if self.transform.is_some() {
            FieldSource::Transform
        } else {
            FieldSource::Direct(self.direct.as_deref().unwrap_or(&self.name))
        }
    }

    /// Computes the field for one object.
    pub fn resolve(&self, object: &dyn Resource, ctx: &Context) -> T {
        if let Some(f) = &self.overridden {
            return f(object, ctx);
        }
        if let Some(f) = &self.transform {
            return f(object, ctx);
        }
        T::read(object, self.direct.as_deref().unwrap_or(&self.name))
    }
}

/// An ordered set of field slots, unique by name.
#[derive(Clone)]
pub struct FieldSet<T> {
    fields: Vec<Field<T>>,
}

impl<T> Default for FieldSet<T> {
    fn default() -> Self {
        Self { fields: Vec::new() }
    }
}

impl<T: DirectSource> FieldSet<T> {
    /// Declares `name`, or merges `spec` into the existing slot.
    fn upsert(&mut self, name: String, spec: Option<FieldSpec<T>>) {
        let index = match self.fields.iter().position(|f| f.name == name) {
            Some(index) => index,
            None => {
                self.fields.push(Field::new(name));
                self.fields.len() - 1
            }
        };
        if let Some(spec) = spec {
            self.fields[index].apply(spec);
        }
    }

    fn override_existing(&mut self, name: &str, f: &Accessor<T>) -> bool {
        match self.fields.iter_mut().find(|field| field.name == name) {
            Some(field) => {
                field.overridden = Some(Arc::clone(f));
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Field<T>> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field<T>> {
        self.fields.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Whether a relationship holds one object or a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

/// One named relationship of a descriptor.
#[derive(Clone)]
pub struct RelationshipSpec {
    cardinality: Cardinality,
    accessor: Field<Related>,
    declared_target: Option<String>,
}

impl RelationshipSpec {
    pub fn to_one(name: impl Into<String>) -> Self {
        Self::new(name.into(), Cardinality::One)
    }

    pub fn to_many(name: impl Into<String>) -> Self {
        Self::new(name.into(), Cardinality::Many)
    }

    fn new(name: String, cardinality: Cardinality) -> Self {
        Self {
            cardinality,
            accessor: Field::new(name),
            declared_target: None,
        }
    }

    /// Declares the wire type every related object has. Leave unset for
    /// polymorphic relationships.
    pub fn target(mut self, type_name: impl Into<String>) -> Self {
        self.declared_target = Some(type_name.into());
        self
    }

    pub fn accessor(mut self, spec: FieldSpec<Related>) -> Self {
        self.accessor.apply(spec);
        self
    }

    pub fn name(&self) -> &str {
        &self.accessor.name
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn declared_target(&self) -> Option<&str> {
        self.declared_target.as_deref()
    }

    pub fn field(&self) -> &Field<Related> {
        &self.accessor
    }

    pub fn fetch(&self, object: &dyn Resource, ctx: &Context) -> Related {
        self.accessor.resolve(object, ctx)
    }
}

/// Structural signature used to tell identical re-registrations from conflicts.
///
/// Fields compare by name and by where their value comes from. Two transforms
/// or two overrides of the same field compare equal: functions have no
/// identity to compare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorShape<'a> {
    pub type_name: &'a str,
    pub domain_type: &'a str,
    pub attributes: Vec<(&'a str, FieldSource<'a>)>,
    pub meta_attributes: Vec<(&'a str, FieldSource<'a>)>,
    pub relationships: Vec<RelationshipShape<'a>>,
    pub sortable_fields: Vec<(&'a str, StrategyShape<'a>)>,
    pub custom_meta: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipShape<'a> {
    pub name: &'a str,
    pub cardinality: Cardinality,
    pub declared_target: Option<&'a str>,
    pub accessor: FieldSource<'a>,
}

/// Static schema describing how one domain type renders as a resource.
#[derive(Clone)]
pub struct ResourceDescriptor {
    type_name: String,
    domain_type: String,
    attributes: FieldSet<Value>,
    meta_attributes: FieldSet<Value>,
    relationships: Vec<RelationshipSpec>,
    sortable_fields: Vec<(String, SortStrategy)>,
    custom_meta: Option<MetaFn>,
}

impl ResourceDescriptor {
    /// Starts a descriptor for the named domain type. The wire type name is
    /// inferred with [`infer_type_name`] until [`ResourceDescriptor::type_name_as`]
    /// sets one explicitly.
    pub fn new(domain_type: impl Into<String>) -> Self {
        let domain_type = domain_type.into();
        Self {
            type_name: infer_type_name(&domain_type),
            domain_type,
            attributes: FieldSet::default(),
            meta_attributes: FieldSet::default(),
            relationships: Vec::new(),
            sortable_fields: Vec::new(),
            custom_meta: None,
        }
    }

    /// Starts a descriptor for a Rust domain type, named after it.
    pub fn for_type<R: Resource>() -> Self {
        Self::new(short_type_name::<R>())
    }

    /// Copies every table of `parent` into a new descriptor for `domain_type`.
    pub fn inherit(parent: &ResourceDescriptor, domain_type: impl Into<String>) -> Self {
        let domain_type = domain_type.into();
        Self {
            type_name: infer_type_name(&domain_type),
            domain_type,
            attributes: parent.attributes.clone(),
            meta_attributes: parent.meta_attributes.clone(),
            relationships: parent.relationships.clone(),
            sortable_fields: parent.sortable_fields.clone(),
            custom_meta: parent.custom_meta.clone(),
        }
    }

    // --- Builder ---

    pub fn type_name_as(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = type_name.into();
        self
    }

    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.add_attribute(name);
        self
    }

    pub fn attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.add_attribute(name);
        }
        self
    }

    pub fn attribute_with(mut self, name: impl Into<String>, spec: FieldSpec<Value>) -> Self {
        self.attributes.upsert(name.into(), Some(spec));
        self
    }

    pub fn meta(mut self, name: impl Into<String>) -> Self {
        self.add_meta(name);
        self
    }

    pub fn meta_with(mut self, name: impl Into<String>, spec: FieldSpec<Value>) -> Self {
        self.meta_attributes.upsert(name.into(), Some(spec));
        self
    }

    /// Registers a custom meta computation merged over the declared meta.
    pub fn custom_meta(
        mut self,
        f: impl Fn(&ResourceView<'_>) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.custom_meta = Some(Arc::new(f));
        self
    }

    pub fn relationship(mut self, spec: RelationshipSpec) -> Self {
        self.add_relationship(spec);
        self
    }

    pub fn has_one(self, name: impl Into<String>) -> Self {
        self.relationship(RelationshipSpec::to_one(name))
    }

    pub fn has_many(self, name: impl Into<String>) -> Self {
        self.relationship(RelationshipSpec::to_many(name))
    }

    pub fn sortable(self, name: impl Into<String>) -> Self {
        self.sortable_by(name, SortStrategy::ByDeclaredField)
    }

    pub fn sortable_by(mut self, name: impl Into<String>, strategy: SortStrategy) -> Self {
        self.add_sortable(name, strategy);
        self
    }

    /// Shadows the attribute and meta attribute named `name` with a function
    /// over a concrete domain type.
    pub fn override_as<R: Resource>(
        mut self,
        name: &str,
        f: impl Fn(&R, &Context) -> Value + Send + Sync + 'static,
    ) -> Self {
        let f = typed(f);
        let hit = self.attributes.override_existing(name, &f)
            | self.meta_attributes.override_existing(name, &f);
        if !hit {
            trace!(type_name = %self.type_name, name, "Override has no declared field");
        }
        self
    }

    /// Shadows the accessor of the relationship named `name`.
    pub fn override_relationship_as<R: Resource>(
        mut self,
        name: &str,
        f: impl Fn(&R, &Context) -> Related + Send + Sync + 'static,
    ) -> Self {
        if let Some(rel) = self.relationships.iter_mut().find(|r| r.name() == name) {
            rel.accessor.overridden = Some(typed(f));
        }
        self
    }

    // --- In-place additions ---

    pub fn add_attribute(&mut self, name: impl Into<String>) {
        self.attributes.upsert(name.into(), None);
    }

    pub fn add_meta(&mut self, name: impl Into<String>) {
        self.meta_attributes.upsert(name.into(), None);
    }

    /// Adds a relationship, replacing one of the same name.
    pub fn add_relationship(&mut self, spec: RelationshipSpec) {
        match self.relationships.iter_mut().find(|r| r.name() == spec.name()) {
            Some(existing) => *existing = spec,
            None => self.relationships.push(spec),
        }
    }

    pub fn add_sortable(&mut self, name: impl Into<String>, strategy: SortStrategy) {
        let name = name.into();
        match self.sortable_fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = strategy,
            None => self.sortable_fields.push((name, strategy)),
        }
    }

    // --- Queries ---

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn domain_type(&self) -> &str {
        &self.domain_type
    }

    pub fn attributes_table(&self) -> &FieldSet<Value> {
        &self.attributes
    }

    pub fn meta_table(&self) -> &FieldSet<Value> {
        &self.meta_attributes
    }

    pub fn custom_meta_fn(&self) -> Option<&MetaFn> {
        self.custom_meta.as_ref()
    }

    /// Declared attribute names; the contract surface for inbound validation.
    pub fn attribute_names(&self) -> Vec<&str> {
        self.attributes.names()
    }

    pub fn meta_names(&self) -> Vec<&str> {
        self.meta_attributes.names()
    }

    /// Drops every entry of an inbound attribute map that is not a declared attribute.
    pub fn permitted_attributes(&self, input: &ValueMap) -> ValueMap {
        input
            .iter()
            .filter(|(key, _)| self.attributes.get(key).is_some())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    pub fn relationships(&self) -> &[RelationshipSpec] {
        &self.relationships
    }

    pub fn resolve_relationship(&self, name: &str) -> Option<&RelationshipSpec> {
        self.relationships.iter().find(|r| r.name() == name)
    }

    pub fn is_sortable(&self, name: &str) -> bool {
        self.sort_strategy(name).is_some()
    }

    pub fn sort_strategy(&self, name: &str) -> Option<&SortStrategy> {
        self.sortable_fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, strategy)| strategy)
    }

    pub fn sortable_field_names(&self) -> Vec<String> {
        self.sortable_fields.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn shape(&self) -> DescriptorShape<'_> {
        fn fields(set: &FieldSet<Value>) -> Vec<(&str, FieldSource<'_>)> {
            set.iter().map(|field| (field.name(), field.source())).collect()
        }

        DescriptorShape {
            type_name: &self.type_name,
            domain_type: &self.domain_type,
            attributes: fields(&self.attributes),
            meta_attributes: fields(&self.meta_attributes),
            relationships: self
                .relationships
                .iter()
                .map(|r| RelationshipShape {
                    name: r.name(),
                    cardinality: r.cardinality,
                    declared_target: r.declared_target(),
                    accessor: r.accessor.source(),
                })
                .collect(),
            sortable_fields: self
                .sortable_fields
                .iter()
                .map(|(name, strategy)| (name.as_str(), strategy.shape()))
                .collect(),
            custom_meta: self.custom_meta.is_some(),
        }
    }
}

impl fmt::Debug for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDescriptor")
            .field("type_name", &self.type_name)
            .field("domain_type", &self.domain_type)
            .field("attributes", &self.attributes.names())
            .field("meta_attributes", &self.meta_attributes.names())
            .field(
                "relationships",
                &self.relationships.iter().map(|r| r.name()).collect::<Vec<_>>(),
            )
            .field("sortable_fields", &self.sortable_field_names())
            .finish()
    }
}

const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("mouse", "mice"),
];

const UNCOUNTABLE: &[&str] = &["equipment", "information", "metadata", "news", "series", "species"];

/// Derives a wire type name from a domain type name: snake_case, with the
/// last word pluralized (`BlogPost` -> `blog_posts`, `Category` -> `categories`).
pub fn infer_type_name(domain_type: &str) -> String {
    let snake = crate::value::KeyTransform::Underscore.apply(domain_type);
    let (head, last) = match snake.rfind('_') {
        Some(i) => snake.split_at(i + 1),
        None => ("", snake.as_str()),
    };
    format!("{head}{}", pluralize(last))
}

fn pluralize(word: &str) -> String {
    if word.is_empty() || UNCOUNTABLE.contains(&word) {
        return word.to_string();
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == word) {
        return (*plural).to_string();
    }
    let consonant_y = word.ends_with('y')
        && !matches!(
            word.chars().rev().nth(1),
            Some('a' | 'e' | 'i' | 'o' | 'u')
        );
    if consonant_y {
        format!("{}ies", &word[..word.len() - 1])
    } else if ["s", "x", "z", "ch", "sh"].iter().any(|end| word.ends_with(end)) {
        format!("{word}es")
    } else {
        format!("{word}s")
    }
}

/// Process-wide table of descriptors, keyed by wire type name and by domain
/// type name.
///
/// Built once at startup through `&mut` registration, then shared read-only
/// (typically as `Arc<Registry>`).
#[derive(Clone, Default)]
pub struct Registry {
    by_type: BTreeMap<String, Arc<ResourceDescriptor>>,
    by_domain: BTreeMap<String, String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor. Registering an identically shaped descriptor
    /// again returns the existing one.
    pub fn register(
        &mut self,
        descriptor: ResourceDescriptor,
    ) -> Result<Arc<ResourceDescriptor>, SchemaError> {
        let type_name = descriptor.type_name().to_string();
        if let Some(existing) = self.by_type.get(&type_name) {
            if existing.shape() == descriptor.shape() {
                debug!(%type_name, "Descriptor already registered");
                return Ok(Arc::clone(existing));
            }
            return Err(SchemaError::ConflictingDescriptor { type_name });
        }
        if let Some(existing) = self.by_domain.get(descriptor.domain_type()) {
            return Err(SchemaError::ConflictingDomainType {
                domain_type: descriptor.domain_type().to_string(),
                existing: existing.clone(),
                attempted: type_name,
            });
        }

        let descriptor = Arc::new(descriptor);
        self.by_domain
            .insert(descriptor.domain_type().to_string(), type_name.clone());
        self.by_type.insert(type_name.clone(), Arc::clone(&descriptor));
        debug!(
            %type_name,
            domain_type = descriptor.domain_type(),
            size = self.by_type.len(),
            "Registered"
        );
        Ok(descriptor)
    }

    pub fn get(&self, type_name: &str) -> Option<&Arc<ResourceDescriptor>> {
        self.by_type.get(type_name)
    }

    pub fn require(&self, type_name: &str) -> Result<&Arc<ResourceDescriptor>, SchemaError> {
        self.get(type_name)
            .ok_or_else(|| SchemaError::UnknownType(type_name.to_string()))
    }

    /// The descriptor rendering objects whose runtime type is exactly `domain_type`.
    pub fn for_domain_type(&self, domain_type: &str) -> Option<&Arc<ResourceDescriptor>> {
        self.by_domain
            .get(domain_type)
            .and_then(|type_name| self.by_type.get(type_name))
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.by_type.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("types", &self.by_type.keys().collect::<Vec<_>>())
            .finish()
    }
}
