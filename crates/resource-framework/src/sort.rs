//! # Sorting
//!
//! The [`SortEngine`] turns textual sort directives (`"-created_at,name"`)
//! into orderings applied to a collection, using the per-field strategies a
//! descriptor declares.
//!
//! The engine never looks inside the collection. Anything implementing
//! [`Orderable`] works: the in-memory [`ResourceList`], a query builder that
//! appends `ORDER BY` clauses, and so on. Terms are applied in directive
//! order and each one only breaks ties left by the previous ones, the same
//! way chained `order_by` calls on a query behave.
//!
//! Validation happens before any ordering: if one field is not sortable the
//! call fails and the collection is left untouched.

use crate::config::SortConfig;
use crate::error::SortError;
use crate::resource::{Resource, ResourceRef};
use crate::schema::ResourceDescriptor;
use crate::value::{compare_values, Context};
use serde_json::Value;
use std::any::{type_name, Any, TypeId};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// Orients an ascending comparison.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortTerm {
    pub field: String,
    pub direction: SortDirection,
}

/// An ordered list of sort terms; the first is the primary key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortDirective {
    terms: Vec<SortTerm>,
}

impl SortDirective {
    pub fn new(terms: Vec<SortTerm>) -> Self {
        Self { terms }
    }

    pub fn terms(&self) -> &[SortTerm] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }
}

/// Renders with the default syntax (`-` marks descending, `,` separates
/// terms). Use [`SortEngine::format`] for configured markers.
impl fmt::Display for SortDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            if term.direction == SortDirection::Descending {
                f.write_str("-")?;
            }
            f.write_str(&term.field)?;
        }
        Ok(())
    }
}

/// A collection or query that can be ordered by a named column.
///
/// Each call adds a key below the keys already applied.
pub trait Orderable: Any + Send {
    fn order_by(&mut self, column: &str, direction: SortDirection);
}

type TransformFn = Arc<dyn Fn(&mut dyn Any, SortDirection) + Send + Sync>;

#[derive(Clone)]
struct CollectionTransform {
    collection: &'static str,
    collection_id: TypeId,
    transform: TransformFn,
}

/// Type-erased custom orderings for one sortable field, one per collection
/// type. A field sorted both in memory and by a query builder carries one of
/// each.
#[derive(Clone)]
pub struct CustomSort {
    transforms: Vec<CollectionTransform>,
}

impl CustomSort {
    fn with<C: Orderable>(
        mut self,
        f: impl Fn(&mut C, SortDirection) + Send + Sync + 'static,
    ) -> Self {
        let transform: TransformFn = Arc::new(move |collection: &mut dyn Any, direction| {
            if let Some(collection) = collection.downcast_mut::<C>() {
                f(collection, direction);
            }
        });
        let entry = CollectionTransform {
            collection: type_name::<C>(),
            collection_id: TypeId::of::<C>(),
            transform,
        };
        match self
            .transforms
            .iter_mut()
            .find(|t| t.collection_id == entry.collection_id)
        {
            Some(existing) => *existing = entry,
            None => self.transforms.push(entry),
        }
        self
    }

    /// Names of the collection types this sort accepts, in registration order.
    pub fn collections(&self) -> Vec<&'static str> {
        self.transforms.iter().map(|t| t.collection).collect()
    }

    fn accepts<C: Any>(&self) -> bool {
        self.transform_for(TypeId::of::<C>()).is_some()
    }

    fn transform_for(&self, id: TypeId) -> Option<&TransformFn> {
        self.transforms
            .iter()
            .find(|t| t.collection_id == id)
            .map(|t| &t.transform)
    }

    fn run<C: Orderable>(&self, collection: &mut C, direction: SortDirection) {
        if let Some(transform) = self.transform_for(TypeId::of::<C>()) {
            transform(collection, direction);
        }
    }
}

/// How a sortable field orders a collection.
#[derive(Clone)]
pub enum SortStrategy {
    /// Order by the field's own name.
    ByDeclaredField,
    /// Order by another column name.
    ByAliasedColumn(String),
    /// Hand the collection to a function that reorders it arbitrarily.
    ByCustomTransform(CustomSort),
}

/// Comparable summary of a [`SortStrategy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyShape<'a> {
    Declared,
    Aliased(&'a str),
    Custom(Vec<&'static str>),
}

impl SortStrategy {
    pub fn aliased(column: impl Into<String>) -> Self {
        SortStrategy::ByAliasedColumn(column.into())
    }

    /// A custom ordering over collections of type `C`. The function may
    /// reorder in place or replace the collection wholesale.
    pub fn custom<C: Orderable>(
        f: impl Fn(&mut C, SortDirection) + Send + Sync + 'static,
    ) -> Self {
        SortStrategy::ByCustomTransform(CustomSort { transforms: Vec::new() }.with(f))
    }

    /// Adds (or replaces) the custom ordering used for collections of type `C`.
    ///
    /// Declared and aliased strategies already work on every collection and
    /// are returned unchanged.
    pub fn or_custom<C: Orderable>(
        self,
        f: impl Fn(&mut C, SortDirection) + Send + Sync + 'static,
    ) -> Self {
        match self {
            SortStrategy::ByCustomTransform(custom) => {
                SortStrategy::ByCustomTransform(custom.with(f))
            }
            other => other,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SortStrategy::ByDeclaredField => "declared",
            SortStrategy::ByAliasedColumn(_) => "aliased",
            SortStrategy::ByCustomTransform(_) => "custom",
        }
    }

    pub fn shape(&self) -> StrategyShape<'_> {
        match self {
            SortStrategy::ByDeclaredField => StrategyShape::Declared,
            SortStrategy::ByAliasedColumn(column) => StrategyShape::Aliased(column),
            SortStrategy::ByCustomTransform(custom) => {
                StrategyShape::Custom(custom.collections())
            }
        }
    }
}

impl fmt::Debug for SortStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortStrategy::ByDeclaredField => f.write_str("ByDeclaredField"),
            SortStrategy::ByAliasedColumn(column) => {
                f.debug_tuple("ByAliasedColumn").field(column).finish()
            }
            SortStrategy::ByCustomTransform(custom) => f
                .debug_tuple("ByCustomTransform")
                .field(&custom.collections())
                .finish(),
        }
    }
}

/// Parses sort text and applies directives to collections.
#[derive(Debug, Clone, Default)]
pub struct SortEngine {
    config: SortConfig,
}

impl SortEngine {
    pub fn new(config: SortConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SortConfig {
        &self.config
    }

    /// Splits `text` into terms. A leading descending marker flips a term's
    /// direction; blank tokens are skipped.
    pub fn parse(&self, text: &str) -> SortDirective {
        let terms = text
            .split(self.config.separator)
            .map(str::trim)
            .filter_map(|token| {
                let (field, direction) = match token.strip_prefix(self.config.descending_marker) {
                    Some(rest) => (rest.trim(), SortDirection::Descending),
                    None => (token, SortDirection::Ascending),
                };
                (!field.is_empty()).then(|| SortTerm {
                    field: field.to_string(),
                    direction,
                })
            })
            .collect();
        SortDirective { terms }
    }

    /// Renders `directive` back to text using the configured markers, so that
    /// `parse(&format(d)) == d`.
    pub fn format(&self, directive: &SortDirective) -> String {
        let mut out = String::new();
        for (i, term) in directive.terms.iter().enumerate() {
            if i > 0 {
                out.push(self.config.separator);
            }
            if term.direction == SortDirection::Descending {
                out.push(self.config.descending_marker);
            }
            out.push_str(&term.field);
        }
        out
    }

    /// Checks every term against the descriptor's sortable fields.
    pub fn validate(
        &self,
        directive: &SortDirective,
        descriptor: &ResourceDescriptor,
    ) -> Result<(), SortError> {
        match directive
            .terms
            .iter()
            .find(|term| !descriptor.is_sortable(&term.field))
        {
            Some(term) => {
                let legal = descriptor.sortable_field_names();
                warn!(
                    type_name = descriptor.type_name(),
                    field = %term.field,
                    ?legal,
                    "Unsupported sort field"
                );
                Err(SortError::UnsupportedField {
                    field: term.field.clone(),
                    legal,
                })
            }
            None => Ok(()),
        }
    }

    /// Orders `collection` by `directive`. All fields are validated before
    /// the first term is applied.
    pub fn apply<C: Orderable>(
        &self,
        collection: &mut C,
        directive: &SortDirective,
        descriptor: &ResourceDescriptor,
    ) -> Result<(), SortError> {
        self.validate(directive, descriptor)?;

        let mut plan = Vec::with_capacity(directive.len());
        for term in &directive.terms {
            let Some(strategy) = descriptor.sort_strategy(&term.field) else {
                continue;
            };
            if let SortStrategy::ByCustomTransform(custom) = strategy {
                if !custom.accepts::<C>() {
                    return Err(SortError::CollectionMismatch {
                        field: term.field.clone(),
                        expected: custom.collections(),
                        found: type_name::<C>(),
                    });
                }
            }
            plan.push((term, strategy));
        }

        for (term, strategy) in plan {
            debug!(
                type_name = descriptor.type_name(),
                field = %term.field,
                direction = ?term.direction,
                strategy = strategy.kind(),
                "Sort term"
            );
            match strategy {
                SortStrategy::ByDeclaredField => collection.order_by(&term.field, term.direction),
                SortStrategy::ByAliasedColumn(column) => {
                    collection.order_by(column, term.direction)
                }
                SortStrategy::ByCustomTransform(custom) => custom.run(collection, term.direction),
            }
        }
        Ok(())
    }
}

/// Computes a sort key from a resource and the list's request context.
pub type KeyFn = Arc<dyn Fn(&dyn Resource, &Context) -> Value + Send + Sync>;

#[derive(Clone)]
enum SortKey {
    Property(String),
    Computed(KeyFn),
}

impl SortKey {
    fn extract(&self, object: &dyn Resource, context: &Context) -> Value {
        match self {
            SortKey::Property(name) => object.property(name).unwrap_or(Value::Null),
            SortKey::Computed(f) => f(object, context),
        }
    }
}

/// An in-memory, orderable list of resources.
///
/// Ordering keys accumulate: every `order_by` re-sorts by all keys applied so
/// far, so later keys only break ties. The sort is stable.
#[derive(Clone, Default)]
pub struct ResourceList {
    items: Vec<ResourceRef>,
    keys: Vec<(SortKey, SortDirection)>,
    context: Context,
}

impl ResourceList {
    pub fn new(items: Vec<ResourceRef>) -> Self {
        Self {
            items,
            keys: Vec::new(),
            context: Context::default(),
        }
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn items(&self) -> &[ResourceRef] {
        &self.items
    }

    pub fn into_items(self) -> Vec<ResourceRef> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.items.iter().map(|item| item.resource_id()).collect()
    }

    /// Adds a computed key below the keys already applied.
    pub fn order_by_key(
        &mut self,
        key: impl Fn(&dyn Resource, &Context) -> Value + Send + Sync + 'static,
        direction: SortDirection,
    ) {
        self.keys.push((SortKey::Computed(Arc::new(key)), direction));
        self.resort();
    }

    fn resort(&mut self) {
        let items = std::mem::take(&mut self.items);
        let mut decorated: Vec<(Vec<Value>, ResourceRef)> = items
            .into_iter()
            .map(|item| {
                let values = self
                    .keys
                    .iter()
                    .map(|(key, _)| key.extract(item.as_ref(), &self.context))
                    .collect();
                (values, item)
            })
            .collect();
        let directions: Vec<SortDirection> = self.keys.iter().map(|(_, d)| *d).collect();
        decorated.sort_by(|(a, _), (b, _)| {
            a.iter()
                .zip(b.iter())
                .zip(directions.iter())
                .map(|((a, b), direction)| direction.apply(compare_values(a, b)))
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        });
        self.items = decorated.into_iter().map(|(_, item)| item).collect();
    }
}

impl Orderable for ResourceList {
    fn order_by(&mut self, column: &str, direction: SortDirection) {
        self.keys
            .push((SortKey::Property(column.to_string()), direction));
        self.resort();
    }
}

impl From<Vec<ResourceRef>> for ResourceList {
    fn from(items: Vec<ResourceRef>) -> Self {
        Self::new(items)
    }
}

impl fmt::Debug for ResourceList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceList")
            .field("ids", &self.ids())
            .field("keys", &self.keys.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockResource;
    use serde_json::json;

    fn person(id: &str, name: &str, age: i64) -> ResourceRef {
        MockResource::new("Person", id)
            .with_property("name", json!(name))
            .with_property("age", json!(age))
            .shared()
    }

    fn people() -> ResourceList {
        ResourceList::new(vec![
            person("1", "carol", 30),
            person("2", "alice", 40),
            person("3", "bob", 30),
            person("4", "alice", 25),
        ])
    }

    #[test]
    fn parse_reads_terms_in_order() {
        let directive = SortEngine::default().parse("-createdAt, name,,-");
        assert_eq!(
            directive.terms(),
            [
                SortTerm {
                    field: "createdAt".into(),
                    direction: SortDirection::Descending
                },
                SortTerm {
                    field: "name".into(),
                    direction: SortDirection::Ascending
                },
            ]
        );
        assert_eq!(directive.to_string(), "-createdAt,name");
        assert!(SortEngine::default().parse("").is_empty());
    }

    #[test]
    fn parse_honours_configured_markers() {
        let engine = SortEngine::new(SortConfig {
            descending_marker: '!',
            separator: ';',
        });
        let directive = engine.parse("!age;name");
        assert_eq!(directive.terms()[0].direction, SortDirection::Descending);
        assert_eq!(directive.terms()[1].field, "name");
        assert_eq!(engine.format(&directive), "!age;name");
        assert_eq!(engine.parse(&engine.format(&directive)), directive);
        assert_eq!(directive.to_string(), "-age,name");
    }

    #[test]
    fn later_terms_break_ties() {
        let descriptor = ResourceDescriptor::new("Person").sortable("name").sortable("age");
        let engine = SortEngine::default();
        let mut list = people();
        engine
            .apply(&mut list, &engine.parse("name,-age"), &descriptor)
            .unwrap();
        assert_eq!(list.ids(), ["2", "4", "3", "1"]);
    }

    #[test]
    fn aliased_columns_sort_by_the_alias() {
        let descriptor =
            ResourceDescriptor::new("Person").sortable_by("years", SortStrategy::aliased("age"));
        let engine = SortEngine::default();
        let mut list = people();
        engine
            .apply(&mut list, &engine.parse("-years"), &descriptor)
            .unwrap();
        assert_eq!(list.ids(), ["2", "1", "3", "4"]);
    }

    #[test]
    fn custom_transforms_receive_the_collection() {
        let descriptor = ResourceDescriptor::new("Person").sortable_by(
            "name_length",
            SortStrategy::custom(|list: &mut ResourceList, direction| {
                list.order_by_key(
                    |object, _| {
                        let name = object.property("name").unwrap_or_default();
                        json!(name.as_str().map_or(0, str::len))
                    },
                    direction,
                );
            }),
        );
        let engine = SortEngine::default();
        let mut list = people();
        engine
            .apply(&mut list, &engine.parse("name_length"), &descriptor)
            .unwrap();
        assert_eq!(list.ids(), ["3", "1", "2", "4"]);
    }

    #[test]
    fn computed_keys_read_the_list_context() {
        let descriptor = ResourceDescriptor::new("Person").sortable_by(
            "distance",
            SortStrategy::custom(|list: &mut ResourceList, direction| {
                list.order_by_key(
                    |object, context| {
                        let target = context.get("target_age").and_then(Value::as_i64);
                        let age = object.property("age").and_then(|v| v.as_i64());
                        json!(target.zip(age).map(|(t, a)| (t - a).abs()))
                    },
                    direction,
                );
            }),
        );
        let engine = SortEngine::default();
        let mut list = people().with_context(Context::new().with("target_age", 38));
        engine
            .apply(&mut list, &engine.parse("distance"), &descriptor)
            .unwrap();
        assert_eq!(list.ids(), ["2", "1", "3", "4"]);
    }

    #[test]
    fn custom_transforms_may_replace_the_collection() {
        let descriptor = ResourceDescriptor::new("Person").sortable("age").sortable_by(
            "newest",
            SortStrategy::custom(|list: &mut ResourceList, direction| {
                let mut items = list.items().to_vec();
                if direction == SortDirection::Descending {
                    items.reverse();
                }
                *list = ResourceList::new(items.into_iter().rev().collect())
                    .with_context(list.context().clone());
            }),
        );
        let engine = SortEngine::default();
        let mut list = people();
        engine
            .apply(&mut list, &engine.parse("newest"), &descriptor)
            .unwrap();
        assert_eq!(list.ids(), ["4", "3", "2", "1"]);

        // The replacement carries no keys, so a later term sorts from scratch.
        engine
            .apply(&mut list, &engine.parse("newest,age"), &descriptor)
            .unwrap();
        assert_eq!(list.ids(), ["4", "1", "3", "2"]);
    }

    #[test]
    fn one_field_carries_a_transform_per_collection() {
        #[derive(Default)]
        struct Query(Vec<String>);
        impl Orderable for Query {
            fn order_by(&mut self, column: &str, _: SortDirection) {
                self.0.push(column.to_string());
            }
        }

        let strategy = SortStrategy::custom(|list: &mut ResourceList, direction| {
            list.order_by("age", direction)
        })
        .or_custom(|query: &mut Query, direction| query.order_by("people.age", direction));
        assert_eq!(
            strategy.shape(),
            StrategyShape::Custom(vec![type_name::<ResourceList>(), type_name::<Query>()])
        );
        let descriptor = ResourceDescriptor::new("Person").sortable_by("seniority", strategy);
        let engine = SortEngine::default();

        let mut list = people();
        engine
            .apply(&mut list, &engine.parse("-seniority"), &descriptor)
            .unwrap();
        assert_eq!(list.ids(), ["2", "1", "3", "4"]);

        let mut query = Query::default();
        engine
            .apply(&mut query, &engine.parse("-seniority"), &descriptor)
            .unwrap();
        assert_eq!(query.0, ["people.age"]);
    }

    #[test]
    fn or_custom_replaces_the_transform_for_the_same_collection() {
        let strategy = SortStrategy::custom(|list: &mut ResourceList, direction| {
            list.order_by("name", direction)
        })
        .or_custom(|list: &mut ResourceList, direction| list.order_by("age", direction));
        assert_eq!(
            strategy.shape(),
            StrategyShape::Custom(vec![type_name::<ResourceList>()])
        );
        let descriptor = ResourceDescriptor::new("Person").sortable_by("key", strategy);
        let engine = SortEngine::default();
        let mut list = people();
        engine
            .apply(&mut list, &engine.parse("key"), &descriptor)
            .unwrap();
        assert_eq!(list.ids(), ["4", "1", "3", "2"]);

        let aliased = SortStrategy::aliased("age").or_custom(|_: &mut ResourceList, _| {});
        assert_eq!(aliased.shape(), StrategyShape::Aliased("age"));
    }

    #[test]
    fn unsupported_field_leaves_collection_untouched() {
        let descriptor = ResourceDescriptor::new("Person").sortable("name");
        let engine = SortEngine::default();
        let mut list = people();
        let err = engine
            .apply(&mut list, &engine.parse("name,-createdAt"), &descriptor)
            .unwrap_err();
        assert_eq!(
            err,
            SortError::UnsupportedField {
                field: "createdAt".into(),
                legal: vec!["name".into()]
            }
        );
        assert_eq!(list.ids(), ["1", "2", "3", "4"]);
    }

    #[test]
    fn custom_transform_for_another_collection_is_rejected() {
        struct Other;
        impl Orderable for Other {
            fn order_by(&mut self, _: &str, _: SortDirection) {}
        }

        let descriptor = ResourceDescriptor::new("Person")
            .sortable("name")
            .sortable_by("rank", SortStrategy::custom(|_: &mut Other, _| {}));
        let engine = SortEngine::default();
        let mut list = people();
        let err = engine
            .apply(&mut list, &engine.parse("name,rank"), &descriptor)
            .unwrap_err();
        assert_eq!(
            err,
            SortError::CollectionMismatch {
                field: "rank".into(),
                expected: vec![type_name::<Other>()],
                found: type_name::<ResourceList>(),
            }
        );
        assert_eq!(list.ids(), ["1", "2", "3", "4"]);
    }
}
