use proptest::prelude::*;
use resource_framework::mock::MockResource;
use resource_framework::{
    Context, IncludeTree, Registry, Related, ResourceDescriptor, ResourceList, ResourceRef,
    SerializationEngine, SerializerConfig, SortDirection, SortEngine,
};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

fn field() -> impl Strategy<Value = String> {
    "[a-z][a-z_]{0,8}"
}

proptest! {
    /// Rendering a directive and parsing it back gives the same terms.
    #[test]
    fn sort_directive_display_parses_back(
        terms in prop::collection::vec((field(), any::<bool>()), 0..6)
    ) {
        let text = terms
            .iter()
            .map(|(f, desc)| if *desc { format!("-{f}") } else { f.clone() })
            .collect::<Vec<_>>()
            .join(",");
        let engine = SortEngine::default();
        let directive = engine.parse(&text);

        prop_assert_eq!(directive.len(), terms.len());
        for (term, (name, desc)) in directive.terms().iter().zip(&terms) {
            prop_assert_eq!(&term.field, name);
            let expected = if *desc { SortDirection::Descending } else { SortDirection::Ascending };
            prop_assert_eq!(term.direction, expected);
        }
        prop_assert_eq!(directive.to_string(), text);
    }

    /// Every requested path is in the tree, and the tree holds nothing else.
    #[test]
    fn include_tree_keeps_every_prefix(
        paths in prop::collection::vec(prop::collection::vec(field(), 1..4), 0..6)
    ) {
        let dotted: Vec<String> = paths.iter().map(|p| p.join(".")).collect();
        let tree = IncludeTree::parse(&dotted);

        let mut expected = HashSet::new();
        for path in &paths {
            for end in 1..=path.len() {
                expected.insert(path[..end].join("."));
            }
        }
        let actual: HashSet<String> = tree.paths().into_iter().collect();
        prop_assert_eq!(actual, expected);
        prop_assert_eq!(tree.depth(), paths.iter().map(Vec::len).max().unwrap_or(0));
    }

    /// Sorting by one field yields the values in non-decreasing order.
    #[test]
    fn resource_list_sorts_by_property(values in prop::collection::vec(-50i64..50, 0..20)) {
        let items: Vec<ResourceRef> = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                MockResource::new("Row", i.to_string())
                    .with_property("rank", json!(v))
                    .shared() as ResourceRef
            })
            .collect();
        let descriptor = ResourceDescriptor::new("Row").sortable("rank");
        let mut list = ResourceList::new(items);
        let engine = SortEngine::default();
        engine.apply(&mut list, &engine.parse("rank"), &descriptor).unwrap();

        let ranks: Vec<i64> = list
            .items()
            .iter()
            .map(|item| item.property("rank").and_then(|v| v.as_i64()).unwrap())
            .collect();
        let mut sorted = values.clone();
        sorted.sort();
        prop_assert_eq!(ranks, sorted);
    }

    /// Random friend graphs always terminate, never include the root, and
    /// never include a node twice.
    #[test]
    fn friend_graphs_serialize_deterministically(
        edges in prop::collection::vec((0usize..6, 0usize..6), 0..15),
        depth in 1usize..5
    ) {
        let nodes: Vec<Arc<MockResource>> = (0..6)
            .map(|i| MockResource::new("Person", i.to_string()).shared())
            .collect();
        for i in 0..nodes.len() {
            let friends = edges
                .iter()
                .filter(|(from, _)| *from == i)
                .map(|(_, to)| nodes[*to].clone());
            nodes[i].relate("friends", Related::many(friends));
        }
        let mut registry = Registry::new();
        let people = registry
            .register(ResourceDescriptor::new("Person").has_many("friends"))
            .unwrap();
        let engine = SerializationEngine::new(Arc::new(registry), SerializerConfig::default());
        let path = vec!["friends"; depth].join(".");

        let render = || {
            engine
                .serialize(
                    &people,
                    nodes[0].clone() as ResourceRef,
                    &Context::new(),
                    &[path.as_str()],
                )
                .unwrap()
        };
        let doc = render();
        let ids: Vec<String> = doc.included().iter().map(|o| o.id.clone()).collect();
        let unique: HashSet<&String> = ids.iter().collect();

        prop_assert_eq!(unique.len(), ids.len());
        prop_assert!(!ids.contains(&"0".to_string()));
        prop_assert_eq!(doc.to_json().unwrap(), render().to_json().unwrap());
    }
}
