//! Components: SCC-seeded groups of top-level items.
//!
//! Components live in an arena addressed by stable identifiers. A merge
//! retires its two operands and allocates a fresh identifier holding the
//! union, so there is no in-place mutation of shared lists and no iterator
//! invalidation while packing rewrites the layout.

use crate::{
    extractor::TopLevelItem,
    graph::SymbolGraph,
    naming::module_name_for_component,
    types::FxIndexMap,
};

/// Stable handle for a component in the arena. Identifiers are never
/// reused; a retired identifier stays dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentId(u32);

impl ComponentId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A group of top-level items destined for one output module.
///
/// Seeded from an SCC of the dependency graph and grown only by merging;
/// a component never splits, so mutually dependent symbols stay together.
#[derive(Debug, Clone)]
pub struct Component {
    /// Member symbol names, case-insensitively sorted.
    pub names: Vec<String>,
    /// Indices into the extracted item list.
    pub item_indices: Vec<usize>,
    pub module_name: String,
    /// Reserved components (`constants`, `core`) keep their name and are
    /// exempt from size-driven merging.
    pub reserved: bool,
}

impl Component {
    /// Total source-line count of all member items.
    pub fn line_count(&self, items: &[TopLevelItem]) -> usize {
        self.item_indices
            .iter()
            .map(|&i| items[i].line_count())
            .sum()
    }

    /// True when every member is a constant binding.
    pub fn is_constant_only(&self, items: &[TopLevelItem]) -> bool {
        self.item_indices.iter().all(|&i| items[i].kind.is_constant())
    }
}

/// Arena of components addressed by stable identifiers.
#[derive(Debug, Default)]
pub struct ComponentArena {
    slots: Vec<Option<Component>>,
}

impl ComponentArena {
    pub fn alloc(&mut self, component: Component) -> ComponentId {
        let id = ComponentId(u32::try_from(self.slots.len()).unwrap_or(u32::MAX));
        self.slots.push(Some(component));
        id
    }

    pub fn get(&self, id: ComponentId) -> Option<&Component> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Live identifiers in allocation order. Merged components appear after
    /// their operands, matching the deterministic tie-break order packing
    /// relies on.
    pub fn live_ids(&self) -> Vec<ComponentId> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|_| ComponentId(i as u32)))
            .collect()
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Retire `a` and `b`, allocate their union.
    ///
    /// The union's member list is re-sorted case-insensitively and its
    /// module name re-derived from the full symbol set, unless a reserved
    /// name is imposed.
    pub fn merge(
        &mut self,
        a: ComponentId,
        b: ComponentId,
        reserved_name: Option<&str>,
    ) -> ComponentId {
        let first = self.slots[a.index()].take();
        let second = self.slots[b.index()].take();
        let (Some(first), Some(second)) = (first, second) else {
            unreachable!("merge operands must be live");
        };

        let mut names = first.names;
        names.extend(second.names);
        names.sort_by_key(|n| n.to_lowercase());
        let mut item_indices = first.item_indices;
        item_indices.extend(second.item_indices);

        let (module_name, reserved) = match reserved_name {
            Some(name) => (name.to_string(), true),
            None => (module_name_for_component(&names), false),
        };
        log::debug!(
            "merged components {:?} + {:?} -> {module_name}",
            first.module_name,
            second.module_name
        );

        self.alloc(Component {
            names,
            item_indices,
            module_name,
            reserved,
        })
    }

    /// Drain into the final component list, in identifier order.
    pub fn into_components(self) -> Vec<Component> {
        self.slots.into_iter().flatten().collect()
    }
}

/// Seed the arena from the dependency graph's SCCs.
///
/// Members of each component are sorted case-insensitively and the initial
/// module name is derived from them. Components are inserted in ascending
/// order of external dependency count, which packing later uses as its
/// deterministic tie-break.
pub fn build_components(items: &[TopLevelItem], graph: &SymbolGraph) -> ComponentArena {
    let index_by_name: FxIndexMap<&str, usize> = items
        .iter()
        .enumerate()
        .map(|(i, item)| (item.name.as_str(), i))
        .collect();

    let mut seeded: Vec<Component> = graph
        .strongly_connected_components()
        .into_iter()
        .map(|mut names| {
            names.sort_by_key(|n| n.to_lowercase());
            let item_indices = names
                .iter()
                .filter_map(|name| index_by_name.get(name.as_str()).copied())
                .collect();
            let module_name = module_name_for_component(&names);
            Component {
                names,
                item_indices,
                module_name,
                reserved: false,
            }
        })
        .collect();

    seeded.sort_by_key(|component| graph.external_dependency_count(&component.names));

    let mut arena = ComponentArena::default();
    for component in seeded {
        arena.alloc(component);
    }
    arena
}

/// Rebuild the symbol -> module-name map from the final components.
///
/// Always built from scratch after packing and collision resolution; the
/// map is never patched incrementally.
pub fn rebuild_symbol_map(components: &[Component]) -> FxIndexMap<String, String> {
    let mut map = FxIndexMap::default();
    for component in components {
        for name in &component.names {
            map.insert(name.clone(), component.module_name.clone());
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::extract;

    fn arena_for(source: &str) -> (Vec<TopLevelItem>, ComponentArena) {
        let module = extract(source).unwrap();
        let graph = SymbolGraph::from_items(&module.items);
        let arena = build_components(&module.items, &graph);
        (module.items, arena)
    }

    #[test]
    fn test_scc_members_share_component() {
        let (_, arena) = arena_for("def f():\n    return g()\n\ndef g():\n    return f()\n");
        let ids = arena.live_ids();
        assert_eq!(ids.len(), 1);
        let component = arena.get(ids[0]).unwrap();
        assert_eq!(component.names, vec!["f".to_string(), "g".to_string()]);
        assert_eq!(component.module_name, "f_g");
    }

    #[test]
    fn test_components_ordered_by_external_deps() {
        let source = "def leaf():\n    pass\n\ndef caller():\n    return leaf()\n";
        let (_, arena) = arena_for(source);
        let ids = arena.live_ids();
        let first = arena.get(ids[0]).unwrap();
        let second = arena.get(ids[1]).unwrap();
        assert_eq!(first.names, vec!["leaf".to_string()]);
        assert_eq!(second.names, vec!["caller".to_string()]);
    }

    #[test]
    fn test_merge_retires_operands_and_allocates_union() {
        let (_, mut arena) = arena_for("def a():\n    pass\n\ndef b():\n    pass\n");
        let ids = arena.live_ids();
        let merged = arena.merge(ids[0], ids[1], None);
        assert!(arena.get(ids[0]).is_none());
        assert!(arena.get(ids[1]).is_none());
        let union = arena.get(merged).unwrap();
        assert_eq!(union.names, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(union.module_name, "a_b");
        assert!(!union.reserved);
        assert_eq!(arena.live_count(), 1);
    }

    #[test]
    fn test_merge_with_reserved_name() {
        let (_, mut arena) = arena_for("A = 1\n\nB = 2\n");
        let ids = arena.live_ids();
        let merged = arena.merge(ids[0], ids[1], Some("constants"));
        let union = arena.get(merged).unwrap();
        assert_eq!(union.module_name, "constants");
        assert!(union.reserved);
    }

    #[test]
    fn test_rebuild_symbol_map() {
        let (_, arena) = arena_for("def a():\n    pass\n\ndef b():\n    pass\n");
        let components = arena.into_components();
        let map = rebuild_symbol_map(&components);
        assert_eq!(map.get("a").unwrap(), "a");
        assert_eq!(map.get("b").unwrap(), "b");
    }
}
