//! Symbol-level dependency graph and strongly connected components.
//!
//! Any cycle of mutual top-level references must live in a single output
//! module, otherwise the emitted package would need circular cross-file
//! imports. The SCC pass runs Tarjan's algorithm with an explicit work
//! stack instead of call recursion, so arbitrarily deep dependency chains
//! cannot exhaust the native stack.

use petgraph::{algo::is_cyclic_directed, graph::DiGraph};
use rustc_hash::FxHashMap;

use crate::{
    extractor::TopLevelItem,
    types::{FxIndexMap, FxIndexSet},
};

/// Directed graph over top-level symbol names.
#[derive(Debug)]
pub struct SymbolGraph {
    names: Vec<String>,
    index_by_name: FxHashMap<String, usize>,
    edges: Vec<Vec<usize>>,
}

impl SymbolGraph {
    /// Build the graph from extracted items and their dependency sets.
    pub fn from_items(items: &[TopLevelItem]) -> Self {
        let names: Vec<String> = items.iter().map(|item| item.name.clone()).collect();
        let index_by_name: FxHashMap<String, usize> = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        let edges = items
            .iter()
            .map(|item| {
                item.deps
                    .iter()
                    .filter_map(|dep| index_by_name.get(dep).copied())
                    .collect()
            })
            .collect();
        Self {
            names,
            index_by_name,
            edges,
        }
    }

    /// Partition all symbols into strongly connected components.
    ///
    /// Iterative Tarjan: each work-stack frame is a node plus a cursor into
    /// its adjacency list, so no native recursion is involved. Output order
    /// is deterministic for a given input.
    pub fn strongly_connected_components(&self) -> Vec<Vec<String>> {
        const UNVISITED: usize = usize::MAX;

        let n = self.names.len();
        let mut index_of = vec![UNVISITED; n];
        let mut lowlink = vec![0usize; n];
        let mut on_stack = vec![false; n];
        let mut scc_stack: Vec<usize> = Vec::new();
        let mut next_index = 0usize;
        let mut components: Vec<Vec<String>> = Vec::new();
        let mut work: Vec<(usize, usize)> = Vec::new();

        for root in 0..n {
            if index_of[root] != UNVISITED {
                continue;
            }
            work.push((root, 0));
            while let Some(&(v, cursor)) = work.last() {
                if cursor == 0 {
                    index_of[v] = next_index;
                    lowlink[v] = next_index;
                    next_index += 1;
                    scc_stack.push(v);
                    on_stack[v] = true;
                }
                if let Some(&w) = self.edges[v].get(cursor) {
                    if let Some(frame) = work.last_mut() {
                        frame.1 += 1;
                    }
                    if index_of[w] == UNVISITED {
                        work.push((w, 0));
                    } else if on_stack[w] {
                        lowlink[v] = lowlink[v].min(index_of[w]);
                    }
                } else {
                    work.pop();
                    if let Some(&(parent, _)) = work.last() {
                        lowlink[parent] = lowlink[parent].min(lowlink[v]);
                    }
                    if lowlink[v] == index_of[v] {
                        let mut component = Vec::new();
                        while let Some(w) = scc_stack.pop() {
                            on_stack[w] = false;
                            component.push(self.names[w].clone());
                            if w == v {
                                break;
                            }
                        }
                        components.push(component);
                    }
                }
            }
        }

        components
    }

    /// Count distinct dependencies of `members` that live outside the set.
    pub fn external_dependency_count(&self, members: &[String]) -> usize {
        let inside: FxIndexSet<&str> = members.iter().map(String::as_str).collect();
        let mut external: FxIndexSet<&str> = FxIndexSet::default();
        for member in members {
            let Some(&i) = self.index_by_name.get(member) else {
                continue;
            };
            for &dep in &self.edges[i] {
                let dep_name = self.names[dep].as_str();
                if !inside.contains(dep_name) {
                    external.insert(dep_name);
                }
            }
        }
        external.len()
    }
}

/// Check that the cross-module import relation induced by `symbol_to_module`
/// is acyclic. The SCC invariant guarantees this holds for every packing;
/// it is asserted in debug builds and exercised directly by tests.
pub fn import_graph_is_acyclic(
    items: &[TopLevelItem],
    symbol_to_module: &FxIndexMap<String, String>,
) -> bool {
    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let mut nodes = FxHashMap::default();
    for module in symbol_to_module.values() {
        nodes
            .entry(module.as_str())
            .or_insert_with(|| graph.add_node(module.as_str()));
    }
    for item in items {
        let Some(from_module) = symbol_to_module.get(&item.name) else {
            continue;
        };
        for dep in &item.deps {
            let Some(to_module) = symbol_to_module.get(dep) else {
                continue;
            };
            if from_module != to_module {
                graph.update_edge(nodes[from_module.as_str()], nodes[to_module.as_str()], ());
            }
        }
    }
    !is_cyclic_directed(&graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::extract;

    fn graph_for(source: &str) -> (Vec<TopLevelItem>, SymbolGraph) {
        let module = extract(source).unwrap();
        let graph = SymbolGraph::from_items(&module.items);
        (module.items, graph)
    }

    #[test]
    fn test_mutual_recursion_forms_one_scc() {
        let (_, graph) = graph_for("def f():\n    return g()\n\ndef g():\n    return f()\n");
        let sccs = graph.strongly_connected_components();
        let cycle = sccs.iter().find(|c| c.len() == 2).unwrap();
        assert!(cycle.contains(&"f".to_string()));
        assert!(cycle.contains(&"g".to_string()));
    }

    #[test]
    fn test_independent_symbols_are_singletons() {
        let (_, graph) = graph_for("def a():\n    pass\n\ndef b():\n    pass\n");
        let sccs = graph.strongly_connected_components();
        assert_eq!(sccs.len(), 2);
        assert!(sccs.iter().all(|c| c.len() == 1));
    }

    #[test]
    fn test_three_cycle() {
        let source = "def a():\n    return b()\n\ndef b():\n    return c()\n\ndef c():\n    return a()\n";
        let (_, graph) = graph_for(source);
        let sccs = graph.strongly_connected_components();
        assert_eq!(sccs.len(), 1);
        assert_eq!(sccs[0].len(), 3);
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        // A linear call chain thousands of symbols deep; recursion-based
        // Tarjan would blow the native stack here.
        let depth = 20_000;
        let mut source = String::new();
        for i in 0..depth {
            if i + 1 < depth {
                source.push_str(&format!("def f{i}():\n    return f{}()\n\n", i + 1));
            } else {
                source.push_str(&format!("def f{i}():\n    return 0\n\n"));
            }
        }
        let (_, graph) = graph_for(&source);
        let sccs = graph.strongly_connected_components();
        assert_eq!(sccs.len(), depth);
    }

    #[test]
    fn test_external_dependency_count() {
        let source = "def a():\n    return b() + c()\n\ndef b():\n    pass\n\ndef c():\n    pass\n";
        let (_, graph) = graph_for(source);
        assert_eq!(graph.external_dependency_count(&["a".to_string()]), 2);
        assert_eq!(
            graph.external_dependency_count(&["a".to_string(), "b".to_string()]),
            1
        );
        assert_eq!(graph.external_dependency_count(&["b".to_string()]), 0);
    }
}
