//! Render final components into in-memory Python artifacts.
//!
//! Pure text construction: per-component module files, the package
//! `__init__` aggregator, and an optional `__main__` entry artifact.
//! Writing anything to disk is the caller's concern.

use crate::{
    components::Component,
    extractor::TopLevelItem,
    types::{FxIndexMap, FxIndexSet},
};

/// Marker line at the top of every generated file.
pub const GENERATED_HEADER: &str = "# Generated by exuvia - do not edit by hand";

/// Reserved artifact name for the package aggregator.
pub const INIT_MODULE: &str = "__init__";
/// Reserved artifact name for the entry-point file.
pub const ENTRY_MODULE: &str = "__main__";

/// One rendered output module.
#[derive(Debug, Clone)]
pub struct ModuleArtifact {
    pub name: String,
    /// Symbols this module owns and exports.
    pub symbols: Vec<String>,
    /// Source-line count of the owned items, for plan reporting.
    pub line_count: usize,
    pub contents: String,
}

/// Render one component as a module file.
///
/// Layout: header, the original imports (already deduplicated by first
/// occurrence), one consolidated same-package import per external owning
/// module (alphabetical, symbols sorted), the items verbatim in original
/// top-level order, and an explicit `__all__`.
pub fn render_module(
    component: &Component,
    items: &[TopLevelItem],
    imports: &[String],
    symbol_to_module: &FxIndexMap<String, String>,
) -> ModuleArtifact {
    let mut lines: Vec<String> = vec![GENERATED_HEADER.to_string()];

    if !imports.is_empty() {
        lines.extend(imports.iter().cloned());
        lines.push(String::new());
    }

    let own: FxIndexSet<&str> = component.names.iter().map(String::as_str).collect();
    let mut external: FxIndexMap<&str, FxIndexSet<&str>> = FxIndexMap::default();
    for &index in &component.item_indices {
        for dep in &items[index].deps {
            if own.contains(dep.as_str()) {
                continue;
            }
            if let Some(module) = symbol_to_module.get(dep) {
                external.entry(module.as_str()).or_default().insert(dep.as_str());
            }
        }
    }
    let mut modules: Vec<&str> = external.keys().copied().collect();
    modules.sort_unstable();
    for module in &modules {
        let mut symbols: Vec<&str> = external[module].iter().copied().collect();
        symbols.sort_unstable();
        lines.push(format!("from .{module} import {}", symbols.join(", ")));
    }
    if !modules.is_empty() {
        lines.push(String::new());
    }

    // Original top-level order; a span shared by several member items
    // (compound assignment targets) renders exactly once.
    let mut ordered = component.item_indices.clone();
    ordered.sort_by_key(|&index| items[index].span.start());
    let mut seen_spans = FxIndexSet::default();
    for index in ordered {
        let item = &items[index];
        if seen_spans.insert(item.span) {
            lines.push(item.source.clone());
            lines.push(String::new());
        }
    }

    lines.push(format!("__all__ = [{}]", quoted_list(&component.names)));
    lines.push(String::new());

    ModuleArtifact {
        name: component.module_name.clone(),
        symbols: component.names.clone(),
        line_count: component.line_count(items),
        contents: lines.join("\n"),
    }
}

/// Render the package aggregator: re-exports every component's symbols and
/// records the sorted union as the package surface. Carries the source
/// file's docstring forward.
pub fn render_init(modules: &[ModuleArtifact], docstring: Option<&str>) -> String {
    let mut lines: Vec<String> = vec![GENERATED_HEADER.to_string()];
    if let Some(doc) = docstring {
        lines.push("\"\"\"".to_string());
        lines.push(doc.trim().to_string());
        lines.push("\"\"\"".to_string());
        lines.push(String::new());
    }
    let mut all_names: Vec<String> = Vec::new();
    for module in modules {
        if module.symbols.is_empty() {
            continue;
        }
        lines.push(format!(
            "from .{} import {}",
            module.name,
            module.symbols.join(", ")
        ));
        all_names.extend(module.symbols.iter().cloned());
    }
    lines.push(String::new());
    all_names.sort_unstable();
    all_names.dedup();
    lines.push(format!("__all__ = [{}]", quoted_list(&all_names)));
    lines.push(String::new());
    lines.join("\n")
}

/// Render the entry artifact: the package surface plus the unwrapped
/// guard body, verbatim.
pub fn render_entry(body: &str) -> String {
    let mut lines: Vec<String> = vec![GENERATED_HEADER.to_string()];
    lines.push("from . import *  # package surface".to_string());
    lines.push(String::new());
    lines.push(body.trim_end().to_string());
    lines.push(String::new());
    lines.join("\n")
}

fn quoted_list(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("'{name}'"))
        .collect::<Vec<_>>()
        .join(", ")
}
