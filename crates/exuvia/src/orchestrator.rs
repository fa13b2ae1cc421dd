//! End-to-end split pipeline for a single source file.
//!
//! One run is synchronous and self-contained: extract, group, pack,
//! resolve the package name, render. Nothing outlives the run, so callers
//! may process many files in parallel.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::{
    components::{build_components, rebuild_symbol_map},
    config::SplitConfig,
    graph::{SymbolGraph, import_graph_is_acyclic},
    namer::{NamingContext, PackageNamer},
    naming::ensure_unique_module_name,
    packing::pack_components,
    renderer::{self, ENTRY_MODULE, INIT_MODULE, ModuleArtifact},
    types::FxIndexSet,
};

/// How many leading source lines are scanned for naming comments.
const LEADING_COMMENT_LINES: usize = 80;

/// Result of one split run.
#[derive(Debug)]
pub enum SplitOutcome {
    /// The file has no top-level definitions; nothing was produced.
    NothingToSplit,
    Package(Box<SplitPackage>),
}

/// The rendered package: everything the caller needs to persist.
#[derive(Debug)]
pub struct SplitPackage {
    pub package_name: String,
    pub modules: Vec<ModuleArtifact>,
    /// Contents of the `__init__` aggregator.
    pub init: String,
    /// Contents of the `__main__` artifact, when the source had an
    /// entry-point block.
    pub entry: Option<String>,
}

/// Split one file's source text into a package of rendered modules.
///
/// `file_stem` participates only in naming. Fails on a syntax error with
/// no partial output.
pub fn split_source(
    source: &str,
    file_stem: &str,
    config: &SplitConfig,
    namer: &PackageNamer,
) -> Result<SplitOutcome> {
    let module = crate::extractor::extract(source)?;
    if module.items.is_empty() {
        log::info!("{file_stem}: no top-level definitions, nothing to split");
        return Ok(SplitOutcome::NothingToSplit);
    }

    let graph = SymbolGraph::from_items(&module.items);
    let mut arena = build_components(&module.items, &graph);
    pack_components(&mut arena, &module.items, config);
    let mut components = arena.into_components();

    // Final collision guard: suffix later duplicates right before rendering.
    let mut used_names = FxIndexSet::default();
    for component in &mut components {
        component.module_name = ensure_unique_module_name(&component.module_name, &mut used_names);
    }

    let symbol_to_module = rebuild_symbol_map(&components);
    debug_assert!(import_graph_is_acyclic(&module.items, &symbol_to_module));

    let ctx = NamingContext {
        file_stem: file_stem.to_string(),
        docstring: module.docstring.clone(),
        leading_comments: leading_comments(source),
        top_level_names: module.items.iter().map(|item| item.name.clone()).collect(),
    };
    let package_name = namer.resolve(&ctx);

    let modules: Vec<ModuleArtifact> = components
        .iter()
        .map(|component| {
            renderer::render_module(component, &module.items, &module.imports, &symbol_to_module)
        })
        .collect();
    let init = renderer::render_init(&modules, module.docstring.as_deref());
    let entry = module.entry_body.as_deref().map(renderer::render_entry);

    log::info!(
        "{file_stem}: split into {} modules as package {package_name}",
        modules.len()
    );

    Ok(SplitOutcome::Package(Box::new(SplitPackage {
        package_name,
        modules,
        init,
        entry,
    })))
}

/// `#` comment lines near the top of the file, for the naming heuristic.
fn leading_comments(source: &str) -> Vec<String> {
    source
        .lines()
        .take(LEADING_COMMENT_LINES)
        .map(str::trim)
        .filter(|line| line.starts_with('#'))
        .map(|line| line.trim_start_matches(['#', ' ']).to_string())
        .collect()
}

/// Persist a rendered package under `out_root/<package_name>/`.
///
/// Refuses to touch an existing package directory unless `force` is set.
/// Returns the package directory path.
pub fn write_package(out_root: &Path, package: &SplitPackage, force: bool) -> Result<PathBuf> {
    let package_dir = out_root.join(&package.package_name);
    if package_dir.exists() && !force {
        bail!(
            "output directory already exists: {} (use --force to overwrite)",
            package_dir.display()
        );
    }
    std::fs::create_dir_all(&package_dir)
        .with_context(|| format!("failed to create {}", package_dir.display()))?;

    for module in &package.modules {
        let path = package_dir.join(format!("{}.py", module.name));
        std::fs::write(&path, &module.contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    std::fs::write(package_dir.join(format!("{INIT_MODULE}.py")), &package.init)
        .with_context(|| format!("failed to write {INIT_MODULE}.py in {}", package_dir.display()))?;
    if let Some(entry) = &package.entry {
        std::fs::write(package_dir.join(format!("{ENTRY_MODULE}.py")), entry)
            .with_context(|| {
                format!("failed to write {ENTRY_MODULE}.py in {}", package_dir.display())
            })?;
    }
    Ok(package_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_to_split() {
        let namer = PackageNamer::default();
        let outcome = split_source(
            "import os\n\nif __name__ == \"__main__\":\n    print(os.getcwd())\n",
            "script",
            &SplitConfig::default(),
            &namer,
        )
        .unwrap();
        assert!(matches!(outcome, SplitOutcome::NothingToSplit));
    }

    #[test]
    fn test_basic_package() {
        let namer = PackageNamer::with_override("pkg");
        let source = "\
def helper():
    return 1

def main():
    return helper()

if __name__ == \"__main__\":
    main()
";
        let SplitOutcome::Package(package) =
            split_source(source, "tool", &SplitConfig::default(), &namer).unwrap()
        else {
            panic!("expected a package");
        };
        assert_eq!(package.package_name, "pkg");
        assert!(!package.modules.is_empty());
        assert!(package.entry.is_some());
    }

    #[test]
    fn test_module_name_collision_suffixed() {
        let namer = PackageNamer::default();
        // Both symbols normalize to the module name "core_thing".
        let source = "def core_thing():\n    pass\n\ndef CoreThing():\n    pass\n";
        let config = SplitConfig {
            pack_small_lines: 0,
            ..SplitConfig::default()
        };
        let SplitOutcome::Package(package) =
            split_source(source, "x", &config, &namer).unwrap()
        else {
            panic!("expected a package");
        };
        let names: Vec<&str> = package.modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names.len(), 2);
        assert_ne!(names[0], names[1]);
        assert!(names.contains(&"core_thing"));
        assert!(names.contains(&"core_thing_2"));
    }

    #[test]
    fn test_leading_comments() {
        let comments = leading_comments("# first\nx = 1\n  # second\n");
        assert_eq!(comments, vec!["first".to_string(), "second".to_string()]);
    }
}
