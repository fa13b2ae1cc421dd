//! Source model extraction.
//!
//! Parses one Python file and extracts the inputs the splitting pipeline
//! works on: top-level items with their verbatim source spans, the original
//! import statements (deduplicated by first occurrence), an optional
//! `if __name__ == "__main__"` entry block, and the module docstring.

use anyhow::{Result, anyhow};
use ruff_python_ast::{self as ast, CmpOp, Expr, ModModule, Stmt};
use ruff_python_parser::parse_module;
use ruff_text_size::{Ranged, TextRange};

use crate::{
    types::{FxIndexSet, ItemKind},
    visitors::ReadNameCollector,
};

/// One top-level definition or constant binding.
///
/// Created once at extraction and immutable afterwards except for its
/// dependency set. Multiple targets of a single assignment produce one item
/// each, sharing the same span and linked by mutual dependencies so they can
/// never be split across modules.
#[derive(Debug, Clone)]
pub struct TopLevelItem {
    pub name: String,
    pub kind: ItemKind,
    /// Span of the owning statement, including any decorators.
    pub span: TextRange,
    /// Verbatim source text of the owning statement.
    pub source: String,
    /// Names of other top-level symbols this item references.
    pub deps: FxIndexSet<String>,
}

impl TopLevelItem {
    /// Number of source lines this item occupies.
    pub fn line_count(&self) -> usize {
        self.source.lines().count()
    }
}

/// Extraction result for one source file.
#[derive(Debug)]
pub struct ModuleSource {
    pub items: Vec<TopLevelItem>,
    /// Original import statements, first occurrence only, in order.
    pub imports: Vec<String>,
    /// Dedented body of the entry-point guard, if one exists.
    pub entry_body: Option<String>,
    pub docstring: Option<String>,
}

/// Parse `source` and extract the module model.
///
/// Fails with the parse error's line and column on invalid syntax; no
/// partial output is produced.
pub fn extract(source: &str) -> Result<ModuleSource> {
    let parsed = parse_module(source).map_err(|err| {
        let offset = err.location.start().to_usize().min(source.len());
        let line = source[..offset].matches('\n').count() + 1;
        let column = offset - source[..offset].rfind('\n').map_or(0, |i| i + 1) + 1;
        anyhow!("syntax error at line {line}, column {column}: {}", err.error)
    })?;
    let module = parsed.into_syntax();

    let docstring = module_docstring(&module);
    let top_names = collect_top_level_names(&module);

    let mut items: Vec<TopLevelItem> = Vec::new();
    let mut imports: Vec<String> = Vec::new();
    let mut seen_imports: FxIndexSet<String> = FxIndexSet::default();
    let mut entry_body: Option<String> = None;

    for stmt in &module.body {
        match stmt {
            Stmt::Import(_) | Stmt::ImportFrom(_) => {
                let text = segment(source, stmt.range()).trim().to_string();
                if seen_imports.insert(text.clone()) {
                    imports.push(text);
                }
            }
            Stmt::ClassDef(class_def) => {
                let span = stmt_span(stmt);
                push_item(
                    &mut items,
                    make_item(
                        class_def.name.as_str(),
                        ItemKind::Class,
                        span,
                        source,
                        stmt,
                        &top_names,
                        &[],
                    ),
                );
            }
            Stmt::FunctionDef(func_def) => {
                let span = stmt_span(stmt);
                push_item(
                    &mut items,
                    make_item(
                        func_def.name.as_str(),
                        ItemKind::Function,
                        span,
                        source,
                        stmt,
                        &top_names,
                        &[],
                    ),
                );
            }
            Stmt::Assign(assign) => {
                let span = stmt.range();
                let targets: Vec<&str> = assign
                    .targets
                    .iter()
                    .filter_map(|target| match target {
                        Expr::Name(name) => Some(name.id.as_str()),
                        _ => None,
                    })
                    .collect();
                for name in &targets {
                    push_item(
                        &mut items,
                        make_item(name, ItemKind::Constant, span, source, stmt, &top_names, &targets),
                    );
                }
            }
            Stmt::AnnAssign(ann_assign) => {
                if let Expr::Name(name) = ann_assign.target.as_ref() {
                    push_item(
                        &mut items,
                        make_item(
                            name.id.as_str(),
                            ItemKind::Constant,
                            stmt.range(),
                            source,
                            stmt,
                            &top_names,
                            &[],
                        ),
                    );
                }
            }
            Stmt::If(if_stmt) if is_entry_guard(if_stmt) => {
                entry_body = entry_body_source(source, if_stmt);
            }
            _ => {}
        }
    }

    log::debug!(
        "extracted {} top-level items, {} imports, entry block: {}",
        items.len(),
        imports.len(),
        entry_body.is_some()
    );

    Ok(ModuleSource {
        items,
        imports,
        entry_body,
        docstring,
    })
}

/// Build one item, resolving its dependency set against the top-level names.
///
/// `siblings` carries the other targets of a shared assignment; they become
/// mutual dependencies so the grouper keeps them together.
fn make_item(
    name: &str,
    kind: ItemKind,
    span: TextRange,
    source: &str,
    stmt: &Stmt,
    top_names: &FxIndexSet<String>,
    siblings: &[&str],
) -> TopLevelItem {
    let mut deps = ReadNameCollector::collect(stmt, top_names);
    for sibling in siblings {
        if *sibling != name {
            deps.insert((*sibling).to_string());
        }
    }
    deps.shift_remove(name);
    TopLevelItem {
        name: name.to_string(),
        kind,
        span,
        source: segment(source, span).trim_end().to_string(),
        deps,
    }
}

/// Later definitions shadow earlier ones of the same name, at the later
/// source position.
fn push_item(items: &mut Vec<TopLevelItem>, item: TopLevelItem) {
    items.retain(|existing| existing.name != item.name);
    items.push(item);
}

fn collect_top_level_names(module: &ModModule) -> FxIndexSet<String> {
    let mut names = FxIndexSet::default();
    for stmt in &module.body {
        match stmt {
            Stmt::FunctionDef(func_def) => {
                names.insert(func_def.name.to_string());
            }
            Stmt::ClassDef(class_def) => {
                names.insert(class_def.name.to_string());
            }
            Stmt::Assign(assign) => {
                for target in &assign.targets {
                    if let Expr::Name(name) = target {
                        names.insert(name.id.to_string());
                    }
                }
            }
            Stmt::AnnAssign(ann_assign) => {
                if let Expr::Name(name) = ann_assign.target.as_ref() {
                    names.insert(name.id.to_string());
                }
            }
            _ => {}
        }
    }
    names
}

fn module_docstring(module: &ModModule) -> Option<String> {
    match module.body.first()? {
        Stmt::Expr(stmt) => match stmt.value.as_ref() {
            Expr::StringLiteral(lit) => Some(lit.value.to_str().to_string()),
            _ => None,
        },
        _ => None,
    }
}

/// Span of a statement including its decorators, which ruff ranges exclude.
fn stmt_span(stmt: &Stmt) -> TextRange {
    let decorator_start = match stmt {
        Stmt::FunctionDef(func_def) => func_def.decorator_list.first().map(|d| d.range().start()),
        Stmt::ClassDef(class_def) => class_def.decorator_list.first().map(|d| d.range().start()),
        _ => None,
    };
    match decorator_start {
        Some(start) => TextRange::new(start.min(stmt.range().start()), stmt.range().end()),
        None => stmt.range(),
    }
}

fn segment(source: &str, range: TextRange) -> &str {
    &source[range.start().to_usize()..range.end().to_usize()]
}

/// Recognize `if __name__ == "__main__":`.
fn is_entry_guard(if_stmt: &ast::StmtIf) -> bool {
    let Expr::Compare(cmp) = if_stmt.test.as_ref() else {
        return false;
    };
    let Expr::Name(left) = cmp.left.as_ref() else {
        return false;
    };
    if left.id.as_str() != "__name__" || !matches!(cmp.ops.as_ref(), [CmpOp::Eq]) {
        return false;
    }
    matches!(
        cmp.comparators.first(),
        Some(Expr::StringLiteral(lit)) if lit.value.to_str() == "__main__"
    )
}

/// Extract the guard's body, unwrapped and dedented to column zero.
fn entry_body_source(source: &str, if_stmt: &ast::StmtIf) -> Option<String> {
    let first = if_stmt.body.first()?;
    let last = if_stmt.body.last()?;
    let start = first.range().start().to_usize();
    let line_start = source[..start].rfind('\n').map_or(0, |i| i + 1);
    let block = &source[line_start..last.range().end().to_usize()];
    Some(dedent(block))
}

fn dedent(block: &str) -> String {
    let indent = block
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    let mut out = String::with_capacity(block.len());
    for line in block.lines() {
        if line.trim().is_empty() {
            out.push('\n');
        } else {
            out.push_str(&line[indent..]);
            out.push('\n');
        }
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_extract_kinds() {
        let source = "\
import os

CONST = 1
LIMIT: int = 2

class Widget:
    pass

def build():
    return Widget()
";
        let module = extract(source).unwrap();
        let kinds: Vec<(&str, ItemKind)> = module
            .items
            .iter()
            .map(|item| (item.name.as_str(), item.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("CONST", ItemKind::Constant),
                ("LIMIT", ItemKind::Constant),
                ("Widget", ItemKind::Class),
                ("build", ItemKind::Function),
            ]
        );
        assert_eq!(module.imports, vec!["import os".to_string()]);
    }

    #[test]
    fn test_duplicate_import_kept_once() {
        let source = "import os\nimport sys\nimport os\n\nX = 1\n";
        let module = extract(source).unwrap();
        assert_eq!(module.imports, vec!["import os".to_string(), "import sys".to_string()]);
    }

    #[test]
    fn test_shadowing_keeps_later_definition() {
        let source = "def f():\n    return 1\n\ndef f():\n    return 2\n";
        let module = extract(source).unwrap();
        assert_eq!(module.items.len(), 1);
        assert!(module.items[0].source.contains("return 2"));
    }

    #[test]
    fn test_compound_assignment_targets_are_linked() {
        let source = "a = b = compute()\n\ndef compute():\n    return 1\n";
        let module = extract(source).unwrap();
        let a = module.items.iter().find(|i| i.name == "a").unwrap();
        let b = module.items.iter().find(|i| i.name == "b").unwrap();
        assert_eq!(a.span, b.span);
        assert!(a.deps.contains("b"));
        assert!(b.deps.contains("a"));
        assert!(a.deps.contains("compute"));
    }

    #[test]
    fn test_dependencies_exclude_self() {
        let source = "def fact(n):\n    return 1 if n <= 1 else n * fact(n - 1)\n";
        let module = extract(source).unwrap();
        assert!(module.items[0].deps.is_empty());
    }

    #[test]
    fn test_entry_block_unwrapped() {
        let source = "\
def main():
    pass

if __name__ == \"__main__\":
    import sys
    main()
";
        let module = extract(source).unwrap();
        let body = module.entry_body.unwrap();
        assert_eq!(body, "import sys\nmain()");
    }

    #[test]
    fn test_non_entry_if_is_ignored() {
        let source = "X = 1\n\nif X:\n    Y = 2\n";
        let module = extract(source).unwrap();
        assert!(module.entry_body.is_none());
        // The conditional assignment is not a top-level item.
        assert_eq!(module.items.len(), 1);
    }

    #[test]
    fn test_docstring_and_decorated_span() {
        let source = "\"\"\"Utility module.\"\"\"\n\n@wraps\ndef f():\n    pass\n\ndef wraps(f):\n    return f\n";
        let module = extract(source).unwrap();
        assert_eq!(module.docstring.as_deref(), Some("Utility module."));
        let f = module.items.iter().find(|i| i.name == "f").unwrap();
        assert!(f.source.starts_with("@wraps"));
        assert!(f.deps.contains("wraps"));
    }

    #[test]
    fn test_syntax_error_is_fatal_with_location() {
        let err = extract("def broken(:\n    pass\n").unwrap_err();
        assert!(err.to_string().contains("syntax error at line 1"));
    }
}
