//! Visitor that collects top-level symbols referenced in read context.
//!
//! The collector walks an item's entire subtree in source order, which
//! covers bodies, decorators, base-class lists, and parameter/return
//! annotations, recursing into nested scopes. A name is recorded only when
//! it is loaded (not stored) and matches the top-level symbol set by plain
//! name. There is no lexical-scope resolution: a local binding that shadows
//! a top-level name still counts as a reference. That over-approximation is
//! safe for splitting since it can only force extra merging.

use ruff_python_ast::{
    Expr, ExprContext, Stmt,
    visitor::source_order::{self, SourceOrderVisitor},
};

use crate::types::FxIndexSet;

/// Collects references to known top-level symbols inside one item.
#[derive(Debug)]
pub struct ReadNameCollector<'a> {
    top_level_names: &'a FxIndexSet<String>,
    used: FxIndexSet<String>,
}

impl<'a> ReadNameCollector<'a> {
    /// Collect every top-level symbol read anywhere under `stmt`.
    pub fn collect(stmt: &Stmt, top_level_names: &'a FxIndexSet<String>) -> FxIndexSet<String> {
        let mut collector = Self {
            top_level_names,
            used: FxIndexSet::default(),
        };
        collector.visit_stmt(stmt);
        collector.used
    }
}

impl<'ast> SourceOrderVisitor<'ast> for ReadNameCollector<'_> {
    fn visit_expr(&mut self, expr: &'ast Expr) {
        if let Expr::Name(name) = expr
            && matches!(name.ctx, ExprContext::Load)
            && self.top_level_names.contains(name.id.as_str())
        {
            self.used.insert(name.id.to_string());
        }
        source_order::walk_expr(self, expr);
    }
}

#[cfg(test)]
mod tests {
    use ruff_python_parser::parse_module;

    use super::*;

    fn names(items: &[&str]) -> FxIndexSet<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn collect_from(code: &str, top: &FxIndexSet<String>) -> FxIndexSet<String> {
        let parsed = parse_module(code).unwrap();
        let module = parsed.into_syntax();
        ReadNameCollector::collect(&module.body[0], top)
    }

    #[test]
    fn test_collects_reads_not_writes() {
        let top = names(&["helper", "result"]);
        let used = collect_from("def f():\n    result = helper()\n", &top);
        assert!(used.contains("helper"));
        // `result` is only ever a write target inside f
        assert!(!used.contains("result"));
    }

    #[test]
    fn test_collects_decorators_bases_annotations() {
        let top = names(&["deco", "Base", "Arg", "Ret"]);
        let used = collect_from(
            "@deco\nclass C(Base):\n    def m(self, a: Arg) -> Ret:\n        pass\n",
            &top,
        );
        for expected in ["deco", "Base", "Arg", "Ret"] {
            assert!(used.contains(expected), "missing {expected}");
        }
    }

    #[test]
    fn test_shadowed_local_still_counts() {
        // Deliberate over-approximation: the local `helper` shadows the
        // top-level one, but the read is still recorded.
        let top = names(&["helper"]);
        let used = collect_from("def f():\n    helper = 1\n    return helper\n", &top);
        assert!(used.contains("helper"));
    }

    #[test]
    fn test_ignores_unknown_names() {
        let top = names(&["known"]);
        let used = collect_from("def f():\n    return unknown()\n", &top);
        assert!(used.is_empty());
    }
}
