//! Module and package name normalization.
//!
//! Every name that ends up as a file or package identifier passes through
//! [`to_snake`], so the same rules apply to component names, the package
//! name, and anything a remote suggester returns.

use crate::types::FxIndexSet;

/// Fallback identifier when normalization consumes the whole input.
const DEFAULT_MODULE_NAME: &str = "module";

/// Normalize an arbitrary string into a valid snake_case Python module name.
///
/// Idempotent: feeding the output back in returns it unchanged.
pub fn to_snake(raw: &str) -> String {
    let trimmed = raw.trim();

    // Insert underscores at lower/digit-to-upper transitions, then lowercase
    // and squash every run of invalid characters into a single underscore.
    let mut out = String::with_capacity(trimmed.len() + 4);
    let mut prev: Option<char> = None;
    for ch in trimmed.chars() {
        let ch = if ch == '-' { '_' } else { ch };
        if ch.is_ascii_uppercase()
            && prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit())
        {
            out.push('_');
        }
        let lower = ch.to_ascii_lowercase();
        if lower.is_ascii_lowercase() || lower.is_ascii_digit() || lower == '_' {
            out.push(lower);
        } else if !out.ends_with('_') {
            out.push('_');
        }
        prev = Some(ch);
    }

    let mut name = out.trim_matches('_').to_string();
    // Collapse runs of underscores left by stripped characters.
    while name.contains("__") {
        name = name.replace("__", "_");
    }
    if name.is_empty() {
        name = DEFAULT_MODULE_NAME.to_string();
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name = format!("m_{name}");
    }
    if ruff_python_stdlib::keyword::is_keyword(&name) {
        name = format!("mod_{name}");
    }
    name
}

/// Check whether a suggested package name is acceptable as-is:
/// 3 to 30 characters from `[a-z0-9_]`.
pub fn is_valid_package_name(name: &str) -> bool {
    (3..=30).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Ensure module names are unique within a package by suffixing integers.
pub fn ensure_unique_module_name(base: &str, used: &mut FxIndexSet<String>) -> String {
    if used.insert(base.to_string()) {
        return base.to_string();
    }
    let mut i = 2;
    loop {
        let candidate = format!("{base}_{i}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        i += 1;
    }
}

/// Generate a compact module name from a component's member names.
///
/// Up to the first three members are normalized and joined while the name
/// stays short; the result is capped at 40 characters. Purely cosmetic.
pub fn module_name_for_component(names: &[String]) -> String {
    let parts: Vec<String> = names
        .iter()
        .filter(|n| !n.is_empty())
        .map(|n| to_snake(n))
        .collect();
    let Some(first) = parts.first() else {
        return DEFAULT_MODULE_NAME.to_string();
    };
    let mut base = first.clone();
    for extra in parts.iter().skip(1).take(2) {
        if base.len() < 20 {
            base = format!("{base}_{extra}");
        }
    }
    if base.len() > 40 {
        base.truncate(40);
        base = base.trim_end_matches('_').to_string();
    }
    if base.is_empty() {
        DEFAULT_MODULE_NAME.to_string()
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_snake_basic() {
        assert_eq!(to_snake("MyClass"), "my_class");
        assert_eq!(to_snake("HTTPServer2"), "httpserver2");
        assert_eq!(to_snake("parse-args"), "parse_args");
        assert_eq!(to_snake("  spaced name  "), "spaced_name");
        assert_eq!(to_snake("snake_case_already"), "snake_case_already");
    }

    #[test]
    fn test_to_snake_edge_cases() {
        assert_eq!(to_snake(""), "module");
        assert_eq!(to_snake("!!!"), "module");
        assert_eq!(to_snake("3rd_party"), "m_3rd_party");
        assert_eq!(to_snake("class"), "mod_class");
        assert_eq!(to_snake("import"), "mod_import");
    }

    #[test]
    fn test_to_snake_idempotent() {
        for raw in ["MyClass", "3rd", "class", "weird--name!!x", "", "a_b_c"] {
            let once = to_snake(raw);
            assert_eq!(to_snake(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn test_unique_module_names() {
        let mut used = FxIndexSet::default();
        assert_eq!(ensure_unique_module_name("util", &mut used), "util");
        assert_eq!(ensure_unique_module_name("util", &mut used), "util_2");
        assert_eq!(ensure_unique_module_name("util", &mut used), "util_3");
        assert_eq!(ensure_unique_module_name("other", &mut used), "other");
    }

    #[test]
    fn test_module_name_for_component() {
        let names = vec!["Alpha".to_string(), "beta".to_string(), "Gamma".to_string()];
        assert_eq!(module_name_for_component(&names), "alpha_beta_gamma");

        let long = vec!["a_very_long_symbol_name_indeed".to_string(), "b".to_string()];
        let name = module_name_for_component(&long);
        assert!(name.len() <= 40);
        assert!(!name.ends_with('_'));

        assert_eq!(module_name_for_component(&[]), "module");
    }

    #[test]
    fn test_package_name_validation() {
        assert!(is_valid_package_name("http_tools"));
        assert!(!is_valid_package_name("ab"));
        assert!(!is_valid_package_name("Has-Caps"));
        assert!(!is_valid_package_name(&"x".repeat(31)));
    }
}
