//! Batch-mode discovery of Python files under a directory tree.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

/// Glob patterns excluded when `--ignore-tests` is set.
const TEST_PATTERNS: &[&str] = &[
    "tests/**",
    "test_*.py",
    "*_test.py",
    "**/tests/**",
    "**/test/**",
];

/// Filters applied while scanning a directory for split candidates.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    pub recursive: bool,
    /// Include globs; empty means `*.py`.
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub ignore_tests: bool,
    /// Skip files with fewer lines than this. Zero disables the filter.
    pub min_lines: usize,
}

/// Find Python files under `root` according to the options.
///
/// `__init__.py` files are always skipped. Results are sorted by path for
/// deterministic batch order.
pub fn discover_python_files(root: &Path, options: &DiscoveryOptions) -> Result<Vec<PathBuf>> {
    let default_include = ["*.py".to_string()];
    let include_patterns: &[String] = if options.include.is_empty() {
        &default_include
    } else {
        &options.include
    };
    let include = build_globset(include_patterns)?;
    let mut exclude_patterns = options.exclude.clone();
    if options.ignore_tests {
        exclude_patterns.extend(TEST_PATTERNS.iter().map(|p| (*p).to_string()));
    }
    exclude_patterns.dedup();
    let exclude = build_globset(&exclude_patterns)?;

    let max_depth = if options.recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();
    for entry in WalkDir::new(root).max_depth(max_depth) {
        let entry = entry.with_context(|| format!("failed to scan {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let file_name = entry.file_name().to_string_lossy();
        if file_name == "__init__.py" {
            continue;
        }
        let relative = path.strip_prefix(root).unwrap_or(path);
        if !include.is_match(relative) && !include.is_match(file_name.as_ref()) {
            continue;
        }
        if exclude.is_match(relative) || exclude.is_match(file_name.as_ref()) {
            continue;
        }
        if options.min_lines > 0 {
            match std::fs::read_to_string(path) {
                Ok(text) if text.lines().count() < options.min_lines => continue,
                Ok(_) => {}
                Err(err) => {
                    log::warn!("skipping unreadable file {}: {err}", path.display());
                    continue;
                }
            }
        }
        files.push(path.to_path_buf());
    }
    files.sort();
    Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("invalid glob {pattern:?}"))?);
    }
    builder.build().context("failed to build glob set")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path, contents: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_discover_skips_init_and_tests() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("app.py"), "x = 1\n");
        touch(&root.join("__init__.py"), "");
        touch(&root.join("tests/test_app.py"), "x = 1\n");
        touch(&root.join("sub/util.py"), "x = 1\n");

        let options = DiscoveryOptions {
            recursive: true,
            ignore_tests: true,
            ..DiscoveryOptions::default()
        };
        let files = discover_python_files(root, &options).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["app.py".to_string(), "sub/util.py".to_string()]);
    }

    #[test]
    fn test_non_recursive_stays_at_top_level() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("top.py"), "x = 1\n");
        touch(&root.join("sub/nested.py"), "x = 1\n");

        let files = discover_python_files(root, &DiscoveryOptions::default()).unwrap();
        assert_eq!(files, vec![root.join("top.py")]);
    }

    #[test]
    fn test_min_lines_filter() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("short.py"), "x = 1\n");
        touch(&root.join("long.py"), &"x = 1\n".repeat(10));

        let options = DiscoveryOptions {
            min_lines: 5,
            ..DiscoveryOptions::default()
        };
        let files = discover_python_files(root, &options).unwrap();
        assert_eq!(files, vec![root.join("long.py")]);
    }
}
