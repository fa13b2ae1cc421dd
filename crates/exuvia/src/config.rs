//! Split configuration.
//!
//! The five packing knobs plus the compact preset. Values can come from a
//! TOML file and are overridden by CLI flags; the core treats them as
//! best-effort bounds, never hard guarantees.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Constraints for the packing optimizer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SplitConfig {
    /// Union all-constant components into a reserved `constants` module.
    pub group_constants: bool,
    /// Pack components below this many lines into a reserved `core`
    /// module. Zero disables the pass.
    pub pack_small_lines: usize,
    /// Ceiling on the module count. Zero disables the pass.
    pub max_modules: usize,
    /// Floor on per-module line count. Zero disables the pass.
    pub min_module_lines: usize,
    /// Exact module count to merge down to, when reachable.
    pub target_modules: Option<usize>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            group_constants: true,
            pack_small_lines: 40,
            max_modules: 12,
            min_module_lines: 0,
            target_modules: None,
        }
    }
}

impl SplitConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Apply a compact preset (1 = low, 2 = medium, 3 = aggressive),
    /// tightening each knob only in the compacting direction.
    pub fn apply_compact(&mut self, level: u8) {
        match level {
            1 => {
                self.pack_small_lines = self.pack_small_lines.max(80);
                self.max_modules = self.max_modules.min(10);
                self.min_module_lines = self.min_module_lines.max(40);
            }
            2 => {
                self.pack_small_lines = self.pack_small_lines.max(120);
                self.max_modules = self.max_modules.min(8);
                self.min_module_lines = self.min_module_lines.max(80);
                self.target_modules = Some(self.target_modules.unwrap_or(8).min(8));
            }
            3 => {
                self.pack_small_lines = self.pack_small_lines.max(160);
                self.max_modules = self.max_modules.min(6);
                self.min_module_lines = self.min_module_lines.max(120);
                self.target_modules = Some(self.target_modules.unwrap_or(6).min(6));
            }
            _ => {}
        }
    }
}
