//! Shared type definitions for the exuvia crate.

use rustc_hash::FxBuildHasher;

/// `IndexMap` with deterministic iteration order and a fast hasher.
pub type FxIndexMap<K, V> = indexmap::IndexMap<K, V, FxBuildHasher>;

/// `IndexSet` with deterministic iteration order and a fast hasher.
pub type FxIndexSet<T> = indexmap::IndexSet<T, FxBuildHasher>;

/// Classification of a top-level item in the source file.
///
/// The kind set is closed: the renderer and the packing rules handle
/// every variant exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// `class` definition
    Class,
    /// `def` / `async def` definition
    Function,
    /// Plain or annotated assignment at module level
    Constant,
}

impl ItemKind {
    /// Check if this item is a constant binding
    pub fn is_constant(&self) -> bool {
        matches!(self, ItemKind::Constant)
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::Class => write!(f, "class"),
            ItemKind::Function => write!(f, "func"),
            ItemKind::Constant => write!(f, "assign"),
        }
    }
}
