//! Packing optimizer: coarsens the SCC partition under configured
//! size/count constraints.
//!
//! Merging two components is always safe for acyclicity because the union
//! lives in one file, so no heuristic here can break the split. All
//! constraints are best-effort: when no further safe merge exists the pass
//! stops silently and the configured bound simply goes unmet.

use crate::{
    components::{ComponentArena, ComponentId},
    config::SplitConfig,
    extractor::TopLevelItem,
};

/// Reserved module name for the grouped constant bindings.
pub const CONSTANTS_MODULE: &str = "constants";
/// Reserved module name for packed small components.
pub const CORE_MODULE: &str = "core";

/// Apply the packing heuristics in their fixed order.
pub fn pack_components(arena: &mut ComponentArena, items: &[TopLevelItem], config: &SplitConfig) {
    if config.group_constants {
        group_constant_components(arena, items);
    }
    if config.pack_small_lines > 0 {
        pack_small_components(arena, items, config.pack_small_lines);
    }
    if config.max_modules > 0 {
        while arena.live_count() > config.max_modules {
            if !merge_smallest_pair(arena, items) {
                break;
            }
        }
    }
    if config.min_module_lines > 0 {
        enforce_minimum_size(arena, items, config.min_module_lines);
    }
    if let Some(target) = config.target_modules
        && target > 0
    {
        while arena.live_count() > target {
            if !merge_smallest_pair(arena, items) {
                break;
            }
        }
    }
}

/// Heuristic 1: union every all-constant component into a reserved
/// `constants` component. A lone constant component stays as it is.
fn group_constant_components(arena: &mut ComponentArena, items: &[TopLevelItem]) {
    let constant_ids: Vec<ComponentId> = arena
        .live_ids()
        .into_iter()
        .filter(|&id| {
            arena
                .get(id)
                .is_some_and(|c| !c.reserved && c.is_constant_only(items))
        })
        .collect();
    merge_all(arena, &constant_ids, CONSTANTS_MODULE);
}

/// Heuristic 2: union every non-reserved, non-constant component below the
/// line threshold into a reserved `core` component.
fn pack_small_components(arena: &mut ComponentArena, items: &[TopLevelItem], threshold: usize) {
    let small_ids: Vec<ComponentId> = arena
        .live_ids()
        .into_iter()
        .filter(|&id| {
            arena.get(id).is_some_and(|c| {
                !c.reserved && !c.is_constant_only(items) && c.line_count(items) < threshold
            })
        })
        .collect();
    merge_all(arena, &small_ids, CORE_MODULE);
}

/// Merge a whole id set into one reserved component; a set of fewer than
/// two components is left untouched.
fn merge_all(arena: &mut ComponentArena, ids: &[ComponentId], reserved_name: &str) {
    let Some((&first, rest)) = ids.split_first() else {
        return;
    };
    if rest.is_empty() {
        return;
    }
    let mut merged = first;
    for &next in rest {
        merged = arena.merge(merged, next, Some(reserved_name));
    }
}

/// Merge the two smallest non-reserved components, ties broken by current
/// arena order. Returns false when fewer than two candidates remain.
fn merge_smallest_pair(arena: &mut ComponentArena, items: &[TopLevelItem]) -> bool {
    let mut movable: Vec<ComponentId> = arena
        .live_ids()
        .into_iter()
        .filter(|&id| arena.get(id).is_some_and(|c| !c.reserved))
        .collect();
    if movable.len() < 2 {
        return false;
    }
    movable.sort_by_key(|&id| arena.get(id).map_or(0, |c| c.line_count(items)));
    arena.merge(movable[0], movable[1], None);
    true
}

/// Heuristic 4: merge every undersized component with the smallest other
/// non-reserved component, to a fixed point.
fn enforce_minimum_size(arena: &mut ComponentArena, items: &[TopLevelItem], min_lines: usize) {
    loop {
        let mut movable: Vec<ComponentId> = arena
            .live_ids()
            .into_iter()
            .filter(|&id| arena.get(id).is_some_and(|c| !c.reserved))
            .collect();
        movable.sort_by_key(|&id| arena.get(id).map_or(0, |c| c.line_count(items)));

        let Some(&smallest) = movable.first() else {
            break;
        };
        if arena.get(smallest).map_or(0, |c| c.line_count(items)) >= min_lines {
            break;
        }
        let Some(&partner) = movable.get(1) else {
            break;
        };
        arena.merge(smallest, partner, None);
    }
}
