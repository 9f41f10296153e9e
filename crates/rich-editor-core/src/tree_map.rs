//! Incrementally maintained decoration-tree cache.
//!
//! The tree map holds one [`BlockTree`] per block of the current content. Each regeneration starts
//! from the previous map and only rebuilds trees for blocks that changed, so unchanged entries keep
//! their `Arc` identity and the work per transition is proportional to the number of changed
//! blocks.

use crate::block::BlockKey;
use crate::block_tree::BlockTree;
use crate::content::{BlockMap, BlockMapDiff, ContentState};
use crate::decorator::Decorator;
use im::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Decoration tree per block key.
pub type TreeMap = HashMap<BlockKey, Arc<BlockTree>>;

/// Build trees for every block of `content`.
pub fn generate_tree_map(content: &ContentState, decorator: Option<&dyn Decorator>) -> TreeMap {
    let tree_map: TreeMap = content
        .block_map()
        .iter()
        .map(|block| {
            (
                block.key().clone(),
                Arc::new(BlockTree::generate(block, decorator)),
            )
        })
        .collect();
    trace!(blocks = tree_map.len(), "generated full tree map");
    tree_map
}

/// Rebuild trees for the blocks in `diff` and drop entries of removed blocks.
pub fn regenerate_for_new_blocks(
    previous: &TreeMap,
    diff: &BlockMapDiff,
    decorator: Option<&dyn Decorator>,
) -> TreeMap {
    let mut tree_map = without_entries(previous, diff);
    for block in &diff.updated {
        tree_map.insert(
            block.key().clone(),
            Arc::new(BlockTree::generate(block, decorator)),
        );
    }
    trace!(
        updated = diff.updated.len(),
        removed = diff.removed.len(),
        "regenerated tree map for changed blocks"
    );
    tree_map
}

/// Rebuild trees for blocks whose decorations differ between `existing` and `decorator`.
///
/// Blocks without an entry in `previous` are always built; entries for blocks missing from
/// `block_map` are dropped.
pub fn regenerate_for_new_decorator(
    block_map: &BlockMap,
    previous: &TreeMap,
    decorator: &dyn Decorator,
    existing: &dyn Decorator,
) -> TreeMap {
    let mut tree_map = previous.clone();
    let mut regenerated = 0;

    for block in block_map.iter() {
        let stale = !previous.contains_key(block.key())
            || decorator.decorations_for(block) != existing.decorations_for(block);
        if stale {
            tree_map.insert(
                block.key().clone(),
                Arc::new(BlockTree::generate(block, Some(decorator))),
            );
            regenerated += 1;
        }
    }

    if tree_map.len() != block_map.len() {
        let removed: Vec<BlockKey> = tree_map
            .keys()
            .filter(|key| !block_map.contains_key(key))
            .cloned()
            .collect();
        for key in &removed {
            tree_map.remove(key);
        }
    }

    trace!(regenerated, "regenerated tree map for new decorator");
    tree_map
}

/// `previous` without the entries of updated and removed blocks.
pub(crate) fn without_entries(previous: &TreeMap, diff: &BlockMapDiff) -> TreeMap {
    let mut tree_map = previous.clone();
    for key in diff
        .removed
        .iter()
        .chain(diff.updated.iter().map(|block| block.key()))
    {
        tree_map.remove(key);
    }
    tree_map
}
