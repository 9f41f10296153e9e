//! Content snapshots.
//!
//! A [`ContentState`] is an immutable snapshot of the document: an ordered [`BlockMap`] plus the
//! selections recorded immediately before and after the edit that produced it. Snapshots are
//! cheap handles; two handles are "the same content" exactly when [`ContentState::ptr_eq`] holds.
//!
//! The block map is persistent: replacing one block produces a new map that shares every other
//! block (and most of the index structure) with its predecessor. Derived caches rely on this and
//! use [`BlockMap::diff`] to find the blocks that actually changed.

use crate::block::{BlockKey, BlockType, ContentBlock};
use crate::selection::SelectionState;
use im::{HashMap, HashSet, Vector};
use std::fmt;
use std::sync::Arc;

/// Ordered, persistent collection of blocks keyed by [`BlockKey`].
#[derive(Clone, Default)]
pub struct BlockMap {
    order: Vector<BlockKey>,
    blocks: HashMap<BlockKey, Arc<ContentBlock>>,
}

/// Blocks that differ between two block maps.
#[derive(Debug, Clone, Default)]
pub struct BlockMapDiff {
    /// Blocks that are new, or not reference-identical to the previous block with the same key.
    pub updated: Vec<Arc<ContentBlock>>,
    /// Keys present in the previous map but not in the new one.
    pub removed: Vec<BlockKey>,
}

impl BlockMapDiff {
    /// Returns `true` if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.removed.is_empty()
    }
}

impl BlockMap {
    /// Create an empty block map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a block map from blocks in document order.
    ///
    /// A later block with a key already present replaces the earlier one in place.
    pub fn from_blocks<I>(blocks: I) -> Self
    where
        I: IntoIterator<Item = Arc<ContentBlock>>,
    {
        let mut map = Self::new();
        for block in blocks {
            if !map.blocks.contains_key(block.key()) {
                map.order.push_back(block.key().clone());
            }
            map.blocks.insert(block.key().clone(), block);
        }
        map
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if there are no blocks.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Look up a block by key.
    pub fn get(&self, key: &BlockKey) -> Option<&Arc<ContentBlock>> {
        self.blocks.get(key)
    }

    /// Returns `true` if a block with `key` exists.
    pub fn contains_key(&self, key: &BlockKey) -> bool {
        self.blocks.contains_key(key)
    }

    /// First block in document order.
    pub fn first(&self) -> Option<&Arc<ContentBlock>> {
        self.order.front().and_then(|key| self.blocks.get(key))
    }

    /// Last block in document order.
    pub fn last(&self) -> Option<&Arc<ContentBlock>> {
        self.order.back().and_then(|key| self.blocks.get(key))
    }

    /// Position of `key` in document order.
    pub fn index_of(&self, key: &BlockKey) -> Option<usize> {
        self.order.index_of(key)
    }

    /// The block immediately before `key`.
    pub fn block_before(&self, key: &BlockKey) -> Option<&Arc<ContentBlock>> {
        let index = self.index_of(key)?;
        let previous = self.order.get(index.checked_sub(1)?)?;
        self.blocks.get(previous)
    }

    /// The block immediately after `key`.
    pub fn block_after(&self, key: &BlockKey) -> Option<&Arc<ContentBlock>> {
        let index = self.index_of(key)?;
        let next = self.order.get(index + 1)?;
        self.blocks.get(next)
    }

    /// Blocks in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ContentBlock>> + '_ {
        self.order.iter().filter_map(|key| self.blocks.get(key))
    }

    /// Keys in document order.
    pub fn keys(&self) -> impl Iterator<Item = &BlockKey> + '_ {
        self.order.iter()
    }

    /// Blocks from `start` to `end` inclusive, in document order.
    ///
    /// Empty if either key is missing or `end` precedes `start`.
    pub fn range(&self, start: &BlockKey, end: &BlockKey) -> Vec<Arc<ContentBlock>> {
        let (Some(start), Some(end)) = (self.index_of(start), self.index_of(end)) else {
            return Vec::new();
        };
        if end < start {
            return Vec::new();
        }
        self.order
            .iter()
            .skip(start)
            .take(end - start + 1)
            .filter_map(|key| self.blocks.get(key).cloned())
            .collect()
    }

    /// Returns `true` if both maps share the same block storage in the same order.
    pub fn ptr_eq(&self, other: &BlockMap) -> bool {
        // Small vectors are stored inline, so `Vector::ptr_eq` is false even for clones.
        self.blocks.ptr_eq(&other.blocks)
            && (self.order.ptr_eq(&other.order) || self.order == other.order)
    }

    /// Compare this map against `previous` by block identity.
    pub fn diff(&self, previous: &BlockMap) -> BlockMapDiff {
        if self.ptr_eq(previous) {
            return BlockMapDiff::default();
        }

        let updated = self
            .iter()
            .filter(|block| {
                previous
                    .get(block.key())
                    .is_none_or(|old| !Arc::ptr_eq(old, block))
            })
            .cloned()
            .collect();
        let removed = previous
            .keys()
            .filter(|key| !self.contains_key(key))
            .cloned()
            .collect();

        BlockMapDiff { updated, removed }
    }

    /// A copy with `block` replacing the block that has the same key.
    ///
    /// If no block has that key, it is appended at the end.
    pub fn with_block(&self, block: Arc<ContentBlock>) -> Self {
        let mut map = self.clone();
        if !map.blocks.contains_key(block.key()) {
            map.order.push_back(block.key().clone());
        }
        map.blocks.insert(block.key().clone(), block);
        map
    }

    /// A copy with `blocks` inserted right after `after`, in order.
    ///
    /// Appends at the end when `after` is not present.
    pub fn insert_after<I>(&self, after: &BlockKey, blocks: I) -> Self
    where
        I: IntoIterator<Item = Arc<ContentBlock>>,
    {
        let mut map = self.clone();
        let mut index = map.index_of(after).map_or(map.order.len(), |i| i + 1);
        for block in blocks {
            if map.blocks.contains_key(block.key()) {
                map.blocks.insert(block.key().clone(), block);
                continue;
            }
            map.order.insert(index, block.key().clone());
            map.blocks.insert(block.key().clone(), block);
            index += 1;
        }
        map
    }

    /// A copy without the given keys.
    pub fn without<'a, I>(&self, keys: I) -> Self
    where
        I: IntoIterator<Item = &'a BlockKey>,
    {
        let mut map = self.clone();
        let mut removed = HashSet::new();
        for key in keys {
            if map.blocks.remove(key).is_some() {
                removed.insert(key.clone());
            }
        }
        if !removed.is_empty() {
            map.order.retain(|key| !removed.contains(key));
        }
        map
    }
}

impl fmt::Debug for BlockMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[derive(Clone)]
struct ContentInner {
    block_map: BlockMap,
    selection_before: SelectionState,
    selection_after: SelectionState,
}

/// Immutable snapshot of the document.
///
/// Always contains at least one block.
#[derive(Clone)]
pub struct ContentState {
    inner: Arc<ContentInner>,
}

impl ContentState {
    /// Content with one `unstyled` block per line of `text` (`\n`, `\r\n`, or `\r` separated).
    pub fn create_from_text(text: &str) -> Self {
        let mut blocks: Vec<Arc<ContentBlock>> = Vec::new();
        let mut taken: HashSet<BlockKey> = HashSet::new();
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        for line in normalized.split('\n') {
            let key = BlockKey::generate_unique(|k| taken.contains(k));
            taken.insert(key.clone());
            blocks.push(Arc::new(ContentBlock::new(key, BlockType::Unstyled, line)));
        }
        Self::from_block_map(BlockMap::from_blocks(blocks))
    }

    /// Content built from blocks in document order.
    ///
    /// An empty input yields a single empty `unstyled` block.
    pub fn create_from_blocks<I>(blocks: I) -> Self
    where
        I: IntoIterator<Item = ContentBlock>,
    {
        let map = BlockMap::from_blocks(blocks.into_iter().map(Arc::new));
        if map.is_empty() {
            return Self::create_from_text("");
        }
        Self::from_block_map(map)
    }

    fn from_block_map(block_map: BlockMap) -> Self {
        let first_key = block_map
            .first()
            .map(|block| block.key().clone())
            .unwrap_or_else(|| BlockKey::generate_unique(|_| false));
        let selection = SelectionState::create_empty(first_key);
        Self {
            inner: Arc::new(ContentInner {
                block_map,
                selection_before: selection.clone(),
                selection_after: selection,
            }),
        }
    }

    /// Returns `true` if both handles refer to the same snapshot.
    pub fn ptr_eq(&self, other: &ContentState) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The ordered block map.
    pub fn block_map(&self) -> &BlockMap {
        &self.inner.block_map
    }

    /// Selection before the edit that produced this snapshot.
    pub fn selection_before(&self) -> &SelectionState {
        &self.inner.selection_before
    }

    /// Selection after the edit that produced this snapshot.
    pub fn selection_after(&self) -> &SelectionState {
        &self.inner.selection_after
    }

    /// Look up a block by key.
    pub fn block_for_key(&self, key: &BlockKey) -> Option<&Arc<ContentBlock>> {
        self.inner.block_map.get(key)
    }

    /// First block in document order.
    pub fn first_block(&self) -> &Arc<ContentBlock> {
        self.inner
            .block_map
            .first()
            .expect("content always has at least one block")
    }

    /// Last block in document order.
    pub fn last_block(&self) -> &Arc<ContentBlock> {
        self.inner
            .block_map
            .last()
            .expect("content always has at least one block")
    }

    /// The block immediately before `key`.
    pub fn block_before(&self, key: &BlockKey) -> Option<&Arc<ContentBlock>> {
        self.inner.block_map.block_before(key)
    }

    /// The block immediately after `key`.
    pub fn block_after(&self, key: &BlockKey) -> Option<&Arc<ContentBlock>> {
        self.inner.block_map.block_after(key)
    }

    /// Returns `true` if the document contains any text or more than one block.
    pub fn has_text(&self) -> bool {
        self.inner.block_map.len() > 1 || !self.first_block().is_empty()
    }

    /// Document text with blocks joined by `\n`.
    pub fn plain_text(&self) -> String {
        self.inner
            .block_map
            .iter()
            .map(|block| block.text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// A fresh block key that no block in this content uses.
    pub fn generate_key(&self) -> BlockKey {
        BlockKey::generate_unique(|key| self.inner.block_map.contains_key(key))
    }

    /// A new snapshot with a different block map.
    ///
    /// An empty map is rejected and the current map is kept.
    pub fn with_block_map(&self, block_map: BlockMap) -> Self {
        if block_map.is_empty() {
            return self.clone();
        }
        self.updated(|inner| inner.block_map = block_map)
    }

    /// A new snapshot with a different pre-edit selection.
    pub fn with_selection_before(&self, selection: SelectionState) -> Self {
        self.updated(|inner| inner.selection_before = selection)
    }

    /// A new snapshot with a different post-edit selection.
    pub fn with_selection_after(&self, selection: SelectionState) -> Self {
        self.updated(|inner| inner.selection_after = selection)
    }

    fn updated(&self, f: impl FnOnce(&mut ContentInner)) -> Self {
        let mut inner = (*self.inner).clone();
        f(&mut inner);
        Self {
            inner: Arc::new(inner),
        }
    }
}

impl fmt::Debug for ContentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentState")
            .field("block_map", &self.inner.block_map)
            .field("selection_before", &self.inner.selection_before)
            .field("selection_after", &self.inner.selection_after)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(key: &str, text: &str) -> Arc<ContentBlock> {
        Arc::new(ContentBlock::new(key, BlockType::Unstyled, text))
    }

    #[test]
    fn test_create_from_text_splits_lines() {
        let content = ContentState::create_from_text("one\r\ntwo\nthree");
        let texts: Vec<&str> = content.block_map().iter().map(|b| b.text()).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
        assert_eq!(content.plain_text(), "one\ntwo\nthree");
        assert_eq!(
            content.selection_after().anchor_key,
            content.first_block().key().clone()
        );
    }

    #[test]
    fn test_empty_content_has_one_block() {
        let content = ContentState::create_from_blocks(Vec::new());
        assert_eq!(content.block_map().len(), 1);
        assert!(!content.has_text());
    }

    #[test]
    fn test_neighbours() {
        let map = BlockMap::from_blocks([block("a", "1"), block("b", "2"), block("c", "3")]);
        assert_eq!(map.block_before(&"b".into()).map(|b| b.text()), Some("1"));
        assert_eq!(map.block_after(&"b".into()).map(|b| b.text()), Some("3"));
        assert!(map.block_before(&"a".into()).is_none());
        assert!(map.block_after(&"c".into()).is_none());
        assert_eq!(map.range(&"a".into(), &"b".into()).len(), 2);
        assert!(map.range(&"c".into(), &"a".into()).is_empty());
    }

    #[test]
    fn test_diff_reports_replaced_added_and_removed() {
        let map = BlockMap::from_blocks([block("a", "1"), block("b", "2"), block("c", "3")]);
        assert!(map.diff(&map.clone()).is_empty());

        let edited = map
            .with_block(block("b", "22"))
            .insert_after(&"c".into(), [block("d", "4")])
            .without([&BlockKey::from("a")]);

        let diff = edited.diff(&map);
        let updated: Vec<&str> = diff.updated.iter().map(|b| b.key().as_str()).collect();
        assert_eq!(updated, vec!["b", "d"]);
        assert_eq!(diff.removed, vec![BlockKey::from("a")]);
        assert_eq!(
            edited.keys().map(BlockKey::as_str).collect::<Vec<_>>(),
            vec!["b", "c", "d"]
        );
    }

    #[test]
    fn test_with_block_shares_untouched_blocks() {
        let map = BlockMap::from_blocks([block("a", "1"), block("b", "2")]);
        let edited = map.with_block(block("b", "3"));
        assert!(Arc::ptr_eq(
            map.get(&"a".into()).unwrap(),
            edited.get(&"a".into()).unwrap()
        ));
        assert!(!edited.ptr_eq(&map));
    }

    #[test]
    fn test_selection_stamps_create_new_snapshot() {
        let content = ContentState::create_from_text("abc");
        let key = content.first_block().key().clone();
        let stamped = content.with_selection_before(SelectionState::collapsed(key, 2));
        assert!(!stamped.ptr_eq(&content));
        assert!(stamped.block_map().ptr_eq(content.block_map()));
        assert_eq!(stamped.selection_before().anchor_offset, 2);
    }
}
