//! Block text direction.
//!
//! Each block gets an intrinsic direction from its first strong character. A block without strong
//! characters is [`Direction::Neutral`] and resolves to the direction of the block before it; the
//! document starts out left-to-right.

use crate::block::{BlockKey, ContentBlock};
use crate::content::ContentState;
use im::HashMap;
use std::sync::Arc;
use tracing::trace;
use unicode_bidi::{BidiClass, bidi_class};

/// Text direction of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Left-to-right.
    #[default]
    Ltr,
    /// Right-to-left.
    Rtl,
    /// No strong character.
    Neutral,
}

impl Direction {
    /// Direction of the first strong character in `text`, or [`Direction::Neutral`].
    pub fn of_text(text: &str) -> Self {
        text.chars()
            .find_map(|c| match bidi_class(c) {
                BidiClass::L => Some(Direction::Ltr),
                BidiClass::R | BidiClass::AL => Some(Direction::Rtl),
                _ => None,
            })
            .unwrap_or(Direction::Neutral)
    }

    /// Returns `true` for [`Direction::Rtl`].
    pub fn is_rtl(self) -> bool {
        self == Direction::Rtl
    }
}

#[derive(Debug, Clone)]
struct DirectionEntry {
    block: Arc<ContentBlock>,
    intrinsic: Direction,
    resolved: Direction,
}

/// Resolved direction per block key.
///
/// Entries remember the block they were computed from, so recomputing against a new content
/// snapshot only rescans blocks that were replaced.
#[derive(Debug, Clone, Default)]
pub struct DirectionMap {
    entries: HashMap<BlockKey, DirectionEntry>,
}

impl DirectionMap {
    /// Compute directions for `content`, reusing entries of `previous` for unchanged blocks.
    ///
    /// Returns a clone of `previous` (sharing its storage) when no resolved direction changed and
    /// no block was added, replaced, or removed.
    pub fn compute(content: &ContentState, previous: Option<&DirectionMap>) -> Self {
        let mut entries = previous.map(|map| map.entries.clone()).unwrap_or_default();
        let mut changed = previous.is_none();
        let mut rescanned = 0usize;
        let mut prev_resolved = Direction::Ltr;

        for block in content.block_map().iter() {
            let cached = previous
                .and_then(|map| map.entries.get(block.key()))
                .filter(|entry| Arc::ptr_eq(&entry.block, block));

            let intrinsic = match cached {
                Some(entry) => entry.intrinsic,
                None => {
                    rescanned += 1;
                    Direction::of_text(block.text())
                }
            };
            let resolved = match intrinsic {
                Direction::Neutral => prev_resolved,
                strong => strong,
            };

            if cached.is_none_or(|entry| entry.resolved != resolved) {
                changed = true;
                entries.insert(
                    block.key().clone(),
                    DirectionEntry {
                        block: Arc::clone(block),
                        intrinsic,
                        resolved,
                    },
                );
            }
            prev_resolved = resolved;
        }

        if entries.len() > content.block_map().len() {
            changed = true;
            let stale: Vec<BlockKey> = entries
                .keys()
                .filter(|key| !content.block_map().contains_key(key))
                .cloned()
                .collect();
            for key in &stale {
                entries.remove(key);
            }
        }

        trace!(rescanned, changed, "computed direction map");
        match previous {
            Some(previous) if !changed => previous.clone(),
            _ => Self { entries },
        }
    }

    /// Resolved direction of the block with `key`.
    pub fn get(&self, key: &BlockKey) -> Option<Direction> {
        self.entries.get(key).map(|entry| entry.resolved)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if `key` has an entry.
    pub fn contains_key(&self, key: &BlockKey) -> bool {
        self.entries.contains_key(key)
    }

    /// `(key, resolved direction)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&BlockKey, Direction)> + '_ {
        self.entries.iter().map(|(key, entry)| (key, entry.resolved))
    }

    /// Returns `true` if both maps share the same underlying storage.
    pub fn ptr_eq(&self, other: &DirectionMap) -> bool {
        self.entries.ptr_eq(&other.entries)
    }
}
