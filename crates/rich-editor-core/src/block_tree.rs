//! Per-block decoration trees.
//!
//! A [`BlockTree`] splits a block into runs with the same decoration key, and each run into leaves
//! with identical character metadata. Renderers walk it to emit one node per leaf.

use crate::block::ContentBlock;
use crate::decorator::{DecorationKey, Decorator};

/// A run of characters with identical metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafRange {
    /// Start offset (inclusive).
    pub start: usize,
    /// End offset (exclusive).
    pub end: usize,
}

/// A run of characters sharing one decoration key (or no decoration).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratorRange {
    /// Start offset (inclusive).
    pub start: usize,
    /// End offset (exclusive).
    pub end: usize,
    /// Decoration covering the range, if any.
    pub decoration_key: Option<DecorationKey>,
    /// Leaves covering `start..end`, in order.
    pub leaves: Vec<LeafRange>,
}

/// Decoration tree of one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTree {
    ranges: Vec<DecoratorRange>,
}

impl BlockTree {
    /// Build the tree for `block` under `decorator`.
    ///
    /// An empty block yields a single empty range holding a single empty leaf.
    pub fn generate(block: &ContentBlock, decorator: Option<&dyn Decorator>) -> Self {
        let len = block.len();
        if len == 0 {
            return Self {
                ranges: vec![DecoratorRange {
                    start: 0,
                    end: 0,
                    decoration_key: None,
                    leaves: vec![LeafRange { start: 0, end: 0 }],
                }],
            };
        }

        let decorations = decorator
            .map(|decorator| decorator.decorations_for(block))
            .unwrap_or_default();
        let decoration_at = |offset: usize| decorations.get(offset).copied().flatten();

        let characters = block.characters();
        let mut ranges = Vec::new();
        find_ranges(len, |a, b| decoration_at(a) == decoration_at(b), |start, end| {
            let mut leaves = Vec::new();
            find_ranges(
                end - start,
                |a, b| characters.get(start + a) == characters.get(start + b),
                |leaf_start, leaf_end| {
                    leaves.push(LeafRange {
                        start: start + leaf_start,
                        end: start + leaf_end,
                    })
                },
            );
            ranges.push(DecoratorRange {
                start,
                end,
                decoration_key: decoration_at(start),
                leaves,
            });
        });

        Self { ranges }
    }

    /// Decorated/undecorated ranges in order.
    pub fn ranges(&self) -> &[DecoratorRange] {
        &self.ranges
    }

    /// Total number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.ranges.iter().map(|range| range.leaves.len()).sum()
    }
}

/// Emit maximal runs `start..end` over `0..len` where adjacent indices compare equal.
fn find_ranges(
    len: usize,
    same: impl Fn(usize, usize) -> bool,
    mut emit: impl FnMut(usize, usize),
) {
    if len == 0 {
        return;
    }
    let mut start = 0;
    for index in 1..len {
        if !same(index - 1, index) {
            emit(start, index);
            start = index;
        }
    }
    emit(start, len);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockType, CharacterMetadata, InlineStyle};
    use crate::decorator::{CompositeDecorator, FnStrategy};
    use im::Vector;

    #[test]
    fn test_empty_block_has_single_empty_leaf() {
        let block = ContentBlock::new("a", BlockType::Unstyled, "");
        let tree = BlockTree::generate(&block, None);
        assert_eq!(tree.ranges().len(), 1);
        assert_eq!(tree.ranges()[0].leaves, vec![LeafRange { start: 0, end: 0 }]);
    }

    #[test]
    fn test_leaves_follow_metadata_runs() {
        let bold = CharacterMetadata::styled(InlineStyle::of([InlineStyle::BOLD]));
        let plain = CharacterMetadata::default();
        let characters: Vector<CharacterMetadata> =
            [plain.clone(), bold.clone(), bold, plain].into_iter().collect();
        let block = ContentBlock::from_parts("a", BlockType::Unstyled, "abcd", characters);

        let tree = BlockTree::generate(&block, None);
        assert_eq!(tree.ranges().len(), 1);
        assert_eq!(
            tree.ranges()[0].leaves,
            vec![
                LeafRange { start: 0, end: 1 },
                LeafRange { start: 1, end: 3 },
                LeafRange { start: 3, end: 4 },
            ]
        );
    }

    #[test]
    fn test_decorated_ranges_are_split() {
        let decorator = CompositeDecorator::default().with_strategy(FnStrategy::new(
            "word",
            |block: &ContentBlock, found: &mut dyn FnMut(usize, usize)| {
                if let Some(start) = block.text().find("cd") {
                    found(start, start + 2);
                }
            },
        ));
        let block = ContentBlock::new("a", BlockType::Unstyled, "abcdef");
        let tree = BlockTree::generate(&block, Some(&decorator));

        let ranges: Vec<(usize, usize, bool)> = tree
            .ranges()
            .iter()
            .map(|r| (r.start, r.end, r.decoration_key.is_some()))
            .collect();
        assert_eq!(ranges, vec![(0, 2, false), (2, 4, true), (4, 6, false)]);
        assert_eq!(tree.leaf_count(), 3);
    }
}
