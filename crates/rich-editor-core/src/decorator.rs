//! Decorator plug-in.
//!
//! A decorator assigns an optional [`DecorationKey`] to every character of a block (links,
//! hashtags, mentions, ...). The editor state never interprets those keys: it only compares the
//! output of two decorators to decide which blocks need a new decoration tree.

use crate::block::ContentBlock;
use std::fmt;

/// Identifies one decorated range: the strategy that matched and its occurrence within the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DecorationKey {
    /// Index of the strategy in its [`CompositeDecorator`].
    pub strategy: usize,
    /// Zero-based occurrence of the strategy within the block.
    pub occurrence: usize,
}

impl fmt::Display for DecorationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.strategy, self.occurrence)
    }
}

/// One entry per character of a block.
pub type Decorations = Vec<Option<DecorationKey>>;

/// Computes per-character decorations for a block.
pub trait Decorator: fmt::Debug + Send + Sync {
    /// Decorations for `block`; must hold exactly `block.len()` entries.
    fn decorations_for(&self, block: &ContentBlock) -> Decorations;
}

/// Finds decorated ranges within a block.
pub trait DecoratorStrategy: fmt::Debug + Send + Sync {
    /// Report each matching half-open character range `start..end` through `found`.
    fn find_ranges(&self, block: &ContentBlock, found: &mut dyn FnMut(usize, usize));
}

/// A [`DecoratorStrategy`] backed by a closure.
pub struct FnStrategy<F> {
    name: &'static str,
    find: F,
}

impl<F> FnStrategy<F>
where
    F: Fn(&ContentBlock, &mut dyn FnMut(usize, usize)) + Send + Sync,
{
    /// Wrap `find`; `name` only appears in debug output.
    pub fn new(name: &'static str, find: F) -> Self {
        Self { name, find }
    }
}

impl<F> fmt::Debug for FnStrategy<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStrategy").field("name", &self.name).finish()
    }
}

impl<F> DecoratorStrategy for FnStrategy<F>
where
    F: Fn(&ContentBlock, &mut dyn FnMut(usize, usize)) + Send + Sync,
{
    fn find_ranges(&self, block: &ContentBlock, found: &mut dyn FnMut(usize, usize)) {
        (self.find)(block, found)
    }
}

/// A decorator composed of ordered strategies.
///
/// Strategies run in order; a range is only claimed when none of its characters were claimed by
/// an earlier range, so earlier strategies win overlaps.
#[derive(Debug, Default)]
pub struct CompositeDecorator {
    strategies: Vec<Box<dyn DecoratorStrategy>>,
}

impl CompositeDecorator {
    /// Create a decorator from strategies.
    pub fn new(strategies: Vec<Box<dyn DecoratorStrategy>>) -> Self {
        Self { strategies }
    }

    /// Append a strategy.
    pub fn with_strategy(mut self, strategy: impl DecoratorStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Number of strategies.
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Returns `true` if there are no strategies.
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Decorator for CompositeDecorator {
    fn decorations_for(&self, block: &ContentBlock) -> Decorations {
        let len = block.len();
        let mut decorations: Decorations = vec![None; len];

        for (strategy_index, strategy) in self.strategies.iter().enumerate() {
            let mut occurrence = 0;
            strategy.find_ranges(block, &mut |start, end| {
                let end = end.min(len);
                if start >= end {
                    return;
                }
                let slots = &mut decorations[start..end];
                if slots.iter().any(Option::is_some) {
                    return;
                }
                let key = DecorationKey {
                    strategy: strategy_index,
                    occurrence,
                };
                slots.fill(Some(key));
                occurrence += 1;
            });
        }

        decorations
    }
}
