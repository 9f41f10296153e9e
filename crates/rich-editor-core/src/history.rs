//! Undo/redo ledger.
//!
//! History is a pair of persistent stacks of whole content snapshots. Because snapshots share
//! unchanged blocks, keeping a snapshot per undo step costs roughly the size of the blocks the
//! step touched.
//!
//! Whether an edit starts a new undo step is decided by [`must_become_boundary`]: consecutive
//! character-level edits of the same kind coalesce into one step, everything else opens a new one.

use crate::content::ContentState;
use crate::error::ParseChangeTypeError;
use im::Vector;
use std::fmt;
use std::str::FromStr;

/// Kind of a content-changing transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    /// Typed characters were inserted.
    InsertCharacters,
    /// One character (grapheme) before the caret was removed.
    BackspaceCharacter,
    /// One character (grapheme) after the caret was removed.
    DeleteCharacter,
    /// A fragment (paste, drop) was inserted.
    InsertFragment,
    /// A selected range was removed.
    RemoveRange,
    /// Block types changed.
    ChangeBlockType,
    /// Inline styles changed.
    ChangeInlineStyle,
    /// A block was split in two.
    SplitBlock,
    /// An undo step was applied.
    Undo,
    /// A redo step was applied.
    Redo,
    /// A spellcheck correction was applied.
    SpellcheckChange,
    /// Block depth (list indentation) changed.
    AdjustDepth,
}

impl ChangeType {
    /// Every change type.
    pub const ALL: [ChangeType; 12] = [
        ChangeType::InsertCharacters,
        ChangeType::BackspaceCharacter,
        ChangeType::DeleteCharacter,
        ChangeType::InsertFragment,
        ChangeType::RemoveRange,
        ChangeType::ChangeBlockType,
        ChangeType::ChangeInlineStyle,
        ChangeType::SplitBlock,
        ChangeType::Undo,
        ChangeType::Redo,
        ChangeType::SpellcheckChange,
        ChangeType::AdjustDepth,
    ];

    /// Stable kebab-case name (e.g. `"insert-characters"`).
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeType::InsertCharacters => "insert-characters",
            ChangeType::BackspaceCharacter => "backspace-character",
            ChangeType::DeleteCharacter => "delete-character",
            ChangeType::InsertFragment => "insert-fragment",
            ChangeType::RemoveRange => "remove-range",
            ChangeType::ChangeBlockType => "change-block-type",
            ChangeType::ChangeInlineStyle => "change-inline-style",
            ChangeType::SplitBlock => "split-block",
            ChangeType::Undo => "undo",
            ChangeType::Redo => "redo",
            ChangeType::SpellcheckChange => "spellcheck-change",
            ChangeType::AdjustDepth => "adjust-depth",
        }
    }

    /// Returns `true` for the character-granularity edits that may coalesce.
    pub fn is_character_edit(self) -> bool {
        matches!(
            self,
            ChangeType::InsertCharacters
                | ChangeType::BackspaceCharacter
                | ChangeType::DeleteCharacter
        )
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeType {
    type Err = ParseChangeTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChangeType::ALL
            .into_iter()
            .find(|change| change.as_str() == s)
            .ok_or_else(|| ParseChangeTypeError(s.to_string()))
    }
}

/// Returns `true` if a `change` following `last` must start a new undo step.
///
/// Only an uninterrupted run of the same character-level edit is continuous.
pub fn must_become_boundary(last: Option<ChangeType>, change: ChangeType) -> bool {
    last != Some(change) || !change.is_character_edit()
}

/// Persistent stack of content snapshots; the most recent entry is on top.
#[derive(Clone, Default)]
pub struct ContentStack(Vector<ContentState>);

impl ContentStack {
    /// An empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// The top (most recent) snapshot.
    pub fn peek(&self) -> Option<&ContentState> {
        self.0.front()
    }

    /// A new stack with `content` on top.
    pub fn push(&self, content: ContentState) -> Self {
        let mut stack = self.0.clone();
        stack.push_front(content);
        Self(stack)
    }

    /// The top snapshot and the stack without it.
    pub fn pop(&self) -> Option<(ContentState, ContentStack)> {
        let mut stack = self.0.clone();
        let top = stack.pop_front()?;
        Some((top, Self(stack)))
    }

    /// Number of snapshots.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Snapshots from most to least recent.
    pub fn iter(&self) -> impl Iterator<Item = &ContentState> + '_ {
        self.0.iter()
    }
}

impl fmt::Debug for ContentStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentStack")
            .field("len", &self.0.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_character_edit_coalesces() {
        for change in [
            ChangeType::InsertCharacters,
            ChangeType::BackspaceCharacter,
            ChangeType::DeleteCharacter,
        ] {
            assert!(!must_become_boundary(Some(change), change));
        }
    }

    #[test]
    fn test_switching_character_edit_breaks() {
        assert!(must_become_boundary(
            Some(ChangeType::InsertCharacters),
            ChangeType::BackspaceCharacter
        ));
        assert!(must_become_boundary(
            Some(ChangeType::DeleteCharacter),
            ChangeType::InsertCharacters
        ));
        assert!(must_become_boundary(None, ChangeType::InsertCharacters));
    }

    #[test]
    fn test_non_character_edits_always_break() {
        for change in ChangeType::ALL.into_iter().filter(|c| !c.is_character_edit()) {
            assert!(must_become_boundary(Some(change), change), "{change}");
            assert!(must_become_boundary(Some(ChangeType::Undo), change), "{change}");
        }
    }

    #[test]
    fn test_change_type_names_round_trip() {
        for change in ChangeType::ALL {
            assert_eq!(change.as_str().parse::<ChangeType>(), Ok(change));
        }
        assert_eq!(
            "paste".parse::<ChangeType>(),
            Err(ParseChangeTypeError("paste".to_string()))
        );
    }

    #[test]
    fn test_stack_is_persistent() {
        let a = ContentState::create_from_text("a");
        let b = ContentState::create_from_text("b");

        let empty = ContentStack::new();
        let one = empty.push(a.clone());
        let two = one.push(b.clone());

        assert!(empty.is_empty());
        assert_eq!(one.len(), 1);
        assert!(two.peek().unwrap().ptr_eq(&b));

        let (top, rest) = two.pop().unwrap();
        assert!(top.ptr_eq(&b));
        assert!(rest.peek().unwrap().ptr_eq(&a));
        assert_eq!(two.len(), 2);
        assert!(empty.pop().is_none());
    }
}
