//! Edit Command Interface
//!
//! Editor-level commands (typing, deletion, block and inline formatting, history) applied to an
//! [`EditorState`]. Each command runs the matching [`modifier`](crate::modifier) transform on the
//! current selection and pushes the result with the change type that governs undo grouping.
//!
//! # Example
//!
//! ```rust
//! use rich_editor_core::{EditCommand, EditorState, InlineStyle};
//!
//! let state = EditorState::create_empty(None)
//!     .execute(EditCommand::ToggleInlineStyle(InlineStyle::BOLD.to_string()))
//!     .unwrap()
//!     .execute(EditCommand::InsertText("Hi".to_string()))
//!     .unwrap();
//!
//! let block = state.current_content().first_block();
//! assert!(block.inline_style_at(0).contains(InlineStyle::BOLD));
//! ```

use crate::block::{BlockType, ContentBlock};
use crate::error::EditError;
use crate::history::ChangeType;
use crate::modifier;
use crate::state::EditorState;
use tracing::debug;

/// An editor-level edit.
#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    /// Insert text at the selection with the current inline style.
    InsertText(String),
    /// Delete backward (grapheme before the caret, or the selected range).
    Backspace,
    /// Delete forward (grapheme after the caret, or the selected range).
    Delete,
    /// Split the block at the caret.
    SplitBlock,
    /// Set the block type of the selected blocks, or reset it to `unstyled` if the first
    /// selected block already has it.
    ToggleBlockType(BlockType),
    /// Toggle an inline style on the selected range, or on the typing style at a caret.
    ToggleInlineStyle(String),
    /// Replace the selection with blocks (paste).
    InsertFragment(Vec<ContentBlock>),
    /// Remove the selected range.
    RemoveRange,
    /// Change the depth of the selected blocks.
    AdjustDepth {
        /// Depth change (negative to outdent).
        delta: i32,
        /// Maximum allowed depth.
        max_depth: usize,
    },
    /// Undo the last step.
    Undo,
    /// Redo the last undone step.
    Redo,
}

impl EditCommand {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            EditCommand::InsertText(_) => "insert-text",
            EditCommand::Backspace => "backspace",
            EditCommand::Delete => "delete",
            EditCommand::SplitBlock => "split-block",
            EditCommand::ToggleBlockType(_) => "toggle-block-type",
            EditCommand::ToggleInlineStyle(_) => "toggle-inline-style",
            EditCommand::InsertFragment(_) => "insert-fragment",
            EditCommand::RemoveRange => "remove-range",
            EditCommand::AdjustDepth { .. } => "adjust-depth",
            EditCommand::Undo => "undo",
            EditCommand::Redo => "redo",
        }
    }
}

impl EditorState {
    /// Apply `command` and return the resulting state.
    ///
    /// Commands with nothing to do (backspace at the start of the document, removing a collapsed
    /// range, undo with empty history) return this same handle.
    pub fn execute(&self, command: EditCommand) -> Result<EditorState, EditError> {
        debug!(command = command.name(), "executing command");
        let content = self.current_content();
        let selection = self.selection();

        let next = match command {
            EditCommand::InsertText(text) => {
                let style = self.current_inline_style();
                let content = modifier::insert_text(content, selection, &text, &style)?;
                self.push(content, ChangeType::InsertCharacters)
            }
            EditCommand::Backspace => {
                if selection.is_collapsed() {
                    let content = modifier::remove_grapheme_backward(content, selection)?;
                    self.push(content, ChangeType::BackspaceCharacter)
                } else {
                    let content = modifier::remove_range(content, selection)?;
                    self.push(content, ChangeType::RemoveRange)
                }
            }
            EditCommand::Delete => {
                if selection.is_collapsed() {
                    let content = modifier::remove_grapheme_forward(content, selection)?;
                    self.push(content, ChangeType::DeleteCharacter)
                } else {
                    let content = modifier::remove_range(content, selection)?;
                    self.push(content, ChangeType::RemoveRange)
                }
            }
            EditCommand::SplitBlock => {
                let content = modifier::split_block(content, selection)?;
                self.push(content, ChangeType::SplitBlock)
            }
            EditCommand::ToggleBlockType(block_type) => {
                let start = content
                    .block_for_key(selection.start_key())
                    .ok_or_else(|| EditError::UnknownBlock(selection.start_key().clone()))?;
                let target = if start.block_type() == &block_type {
                    BlockType::Unstyled
                } else {
                    block_type
                };
                let content = modifier::set_block_type(content, selection, &target)?;
                self.push(content, ChangeType::ChangeBlockType)
            }
            EditCommand::ToggleInlineStyle(style) => {
                let current = self.current_inline_style();
                if selection.is_collapsed() {
                    self.set_inline_style_override(Some(current.toggled(&style)))
                } else {
                    let content = if current.contains(&style) {
                        modifier::remove_inline_style(content, selection, &style)?
                    } else {
                        modifier::apply_inline_style(content, selection, &style)?
                    };
                    self.push(content, ChangeType::ChangeInlineStyle)
                }
            }
            EditCommand::InsertFragment(blocks) => {
                let content = modifier::replace_with_fragment(content, selection, &blocks)?;
                self.push(content, ChangeType::InsertFragment)
            }
            EditCommand::RemoveRange => {
                let content = modifier::remove_range(content, selection)?;
                self.push(content, ChangeType::RemoveRange)
            }
            EditCommand::AdjustDepth { delta, max_depth } => {
                let content = modifier::adjust_block_depth(content, selection, delta, max_depth)?;
                self.push(content, ChangeType::AdjustDepth)
            }
            EditCommand::Undo => self.undo(),
            EditCommand::Redo => self.redo(),
        };

        Ok(next)
    }

    /// Apply `commands` in order, stopping at the first error.
    pub fn execute_batch(
        &self,
        commands: impl IntoIterator<Item = EditCommand>,
    ) -> Result<EditorState, EditError> {
        commands
            .into_iter()
            .try_fold(self.clone(), |state, command| state.execute(command))
    }
}
