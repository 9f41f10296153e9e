//! Inline style at the selection.
//!
//! The style new text would be typed with is derived from the character before the caret. At the
//! start of a block the first character of the block is used, and in an empty block the last
//! character of the nearest non-empty block *before* it. The search never looks forward.

use crate::block::{BlockKey, InlineStyle};
use crate::content::ContentState;
use crate::selection::SelectionState;

/// Style used for text inserted at `selection`, unless `override_style` is set.
pub fn current_inline_style(
    content: &ContentState,
    selection: &SelectionState,
    override_style: Option<&InlineStyle>,
) -> InlineStyle {
    if let Some(style) = override_style {
        return style.clone();
    }

    let key = selection.start_key();
    let offset = selection.start_offset();
    let Some(block) = content.block_for_key(key) else {
        return InlineStyle::new();
    };

    if selection.is_collapsed() {
        if offset > 0 {
            return block.inline_style_at(offset - 1);
        }
        if !block.is_empty() {
            return block.inline_style_at(0);
        }
        return style_before(content, key);
    }

    if offset < block.len() {
        return block.inline_style_at(offset);
    }
    if offset > 0 {
        return block.inline_style_at(offset - 1);
    }
    style_before(content, key)
}

/// Style of the last character of the nearest non-empty block before `key`.
fn style_before(content: &ContentState, key: &BlockKey) -> InlineStyle {
    let mut current = content.block_before(key);
    while let Some(block) = current {
        if let Some(last) = block.len().checked_sub(1) {
            return block.inline_style_at(last);
        }
        current = content.block_before(block.key());
    }
    InlineStyle::new()
}
