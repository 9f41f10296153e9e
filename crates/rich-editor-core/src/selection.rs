//! Selection model.
//!
//! A [`SelectionState`] is an anchor/focus pair of `(block key, char offset)` plus a direction
//! flag and a focus flag. It is a plain value: compared by value, cloned cheaply.

use crate::block::BlockKey;

/// Anchor/focus selection over the blocks of a content snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectionState {
    /// Block the selection started in.
    pub anchor_key: BlockKey,
    /// Character offset of the anchor within its block.
    pub anchor_offset: usize,
    /// Block the selection extends to.
    pub focus_key: BlockKey,
    /// Character offset of the focus within its block.
    pub focus_offset: usize,
    /// `true` when the focus precedes the anchor in document order.
    pub is_backward: bool,
    /// Whether the editor has input focus.
    pub has_focus: bool,
}

impl SelectionState {
    /// Collapsed selection at the start of `key`, without focus.
    pub fn create_empty(key: BlockKey) -> Self {
        Self::collapsed(key, 0)
    }

    /// Collapsed selection at `offset` in `key`, without focus.
    pub fn collapsed(key: BlockKey, offset: usize) -> Self {
        Self {
            anchor_key: key.clone(),
            anchor_offset: offset,
            focus_key: key,
            focus_offset: offset,
            is_backward: false,
            has_focus: false,
        }
    }

    /// Forward (non-backward) selection from `(start_key, start_offset)` to `(end_key, end_offset)`.
    pub fn range(
        start_key: BlockKey,
        start_offset: usize,
        end_key: BlockKey,
        end_offset: usize,
    ) -> Self {
        Self {
            anchor_key: start_key,
            anchor_offset: start_offset,
            focus_key: end_key,
            focus_offset: end_offset,
            is_backward: false,
            has_focus: false,
        }
    }

    /// Returns `true` if anchor and focus coincide.
    pub fn is_collapsed(&self) -> bool {
        self.anchor_key == self.focus_key && self.anchor_offset == self.focus_offset
    }

    /// Key of the block where the selection starts in document order.
    pub fn start_key(&self) -> &BlockKey {
        if self.is_backward {
            &self.focus_key
        } else {
            &self.anchor_key
        }
    }

    /// Offset where the selection starts in document order.
    pub fn start_offset(&self) -> usize {
        if self.is_backward {
            self.focus_offset
        } else {
            self.anchor_offset
        }
    }

    /// Key of the block where the selection ends in document order.
    pub fn end_key(&self) -> &BlockKey {
        if self.is_backward {
            &self.anchor_key
        } else {
            &self.focus_key
        }
    }

    /// Offset where the selection ends in document order.
    pub fn end_offset(&self) -> usize {
        if self.is_backward {
            self.anchor_offset
        } else {
            self.focus_offset
        }
    }

    /// Returns `true` if an edge of the selection falls within `start..=end` of `block_key`.
    ///
    /// When both edges are in `block_key`, any overlap between the selection and the range counts.
    pub fn has_edge_within(&self, block_key: &BlockKey, start: usize, end: usize) -> bool {
        if self.anchor_key == self.focus_key && &self.anchor_key == block_key {
            return start <= self.end_offset() && self.start_offset() <= end;
        }

        if block_key != &self.anchor_key && block_key != &self.focus_key {
            return false;
        }

        let offset = if block_key == &self.anchor_key {
            self.anchor_offset
        } else {
            self.focus_offset
        };
        start <= offset && offset <= end
    }

    /// A copy with `has_focus` replaced.
    pub fn with_has_focus(&self, has_focus: bool) -> Self {
        Self {
            has_focus,
            ..self.clone()
        }
    }

    /// A copy with `is_backward` replaced.
    pub fn with_is_backward(&self, is_backward: bool) -> Self {
        Self {
            is_backward,
            ..self.clone()
        }
    }
}
