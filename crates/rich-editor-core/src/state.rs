//! Editor State Container
//!
//! [`EditorState`] is the single authoritative value describing the editor at a point in time:
//! the current content snapshot, the selection, undo/redo history, and derived per-block caches
//! (decoration trees and text directions).
//!
//! # Overview
//!
//! Every transition takes `&self` and returns a brand-new `EditorState`; the input is never
//! modified. Unchanged parts are shared with the input, so a transition costs roughly the size of
//! what actually changed:
//!
//! - **Content transitions**: [`EditorState::push`] records a new content snapshot and decides
//!   whether it opens a new undo step; [`EditorState::undo`] and [`EditorState::redo`] move
//!   snapshots between the two history stacks.
//! - **Selection transitions**: [`EditorState::accept_selection`] and
//!   [`EditorState::force_selection`] replace the selection without touching content.
//! - **Field updates**: [`EditorState::set`] merges an [`EditorStatePatch`] and keeps the
//!   decoration-tree cache consistent with the resulting content and decorator.
//!
//! # Example
//!
//! ```rust
//! use rich_editor_core::{modifier, ChangeType, EditorState};
//!
//! let state = EditorState::create_empty(None);
//! let content = modifier::insert_text(
//!     state.current_content(),
//!     state.selection(),
//!     "Hello",
//!     &state.current_inline_style(),
//! )
//! .unwrap();
//!
//! let typed = state.push(content, ChangeType::InsertCharacters);
//! assert_eq!(typed.current_content().plain_text(), "Hello");
//!
//! let undone = typed.undo();
//! assert!(undone.current_content().ptr_eq(state.current_content()));
//! ```

use crate::bidi::DirectionMap;
use crate::block::{BlockKey, InlineStyle};
use crate::block_tree::BlockTree;
use crate::content::ContentState;
use crate::decorator::Decorator;
use crate::history::{ChangeType, ContentStack, must_become_boundary};
use crate::selection::SelectionState;
use crate::style::current_inline_style;
use crate::tree_map::{self, TreeMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Constructor arguments for [`EditorState::create`].
///
/// Only the content is required; everything else has the defaults of a freshly opened editor.
#[derive(Clone)]
pub struct EditorStateConfig {
    current_content: ContentState,
    selection: Option<SelectionState>,
    decorator: Option<Arc<dyn Decorator>>,
    allow_undo: bool,
    undo_stack: ContentStack,
    redo_stack: ContentStack,
    in_composition_mode: bool,
    force_selection: bool,
    last_change_type: Option<ChangeType>,
    inline_style_override: Option<InlineStyle>,
    natively_rendered_content: Option<ContentState>,
}

impl EditorStateConfig {
    /// Config for `content` with default settings.
    pub fn new(content: ContentState) -> Self {
        Self {
            current_content: content,
            selection: None,
            decorator: None,
            allow_undo: true,
            undo_stack: ContentStack::new(),
            redo_stack: ContentStack::new(),
            in_composition_mode: false,
            force_selection: false,
            last_change_type: None,
            inline_style_override: None,
            natively_rendered_content: None,
        }
    }

    /// Initial selection (default: collapsed at the start of the first block).
    pub fn with_selection(mut self, selection: SelectionState) -> Self {
        self.selection = Some(selection);
        self
    }

    /// Decorator used to build decoration trees.
    pub fn with_decorator(mut self, decorator: Arc<dyn Decorator>) -> Self {
        self.decorator = Some(decorator);
        self
    }

    /// Enable or disable undo history for the lifetime of the state.
    pub fn with_allow_undo(mut self, allow_undo: bool) -> Self {
        self.allow_undo = allow_undo;
        self
    }

    /// Initial undo stack.
    pub fn with_undo_stack(mut self, undo_stack: ContentStack) -> Self {
        self.undo_stack = undo_stack;
        self
    }

    /// Initial redo stack.
    pub fn with_redo_stack(mut self, redo_stack: ContentStack) -> Self {
        self.redo_stack = redo_stack;
        self
    }

    /// Initial IME composition flag.
    pub fn with_in_composition_mode(mut self, in_composition_mode: bool) -> Self {
        self.in_composition_mode = in_composition_mode;
        self
    }

    /// Initial force-selection flag.
    pub fn with_force_selection(mut self, force_selection: bool) -> Self {
        self.force_selection = force_selection;
        self
    }

    /// Initial last change type.
    pub fn with_last_change_type(mut self, change_type: ChangeType) -> Self {
        self.last_change_type = Some(change_type);
        self
    }

    /// Initial inline style override.
    pub fn with_inline_style_override(mut self, style: InlineStyle) -> Self {
        self.inline_style_override = Some(style);
        self
    }

    /// Content the view has already rendered natively.
    pub fn with_natively_rendered_content(mut self, content: ContentState) -> Self {
        self.natively_rendered_content = Some(content);
        self
    }
}

/// Field updates for [`EditorState::set`].
///
/// Fields left untouched keep their current value. Optional fields take an `Option` so they can be
/// cleared explicitly (`with_decorator(None)` removes the decorator).
#[derive(Clone, Default)]
pub struct EditorStatePatch {
    current_content: Option<ContentState>,
    selection: Option<SelectionState>,
    decorator: Option<Option<Arc<dyn Decorator>>>,
    direction_map: Option<DirectionMap>,
    undo_stack: Option<ContentStack>,
    redo_stack: Option<ContentStack>,
    force_selection: Option<bool>,
    in_composition_mode: Option<bool>,
    inline_style_override: Option<Option<InlineStyle>>,
    last_change_type: Option<Option<ChangeType>>,
    natively_rendered_content: Option<Option<ContentState>>,
}

impl EditorStatePatch {
    /// An empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current content.
    pub fn with_current_content(mut self, content: ContentState) -> Self {
        self.current_content = Some(content);
        self
    }

    /// Replace the selection.
    pub fn with_selection(mut self, selection: SelectionState) -> Self {
        self.selection = Some(selection);
        self
    }

    /// Replace or clear the decorator.
    pub fn with_decorator(mut self, decorator: Option<Arc<dyn Decorator>>) -> Self {
        self.decorator = Some(decorator);
        self
    }

    /// Replace the direction map.
    pub fn with_direction_map(mut self, direction_map: DirectionMap) -> Self {
        self.direction_map = Some(direction_map);
        self
    }

    /// Replace the undo stack.
    pub fn with_undo_stack(mut self, undo_stack: ContentStack) -> Self {
        self.undo_stack = Some(undo_stack);
        self
    }

    /// Replace the redo stack.
    pub fn with_redo_stack(mut self, redo_stack: ContentStack) -> Self {
        self.redo_stack = Some(redo_stack);
        self
    }

    /// Replace the force-selection flag.
    pub fn with_force_selection(mut self, force_selection: bool) -> Self {
        self.force_selection = Some(force_selection);
        self
    }

    /// Replace the IME composition flag.
    pub fn with_in_composition_mode(mut self, in_composition_mode: bool) -> Self {
        self.in_composition_mode = Some(in_composition_mode);
        self
    }

    /// Replace or clear the inline style override.
    pub fn with_inline_style_override(mut self, style: Option<InlineStyle>) -> Self {
        self.inline_style_override = Some(style);
        self
    }

    /// Replace or clear the last change type.
    pub fn with_last_change_type(mut self, change_type: Option<ChangeType>) -> Self {
        self.last_change_type = Some(change_type);
        self
    }

    /// Replace or clear the natively rendered content marker.
    pub fn with_natively_rendered_content(mut self, content: Option<ContentState>) -> Self {
        self.natively_rendered_content = Some(content);
        self
    }
}

#[derive(Clone)]
struct EditorStateInner {
    allow_undo: bool,
    current_content: ContentState,
    decorator: Option<Arc<dyn Decorator>>,
    direction_map: DirectionMap,
    force_selection: bool,
    in_composition_mode: bool,
    inline_style_override: Option<InlineStyle>,
    last_change_type: Option<ChangeType>,
    natively_rendered_content: Option<ContentState>,
    redo_stack: ContentStack,
    selection: SelectionState,
    tree_map: TreeMap,
    undo_stack: ContentStack,
}

/// Immutable editor state.
///
/// A cheap handle: cloning shares the underlying value, and [`EditorState::ptr_eq`] tells whether
/// two handles are the same state.
#[derive(Clone)]
pub struct EditorState {
    inner: Arc<EditorStateInner>,
}

impl EditorState {
    /// State with a single empty `unstyled` block.
    pub fn create_empty(decorator: Option<Arc<dyn Decorator>>) -> Self {
        Self::create_with_content(ContentState::create_from_text(""), decorator)
    }

    /// State for `content` with empty history and the caret at the start of the first block.
    pub fn create_with_content(
        content: ContentState,
        decorator: Option<Arc<dyn Decorator>>,
    ) -> Self {
        let mut config = EditorStateConfig::new(content);
        config.decorator = decorator;
        Self::create(config)
    }

    /// State from a full configuration; derived caches are built for every block.
    pub fn create(config: EditorStateConfig) -> Self {
        let EditorStateConfig {
            current_content,
            selection,
            decorator,
            allow_undo,
            undo_stack,
            redo_stack,
            in_composition_mode,
            force_selection,
            last_change_type,
            inline_style_override,
            natively_rendered_content,
        } = config;

        let selection = selection.unwrap_or_else(|| {
            SelectionState::create_empty(current_content.first_block().key().clone())
        });
        let tree_map = tree_map::generate_tree_map(&current_content, decorator.as_deref());
        let direction_map = DirectionMap::compute(&current_content, None);
        let (undo_stack, redo_stack) = if allow_undo {
            (undo_stack, redo_stack)
        } else {
            (ContentStack::new(), ContentStack::new())
        };

        debug!(
            blocks = current_content.block_map().len(),
            allow_undo,
            decorated = decorator.is_some(),
            "created editor state"
        );

        Self {
            inner: Arc::new(EditorStateInner {
                allow_undo,
                current_content,
                decorator,
                direction_map,
                force_selection,
                in_composition_mode,
                inline_style_override,
                last_change_type,
                natively_rendered_content,
                redo_stack,
                selection,
                tree_map,
                undo_stack,
            }),
        }
    }

    /// Merge `patch` into this state.
    ///
    /// The decoration-tree cache follows the resulting content and decorator:
    ///
    /// - A decorator swap (by `Arc` identity) rebuilds the trees of blocks whose decorations
    ///   differ between the old and new decorator, or every tree when either side is `None`, and
    ///   clears the natively rendered content marker.
    /// - A content swap (by snapshot identity) rebuilds only the trees of blocks that are new or
    ///   replaced and drops those of removed blocks.
    ///
    /// The direction map is taken from the patch as given and never recomputed here.
    pub fn set(&self, patch: EditorStatePatch) -> EditorState {
        let EditorStatePatch {
            current_content,
            selection,
            decorator,
            direction_map,
            undo_stack,
            redo_stack,
            force_selection,
            in_composition_mode,
            inline_style_override,
            last_change_type,
            natively_rendered_content,
        } = patch;

        let current = &self.inner;
        let mut inner = (**current).clone();

        let decorator = decorator.unwrap_or_else(|| current.decorator.clone());
        let content = current_content.unwrap_or_else(|| current.current_content.clone());
        let decorator_changed = !same_decorator(&decorator, &current.decorator);
        let content_changed = !content.ptr_eq(&current.current_content);

        if decorator_changed {
            inner.tree_map = match (&decorator, &current.decorator) {
                (Some(new), Some(existing)) => {
                    let diff = content
                        .block_map()
                        .diff(current.current_content.block_map());
                    let pruned = tree_map::without_entries(&current.tree_map, &diff);
                    tree_map::regenerate_for_new_decorator(
                        content.block_map(),
                        &pruned,
                        &**new,
                        &**existing,
                    )
                }
                _ => tree_map::generate_tree_map(&content, decorator.as_deref()),
            };
            debug!(
                decorated = decorator.is_some(),
                trees = inner.tree_map.len(),
                "swapped decorator"
            );
        } else if content_changed {
            let diff = content
                .block_map()
                .diff(current.current_content.block_map());
            if !diff.is_empty() {
                inner.tree_map =
                    tree_map::regenerate_for_new_blocks(&current.tree_map, &diff, decorator.as_deref());
            }
        }

        inner.decorator = decorator;
        inner.current_content = content;
        if let Some(selection) = selection {
            inner.selection = selection;
        }
        if let Some(direction_map) = direction_map {
            inner.direction_map = direction_map;
        }
        if let Some(undo_stack) = undo_stack {
            inner.undo_stack = undo_stack;
        }
        if let Some(redo_stack) = redo_stack {
            inner.redo_stack = redo_stack;
        }
        if let Some(force_selection) = force_selection {
            inner.force_selection = force_selection;
        }
        if let Some(in_composition_mode) = in_composition_mode {
            inner.in_composition_mode = in_composition_mode;
        }
        if let Some(style) = inline_style_override {
            inner.inline_style_override = style;
        }
        if let Some(change_type) = last_change_type {
            inner.last_change_type = change_type;
        }
        if let Some(content) = natively_rendered_content {
            inner.natively_rendered_content = content;
        }
        if decorator_changed {
            inner.natively_rendered_content = None;
        }

        EditorState {
            inner: Arc::new(inner),
        }
    }

    /// Replace the selection without asking the view to reposition it.
    pub fn accept_selection(&self, selection: SelectionState) -> EditorState {
        self.update_selection(selection, false)
    }

    /// Replace the selection and ask the view to reposition it; the selection gains focus.
    pub fn force_selection(&self, selection: SelectionState) -> EditorState {
        let selection = if selection.has_focus {
            selection
        } else {
            selection.with_has_focus(true)
        };
        self.update_selection(selection, true)
    }

    /// Collapse the selection at the end of the last block.
    pub fn move_selection_to_end(&self) -> EditorState {
        let last = self.inner.current_content.last_block();
        self.accept_selection(SelectionState::collapsed(last.key().clone(), last.len()))
    }

    /// Collapse the selection at the end of the last block and force it with focus.
    pub fn move_focus_to_end(&self) -> EditorState {
        let moved = self.move_selection_to_end();
        let selection = moved.selection().clone();
        moved.force_selection(selection)
    }

    /// Replace the inline style override (e.g. after toggling a style at a collapsed caret).
    pub fn set_inline_style_override(&self, style: Option<InlineStyle>) -> EditorState {
        self.set(EditorStatePatch::new().with_inline_style_override(style))
    }

    fn update_selection(&self, selection: SelectionState, force_selection: bool) -> EditorState {
        self.set(
            EditorStatePatch::new()
                .with_selection(selection)
                .with_force_selection(force_selection)
                .with_natively_rendered_content(None)
                .with_inline_style_override(None),
        )
    }

    /// Make `content` the current content, recording history according to `change_type`.
    ///
    /// Returns this same handle when `content` is already the current snapshot. Otherwise the
    /// current content becomes a new undo step when the selection moved since the last edit or
    /// when `change_type` does not continue the previous edit; consecutive character edits of
    /// the same kind coalesce into one step.
    pub fn push(&self, content: ContentState, change_type: ChangeType) -> EditorState {
        let current = &self.inner;
        if content.ptr_eq(&current.current_content) {
            trace!(change = %change_type, "push of current content ignored");
            return self.clone();
        }

        let force_selection = change_type != ChangeType::InsertCharacters;
        let direction_map = DirectionMap::compute(&content, Some(&current.direction_map));
        let selection = content.selection_after().clone();

        let patch = EditorStatePatch::new()
            .with_direction_map(direction_map)
            .with_last_change_type(Some(change_type))
            .with_selection(selection)
            .with_force_selection(force_selection)
            .with_inline_style_override(None);

        if !current.allow_undo {
            trace!(change = %change_type, "pushed content without history");
            return self.set(patch.with_current_content(content));
        }

        let selection_moved = current.selection != *current.current_content.selection_after();
        let boundary = selection_moved || must_become_boundary(current.last_change_type, change_type);

        let (content, undo_stack) = if boundary {
            (
                content.with_selection_before(current.selection.clone()),
                current.undo_stack.push(current.current_content.clone()),
            )
        } else {
            // Same undo step: keep the selection from before the step began.
            (
                content.with_selection_before(current.current_content.selection_before().clone()),
                current.undo_stack.clone(),
            )
        };

        debug!(
            change = %change_type,
            boundary,
            selection_moved,
            undo_depth = undo_stack.len(),
            "pushed content"
        );

        self.set(
            patch
                .with_current_content(content)
                .with_undo_stack(undo_stack)
                .with_redo_stack(ContentStack::new()),
        )
    }

    /// Restore the content before the most recent undo step.
    ///
    /// No-op when history is disabled or there is nothing to undo.
    pub fn undo(&self) -> EditorState {
        let current = &self.inner;
        if !current.allow_undo {
            return self.clone();
        }
        let Some((previous, undo_stack)) = current.undo_stack.pop() else {
            return self.clone();
        };

        let direction_map = DirectionMap::compute(&previous, Some(&current.direction_map));
        let redo_stack = current.redo_stack.push(current.current_content.clone());
        debug!(
            undo_depth = undo_stack.len(),
            redo_depth = redo_stack.len(),
            "undo"
        );

        self.set(
            EditorStatePatch::new()
                .with_current_content(previous)
                .with_direction_map(direction_map)
                .with_undo_stack(undo_stack)
                .with_redo_stack(redo_stack)
                .with_force_selection(true)
                .with_inline_style_override(None)
                .with_last_change_type(Some(ChangeType::Undo))
                .with_natively_rendered_content(None)
                .with_selection(current.current_content.selection_before().clone()),
        )
    }

    /// Re-apply the most recently undone step.
    ///
    /// No-op when history is disabled or there is nothing to redo.
    pub fn redo(&self) -> EditorState {
        let current = &self.inner;
        if !current.allow_undo {
            return self.clone();
        }
        let Some((next, redo_stack)) = current.redo_stack.pop() else {
            return self.clone();
        };

        let direction_map = DirectionMap::compute(&next, Some(&current.direction_map));
        let undo_stack = current.undo_stack.push(current.current_content.clone());
        let selection = next.selection_after().clone();
        debug!(
            undo_depth = undo_stack.len(),
            redo_depth = redo_stack.len(),
            "redo"
        );

        self.set(
            EditorStatePatch::new()
                .with_current_content(next)
                .with_direction_map(direction_map)
                .with_undo_stack(undo_stack)
                .with_redo_stack(redo_stack)
                .with_force_selection(true)
                .with_inline_style_override(None)
                .with_last_change_type(Some(ChangeType::Redo))
                .with_natively_rendered_content(None)
                .with_selection(selection),
        )
    }

    /// Returns `true` if both handles refer to the same state value.
    pub fn ptr_eq(&self, other: &EditorState) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Current content snapshot.
    pub fn current_content(&self) -> &ContentState {
        &self.inner.current_content
    }

    /// Current selection.
    pub fn selection(&self) -> &SelectionState {
        &self.inner.selection
    }

    /// Undo history, most recent first.
    pub fn undo_stack(&self) -> &ContentStack {
        &self.inner.undo_stack
    }

    /// Redo history, most recent first.
    pub fn redo_stack(&self) -> &ContentStack {
        &self.inner.redo_stack
    }

    /// Returns `true` if [`EditorState::undo`] would change the state.
    pub fn can_undo(&self) -> bool {
        self.inner.allow_undo && !self.inner.undo_stack.is_empty()
    }

    /// Returns `true` if [`EditorState::redo`] would change the state.
    pub fn can_redo(&self) -> bool {
        self.inner.allow_undo && !self.inner.redo_stack.is_empty()
    }

    /// The decorator, if any.
    pub fn decorator(&self) -> Option<&Arc<dyn Decorator>> {
        self.inner.decorator.as_ref()
    }

    /// Whether history is recorded.
    pub fn allow_undo(&self) -> bool {
        self.inner.allow_undo
    }

    /// Whether an IME composition is in progress.
    pub fn is_in_composition_mode(&self) -> bool {
        self.inner.in_composition_mode
    }

    /// Whether the view must reposition the native selection.
    pub fn must_force_selection(&self) -> bool {
        self.inner.force_selection
    }

    /// Content the view already rendered natively, if any.
    pub fn natively_rendered_content(&self) -> Option<&ContentState> {
        self.inner.natively_rendered_content.as_ref()
    }

    /// Kind of the most recent content change.
    pub fn last_change_type(&self) -> Option<ChangeType> {
        self.inner.last_change_type
    }

    /// Explicit inline style for the next insertion, if any.
    pub fn inline_style_override(&self) -> Option<&InlineStyle> {
        self.inner.inline_style_override.as_ref()
    }

    /// Resolved text direction per block.
    pub fn direction_map(&self) -> &DirectionMap {
        &self.inner.direction_map
    }

    /// Decoration tree per block.
    pub fn tree_map(&self) -> &TreeMap {
        &self.inner.tree_map
    }

    /// Decoration tree of the block with `key`.
    pub fn block_tree(&self, key: &BlockKey) -> Option<&Arc<BlockTree>> {
        self.inner.tree_map.get(key)
    }

    /// Style new text would be inserted with at the current selection.
    pub fn current_inline_style(&self) -> InlineStyle {
        current_inline_style(
            &self.inner.current_content,
            &self.inner.selection,
            self.inner.inline_style_override.as_ref(),
        )
    }

    /// Returns `true` if an edge of the selection is at the very start of the document.
    pub fn is_selection_at_start_of_content(&self) -> bool {
        let first = self.inner.current_content.first_block();
        self.inner.selection.has_edge_within(first.key(), 0, 0)
    }

    /// Returns `true` if an edge of the selection is at the very end of the document.
    pub fn is_selection_at_end_of_content(&self) -> bool {
        let last = self.inner.current_content.last_block();
        let len = last.len();
        self.inner.selection.has_edge_within(last.key(), len, len)
    }
}

impl Default for EditorState {
    fn default() -> Self {
        Self::create_empty(None)
    }
}

impl fmt::Debug for EditorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = &self.inner;
        f.debug_struct("EditorState")
            .field("current_content", &inner.current_content)
            .field("selection", &inner.selection)
            .field("allow_undo", &inner.allow_undo)
            .field("undo_stack", &inner.undo_stack)
            .field("redo_stack", &inner.redo_stack)
            .field("decorator", &inner.decorator)
            .field("force_selection", &inner.force_selection)
            .field("in_composition_mode", &inner.in_composition_mode)
            .field("inline_style_override", &inner.inline_style_override)
            .field("last_change_type", &inner.last_change_type)
            .finish_non_exhaustive()
    }
}

fn same_decorator(a: &Option<Arc<dyn Decorator>>, b: &Option<Arc<dyn Decorator>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        _ => false,
    }
}
