#![warn(missing_docs)]
//! Rich Editor Core - Immutable State Kernel for Rich-Text Editors
//!
//! # Overview
//!
//! `rich-editor-core` is the headless state core of a block-based rich-text editor. It keeps one
//! authoritative, immutable [`EditorState`] per point in time and advances it through a small set
//! of transitions. It does not render, lay out text, or handle input events; a view layer consumes
//! the state and feeds edits back as new content snapshots or [`EditCommand`]s.
//!
//! # Core Features
//!
//! - **Persistent Snapshots**: content, history, and caches are persistent structures, so one
//!   changed paragraph never copies the whole document
//! - **Undo Grouping**: consecutive typing or deleting coalesces into one undo step; everything else
//!   opens a new one
//! - **Incremental Caches**: per-block decoration trees and text directions are rebuilt only for
//!   blocks that actually changed
//! - **Typing Style**: the inline style for new text is derived from the selection unless an
//!   explicit override is active
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Edit Commands (EditCommand)                │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Editor State Container (EditorState)       │  ← Transitions
//! ├─────────────────────────────────────────────┤
//! │  History Ledger  │  Typing Style Resolver   │
//! ├─────────────────────────────────────────────┤
//! │  Decoration Trees  │  Direction Map         │  ← Derived Caches
//! ├─────────────────────────────────────────────┤
//! │  Content Transforms (modifier)              │
//! ├─────────────────────────────────────────────┤
//! │  Content & Selection Model                  │  ← Data
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use rich_editor_core::{EditCommand, EditorState};
//!
//! let state = EditorState::create_empty(None)
//!     .execute_batch([
//!         EditCommand::InsertText("Hello".to_string()),
//!         EditCommand::SplitBlock,
//!         EditCommand::InsertText("World".to_string()),
//!     ])
//!     .unwrap();
//!
//! assert_eq!(state.current_content().plain_text(), "Hello\nWorld");
//! assert_eq!(state.tree_map().len(), 2);
//!
//! let undone = state.undo();
//! assert_eq!(undone.current_content().plain_text(), "Hello\n");
//! ```
//!
//! # Module Description
//!
//! - [`block`] - Blocks, keys, block types, and per-character metadata
//! - [`content`] - Content snapshots and the persistent block map
//! - [`selection`] - Anchor/focus selection
//! - [`modifier`] - Pure content transforms
//! - [`decorator`] - Decorator plug-in and composite decorator
//! - [`block_tree`] - Per-block decoration trees
//! - [`tree_map`] - Incremental decoration-tree cache
//! - [`bidi`] - Block text direction
//! - [`history`] - Change types, undo grouping, history stacks
//! - [`style`] - Inline style at the selection
//! - [`state`] - The editor state container
//! - [`commands`] - Edit commands
//!
//! # Logging
//!
//! Transitions and cache rebuilds emit `tracing` events at `debug` and `trace` level. The crate
//! never installs a subscriber.

pub mod bidi;
pub mod block;
pub mod block_tree;
pub mod commands;
pub mod content;
pub mod decorator;
mod error;
pub mod history;
pub mod modifier;
pub mod selection;
pub mod state;
pub mod style;
pub mod tree_map;

pub use bidi::{Direction, DirectionMap};
pub use block::{BlockKey, BlockType, CharacterMetadata, ContentBlock, EntityKey, InlineStyle};
pub use block_tree::{BlockTree, DecoratorRange, LeafRange};
pub use commands::EditCommand;
pub use content::{BlockMap, BlockMapDiff, ContentState};
pub use decorator::{
    CompositeDecorator, DecorationKey, Decorations, Decorator, DecoratorStrategy, FnStrategy,
};
pub use error::{EditError, ParseChangeTypeError};
pub use history::{ChangeType, ContentStack, must_become_boundary};
pub use selection::SelectionState;
pub use state::{EditorState, EditorStateConfig, EditorStatePatch};
pub use style::current_inline_style;
pub use tree_map::TreeMap;
