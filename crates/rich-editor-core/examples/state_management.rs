//! State management example
//!
//! Types a few paragraphs through `EditCommand`s, walks the undo history, and prints the
//! derived maps. Run with `RUST_LOG=rich_editor_core=trace` to see the incremental
//! regeneration events.

use rich_editor_core::{
    BlockType, ChangeType, EditCommand, EditError, EditorState, InlineStyle, SelectionState,
};
use tracing_subscriber::EnvFilter;

fn print_state(label: &str, state: &EditorState) {
    println!("{label}:");
    for block in state.current_content().block_map().iter() {
        let direction = state
            .direction_map()
            .get(block.key())
            .unwrap_or_default();
        println!(
            "  [{}] {:?} {:?} {:?}",
            block.key(),
            block.block_type(),
            direction,
            block.text()
        );
    }
    println!(
        "  selection: {:?}, undo: {}, redo: {}, last change: {:?}",
        state.selection(),
        state.undo_stack().len(),
        state.redo_stack().len(),
        state.last_change_type().map(ChangeType::as_str),
    );
}

fn main() -> Result<(), EditError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let state = EditorState::create_empty(None);
    print_state("1. empty", &state);

    let state = state.execute_batch([
        EditCommand::ToggleBlockType(BlockType::HeaderOne),
        EditCommand::InsertText("Notes".to_string()),
        EditCommand::SplitBlock,
        EditCommand::ToggleBlockType(BlockType::Unstyled),
        EditCommand::ToggleInlineStyle(InlineStyle::BOLD.to_string()),
        EditCommand::InsertText("Important: ".to_string()),
        EditCommand::ToggleInlineStyle(InlineStyle::BOLD.to_string()),
        EditCommand::InsertText("שלום".to_string()),
    ])?;
    print_state("2. after typing", &state);
    println!("  style at caret: {:?}", state.current_inline_style());

    let first = state.current_content().first_block().key().clone();
    let state = state.accept_selection(SelectionState::collapsed(first, 5));
    let state = state.execute(EditCommand::InsertText("!".to_string()))?;
    print_state("3. caret jump then typing", &state);

    let mut state = state;
    let mut step = 4;
    while state.can_undo() {
        state = state.undo();
        print_state(&format!("{step}. undo"), &state);
        step += 1;
    }

    let state = state.redo().redo();
    print_state(&format!("{step}. redo twice"), &state);
    Ok(())
}
