use rich_editor_core::{
    BlockKey, BlockType, ChangeType, CompositeDecorator, ContentBlock, ContentState, Decorator,
    EditCommand, EditorState, EditorStatePatch, FnStrategy, SelectionState, modifier,
};
use std::sync::Arc;

const BLOCKS: usize = 20;

fn document() -> ContentState {
    ContentState::create_from_blocks((0..BLOCKS).map(|i| {
        ContentBlock::new(
            format!("k{i}"),
            BlockType::Unstyled,
            format!("paragraph {i} with some words"),
        )
    }))
}

fn keys(state: &EditorState) -> Vec<BlockKey> {
    state.current_content().block_map().keys().cloned().collect()
}

fn shared_trees(before: &EditorState, after: &EditorState) -> usize {
    keys(after)
        .iter()
        .filter(|key| match (before.block_tree(key), after.block_tree(key)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        })
        .count()
}

fn assert_maps_cover_content(state: &EditorState) {
    let block_map = state.current_content().block_map();
    assert_eq!(state.tree_map().len(), block_map.len());
    assert_eq!(state.direction_map().len(), block_map.len());
    for key in block_map.keys() {
        assert!(state.tree_map().contains_key(key), "missing tree for {key}");
        assert!(state.direction_map().contains_key(key), "missing direction for {key}");
    }
}

fn char_decorator(ch: char) -> Arc<dyn Decorator> {
    Arc::new(CompositeDecorator::default().with_strategy(FnStrategy::new(
        "char",
        move |block: &ContentBlock, found: &mut dyn FnMut(usize, usize)| {
            for (i, c) in block.text().chars().enumerate() {
                if c == ch {
                    found(i, i + 1);
                }
            }
        },
    )))
}

#[test]
fn test_editing_one_block_rebuilds_one_tree() {
    let state = EditorState::create_with_content(document(), None)
        .accept_selection(SelectionState::collapsed("k7".into(), 3));
    let typed = state
        .execute(EditCommand::InsertText("x".to_string()))
        .unwrap();

    assert_eq!(shared_trees(&state, &typed), BLOCKS - 1);
    assert!(!Arc::ptr_eq(
        state.block_tree(&"k7".into()).unwrap(),
        typed.block_tree(&"k7".into()).unwrap()
    ));
    assert_maps_cover_content(&typed);
}

#[test]
fn test_split_and_merge_keep_maps_exact() {
    let state = EditorState::create_with_content(document(), None)
        .accept_selection(SelectionState::collapsed("k3".into(), 4));

    let split = state.execute(EditCommand::SplitBlock).unwrap();
    assert_eq!(split.current_content().block_map().len(), BLOCKS + 1);
    assert_maps_cover_content(&split);
    assert_eq!(shared_trees(&state, &split), BLOCKS - 1);

    let merged = split.execute(EditCommand::Backspace).unwrap();
    assert_eq!(merged.current_content().block_map().len(), BLOCKS);
    assert_maps_cover_content(&merged);
    assert_eq!(
        merged.current_content().plain_text(),
        state.current_content().plain_text()
    );
}

#[test]
fn test_removing_blocks_drops_entries() {
    let state = EditorState::create_with_content(document(), None).accept_selection(
        SelectionState::range("k2".into(), 0, "k9".into(), 0),
    );
    let removed = state.execute(EditCommand::RemoveRange).unwrap();

    assert_eq!(removed.current_content().block_map().len(), BLOCKS - 7);
    assert_maps_cover_content(&removed);
    assert!(removed.block_tree(&"k5".into()).is_none());
    assert!(removed.direction_map().get(&"k5".into()).is_none());
}

#[test]
fn test_undo_redo_keep_maps_exact() {
    let state = EditorState::create_with_content(document(), None)
        .accept_selection(SelectionState::collapsed("k0".into(), 0));
    let edited = state
        .execute_batch([
            EditCommand::SplitBlock,
            EditCommand::InsertText("new".to_string()),
            EditCommand::SplitBlock,
        ])
        .unwrap();

    let mut current = edited;
    while current.can_undo() {
        current = current.undo();
        assert_maps_cover_content(&current);
    }
    while current.can_redo() {
        current = current.redo();
        assert_maps_cover_content(&current);
    }
}

#[test]
fn test_decorator_swap_rebuilds_only_differing_blocks() {
    let content = ContentState::create_from_blocks([
        ContentBlock::new("a", BlockType::Unstyled, "xyz"),
        ContentBlock::new("b", BlockType::Unstyled, "abc"),
        ContentBlock::new("c", BlockType::Unstyled, "qqq"),
    ]);
    let state = EditorState::create_with_content(content, Some(char_decorator('x')));
    let swapped = state.set(EditorStatePatch::new().with_decorator(Some(char_decorator('a'))));

    // "xyz" loses its match and "abc" gains one; "qqq" is undecorated either way.
    let a = BlockKey::from("a");
    let b = BlockKey::from("b");
    let c = BlockKey::from("c");
    assert!(!Arc::ptr_eq(state.block_tree(&a).unwrap(), swapped.block_tree(&a).unwrap()));
    assert!(!Arc::ptr_eq(state.block_tree(&b).unwrap(), swapped.block_tree(&b).unwrap()));
    assert!(Arc::ptr_eq(state.block_tree(&c).unwrap(), swapped.block_tree(&c).unwrap()));
}

#[test]
fn test_decorator_and_content_swap_together() {
    let state = EditorState::create_with_content(document(), Some(char_decorator('x')));
    let selection = SelectionState::collapsed("k1".into(), 0);
    let content = modifier::insert_text(
        state.current_content(),
        &selection,
        "zzz ",
        &Default::default(),
    )
    .unwrap();

    let next = state.set(
        EditorStatePatch::new()
            .with_current_content(content)
            .with_decorator(Some(char_decorator('y'))),
    );

    let tree = next.block_tree(&"k1".into()).unwrap();
    assert_eq!(tree.ranges().len(), 1);
    assert_eq!(tree.ranges()[0].end, "zzz paragraph 1 with some words".len());
    assert_eq!(next.tree_map().len(), BLOCKS);
    // Neither decorator matches anything in the untouched blocks, so their trees are shared.
    assert_eq!(shared_trees(&state, &next), BLOCKS - 1);
}

#[test]
fn test_push_with_decorator_uses_it_for_new_trees() {
    let state = EditorState::create_with_content(document(), Some(char_decorator('!')))
        .accept_selection(SelectionState::collapsed("k4".into(), 0));
    let content = modifier::insert_text(
        state.current_content(),
        state.selection(),
        "!",
        &Default::default(),
    )
    .unwrap();
    let pushed = state.push(content, ChangeType::InsertCharacters);

    let tree = pushed.block_tree(&"k4".into()).unwrap();
    assert!(tree.ranges()[0].decoration_key.is_some());
    assert_eq!(tree.ranges()[0].end, 1);
}

#[test]
fn test_removing_and_restoring_decorator_rebuilds_every_tree() {
    let state = EditorState::create_with_content(document(), Some(char_decorator('p')))
        .set(EditorStatePatch::new().with_natively_rendered_content(Some(document())));
    assert!(state.natively_rendered_content().is_some());

    let plain = state.set(EditorStatePatch::new().with_decorator(None));
    assert!(plain.decorator().is_none());
    assert!(plain.natively_rendered_content().is_none());
    assert_eq!(shared_trees(&state, &plain), 0);
    assert_maps_cover_content(&plain);
    for key in keys(&plain) {
        let tree = plain.block_tree(&key).unwrap();
        assert!(tree.ranges().iter().all(|range| range.decoration_key.is_none()));
    }

    let decorated = plain.set(EditorStatePatch::new().with_decorator(Some(char_decorator('p'))));
    assert_eq!(shared_trees(&plain, &decorated), 0);
    assert_maps_cover_content(&decorated);
    let first = decorated.block_tree(&"k0".into()).unwrap();
    assert!(first.ranges()[0].decoration_key.is_some());
}
