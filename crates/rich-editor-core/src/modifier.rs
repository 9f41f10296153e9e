//! Content transforms.
//!
//! Pure functions that derive a new [`ContentState`] from an existing one and a selection. Every
//! result records the input selection as its `selection_before` and the resulting caret or range
//! as its `selection_after` (keeping the input's focus flag), which is what [`EditorState::push`](crate::EditorState::push) uses to
//! place the caret and to build undo steps. Selection edges are taken in document order whatever
//! the selection's `is_backward` flag says.
//!
//! Transforms that have nothing to do (removing a collapsed range, deleting past the document
//! edge) return the input snapshot itself, so pushing the result is a no-op.

use crate::block::{
    BlockKey, BlockType, CharacterMetadata, ContentBlock, InlineStyle, byte_offset, char_offset,
};
use crate::content::{BlockMap, ContentState};
use crate::error::EditError;
use crate::selection::SelectionState;
use im::{HashSet, Vector};
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

/// Insert `text` at the selection, replacing any selected range.
///
/// Every inserted character carries `style`.
pub fn insert_text(
    content: &ContentState,
    selection: &SelectionState,
    text: &str,
    style: &InlineStyle,
) -> Result<ContentState, EditError> {
    let metadata = CharacterMetadata::styled(style.clone());
    let characters: Vector<CharacterMetadata> =
        std::iter::repeat_n(metadata, text.chars().count()).collect();
    insert_at_caret(content, selection, text, characters)
}

fn insert_at_caret(
    content: &ContentState,
    selection: &SelectionState,
    text: &str,
    characters: Vector<CharacterMetadata>,
) -> Result<ContentState, EditError> {
    let ordered = validate(content, selection)?;
    let removed = remove_selected(content, &ordered)?;
    let key = ordered.start_key();
    let offset = ordered.start_offset();
    let block = block_at(&removed, key, offset)?;

    let inserted = block.splice(offset, offset, text, characters);
    let caret = SelectionState::collapsed(key.clone(), offset + text.chars().count());
    Ok(finish(
        &removed,
        removed.block_map().with_block(Arc::new(inserted)),
        selection,
        caret,
    ))
}

/// Remove the selected range, joining its first and last block.
///
/// A collapsed selection returns `content` unchanged.
pub fn remove_range(
    content: &ContentState,
    selection: &SelectionState,
) -> Result<ContentState, EditError> {
    let ordered = validate(content, selection)?;
    if ordered.is_collapsed() {
        return Ok(content.clone());
    }
    let removed = remove_selected(content, &ordered)?;
    let caret = SelectionState::collapsed(ordered.start_key().clone(), ordered.start_offset());
    Ok(finish(&removed, removed.block_map().clone(), selection, caret))
}

/// Split the block at the caret, replacing any selected range first.
///
/// The new block below gets a fresh key and keeps the type and depth of the split block; the caret
/// moves to its start.
pub fn split_block(
    content: &ContentState,
    selection: &SelectionState,
) -> Result<ContentState, EditError> {
    let ordered = validate(content, selection)?;
    let removed = remove_selected(content, &ordered)?;
    let key = ordered.start_key();
    let offset = ordered.start_offset();
    let block = block_at(&removed, key, offset)?;

    let (tail_text, tail_characters) = block.slice(offset, block.len());
    let head = block.splice(offset, block.len(), "", Vector::new());
    let below_key = removed.generate_key();
    let below = ContentBlock::from_parts(
        below_key.clone(),
        block.block_type().clone(),
        tail_text,
        tail_characters,
    )
    .with_depth(block.depth());

    let block_map = removed
        .block_map()
        .with_block(Arc::new(head))
        .insert_after(key, [Arc::new(below)]);
    Ok(finish(
        &removed,
        block_map,
        selection,
        SelectionState::collapsed(below_key, 0),
    ))
}

/// Set the type of every block touched by the selection.
///
/// Returns `content` itself when every block already has `block_type`.
pub fn set_block_type(
    content: &ContentState,
    selection: &SelectionState,
    block_type: &BlockType,
) -> Result<ContentState, EditError> {
    map_selected_blocks(content, selection, |block| {
        (block.block_type() != block_type).then(|| block.with_block_type(block_type.clone()))
    })
}

/// Add `style` to every selected character.
///
/// A collapsed selection returns `content` unchanged.
pub fn apply_inline_style(
    content: &ContentState,
    selection: &SelectionState,
    style: &str,
) -> Result<ContentState, EditError> {
    map_selected_characters(content, selection, |metadata| CharacterMetadata {
        style: metadata.style.with(style),
        entity: metadata.entity.clone(),
    })
}

/// Remove `style` from every selected character.
///
/// A collapsed selection returns `content` unchanged.
pub fn remove_inline_style(
    content: &ContentState,
    selection: &SelectionState,
    style: &str,
) -> Result<ContentState, EditError> {
    map_selected_characters(content, selection, |metadata| CharacterMetadata {
        style: metadata.style.without(style),
        entity: metadata.entity.clone(),
    })
}

/// Shift the depth of every block touched by the selection by `delta`, clamped to
/// `0..=max_depth`.
pub fn adjust_block_depth(
    content: &ContentState,
    selection: &SelectionState,
    delta: i32,
    max_depth: usize,
) -> Result<ContentState, EditError> {
    map_selected_blocks(content, selection, |block| {
        let depth = block.depth().saturating_add_signed(delta as isize).min(max_depth);
        (depth != block.depth()).then(|| block.with_depth(depth))
    })
}

/// Replace the selection with `fragment`.
///
/// The first fragment block merges into the block at the caret and the last one absorbs the text
/// after the caret. Blocks in between are inserted with fresh keys.
pub fn replace_with_fragment(
    content: &ContentState,
    selection: &SelectionState,
    fragment: &[ContentBlock],
) -> Result<ContentState, EditError> {
    let (first, rest) = fragment.split_first().ok_or(EditError::EmptyFragment)?;
    if rest.is_empty() {
        return insert_at_caret(content, selection, first.text(), first.characters().clone());
    }

    let ordered = validate(content, selection)?;
    let removed = remove_selected(content, &ordered)?;
    let key = ordered.start_key();
    let offset = ordered.start_offset();
    let block = block_at(&removed, key, offset)?;

    let (tail_text, tail_characters) = block.slice(offset, block.len());
    let head = block.splice(offset, block.len(), first.text(), first.characters().clone());

    let mut taken: HashSet<BlockKey> = HashSet::new();
    let mut fresh_key = || {
        let key = BlockKey::generate_unique(|candidate| {
            removed.block_map().contains_key(candidate) || taken.contains(candidate)
        });
        taken.insert(key.clone());
        key
    };

    let mut inserted: Vec<Arc<ContentBlock>> = Vec::with_capacity(rest.len());
    let mut caret = SelectionState::collapsed(key.clone(), offset);
    for (index, fragment_block) in rest.iter().enumerate() {
        let new_key = fresh_key();
        let new_block = if index + 1 == rest.len() {
            caret = SelectionState::collapsed(new_key.clone(), fragment_block.len());
            let len = fragment_block.len();
            fragment_block
                .with_key(new_key)
                .splice(len, len, &tail_text, tail_characters.clone())
        } else {
            fragment_block.with_key(new_key)
        };
        inserted.push(Arc::new(new_block));
    }

    let block_map = removed
        .block_map()
        .with_block(Arc::new(head))
        .insert_after(key, inserted);
    Ok(finish(&removed, block_map, selection, caret))
}

/// Remove the grapheme cluster before a collapsed caret, or join the block with the one before it
/// when the caret is at the block start.
///
/// A non-collapsed selection is removed as a range. At the start of the document `content` is
/// returned unchanged.
pub fn remove_grapheme_backward(
    content: &ContentState,
    selection: &SelectionState,
) -> Result<ContentState, EditError> {
    if !selection.is_collapsed() {
        return remove_range(content, selection);
    }
    let key = selection.start_key();
    let offset = selection.start_offset();
    let block = block_at(content, key, offset)?;

    let target = if offset > 0 {
        let prefix = &block.text()[..byte_offset(block.text(), offset)];
        let start = prefix
            .grapheme_indices(true)
            .next_back()
            .map_or(0, |(byte, _)| char_offset(prefix, byte));
        SelectionState::range(key.clone(), start, key.clone(), offset)
    } else {
        match content.block_before(key) {
            Some(before) => {
                SelectionState::range(before.key().clone(), before.len(), key.clone(), 0)
            }
            None => return Ok(content.clone()),
        }
    };

    let removed = remove_range(content, &target.with_has_focus(selection.has_focus))?;
    Ok(removed.with_selection_before(selection.clone()))
}

/// Remove the grapheme cluster after a collapsed caret, or join the next block into this one when
/// the caret is at the block end.
///
/// A non-collapsed selection is removed as a range. At the end of the document `content` is
/// returned unchanged.
pub fn remove_grapheme_forward(
    content: &ContentState,
    selection: &SelectionState,
) -> Result<ContentState, EditError> {
    if !selection.is_collapsed() {
        return remove_range(content, selection);
    }
    let key = selection.start_key();
    let offset = selection.start_offset();
    let block = block_at(content, key, offset)?;

    let target = if offset < block.len() {
        let suffix = &block.text()[byte_offset(block.text(), offset)..];
        let width = suffix
            .graphemes(true)
            .next()
            .map_or(0, |grapheme| grapheme.chars().count());
        SelectionState::range(key.clone(), offset, key.clone(), offset + width)
    } else {
        match content.block_after(key) {
            Some(after) => SelectionState::range(key.clone(), offset, after.key().clone(), 0),
            None => return Ok(content.clone()),
        }
    };

    let removed = remove_range(content, &target.with_has_focus(selection.has_focus))?;
    Ok(removed.with_selection_before(selection.clone()))
}

/// Look up `key` and check that `offset` lies within it.
fn block_at<'a>(
    content: &'a ContentState,
    key: &BlockKey,
    offset: usize,
) -> Result<&'a Arc<ContentBlock>, EditError> {
    let block = content
        .block_for_key(key)
        .ok_or_else(|| EditError::UnknownBlock(key.clone()))?;
    if offset > block.len() {
        return Err(EditError::OffsetOutOfBounds {
            key: key.clone(),
            offset,
            len: block.len(),
        });
    }
    Ok(block)
}

/// Check both edges against `content` and return the selection with `is_backward` matching the
/// document order of its edges.
fn validate(
    content: &ContentState,
    selection: &SelectionState,
) -> Result<SelectionState, EditError> {
    block_at(content, &selection.anchor_key, selection.anchor_offset)?;
    block_at(content, &selection.focus_key, selection.focus_offset)?;

    let block_map = content.block_map();
    let anchor = (block_map.index_of(&selection.anchor_key), selection.anchor_offset);
    let focus = (block_map.index_of(&selection.focus_key), selection.focus_offset);
    let is_backward = focus < anchor;
    if is_backward == selection.is_backward {
        Ok(selection.clone())
    } else {
        Ok(selection.with_is_backward(is_backward))
    }
}

/// `content` with the range of an already validated `selection` removed; selections are left as
/// they were.
fn remove_selected(
    content: &ContentState,
    selection: &SelectionState,
) -> Result<ContentState, EditError> {
    if selection.is_collapsed() {
        return Ok(content.clone());
    }

    let (start_key, start_offset) = (selection.start_key(), selection.start_offset());
    let (end_key, end_offset) = (selection.end_key(), selection.end_offset());
    let start_block = block_at(content, start_key, start_offset)?;

    if start_key == end_key {
        let removed = start_block.splice(start_offset, end_offset, "", Vector::new());
        return Ok(content.with_block_map(content.block_map().with_block(Arc::new(removed))));
    }

    let end_block = block_at(content, end_key, end_offset)?;
    let (tail_text, tail_characters) = end_block.slice(end_offset, end_block.len());
    let joined = start_block.splice(start_offset, start_block.len(), &tail_text, tail_characters);

    let dropped: Vec<BlockKey> = content
        .block_map()
        .range(start_key, end_key)
        .iter()
        .skip(1)
        .map(|block| block.key().clone())
        .collect();
    let block_map = content
        .block_map()
        .with_block(Arc::new(joined))
        .without(dropped.iter());
    Ok(content.with_block_map(block_map))
}

/// Apply `update` to each block between the selection edges; `None` keeps the block as is.
fn map_selected_blocks(
    content: &ContentState,
    selection: &SelectionState,
    mut update: impl FnMut(&ContentBlock) -> Option<ContentBlock>,
) -> Result<ContentState, EditError> {
    let ordered = validate(content, selection)?;
    let mut block_map = content.block_map().clone();
    let mut changed = false;
    for block in content
        .block_map()
        .range(ordered.start_key(), ordered.end_key())
    {
        if let Some(updated) = update(&block) {
            block_map = block_map.with_block(Arc::new(updated));
            changed = true;
        }
    }
    if !changed {
        return Ok(content.clone());
    }
    Ok(finish(content, block_map, selection, selection.clone()))
}

/// Apply `update` to the metadata of each selected character.
fn map_selected_characters(
    content: &ContentState,
    selection: &SelectionState,
    update: impl Fn(&CharacterMetadata) -> CharacterMetadata,
) -> Result<ContentState, EditError> {
    let ordered = validate(content, selection)?;
    if ordered.is_collapsed() {
        return Ok(content.clone());
    }

    let (start_key, start_offset) = (ordered.start_key(), ordered.start_offset());
    let (end_key, end_offset) = (ordered.end_key(), ordered.end_offset());
    let mut block_map = content.block_map().clone();
    let mut changed = false;

    for block in content.block_map().range(start_key, end_key) {
        let from = if block.key() == start_key { start_offset } else { 0 };
        let to = if block.key() == end_key { end_offset } else { block.len() };
        if from >= to {
            continue;
        }
        let characters: Vector<CharacterMetadata> = block
            .characters()
            .iter()
            .enumerate()
            .map(|(index, metadata)| {
                if (from..to).contains(&index) {
                    update(metadata)
                } else {
                    metadata.clone()
                }
            })
            .collect();
        if &characters != block.characters() {
            block_map = block_map.with_block(Arc::new(block.with_characters(characters)));
            changed = true;
        }
    }

    if !changed {
        return Ok(content.clone());
    }
    Ok(finish(content, block_map, selection, selection.clone()))
}

/// Stamp the selections; `after` takes the focus flag of `before`.
fn finish(
    content: &ContentState,
    block_map: BlockMap,
    before: &SelectionState,
    after: SelectionState,
) -> ContentState {
    content
        .with_block_map(block_map)
        .with_selection_before(before.clone())
        .with_selection_after(after.with_has_focus(before.has_focus))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn content() -> ContentState {
        ContentState::create_from_blocks([
            ContentBlock::new("a", BlockType::Unstyled, "Hello"),
            ContentBlock::new("b", BlockType::HeaderOne, "World"),
            ContentBlock::new("c", BlockType::Unstyled, "Again"),
        ])
    }

    fn texts(content: &ContentState) -> Vec<String> {
        content
            .block_map()
            .iter()
            .map(|block| block.text().to_string())
            .collect()
    }

    #[test]
    fn test_insert_text_moves_caret() {
        let selection = SelectionState::collapsed("a".into(), 5);
        let bold = InlineStyle::of([InlineStyle::BOLD]);
        let result = insert_text(&content(), &selection, ", you", &bold).unwrap();

        assert_eq!(texts(&result)[0], "Hello, you");
        assert_eq!(result.selection_before(), &selection);
        assert_eq!(result.selection_after(), &SelectionState::collapsed("a".into(), 10));
        let block = result.block_for_key(&"a".into()).unwrap();
        assert!(block.inline_style_at(5).contains(InlineStyle::BOLD));
        assert!(block.inline_style_at(4).is_empty());
    }

    #[test]
    fn test_remove_range_across_blocks() {
        let selection = SelectionState::range("a".into(), 2, "c".into(), 1);
        let result = remove_range(&content(), &selection).unwrap();
        assert_eq!(texts(&result), vec!["Hegain"]);
        assert_eq!(result.selection_after(), &SelectionState::collapsed("a".into(), 2));
    }

    #[test]
    fn test_remove_collapsed_range_is_identity() {
        let content = content();
        let result = remove_range(&content, &SelectionState::collapsed("b".into(), 1)).unwrap();
        assert!(result.ptr_eq(&content));
    }

    #[test]
    fn test_split_block_keeps_type() {
        let selection = SelectionState::collapsed("b".into(), 2);
        let result = split_block(&content(), &selection).unwrap();
        assert_eq!(texts(&result), vec!["Hello", "Wo", "rld", "Again"]);

        let below = result.block_after(&"b".into()).unwrap();
        assert_eq!(below.block_type(), &BlockType::HeaderOne);
        assert_eq!(result.selection_after(), &SelectionState::collapsed(below.key().clone(), 0));
    }

    #[test]
    fn test_set_block_type_over_range() {
        let selection = SelectionState::range("a".into(), 0, "b".into(), 1);
        let result = set_block_type(&content(), &selection, &BlockType::Blockquote).unwrap();
        let types: Vec<BlockType> = result
            .block_map()
            .iter()
            .map(|block| block.block_type().clone())
            .collect();
        assert_eq!(
            types,
            vec![BlockType::Blockquote, BlockType::Blockquote, BlockType::Unstyled]
        );
    }

    #[test]
    fn test_inline_style_round_trip_on_range() {
        let content = content();
        let selection = SelectionState::range("a".into(), 3, "b".into(), 2);
        let styled = apply_inline_style(&content, &selection, InlineStyle::ITALIC).unwrap();

        let a = styled.block_for_key(&"a".into()).unwrap();
        let b = styled.block_for_key(&"b".into()).unwrap();
        assert!(!a.inline_style_at(2).contains(InlineStyle::ITALIC));
        assert!(a.inline_style_at(3).contains(InlineStyle::ITALIC));
        assert!(b.inline_style_at(1).contains(InlineStyle::ITALIC));
        assert!(!b.inline_style_at(2).contains(InlineStyle::ITALIC));
        assert!(Arc::ptr_eq(
            content.block_for_key(&"c".into()).unwrap(),
            styled.block_for_key(&"c".into()).unwrap()
        ));

        let cleared = remove_inline_style(&styled, &selection, InlineStyle::ITALIC).unwrap();
        assert_eq!(
            cleared.block_for_key(&"a".into()).unwrap().characters(),
            content.block_for_key(&"a".into()).unwrap().characters()
        );
    }

    #[test]
    fn test_adjust_depth_clamps() {
        let selection = SelectionState::collapsed("a".into(), 0);
        let deeper = adjust_block_depth(&content(), &selection, 3, 2).unwrap();
        assert_eq!(deeper.block_for_key(&"a".into()).unwrap().depth(), 2);
        let shallower = adjust_block_depth(&deeper, &selection, -5, 2).unwrap();
        assert_eq!(shallower.block_for_key(&"a".into()).unwrap().depth(), 0);
    }

    #[test]
    fn test_fragment_insertion() {
        let fragment = [
            ContentBlock::new("x", BlockType::Unstyled, "one"),
            ContentBlock::new("y", BlockType::Unstyled, "two"),
            ContentBlock::new("z", BlockType::CodeBlock, "three"),
        ];
        let selection = SelectionState::collapsed("a".into(), 2);
        let result = replace_with_fragment(&content(), &selection, &fragment).unwrap();

        assert_eq!(texts(&result), vec!["Heone", "two", "threello", "World", "Again"]);
        let last = result.block_before(&"b".into()).unwrap();
        assert_eq!(last.block_type(), &BlockType::CodeBlock);
        assert_eq!(result.selection_after(), &SelectionState::collapsed(last.key().clone(), 5));

        assert_eq!(
            replace_with_fragment(&content(), &selection, &[]).unwrap_err(),
            EditError::EmptyFragment
        );
    }

    #[test]
    fn test_grapheme_removal() {
        let content = ContentState::create_from_blocks([
            ContentBlock::new("a", BlockType::Unstyled, "ae\u{301}"),
            ContentBlock::new("b", BlockType::Unstyled, "👍🏽x"),
        ]);

        let backward =
            remove_grapheme_backward(&content, &SelectionState::collapsed("a".into(), 3)).unwrap();
        assert_eq!(texts(&backward), vec!["a", "👍🏽x"]);

        let forward =
            remove_grapheme_forward(&content, &SelectionState::collapsed("b".into(), 0)).unwrap();
        assert_eq!(texts(&forward), vec!["ae\u{301}", "x"]);

        let merged =
            remove_grapheme_backward(&content, &SelectionState::collapsed("b".into(), 0)).unwrap();
        assert_eq!(texts(&merged), vec!["ae\u{301}👍🏽x"]);
        assert_eq!(merged.selection_after(), &SelectionState::collapsed("a".into(), 3));

        let at_start =
            remove_grapheme_backward(&content, &SelectionState::collapsed("a".into(), 0)).unwrap();
        assert!(at_start.ptr_eq(&content));
        let at_end =
            remove_grapheme_forward(&content, &SelectionState::collapsed("b".into(), 3)).unwrap();
        assert!(at_end.ptr_eq(&content));
    }

    #[test]
    fn test_invalid_selection_is_rejected() {
        let content = content();
        assert_eq!(
            insert_text(
                &content,
                &SelectionState::collapsed("zz".into(), 0),
                "x",
                &InlineStyle::new()
            )
            .unwrap_err(),
            EditError::UnknownBlock("zz".into())
        );
        assert_eq!(
            split_block(&content, &SelectionState::collapsed("a".into(), 9)).unwrap_err(),
            EditError::OffsetOutOfBounds {
                key: "a".into(),
                offset: 9,
                len: 5
            }
        );
    }

    #[test]
    fn test_post_edit_caret_keeps_focus() {
        let content = content();
        let focused = SelectionState::collapsed("a".into(), 5).with_has_focus(true);

        let typed = insert_text(&content, &focused, "!", &InlineStyle::new()).unwrap();
        assert_eq!(
            typed.selection_after(),
            &SelectionState::collapsed("a".into(), 6).with_has_focus(true)
        );

        let split = split_block(&content, &focused).unwrap();
        assert!(split.selection_after().has_focus);

        let at_b = SelectionState::collapsed("b".into(), 0).with_has_focus(true);
        let merged = remove_grapheme_backward(&content, &at_b).unwrap();
        assert_eq!(
            merged.selection_after(),
            &SelectionState::collapsed("a".into(), 5).with_has_focus(true)
        );
        assert_eq!(merged.selection_before(), &at_b);

        let deleted = remove_grapheme_forward(&content, &focused).unwrap();
        assert!(deleted.selection_after().has_focus);
    }

    #[test]
    fn test_edges_are_taken_in_document_order() {
        let content = ContentState::create_from_blocks([
            ContentBlock::new("one", BlockType::Unstyled, "one"),
            ContentBlock::new("two", BlockType::Unstyled, "two"),
        ]);
        // Focus precedes anchor but the selection is not flagged backward.
        let inverted = SelectionState::range("two".into(), 1, "one".into(), 1);

        let removed = remove_range(&content, &inverted).unwrap();
        assert_eq!(texts(&removed), vec!["owo"]);
        assert_eq!(removed.selection_after(), &SelectionState::collapsed("one".into(), 1));

        let quoted = set_block_type(&content, &inverted, &BlockType::Blockquote).unwrap();
        assert!(
            quoted
                .block_map()
                .iter()
                .all(|block| block.block_type() == &BlockType::Blockquote)
        );

        let bold = apply_inline_style(&content, &inverted, InlineStyle::BOLD).unwrap();
        let bold_at = |key: &str, offset: usize| {
            bold.block_for_key(&BlockKey::from(key))
                .unwrap()
                .inline_style_at(offset)
                .contains(InlineStyle::BOLD)
        };
        assert!(!bold_at("one", 0));
        assert!(bold_at("one", 1));
        assert!(bold_at("two", 0));
        assert!(!bold_at("two", 1));
    }
}
