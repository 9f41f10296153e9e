//! Content blocks and per-character metadata.
//!
//! A [`ContentBlock`] is one paragraph-level unit of the document: a type tag, its raw text, and
//! one [`CharacterMetadata`] per character (inline style set + optional entity). Blocks are
//! immutable; every update returns a new block and leaves the original untouched, so unchanged
//! blocks can be shared by reference between successive content snapshots.
//!
//! All offsets are expressed in Unicode scalar values (`char`), never bytes.

use im::{OrdSet, Vector};
use rand::Rng;
use std::borrow::Borrow;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Stable identifier of a block inside a [`ContentState`](crate::ContentState).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockKey(Arc<str>);

impl BlockKey {
    const GENERATED_LEN: usize = 5;
    const ALPHABET: &'static [u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    /// Create a block key from any string-like value.
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        Self(key.into())
    }

    /// Borrow the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Generate a random 5-character base-36 key for which `is_taken` returns `false`.
    pub fn generate_unique(mut is_taken: impl FnMut(&BlockKey) -> bool) -> Self {
        let mut rng = rand::thread_rng();
        loop {
            let key: String = (0..Self::GENERATED_LEN)
                .map(|_| Self::ALPHABET[rng.gen_range(0..Self::ALPHABET.len())] as char)
                .collect();
            let key = Self::new(key);
            if !is_taken(&key) {
                return key;
            }
        }
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for BlockKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BlockKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for BlockKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Identifier of an entity (link, mention, image, ...) attached to characters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityKey(Arc<str>);

impl EntityKey {
    /// Create an entity key.
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        Self(key.into())
    }

    /// Borrow the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Block type tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum BlockType {
    /// Plain paragraph.
    #[default]
    Unstyled,
    /// Level 1 heading.
    HeaderOne,
    /// Level 2 heading.
    HeaderTwo,
    /// Level 3 heading.
    HeaderThree,
    /// Level 4 heading.
    HeaderFour,
    /// Level 5 heading.
    HeaderFive,
    /// Level 6 heading.
    HeaderSix,
    /// Block quotation.
    Blockquote,
    /// Preformatted code.
    CodeBlock,
    /// Bulleted list item.
    UnorderedListItem,
    /// Numbered list item.
    OrderedListItem,
    /// Atomic (media/embed) block.
    Atomic,
    /// Application-defined block type.
    Custom(Arc<str>),
}

impl BlockType {
    /// The kebab-case name of this block type (e.g. `"header-one"`).
    pub fn as_str(&self) -> &str {
        match self {
            BlockType::Unstyled => "unstyled",
            BlockType::HeaderOne => "header-one",
            BlockType::HeaderTwo => "header-two",
            BlockType::HeaderThree => "header-three",
            BlockType::HeaderFour => "header-four",
            BlockType::HeaderFive => "header-five",
            BlockType::HeaderSix => "header-six",
            BlockType::Blockquote => "blockquote",
            BlockType::CodeBlock => "code-block",
            BlockType::UnorderedListItem => "unordered-list-item",
            BlockType::OrderedListItem => "ordered-list-item",
            BlockType::Atomic => "atomic",
            BlockType::Custom(name) => name,
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = Infallible;

    /// Unknown names become [`BlockType::Custom`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "unstyled" => BlockType::Unstyled,
            "header-one" => BlockType::HeaderOne,
            "header-two" => BlockType::HeaderTwo,
            "header-three" => BlockType::HeaderThree,
            "header-four" => BlockType::HeaderFour,
            "header-five" => BlockType::HeaderFive,
            "header-six" => BlockType::HeaderSix,
            "blockquote" => BlockType::Blockquote,
            "code-block" => BlockType::CodeBlock,
            "unordered-list-item" => BlockType::UnorderedListItem,
            "ordered-list-item" => BlockType::OrderedListItem,
            "atomic" => BlockType::Atomic,
            other => BlockType::Custom(Arc::from(other)),
        })
    }
}

/// An ordered set of inline style names (e.g. `{BOLD, ITALIC}`).
///
/// Backed by a persistent set, so cloning is O(1) and styles can be shared between characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct InlineStyle(OrdSet<Arc<str>>);

impl InlineStyle {
    /// Bold text.
    pub const BOLD: &'static str = "BOLD";
    /// Italic text.
    pub const ITALIC: &'static str = "ITALIC";
    /// Underlined text.
    pub const UNDERLINE: &'static str = "UNDERLINE";
    /// Struck-through text.
    pub const STRIKETHROUGH: &'static str = "STRIKETHROUGH";
    /// Monospace/code text.
    pub const CODE: &'static str = "CODE";

    /// The empty style set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a style set from style names.
    pub fn of<I, S>(styles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(styles.into_iter().map(|s| Arc::from(s.as_ref())).collect())
    }

    /// Returns `true` if `style` is in the set.
    pub fn contains(&self, style: &str) -> bool {
        self.0.contains(style)
    }

    /// A copy of this set with `style` added.
    pub fn with(&self, style: &str) -> Self {
        Self(self.0.update(Arc::from(style)))
    }

    /// A copy of this set with `style` removed.
    pub fn without(&self, style: &str) -> Self {
        Self(self.0.without(style))
    }

    /// A copy of this set with `style` added if absent, removed if present.
    pub fn toggled(&self, style: &str) -> Self {
        if self.contains(style) {
            self.without(style)
        } else {
            self.with(style)
        }
    }

    /// Returns `true` if no style is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of styles in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate style names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|s| &**s)
    }
}

impl<S: AsRef<str>> FromIterator<S> for InlineStyle {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::of(iter)
    }
}

/// Style and entity annotations of a single character.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CharacterMetadata {
    /// Inline styles applied to the character.
    pub style: InlineStyle,
    /// Entity the character belongs to, if any.
    pub entity: Option<EntityKey>,
}

impl CharacterMetadata {
    /// Create character metadata.
    pub fn new(style: InlineStyle, entity: Option<EntityKey>) -> Self {
        Self { style, entity }
    }

    /// Metadata with the given style and no entity.
    pub fn styled(style: InlineStyle) -> Self {
        Self {
            style,
            entity: None,
        }
    }
}

/// One paragraph-level unit of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentBlock {
    key: BlockKey,
    block_type: BlockType,
    text: String,
    characters: Vector<CharacterMetadata>,
    depth: usize,
}

impl ContentBlock {
    /// Create a block whose characters carry no style and no entity.
    pub fn new(key: impl Into<BlockKey>, block_type: BlockType, text: impl Into<String>) -> Self {
        let text = text.into();
        let characters = std::iter::repeat_n(CharacterMetadata::default(), text.chars().count())
            .collect();
        Self {
            key: key.into(),
            block_type,
            text,
            characters,
            depth: 0,
        }
    }

    /// Create a block whose characters all carry `metadata`.
    pub fn styled(
        key: impl Into<BlockKey>,
        block_type: BlockType,
        text: impl Into<String>,
        metadata: CharacterMetadata,
    ) -> Self {
        let text = text.into();
        let characters = std::iter::repeat_n(metadata, text.chars().count()).collect();
        Self {
            key: key.into(),
            block_type,
            text,
            characters,
            depth: 0,
        }
    }

    /// Create a block from explicit parts.
    ///
    /// `characters` must hold exactly one entry per `char` of `text`; missing entries are filled
    /// with default metadata and extra entries are dropped.
    pub fn from_parts(
        key: impl Into<BlockKey>,
        block_type: BlockType,
        text: impl Into<String>,
        characters: Vector<CharacterMetadata>,
    ) -> Self {
        let text = text.into();
        let characters = normalize_characters(characters, text.chars().count());
        Self {
            key: key.into(),
            block_type,
            text,
            characters,
            depth: 0,
        }
    }

    /// Block key.
    pub fn key(&self) -> &BlockKey {
        &self.key
    }

    /// Block type tag.
    pub fn block_type(&self) -> &BlockType {
        &self.block_type
    }

    /// Raw text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Per-character metadata (one entry per `char`).
    pub fn characters(&self) -> &Vector<CharacterMetadata> {
        &self.characters
    }

    /// Nesting depth (list indentation).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.characters.len()
    }

    /// Returns `true` if the block has no text.
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    /// Metadata of the character at `offset`.
    pub fn character_at(&self, offset: usize) -> Option<&CharacterMetadata> {
        self.characters.get(offset)
    }

    /// Inline style of the character at `offset` (empty when out of range).
    pub fn inline_style_at(&self, offset: usize) -> InlineStyle {
        self.characters
            .get(offset)
            .map(|c| c.style.clone())
            .unwrap_or_default()
    }

    /// Entity of the character at `offset`.
    pub fn entity_at(&self, offset: usize) -> Option<&EntityKey> {
        self.characters.get(offset).and_then(|c| c.entity.as_ref())
    }

    /// Text and metadata of the character range `start..end`, clamped to the block.
    pub fn slice(&self, start: usize, end: usize) -> (String, Vector<CharacterMetadata>) {
        let end = end.min(self.len());
        let start = start.min(end);
        let text = self.text[byte_offset(&self.text, start)..byte_offset(&self.text, end)]
            .to_string();
        (text, self.characters.clone().slice(start..end))
    }

    /// Replace the character range `start..end` with `text`/`characters`.
    ///
    /// Offsets are clamped to the block; `characters` is normalized to the length of `text`.
    pub fn splice(
        &self,
        start: usize,
        end: usize,
        text: &str,
        characters: Vector<CharacterMetadata>,
    ) -> Self {
        let end = end.min(self.len());
        let start = start.min(end);
        let start_byte = byte_offset(&self.text, start);
        let end_byte = byte_offset(&self.text, end);

        let mut new_text = String::with_capacity(self.text.len() + text.len());
        new_text.push_str(&self.text[..start_byte]);
        new_text.push_str(text);
        new_text.push_str(&self.text[end_byte..]);

        let inserted = normalize_characters(characters, text.chars().count());
        let mut new_characters = self.characters.clone();
        let tail = new_characters.split_off(end);
        new_characters.truncate(start);
        new_characters.append(inserted);
        new_characters.append(tail);

        Self {
            text: new_text,
            characters: new_characters,
            ..self.clone()
        }
    }

    /// A copy of this block with a different key.
    pub fn with_key(&self, key: BlockKey) -> Self {
        Self {
            key,
            ..self.clone()
        }
    }

    /// A copy of this block with a different type.
    pub fn with_block_type(&self, block_type: BlockType) -> Self {
        Self {
            block_type,
            ..self.clone()
        }
    }

    /// A copy of this block with a different depth.
    pub fn with_depth(&self, depth: usize) -> Self {
        Self {
            depth,
            ..self.clone()
        }
    }

    /// A copy of this block with the same text and new per-character metadata.
    pub fn with_characters(&self, characters: Vector<CharacterMetadata>) -> Self {
        Self {
            characters: normalize_characters(characters, self.len()),
            ..self.clone()
        }
    }
}

/// Byte index of the `char_offset`-th character of `text` (or `text.len()` past the end).
pub(crate) fn byte_offset(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

/// Character offset of byte index `byte` in `text`.
pub(crate) fn char_offset(text: &str, byte: usize) -> usize {
    text[..byte].chars().count()
}

fn normalize_characters(
    mut characters: Vector<CharacterMetadata>,
    len: usize,
) -> Vector<CharacterMetadata> {
    if characters.len() > len {
        characters.truncate(len);
    }
    while characters.len() < len {
        characters.push_back(CharacterMetadata::default());
    }
    characters
}
