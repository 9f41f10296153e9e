use crate::block::BlockKey;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors produced by content transforms and edit commands.
///
/// State transitions themselves never fail; these errors only arise when a transform is asked to
/// operate on a selection that does not fit the content it is applied to.
pub enum EditError {
    #[error("unknown block key '{0}'")]
    /// The selection references a block that is not in the content.
    UnknownBlock(BlockKey),

    #[error("offset {offset} is out of bounds for block '{key}' (length {len})")]
    /// The selection offset lies past the end of its block.
    OffsetOutOfBounds {
        /// The block the offset refers to.
        key: BlockKey,
        /// The offending offset.
        offset: usize,
        /// Length of the block in characters.
        len: usize,
    },

    #[error("fragment must contain at least one block")]
    /// A fragment insertion was given no blocks.
    EmptyFragment,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown change type '{0}'")]
/// A change-type name that does not match any [`ChangeType`](crate::ChangeType).
pub struct ParseChangeTypeError(pub String);
