//! The per-cell record of the map and its extended properties.
//!
//! Containers that index blocks by coordinate, and anything that persists
//! them, live outside this crate. They drive a block through
//! [`Block::write`](block::Block::write) / [`Block::read`](block::Block::read)
//! for the fixed fields and
//! [`Block::metadata_buffer`](block::Block::metadata_buffer) /
//! [`ExtendedMetadata::deserialize`](metadata::ExtendedMetadata::deserialize)
//! for the optional bag.

pub mod block;
pub mod metadata;
pub mod nbt;

pub use block::{BLOCK_ENCODED_LEN, Block, BlockId, BlockMeta};
pub use metadata::{ExtendedMetadata, MetaKind, MetaValue};
