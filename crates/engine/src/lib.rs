//! Block records for an infinite voxel map.
//!
//! A [`Block`](world::block::Block) packs a 16-bit id and a 16-bit meta value
//! into one word, carries a caller-defined flag word, and owns a schema-less
//! [`ExtendedMetadata`](world::metadata::ExtendedMetadata) bag for rare
//! per-instance properties. Locating, caching and persisting blocks is the
//! job of whatever container embeds them.

pub mod error;
pub mod world;

pub use error::{BlockError, Result};
