//! Error types for block encoding and extended metadata.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BlockError>;

#[derive(Debug, Error)]
pub enum BlockError {
    /// A dynamically-typed value was offered to the metadata bag that is not
    /// a scalar, string or date/time. The bag is left unchanged.
    #[error("unsupported metadata value type for key {key:?}: {type_name}")]
    UnsupportedType { key: String, type_name: String },

    /// The source ran dry before a full block record was read.
    #[error("stream exhausted: expected {expected} bytes")]
    StreamExhausted { expected: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("NBT error: {0}")]
    Nbt(#[from] fastnbt::error::Error),

    #[error("malformed metadata document: {0}")]
    MalformedMetadata(String),
}
