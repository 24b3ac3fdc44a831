use std::io::{ErrorKind, Read, Write};

use super::metadata::ExtendedMetadata;
use crate::error::{BlockError, Result};

/// Size of a block's fixed fields on the wire: `block_data` then `flags`,
/// each a little-endian `u32`.
pub const BLOCK_ENCODED_LEN: usize = 8;

/// Opaque block identifier. Stored without interpretation; whoever assigns
/// ids decides what they mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlockId(pub u16);

impl BlockId {
    pub const fn new(id: u16) -> Self {
        Self(id)
    }
}

/// Opaque per-id variant value, packed next to the [`BlockId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlockMeta(pub u16);

impl BlockMeta {
    pub const fn new(meta: u16) -> Self {
        Self(meta)
    }
}

#[inline]
const fn pack(id: BlockId, meta: BlockMeta) -> u32 {
    (id.0 as u32) | ((meta.0 as u32) << 16)
}

/// One cell of the map.
///
/// `block_data` packs the id (low 16 bits) and meta (high 16 bits) so large
/// collections of blocks stay compact. Setting either half is a
/// read-modify-write that leaves the other half alone.
///
/// Extended metadata is always present and owned by this block alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    block_data: u32,
    flags: u32,
    metadata: ExtendedMetadata,
}

impl Block {
    pub fn new(block_data: u32, flags: u32) -> Self {
        Self {
            block_data,
            flags,
            metadata: ExtendedMetadata::new(),
        }
    }

    pub fn from_parts(id: BlockId, meta: BlockMeta, flags: u32) -> Self {
        Self::new(pack(id, meta), flags)
    }

    /// The packed id/meta word.
    pub const fn block_data(&self) -> u32 {
        self.block_data
    }

    pub const fn block_id(&self) -> BlockId {
        BlockId((self.block_data & 0xFFFF) as u16)
    }

    pub fn set_block_id(&mut self, id: BlockId) {
        self.block_data = pack(id, self.block_meta());
    }

    pub const fn block_meta(&self) -> BlockMeta {
        BlockMeta(((self.block_data >> 16) & 0xFFFF) as u16)
    }

    pub fn set_block_meta(&mut self, meta: BlockMeta) {
        self.block_data = pack(self.block_id(), meta);
    }

    pub const fn flags(&self) -> u32 {
        self.flags
    }

    pub fn set_flags(&mut self, flags: u32) {
        self.flags = flags;
    }

    /// True if every bit of `mask` is set.
    pub const fn has_flags(&self, mask: u32) -> bool {
        self.flags & mask == mask
    }

    pub fn insert_flags(&mut self, mask: u32) {
        self.flags |= mask;
    }

    pub fn remove_flags(&mut self, mask: u32) {
        self.flags &= !mask;
    }

    pub fn metadata(&self) -> &ExtendedMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut ExtendedMetadata {
        &mut self.metadata
    }

    /// Encoded extended metadata; zero-length when there is none.
    pub fn metadata_buffer(&self) -> Result<Vec<u8>> {
        self.metadata.serialize()
    }

    /// Write the fixed fields ([`BLOCK_ENCODED_LEN`] bytes). Extended
    /// metadata is not included; see [`metadata_buffer`](Self::metadata_buffer).
    pub fn write<W: Write>(&self, sink: &mut W) -> Result<()> {
        let mut buf = [0u8; BLOCK_ENCODED_LEN];
        buf[0..4].copy_from_slice(&self.block_data.to_le_bytes());
        buf[4..8].copy_from_slice(&self.flags.to_le_bytes());
        sink.write_all(&buf)?;
        tracing::trace!("Wrote block data={:#010x} flags={:#010x}", self.block_data, self.flags);
        Ok(())
    }

    /// Read the fixed fields written by [`write`](Self::write).
    ///
    /// Both fields are committed only after all eight bytes have arrived;
    /// on any error the block is unchanged. Extended metadata is untouched.
    pub fn read<R: Read>(&mut self, source: &mut R) -> Result<()> {
        let mut buf = [0u8; BLOCK_ENCODED_LEN];
        source.read_exact(&mut buf).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => BlockError::StreamExhausted {
                expected: BLOCK_ENCODED_LEN,
            },
            _ => BlockError::Io(e),
        })?;

        let [d0, d1, d2, d3, f0, f1, f2, f3] = buf;
        self.block_data = u32::from_le_bytes([d0, d1, d2, d3]);
        self.flags = u32::from_le_bytes([f0, f1, f2, f3]);
        tracing::trace!("Read block data={:#010x} flags={:#010x}", self.block_data, self.flags);
        Ok(())
    }

    /// Decode a fresh block (empty metadata) from `source`.
    pub fn read_from<R: Read>(source: &mut R) -> Result<Self> {
        let mut block = Self::default();
        block.read(source)?;
        Ok(block)
    }
}
