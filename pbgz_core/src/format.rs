use std::io::{self, Read};

use crate::error::PipelineError;

/// Size of the fixed header prefix in bytes.
///   blocks_count:u64 + block_size:u64 = 16
pub const HEADER_PREFIX_SIZE: u64 = 16;

/// Size of each BlockInfo entry in the block table, in bytes.
///   order_number:u32 + compressed_size:u32 = 8
pub const BLOCK_INFO_SIZE: u64 = 8;

/// Default block size: 1 MiB.
pub const DEFAULT_BLOCK_SIZE: u32 = 1024 * 1024;

/// Number of blocks needed to hold `total_len` bytes split into `block_size`
/// chunks. An empty input has zero blocks.
pub fn blocks_for_len(total_len: u64, block_size: u64) -> u64 {
    if block_size == 0 {
        return 0;
    }
    total_len.div_ceil(block_size)
}

/// Byte length of a header describing `blocks_count` blocks, or `None` if it
/// does not fit in a u64.
pub fn header_len(blocks_count: u64) -> Option<u64> {
    blocks_count
        .checked_mul(BLOCK_INFO_SIZE)?
        .checked_add(HEADER_PREFIX_SIZE)
}

// ── Block table entry ───────────────────────────────────────────────────────

/// One entry of the block table.
///
/// Entries are stored in physical write order. `order_number` is the logical
/// position of the block in the original file, so the table need not be sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    pub order_number: u32,
    /// Number of compressed bytes this block occupies in the archive body.
    pub compressed_size: u32,
}

impl BlockInfo {
    /// Serialize to exactly `BLOCK_INFO_SIZE` bytes.
    pub fn to_bytes(&self) -> [u8; BLOCK_INFO_SIZE as usize] {
        let mut buf = [0u8; BLOCK_INFO_SIZE as usize];
        buf[0..4].copy_from_slice(&self.order_number.to_le_bytes());
        buf[4..8].copy_from_slice(&self.compressed_size.to_le_bytes());
        buf
    }

    /// Deserialize from `BLOCK_INFO_SIZE` bytes.
    pub fn from_bytes(buf: &[u8; BLOCK_INFO_SIZE as usize]) -> Self {
        let mut order = [0u8; 4];
        let mut size = [0u8; 4];
        order.copy_from_slice(&buf[0..4]);
        size.copy_from_slice(&buf[4..8]);
        Self {
            order_number: u32::from_le_bytes(order),
            compressed_size: u32::from_le_bytes(size),
        }
    }
}

// ── Header ──────────────────────────────────────────────────────────────────

/// Decoded representation of the archive header.
///
/// # Layout (all integers little-endian)
/// ```text
/// [8 bytes]  blocks_count
/// [8 bytes]  block_size      original (uncompressed) size of every block but the last
/// [8 bytes × blocks_count]   BlockInfo entries, in physical write order
/// [body]     compressed blocks, concatenated in table order
/// ```
///
/// There is no magic marker. A file that is structurally inconsistent with
/// its declared counts is rejected while reading the table or the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerMeta {
    pub block_size: u64,
    pub blocks_count: u64,
    pub blocks: Vec<BlockInfo>,
}

impl ContainerMeta {
    /// Empty table for a run expected to produce `blocks_count` blocks.
    pub fn new(block_size: u64, blocks_count: u64) -> Self {
        Self {
            block_size,
            blocks_count,
            blocks: Vec::new(),
        }
    }

    /// Bytes reserved at the start of the archive for this header.
    pub fn header_len(&self) -> Option<u64> {
        header_len(self.blocks_count)
    }

    /// Record a block appended to the body.
    pub fn insert_block(&mut self, info: BlockInfo) {
        self.blocks.push(info);
    }

    /// Total compressed bytes described by the table.
    pub fn body_len(&self) -> u64 {
        self.blocks.iter().map(|b| b.compressed_size as u64).sum()
    }

    /// Output offset of the block with logical index `order_number`.
    pub fn block_offset(&self, order_number: u32) -> Option<u64> {
        (order_number as u64).checked_mul(self.block_size)
    }

    /// Serialize the prefix followed by every recorded table entry.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf =
            Vec::with_capacity(HEADER_PREFIX_SIZE as usize + self.blocks.len() * BLOCK_INFO_SIZE as usize);
        buf.extend_from_slice(&self.blocks_count.to_le_bytes());
        buf.extend_from_slice(&self.block_size.to_le_bytes());
        for info in &self.blocks {
            buf.extend_from_slice(&info.to_bytes());
        }
        buf
    }

    /// Parse a full header from `reader`, which must be positioned at offset 0.
    ///
    /// `archive_len` is the total length of the archive. A declared table that
    /// cannot fit in it is rejected before anything is allocated for it.
    pub fn read_from<R: Read>(reader: &mut R, archive_len: u64) -> Result<Self, PipelineError> {
        let mut prefix = [0u8; HEADER_PREFIX_SIZE as usize];
        read_exact_or_format(reader, &mut prefix, "header")?;

        let mut word = [0u8; 8];
        word.copy_from_slice(&prefix[0..8]);
        let blocks_count = u64::from_le_bytes(word);
        word.copy_from_slice(&prefix[8..16]);
        let block_size = u64::from_le_bytes(word);

        match header_len(blocks_count) {
            Some(len) if len <= archive_len => {}
            _ => {
                return Err(PipelineError::Format(format!(
                    "block table of {blocks_count} entries does not fit in a {archive_len} byte archive"
                )))
            }
        }

        let mut blocks = Vec::with_capacity(blocks_count as usize);
        let mut entry = [0u8; BLOCK_INFO_SIZE as usize];
        for _ in 0..blocks_count {
            read_exact_or_format(reader, &mut entry, "block table")?;
            blocks.push(BlockInfo::from_bytes(&entry));
        }

        Ok(Self {
            block_size,
            blocks_count,
            blocks,
        })
    }
}

/// `read_exact` that reports a premature end of file as a format error.
pub(crate) fn read_exact_or_format<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    what: &str,
) -> Result<(), PipelineError> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => {
            PipelineError::Format(format!("archive truncated while reading {what}"))
        }
        _ => PipelineError::Io(e),
    })
}
