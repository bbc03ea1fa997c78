use std::path::Path;

use crate::decompress::open_archive;
use crate::error::PipelineError;
use crate::format::{BlockInfo, ContainerMeta};

/// Header-level facts about an archive, gathered without decompressing it.
#[derive(Debug, Clone)]
pub struct ArchiveSummary {
    pub meta: ContainerMeta,
    /// Total length of the archive file in bytes.
    pub archive_len: u64,
}

impl ArchiveSummary {
    pub fn block_size(&self) -> u64 {
        self.meta.block_size
    }

    pub fn blocks_count(&self) -> u64 {
        self.meta.blocks_count
    }

    /// Table entries in physical (body) order.
    pub fn blocks(&self) -> &[BlockInfo] {
        &self.meta.blocks
    }

    pub fn header_len(&self) -> u64 {
        self.meta.header_len().unwrap_or(self.archive_len)
    }

    /// Compressed bytes in the body.
    pub fn body_len(&self) -> u64 {
        self.meta.body_len()
    }

    /// Upper bound on the decompressed size; the final block may be shorter.
    pub fn max_raw_len(&self) -> u64 {
        self.meta.blocks_count.saturating_mul(self.meta.block_size)
    }

    /// Body offset of each block, in physical order, paired with its entry.
    pub fn physical_layout(&self) -> Vec<(u64, BlockInfo)> {
        let mut offset = self.header_len();
        self.meta
            .blocks
            .iter()
            .map(|info| {
                let at = offset;
                offset += info.compressed_size as u64;
                (at, *info)
            })
            .collect()
    }
}

/// Read and validate the header of `path`.
pub fn inspect_archive(path: impl AsRef<Path>) -> Result<ArchiveSummary, PipelineError> {
    let path = path.as_ref();
    let archive_len = std::fs::metadata(path)?.len();
    let (_, meta) = open_archive(path)?;
    Ok(ArchiveSummary { meta, archive_len })
}
