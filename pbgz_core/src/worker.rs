//! Per-item work done by each pool thread, one function per direction.

use std::io::{Seek, Write};

use tracing::trace;

use crate::codec::Codec;
use crate::error::PipelineError;
use crate::source::{ArchiveBlock, RawBlock};
use crate::writer::{ArchiveWriter, PositionedWriter};

/// Compress one block and hand it to the archive writer.
///
/// The codec call runs outside the writer lock; only the append is serialized.
pub fn compress_block<W: Write + Seek>(
    codec: &dyn Codec,
    writer: &ArchiveWriter<W>,
    block: RawBlock,
) -> Result<(), PipelineError> {
    let compressed = codec
        .compress_block(&block.payload)
        .map_err(PipelineError::Codec)?;
    trace!(
        order_number = block.order_number,
        raw = block.payload.len(),
        compressed = compressed.len(),
        "block compressed"
    );
    writer.append_block(&compressed, block.order_number)
}

/// Decompress one block and write it at `order_number * block_size`.
pub fn decompress_block<W: Write + Seek>(
    codec: &dyn Codec,
    writer: &PositionedWriter<W>,
    block: ArchiveBlock,
) -> Result<(), PipelineError> {
    let offset = block.output_offset().ok_or_else(|| {
        PipelineError::Format(format!(
            "block {} offset overflows with block size {}",
            block.info.order_number, block.block_size
        ))
    })?;
    let raw = codec
        .decompress_block(&block.payload)
        .map_err(PipelineError::Codec)?;
    trace!(
        order_number = block.info.order_number,
        offset,
        raw = raw.len(),
        "block decompressed"
    );
    writer.write_at(offset, &raw)
}
