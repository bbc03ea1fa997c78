use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::sync::{Mutex, MutexGuard};

use crate::error::PipelineError;
use crate::format::{BlockInfo, ContainerMeta};

/// Append-mode writer for the archive body, shared by every compression worker.
///
/// # Write contract
/// Workers call [`append_block`] concurrently, in whatever order they finish.
/// Each call appends the bytes at the cursor and records a [`BlockInfo`] as a
/// single critical section. Once the run succeeded, [`write_final_info`]
/// seals the file by writing the header into the reserved region.
///
/// # Format layout written
/// ```text
/// [HEADER: 16 + 8 × blocks_count bytes, reserved up front]
/// [BLOCK a] [BLOCK b] ...                  ← completion order, not logical order
/// ← seek back to 0, write header with the table in the same order
/// ```
///
/// [`append_block`]: ArchiveWriter::append_block
/// [`write_final_info`]: ArchiveWriter::write_final_info
pub struct ArchiveWriter<W = File> {
    state: Mutex<ArchiveState<W>>,
}

struct ArchiveState<W> {
    sink: W,
    /// Current write position in the sink (mirrors the sink cursor).
    cursor: u64,
    meta: ContainerMeta,
}

impl<W: Write + Seek> ArchiveWriter<W> {
    /// Reserve header space for `blocks_count` blocks and position the cursor
    /// right after it.
    pub fn new(mut sink: W, block_size: u32, blocks_count: u64) -> Result<Self, PipelineError> {
        let meta = ContainerMeta::new(block_size as u64, blocks_count);
        let header_len = meta
            .header_len()
            .ok_or_else(|| PipelineError::Format(format!("cannot reserve a header for {blocks_count} blocks")))?;
        sink.seek(SeekFrom::Start(header_len))?;
        Ok(Self {
            state: Mutex::new(ArchiveState {
                sink,
                cursor: header_len,
                meta,
            }),
        })
    }

    /// Append one compressed block and record it in the table.
    pub fn append_block(&self, bytes: &[u8], order_number: u32) -> Result<(), PipelineError> {
        let compressed_size = u32::try_from(bytes.len()).map_err(|_| {
            PipelineError::Format(format!(
                "block {order_number} compressed to {} bytes, more than the 32-bit size field holds",
                bytes.len()
            ))
        })?;

        let mut state = self.lock()?;
        if state.meta.blocks.len() as u64 >= state.meta.blocks_count {
            return Err(PipelineError::Format(format!(
                "block {order_number} exceeds the {} blocks reserved in the header; source grew during compression",
                state.meta.blocks_count
            )));
        }
        state.sink.write_all(bytes)?;
        state.cursor += bytes.len() as u64;
        state.meta.insert_block(BlockInfo {
            order_number,
            compressed_size,
        });
        Ok(())
    }

    /// Write the header with the table in the order blocks were appended.
    ///
    /// Fails if the number of appended blocks differs from the number the
    /// header was reserved for. Returns the header that was written.
    pub fn write_final_info(&self) -> Result<ContainerMeta, PipelineError> {
        let mut state = self.lock()?;
        let written = state.meta.blocks.len() as u64;
        if written != state.meta.blocks_count {
            return Err(PipelineError::Format(format!(
                "{written} blocks written but {} reserved; source changed during compression",
                state.meta.blocks_count
            )));
        }
        let header = state.meta.to_bytes();
        state.sink.seek(SeekFrom::Start(0))?;
        state.sink.write_all(&header)?;
        state.sink.flush()?;
        let end = state.cursor;
        state.sink.seek(SeekFrom::Start(end))?;
        Ok(state.meta.clone())
    }

    /// Bytes written so far, header reservation included.
    pub fn position(&self) -> Result<u64, PipelineError> {
        Ok(self.lock()?.cursor)
    }

    pub fn into_inner(self) -> Result<W, PipelineError> {
        self.state
            .into_inner()
            .map(|state| state.sink)
            .map_err(|_| PipelineError::Poisoned)
    }

    fn lock(&self) -> Result<MutexGuard<'_, ArchiveState<W>>, PipelineError> {
        self.state.lock().map_err(|_| PipelineError::Poisoned)
    }
}

/// Positioned writer for the decompressed output, shared by every
/// decompression worker.
///
/// [`write_at`] moves the cursor and writes as one critical section, so
/// blocks may land in any order and still end up at their logical offsets.
///
/// [`write_at`]: PositionedWriter::write_at
pub struct PositionedWriter<W = File> {
    sink: Mutex<W>,
}

impl<W: Write + Seek> PositionedWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    /// Write `bytes` at absolute `offset`.
    pub fn write_at(&self, offset: u64, bytes: &[u8]) -> Result<(), PipelineError> {
        let mut sink = self.sink.lock().map_err(|_| PipelineError::Poisoned)?;
        sink.seek(SeekFrom::Start(offset))?;
        sink.write_all(bytes)?;
        Ok(())
    }

    pub fn flush(&self) -> Result<(), PipelineError> {
        let mut sink = self.sink.lock().map_err(|_| PipelineError::Poisoned)?;
        sink.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W, PipelineError> {
        self.sink.into_inner().map_err(|_| PipelineError::Poisoned)
    }
}
