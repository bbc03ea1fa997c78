use std::io::{self, Read};

use tracing::debug;

use crate::cancel::CancelToken;
use crate::error::PipelineError;
use crate::format::{read_exact_or_format, BlockInfo, ContainerMeta};
use crate::queue::Emitter;

/// One uncompressed block in flight from the producer to a worker.
#[derive(Debug)]
pub struct RawBlock {
    /// 0-based logical index of the block within the source.
    pub order_number: u32,
    /// Exactly the bytes read for this block; shorter than the block size
    /// only for the final block.
    pub payload: Vec<u8>,
}

/// One compressed block in flight from the archive reader to a worker.
#[derive(Debug)]
pub struct ArchiveBlock {
    pub info: BlockInfo,
    /// Uniform original block size from the archive header.
    pub block_size: u64,
    pub payload: Vec<u8>,
}

impl ArchiveBlock {
    /// Offset in the decompressed output where this block belongs.
    pub fn output_offset(&self) -> Option<u64> {
        (self.info.order_number as u64).checked_mul(self.block_size)
    }
}

/// Read `source` sequentially in `block_size` chunks and emit them in order.
///
/// Each block is filled completely before it is emitted, so only the last one
/// can be short. Stops at end of stream or when `cancel` is raised.
/// Returns the number of blocks emitted.
pub fn produce_raw_blocks<R: Read>(
    mut source: R,
    block_size: u32,
    emitter: &Emitter<RawBlock>,
    cancel: &CancelToken,
) -> Result<u64, PipelineError> {
    let mut emitted = 0u64;
    while !cancel.is_cancelled() {
        let mut payload = vec![0u8; block_size as usize];
        let filled = fill_block(&mut source, &mut payload)?;
        if filled == 0 {
            break;
        }
        payload.truncate(filled);
        let order_number = u32::try_from(emitted).map_err(|_| {
            PipelineError::Format("source has more blocks than a 32-bit order number can address".into())
        })?;
        emitter.emit(RawBlock {
            order_number,
            payload,
        })?;
        emitted += 1;
        if filled < block_size as usize {
            break;
        }
    }
    debug!(emitted, "block source exhausted");
    Ok(emitted)
}

/// Emit every block of the archive body, in table order.
///
/// `body` must be positioned right after the header. The table order equals
/// the physical layout of the body, so a single sequential pass suffices.
pub fn produce_archive_blocks<R: Read>(
    mut body: R,
    meta: &ContainerMeta,
    emitter: &Emitter<ArchiveBlock>,
    cancel: &CancelToken,
) -> Result<(), PipelineError> {
    for info in &meta.blocks {
        if cancel.is_cancelled() {
            break;
        }
        let mut payload = vec![0u8; info.compressed_size as usize];
        read_exact_or_format(&mut body, &mut payload, "block body")?;
        emitter.emit(ArchiveBlock {
            info: *info,
            block_size: meta.block_size,
            payload,
        })?;
    }
    Ok(())
}

/// Read until `buf` is full or the stream ends; returns the bytes read.
fn fill_block<R: Read>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::work_queue;

    /// Hands out at most `step` bytes per read call.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn short_reads_still_fill_whole_blocks() {
        let data: Vec<u8> = (0..250u32).map(|i| i as u8).collect();
        let (emitter, drain) = work_queue(16);
        let emitted = produce_raw_blocks(
            Trickle { data: &data, step: 7 },
            100,
            &emitter,
            &CancelToken::new(),
        )
        .unwrap();
        drop(emitter);

        assert_eq!(emitted, 3);
        let blocks: Vec<RawBlock> = std::iter::from_fn(|| drain.pull()).collect();
        assert_eq!(blocks.iter().map(|b| b.order_number).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(blocks.iter().map(|b| b.payload.len()).collect::<Vec<_>>(), vec![100, 100, 50]);
        assert_eq!(blocks[2].payload, &data[200..]);
    }

    #[test]
    fn exact_multiple_has_no_trailing_empty_block() {
        let data = vec![9u8; 200];
        let (emitter, drain) = work_queue(16);
        let emitted = produce_raw_blocks(data.as_slice(), 100, &emitter, &CancelToken::new()).unwrap();
        drop(emitter);
        assert_eq!(emitted, 2);
        assert_eq!(std::iter::from_fn(|| drain.pull()).count(), 2);
    }

    #[test]
    fn cancelled_source_emits_nothing() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let (emitter, _drain) = work_queue(4);
        let emitted = produce_raw_blocks([1u8; 64].as_slice(), 8, &emitter, &cancel).unwrap();
        assert_eq!(emitted, 0);
        assert_eq!(emitter.in_flight(), 0);
    }

    #[test]
    fn truncated_body_is_format_error() {
        let mut meta = ContainerMeta::new(16, 1);
        meta.insert_block(BlockInfo { order_number: 0, compressed_size: 10 });
        let (emitter, _drain) = work_queue(4);
        let err = produce_archive_blocks([0u8; 4].as_slice(), &meta, &emitter, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, PipelineError::Format(_)), "got {err:?}");
    }
}
