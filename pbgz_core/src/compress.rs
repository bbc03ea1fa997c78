use std::fs::File;
use std::io;
use std::path::Path;

use tracing::{error, info};

use crate::codec::Codec;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PreconditionError};
use crate::files::{check_paths, create_destination, remove_destination};
use crate::format::{blocks_for_len, ContainerMeta};
use crate::pipeline::run_pipeline;
use crate::source::produce_raw_blocks;
use crate::worker::compress_block;
use crate::writer::ArchiveWriter;

/// Compress `source` into a new archive at `archive`.
///
/// Returns `Err` for precondition failures, before any file is created.
/// Returns `Ok(false)` if the run failed after starting; the archive is
/// removed in that case. Returns `Ok(true)` once the header is sealed.
pub fn compress_file(
    source: impl AsRef<Path>,
    archive: impl AsRef<Path>,
    codec: &dyn Codec,
    config: &PipelineConfig,
) -> Result<bool, PreconditionError> {
    let (source, archive) = (source.as_ref(), archive.as_ref());
    config.validate()?;
    check_paths(source, archive)?;

    let (input, source_len) = match open_source(source) {
        Ok(opened) => opened,
        Err(e) => {
            error!(
                "exception during compressing {} to {}, error accessing file: {e}",
                source.display(),
                archive.display()
            );
            error!("compressing {} to {} failed", source.display(), archive.display());
            return Ok(false);
        }
    };

    let blocks_count = blocks_for_len(source_len, config.block_size as u64);
    if blocks_count > u32::MAX as u64 + 1 {
        return Err(PreconditionError::TooManyBlocks {
            blocks: blocks_count,
        });
    }

    info!("start compressing {}", source.display());

    let output = match create_destination(archive) {
        Ok(file) => file,
        Err(e) => {
            error!(
                "exception during compressing {} to {}, error: {e}",
                source.display(),
                archive.display()
            );
            error!("compressing {} to {} failed", source.display(), archive.display());
            return Ok(false);
        }
    };

    match run_compression(input, output, blocks_count, codec, config) {
        Ok(meta) => {
            info!(
                blocks = meta.blocks_count,
                block_size = meta.block_size,
                codec = codec.name(),
                "finish compressing {} to {}",
                source.display(),
                archive.display()
            );
            Ok(true)
        }
        Err(e) => {
            error!(
                "exception during compressing {} to {}: {e}",
                source.display(),
                archive.display()
            );
            error!("compressing {} to {} failed", source.display(), archive.display());
            remove_destination(archive);
            Ok(false)
        }
    }
}

fn open_source(path: &Path) -> io::Result<(File, u64)> {
    let file = File::open(path)?;
    let len = file.metadata()?.len();
    Ok((file, len))
}

/// Wire the block source, the worker pool and the archive writer together.
/// The writer (and with it the output file) is closed on return.
fn run_compression(
    input: File,
    output: File,
    blocks_count: u64,
    codec: &dyn Codec,
    config: &PipelineConfig,
) -> Result<ContainerMeta, PipelineError> {
    let writer = ArchiveWriter::new(output, config.block_size, blocks_count)?;

    let verdict = run_pipeline(
        config,
        |emitter, cancel| produce_raw_blocks(input, config.block_size, emitter, cancel).map(|_| ()),
        |block, _| compress_block(codec, &writer, block),
    );
    if !verdict.is_success() {
        return Err(PipelineError::Cancelled);
    }

    writer.write_final_info()
}
