use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::{error, info};

use crate::codec::Codec;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PreconditionError};
use crate::files::{check_paths, create_destination, remove_destination};
use crate::format::ContainerMeta;
use crate::pipeline::run_pipeline;
use crate::source::produce_archive_blocks;
use crate::worker::decompress_block;
use crate::writer::PositionedWriter;

/// Decompress `archive` into a new file at `output`.
///
/// The header is parsed in full before the output is created, so an archive
/// that is too short or structurally inconsistent leaves nothing behind.
/// Return values follow [`compress_file`](crate::compress_file).
/// `config.block_size` is ignored; the archive header supplies it.
pub fn decompress_file(
    archive: impl AsRef<Path>,
    output: impl AsRef<Path>,
    codec: &dyn Codec,
    config: &PipelineConfig,
) -> Result<bool, PreconditionError> {
    let (archive, output) = (archive.as_ref(), output.as_ref());
    config.validate()?;
    check_paths(archive, output)?;

    info!("start decompressing {}", archive.display());

    let (body, meta) = match open_archive(archive) {
        Ok(opened) => opened,
        Err(e) => {
            error!(
                "exception during decompressing {} to {}: {e}",
                archive.display(),
                output.display()
            );
            error!("decompressing {} to {} failed", archive.display(), output.display());
            return Ok(false);
        }
    };

    let destination = match create_destination(output) {
        Ok(file) => file,
        Err(e) => {
            error!(
                "exception during decompressing {} to {}, error: {e}",
                archive.display(),
                output.display()
            );
            error!("decompressing {} to {} failed", archive.display(), output.display());
            return Ok(false);
        }
    };

    match run_decompression(body, &meta, destination, codec, config) {
        Ok(()) => {
            info!(
                blocks = meta.blocks_count,
                block_size = meta.block_size,
                codec = codec.name(),
                "finish decompressing {} to {}",
                archive.display(),
                output.display()
            );
            Ok(true)
        }
        Err(e) => {
            error!(
                "exception during decompressing {} to {}: {e}",
                archive.display(),
                output.display()
            );
            error!("decompressing {} to {} failed", archive.display(), output.display());
            remove_destination(output);
            Ok(false)
        }
    }
}

/// Open an archive and parse its header.
///
/// Returns the reader positioned at the start of the body. The declared body
/// must fit in the file; the blocks themselves are not read here.
pub fn open_archive(path: &Path) -> Result<(BufReader<File>, ContainerMeta), PipelineError> {
    let file = File::open(path)?;
    let archive_len = file.metadata()?.len();
    let mut reader = BufReader::new(file);
    let meta = ContainerMeta::read_from(&mut reader, archive_len)?;

    // header_len cannot overflow here: read_from checked it against archive_len.
    let header_len = meta.header_len().unwrap_or(archive_len);
    let available = archive_len - header_len;
    if meta.body_len() > available {
        return Err(PipelineError::Format(format!(
            "block table declares {} body bytes but only {available} follow the header",
            meta.body_len()
        )));
    }
    Ok((reader, meta))
}

fn run_decompression(
    body: BufReader<File>,
    meta: &ContainerMeta,
    destination: File,
    codec: &dyn Codec,
    config: &PipelineConfig,
) -> Result<(), PipelineError> {
    let writer = PositionedWriter::new(destination);

    let verdict = run_pipeline(
        config,
        |emitter, cancel| produce_archive_blocks(body, meta, emitter, cancel),
        |block, _| decompress_block(codec, &writer, block),
    );
    if !verdict.is_success() {
        return Err(PipelineError::Cancelled);
    }

    writer.flush()
}
