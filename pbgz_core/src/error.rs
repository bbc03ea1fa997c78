use std::path::PathBuf;

use thiserror::Error;

/// Rejections raised before the pipeline starts and before any file is created.
#[derive(Debug, Error)]
pub enum PreconditionError {
    #[error("source file path is empty")]
    EmptySourcePath,
    #[error("destination file path is empty")]
    EmptyDestinationPath,
    #[error("file {0:?} does not exist")]
    SourceMissing(PathBuf),
    #[error("file {0:?} exists")]
    DestinationExists(PathBuf),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("source needs {blocks} blocks, more than a 32-bit order number can address")]
    TooManyBlocks { blocks: u64 },
}

/// Failures raised inside a running pipeline stage.
///
/// These never escape the orchestrator: they are logged at the task boundary
/// and turned into cancellation.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("error during reading or writing file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid archive format: {0}")]
    Format(String),
    #[error("codec error: {0}")]
    Codec(#[source] anyhow::Error),
    #[error("work queue closed; no consumer is accepting items")]
    QueueClosed,
    #[error("writer lock poisoned by a panicked worker")]
    Poisoned,
    #[error("processing was cancelled due to error")]
    Cancelled,
}
