pub mod cancel;
pub mod codec;
pub mod compress;
pub mod config;
pub mod decompress;
pub mod error;
pub mod files;
pub mod format;
pub mod inspect;
pub mod pipeline;
pub mod queue;
pub mod source;
pub mod worker;
pub mod writer;

pub use cancel::CancelToken;
pub use codec::Codec;
pub use compress::compress_file;
pub use config::PipelineConfig;
pub use decompress::{decompress_file, open_archive};
pub use error::{PipelineError, PreconditionError};
pub use format::{BlockInfo, ContainerMeta, DEFAULT_BLOCK_SIZE};
pub use inspect::{inspect_archive, ArchiveSummary};
pub use pipeline::{run_pipeline, Verdict};
pub use queue::{work_queue, Drain, Emitter};
pub use writer::{ArchiveWriter, PositionedWriter};
