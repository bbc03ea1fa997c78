use crate::error::PreconditionError;
use crate::format::DEFAULT_BLOCK_SIZE;

/// Queue slots allotted per worker when no explicit depth is configured.
pub const QUEUE_DEPTH_PER_WORKER: usize = 5;

/// Tunables for one compress or decompress run.
///
/// Passed explicitly into every operation; nothing here is process-global.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Raw bytes per block. Only used when compressing; decompression takes
    /// the block size from the archive header.
    pub block_size: u32,
    /// Number of consumer threads.
    pub workers: usize,
    /// Capacity of the bounded queue between the producer and the workers.
    pub queue_depth: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let workers = num_cpus::get().max(1);
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            workers,
            queue_depth: workers * QUEUE_DEPTH_PER_WORKER,
        }
    }
}

impl PipelineConfig {
    pub fn with_block_size(mut self, block_size: u32) -> Self {
        self.block_size = block_size;
        self
    }

    /// Sets the worker count and rescales the queue depth to match.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self.queue_depth = workers.saturating_mul(QUEUE_DEPTH_PER_WORKER);
        self
    }

    pub fn with_queue_depth(mut self, queue_depth: usize) -> Self {
        self.queue_depth = queue_depth;
        self
    }

    pub fn validate(&self) -> Result<(), PreconditionError> {
        if self.block_size == 0 {
            return Err(PreconditionError::InvalidConfig("block size must be non-zero".into()));
        }
        if self.workers == 0 {
            return Err(PreconditionError::InvalidConfig("worker count must be non-zero".into()));
        }
        if self.queue_depth == 0 {
            return Err(PreconditionError::InvalidConfig("queue depth must be non-zero".into()));
        }
        Ok(())
    }
}
