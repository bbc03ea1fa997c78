#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use pbgz_codecs::GzipCodec;
use pbgz_core::{Codec, PipelineConfig};

/// Generate `len` deterministic bytes using a simple LCG.
pub fn pseudo_random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = seed;
    (0..len)
        .map(|_| {
            rng = rng
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (rng >> 56) as u8
        })
        .collect()
}

/// Generate `len` highly compressible bytes (repeating pattern).
pub fn compressible_bytes(len: usize) -> Vec<u8> {
    let pattern = b"the quick brown fox jumps over the lazy dog. ";
    (0..len).map(|i| pattern[i % pattern.len()]).collect()
}

pub fn small_config(block_size: u32, workers: usize) -> PipelineConfig {
    PipelineConfig::default()
        .with_block_size(block_size)
        .with_workers(workers)
}

pub fn write_source(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}

/// Gzip wrapper that sleeps before compressing, longer for blocks whose
/// first byte is small, so early blocks tend to finish last.
pub struct JitterCodec {
    pub inner: GzipCodec,
    pub step: Duration,
}

impl Codec for JitterCodec {
    fn name(&self) -> &'static str {
        "jitter"
    }

    fn compress_block(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>> {
        let weight = 16 - (raw.first().copied().unwrap_or(0) as u32 % 16);
        std::thread::sleep(self.step * weight);
        self.inner.compress_block(raw)
    }

    fn decompress_block(&self, compressed: &[u8]) -> anyhow::Result<Vec<u8>> {
        self.inner.decompress_block(compressed)
    }
}

/// Gzip wrapper whose compressor fails on its `fail_at`-th call (0-based).
pub struct FailingCodec {
    pub inner: GzipCodec,
    pub fail_at: usize,
    pub calls: AtomicUsize,
}

impl FailingCodec {
    pub fn new(fail_at: usize) -> Self {
        Self {
            inner: GzipCodec::default(),
            fail_at,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Codec for FailingCodec {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn compress_block(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == self.fail_at {
            anyhow::bail!("injected compression failure");
        }
        self.inner.compress_block(raw)
    }

    fn decompress_block(&self, compressed: &[u8]) -> anyhow::Result<Vec<u8>> {
        self.inner.decompress_block(compressed)
    }
}
