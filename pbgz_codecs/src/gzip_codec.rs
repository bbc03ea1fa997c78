use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use pbgz_core::Codec;

/// Gzip block codec.
///
/// Every block becomes one complete gzip member with its own deflate stream,
/// so any block can be decompressed without touching its neighbours.
pub struct GzipCodec {
    /// Compression level (0 = store, 9 = slowest / smallest).
    pub level: u32,
}

impl Default for GzipCodec {
    fn default() -> Self {
        Self {
            level: Compression::default().level(),
        }
    }
}

impl GzipCodec {
    pub fn new(level: u32) -> Self {
        Self { level: level.min(9) }
    }
}

impl Codec for GzipCodec {
    fn name(&self) -> &'static str {
        "gzip"
    }

    fn compress_block(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::with_capacity(raw.len() / 2), Compression::new(self.level));
        encoder.write_all(raw)?;
        Ok(encoder.finish()?)
    }

    fn decompress_block(&self, compressed: &[u8]) -> anyhow::Result<Vec<u8>> {
        let mut decoder = GzDecoder::new(compressed);
        let mut raw = Vec::new();
        decoder
            .read_to_end(&mut raw)
            .map_err(|e| anyhow::anyhow!("gzip decompress error: {}", e))?;
        Ok(raw)
    }
}
