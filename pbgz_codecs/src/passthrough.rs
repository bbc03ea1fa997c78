use pbgz_core::Codec;

/// No-op codec: stores blocks verbatim, with no compression.
///
/// Useful for verifying the container round-trip independently of any real
/// compressor, since compressed sizes equal raw sizes.
pub struct PassThroughCodec;

impl Codec for PassThroughCodec {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn compress_block(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>> {
        Ok(raw.to_vec())
    }

    fn decompress_block(&self, compressed: &[u8]) -> anyhow::Result<Vec<u8>> {
        Ok(compressed.to_vec())
    }
}
