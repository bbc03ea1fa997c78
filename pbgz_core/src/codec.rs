/// Single-block compression abstraction.
///
/// Each `Codec` implementation:
/// - Must compress/decompress individual blocks independently, with no
///   cross-block state. This is the invariant that lets workers finish blocks
///   in any order and still reconstruct the original file.
/// - Must be shareable across worker threads (`Send + Sync`); one instance is
///   called concurrently by every worker in the pool.
pub trait Codec: Send + Sync {
    /// Human-readable codec name for logs and CLI display.
    fn name(&self) -> &'static str;

    /// Compress a single independent block into a self-contained byte sequence.
    fn compress_block(&self, raw: &[u8]) -> anyhow::Result<Vec<u8>>;

    /// Decompress a single independent block.
    ///
    /// The decompressed length is not stored in the archive; the codec
    /// discovers it from the compressed stream.
    fn decompress_block(&self, compressed: &[u8]) -> anyhow::Result<Vec<u8>>;
}
