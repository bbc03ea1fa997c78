mod gzip_codec;
mod passthrough;

pub use gzip_codec::GzipCodec;
pub use passthrough::PassThroughCodec;

use pbgz_core::Codec;

/// Resolve a codec from its CLI name.
///
/// The archive does not record which codec produced it, so the same name must
/// be used for compression and decompression.
pub fn codec_by_name(name: &str) -> anyhow::Result<Box<dyn Codec>> {
    match name {
        "gzip" | "gz" => Ok(Box::new(GzipCodec::default())),
        "passthrough" | "pass" | "none" => Ok(Box::new(PassThroughCodec)),
        other => anyhow::bail!("unknown codec '{}'. Valid options: gzip, passthrough", other),
    }
}
