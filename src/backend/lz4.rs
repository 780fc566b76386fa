//! The optional extra back-end: LZ4 block compression with a prepended
//! size, via `lz4_flex`. Registered at runtime under the extra tag.

use crate::error::JcoError;

use super::{Backend, TAG_EXTRA};

pub struct Lz4Backend;

impl Backend for Lz4Backend {
    fn name(&self) -> &'static str {
        "lz4"
    }

    fn tag(&self) -> u8 {
        TAG_EXTRA
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>, JcoError> {
        Ok(lz4_flex::compress_prepend_size(input))
    }

    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, JcoError> {
        lz4_flex::decompress_size_prepended(input)
            .map_err(|e| JcoError::BackendFailed(format!("lz4 decode: {}", e)))
    }
}
