//! The fast back-end: DEFLATE in a zlib wrapper via `flate2`. The zlib
//! framing carries a header check and an Adler-32 trailer, which is what
//! lets a tagless solid payload be probed safely.

use std::io::Write;

use flate2::write::{ZlibDecoder, ZlibEncoder};
use flate2::Compression;

use crate::error::JcoError;

use super::{Backend, TAG_FAST};

pub struct DeflateBackend;

impl Backend for DeflateBackend {
    fn name(&self) -> &'static str {
        "fast"
    }

    fn tag(&self) -> u8 {
        TAG_FAST
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>, JcoError> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(input)
            .map_err(|e| JcoError::BackendFailed(format!("deflate write: {}", e)))?;
        encoder
            .finish()
            .map_err(|e| JcoError::BackendFailed(format!("deflate finish: {}", e)))
    }

    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, JcoError> {
        let mut decoder = ZlibDecoder::new(Vec::new());
        decoder
            .write_all(input)
            .map_err(|e| JcoError::BackendFailed(format!("deflate decode: {}", e)))?;
        decoder
            .finish()
            .map_err(|e| JcoError::BackendFailed(format!("deflate decode finish: {}", e)))
    }
}
