//! The dense back-end: a safe wrapper around the `zstd` crate's
//! streaming API. This is where the engine spends CPU to buy ratio; the
//! level is fixed at the library's balanced default.

use std::io::Write;

use crate::error::JcoError;

use super::{Backend, TAG_DENSE};

const DEFAULT_LEVEL: i32 = 3;

pub struct ZstdBackend {
    level: i32,
}

impl Default for ZstdBackend {
    fn default() -> Self {
        ZstdBackend {
            level: DEFAULT_LEVEL,
        }
    }
}

impl Backend for ZstdBackend {
    fn name(&self) -> &'static str {
        "dense"
    }

    fn tag(&self) -> u8 {
        TAG_DENSE
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>, JcoError> {
        let mut encoder = zstd::stream::Encoder::new(Vec::new(), self.level)
            .map_err(|e| JcoError::BackendFailed(format!("zstd encoder: {}", e)))?;
        encoder
            .write_all(input)
            .map_err(|e| JcoError::BackendFailed(format!("zstd write: {}", e)))?;
        encoder
            .finish()
            .map_err(|e| JcoError::BackendFailed(format!("zstd finish: {}", e)))
    }

    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, JcoError> {
        let mut out = Vec::new();
        zstd::stream::copy_decode(input, &mut out)
            .map_err(|e| JcoError::BackendFailed(format!("zstd decode: {}", e)))?;
        Ok(out)
    }
}
