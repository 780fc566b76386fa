//! The identity codec: bytes in, bytes out. Useful for debugging and for
//! callers that want the container and frame structure without entropy
//! coding. It never participates in hybrid selection and never appears in
//! a windowed payload, so its tag is off the wire-tag range.

use crate::error::JcoError;

use super::Backend;

pub struct IdentityBackend;

impl Backend for IdentityBackend {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn tag(&self) -> u8 {
        0xFF
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>, JcoError> {
        Ok(input.to_vec())
    }

    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, JcoError> {
        Ok(input.to_vec())
    }
}
