//! The single, unified error type for the entire jco library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JcoError {
    // =========================================================================
    // === Decode-side corruption kinds (each is fatal, no local recovery)
    // =========================================================================
    /// The container envelope is damaged: bad magic, short header, CRC
    /// mismatch, or a truncated body.
    #[error("Container corrupt: {0}")]
    ContainerCorrupt(String),

    /// The container header parsed as bytes but is not an acceptable header:
    /// invalid JSON, unsupported version, or an unrecognised codec name.
    #[error("Header invalid: {0}")]
    HeaderInvalid(String),

    /// An underlying entropy coder failed and the selector had no
    /// alternative that succeeded.
    #[error("Backend failed: {0}")]
    BackendFailed(String),

    /// A frame inside the body is damaged: bad frame magic, inconsistent
    /// length prefixes, an unknown column type tag, an enum id out of range,
    /// or a varint overflow.
    #[error("Frame corrupt: {0}")]
    FrameCorrupt(String),

    // =========================================================================
    // === Encode-side kinds
    // =========================================================================
    /// The encoder was handed input it cannot accept, e.g. non-UTF-8 bytes
    /// where text was required, or a single-record document that is not JSON.
    #[error("Input invalid: {0}")]
    InputInvalid(String),

    /// A self-consistency check failed. This is a bug in the library, not a
    /// data problem.
    #[error("Internal logic error (this is a bug): {0}")]
    Internal(String),

    // =========================================================================
    // === External error wrappers
    // =========================================================================
    /// An error from the underlying I/O subsystem, surfaced by the
    /// compression streams.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl JcoError {
    /// Stable kind name, used by callers that map errors onto exit codes or
    /// diagnostics without matching on the full enum.
    pub fn kind(&self) -> &'static str {
        match self {
            JcoError::ContainerCorrupt(_) => "ContainerCorrupt",
            JcoError::HeaderInvalid(_) => "HeaderInvalid",
            JcoError::BackendFailed(_) => "BackendFailed",
            JcoError::FrameCorrupt(_) => "FrameCorrupt",
            JcoError::InputInvalid(_) => "InputInvalid",
            JcoError::Internal(_) => "Internal",
            JcoError::Io(_) => "Io",
        }
    }
}
