//! The container: the framed binary envelope every artifact lives in.
//!
//! Layout, all integers little-endian:
//! `'J' 'C' 'O' '1' || u32 header_len || header JSON || u32 crc32(body)
//! || body`. The CRC covers exactly the body bytes and is verified
//! before any of them are surfaced. The header names the codec that was
//! actually run; the emitter checks that claim and treats a mismatch as
//! a bug, not a data error.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::config::Codec;
use crate::error::JcoError;

/// Container magic.
pub const CONTAINER_MAGIC: [u8; 4] = *b"JCO1";
/// The container format version this build reads and writes.
pub const CONTAINER_VERSION: u32 = 1;

/// Guard against absurd header lengths in corrupt containers. (16 MB)
const MAX_HEADER_LEN: usize = 16 * 1024 * 1024;

/// The UTF-8 JSON header carried between the magic and the body CRC.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ContainerHeader {
    pub version: u32,
    pub codec: Codec,
    pub created_at: String,
    pub ndjson: bool,
    /// Reserved for externalised key dictionaries; always false today.
    pub key_dict_inline: bool,
    /// Opaque caller options, passed through untouched.
    #[serde(default)]
    pub options: Map<String, Value>,
}

impl ContainerHeader {
    pub fn new(codec: Codec, ndjson: bool, options: Map<String, Value>) -> Self {
        ContainerHeader {
            version: CONTAINER_VERSION,
            codec,
            created_at: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
            ndjson,
            key_dict_inline: false,
            options,
        }
    }
}

fn crc32(bytes: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

/// Wraps a body into a container. `codec_ran` is the name of the
/// back-end that actually produced `body`; it must equal the header's
/// claim.
pub fn wrap(header: &ContainerHeader, codec_ran: &str, body: &[u8]) -> Result<Vec<u8>, JcoError> {
    if header.codec.name() != codec_ran {
        return Err(JcoError::Internal(format!(
            "header claims codec {:?} but {:?} ran",
            header.codec.name(),
            codec_ran
        )));
    }

    // Serialising a plain struct with string keys cannot fail.
    let header_bytes = serde_json::to_vec(header)
        .map_err(|e| JcoError::Internal(format!("header serialisation: {}", e)))?;

    let mut out = Vec::with_capacity(4 + 4 + header_bytes.len() + 4 + body.len());
    out.extend_from_slice(&CONTAINER_MAGIC);
    out.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(&header_bytes);
    out.extend_from_slice(&crc32(body).to_le_bytes());
    out.extend_from_slice(body);
    Ok(out)
}

/// Unwraps a container: validates magic and header, verifies the body
/// CRC, and returns the parsed header with the body bytes.
pub fn unwrap(bytes: &[u8]) -> Result<(ContainerHeader, &[u8]), JcoError> {
    if bytes.get(..4) != Some(&CONTAINER_MAGIC[..]) {
        return Err(JcoError::ContainerCorrupt("bad magic".to_string()));
    }
    let header_len_bytes = bytes
        .get(4..8)
        .ok_or_else(|| JcoError::ContainerCorrupt("short header length".to_string()))?;
    let header_len = u32::from_le_bytes(header_len_bytes.try_into().unwrap()) as usize;
    if header_len > MAX_HEADER_LEN {
        return Err(JcoError::ContainerCorrupt(format!(
            "implausible header length {}",
            header_len
        )));
    }

    let header_bytes = bytes
        .get(8..8 + header_len)
        .ok_or_else(|| JcoError::ContainerCorrupt("short header".to_string()))?;
    let crc_offset = 8 + header_len;
    let crc_bytes = bytes
        .get(crc_offset..crc_offset + 4)
        .ok_or_else(|| JcoError::ContainerCorrupt("missing body CRC".to_string()))?;
    let expected_crc = u32::from_le_bytes(crc_bytes.try_into().unwrap());
    let body = &bytes[crc_offset + 4..];

    // CRC first: no body byte is interpreted before it checks out.
    let actual_crc = crc32(body);
    if actual_crc != expected_crc {
        return Err(JcoError::ContainerCorrupt(format!(
            "body CRC mismatch: header says {:#010x}, body is {:#010x}",
            expected_crc, actual_crc
        )));
    }

    let header: ContainerHeader = serde_json::from_slice(header_bytes)
        .map_err(|e| JcoError::HeaderInvalid(format!("header JSON: {}", e)))?;
    if header.version != CONTAINER_VERSION {
        return Err(JcoError::HeaderInvalid(format!(
            "unsupported container version {}",
            header.version
        )));
    }

    Ok((header, body))
}
