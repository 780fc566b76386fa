//! The stateless public API: four entry points over the whole engine.
//!
//! Encode control flow: input text → front-end (columnar frames or
//! row-wise canonical lines) → back-end (per the configured codec) →
//! container. Decode inverts the wrapping, then dispatches on the body's
//! leading bytes: a columnar frame stream is reconstructed through the
//! selective decoder, anything else is already text.

use crate::backend::{hybrid, Backend, BackendSet};
use crate::canonical;
use crate::columnar;
use crate::config::{Codec, CompressOptions, DecompressOptions, Profile};
use crate::container::{self, ContainerHeader};
use crate::error::JcoError;
use crate::log_metric;

/// Compresses a single JSON document. The text is canonicalised (keys
/// recursively sorted, compact printing) before entropy coding.
pub fn compress(json_text: &str, opts: &CompressOptions) -> Result<Vec<u8>, JcoError> {
    let canonical_text = canonical::canonicalize(json_text)?;
    emit(canonical_text.into_bytes(), opts, false)
}

/// Decompresses a single-document container back to its canonical text.
pub fn decompress(container_bytes: &[u8]) -> Result<String, JcoError> {
    let (header, body) = container::unwrap(container_bytes)?;
    if body.is_empty() {
        return Ok(String::new());
    }
    let decoded = decode_body(&BackendSet::with_extra(), header.codec, body)?;
    body_to_text(decoded, None)
}

/// Compresses NDJSON text. With `columnar` set the front-end groups
/// records by shape and emits frames; otherwise (or when the front-end
/// declines) each line is canonicalised in place.
pub fn compress_ndjson(ndjson_text: &str, opts: &CompressOptions) -> Result<Vec<u8>, JcoError> {
    if ndjson_text.is_empty() {
        // An empty input wraps an empty body; no back-end runs.
        let header = ContainerHeader::new(opts.codec, true, opts.options.clone());
        return container::wrap(&header, opts.codec.name(), &[]);
    }

    if opts.profile == Profile::Logs {
        log_metric!("event" = "profile_hint", "profile" = "logs");
    }

    let body = if opts.columnar {
        match columnar::encoder::encode(ndjson_text)? {
            Some(frames) => frames,
            None => canonical::rowwise_encode(ndjson_text).into_bytes(),
        }
    } else {
        canonical::rowwise_encode(ndjson_text).into_bytes()
    };
    emit(body, opts, true)
}

/// Decompresses an NDJSON container. With a non-empty `fields` list only
/// those columns are materialised; every line position and blank line is
/// reproduced either way.
pub fn decompress_ndjson(
    container_bytes: &[u8],
    opts: &DecompressOptions,
) -> Result<String, JcoError> {
    let (header, body) = container::unwrap(container_bytes)?;
    if body.is_empty() {
        return Ok(String::new());
    }
    let decoded = decode_body(&BackendSet::with_extra(), header.codec, body)?;
    let fields = opts
        .fields
        .as_deref()
        .filter(|fields| !fields.is_empty());
    body_to_text(decoded, fields)
}

//==================================================================================
// Shared plumbing
//==================================================================================

/// Runs the configured back-end over the front-end output and wraps the
/// result. The header's codec claim is checked against the coder that ran.
fn emit(body: Vec<u8>, opts: &CompressOptions, ndjson: bool) -> Result<Vec<u8>, JcoError> {
    let set = BackendSet::with_extra();
    let compressed = match opts.codec {
        Codec::Hybrid => hybrid::compress(&set, &body)?,
        Codec::Identity => body,
        named => {
            let backend = set.by_name(named.name()).ok_or_else(|| {
                JcoError::BackendFailed(format!("codec {:?} is not registered", named.name()))
            })?;
            backend.compress(&body)?
        }
    };
    let header = ContainerHeader::new(opts.codec, ndjson, opts.options.clone());
    container::wrap(&header, opts.codec.name(), &compressed)
}

/// Reverses the back-end named by the container header.
fn decode_body(set: &BackendSet, codec: Codec, body: &[u8]) -> Result<Vec<u8>, JcoError> {
    match codec {
        Codec::Hybrid => hybrid::decompress(set, body),
        Codec::Identity => Ok(body.to_vec()),
        named => {
            let backend = set.by_name(named.name()).ok_or_else(|| {
                JcoError::BackendFailed(format!("codec {:?} is not registered", named.name()))
            })?;
            backend.decompress(body)
        }
    }
}

/// Dispatches a decoded body on its leading bytes: columnar frame
/// streams are reconstructed, plain text is returned as-is.
fn body_to_text(decoded: Vec<u8>, fields: Option<&[String]>) -> Result<String, JcoError> {
    if columnar::is_columnar_body(&decoded) {
        return columnar::decoder::decode(&decoded, fields);
    }
    String::from_utf8(decoded)
        .map_err(|_| JcoError::ContainerCorrupt("decoded body is not UTF-8 text".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_record_roundtrip() {
        let opts = CompressOptions::default();
        let container = compress(r#"{"hello": "world", "answer": 42}"#, &opts).unwrap();
        let text = decompress(&container).unwrap();
        assert_eq!(text, r#"{"answer":42,"hello":"world"}"#);
    }

    #[test]
    fn test_single_record_scalar_document() {
        let opts = CompressOptions::default();
        let container = compress("0", &opts).unwrap();
        assert_eq!(decompress(&container).unwrap(), "0");
    }

    #[test]
    fn test_codec_claim_matches_request() {
        for codec in [Codec::Fast, Codec::Dense, Codec::Identity, Codec::Hybrid, Codec::Lz4] {
            let opts = CompressOptions {
                codec,
                ..CompressOptions::default()
            };
            let container = compress(r#"{"x":1}"#, &opts).unwrap();
            let (header, _) = crate::container::unwrap(&container).unwrap();
            assert_eq!(header.codec, codec);
            assert_eq!(decompress(&container).unwrap(), r#"{"x":1}"#);
        }
    }

    #[test]
    fn test_default_codec_is_hybrid_in_header() {
        let container = compress(r#"{"x":1}"#, &CompressOptions::default()).unwrap();
        let (header, _) = crate::container::unwrap(&container).unwrap();
        assert_eq!(header.codec, Codec::Hybrid);
    }

    #[test]
    fn test_empty_ndjson_roundtrip() {
        let container = compress_ndjson("", &CompressOptions::default()).unwrap();
        let (_, body) = crate::container::unwrap(&container).unwrap();
        assert!(body.is_empty());
        let text = decompress_ndjson(&container, &DecompressOptions::default()).unwrap();
        assert_eq!(text, "");
    }

    #[test]
    fn test_rowwise_ndjson_roundtrip() {
        let input = "{\"b\":1,\"a\":2}\n\n{\"c\":3}\n   \n{\"d\":4}";
        let opts = CompressOptions::default();
        let container = compress_ndjson(input, &opts).unwrap();
        let text = decompress_ndjson(&container, &DecompressOptions::default()).unwrap();
        let lines: Vec<&str> = text.split('\n').collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "{\"a\":2,\"b\":1}");
        assert_eq!(lines[1], "");
        assert_eq!(lines[3], ""); // blank lines normalise to empty
    }

    #[test]
    fn test_invalid_document_rejected() {
        let err = compress("{broken", &CompressOptions::default()).unwrap_err();
        assert_eq!(err.kind(), "InputInvalid");
    }

    #[test]
    fn test_empty_field_list_means_full_decode() {
        let mut input = String::new();
        for i in 0..8 {
            input.push_str(&format!("{{\"a\":{},\"b\":{}}}\n", i, i));
        }
        input.pop();
        let opts = CompressOptions {
            columnar: true,
            ..CompressOptions::default()
        };
        let container = compress_ndjson(&input, &opts).unwrap();
        let text = decompress_ndjson(
            &container,
            &DecompressOptions {
                fields: Some(Vec::new()),
            },
        )
        .unwrap();
        let first: serde_json::Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(first, json!({"a": 0, "b": 0}));
    }
}
