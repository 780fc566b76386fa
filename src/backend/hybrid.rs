//! The hybrid selector: adaptive choice between solid and windowed
//! compression and among the registered back-ends.
//!
//! Encode side: every back-end compresses the whole input once (solid);
//! the input is also cut into 64 KiB windows, a 4 KiB scout prefix of
//! each window is compressed with every back-end, and the scout winner
//! compresses the full window. If at least 90% of windows agree on one
//! back-end the selector retries the whole input with it to shed the
//! window overhead. The smallest overall result wins. A windowed winner
//! is wrapped in a self-describing `HYB1` envelope; a solid winner is
//! emitted raw.
//!
//! Decode side: an `HYB1` prefix parses windows; a legacy `SOLID` prefix
//! names its coder by tag; anything else is probed against the registered
//! back-ends in fixed tag order.

use crate::error::JcoError;
use crate::log_metric;

use super::{Backend, BackendSet};

/// Window size for windowed mode.
pub const WINDOW_SIZE: usize = 64 * 1024;
/// Scout prefix compressed to rank back-ends per window.
pub const SCOUT_SIZE: usize = 4 * 1024;
/// Fraction of windows that must agree before a coalesced retry.
pub const COALESCE_THRESHOLD: f64 = 0.90;

/// Magic of the windowed payload envelope.
pub const HYBRID_MAGIC: [u8; 4] = *b"HYB1";
/// Legacy solid prefix, accepted on decode only.
pub const LEGACY_SOLID_MAGIC: &[u8; 5] = b"SOLID";

struct Window {
    tag: u8,
    orig_size: usize,
    bytes: Vec<u8>,
}

/// Compresses `input`, choosing back-end and mode adaptively.
pub fn compress(set: &BackendSet, input: &[u8]) -> Result<Vec<u8>, JcoError> {
    // --- Solid pass: every back-end over the whole input. ---
    let mut solid_best: Option<(u8, Vec<u8>)> = None;
    let mut first_error: Option<JcoError> = None;
    for backend in set.iter() {
        match backend.compress(input) {
            Ok(bytes) => {
                if solid_best.as_ref().map_or(true, |(_, b)| bytes.len() < b.len()) {
                    solid_best = Some((backend.tag(), bytes));
                }
            }
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }
    let (solid_tag, solid_bytes) = match solid_best {
        Some(best) => best,
        // Every back-end failed: propagate the first error.
        None => {
            return Err(first_error
                .unwrap_or_else(|| JcoError::BackendFailed("no back-ends registered".to_string())))
        }
    };

    // --- Windowed pass: scout each window, compress with the winner. ---
    let windows = compress_windowed(set, input)?;
    let windowed_size = envelope_size(&windows);

    // --- Coalescing: a dominant back-end earns a whole-input retry. ---
    let mut candidate_solid = (solid_tag, solid_bytes);
    let mut windowed = Some(windows);
    if let Some(majority_tag) = majority_tag(windowed.as_ref().unwrap()) {
        if let Some(backend) = set.by_tag(majority_tag) {
            let coalesced = backend.compress(input)?;
            if coalesced.len() < windowed_size {
                log_metric!(
                    "event" = "hybrid_coalesce",
                    "codec" = &backend.name(),
                    "windows" = &windowed.as_ref().unwrap().len(),
                );
                windowed = None;
                if coalesced.len() < candidate_solid.1.len() {
                    candidate_solid = (majority_tag, coalesced);
                }
            }
        }
    }

    // --- Solid vs windowed: smaller overall wins. ---
    match windowed {
        Some(windows) if envelope_size(&windows) < candidate_solid.1.len() => {
            log_metric!("event" = "hybrid_select", "mode" = "windowed", "windows" = &windows.len());
            Ok(build_envelope(&windows))
        }
        _ => {
            log_metric!("event" = "hybrid_select", "mode" = "solid", "tag" = &candidate_solid.0);
            Ok(candidate_solid.1)
        }
    }
}

fn compress_windowed(set: &BackendSet, input: &[u8]) -> Result<Vec<Window>, JcoError> {
    let mut windows = Vec::with_capacity((input.len() + WINDOW_SIZE - 1) / WINDOW_SIZE);
    for chunk in input.chunks(WINDOW_SIZE) {
        let scout = &chunk[..chunk.len().min(SCOUT_SIZE)];

        let mut best: Option<(u8, usize)> = None;
        let mut first_error: Option<JcoError> = None;
        for backend in set.iter() {
            match backend.compress(scout) {
                Ok(bytes) => {
                    if best.map_or(true, |(_, size)| bytes.len() < size) {
                        best = Some((backend.tag(), bytes.len()));
                    }
                }
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        let (tag, _) = best.ok_or_else(|| {
            first_error.unwrap_or_else(|| {
                JcoError::BackendFailed("no back-ends registered".to_string())
            })
        })?;

        let backend = set.by_tag(tag).ok_or_else(|| {
            JcoError::Internal(format!("scout winner tag {} left the registry", tag))
        })?;
        windows.push(Window {
            tag,
            orig_size: chunk.len(),
            bytes: backend.compress(chunk)?,
        });
    }
    Ok(windows)
}

/// The tag chosen by at least [`COALESCE_THRESHOLD`] of windows, if any.
fn majority_tag(windows: &[Window]) -> Option<u8> {
    if windows.is_empty() {
        return None;
    }
    let mut counts = std::collections::BTreeMap::new();
    for window in windows {
        *counts.entry(window.tag).or_insert(0usize) += 1;
    }
    // Walk ascending by tag and require a strict improvement, so a count
    // tie resolves to the lowest tag.
    let mut tag = 0u8;
    let mut count = 0usize;
    for (&t, &c) in &counts {
        if c > count {
            tag = t;
            count = c;
        }
    }
    if count as f64 >= COALESCE_THRESHOLD * windows.len() as f64 {
        Some(tag)
    } else {
        None
    }
}

fn envelope_size(windows: &[Window]) -> usize {
    4 + 4 + windows.iter().map(|w| 1 + 4 + 4 + w.bytes.len()).sum::<usize>()
}

fn build_envelope(windows: &[Window]) -> Vec<u8> {
    let mut out = Vec::with_capacity(envelope_size(windows));
    out.extend_from_slice(&HYBRID_MAGIC);
    out.extend_from_slice(&(windows.len() as u32).to_le_bytes());
    for window in windows {
        out.push(window.tag);
        out.extend_from_slice(&(window.orig_size as u32).to_le_bytes());
        out.extend_from_slice(&(window.bytes.len() as u32).to_le_bytes());
        out.extend_from_slice(&window.bytes);
    }
    out
}

/// Decompresses a payload produced by [`compress`].
pub fn decompress(set: &BackendSet, input: &[u8]) -> Result<Vec<u8>, JcoError> {
    if input.get(..4) == Some(&HYBRID_MAGIC[..]) {
        return decompress_windowed(set, &input[4..]);
    }
    if input.get(..5) == Some(&LEGACY_SOLID_MAGIC[..]) {
        let &tag = input.get(5).ok_or_else(|| {
            JcoError::BackendFailed("legacy solid payload missing codec tag".to_string())
        })?;
        let backend = set.by_tag(tag).ok_or_else(|| {
            JcoError::BackendFailed(format!("legacy solid payload names unknown tag {}", tag))
        })?;
        return backend.decompress(&input[6..]);
    }

    // A raw solid payload does not name its coder; probe in tag order.
    for backend in set.iter() {
        if let Ok(bytes) = backend.decompress(input) {
            return Ok(bytes);
        }
    }
    Err(JcoError::BackendFailed(
        "no registered back-end could decode the solid payload".to_string(),
    ))
}

fn decompress_windowed(set: &BackendSet, input: &[u8]) -> Result<Vec<u8>, JcoError> {
    let count_bytes = input.get(..4).ok_or_else(|| {
        JcoError::BackendFailed("windowed payload missing window count".to_string())
    })?;
    let count = u32::from_le_bytes(count_bytes.try_into().unwrap()) as usize;

    let mut offset = 4;
    let mut out = Vec::new();
    for i in 0..count {
        let header = input.get(offset..offset + 9).ok_or_else(|| {
            JcoError::BackendFailed(format!("windowed payload truncated at window {}", i))
        })?;
        let tag = header[0];
        let orig_size = u32::from_le_bytes(header[1..5].try_into().unwrap()) as usize;
        let comp_size = u32::from_le_bytes(header[5..9].try_into().unwrap()) as usize;
        offset += 9;

        let compressed = input.get(offset..offset + comp_size).ok_or_else(|| {
            JcoError::BackendFailed(format!("windowed payload truncated at window {}", i))
        })?;
        offset += comp_size;

        let backend = set.by_tag(tag).ok_or_else(|| {
            JcoError::BackendFailed(format!("window {} names unknown codec tag {}", i, tag))
        })?;
        let decoded = backend.decompress(compressed)?;
        if decoded.len() != orig_size {
            return Err(JcoError::BackendFailed(format!(
                "window {} decoded to {} bytes, expected {}",
                i,
                decoded.len(),
                orig_size
            )));
        }
        out.extend_from_slice(&decoded);
    }
    if offset != input.len() {
        return Err(JcoError::BackendFailed(
            "windowed payload has trailing bytes".to_string(),
        ));
    }
    Ok(out)
}
