//! Canonical JSON text.
//!
//! The single-record path and the row-wise NDJSON path both rest on one
//! operation: parse, recursively sort object keys, print compact. Key
//! sorting falls out of the parser's ordered map; array order and number
//! forms are whatever the JSON printer emits, and applying the operation
//! twice equals applying it once.

use serde_json::Value;

use crate::columnar::encoder::split_lines;
use crate::error::JcoError;

/// Canonicalises one JSON document: sorted object keys, compact printing.
pub fn canonicalize(text: &str) -> Result<String, JcoError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| JcoError::InputInvalid(format!("not a JSON document: {}", e)))?;
    Ok(value.to_string())
}

/// The row-wise NDJSON encoding: every line keeps its position, blank
/// (empty or whitespace-only) lines are normalised to empty, JSON lines
/// are canonicalised individually, and a non-blank line that fails to
/// parse collapses to an empty line.
pub fn rowwise_encode(input: &str) -> String {
    let lines: Vec<String> = split_lines(input)
        .into_iter()
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return String::new();
            }
            match serde_json::from_str::<Value>(trimmed) {
                Ok(value) => value.to_string(),
                Err(_) => String::new(),
            }
        })
        .collect();
    lines.join("\n")
}
