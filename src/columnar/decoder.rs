//! Reconstruction of NDJSON text from a columnar body, in full or
//! restricted to a requested field set.
//!
//! The decoder opens typed readers only for requested columns and skips
//! the rest by their length prefixes. Reconstruction walks the global
//! line-presence bitmap: a 0 bit emits an empty line, a 1 bit consumes
//! the next row of the next pending shape frame in body order. Requested
//! keys a frame does not carry simply contribute nothing to its rows.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::column::reader::{open_reader, ColumnReader};
use crate::error::JcoError;
use crate::frame::reader::{parse_body, ShapeFrame};

/// A shape frame with readers opened for its selected columns.
struct OpenFrame {
    keys: Vec<String>,
    readers: Vec<Option<Box<dyn ColumnReader>>>,
    presence: crate::kernels::bitmap::Bitmap,
    rows: usize,
    next_row: usize,
}

impl OpenFrame {
    fn open(
        frame: ShapeFrame,
        body: &[u8],
        requested: Option<&HashSet<&str>>,
    ) -> Result<Self, JcoError> {
        let mut readers = Vec::with_capacity(frame.keys.len());
        for (k, key) in frame.keys.iter().enumerate() {
            let wanted = requested.map_or(true, |set| set.contains(key.as_str()));
            if !wanted {
                readers.push(None);
                continue;
            }
            let column = &body[frame.columns[k].clone()];
            let (&tag, payload) = column.split_first().ok_or_else(|| {
                JcoError::FrameCorrupt(format!("column {:?} has no type tag", key))
            })?;
            readers.push(Some(open_reader(tag, payload, frame.rows)?));
        }
        Ok(OpenFrame {
            keys: frame.keys,
            readers,
            presence: frame.presence,
            rows: frame.rows,
            next_row: 0,
        })
    }

    /// Builds the object for the frame's next row and advances.
    fn take_row(&mut self) -> Map<String, Value> {
        let row = self.next_row;
        self.next_row += 1;
        let key_count = self.keys.len();
        let mut object = Map::new();
        for (k, key) in self.keys.iter().enumerate() {
            let reader = match &self.readers[k] {
                Some(r) => r,
                None => continue,
            };
            if self.presence.get(row * key_count + k) {
                let value = reader.value_at(row).unwrap_or(Value::Null);
                object.insert(key.clone(), value);
            }
        }
        object
    }

    fn exhausted(&self) -> bool {
        self.next_row >= self.rows
    }
}

/// Decodes a columnar body back into NDJSON text. `fields = None` decodes
/// every column; otherwise only the named fields are materialised.
pub fn decode(body: &[u8], fields: Option<&[String]>) -> Result<String, JcoError> {
    let (line_presence, shape_frames) = parse_body(body)?;

    let requested: Option<HashSet<&str>> =
        fields.map(|f| f.iter().map(String::as_str).collect());

    let total_rows: usize = shape_frames.iter().map(|f| f.rows).sum();
    if total_rows != line_presence.lines.count_ones() {
        return Err(JcoError::FrameCorrupt(format!(
            "line-presence bitmap claims {} records but frames carry {} rows",
            line_presence.lines.count_ones(),
            total_rows
        )));
    }

    let mut open_frames = Vec::with_capacity(shape_frames.len());
    for frame in shape_frames {
        open_frames.push(OpenFrame::open(frame, body, requested.as_ref())?);
    }

    let mut frame_cursor = 0usize;
    let mut lines = Vec::with_capacity(line_presence.lines.len());
    for i in 0..line_presence.lines.len() {
        if !line_presence.lines.get(i) {
            lines.push(String::new());
            continue;
        }
        while frame_cursor < open_frames.len() && open_frames[frame_cursor].exhausted() {
            frame_cursor += 1;
        }
        // The row totals were checked against the bitmap up front.
        let frame = open_frames.get_mut(frame_cursor).ok_or_else(|| {
            JcoError::FrameCorrupt("ran out of frame rows during reconstruction".to_string())
        })?;
        let object = frame.take_row();
        // Serialising a map of parsed values cannot fail.
        lines.push(Value::Object(object).to_string());
    }

    Ok(lines.join("\n"))
}
