//! Per-column type-specialised encoding and decoding.
//!
//! A column is the ordered sequence of values for one key across a
//! frame's rows. Its encoded layout is `type_tag:u8 || payload`. The
//! planner picks the tag deterministically from the column's values
//! (`plan`), the writers serialise the payload (`encode`), and one typed
//! reader per tag reconstructs values on the way out (`reader`).
//!
//! A cell is *null* when the row does not supply the key or supplies it
//! with a JSON `null`; the frame's presence bitmap is what tells those
//! two cases apart on reconstruction.

pub mod encode;
pub mod plan;
pub mod reader;

use crate::error::JcoError;

/// Largest integer magnitude the integer codecs accept. Values outside
/// this range lose precision in a 64-bit float host and route to RAW_JSON.
pub const MAX_SAFE_INT: i64 = (1 << 53) - 1;

/// Maximum dictionary cardinality for ENUM_IDS.
pub const ENUM_MAX_CARDINALITY: usize = 16;
/// Maximum byte length of an ENUM_IDS dictionary entry.
pub const ENUM_MAX_STR_LEN: usize = 16;
/// The ENUM_IDS id reserved for a null cell.
pub const ENUM_NULL_ID: u8 = 255;

/// Stable wire tags for column payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ColumnType {
    IntVarint = 0,
    DeltaZigzag = 1,
    TimeDod = 2,
    BoolRle = 3,
    EnumIds = 4,
    RawJson = 6,
}

impl ColumnType {
    #[inline]
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Maps a wire tag back to a column type. Tag 5 is reserved and never
    /// emitted; it is rejected like any unknown tag.
    pub fn from_tag(tag: u8) -> Result<Self, JcoError> {
        match tag {
            0 => Ok(ColumnType::IntVarint),
            1 => Ok(ColumnType::DeltaZigzag),
            2 => Ok(ColumnType::TimeDod),
            3 => Ok(ColumnType::BoolRle),
            4 => Ok(ColumnType::EnumIds),
            6 => Ok(ColumnType::RawJson),
            other => Err(JcoError::FrameCorrupt(format!(
                "unknown column type tag: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_are_stable_wire_values() {
        assert_eq!(ColumnType::IntVarint.tag(), 0);
        assert_eq!(ColumnType::DeltaZigzag.tag(), 1);
        assert_eq!(ColumnType::TimeDod.tag(), 2);
        assert_eq!(ColumnType::BoolRle.tag(), 3);
        assert_eq!(ColumnType::EnumIds.tag(), 4);
        assert_eq!(ColumnType::RawJson.tag(), 6);
    }

    #[test]
    fn test_reserved_and_unknown_tags_rejected() {
        assert!(ColumnType::from_tag(5).is_err());
        assert!(ColumnType::from_tag(7).is_err());
        assert!(ColumnType::from_tag(255).is_err());
    }
}
