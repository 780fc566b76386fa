//! The column planner: deterministic selection of a column codec from the
//! column's values.
//!
//! The decision order is fixed and data-driven: RAW_JSON for an all-null
//! column; ENUM_IDS when every non-null value is a short, distinct-bounded
//! string; BOOL_RLE when every non-null value is a boolean; DELTA_ZIGZAG
//! for sequential-ish integers; INT_VARINT for other integers; RAW_JSON
//! as the universal fallback. Given the same values, the planner always
//! returns the same tag.

use std::collections::BTreeSet;

use serde_json::Value;

use super::{ColumnType, ENUM_MAX_CARDINALITY, ENUM_MAX_STR_LEN, MAX_SAFE_INT};

/// A cell as seen by the column codecs: `None` is a null cell (key absent
/// or JSON `null`), `Some` is a concrete non-null value.
pub type Cell<'a> = Option<&'a Value>;

/// Extracts the integer from a value when it is representable as a signed
/// 53-bit integer. Floats and magnitudes past 2^53−1 are rejected so the
/// integer codecs never touch values a JSON float printer could mangle.
#[inline]
pub fn as_int53(value: &Value) -> Option<i64> {
    let n = value.as_i64()?;
    if (-MAX_SAFE_INT..=MAX_SAFE_INT).contains(&n) {
        Some(n)
    } else {
        None
    }
}

#[derive(Debug, Default)]
struct ColumnProfile {
    non_null: usize,
    all_int: bool,
    int_min: i64,
    int_max: i64,
    all_bool: bool,
    all_enum_string: bool,
    enum_overflow: bool,
}

fn profile_cells(cells: &[Cell<'_>]) -> (ColumnProfile, BTreeSet<String>) {
    let mut profile = ColumnProfile {
        all_int: true,
        all_bool: true,
        all_enum_string: true,
        int_min: i64::MAX,
        int_max: i64::MIN,
        ..ColumnProfile::default()
    };
    let mut distinct_strings = BTreeSet::new();

    for cell in cells {
        let value = match cell {
            Some(v) => v,
            None => continue,
        };
        profile.non_null += 1;

        match as_int53(value) {
            Some(n) => {
                profile.int_min = profile.int_min.min(n);
                profile.int_max = profile.int_max.max(n);
            }
            None => profile.all_int = false,
        }

        if !value.is_boolean() {
            profile.all_bool = false;
        }

        match value.as_str() {
            Some(s) if !s.is_empty() && s.len() <= ENUM_MAX_STR_LEN => {
                if distinct_strings.len() < ENUM_MAX_CARDINALITY + 1 {
                    distinct_strings.insert(s.to_string());
                }
                if distinct_strings.len() > ENUM_MAX_CARDINALITY {
                    profile.enum_overflow = true;
                }
            }
            _ => profile.all_enum_string = false,
        }
    }

    (profile, distinct_strings)
}

/// Picks the codec for a column. Also returns the sorted dictionary when
/// ENUM_IDS is selected, so the writer does not scan the column twice.
pub fn select_column_type(cells: &[Cell<'_>]) -> (ColumnType, Option<Vec<String>>) {
    let (profile, distinct_strings) = profile_cells(cells);

    if profile.non_null == 0 {
        return (ColumnType::RawJson, None);
    }

    if profile.all_enum_string && !profile.enum_overflow {
        let dict: Vec<String> = distinct_strings.into_iter().collect();
        return (ColumnType::EnumIds, Some(dict));
    }

    if profile.all_bool {
        return (ColumnType::BoolRle, None);
    }

    if profile.all_int {
        // "Sequential-ish": the value range is narrow relative to the count,
        // so deltas stay small.
        let range = profile.int_max.wrapping_sub(profile.int_min);
        if range < 2 * profile.non_null as i64 {
            return (ColumnType::DeltaZigzag, None);
        }
        return (ColumnType::IntVarint, None);
    }

    (ColumnType::RawJson, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn select(values: &[Value]) -> ColumnType {
        let refs: Vec<Cell<'_>> = values
            .iter()
            .map(|v| if v.is_null() { None } else { Some(v) })
            .collect();
        select_column_type(&refs).0
    }

    #[test]
    fn test_all_null_is_raw_json() {
        assert_eq!(select(&[json!(null), json!(null)]), ColumnType::RawJson);
    }

    #[test]
    fn test_enum_strings() {
        let vals = [json!("info"), json!("warn"), json!("info")];
        assert_eq!(select(&vals), ColumnType::EnumIds);
    }

    #[test]
    fn test_enum_rejects_long_strings() {
        let vals = [json!("info"), json!("a string comfortably over sixteen bytes")];
        assert_eq!(select(&vals), ColumnType::RawJson);
    }

    #[test]
    fn test_enum_rejects_empty_string() {
        let vals = [json!("info"), json!("")];
        assert_eq!(select(&vals), ColumnType::RawJson);
    }

    #[test]
    fn test_enum_rejects_high_cardinality() {
        let vals: Vec<Value> = (0..17).map(|i| json!(format!("v{}", i))).collect();
        assert_eq!(select(&vals), ColumnType::RawJson);
    }

    #[test]
    fn test_bools_take_rle() {
        let vals = [json!(true), json!(false), json!(null), json!(true)];
        assert_eq!(select(&vals), ColumnType::BoolRle);
    }

    #[test]
    fn test_sequential_ints_take_delta() {
        // Range 2 < 2 * 3 non-null values.
        let vals = [json!(100), json!(101), json!(102)];
        assert_eq!(select(&vals), ColumnType::DeltaZigzag);
    }

    #[test]
    fn test_scattered_ints_take_varint() {
        let vals = [json!(1), json!(1_000_000), json!(7)];
        assert_eq!(select(&vals), ColumnType::IntVarint);
    }

    #[test]
    fn test_floats_fall_back_to_raw() {
        let vals = [json!(1.5), json!(2.5)];
        assert_eq!(select(&vals), ColumnType::RawJson);
    }

    #[test]
    fn test_mixed_types_fall_back_to_raw() {
        let vals = [json!("x"), json!(1), json!("y")];
        assert_eq!(select(&vals), ColumnType::RawJson);
    }

    #[test]
    fn test_unsafe_magnitude_falls_back_to_raw() {
        let vals = [json!(1i64 << 53), json!(2)];
        assert_eq!(select(&vals), ColumnType::RawJson);
    }

    #[test]
    fn test_enum_wins_over_bool_and_int_order() {
        // Selection order is enum, bool, delta, varint, raw; a string column
        // therefore never reaches the integer checks.
        let vals = [json!("1"), json!("2")];
        assert_eq!(select(&vals), ColumnType::EnumIds);
    }
}
