//! Record shapes and shape grouping.
//!
//! A record's shape is its sorted key list; the canonical serialisation
//! is the keys joined by U+0001 and the shape id is FNV-1a 64 over that.
//! The table keeps the literal key list next to the hash: a collision
//! between different key lists is detected and split into separate
//! groups rather than merged.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::kernels::fnv::fnv1a_64;

/// Computes the shape id for a sorted key list.
pub fn shape_id(keys_sorted: &[String]) -> u64 {
    let canonical = keys_sorted.join("\u{1}");
    fnv1a_64(canonical.as_bytes())
}

/// One shape group: every record in it has exactly this key list.
#[derive(Debug)]
pub struct ShapeGroup {
    pub shape_id: u64,
    pub keys: Vec<String>,
    pub records: Vec<Map<String, Value>>,
}

/// Groups records by shape in first-seen document order.
#[derive(Debug, Default)]
pub struct ShapeTable {
    groups: Vec<ShapeGroup>,
    by_id: HashMap<u64, Vec<usize>>,
}

impl ShapeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record to its shape group, creating the group on first
    /// sight of the shape.
    pub fn push(&mut self, record: Map<String, Value>) {
        // serde_json's default map is ordered by key, so iteration order
        // is already the sorted key list.
        let keys: Vec<String> = record.keys().cloned().collect();
        let id = shape_id(&keys);

        let candidates = self.by_id.entry(id).or_default();
        for &group_idx in candidates.iter() {
            if self.groups[group_idx].keys == keys {
                self.groups[group_idx].records.push(record);
                return;
            }
        }
        // New shape, or an FNV collision with a different key list.
        candidates.push(self.groups.len());
        self.groups.push(ShapeGroup {
            shape_id: id,
            keys,
            records: vec![record],
        });
    }

    pub fn record_count(&self) -> usize {
        self.groups.iter().map(|g| g.records.len()).sum()
    }

    /// Groups in first-seen order.
    pub fn groups(&self) -> &[ShapeGroup] {
        &self.groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_same_shape_groups_together() {
        let mut table = ShapeTable::new();
        table.push(record(json!({"a": 1, "b": 2})));
        table.push(record(json!({"b": 5, "a": 9})));
        assert_eq!(table.groups().len(), 1);
        assert_eq!(table.groups()[0].records.len(), 2);
    }

    #[test]
    fn test_key_order_does_not_change_shape() {
        let a = shape_id(&["a".to_string(), "b".to_string()]);
        let mut table = ShapeTable::new();
        table.push(record(json!({"b": 1, "a": 2})));
        assert_eq!(table.groups()[0].shape_id, a);
    }

    #[test]
    fn test_different_shapes_split() {
        let mut table = ShapeTable::new();
        table.push(record(json!({"a": 1, "b": 2})));
        table.push(record(json!({"a": 1, "c": 2})));
        assert_eq!(table.groups().len(), 2);
        assert_eq!(table.groups()[0].keys, vec!["a", "b"]);
        assert_eq!(table.groups()[1].keys, vec!["a", "c"]);
    }

    #[test]
    fn test_groups_keep_first_seen_order() {
        let mut table = ShapeTable::new();
        table.push(record(json!({"z": 1})));
        table.push(record(json!({"a": 1})));
        table.push(record(json!({"z": 2})));
        assert_eq!(table.groups()[0].keys, vec!["z"]);
        assert_eq!(table.groups()[1].keys, vec!["a"]);
        assert_eq!(table.record_count(), 3);
    }
}
