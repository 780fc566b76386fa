//! End-to-end tests over the public API: the logs workload, blank-line
//! preservation, schema drift with selective decode, tamper rejection,
//! codec honesty, and the format's boundary cases.

use serde_json::{json, Value};

use crate::config::{Codec, CompressOptions, DecompressOptions};
use crate::{compress, compress_ndjson, decompress, decompress_ndjson};

fn columnar_opts() -> CompressOptions {
    CompressOptions {
        columnar: true,
        ..CompressOptions::default()
    }
}

fn fields(names: &[&str]) -> DecompressOptions {
    DecompressOptions {
        fields: Some(names.iter().map(|s| s.to_string()).collect()),
    }
}

fn parse_lines(text: &str) -> Vec<Option<Value>> {
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                None
            } else {
                Some(serde_json::from_str(line).expect("decoded line must be valid JSON"))
            }
        })
        .collect()
}

const LOG_LINES: &str = "\
{\"ts\":\"2024-01-01T00:00:00.000Z\",\"level\":\"info\",\"service\":\"api\",\"message\":\"start\",\"id\":1}\n\
{\"ts\":\"2024-01-01T00:00:01.000Z\",\"level\":\"info\",\"service\":\"api\",\"message\":\"ok\",\"id\":2}\n\
{\"ts\":\"2024-01-01T00:00:02.000Z\",\"level\":\"warn\",\"service\":\"api\",\"message\":\"slow\",\"id\":3}";

#[test]
fn logs_full_decode_is_parse_equal() {
    let container = compress_ndjson(LOG_LINES, &columnar_opts()).unwrap();
    let text = decompress_ndjson(&container, &DecompressOptions::default()).unwrap();
    let decoded = parse_lines(&text);
    let original = parse_lines(LOG_LINES);
    assert_eq!(decoded.len(), 3);
    for (i, (decoded, original)) in decoded.iter().zip(&original).enumerate() {
        assert_eq!(decoded, original, "line {}", i);
    }
}

#[test]
fn logs_selective_decode_restricts_to_requested_fields() {
    let container = compress_ndjson(LOG_LINES, &columnar_opts()).unwrap();
    let text = decompress_ndjson(&container, &fields(&["ts", "level", "service"])).unwrap();
    let decoded = parse_lines(&text);
    assert_eq!(decoded.len(), 3);

    let expected_levels = ["info", "info", "warn"];
    let expected_ts = [
        "2024-01-01T00:00:00.000Z",
        "2024-01-01T00:00:01.000Z",
        "2024-01-01T00:00:02.000Z",
    ];
    for (i, line) in decoded.iter().enumerate() {
        let obj = line.as_ref().unwrap().as_object().unwrap();
        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["level", "service", "ts"], "line {}", i);
        assert_eq!(obj["ts"], json!(expected_ts[i]));
        assert_eq!(obj["level"], json!(expected_levels[i]));
        assert_eq!(obj["service"], json!("api"));
    }
}

#[test]
fn blank_line_positions_are_preserved() {
    let input = "{\"a\":1}\n\n{\"b\":2}\n   \n{\"c\":3}";
    for opts in [columnar_opts(), CompressOptions::default()] {
        let container = compress_ndjson(input, &opts).unwrap();
        let text = decompress_ndjson(&container, &DecompressOptions::default()).unwrap();
        let lines: Vec<&str> = text.split('\n').collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[1], "");
        assert_eq!(lines[3], "");
        assert_eq!(
            serde_json::from_str::<Value>(lines[0]).unwrap(),
            json!({"a": 1})
        );
        assert_eq!(
            serde_json::from_str::<Value>(lines[2]).unwrap(),
            json!({"b": 2})
        );
        assert_eq!(
            serde_json::from_str::<Value>(lines[4]).unwrap(),
            json!({"c": 3})
        );
    }
}

#[test]
fn schema_drift_selective_decode() {
    let mut input = String::new();
    for i in 0..10 {
        input.push_str(&format!("{{\"a\":{},\"b\":{}}}\n", i, 100 + i));
    }
    for i in 0..10 {
        input.push_str(&format!("{{\"a\":{},\"c\":{}}}\n", 10 + i, 200 + i));
    }
    input.pop();
    let container = compress_ndjson(&input, &columnar_opts()).unwrap();

    // F = {a}: all twenty lines carry a with the right values.
    let text = decompress_ndjson(&container, &fields(&["a"])).unwrap();
    for (i, line) in parse_lines(&text).iter().enumerate() {
        let obj = line.as_ref().unwrap().as_object().unwrap();
        assert_eq!(obj.len(), 1, "line {}", i);
        assert_eq!(obj["a"], json!(i), "line {}", i);
    }

    // F = {b}: first ten lines carry b, the rest are {}.
    let text = decompress_ndjson(&container, &fields(&["b"])).unwrap();
    for (i, line) in parse_lines(&text).iter().enumerate() {
        let obj = line.as_ref().unwrap().as_object().unwrap();
        if i < 10 {
            assert_eq!(obj["b"], json!(100 + i), "line {}", i);
        } else {
            assert!(obj.is_empty(), "line {}", i);
        }
    }

    // F = {c}: mirror image.
    let text = decompress_ndjson(&container, &fields(&["c"])).unwrap();
    for (i, line) in parse_lines(&text).iter().enumerate() {
        let obj = line.as_ref().unwrap().as_object().unwrap();
        if i < 10 {
            assert!(obj.is_empty(), "line {}", i);
        } else {
            assert_eq!(obj["c"], json!(200 + i - 10), "line {}", i);
        }
    }
}

#[test]
fn tampered_container_is_rejected() {
    let container = compress(r#"{"hello":"world"}"#, &CompressOptions::default()).unwrap();
    let header_len = u32::from_le_bytes(container[4..8].try_into().unwrap()) as usize;
    let crc_end = 8 + header_len + 4;
    // Flip one byte at every position strictly after the CRC field.
    for i in crc_end..container.len() {
        let mut tampered = container.clone();
        tampered[i] ^= 0x01;
        let err = decompress(&tampered).unwrap_err();
        assert_eq!(err.kind(), "ContainerCorrupt", "byte {}", i);
    }
}

#[test]
fn header_codec_is_honest() {
    // An explicit codec request is recorded verbatim.
    let opts = CompressOptions {
        codec: Codec::Dense,
        ..CompressOptions::default()
    };
    let container = compress(r#"{"x":1}"#, &opts).unwrap();
    let (header, _) = crate::container::unwrap(&container).unwrap();
    assert_eq!(header.codec, Codec::Dense);

    // With no request the default selector is recorded.
    let container = compress(r#"{"x":1}"#, &CompressOptions::default()).unwrap();
    let (header, _) = crate::container::unwrap(&container).unwrap();
    assert_eq!(header.codec, Codec::Hybrid);
}

#[test]
fn mixed_type_column_roundtrips_exact_text() {
    let mut input = String::new();
    for i in 0..6 {
        if i % 2 == 0 {
            input.push_str(&format!("{{\"v\":\"text-{}\"}}\n", i));
        } else {
            input.push_str(&format!("{{\"v\":{}}}\n", i * 1000));
        }
    }
    input.pop();
    let container = compress_ndjson(&input, &columnar_opts()).unwrap();
    let text = decompress_ndjson(&container, &DecompressOptions::default()).unwrap();
    // One shape, so row order and the exact canonical text both survive.
    assert_eq!(text, input);
}

//==================================================================================
// Boundary checks
//==================================================================================

#[test]
fn zero_key_records_roundtrip() {
    let input = ["{}"; 12].join("\n") + "\n" + &" ".repeat(64);
    let container = compress_ndjson(&input, &columnar_opts()).unwrap();
    let text = decompress_ndjson(&container, &DecompressOptions::default()).unwrap();
    let lines: Vec<&str> = text.split('\n').collect();
    assert_eq!(lines.len(), 13);
    for line in &lines[..12] {
        assert_eq!(*line, "{}");
    }
    assert_eq!(lines[12], "");
}

#[test]
fn all_null_column_preserves_null() {
    let mut input = String::new();
    for i in 0..6 {
        input.push_str(&format!("{{\"id\":{},\"gone\":null}}\n", i));
    }
    input.pop();
    let container = compress_ndjson(&input, &columnar_opts()).unwrap();
    let text = decompress_ndjson(&container, &DecompressOptions::default()).unwrap();
    for line in parse_lines(&text) {
        let obj = line.unwrap();
        assert!(obj.as_object().unwrap().contains_key("gone"));
        assert_eq!(obj["gone"], Value::Null);
    }
}

#[test]
fn shape_group_splits_at_batch_bound() {
    let mut input = String::new();
    for i in 0..4097 {
        input.push_str(&format!("{{\"n\":{}}}\n", i));
    }
    input.pop();
    let opts = CompressOptions {
        codec: Codec::Fast,
        columnar: true,
        ..CompressOptions::default()
    };
    let container = compress_ndjson(&input, &opts).unwrap();
    let text = decompress_ndjson(&container, &DecompressOptions::default()).unwrap();
    let decoded = parse_lines(&text);
    assert_eq!(decoded.len(), 4097);
    for (i, line) in decoded.iter().enumerate() {
        assert_eq!(line.as_ref().unwrap()["n"], json!(i), "line {}", i);
    }
}

#[test]
fn every_codec_roundtrips_columnar_ndjson() {
    let mut input = String::new();
    for i in 0..20 {
        // Keys written in sorted order so the decoded text compares equal.
        input.push_str(&format!(
            "{{\"flag\":{},\"id\":{},\"level\":\"{}\"}}\n",
            i % 2 == 0,
            i,
            if i % 3 == 0 { "warn" } else { "info" },
        ));
    }
    input.pop();
    for codec in [Codec::Fast, Codec::Dense, Codec::Identity, Codec::Hybrid, Codec::Lz4] {
        let opts = CompressOptions {
            codec,
            columnar: true,
            ..CompressOptions::default()
        };
        let container = compress_ndjson(&input, &opts).unwrap();
        let text = decompress_ndjson(&container, &DecompressOptions::default()).unwrap();
        assert_eq!(text, input, "codec {:?}", codec);
    }
}

#[test]
fn unknown_fields_never_fail() {
    let container = compress_ndjson(LOG_LINES, &columnar_opts()).unwrap();
    let text = decompress_ndjson(&container, &fields(&["nope", "level"])).unwrap();
    for line in parse_lines(&text) {
        let obj = line.unwrap();
        let obj = obj.as_object().unwrap();
        assert!(obj.len() <= 1);
        assert!(!obj.contains_key("nope"));
    }
}
