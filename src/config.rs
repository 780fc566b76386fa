//! The configuration surface for compression and decompression calls.
//!
//! Options are created once at the application boundary and flow down
//! the call path explicitly; nothing here is process-wide state, and no
//! environment variable is consulted anywhere in the engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The entropy coder recorded in the container header and run over the
/// body. `Hybrid` delegates the choice to the selector per input.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Codec {
    Fast,
    Dense,
    Identity,
    #[default]
    Hybrid,
    /// The optional extra coder, registered at runtime.
    Lz4,
}

impl Codec {
    /// The wire name, as it appears in the container header.
    pub fn name(&self) -> &'static str {
        match self {
            Codec::Fast => "fast",
            Codec::Dense => "dense",
            Codec::Identity => "identity",
            Codec::Hybrid => "hybrid",
            Codec::Lz4 => "lz4",
        }
    }
}

/// Policy hint for input texture. `Logs` marks timestamp/enum-heavy
/// NDJSON; the current planner makes the same decisions either way, so
/// the hint is recorded and logged but not yet acted on.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    #[default]
    Default,
    Logs,
}

/// Options for [`crate::compress`] and [`crate::compress_ndjson`].
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "snake_case")]
pub struct CompressOptions {
    /// The codec to run; defaults to the hybrid selector.
    #[serde(default)]
    pub codec: Codec,

    /// Activates the columnar front-end for NDJSON input. Row order
    /// across different record shapes is not preserved in this mode;
    /// blank-line positions always are.
    #[serde(default)]
    pub columnar: bool,

    /// Input-texture hint, see [`Profile`].
    #[serde(default)]
    pub profile: Profile,

    /// Opaque options copied into the container header.
    #[serde(default)]
    pub options: Map<String, Value>,
}

/// Options for [`crate::decompress_ndjson`].
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "snake_case")]
pub struct DecompressOptions {
    /// Field names to materialise. `None` or an empty list decodes every
    /// column.
    #[serde(default)]
    pub fields: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_default_is_hybrid() {
        assert_eq!(Codec::default(), Codec::Hybrid);
        assert_eq!(CompressOptions::default().codec, Codec::Hybrid);
    }

    #[test]
    fn test_codec_wire_names() {
        let json = serde_json::to_string(&Codec::Dense).unwrap();
        assert_eq!(json, "\"dense\"");
        let parsed: Codec = serde_json::from_str("\"hybrid\"").unwrap();
        assert_eq!(parsed, Codec::Hybrid);
        assert!(serde_json::from_str::<Codec>("\"gzip\"").is_err());
    }

    #[test]
    fn test_options_deserialise_with_defaults() {
        let opts: CompressOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts.codec, Codec::Hybrid);
        assert!(!opts.columnar);
        assert_eq!(opts.profile, Profile::Default);
    }
}
