//! jco: a JSON-native compression engine for newline-delimited JSON.
//!
//! The engine pairs a columnar front-end (records grouped by shape and
//! transposed into per-field columns, each encoded by a
//! type-specialised codec) with generic entropy back-ends chosen
//! adaptively per input. Its distinguishing capability is selective
//! field decode: a consumer names a subset of fields and recovers only
//! those columns, while every line position and blank line of the
//! original stream is preserved.
//!
//! The four entry points are [`compress`] / [`decompress`] for single
//! JSON documents and [`compress_ndjson`] / [`decompress_ndjson`] for
//! NDJSON streams; see [`config::CompressOptions`] for codec and
//! columnar-mode selection.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//==================================================================================
// 1. Module Declarations
//==================================================================================
#[doc(hidden)]
pub mod observability;

pub mod backend;
pub mod canonical;
pub mod column;
pub mod columnar;
pub mod config;
pub mod container;
pub mod error;
pub mod frame;
pub mod kernels;

mod api;

#[cfg(test)]
mod scenario_tests;

//==================================================================================
// 2. Public Surface
//==================================================================================
pub use api::{compress, compress_ndjson, decompress, decompress_ndjson};
pub use config::{Codec, CompressOptions, DecompressOptions, Profile};
pub use error::JcoError;
