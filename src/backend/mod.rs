//! Generic entropy back-ends behind a uniform interface.
//!
//! A back-end is a general-purpose byte-stream coder with a stable name
//! and a stable 8-bit wire tag. The set of available back-ends is data
//! carried down the call path (a `BackendSet`), never global state: the
//! dense and fast coders are mandatory, and one extra coder may be
//! registered at runtime under the extra tag.

pub mod deflate;
pub mod hybrid;
pub mod identity;
pub mod lz4;
pub mod zstd;

use crate::error::JcoError;

/// Wire tag of the dense coder (Zstandard).
pub const TAG_DENSE: u8 = 0;
/// Wire tag of the fast coder (DEFLATE).
pub const TAG_FAST: u8 = 1;
/// Wire tag of the optional extra coder.
pub const TAG_EXTRA: u8 = 2;

/// A general-purpose entropy coder over arbitrary byte streams.
pub trait Backend: Send + Sync {
    /// Stable codec name, as recorded in the container header.
    fn name(&self) -> &'static str;
    /// Stable 8-bit tag used in windowed payloads.
    fn tag(&self) -> u8;
    fn compress(&self, input: &[u8]) -> Result<Vec<u8>, JcoError>;
    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, JcoError>;
}

/// The registered back-ends, ordered by tag. The order is the fixed probe
/// order for tagless solid payloads.
pub struct BackendSet {
    backends: Vec<Box<dyn Backend>>,
}

impl BackendSet {
    /// The mandatory pair: dense (tag 0) and fast (tag 1).
    pub fn standard() -> Self {
        BackendSet {
            backends: vec![
                Box::new(zstd::ZstdBackend::default()),
                Box::new(deflate::DeflateBackend),
            ],
        }
    }

    /// The standard set with the built-in extra coder registered.
    pub fn with_extra() -> Self {
        let mut set = Self::standard();
        set.register(Box::new(lz4::Lz4Backend));
        set
    }

    /// Registers an additional coder. Its tag must not collide with an
    /// already-registered one.
    pub fn register(&mut self, backend: Box<dyn Backend>) {
        debug_assert!(
            self.by_tag(backend.tag()).is_none(),
            "backend tag {} registered twice",
            backend.tag()
        );
        self.backends.push(backend);
        self.backends.sort_by_key(|b| b.tag());
    }

    pub fn by_tag(&self, tag: u8) -> Option<&dyn Backend> {
        self.backends
            .iter()
            .find(|b| b.tag() == tag)
            .map(|b| b.as_ref())
    }

    pub fn by_name(&self, name: &str) -> Option<&dyn Backend> {
        self.backends
            .iter()
            .find(|b| b.name() == name)
            .map(|b| b.as_ref())
    }

    /// Back-ends in fixed tag order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Backend> + '_ {
        self.backends.iter().map(|b| b.as_ref())
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_set_has_mandatory_pair() {
        let set = BackendSet::standard();
        assert_eq!(set.len(), 2);
        assert_eq!(set.by_tag(TAG_DENSE).unwrap().name(), "dense");
        assert_eq!(set.by_tag(TAG_FAST).unwrap().name(), "fast");
        assert!(set.by_tag(TAG_EXTRA).is_none());
    }

    #[test]
    fn test_extra_registration() {
        let set = BackendSet::with_extra();
        assert_eq!(set.by_tag(TAG_EXTRA).unwrap().name(), "lz4");
        assert_eq!(set.by_name("lz4").unwrap().tag(), TAG_EXTRA);
    }

    #[test]
    fn test_iteration_is_tag_ordered() {
        let set = BackendSet::with_extra();
        let tags: Vec<u8> = set.iter().map(|b| b.tag()).collect();
        assert_eq!(tags, vec![TAG_DENSE, TAG_FAST, TAG_EXTRA]);
    }

    #[test]
    fn test_every_backend_roundtrips() {
        let set = BackendSet::with_extra();
        let input = b"a moderately repetitive payload payload payload payload".to_vec();
        for backend in set.iter() {
            let compressed = backend.compress(&input).unwrap();
            let restored = backend.decompress(&compressed).unwrap();
            assert_eq!(restored, input, "backend {}", backend.name());
        }
    }
}
