//! Pure, stateless primitive codecs shared by the column encoders and the
//! frame layer. Each kernel is panic-free and owns no state beyond its
//! arguments.

pub mod bitmap;
pub mod fnv;
pub mod leb128;
pub mod zigzag;
