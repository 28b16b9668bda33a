//! QuickDraw 3D metafile (3DMF) parsing
//!
//! Parses the binary 3DMF container used by the source games' models:
//! a TLV chunk tree with a trailing table of contents that `rfrn`
//! reference chunks resolve against. The parser accumulates one or more
//! groups of triangle meshes with optional textures, vertex attributes,
//! and colours.
//!
//! Only Normal-mode 1.5/1.6 metafiles are supported; database and stream
//! variants fail fatally.

pub mod chunks;
mod parser;
mod texture;

pub use chunks::ChunkTag;
pub use parser::{parse, MetafileScene};
pub use texture::swizzle_1555_to_5551;
