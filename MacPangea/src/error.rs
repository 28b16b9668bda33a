//! Error types for `MacPangea`

use thiserror::Error;

/// The error type for `MacPangea` operations.
///
/// Every structural violation in an asset file is fatal: the inputs are
/// fixed, versioned game assets, so a mismatch means either a corrupt file
/// or an unhandled format variant. There is no partial-parse recovery.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations or a truncated buffer read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== 3DMF Metafile Errors ====================
    /// The file is not a QuickDraw 3D metafile (missing 3DMF magic).
    #[error("invalid 3DMF magic: expected \"3DMF\", found {0:?}")]
    InvalidMetafileMagic([u8; 4]),

    /// The metafile header declares an unexpected length (must be 16).
    #[error("invalid 3DMF header length: expected 16, found {0}")]
    InvalidMetafileHeaderLength(u32),

    /// Only metafile versions 1.5 and 1.6 are supported.
    #[error("unsupported 3DMF version: {major}.{minor}")]
    UnsupportedMetafileVersion {
        /// Major version from the header.
        major: u16,
        /// Minor version from the header.
        minor: u16,
    },

    /// Database and stream metafile variants are not supported (flags must be 0).
    #[error("unsupported 3DMF mode flags: {0:#x} (only Normal mode is supported)")]
    UnsupportedMetafileFlags(u32),

    /// The table of contents declares an unexpected entry shape.
    #[error("unsupported 3DMF TOC shape: entry type {entry_type}, entry size {entry_size}")]
    UnsupportedTocShape {
        /// TOC entry type (must be 1).
        entry_type: u32,
        /// TOC entry size in bytes (must be 16).
        entry_size: u32,
    },

    /// A reference chunk names an object id absent from the table of contents.
    #[error("3DMF reference to unknown TOC object id {0}")]
    UnknownTocReference(u32),

    /// A triangle mesh chunk begins while another is still being parsed.
    #[error("nested 3DMF triangle mesh")]
    NestedTriMesh,

    /// Edge and edge-attribute data in triangle meshes is not supported.
    #[error("3DMF triangle mesh declares edge data: {edges} edges, {edge_attributes} edge attributes")]
    TriMeshEdgesUnsupported {
        /// Declared edge count (must be 0).
        edges: u32,
        /// Declared edge attribute count (must be 0).
        edge_attributes: u32,
    },

    /// A triangle index is out of range for its mesh.
    #[error("3DMF triangle index {index} out of range (vertex count {vertex_count})")]
    TriangleIndexOutOfRange {
        /// The offending index value.
        index: u32,
        /// The mesh's vertex count.
        vertex_count: u32,
    },

    /// An attribute chunk appeared outside any triangle mesh.
    #[error("3DMF attribute array outside a triangle mesh")]
    AttributeOutsideMesh,

    /// A vertex attribute was set twice on the same mesh.
    #[error("3DMF {0} attribute set twice on one mesh")]
    AttributeAlreadySet(&'static str),

    /// An attribute array has an unsupported position-of-array value.
    #[error("unsupported 3DMF attribute position-of-array: {0}")]
    UnsupportedAttributePosition(u32),

    /// An attribute array carries a type outside the consumed subset.
    #[error("unsupported 3DMF attribute type: {0}")]
    UnsupportedAttributeType(i32),

    /// A vertex normal attribute not stored at position-in-array 0.
    #[error("3DMF vertex normal attribute at position-in-array {0}, expected 0")]
    MisplacedNormalAttribute(u32),

    /// Texture pixel data in an unsupported pixel type.
    #[error("unsupported 3DMF texture pixel type: {0}")]
    UnsupportedTexturePixelType(u32),

    /// Texture pixel data with an unsupported byte order or mipmapping.
    #[error("unsupported 3DMF texture encoding: {0}")]
    UnsupportedTextureEncoding(&'static str),

    /// A shader chunk specifies an unknown wrap mode.
    #[error("unknown 3DMF texture wrap mode: {0}")]
    UnknownWrapMode(u32),

    /// A transparency colour chunk whose components are not all equal.
    #[error("3DMF transparency components differ: {0:?}")]
    UnequalTransparencyComponents([f32; 3]),

    /// A texture was referenced but its pixel payload never appeared.
    #[error("{0} 3DMF texture(s) referenced without pixel data")]
    TextureWithoutPixels(usize),

    // ==================== Resource Fork Errors ====================
    /// The buffer is not AppleSingle/AppleDouble encoded.
    #[error("invalid AppleSingle/AppleDouble magic: {0:#010x}")]
    InvalidAppleMagic(u32),

    /// Unsupported AppleSingle/AppleDouble version.
    #[error("unsupported AppleSingle/AppleDouble version: {0:#010x}")]
    UnsupportedAppleVersion(u32),

    /// The AppleSingle/AppleDouble entry directory has no resource fork.
    #[error("no resource fork entry in AppleSingle/AppleDouble directory")]
    ResourceForkEntryMissing,

    /// Compressed resources are not supported.
    #[error("compressed resource {tag} #{id}")]
    CompressedResource {
        /// Four-character resource type.
        tag: FourCc,
        /// Resource id.
        id: i16,
    },

    /// A required resource is absent from the fork.
    #[error("resource not found: {tag} #{id}")]
    ResourceNotFound {
        /// Four-character resource type.
        tag: FourCc,
        /// Resource id.
        id: i16,
    },

    // ==================== TGA Errors ====================
    /// Unknown or unsupported TGA image type byte.
    #[error("unsupported TGA image type: {0}")]
    UnsupportedTgaImageType(u8),

    /// Right-to-left or bottom-origin TGA images are not implemented.
    #[error("unsupported TGA orientation: image descriptor {0:#04x}")]
    UnsupportedTgaOrientation(u8),

    /// Pixel depth outside the supported format table.
    #[error("unsupported TGA pixel depth {depth} for image type {image_type}")]
    UnsupportedTgaDepth {
        /// TGA image type byte.
        image_type: u8,
        /// Bits per pixel.
        depth: u8,
    },

    /// A colour-mapped image without a colour map, or an index past its end.
    #[error("invalid TGA colour map: {0}")]
    InvalidTgaColorMap(&'static str),

    /// An RLE packet extends past the last pixel of the image.
    #[error("TGA RLE packet overruns the image: {actual} values for a {expected}-value image")]
    TgaRleOverrun {
        /// `width * height`.
        expected: usize,
        /// Value count the packet would produce.
        actual: usize,
    },

    // ==================== Terrain Errors ====================
    /// The heightmap buffer does not match the declared grid dimensions.
    #[error("heightmap size mismatch: expected {expected} samples, found {actual}")]
    HeightmapSizeMismatch {
        /// `(width + 1) * (height + 1)`.
        expected: usize,
        /// Actual sample count.
        actual: usize,
    },

    /// The tile grid does not match the declared quad dimensions.
    #[error("tile grid size mismatch: expected {expected} tiles, found {actual}")]
    TileGridSizeMismatch {
        /// `width * height`.
        expected: usize,
        /// Actual tile count.
        actual: usize,
    },

    /// A terrain grid with zero quads in either direction.
    #[error("terrain grid has zero extent: {width} x {height} quads")]
    EmptyTerrainGrid {
        /// Quads along X.
        width: u32,
        /// Quads along Z.
        height: u32,
    },

    /// A terrain file layer offset points outside the buffer.
    #[error("terrain {layer} layer out of bounds: offset {offset:#x}, file size {file_size}")]
    TerrainLayerOutOfBounds {
        /// Layer name.
        layer: &'static str,
        /// Offset from the file header.
        offset: usize,
        /// Total file size.
        file_size: usize,
    },

    // ==================== Skeleton Errors ====================
    /// Skeleton header resource with an unsupported version word.
    #[error("unsupported skeleton version: {0:#06x} (expected 0x0110)")]
    UnsupportedSkeletonVersion(u16),

    /// A bone references a parent at or above its own index.
    #[error("bone {bone} has invalid parent {parent}")]
    InvalidBoneParent {
        /// Bone index.
        bone: usize,
        /// Parent index from the file (root is -1).
        parent: i32,
    },

    /// The relative-point-offset table disagrees with the decomposed point count.
    #[error("relative point table holds {actual} floats, expected {expected} (3 x {points} decomposed points)")]
    RelativePointCountMismatch {
        /// `3 * points`.
        expected: usize,
        /// Actual float count in the `RelP` resource.
        actual: usize,
        /// Decomposed point count.
        points: usize,
    },

    /// A bone attachment index points past the decomposed tables.
    #[error("bone {bone} {table} ref {index} out of range ({len} entries)")]
    BoneRefOutOfRange {
        /// Bone index.
        bone: usize,
        /// "point" or "normal".
        table: &'static str,
        /// The offending index.
        index: u16,
        /// Table length.
        len: usize,
    },
}

/// A specialized [`Result`] type for `MacPangea` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Four-character code wrapper that displays as ASCII (e.g. `tmsh`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCc(pub [u8; 4]);

impl std::fmt::Display for FourCc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

impl From<[u8; 4]> for FourCc {
    fn from(tag: [u8; 4]) -> Self {
        Self(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fourcc_display() {
        assert_eq!(FourCc(*b"tmsh").to_string(), "tmsh");
        assert_eq!(FourCc(*b"toc ").to_string(), "toc ");
        assert_eq!(FourCc([0x00, b'a', b'b', b'c']).to_string(), "\\x00abc");
    }

    #[test]
    fn test_error_messages() {
        let err = Error::ResourceNotFound {
            tag: FourCc(*b"Hedr"),
            id: 1000,
        };
        assert_eq!(err.to_string(), "resource not found: Hedr #1000");

        let err = Error::UnsupportedMetafileVersion { major: 2, minor: 0 };
        assert_eq!(err.to_string(), "unsupported 3DMF version: 2.0");
    }
}
