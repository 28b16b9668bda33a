//! 3DMF chunk tags
//!
//! The four-byte tag of each chunk is decoded once into a closed enum so
//! dispatch in the parser is an exhaustive match; anything outside the
//! consumed subset lands in [`ChunkTag::Unknown`] and is skipped by its
//! declared size.

/// Chunk kinds consumed by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkTag {
    /// `cntr` - container bounding nested chunks by byte size.
    Container,
    /// `bgng` - group start; runs until the matching [`ChunkTag::EndGroup`].
    BeginGroup,
    /// `endg` - group end.
    EndGroup,
    /// `tmsh` - triangle mesh.
    TriMesh,
    /// `atar` - attribute array attached to the current mesh.
    AttributeArray,
    /// `txsu` - texture shader; owns the texture identity for its offset.
    TextureShader,
    /// `txmm` - mipmap pixel payload.
    Mipmap,
    /// `txpm` - pixmap pixel payload.
    Pixmap,
    /// `shdr` - shader data (texture wrap modes).
    ShaderData,
    /// `attr` - attribute set container.
    AttributeSet,
    /// `kdif` - diffuse colour.
    DiffuseColor,
    /// `kxpr` - transparency colour.
    TransparencyColor,
    /// `rfrn` - reference into the table of contents.
    Reference,
    /// `toc ` - table of contents (parsed ahead of the tree walk).
    Toc,
    /// Anything else: skipped by declared size.
    Unknown([u8; 4]),
}

impl ChunkTag {
    /// Decode a four-byte tag.
    #[must_use]
    pub fn from_bytes(tag: [u8; 4]) -> Self {
        match &tag {
            b"cntr" => Self::Container,
            b"bgng" => Self::BeginGroup,
            b"endg" => Self::EndGroup,
            b"tmsh" => Self::TriMesh,
            b"atar" => Self::AttributeArray,
            b"txsu" => Self::TextureShader,
            b"txmm" => Self::Mipmap,
            b"txpm" => Self::Pixmap,
            b"shdr" => Self::ShaderData,
            b"attr" => Self::AttributeSet,
            b"kdif" => Self::DiffuseColor,
            b"kxpr" => Self::TransparencyColor,
            b"rfrn" => Self::Reference,
            b"toc " => Self::Toc,
            _ => Self::Unknown(tag),
        }
    }
}

/// QuickDraw 3D vertex/face attribute types consumed from `atar` chunks.
pub(crate) mod attribute_type {
    pub const SURFACE_UV: i32 = 1;
    pub const SHADING_UV: i32 = 2;
    pub const NORMAL: i32 = 3;
    pub const DIFFUSE_COLOR: i32 = 5;
}

/// Position-of-array values in `atar` chunks.
pub(crate) mod attribute_position {
    pub const FACES: u32 = 0;
    pub const VERTICES: u32 = 2;
}
