//! Mesh and texture value objects shared by all format parsers.
//!
//! Everything here is built once during a parse call and read-only
//! afterwards; renderer construction happens outside this crate.

use glam::{Mat4, Vec3};

use crate::error::{Error, Result};

/// Vertex position storage.
///
/// Terrain meshes keep grid-quantized integer positions and defer world
/// scaling to [`Mesh::base_transform`]; everything else uses floats.
#[derive(Debug, Clone)]
pub enum VertexData {
    /// Float positions, 3 components per vertex.
    F32(Vec<f32>),
    /// Grid-quantized `(col, height, row)` positions, 3 components per vertex.
    GridU16(Vec<u16>),
}

impl VertexData {
    /// Number of vertices stored.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::F32(v) => v.len() / 3,
            Self::GridU16(v) => v.len() / 3,
        }
    }

    /// True when no vertices are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw vertex bytes for buffer upload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::F32(v) => bytemuck::cast_slice(v),
            Self::GridU16(v) => bytemuck::cast_slice(v),
        }
    }

    /// Position of vertex `i` as floats, whatever the storage.
    #[must_use]
    pub fn position(&self, i: usize) -> Vec3 {
        match self {
            Self::F32(v) => Vec3::new(v[i * 3], v[i * 3 + 1], v[i * 3 + 2]),
            Self::GridU16(v) => Vec3::new(
                f32::from(v[i * 3]),
                f32::from(v[i * 3 + 1]),
                f32::from(v[i * 3 + 2]),
            ),
        }
    }
}

/// Triangle index storage. Width is chosen from the vertex count:
/// meshes with at most 65535 vertices use 16-bit indices, larger ones
/// 32-bit. Byte-wide source data is widened to 16-bit on read.
#[derive(Debug, Clone)]
pub enum IndexData {
    /// 16-bit indices.
    U16(Vec<u16>),
    /// 32-bit indices.
    U32(Vec<u32>),
}

impl IndexData {
    /// Allocate the right width for `vertex_count` vertices.
    #[must_use]
    pub fn for_vertex_count(vertex_count: usize) -> Self {
        if vertex_count <= usize::from(u16::MAX) {
            Self::U16(Vec::new())
        } else {
            Self::U32(Vec::new())
        }
    }

    /// Number of indices stored.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
        }
    }

    /// True when no indices are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw index bytes for buffer upload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::U16(v) => bytemuck::cast_slice(v),
            Self::U32(v) => bytemuck::cast_slice(v),
        }
    }

    /// Index value at position `i`.
    #[must_use]
    pub fn get(&self, i: usize) -> u32 {
        match self {
            Self::U16(v) => u32::from(v[i]),
            Self::U32(v) => v[i],
        }
    }

    /// Append one index value.
    pub fn push(&mut self, value: u32) {
        match self {
            Self::U16(v) => v.push(value as u16),
            Self::U32(v) => v.push(value),
        }
    }

    /// Overwrite the index at position `i`.
    pub fn set(&mut self, i: usize, value: u32) {
        match self {
            Self::U16(v) => v[i] = value as u16,
            Self::U32(v) => v[i] = value,
        }
    }
}

/// Axis-aligned bounding box accumulated from vertex positions.
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
    /// True until the first point is added.
    pub is_empty: bool,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
            is_empty: true,
        }
    }
}

impl BoundingBox {
    /// Grow the box to contain `point`.
    pub fn add_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
        self.is_empty = false;
    }
}

/// A triangle mesh produced by one of the format parsers.
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Vertex positions.
    pub vertices: VertexData,
    /// Triangle indices, `triangle_count() * 3` entries.
    pub indices: IndexData,
    /// Per-vertex unit normals (3 floats each), or empty.
    pub normals: Vec<f32>,
    /// Per-vertex texture coordinates (2 floats each), or empty.
    pub uvs: Vec<f32>,
    /// Per-vertex diffuse colours (3 floats each), or empty.
    pub vertex_colours: Vec<f32>,
    /// Per-vertex terrain tile ids, or empty.
    pub tilemap_ids: Vec<u16>,
    /// Texture handle into the parse's [`TextureArena`], if textured.
    pub texture: Option<TextureHandle>,
    /// Model-to-world transform applied at render time, if any.
    pub base_transform: Option<Mat4>,
    /// Bounds of the vertex positions (pre-transform).
    pub bounding_box: BoundingBox,
    /// Uniform mesh colour as RGBA, white opaque by default.
    pub colour: [f32; 4],
}

impl Mesh {
    /// An empty mesh with default white opaque colour.
    #[must_use]
    pub fn new(vertices: VertexData, indices: IndexData) -> Self {
        Self {
            vertices,
            indices,
            normals: Vec::new(),
            uvs: Vec::new(),
            vertex_colours: Vec::new(),
            tilemap_ids: Vec::new(),
            texture: None,
            base_transform: None,
            bounding_box: BoundingBox::default(),
            colour: [1.0, 1.0, 1.0, 1.0],
        }
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check the structural invariants: index count divisible by three,
    /// every index in range, attribute arrays full-length or absent.
    pub fn validate(&self) -> Result<()> {
        let vertex_count = self.vertex_count();
        if self.indices.len() % 3 != 0 {
            return Err(Error::TriangleIndexOutOfRange {
                index: self.indices.len() as u32,
                vertex_count: vertex_count as u32,
            });
        }
        for i in 0..self.indices.len() {
            let index = self.indices.get(i);
            if index as usize >= vertex_count {
                return Err(Error::TriangleIndexOutOfRange {
                    index,
                    vertex_count: vertex_count as u32,
                });
            }
        }
        debug_assert!(self.normals.is_empty() || self.normals.len() == vertex_count * 3);
        debug_assert!(self.uvs.is_empty() || self.uvs.len() == vertex_count * 2);
        debug_assert!(
            self.vertex_colours.is_empty() || self.vertex_colours.len() == vertex_count * 3
        );
        debug_assert!(self.tilemap_ids.is_empty() || self.tilemap_ids.len() == vertex_count);
        Ok(())
    }
}

/// Pixel layouts produced by the decoders. The set is closed: only the
/// formats observed in the source games' assets are modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 16-bit RGBA, 5-5-5-1 bit layout (alpha in the low bit).
    Rgba5551,
    /// 32-bit RGBA, 8 bits per channel.
    Rgba8888,
    /// 24-bit RGB, 8 bits per channel.
    Rgb888,
    /// 8-bit greyscale.
    Grey8,
    /// 16-bit greyscale.
    Grey16,
    /// 8-bit greyscale with 8-bit alpha.
    GreyAlpha88,
}

impl PixelFormat {
    /// Bytes per pixel.
    #[must_use]
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Grey8 => 1,
            Self::Rgba5551 | Self::Grey16 | Self::GreyAlpha88 => 2,
            Self::Rgb888 => 3,
            Self::Rgba8888 => 4,
        }
    }
}

/// How a texture's alpha channel should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlphaKind {
    /// Fully opaque; any stored alpha bits are forced on.
    Opaque,
    /// Punch-through transparency (single alpha bit).
    OneBit,
    /// Full alpha channel.
    Full,
}

/// Texture coordinate wrap mode per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    /// Tile the texture.
    #[default]
    Repeat,
    /// Clamp to the edge texel.
    Clamp,
}

/// A decoded texture. `layer_count > 1` denotes an array texture
/// (terrain tile atlases store one tile per layer).
#[derive(Debug, Clone)]
pub struct Texture {
    /// Width in texels.
    pub width: u32,
    /// Height in texels (per layer).
    pub height: u32,
    /// Number of array layers.
    pub layer_count: u32,
    /// Pixel layout of `pixels`.
    pub pixel_format: PixelFormat,
    /// Alpha interpretation.
    pub alpha_kind: AlphaKind,
    /// Wrap mode along U.
    pub wrap_u: WrapMode,
    /// Wrap mode along V.
    pub wrap_v: WrapMode,
    /// Tightly packed texel data, `width * height * layer_count * bpp` bytes.
    pub pixels: Vec<u8>,
}

impl Texture {
    /// A texture shell awaiting its pixel payload.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            layer_count: 1,
            pixel_format: PixelFormat::Rgba5551,
            alpha_kind: AlphaKind::Opaque,
            wrap_u: WrapMode::default(),
            wrap_v: WrapMode::default(),
            pixels: Vec::new(),
        }
    }

    /// True once the pixel payload has been read.
    #[must_use]
    pub fn has_pixels(&self) -> bool {
        !self.pixels.is_empty()
    }
}

/// Handle into a [`TextureArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub(crate) usize);

impl TextureHandle {
    /// Arena slot index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Parse-scoped arena of textures. Identity is the handle: a texture
/// chunk seen through several `rfrn` indirections yields one arena slot
/// shared by every mesh that references it.
#[derive(Debug, Default)]
pub struct TextureArena {
    textures: Vec<Texture>,
}

impl TextureArena {
    /// An empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a slot and return its handle.
    pub fn alloc(&mut self, texture: Texture) -> TextureHandle {
        self.textures.push(texture);
        TextureHandle(self.textures.len() - 1)
    }

    /// Shared access by handle.
    #[must_use]
    pub fn get(&self, handle: TextureHandle) -> &Texture {
        &self.textures[handle.0]
    }

    /// Exclusive access by handle.
    pub fn get_mut(&mut self, handle: TextureHandle) -> &mut Texture {
        &mut self.textures[handle.0]
    }

    /// Number of allocated textures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    /// True when nothing has been allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Iterate over `(handle, texture)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (TextureHandle, &Texture)> {
        self.textures
            .iter()
            .enumerate()
            .map(|(i, t)| (TextureHandle(i), t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_width_selection() {
        assert!(matches!(IndexData::for_vertex_count(255), IndexData::U16(_)));
        assert!(matches!(
            IndexData::for_vertex_count(65535),
            IndexData::U16(_)
        ));
        assert!(matches!(
            IndexData::for_vertex_count(65536),
            IndexData::U32(_)
        ));
    }

    #[test]
    fn test_mesh_validate_rejects_out_of_range_index() {
        let vertices = VertexData::F32(vec![0.0; 9]);
        let mut indices = IndexData::for_vertex_count(3);
        indices.push(0);
        indices.push(1);
        indices.push(3); // out of range
        let mesh = Mesh::new(vertices, indices);
        assert!(matches!(
            mesh.validate(),
            Err(crate::Error::TriangleIndexOutOfRange { index: 3, .. })
        ));
    }

    #[test]
    fn test_bounding_box_accumulation() {
        let mut bbox = BoundingBox::default();
        assert!(bbox.is_empty);
        bbox.add_point(Vec3::new(1.0, 2.0, 3.0));
        bbox.add_point(Vec3::new(-1.0, 0.0, 5.0));
        assert!(!bbox.is_empty);
        assert_eq!(bbox.min, Vec3::new(-1.0, 0.0, 3.0));
        assert_eq!(bbox.max, Vec3::new(1.0, 2.0, 5.0));
    }

    #[test]
    fn test_texture_arena_aliasing() {
        let mut arena = TextureArena::new();
        let a = arena.alloc(Texture::empty());
        let b = arena.alloc(Texture::empty());
        assert_ne!(a, b);
        arena.get_mut(a).width = 64;
        assert_eq!(arena.get(a).width, 64);
        assert_eq!(arena.get(b).width, 0);
    }
}
