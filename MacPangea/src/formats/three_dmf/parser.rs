//! 3DMF chunk tree walk
//!
//! The file is a header, an optional trailing table of contents, and a
//! stream of `{tag, size, body}` chunks starting at byte 24. The walk is
//! a recursive descent with an explicit cursor offset: every chunk
//! function takes the offset it starts at and returns the offset just
//! past the chunk, so `rfrn` backward jumps are plain calls at the
//! target offset with the original cursor untouched. All transient
//! state lives in a [`ParseContext`] owned by one [`parse`] call.

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek, SeekFrom};

use byteorder::{BigEndian, ReadBytesExt};
use glam::Vec3;

use super::chunks::{attribute_position, attribute_type, ChunkTag};
use super::texture::{pad_transparent_edges, swizzle_1555_to_5551, trim_row_padding};
use crate::error::{Error, Result};
use crate::mesh::{
    AlphaKind, IndexData, Mesh, PixelFormat, Texture, TextureArena, TextureHandle, VertexData,
    WrapMode,
};

const METAFILE_MAGIC: [u8; 4] = *b"3DMF";
const HEADER_LENGTH: u32 = 16;
const MODE_NORMAL: u32 = 0;
const TOC_ENTRY_TYPE: u32 = 1;
const TOC_ENTRY_SIZE: u32 = 16;

// QuickDraw 3D pixel types and byte/bit orders.
const PIXEL_TYPE_RGB16: u32 = 2;
const PIXEL_TYPE_ARGB16: u32 = 3;
const ORDER_BIG_ENDIAN: u32 = 0;

// Texture wrap modes in shader data chunks.
const WRAP_REPEAT: u32 = 0;
const WRAP_CLAMP: u32 = 1;

/// Everything a metafile yields: groups of meshes plus the texture arena
/// their handles point into.
#[derive(Debug)]
pub struct MetafileScene {
    /// One mesh group per top-level container/group chunk.
    pub groups: Vec<Vec<Mesh>>,
    /// Textures shared by the meshes.
    pub textures: TextureArena,
}

/// Transient parse state, owned by one [`parse`] call.
struct ParseContext {
    /// TOC object id -> (file offset, chunk type tag).
    toc: HashMap<u32, (u64, [u8; 4])>,
    /// First occurrence of a texture shader chunk owns the texture;
    /// later visits through `rfrn` alias the same handle.
    textures_by_offset: HashMap<u64, TextureHandle>,
    textures: TextureArena,
    groups: Vec<Vec<Mesh>>,
    /// Mesh receiving attributes, as (group, index) into `groups`.
    current_mesh: Option<(usize, usize)>,
    current_texture: Option<TextureHandle>,
}

impl ParseContext {
    fn new() -> Self {
        Self {
            toc: HashMap::new(),
            textures_by_offset: HashMap::new(),
            textures: TextureArena::new(),
            groups: Vec::new(),
            current_mesh: None,
            current_texture: None,
        }
    }

    fn current_mesh_mut(&mut self) -> Option<&mut Mesh> {
        let (group, index) = self.current_mesh?;
        Some(&mut self.groups[group][index])
    }

    fn require_mesh(&mut self) -> Result<&mut Mesh> {
        self.current_mesh_mut().ok_or(Error::AttributeOutsideMesh)
    }
}

/// Parse a 3DMF buffer into mesh groups and textures.
pub fn parse(data: &[u8]) -> Result<MetafileScene> {
    let mut cursor = Cursor::new(data);

    let mut magic = [0u8; 4];
    cursor.read_exact(&mut magic)?;
    if magic != METAFILE_MAGIC {
        return Err(Error::InvalidMetafileMagic(magic));
    }
    let header_length = cursor.read_u32::<BigEndian>()?;
    if header_length != HEADER_LENGTH {
        return Err(Error::InvalidMetafileHeaderLength(header_length));
    }
    let major = cursor.read_u16::<BigEndian>()?;
    let minor = cursor.read_u16::<BigEndian>()?;
    if major != 1 || (minor != 5 && minor != 6) {
        return Err(Error::UnsupportedMetafileVersion { major, minor });
    }
    let flags = cursor.read_u32::<BigEndian>()?;
    if flags != MODE_NORMAL {
        return Err(Error::UnsupportedMetafileFlags(flags));
    }
    let toc_offset = cursor.read_u64::<BigEndian>()?;

    let mut ctx = ParseContext::new();
    if toc_offset != 0 {
        read_toc(data, toc_offset, &mut ctx)?;
    }

    let mut offset = 24usize;
    while offset < data.len() {
        offset = parse_chunk(data, offset, 1, &mut ctx)?;
    }

    // Every texture ever referenced must have received its pixels.
    let missing = ctx
        .textures
        .iter()
        .filter(|(_, texture)| !texture.has_pixels())
        .count();
    if missing > 0 {
        return Err(Error::TextureWithoutPixels(missing));
    }
    for group in &ctx.groups {
        for mesh in group {
            mesh.validate()?;
        }
    }

    tracing::debug!(
        groups = ctx.groups.len(),
        meshes = ctx.groups.iter().map(Vec::len).sum::<usize>(),
        textures = ctx.textures.len(),
        "parsed 3DMF metafile"
    );
    Ok(MetafileScene {
        groups: ctx.groups,
        textures: ctx.textures,
    })
}

/// Read the flat table of contents into the reference map.
fn read_toc(data: &[u8], toc_offset: u64, ctx: &mut ParseContext) -> Result<()> {
    let mut cursor = Cursor::new(data);
    cursor.seek(SeekFrom::Start(toc_offset))?;

    let mut tag = [0u8; 4];
    cursor.read_exact(&mut tag)?;
    let _size = cursor.read_u32::<BigEndian>()?;
    if ChunkTag::from_bytes(tag) != ChunkTag::Toc {
        return Err(Error::InvalidMetafileMagic(tag));
    }
    let entry_type = cursor.read_u32::<BigEndian>()?;
    let entry_size = cursor.read_u32::<BigEndian>()?;
    if entry_type != TOC_ENTRY_TYPE || entry_size != TOC_ENTRY_SIZE {
        return Err(Error::UnsupportedTocShape {
            entry_type,
            entry_size,
        });
    }
    let count = cursor.read_u32::<BigEndian>()?;
    for _ in 0..count {
        let id = cursor.read_u32::<BigEndian>()?;
        let offset = cursor.read_u64::<BigEndian>()?;
        let mut chunk_type = [0u8; 4];
        cursor.read_exact(&mut chunk_type)?;
        ctx.toc.insert(id, (offset, chunk_type));
    }
    tracing::debug!(entries = ctx.toc.len(), "read 3DMF table of contents");
    Ok(())
}

/// Parse exactly one chunk at `offset`, returning the offset just past it.
fn parse_chunk(data: &[u8], offset: usize, depth: u32, ctx: &mut ParseContext) -> Result<usize> {
    let mut cursor = Cursor::new(data);
    cursor.seek(SeekFrom::Start(offset as u64))?;
    let mut tag = [0u8; 4];
    cursor.read_exact(&mut tag)?;
    let size = cursor.read_u32::<BigEndian>()? as usize;
    let body = offset + 8;
    let next = body + size;
    if next > data.len() {
        return Err(truncated("chunk body past end of buffer"));
    }

    match ChunkTag::from_bytes(tag) {
        ChunkTag::Container => {
            // A top-level container opens a fresh mesh group.
            if depth == 1 {
                ctx.groups.push(Vec::new());
            }
            ctx.current_mesh = None;
            let mut child = body;
            while child < next {
                child = parse_chunk(data, child, depth + 1, ctx)?;
            }
            Ok(next)
        }
        ChunkTag::BeginGroup => {
            if depth == 1 {
                ctx.groups.push(Vec::new());
            }
            ctx.current_mesh = None;
            // The group-start object's own body is opaque; children run
            // as siblings until the matching end-group chunk.
            let mut child = next;
            loop {
                let (child_tag, child_size) = peek_chunk(data, child)?;
                if ChunkTag::from_bytes(child_tag) == ChunkTag::EndGroup {
                    return Ok(child + 8 + child_size);
                }
                child = parse_chunk(data, child, depth + 1, ctx)?;
            }
        }
        // A stray end-group outside a begin-group scan: nothing to close.
        ChunkTag::EndGroup => Ok(next),
        ChunkTag::TriMesh => {
            parse_trimesh(&mut cursor, ctx)?;
            Ok(next)
        }
        ChunkTag::AttributeArray => {
            parse_attribute_array(&mut cursor, ctx)?;
            Ok(next)
        }
        ChunkTag::AttributeSet => {
            // Attribute set: a container of colour chunks.
            let mut child = body;
            while child < next {
                child = parse_chunk(data, child, depth + 1, ctx)?;
            }
            Ok(next)
        }
        ChunkTag::TextureShader => {
            let key = offset as u64;
            let handle = match ctx.textures_by_offset.get(&key) {
                Some(&handle) => handle,
                None => {
                    let handle = ctx.textures.alloc(Texture::empty());
                    ctx.textures_by_offset.insert(key, handle);
                    tracing::debug!(offset, "new 3DMF texture");
                    handle
                }
            };
            ctx.current_texture = Some(handle);
            if let Some(mesh) = ctx.current_mesh_mut() {
                mesh.texture = Some(handle);
            }
            // The shader's pixel payload and wrap chunks nest inside.
            let mut child = body;
            while child < next {
                child = parse_chunk(data, child, depth + 1, ctx)?;
            }
            Ok(next)
        }
        ChunkTag::Mipmap => {
            parse_pixel_payload(&mut cursor, ctx, false)?;
            Ok(next)
        }
        ChunkTag::Pixmap => {
            parse_pixel_payload(&mut cursor, ctx, true)?;
            Ok(next)
        }
        ChunkTag::ShaderData => {
            parse_shader_data(&mut cursor, ctx)?;
            Ok(next)
        }
        ChunkTag::DiffuseColor => {
            let r = cursor.read_f32::<BigEndian>()?;
            let g = cursor.read_f32::<BigEndian>()?;
            let b = cursor.read_f32::<BigEndian>()?;
            let mesh = ctx.require_mesh()?;
            mesh.colour[0] = r;
            mesh.colour[1] = g;
            mesh.colour[2] = b;
            Ok(next)
        }
        ChunkTag::TransparencyColor => {
            let r = cursor.read_f32::<BigEndian>()?;
            let g = cursor.read_f32::<BigEndian>()?;
            let b = cursor.read_f32::<BigEndian>()?;
            // The games only author uniform transparency; anything else
            // would mean the format carries data this parser discards.
            if r != g || g != b {
                return Err(Error::UnequalTransparencyComponents([r, g, b]));
            }
            let mesh = ctx.require_mesh()?;
            mesh.colour = [r, r, r, r];
            Ok(next)
        }
        ChunkTag::Reference => {
            let id = cursor.read_u32::<BigEndian>()?;
            let (target, _) = *ctx.toc.get(&id).ok_or(Error::UnknownTocReference(id))?;
            // Jump, parse one chunk, and resume past our own body; the
            // return value of the jump is deliberately dropped.
            parse_chunk(data, target as usize, depth, ctx)?;
            Ok(next)
        }
        // The TOC was consumed before the walk began.
        ChunkTag::Toc => Ok(next),
        ChunkTag::Unknown(_) => Ok(next),
    }
}

/// Tag and size of the chunk at `offset`, without consuming it.
fn peek_chunk(data: &[u8], offset: usize) -> Result<([u8; 4], usize)> {
    let header = data
        .get(offset..offset + 8)
        .ok_or_else(|| truncated("chunk header past end of buffer"))?;
    let tag = [header[0], header[1], header[2], header[3]];
    let size = u32::from_be_bytes([header[4], header[5], header[6], header[7]]) as usize;
    Ok((tag, size))
}

/// Triangle mesh chunk: counts, indices (width by vertex count), then
/// vertex positions. Trailing bounding-box bytes are skipped; the box is
/// recomputed from the positions.
fn parse_trimesh(cursor: &mut Cursor<&[u8]>, ctx: &mut ParseContext) -> Result<()> {
    if ctx.current_mesh.is_some() {
        return Err(Error::NestedTriMesh);
    }

    let num_triangles = cursor.read_u32::<BigEndian>()?;
    let _num_triangle_attributes = cursor.read_u32::<BigEndian>()?;
    let num_edges = cursor.read_u32::<BigEndian>()?;
    let num_edge_attributes = cursor.read_u32::<BigEndian>()?;
    if num_edges != 0 || num_edge_attributes != 0 {
        return Err(Error::TriMeshEdgesUnsupported {
            edges: num_edges,
            edge_attributes: num_edge_attributes,
        });
    }
    let num_vertices = cursor.read_u32::<BigEndian>()?;
    let _num_vertex_attributes = cursor.read_u32::<BigEndian>()?;

    let mut indices = IndexData::for_vertex_count(num_vertices as usize);
    // Widened so a hostile triangle count cannot overflow the multiply.
    for _ in 0..u64::from(num_triangles) * 3 {
        let index = if num_vertices <= 0xFF {
            u32::from(cursor.read_u8()?)
        } else if num_vertices <= 0xFFFF {
            u32::from(cursor.read_u16::<BigEndian>()?)
        } else {
            cursor.read_u32::<BigEndian>()?
        };
        if index >= num_vertices {
            return Err(Error::TriangleIndexOutOfRange {
                index,
                vertex_count: num_vertices,
            });
        }
        indices.push(index);
    }

    let mut positions = Vec::with_capacity(num_vertices as usize * 3);
    let mut mesh = Mesh::new(VertexData::F32(Vec::new()), indices);
    for _ in 0..num_vertices {
        let x = cursor.read_f32::<BigEndian>()?;
        let y = cursor.read_f32::<BigEndian>()?;
        let z = cursor.read_f32::<BigEndian>()?;
        mesh.bounding_box.add_point(Vec3::new(x, y, z));
        positions.extend_from_slice(&[x, y, z]);
    }
    mesh.vertices = VertexData::F32(positions);

    if ctx.groups.is_empty() {
        ctx.groups.push(Vec::new());
    }
    let group = ctx.groups.len() - 1;
    ctx.groups[group].push(mesh);
    ctx.current_mesh = Some((group, ctx.groups[group].len() - 1));
    Ok(())
}

/// Attribute array chunk: face or vertex attributes for the current mesh.
fn parse_attribute_array(cursor: &mut Cursor<&[u8]>, ctx: &mut ParseContext) -> Result<()> {
    let attr_type = cursor.read_i32::<BigEndian>()?;
    let _reserved = cursor.read_u32::<BigEndian>()?;
    let position_of_array = cursor.read_u32::<BigEndian>()?;
    let position_in_array = cursor.read_u32::<BigEndian>()?;
    let _use_array_flag = cursor.read_u32::<BigEndian>()?;

    // Counts come from the mesh the array attaches to.
    let (triangle_count, vertex_count) = {
        let mesh = ctx.require_mesh()?;
        (mesh.triangle_count(), mesh.vertex_count())
    };

    match position_of_array {
        attribute_position::FACES => match attr_type {
            // Per-triangle normals are not modelled; skip the data.
            attribute_type::NORMAL => {
                cursor.seek(SeekFrom::Current(triangle_count as i64 * 12))?;
                Ok(())
            }
            other => Err(Error::UnsupportedAttributeType(other)),
        },
        attribute_position::VERTICES => match attr_type {
            attribute_type::SURFACE_UV | attribute_type::SHADING_UV => {
                let mut uvs = Vec::with_capacity(vertex_count * 2);
                for _ in 0..vertex_count {
                    let u = cursor.read_f32::<BigEndian>()?;
                    let v = cursor.read_f32::<BigEndian>()?;
                    uvs.push(u);
                    uvs.push(1.0 - v); // flip V for top-left origin sampling
                }
                let mesh = ctx.require_mesh()?;
                if !mesh.uvs.is_empty() {
                    return Err(Error::AttributeAlreadySet("UV"));
                }
                mesh.uvs = uvs;
                Ok(())
            }
            attribute_type::NORMAL => {
                if position_in_array != 0 {
                    return Err(Error::MisplacedNormalAttribute(position_in_array));
                }
                let mut normals = Vec::with_capacity(vertex_count * 3);
                for _ in 0..vertex_count * 3 {
                    normals.push(cursor.read_f32::<BigEndian>()?);
                }
                let mesh = ctx.require_mesh()?;
                if !mesh.normals.is_empty() {
                    return Err(Error::AttributeAlreadySet("normal"));
                }
                mesh.normals = normals;
                Ok(())
            }
            attribute_type::DIFFUSE_COLOR => {
                let mut colours = Vec::with_capacity(vertex_count * 3);
                for _ in 0..vertex_count * 3 {
                    colours.push(cursor.read_f32::<BigEndian>()?);
                }
                let mesh = ctx.require_mesh()?;
                if !mesh.vertex_colours.is_empty() {
                    return Err(Error::AttributeAlreadySet("diffuse colour"));
                }
                mesh.vertex_colours = colours;
                Ok(())
            }
            other => Err(Error::UnsupportedAttributeType(other)),
        },
        other => Err(Error::UnsupportedAttributePosition(other)),
    }
}

/// Shader data chunk: per-axis texture wrap modes.
fn parse_shader_data(cursor: &mut Cursor<&[u8]>, ctx: &mut ParseContext) -> Result<()> {
    let wrap_u = cursor.read_u32::<BigEndian>()?;
    let wrap_v = cursor.read_u32::<BigEndian>()?;
    let map = |value: u32| match value {
        WRAP_REPEAT => Ok(WrapMode::Repeat),
        WRAP_CLAMP => Ok(WrapMode::Clamp),
        other => Err(Error::UnknownWrapMode(other)),
    };
    let (wrap_u, wrap_v) = (map(wrap_u)?, map(wrap_v)?);
    if let Some(handle) = ctx.current_texture {
        let texture = ctx.textures.get_mut(handle);
        texture.wrap_u = wrap_u;
        texture.wrap_v = wrap_v;
    }
    Ok(())
}

/// Mipmap/pixmap pixel payload for the current texture. Later visits to
/// an already-populated texture skip the bytes.
fn parse_pixel_payload(
    cursor: &mut Cursor<&[u8]>,
    ctx: &mut ParseContext,
    is_pixmap: bool,
) -> Result<()> {
    let Some(handle) = ctx.current_texture else {
        // Pixel payload outside a texture shader: nothing owns it.
        return Ok(());
    };
    if ctx.textures.get(handle).has_pixels() {
        return Ok(());
    }

    let (pixel_type, bit_order, byte_order, width, height, row_bytes);
    if is_pixmap {
        width = cursor.read_u32::<BigEndian>()?;
        height = cursor.read_u32::<BigEndian>()?;
        row_bytes = cursor.read_u32::<BigEndian>()?;
        let _pixel_size = cursor.read_u32::<BigEndian>()?;
        pixel_type = cursor.read_u32::<BigEndian>()?;
        bit_order = cursor.read_u32::<BigEndian>()?;
        byte_order = cursor.read_u32::<BigEndian>()?;
    } else {
        let use_mipmapping = cursor.read_u32::<BigEndian>()?;
        if use_mipmapping != 0 {
            return Err(Error::UnsupportedTextureEncoding("mipmapped texture"));
        }
        pixel_type = cursor.read_u32::<BigEndian>()?;
        bit_order = cursor.read_u32::<BigEndian>()?;
        byte_order = cursor.read_u32::<BigEndian>()?;
        width = cursor.read_u32::<BigEndian>()?;
        height = cursor.read_u32::<BigEndian>()?;
        row_bytes = cursor.read_u32::<BigEndian>()?;
        let _offset = cursor.read_u32::<BigEndian>()?;
    }

    if bit_order != ORDER_BIG_ENDIAN || byte_order != ORDER_BIG_ENDIAN {
        return Err(Error::UnsupportedTextureEncoding("little-endian pixel data"));
    }
    let has_alpha = match pixel_type {
        PIXEL_TYPE_RGB16 => false,
        PIXEL_TYPE_ARGB16 => true,
        other => return Err(Error::UnsupportedTexturePixelType(other)),
    };

    let mut raw = vec![0u8; row_bytes as usize * height as usize];
    cursor.read_exact(&mut raw)?;
    let tight = trim_row_padding(&raw, width as usize, height as usize, row_bytes as usize);

    // 1-5-5-5 big-endian source texels to 5-5-5-1; forced-opaque
    // textures get the alpha bit set regardless of the stored bit.
    let mut texels: Vec<u16> = tight
        .chunks_exact(2)
        .map(|pair| swizzle_1555_to_5551(u16::from_be_bytes([pair[0], pair[1]]), has_alpha))
        .collect();
    if has_alpha {
        pad_transparent_edges(&mut texels, width as usize, height as usize);
    }

    let texture = ctx.textures.get_mut(handle);
    texture.width = width;
    texture.height = height;
    texture.layer_count = 1;
    texture.pixel_format = PixelFormat::Rgba5551;
    texture.alpha_kind = if has_alpha {
        AlphaKind::OneBit
    } else {
        AlphaKind::Opaque
    };
    texture.pixels = texels
        .iter()
        .flat_map(|texel| texel.to_be_bytes())
        .collect();
    tracing::debug!(width, height, has_alpha, "read 3DMF texture pixels");
    Ok(())
}

fn truncated(what: &str) -> Error {
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::UnexpectedEof,
        what.to_string(),
    ))
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Synthetic metafile builders.

    /// One chunk: tag, big-endian size, body.
    pub fn chunk(tag: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(8 + body.len());
        out.extend_from_slice(tag);
        out.extend_from_slice(&(body.len() as u32).to_be_bytes());
        out.extend_from_slice(body);
        out
    }

    /// File header (24 bytes) for version 1.5, Normal mode.
    pub fn file_header(toc_offset: u64) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"3DMF");
        out.extend_from_slice(&16u32.to_be_bytes());
        out.extend_from_slice(&1u16.to_be_bytes());
        out.extend_from_slice(&5u16.to_be_bytes());
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(&toc_offset.to_be_bytes());
        out
    }

    /// Triangle mesh body: unit-quad style mesh with the given triangles
    /// and float positions.
    pub fn trimesh_body(triangles: &[[u16; 3]], positions: &[[f32; 3]]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&(triangles.len() as u32).to_be_bytes());
        body.extend_from_slice(&0u32.to_be_bytes()); // triangle attributes
        body.extend_from_slice(&0u32.to_be_bytes()); // edges
        body.extend_from_slice(&0u32.to_be_bytes()); // edge attributes
        body.extend_from_slice(&(positions.len() as u32).to_be_bytes());
        body.extend_from_slice(&0u32.to_be_bytes()); // vertex attributes
        for tri in triangles {
            for &index in tri {
                if positions.len() <= 0xFF {
                    body.push(index as u8);
                } else {
                    body.extend_from_slice(&index.to_be_bytes());
                }
            }
        }
        for pos in positions {
            for &c in pos {
                body.extend_from_slice(&c.to_be_bytes());
            }
        }
        body
    }

    /// Vertex attribute array body.
    pub fn attribute_body(attr_type: i32, position_of_array: u32, data: &[f32]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&attr_type.to_be_bytes());
        body.extend_from_slice(&0u32.to_be_bytes());
        body.extend_from_slice(&position_of_array.to_be_bytes());
        body.extend_from_slice(&0u32.to_be_bytes());
        body.extend_from_slice(&0u32.to_be_bytes());
        for &value in data {
            body.extend_from_slice(&value.to_be_bytes());
        }
        body
    }

    /// Mipmap body holding 1-5-5-5 big-endian texels.
    pub fn mipmap_body(pixel_type: u32, width: u32, height: u32, texels: &[u16]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&0u32.to_be_bytes()); // no mipmapping
        body.extend_from_slice(&pixel_type.to_be_bytes());
        body.extend_from_slice(&0u32.to_be_bytes()); // bit order big
        body.extend_from_slice(&0u32.to_be_bytes()); // byte order big
        body.extend_from_slice(&width.to_be_bytes());
        body.extend_from_slice(&height.to_be_bytes());
        body.extend_from_slice(&(width * 2).to_be_bytes()); // tight rows
        body.extend_from_slice(&0u32.to_be_bytes()); // offset
        for &texel in texels {
            body.extend_from_slice(&texel.to_be_bytes());
        }
        body
    }

    /// Table of contents chunk for `(id, offset)` pairs.
    pub fn toc_chunk(entries: &[(u32, u64)]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&1u32.to_be_bytes()); // entry type
        body.extend_from_slice(&16u32.to_be_bytes()); // entry size
        body.extend_from_slice(&(entries.len() as u32).to_be_bytes());
        for &(id, offset) in entries {
            body.extend_from_slice(&id.to_be_bytes());
            body.extend_from_slice(&offset.to_be_bytes());
            body.extend_from_slice(b"txsu");
        }
        chunk(b"toc ", &body)
    }
}
