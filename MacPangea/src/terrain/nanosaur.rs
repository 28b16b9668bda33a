//! Nanosaur terrain files
//!
//! A level ships as a `.ter` terrain file plus a `.trt` tile texture
//! file. Both are big-endian with fixed-offset headers; the layouts
//! below must stay bit-exact with the shipped assets.
//!
//! `.ter` header:
//!
//! | offset | field                   |
//! |--------|-------------------------|
//! | 0x00   | texture layer offset    |
//! | 0x04   | heightmap layer offset  |
//! | 0x08   | path layer offset       |
//! | 0x0C   | object list offset      |
//! | 0x10   | heightmap tile offset   |
//! | 0x14   | width in quads (u16)    |
//! | 0x16   | depth in quads (u16)    |
//!
//! Layers are `width * depth` big-endian u16 grids. The object list is
//! a u32 count followed by 20-byte records.

use std::io::{Cursor, Seek, SeekFrom};

use byteorder::{BigEndian, ReadBytesExt};

use super::{ParsedTerrain, TerrainItem};
use crate::error::{Error, Result};
use crate::formats::three_dmf::swizzle_1555_to_5551;
use crate::mesh::{AlphaKind, PixelFormat, Texture, WrapMode};

/// Edge length of one tile texture in the `.trt` page.
pub const TILE_SIZE: u32 = 32;

/// Low bits of a texture-layer value select the tile image; the high
/// bits carry flip/rotate flags for the renderer.
pub const TILE_ID_MASK: u16 = 0x0FFF;

const OBJECT_RECORD_SIZE: usize = 20;

/// Parse a `.ter` terrain file.
pub fn parse_terrain(data: &[u8]) -> Result<ParsedTerrain> {
    let mut cursor = Cursor::new(data);
    let texture_offset = cursor.read_u32::<BigEndian>()? as usize;
    let heightmap_offset = cursor.read_u32::<BigEndian>()? as usize;
    let _path_offset = cursor.read_u32::<BigEndian>()? as usize;
    let object_offset = cursor.read_u32::<BigEndian>()? as usize;
    let _tile_page_offset = cursor.read_u32::<BigEndian>()? as usize;
    let width = u32::from(cursor.read_u16::<BigEndian>()?);
    let depth = u32::from(cursor.read_u16::<BigEndian>()?);

    let quads = width as usize * depth as usize;
    let layer_len = quads * 2;
    for (layer, offset, needed) in [
        ("texture", texture_offset, layer_len),
        ("heightmap", heightmap_offset, layer_len),
        ("object list", object_offset, 4),
    ] {
        if offset + needed > data.len() {
            return Err(Error::TerrainLayerOutOfBounds {
                layer,
                offset,
                file_size: data.len(),
            });
        }
    }

    // Texture layer: tile id per quad (flags masked off for the grid).
    cursor.seek(SeekFrom::Start(texture_offset as u64))?;
    let mut tile_ids = Vec::with_capacity(quads);
    for _ in 0..quads {
        tile_ids.push(cursor.read_u16::<BigEndian>()? & TILE_ID_MASK);
    }

    // Heightmap layer: one sample per quad's top-left corner; the grid
    // needs (width+1) x (depth+1) corners, so the border row and column
    // repeat their neighbours.
    cursor.seek(SeekFrom::Start(heightmap_offset as u64))?;
    let mut quad_heights = Vec::with_capacity(quads);
    for _ in 0..quads {
        quad_heights.push((cursor.read_u16::<BigEndian>()? & 0xFF) as u8);
    }
    let heightmap = expand_corner_grid(&quad_heights, width as usize, depth as usize);

    cursor.seek(SeekFrom::Start(object_offset as u64))?;
    let count = cursor.read_u32::<BigEndian>()? as usize;
    if object_offset + 4 + count * OBJECT_RECORD_SIZE > data.len() {
        return Err(Error::TerrainLayerOutOfBounds {
            layer: "object list",
            offset: object_offset,
            file_size: data.len(),
        });
    }
    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        let x = cursor.read_u32::<BigEndian>()?;
        let z = cursor.read_u32::<BigEndian>()?;
        let kind = cursor.read_u16::<BigEndian>()?;
        let mut parm = [0u8; 4];
        for slot in &mut parm {
            *slot = cursor.read_u8()?;
        }
        let flags = cursor.read_u16::<BigEndian>()?;
        let _reserved = cursor.read_u32::<BigEndian>()?;
        items.push(TerrainItem {
            x,
            z,
            kind,
            parm,
            flags,
        });
    }

    tracing::debug!(width, depth, items = items.len(), "parsed Nanosaur terrain");
    Ok(ParsedTerrain {
        width,
        height: depth,
        tile_ids,
        heightmap,
        items,
    })
}

/// Parse a `.trt` tile texture page into an array texture, one 32x32
/// tile per layer. Texels are 1-5-5-5 big-endian and fully opaque.
pub fn parse_tile_page(data: &[u8]) -> Result<Texture> {
    let mut cursor = Cursor::new(data);
    let count = cursor.read_u32::<BigEndian>()?;
    let texels_per_tile = (TILE_SIZE * TILE_SIZE) as usize;
    // The declared tile count must fit the buffer before anything is
    // sized from it.
    let max_tiles = data.len().saturating_sub(4) / (texels_per_tile * 2);
    if count as usize > max_tiles {
        return Err(Error::TerrainLayerOutOfBounds {
            layer: "tile page",
            offset: 4,
            file_size: data.len(),
        });
    }
    let mut pixels = Vec::with_capacity(count as usize * texels_per_tile * 2);
    for _ in 0..count as usize * texels_per_tile {
        let texel = cursor.read_u16::<BigEndian>()?;
        pixels.extend_from_slice(&swizzle_1555_to_5551(texel, false).to_be_bytes());
    }
    Ok(Texture {
        width: TILE_SIZE,
        height: TILE_SIZE,
        layer_count: count,
        pixel_format: PixelFormat::Rgba5551,
        alpha_kind: AlphaKind::Opaque,
        wrap_u: WrapMode::Clamp,
        wrap_v: WrapMode::Clamp,
        pixels,
    })
}

/// Expand per-quad top-left samples to the `(w+1) x (h+1)` corner grid
/// by clamping the last row and column.
fn expand_corner_grid(samples: &[u8], w: usize, h: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity((w + 1) * (h + 1));
    for row in 0..=h {
        for col in 0..=w {
            out.push(samples[row.min(h - 1) * w + col.min(w - 1)]);
        }
    }
    out
}
