//! Bugdom terrain files
//!
//! Bugdom levels live in the resource fork of a `.ter.rsrc` file:
//!
//! * `Hedr` 1000: `{version: u32, num_items: u32, width: u32,
//!   height: u32, tile_size: u32, min_y: f32, max_y: f32}`
//! * `Layr` 1000: tile grid, `width * height` big-endian u16
//! * `Layr` 1001: heightmap, `(width + 1) * (height + 1)` u8 corners
//! * `Itms` 1000: 12-byte item records
//! * `Atrb` 1000: per-tile-kind attribute records

use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt};

use super::nanosaur::TILE_ID_MASK;
use super::{ParsedTerrain, TerrainItem};
use crate::error::{Error, Result};
use crate::formats::resource_fork::ResourceFork;

const HEDR: [u8; 4] = *b"Hedr";
const LAYR: [u8; 4] = *b"Layr";
const ITMS: [u8; 4] = *b"Itms";
const ATRB: [u8; 4] = *b"Atrb";

/// Collision and surface flags for one tile kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileAttribute {
    pub bits: u16,
    pub parm: [u8; 2],
}

/// A parsed Bugdom level: the terrain grids plus the per-tile
/// attribute table and the vertical range from the header.
#[derive(Debug, Clone)]
pub struct BugdomTerrain {
    pub terrain: ParsedTerrain,
    pub tile_size: u32,
    pub min_y: f32,
    pub max_y: f32,
    pub tile_attributes: Vec<TileAttribute>,
}

/// Parse a Bugdom terrain resource fork (AppleDouble or AppleSingle
/// wrapped).
pub fn parse_terrain(data: &[u8]) -> Result<BugdomTerrain> {
    let fork = ResourceFork::parse(data)?;

    let mut header = Cursor::new(fork.get(data, HEDR, 1000)?);
    let _version = header.read_u32::<BigEndian>()?;
    let num_items = header.read_u32::<BigEndian>()? as usize;
    let width = header.read_u32::<BigEndian>()?;
    let height = header.read_u32::<BigEndian>()?;
    let tile_size = header.read_u32::<BigEndian>()?;
    let min_y = header.read_f32::<BigEndian>()?;
    let max_y = header.read_f32::<BigEndian>()?;

    let quads = width as usize * height as usize;
    let tile_layer = fork.get(data, LAYR, 1000)?;
    if tile_layer.len() != quads * 2 {
        return Err(Error::TileGridSizeMismatch {
            expected: quads,
            actual: tile_layer.len() / 2,
        });
    }
    let mut cursor = Cursor::new(tile_layer);
    let mut tile_ids = Vec::with_capacity(quads);
    for _ in 0..quads {
        tile_ids.push(cursor.read_u16::<BigEndian>()? & TILE_ID_MASK);
    }

    let corners = (width as usize + 1) * (height as usize + 1);
    let heightmap = fork.get(data, LAYR, 1001)?;
    if heightmap.len() != corners {
        return Err(Error::HeightmapSizeMismatch {
            expected: corners,
            actual: heightmap.len(),
        });
    }

    let mut items = Vec::with_capacity(num_items);
    let mut cursor = Cursor::new(fork.get(data, ITMS, 1000)?);
    for _ in 0..num_items {
        let x = u32::from(cursor.read_u16::<BigEndian>()?);
        let z = u32::from(cursor.read_u16::<BigEndian>()?);
        let kind = cursor.read_u16::<BigEndian>()?;
        let mut parm = [0u8; 4];
        for slot in &mut parm {
            *slot = cursor.read_u8()?;
        }
        let flags = cursor.read_u16::<BigEndian>()?;
        items.push(TerrainItem {
            x,
            z,
            kind,
            parm,
            flags,
        });
    }

    let attribute_data = fork.get(data, ATRB, 1000)?;
    let mut cursor = Cursor::new(attribute_data);
    let mut tile_attributes = Vec::with_capacity(attribute_data.len() / 4);
    for _ in 0..attribute_data.len() / 4 {
        let bits = cursor.read_u16::<BigEndian>()?;
        let mut parm = [0u8; 2];
        for slot in &mut parm {
            *slot = cursor.read_u8()?;
        }
        tile_attributes.push(TileAttribute { bits, parm });
    }

    tracing::debug!(width, height, items = items.len(), "parsed Bugdom terrain");
    Ok(BugdomTerrain {
        terrain: ParsedTerrain {
            width,
            height,
            tile_ids,
            heightmap: heightmap.to_vec(),
            items,
        },
        tile_size,
        min_y,
        max_y,
        tile_attributes,
    })
}
