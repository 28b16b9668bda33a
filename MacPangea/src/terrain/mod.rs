//! Terrain support: heightmap mesh reconstruction and the game-specific
//! terrain file formats that feed it.
//!
//! The mesh builder turns a `(width+1) x (height+1)` heightmap plus a
//! per-quad tile grid into a watertight triangle mesh whose diagonal
//! splits follow the terrain relief, with per-vertex tile ids kept
//! consistent across ambiguous splits by re-tagging or duplicating
//! boundary vertices.

pub mod builder;
pub mod bugdom;
pub mod info;
pub mod nanosaur;

pub use builder::build_terrain;
pub use info::TerrainInfo;

use crate::error::{Error, Result};
use crate::mesh::Mesh;

/// One placed object from a terrain item list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerrainItem {
    /// Grid-space X coordinate.
    pub x: u32,
    /// Grid-space Z coordinate.
    pub z: u32,
    /// Object type id (indexes the caller's spawn table).
    pub kind: u16,
    /// Free-form per-type parameters.
    pub parm: [u8; 4],
    /// Item flags.
    pub flags: u16,
}

/// A parsed terrain ready for mesh reconstruction: quad dimensions, the
/// per-quad tile grid, the per-corner heightmap, and the object
/// placement list.
#[derive(Debug, Clone)]
pub struct ParsedTerrain {
    /// Quads along X.
    pub width: u32,
    /// Quads along Z.
    pub height: u32,
    /// One tile id per quad, row-major, `width * height` entries.
    pub tile_ids: Vec<u16>,
    /// Corner height samples, `(width + 1) * (height + 1)` entries.
    pub heightmap: Vec<u8>,
    /// Placed objects.
    pub items: Vec<TerrainItem>,
}

impl ParsedTerrain {
    /// Validate the grid/heightmap sizes against the declared dimensions.
    pub fn validate(&self) -> Result<()> {
        let quads = self.width as usize * self.height as usize;
        if self.tile_ids.len() != quads {
            return Err(Error::TileGridSizeMismatch {
                expected: quads,
                actual: self.tile_ids.len(),
            });
        }
        let corners = (self.width as usize + 1) * (self.height as usize + 1);
        if self.heightmap.len() != corners {
            return Err(Error::HeightmapSizeMismatch {
                expected: corners,
                actual: self.heightmap.len(),
            });
        }
        Ok(())
    }

    /// Reconstruct the terrain mesh.
    pub fn build_mesh(
        &self,
        polygon_world_size: f32,
        height_scale: f32,
        has_ceiling: bool,
    ) -> Result<Mesh> {
        self.validate()?;
        build_terrain(
            &self.heightmap,
            &self.tile_ids,
            self.width,
            self.height,
            polygon_world_size,
            height_scale,
            has_ceiling,
        )
    }

    /// Height-query helper over the same grid, sharing the mesh
    /// builder's diagonal-split decision.
    pub fn info(&self, polygon_world_size: f32, height_scale: f32) -> Result<TerrainInfo> {
        self.validate()?;
        TerrainInfo::new(
            self.width,
            self.height,
            polygon_world_size,
            height_scale,
            self.heightmap.clone(),
        )
    }
}
