//! Terrain height queries
//!
//! Barycentric height sampling over the reconstructed terrain grid, for
//! placing objects on the ground. The per-quad diagonal decision is the
//! same function the mesh builder uses; if the two ever disagreed, a
//! sampled height could sit above or below the rendered triangle.

use super::builder::quad_is_flipped;
use crate::error::{Error, Result};

/// Read-only height-query surface over a dense heightmap grid.
#[derive(Debug, Clone)]
pub struct TerrainInfo {
    /// Quads along X.
    pub width: u32,
    /// Quads along Z.
    pub height: u32,
    /// Reciprocal of the world size of one quad.
    pub xz_scale_inverse: f32,
    /// World height per heightmap unit.
    pub y_scale: f32,
    /// Corner samples, `(width + 1) * (height + 1)` entries.
    pub heightmap: Vec<u8>,
}

impl TerrainInfo {
    /// Wrap a heightmap for querying. `polygon_world_size` is the world
    /// extent of one quad. The grid must be at least one quad in each
    /// direction.
    pub fn new(
        width: u32,
        height: u32,
        polygon_world_size: f32,
        y_scale: f32,
        heightmap: Vec<u8>,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::EmptyTerrainGrid { width, height });
        }
        Ok(Self {
            width,
            height,
            xz_scale_inverse: 1.0 / polygon_world_size,
            y_scale,
            heightmap,
        })
    }

    fn sample(&self, row: u32, col: u32) -> f32 {
        let stride = self.width as usize + 1;
        f32::from(self.heightmap[row as usize * stride + col as usize])
    }

    /// World-space terrain height under world coordinates `(x, z)`.
    /// Coordinates outside the grid clamp to the border quads.
    #[must_use]
    pub fn get_height_at(&self, x: f32, z: f32) -> f32 {
        let gx = (x * self.xz_scale_inverse).max(0.0);
        let gz = (z * self.xz_scale_inverse).max(0.0);
        let col = (gx as u32).min(self.width - 1);
        let row = (gz as u32).min(self.height - 1);
        let fx = (gx - col as f32).clamp(0.0, 1.0);
        let fz = (gz - row as f32).clamp(0.0, 1.0);

        let h1 = self.sample(row, col); // top-left
        let h2 = self.sample(row, col + 1); // top-right
        let h3 = self.sample(row + 1, col + 1); // bottom-right
        let h4 = self.sample(row + 1, col); // bottom-left

        let raw = if quad_is_flipped(&self.heightmap, self.width, self.height, row, col) {
            // Split along top-right / bottom-left: the diagonal is
            // fx + fz = 1.
            if fx + fz <= 1.0 {
                h1 + fx * (h2 - h1) + fz * (h4 - h1)
            } else {
                h3 + (1.0 - fx) * (h4 - h3) + (1.0 - fz) * (h2 - h3)
            }
        } else {
            // Split along top-left / bottom-right: the diagonal is
            // fx = fz.
            if fx >= fz {
                h1 + fx * (h2 - h1) + fz * (h3 - h2)
            } else {
                h1 + fz * (h4 - h1) + fx * (h3 - h4)
            }
        };
        raw * self.y_scale
    }
}
