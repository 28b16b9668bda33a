//! Heightmap terrain mesh reconstruction
//!
//! Each heightmap quad is split into two triangles. The default split
//! runs top-left to bottom-right; a quad flips to the other diagonal
//! when the relief favours it (or when forced on the last row/column so
//! the grid edge stays watertight). Texture tile ids are stored per
//! vertex, so a flipped quad's off-diagonal corners can end up needing a
//! tile id their owning quad disagrees with; those are re-tagged when a
//! flipped same-tile neighbour allows it and duplicated otherwise.

use glam::{Mat4, Vec3};

use crate::error::{Error, Result};
use crate::mesh::{IndexData, Mesh, VertexData};

/// Diagonal-flip decision for the quad at `(row, col)`. Shared verbatim
/// with the height query in [`super::info`]: sampled heights must agree
/// with rendered geometry.
pub(crate) fn quad_is_flipped(
    heightmap: &[u8],
    width: u32,
    height: u32,
    row: u32,
    col: u32,
) -> bool {
    if row == height - 1 || col == width - 1 {
        return true;
    }
    let stride = width as usize + 1;
    let sample = |r: u32, c: u32| i32::from(heightmap[r as usize * stride + c as usize]);
    let h1 = sample(row, col); // top-left
    let h2 = sample(row, col + 1); // top-right
    let h3 = sample(row + 1, col + 1); // bottom-right
    let h4 = sample(row + 1, col); // bottom-left
    let slope = (h1 - h3).abs() - (h2 - h4).abs();
    slope > 0
}

/// Build the terrain mesh.
///
/// `heightmap` holds `(width+1) * (height+1)` corner samples and
/// `tile_ids` one texture tile per quad. Vertex positions stay
/// grid-quantized; world scaling is carried by the mesh's base
/// transform. `has_ceiling` hangs the mesh downward: heights are
/// negated through the transform's Y scale and triangle winding is
/// reversed so the faces point down.
pub fn build_terrain(
    heightmap: &[u8],
    tile_ids: &[u16],
    width: u32,
    height: u32,
    polygon_world_size: f32,
    height_scale: f32,
    has_ceiling: bool,
) -> Result<Mesh> {
    if width == 0 || height == 0 {
        return Err(Error::EmptyTerrainGrid { width, height });
    }
    let w = width as usize;
    let h = height as usize;
    let stride = w + 1;
    let grid_vertices = stride * (h + 1);

    // Grid vertices at integer (col, height, row).
    let mut positions = Vec::with_capacity(grid_vertices * 3);
    for row in 0..=h {
        for col in 0..=w {
            positions.push(col as u16);
            positions.push(u16::from(heightmap[row * stride + col]));
            positions.push(row as u16);
        }
    }

    // Each vertex starts with the tile id of the quad it is the top-left
    // corner of, clamped on the last row/column.
    let mut tiles = Vec::with_capacity(grid_vertices);
    for row in 0..=h {
        for col in 0..=w {
            let quad_row = row.min(h - 1);
            let quad_col = col.min(w - 1);
            tiles.push(tile_ids[quad_row * w + quad_col]);
        }
    }

    let mut normals = Vec::with_capacity(grid_vertices * 3);
    for row in 0..=h {
        for col in 0..=w {
            let normal = vertex_normal(heightmap, w, h, row, col);
            normals.extend_from_slice(&[normal.x, normal.y, normal.z]);
        }
    }

    let vertex_at = |row: usize, col: usize| (row * stride + col) as u32;

    // Two triangles per quad; each quad owns six consecutive indices so
    // the conflict pass can rewire them by quad.
    let mut flipped = vec![false; w * h];
    let mut indices: Vec<u32> = Vec::with_capacity(w * h * 6);
    for row in 0..h {
        for col in 0..w {
            let tl = vertex_at(row, col);
            let tr = vertex_at(row, col + 1);
            let br = vertex_at(row + 1, col + 1);
            let bl = vertex_at(row + 1, col);
            let flip = quad_is_flipped(heightmap, width, height, row as u32, col as u32);
            flipped[row * w + col] = flip;
            if flip {
                // Split along top-right / bottom-left.
                indices.extend_from_slice(&[tl, bl, tr]);
                indices.extend_from_slice(&[tr, bl, br]);
            } else {
                // Default split along top-left / bottom-right.
                indices.extend_from_slice(&[tl, bl, br]);
                indices.extend_from_slice(&[tl, br, tr]);
            }
        }
    }

    // Flipped quads lose the guarantee that every triangle touches the
    // quad's own top-left vertex: the off-diagonal pair (top-right /
    // bottom-left) must carry the quad's tile id. A boundary vertex can
    // adopt the id outright when the neighbouring quad that owns it is
    // itself flipped with the same tile; otherwise the vertex has to be
    // duplicated and the quad's triangles rewired to the copy.
    let mut needs_new_vert: Vec<(usize, u32, u16)> = Vec::new();
    let mut replacements = 0usize;
    for row in 0..h {
        for col in 0..w {
            let quad = row * w + col;
            if !flipped[quad] {
                continue;
            }
            let want = tile_ids[quad];
            let corners = [
                // (corner vertex, neighbour quad sharing it)
                (vertex_at(row, col + 1), (col + 1 < w).then_some(quad + 1)),
                (vertex_at(row + 1, col), (row + 1 < h).then_some(quad + w)),
            ];
            for (vertex, neighbour) in corners {
                if tiles[vertex as usize] == want {
                    continue;
                }
                let absorbable = neighbour
                    .is_some_and(|n| flipped[n] && tile_ids[n] == want);
                if absorbable {
                    tiles[vertex as usize] = want;
                    replacements += 1;
                } else {
                    needs_new_vert.push((quad, vertex, want));
                }
            }
        }
    }

    // Best-effort single pass over the pending set: the body runs once
    // and never re-examines conflicts the duplication itself introduces.
    let mut duplicates = 0usize;
    while !needs_new_vert.is_empty() {
        for &(quad, vertex, want) in &needs_new_vert {
            let v = vertex as usize;
            let new_index = (positions.len() / 3) as u32;
            positions.extend_from_within(v * 3..v * 3 + 3);
            normals.extend_from_within(v * 3..v * 3 + 3);
            tiles.push(want);
            duplicates += 1;
            for slot in &mut indices[quad * 6..quad * 6 + 6] {
                if *slot == vertex {
                    *slot = new_index;
                }
            }
        }
        break;
    }
    if replacements > 0 || duplicates > 0 {
        tracing::debug!(
            replacements,
            duplicates,
            "resolved terrain tile conflicts"
        );
    }

    let vertex_count = positions.len() / 3;
    let mut index_data = IndexData::for_vertex_count(vertex_count);
    for index in indices {
        index_data.push(index);
    }

    let vertices = VertexData::GridU16(positions);
    let mut mesh = Mesh::new(vertices, index_data);
    if has_ceiling {
        reverse_winding(&mut mesh.indices);
    }
    mesh.normals = normals;
    mesh.tilemap_ids = tiles;
    // Positions are unsigned grid coordinates, so a ceiling's negated
    // heights live in the transform's Y scale.
    let y_scale = if has_ceiling {
        -height_scale
    } else {
        height_scale
    };
    mesh.base_transform = Some(Mat4::from_scale(Vec3::new(
        polygon_world_size,
        y_scale,
        polygon_world_size,
    )));
    for i in 0..vertex_count {
        mesh.bounding_box.add_point(mesh.vertices.position(i));
    }
    mesh.validate()?;
    Ok(mesh)
}

/// Per-vertex normal from central differences of the four axis
/// neighbours; neighbours past the grid edge contribute height zero.
fn vertex_normal(heightmap: &[u8], w: usize, h: usize, row: usize, col: usize) -> Vec3 {
    let stride = w + 1;
    let sample = |row: isize, col: isize| -> f32 {
        if row < 0 || col < 0 || row > h as isize || col > w as isize {
            0.0
        } else {
            f32::from(heightmap[row as usize * stride + col as usize])
        }
    };
    let (row, col) = (row as isize, col as isize);
    let dx = sample(row, col - 1) - sample(row, col + 1);
    let dz = sample(row - 1, col) - sample(row + 1, col);
    Vec3::new(dx, 2.0, dz).normalize()
}

/// Swap the last two indices of every triangle.
fn reverse_winding(indices: &mut IndexData) {
    for triangle in 0..indices.len() / 3 {
        let b = indices.get(triangle * 3 + 1);
        let c = indices.get(triangle * 3 + 2);
        indices.set(triangle * 3 + 1, c);
        indices.set(triangle * 3 + 2, b);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    /// Tile ids on the three vertices of triangle `t`.
    fn triangle_tiles(mesh: &Mesh, t: usize) -> [u16; 3] {
        [
            mesh.tilemap_ids[mesh.indices.get(t * 3) as usize],
            mesh.tilemap_ids[mesh.indices.get(t * 3 + 1) as usize],
            mesh.tilemap_ids[mesh.indices.get(t * 3 + 2) as usize],
        ]
    }

    #[test]
    fn test_flat_heightmap_flips_only_forced_quads() {
        let (w, h) = (4u32, 3u32);
        let heightmap = vec![7u8; 5 * 4];
        for row in 0..h {
            for col in 0..w {
                let flip = quad_is_flipped(&heightmap, w, h, row, col);
                let forced = row == h - 1 || col == w - 1;
                assert_eq!(flip, forced, "quad ({row},{col})");
            }
        }
    }

    #[test]
    fn test_flat_heightmap_triangle_count() {
        let (w, h) = (4u32, 3u32);
        let heightmap = vec![0u8; 5 * 4];
        let tiles = vec![1u16; 12];
        let mesh = build_terrain(&heightmap, &tiles, w, h, 10.0, 1.0, false).unwrap();
        assert_eq!(mesh.triangle_count(), (w * h * 2) as usize);
        // Uniform tiles never need duplicates.
        assert_eq!(mesh.vertex_count(), 5 * 4);
    }

    #[test]
    fn test_grid_quantized_positions_and_transform() {
        let heightmap = vec![0, 1, 2, 3];
        let tiles = vec![9u16];
        let mesh = build_terrain(&heightmap, &tiles, 1, 1, 2.5, 0.5, false).unwrap();
        assert!(matches!(mesh.vertices, VertexData::GridU16(_)));
        assert_eq!(mesh.vertices.position(1), Vec3::new(1.0, 1.0, 0.0));
        let transform = mesh.base_transform.unwrap();
        assert_eq!(transform, Mat4::from_scale(Vec3::new(2.5, 0.5, 2.5)));
    }

    #[test]
    fn test_centre_peak_flip_directions() {
        // 2x2 quads, peak in the middle sample.
        let heightmap = vec![0, 0, 0, 0, 10, 0, 0, 0, 0];
        let tiles = vec![1u16, 2, 3, 4];
        let mesh = build_terrain(&heightmap, &tiles, 2, 2, 1.0, 1.0, false).unwrap();
        assert_eq!(mesh.triangle_count(), 8);
        // Quad (0,0): slope = |0-10| - |0-0| > 0, flips on merit.
        assert!(quad_is_flipped(&heightmap, 2, 2, 0, 0));
        // The other three are on the last row/column and force-flip,
        // which matches their slope signs being <= 0 on merit.
        for (row, col) in [(0, 1), (1, 0), (1, 1)] {
            assert!(quad_is_flipped(&heightmap, 2, 2, row, col));
        }
    }

    #[test]
    fn test_duplicate_vertices_keep_triangles_tile_consistent() {
        // Checkerboard tiles on bumpy ground: plenty of flips whose
        // off-diagonal corners belong to differently-tiled neighbours.
        let (w, h) = (3u32, 3u32);
        let heightmap = vec![
            0, 9, 0, 9, //
            9, 0, 9, 0, //
            0, 9, 0, 9, //
            9, 0, 9, 0,
        ];
        let tiles: Vec<u16> = (0..9).map(|i| (i % 2) as u16 + 10).collect();
        let mesh = build_terrain(&heightmap, &tiles, w, h, 1.0, 1.0, false).unwrap();

        assert!(mesh.vertex_count() >= 16);
        assert_eq!(mesh.triangle_count(), 18);
        // Every triangle of every quad must still see its quad's tile id
        // on at least one of its vertices.
        for quad in 0..9 {
            let want = tiles[quad];
            for t in [quad * 2, quad * 2 + 1] {
                assert!(
                    triangle_tiles(&mesh, t).contains(&want),
                    "quad {quad} triangle {t} lost tile {want}"
                );
            }
        }
        // Duplicated vertices sit after all original grid vertices.
        assert!(mesh.vertex_count() > 16);
        for i in 16..mesh.vertex_count() {
            let dup = mesh.vertices.position(i);
            // Every duplicate copies some original grid position.
            let mut found = false;
            for j in 0..16 {
                if mesh.vertices.position(j) == dup {
                    found = true;
                    break;
                }
            }
            assert!(found, "duplicate vertex {i} has no source position");
        }
    }

    #[test]
    fn test_normals_are_unit_length() {
        let heightmap = vec![0, 3, 8, 2, 250, 1, 0, 9, 4];
        let tiles = vec![0u16; 4];
        let mesh = build_terrain(&heightmap, &tiles, 2, 2, 1.0, 1.0, false).unwrap();
        for normal in mesh.normals.chunks_exact(3) {
            let length = Vec3::new(normal[0], normal[1], normal[2]).length();
            assert!((length - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_ceiling_negates_heights_through_transform() {
        let heightmap = vec![10u8; 4];
        let tiles = vec![0u16];
        let ceiling = build_terrain(&heightmap, &tiles, 1, 1, 2.0, 3.0, true).unwrap();
        let transform = ceiling.base_transform.unwrap();
        for i in 0..ceiling.vertex_count() {
            let world = transform.transform_point3(ceiling.vertices.position(i));
            assert_eq!(world.y, -30.0, "vertex {i}");
        }
        // Floors from the same data stay above the origin.
        let floor = build_terrain(&heightmap, &tiles, 1, 1, 2.0, 3.0, false).unwrap();
        let transform = floor.base_transform.unwrap();
        assert_eq!(transform.transform_point3(floor.vertices.position(0)).y, 30.0);
    }

    #[test]
    fn test_zero_extent_grid_rejected() {
        assert!(matches!(
            build_terrain(&[0, 0], &[], 0, 1, 1.0, 1.0, false),
            Err(Error::EmptyTerrainGrid {
                width: 0,
                height: 1,
            })
        ));
    }

    #[test]
    fn test_ceiling_reverses_winding() {
        let heightmap = vec![0u8; 4];
        let tiles = vec![0u16];
        let floor = build_terrain(&heightmap, &tiles, 1, 1, 1.0, 1.0, false).unwrap();
        let ceiling = build_terrain(&heightmap, &tiles, 1, 1, 1.0, 1.0, true).unwrap();
        for t in 0..floor.triangle_count() {
            assert_eq!(floor.indices.get(t * 3), ceiling.indices.get(t * 3));
            assert_eq!(floor.indices.get(t * 3 + 1), ceiling.indices.get(t * 3 + 2));
            assert_eq!(floor.indices.get(t * 3 + 2), ceiling.indices.get(t * 3 + 1));
        }
    }
}
