use macpangea::prelude::*;
use pretty_assertions::assert_eq;

/// One metafile chunk: tag, big-endian size, body.
fn chunk(tag: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + body.len());
    out.extend_from_slice(tag);
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(body);
    out
}

fn metafile_header() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"3DMF");
    out.extend_from_slice(&16u32.to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&5u16.to_be_bytes());
    out.extend_from_slice(&0u32.to_be_bytes());
    out.extend_from_slice(&0u64.to_be_bytes()); // no table of contents
    out
}

#[test]
fn test_textured_trimesh_scene() {
    // One triangle with surface UVs and a 1x1 opaque texture.
    let mut trimesh = Vec::new();
    trimesh.extend_from_slice(&1u32.to_be_bytes()); // triangles
    trimesh.extend_from_slice(&0u32.to_be_bytes()); // triangle attributes
    trimesh.extend_from_slice(&0u32.to_be_bytes()); // edges
    trimesh.extend_from_slice(&0u32.to_be_bytes()); // edge attributes
    trimesh.extend_from_slice(&3u32.to_be_bytes()); // vertices
    trimesh.extend_from_slice(&0u32.to_be_bytes()); // vertex attributes
    trimesh.extend_from_slice(&[0, 1, 2]); // byte-wide indices
    for c in [
        0.0f32, 0.0, 0.0, //
        1.0, 0.0, 0.0, //
        0.0, 1.0, 0.0,
    ] {
        trimesh.extend_from_slice(&c.to_be_bytes());
    }

    let mut uvs = Vec::new();
    uvs.extend_from_slice(&1i32.to_be_bytes()); // surface uv
    uvs.extend_from_slice(&0u32.to_be_bytes());
    uvs.extend_from_slice(&2u32.to_be_bytes()); // per vertex
    uvs.extend_from_slice(&0u32.to_be_bytes());
    uvs.extend_from_slice(&0u32.to_be_bytes());
    for c in [0.0f32, 0.0, 1.0, 0.0, 0.0, 1.0] {
        uvs.extend_from_slice(&c.to_be_bytes());
    }

    let mut mipmap = Vec::new();
    mipmap.extend_from_slice(&0u32.to_be_bytes()); // no mipmapping
    mipmap.extend_from_slice(&2u32.to_be_bytes()); // rgb 16-bit
    mipmap.extend_from_slice(&0u32.to_be_bytes()); // bit order big
    mipmap.extend_from_slice(&0u32.to_be_bytes()); // byte order big
    mipmap.extend_from_slice(&1u32.to_be_bytes()); // width
    mipmap.extend_from_slice(&1u32.to_be_bytes()); // height
    mipmap.extend_from_slice(&2u32.to_be_bytes()); // row bytes
    mipmap.extend_from_slice(&0u32.to_be_bytes()); // offset
    mipmap.extend_from_slice(&0x7FFFu16.to_be_bytes());

    let mut container = Vec::new();
    container.extend_from_slice(&chunk(b"tmsh", &trimesh));
    container.extend_from_slice(&chunk(b"atar", &uvs));
    container.extend_from_slice(&chunk(b"txsu", &chunk(b"txmm", &mipmap)));

    let mut data = metafile_header();
    data.extend_from_slice(&chunk(b"cntr", &container));

    let scene = three_dmf::parse(&data).unwrap();
    assert_eq!(scene.groups.len(), 1);
    assert_eq!(scene.groups[0].len(), 1);
    assert_eq!(scene.textures.len(), 1);

    let mesh = &scene.groups[0][0];
    assert_eq!(mesh.triangle_count(), 1);
    // V runs top-down in the file and is flipped on load.
    assert_eq!(mesh.uvs, vec![0.0, 1.0, 1.0, 1.0, 0.0, 0.0]);
    let texture = scene.textures.get(mesh.texture.unwrap());
    assert_eq!((texture.width, texture.height), (1, 1));
    assert_eq!(texture.pixel_format, PixelFormat::Rgba5551);
    assert!(texture.has_pixels());
}

#[test]
fn test_terrain_mesh_and_height_query_agree() {
    // A 2x2 quad grid with one raised corner.
    let heightmap = vec![
        0, 0, 0, //
        0, 0, 0, //
        0, 0, 100,
    ];
    let tile_ids = vec![1, 2, 3, 4];

    let mesh = build_terrain(&heightmap, &tile_ids, 2, 2, 10.0, 2.0, false).unwrap();
    assert_eq!(mesh.triangle_count(), 8);
    mesh.validate().unwrap();

    let info = TerrainInfo::new(2, 2, 10.0, 2.0, heightmap).unwrap();
    // Flat interior, scaled peak at the far corner.
    assert_eq!(info.get_height_at(5.0, 5.0), 0.0);
    assert_eq!(info.get_height_at(20.0, 20.0), 200.0);
}

#[test]
fn test_tga_decode() {
    // 1x1 uncompressed 32-bit image, top-left origin, BGRA on disk.
    let mut data = vec![0u8; 18];
    data[2] = 2; // uncompressed true colour
    data[12] = 1; // width
    data[14] = 1; // height
    data[16] = 32;
    data[17] = 0x28; // top origin, 8 alpha bits
    data.extend_from_slice(&[0x10, 0x20, 0x30, 0x40]);

    let image = tga::decode(&data).unwrap();
    assert_eq!((image.width, image.height), (1, 1));
    assert_eq!(image.pixel_format, PixelFormat::Rgba8888);
    assert_eq!(image.pixels, vec![0x30, 0x20, 0x10, 0x40]);
}
