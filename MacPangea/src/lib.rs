#![allow(non_snake_case)]
//! # MacPangea
//!
//! A pure-Rust library for working with classic Pangea Software game
//! assets (Nanosaur, Bugdom).
//!
//! ## Supported Formats
//!
//! - **3DMF** - QuickDraw 3D metafiles: meshes, attributes, textures
//! - **Resource forks** - AppleDouble/AppleSingle wrapped resource maps
//! - **Skeletons** - Bone trees and keyframed animations
//! - **Terrain** - Heightmap levels (`.ter` files and Bugdom resources)
//! - **TGA** - Targa images, including RLE and colour-mapped variants
//!
//! ## Quick Start
//!
//! ### Loading a 3DMF model
//!
//! ```no_run
//! use macpangea::formats::three_dmf;
//!
//! let data = std::fs::read("Models/Dinos.3dmf")?;
//! let scene = three_dmf::parse(&data)?;
//! println!("{} groups, {} textures", scene.groups.len(), scene.textures.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ### Building a terrain mesh
//!
//! ```no_run
//! use macpangea::terrain::nanosaur;
//!
//! let data = std::fs::read("Terrain/Level1.ter")?;
//! let terrain = nanosaur::parse_terrain(&data)?;
//! let mesh = terrain.build_mesh(140.0, 4.0, false)?;
//! let info = terrain.info(140.0, 4.0)?;
//! let height = info.get_height_at(350.0, 820.0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod formats;
pub mod mesh;
pub mod terrain;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, FourCc, Result};
    pub use crate::formats::resource_fork::ResourceFork;
    pub use crate::formats::skeleton::{self, SkeletonDefinition};
    pub use crate::formats::tga;
    pub use crate::formats::three_dmf::{self, MetafileScene};
    pub use crate::mesh::{
        AlphaKind, BoundingBox, IndexData, Mesh, PixelFormat, Texture, TextureArena,
        TextureHandle, VertexData, WrapMode,
    };
    pub use crate::terrain::{
        build_terrain, bugdom, nanosaur, ParsedTerrain, TerrainInfo, TerrainItem,
    };
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
