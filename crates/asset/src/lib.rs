//! Asset loading/parsers (meshes, materials, textures).
//! OBJ/MTL text becomes a [`mesh::Mesh`] with one index list per material;
//! images become RGBA8 [`texture::TextureData`] flipped for bottom-left UVs.

pub mod error;
pub mod mesh;
pub mod model;
pub mod mtl;
pub mod obj;
pub mod texture;

pub use error::{AssetError, AssetResult};
pub use mesh::{Material, MaterialGroup, Mesh, VertexStream};
pub use model::ModelAsset;
pub use texture::TextureData;
