pub mod material;
pub mod node;
pub mod texture;
pub mod transform;

pub use material::{material_bind_group_layout, Material, MatcapMap, MaterialUniform};
pub use node::{MeshData, Scene, SceneNode, UploadCtx, Vertex};
pub use texture::Texture;
pub use transform::{Transform, TransformRaw};
