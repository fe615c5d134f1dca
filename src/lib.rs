//! neonroom
//!
//! A small decorative 3D room viewer for native and WASM targets. Assets
//! (a glTF room, a baked lightmap, an animated screen clip) are loaded
//! concurrently into a named table, assembled into a scene with materials
//! chosen by node name, and rendered with a single wgpu pipeline until the
//! window closes.
//!
//! High-level modules
//! - `assets`: the named asset table with extension-dispatched decoding
//! - `assembler`: turns loaded assets into a render-ready scene
//! - `animation`: clips and the named mixer registry
//! - `camera`: orbit camera, projection and uniforms
//! - `context`: central GPU and window context that owns device/queue/pipeline
//! - `pipelines`: the scene render pipeline and its shader
//! - `scene`: the node tree, transforms, materials and textures
//! - `viewer`: the render driver and application event loop
//!

pub mod animation;
pub mod assembler;
pub mod assets;
pub mod camera;
pub mod context;
pub mod pipelines;
pub mod scene;
pub mod viewer;

// Re-exports commonly used types for convenience in downstream code.
pub use assembler::{AssembledScene, Assembler};
pub use assets::{AssetEntry, AssetKind, AssetTable};
pub use viewer::{run, LoopState, ViewerConfig};
pub use cgmath::*;
pub use winit::event::WindowEvent;
