//! glTF model payloads.
//!
//! A loaded model is kept as the parsed document plus resolved buffer data.
//! Building the CPU scene-node tree out of it needs no GPU access; vertex and
//! index buffers are created later in the scene's upload pass.

use std::io::{BufReader, Cursor};

use anyhow::{Context as _, Result};

use crate::{
    animation::{AnimationClip, Keyframes},
    assets::load_binary,
    scene::node::{MeshData, SceneNode, Vertex},
    scene::transform::Transform,
};

/// A parsed glTF document with its binary buffers resolved.
pub struct ModelDocument {
    gltf: gltf::Gltf,
    buffers: Vec<Vec<u8>>,
}

impl ModelDocument {
    /// Parse a `.glb`/`.gltf` byte blob. External buffer URIs are fetched
    /// relative to the asset base, which is why this is async.
    pub async fn decode(bytes: Vec<u8>, label: &str) -> Result<Self> {
        let reader = BufReader::new(Cursor::new(bytes));
        let gltf = gltf::Gltf::from_reader(reader)
            .with_context(|| format!("failed to parse glTF `{label}`"))?;

        let mut buffers = Vec::new();
        for buffer in gltf.buffers() {
            match buffer.source() {
                gltf::buffer::Source::Bin => {
                    if let Some(blob) = gltf.blob.as_deref() {
                        buffers.push(blob.into());
                    }
                }
                gltf::buffer::Source::Uri(uri) => {
                    let bin = load_binary(uri).await?;
                    buffers.push(bin);
                }
            }
        }

        Ok(Self { gltf, buffers })
    }

    /// Build the CPU scene-node tree for every root node of every scene.
    ///
    /// Nodes without a name get an empty name and simply never match a
    /// material lookup.
    pub fn to_scene_root(&self) -> SceneNode {
        let mut root = SceneNode::container("model_root");
        for scene in self.gltf.scenes() {
            for node in scene.nodes() {
                root.children.push(self.to_scene_node(node));
            }
        }
        root
    }

    fn to_scene_node(&self, node: gltf::scene::Node) -> SceneNode {
        let name = node.name().unwrap_or("").to_string();
        let mesh = node.mesh().and_then(|mesh| self.read_mesh(&name, mesh));

        let decomposed = node.transform().decomposed();
        let transform = Transform {
            position: decomposed.0.into(),
            rotation: decomposed.1.into(),
            scale: decomposed.2.into(),
        };

        let mut scene_node = SceneNode::new(name, transform, mesh);
        for child in node.children() {
            scene_node.children.push(self.to_scene_node(child));
        }
        scene_node
    }

    fn read_mesh(&self, node_name: &str, mesh: gltf::Mesh) -> Option<MeshData> {
        let mut vertices = Vec::new();
        let mut indices: Vec<u32> = Vec::new();

        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| {
                self.buffers.get(buffer.index()).map(|data| data.as_slice())
            });
            let base = vertices.len() as u32;

            if let Some(positions) = reader.read_positions() {
                positions.for_each(|position| {
                    vertices.push(Vertex {
                        position,
                        tex_coords: Default::default(),
                        normal: Default::default(),
                    })
                });
            }
            if let Some(normals) = reader.read_normals() {
                let mut normal_index = base as usize;
                normals.for_each(|normal| {
                    if let Some(vertex) = vertices.get_mut(normal_index) {
                        vertex.normal = normal;
                    }
                    normal_index += 1;
                });
            }
            if let Some(tex_coords) = reader.read_tex_coords(0).map(|v| v.into_f32()) {
                let mut tex_coord_index = base as usize;
                tex_coords.for_each(|tex_coord| {
                    if let Some(vertex) = vertices.get_mut(tex_coord_index) {
                        vertex.tex_coords = tex_coord;
                    }
                    tex_coord_index += 1;
                });
            }
            if let Some(indices_raw) = reader.read_indices() {
                indices.extend(indices_raw.into_u32().map(|index| index + base));
            }
        }

        if vertices.is_empty() {
            return None;
        }
        Some(MeshData {
            name: node_name.to_string(),
            vertices,
            indices,
        })
    }

    /// Extract the model's animation clips.
    ///
    /// The shipped room has none and no mixer is created for it, but the
    /// mixer registry accepts clips from any model that carries them.
    pub fn animation_clips(&self) -> Vec<AnimationClip> {
        let mut clips = Vec::new();
        for animation in self.gltf.animations() {
            let clip_name = animation.name().unwrap_or("Default").to_string();
            for channel in animation.channels() {
                let reader = channel.reader(|buffer| {
                    self.buffers.get(buffer.index()).map(|data| data.as_slice())
                });
                let timestamps: Vec<f32> = match reader.read_inputs() {
                    Some(gltf::accessor::Iter::Standard(times)) => times.collect(),
                    _ => Vec::new(),
                };
                let keyframes = match reader.read_outputs() {
                    Some(gltf::animation::util::ReadOutputs::Translations(translations)) => {
                        Keyframes::Translation(translations.map(Into::into).collect())
                    }
                    Some(gltf::animation::util::ReadOutputs::Rotations(rotations)) => {
                        Keyframes::Rotation(rotations.into_f32().map(Into::into).collect())
                    }
                    Some(gltf::animation::util::ReadOutputs::Scales(scales)) => {
                        Keyframes::Scale(scales.map(Into::into).collect())
                    }
                    _ => Keyframes::Other,
                };
                let target = channel
                    .target()
                    .node()
                    .name()
                    .unwrap_or("")
                    .to_string();
                clips.push(AnimationClip {
                    name: clip_name.clone(),
                    target,
                    keyframes,
                    timestamps,
                });
            }
        }
        clips
    }
}

impl std::fmt::Debug for ModelDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelDocument")
            .field("buffers", &self.buffers.len())
            .finish()
    }
}
