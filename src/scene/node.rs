//! The scene-node tree.
//!
//! Nodes come out of a loaded model as pure CPU data (mesh, transform,
//! default material). The assembler mutates materials by node-name lookup,
//! then a single upload pass creates every GPU buffer and bind group. Node
//! names are assumed unique within a model; a lookup that matches nothing is
//! a no-op.

use wgpu::util::DeviceExt;

use crate::scene::{
    material::{GpuMaterial, Material},
    transform::Transform,
};

/// Vertex data as stored per mesh.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// CPU mesh data read out of a model file.
#[derive(Clone, Debug)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

/// GPU resources of one drawable node, created in the upload pass.
#[derive(Debug)]
struct GpuNode {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_elements: u32,
    instance_buffer: wgpu::Buffer,
    material: GpuMaterial,
}

/// Everything the upload pass needs from the GPU context.
pub struct UploadCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub material_layout: &'a wgpu::BindGroupLayout,
}

#[derive(Debug)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub mesh: Option<MeshData>,
    pub material: Material,
    pub children: Vec<SceneNode>,
    gpu: Option<GpuNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, transform: Transform, mesh: Option<MeshData>) -> Self {
        Self {
            name: name.into(),
            transform,
            mesh,
            material: Material::Whiteout,
            children: Vec::new(),
            gpu: None,
        }
    }

    /// A meshless grouping node with an identity transform.
    pub fn container(name: impl Into<String>) -> Self {
        Self::new(name, Transform::default(), None)
    }

    /// Depth-first visit of this node and every descendant.
    pub fn traverse_mut(&mut self, visit: &mut dyn FnMut(&mut SceneNode)) {
        visit(self);
        for child in &mut self.children {
            child.traverse_mut(visit);
        }
    }

    /// Find a node by exact name match.
    pub fn find_mut(&mut self, name: &str) -> Option<&mut SceneNode> {
        if self.name == name {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_mut(name))
    }

    pub fn is_uploaded(&self) -> bool {
        self.gpu.is_some()
    }

    /// Create GPU buffers and material bind groups for this subtree.
    ///
    /// World transforms are the parent-child composition; each drawable node
    /// gets a one-element instance buffer with its world matrix.
    pub fn upload(&mut self, parent_world: &Transform, ctx: &UploadCtx) {
        let world = parent_world * &self.transform;

        if let Some(mesh) = &self.mesh {
            let vertex_buffer = ctx
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} Vertex Buffer", mesh.name)),
                    contents: bytemuck::cast_slice(&mesh.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
            let index_buffer = ctx
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} Index Buffer", mesh.name)),
                    contents: bytemuck::cast_slice(&mesh.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
            let instance_buffer = ctx
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} Instance Buffer", mesh.name)),
                    contents: bytemuck::cast_slice(&[world.to_raw()]),
                    usage: wgpu::BufferUsages::VERTEX,
                });
            let material = GpuMaterial::new(
                ctx.device,
                ctx.queue,
                ctx.material_layout,
                &self.material,
                &self.name,
            );
            self.gpu = Some(GpuNode {
                vertex_buffer,
                index_buffer,
                num_elements: mesh.indices.len() as u32,
                instance_buffer,
                material,
            });
        }

        for child in &mut self.children {
            child.upload(&world, ctx);
        }
    }

    pub fn draw<'a, 'b>(&'a self, render_pass: &'b mut wgpu::RenderPass<'a>)
    where
        'a: 'b,
    {
        if let Some(gpu) = &self.gpu {
            render_pass.set_bind_group(0, &gpu.material.bind_group, &[]);
            render_pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
            render_pass.set_vertex_buffer(1, gpu.instance_buffer.slice(..));
            render_pass.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..gpu.num_elements, 0, 0..1);
        }
        for child in &self.children {
            child.draw(render_pass);
        }
    }

    fn write_video_frame(&self, queue: &wgpu::Queue, frame: &image::RgbaImage) {
        if let Some(gpu) = &self.gpu {
            if let Some(texture) = &gpu.material.video_texture {
                texture.write_frame(queue, frame);
            }
        }
        for child in &self.children {
            child.write_video_frame(queue, frame);
        }
    }
}

/// The scene graph root.
#[derive(Debug, Default)]
pub struct Scene {
    pub roots: Vec<SceneNode>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: SceneNode) {
        self.roots.push(node);
    }

    /// Empty the graph. Called on dispose.
    pub fn clear(&mut self) {
        self.roots.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn node_count(&self) -> usize {
        fn count(node: &SceneNode) -> usize {
            1 + node.children.iter().map(count).sum::<usize>()
        }
        self.roots.iter().map(count).sum()
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut SceneNode> {
        self.roots.iter_mut().find_map(|root| root.find_mut(name))
    }

    pub fn traverse_mut(&mut self, visit: &mut dyn FnMut(&mut SceneNode)) {
        for root in &mut self.roots {
            root.traverse_mut(visit);
        }
    }

    pub fn upload(&mut self, ctx: &UploadCtx) {
        let identity = Transform::default();
        for root in &mut self.roots {
            root.upload(&identity, ctx);
        }
    }

    /// Push the clip's current frame into every video-mapped node texture.
    pub fn write_video_frames(&self, queue: &wgpu::Queue, frame: &image::RgbaImage) {
        for root in &self.roots {
            root.write_video_frame(queue, frame);
        }
    }

    pub fn draw<'a, 'b>(&'a self, render_pass: &'b mut wgpu::RenderPass<'a>)
    where
        'a: 'b,
    {
        for root in &self.roots {
            root.draw(render_pass);
        }
    }
}
