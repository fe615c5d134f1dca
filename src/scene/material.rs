//! Materials assigned to scene nodes.
//!
//! The assembler picks a [`Material`] per node by name; `upload` turns it
//! into a bind group for the one scene pipeline. Every material binds a
//! texture slot — untextured kinds bind a 1x1 white texture so no second
//! pipeline layout is needed.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::assets::{DecodedImage, VideoSource};
use crate::scene::texture::Texture;

/// The map behind a matcap material: a static baked texture or a live clip.
#[derive(Clone, Debug)]
pub enum MatcapMap {
    Static(Arc<DecodedImage>),
    Video(Rc<RefCell<VideoSource>>),
}

/// Material assigned to a node. Nodes start as `Whiteout` and the assembler
/// swaps specific ones in place.
#[derive(Clone, Debug)]
pub enum Material {
    /// Flat white, the default for every unmatched node.
    Whiteout,
    /// Unlit textured surface.
    Matcap { map: MatcapMap },
    /// Self-illuminated surface for the neon part.
    Emissive { color: [f32; 3], emissive: [f32; 3] },
}

impl Material {
    pub fn neon() -> Self {
        // 0xAD85B0 body with a near-white glow.
        Self::Emissive {
            color: [0.678, 0.522, 0.690],
            emissive: [0.941, 0.941, 0.941],
        }
    }

    pub fn is_whiteout(&self) -> bool {
        matches!(self, Self::Whiteout)
    }

    pub fn has_video_map(&self) -> bool {
        matches!(
            self,
            Self::Matcap {
                map: MatcapMap::Video(_)
            }
        )
    }

    fn uniform(&self) -> MaterialUniform {
        match self {
            Self::Whiteout => MaterialUniform {
                base_color: [1.0, 1.0, 1.0, 1.0],
                emissive: [0.0; 4],
                params: [0.0; 4],
            },
            Self::Matcap { .. } => MaterialUniform {
                base_color: [1.0, 1.0, 1.0, 1.0],
                emissive: [0.0; 4],
                params: [1.0, 0.0, 0.0, 0.0],
            },
            Self::Emissive { color, emissive } => MaterialUniform {
                base_color: [color[0], color[1], color[2], 1.0],
                emissive: [emissive[0], emissive[1], emissive[2], 0.0],
                params: [0.0; 4],
            },
        }
    }
}

/// Per-material uniform block. `params.x` toggles texture sampling.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
    pub emissive: [f32; 4],
    pub params: [f32; 4],
}

/// GPU half of a material: the bind group, plus the clip texture when the
/// map is a video (the scene re-uploads frames into it as playback runs).
#[derive(Debug)]
pub struct GpuMaterial {
    pub bind_group: wgpu::BindGroup,
    pub video_texture: Option<Texture>,
}

pub fn material_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
        label: Some("material_bind_group_layout"),
    })
}

impl GpuMaterial {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        material: &Material,
        label: &str,
    ) -> Self {
        let texture = match material {
            Material::Matcap {
                map: MatcapMap::Static(image),
            } => Texture::from_decoded(device, queue, image, label),
            Material::Matcap {
                map: MatcapMap::Video(source),
            } => Texture::for_video(device, queue, source.borrow().current_frame(), label),
            Material::Whiteout | Material::Emissive { .. } => Texture::white(device, queue),
        };

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Material Uniform Buffer"),
            contents: bytemuck::cast_slice(&[material.uniform()]),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
            label: Some(label),
        });

        // Keep the clip texture around for per-frame writes; the bind group
        // itself keeps static textures alive.
        let video_texture = material.has_video_map().then_some(texture);

        Self {
            bind_group,
            video_texture,
        }
    }
}
