//! Builds the render-ready scene out of a loaded asset table.
//!
//! Material choice is driven purely by node names in the model: nodes with
//! a known name get the matching material, everything else stays flat
//! white. Unknown names are not an error, the node simply keeps the
//! default look.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context, Result, bail};
use cgmath::{One, Quaternion, Vector3};

use crate::{
    animation::MixerRegistry,
    assets::{AssetTable, VideoSource},
    scene::{MatcapMap, Material, Scene, Transform},
};

/// Logical asset names the assembler pulls from the table, plus the root
/// placement applied to the model.
#[derive(Clone, Debug)]
pub struct Assembler {
    pub model: String,
    pub video: String,
    pub baked: String,
    pub scale: f32,
    pub offset: Vector3<f32>,
}

impl Default for Assembler {
    fn default() -> Self {
        Self {
            model: "room".into(),
            video: "screen".into(),
            baked: "room_texture".into(),
            scale: 0.05,
            offset: Vector3::new(0.0, -0.05, 0.0),
        }
    }
}

/// The assembled output: the scene graph, the clip driving any screen
/// surfaces, mixers for the model's animations and an ambient tint.
#[derive(Debug)]
pub struct AssembledScene {
    pub scene: Scene,
    pub video: Option<Rc<RefCell<VideoSource>>>,
    pub mixers: MixerRegistry,
    pub ambient: [f32; 3],
}

impl Assembler {
    /// Turn loaded assets into a scene. Fails when the model asset is
    /// missing or not loaded; omitted textures and clips only degrade the
    /// look of the nodes that would have used them.
    pub fn assemble(&self, assets: &AssetTable) -> Result<AssembledScene> {
        let model = assets
            .get(&self.model)
            .with_context(|| format!("asset table has no model entry `{}`", self.model))?;
        let Some(document) = model.model() else {
            bail!("model asset `{}` is not loaded", self.model);
        };

        let video = assets.get(&self.video).and_then(|entry| entry.video());
        let baked = assets.get(&self.baked).and_then(|entry| entry.texture());

        let mut root = document.to_scene_root();
        root.transform = Transform {
            position: self.offset,
            rotation: Quaternion::one(),
            scale: Vector3::new(self.scale, self.scale, self.scale),
        };

        root.traverse_mut(&mut |node| {
            node.material = self.select_material(&node.name, video, baked);
        });

        let mut mixers = MixerRegistry::new();
        let clips = document.animation_clips();
        if !clips.is_empty() {
            mixers.create(&self.model, clips);
        }

        // A single environment map tints the ambient term.
        let environment = assets
            .iter()
            .find_map(|(_, entry)| entry.environment())
            .cloned();
        let ambient = environment
            .as_ref()
            .map(|map| map.average_radiance())
            .unwrap_or([1.0, 1.0, 1.0]);

        let mut scene = Scene::new();
        scene.add(root);

        Ok(AssembledScene {
            scene,
            video: video.cloned(),
            mixers,
            ambient,
        })
    }

    fn select_material(
        &self,
        name: &str,
        video: Option<&Rc<RefCell<VideoSource>>>,
        baked: Option<&std::sync::Arc<crate::assets::DecodedImage>>,
    ) -> Material {
        match name {
            "screen" => {
                if let Some(source) = video {
                    return Material::Matcap {
                        map: MatcapMap::Video(source.clone()),
                    };
                }
                log::warn!("node `{name}` wants the clip but none is loaded");
            }
            "room" | "tube" => {
                if let Some(map) = baked {
                    return Material::Matcap {
                        map: MatcapMap::Static(map.clone()),
                    };
                }
                log::warn!("node `{name}` wants the baked texture but none is loaded");
            }
            "neon" => return Material::neon(),
            _ => {}
        }
        Material::Whiteout
    }
}
