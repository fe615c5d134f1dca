use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use futures::executor::block_on;
use image::codecs::gif::GifEncoder;
use image::{Delay, Frame, Rgba, RgbaImage};
use neonroom::assembler::Assembler;
use neonroom::assets::{
    AssetEntry, AssetPayload, AssetTable, DecodedImage, ModelDocument, VideoSource,
};
use neonroom::scene::{MatcapMap, Material};

/// An unmeshed room model with the node names material assignment keys on.
const ROOM_GLTF: &str = r#"{
    "asset": {"version": "2.0"},
    "scene": 0,
    "scenes": [{"nodes": [0, 1, 4]}],
    "nodes": [
        {"name": "room", "children": [2, 3]},
        {"name": "screen"},
        {"name": "tube"},
        {"name": "neon"},
        {"name": "chair"}
    ]
}"#;

fn room_document() -> ModelDocument {
    block_on(ModelDocument::decode(ROOM_GLTF.as_bytes().to_vec(), "room.gltf")).unwrap()
}

fn one_frame_gif() -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut bytes);
        let image = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 255, 255]));
        encoder
            .encode_frame(Frame::from_parts(
                image,
                0,
                0,
                Delay::from_numer_denom_ms(100, 1),
            ))
            .unwrap();
    }
    bytes
}

fn loaded_table(with_video: bool, with_bake: bool) -> AssetTable {
    let mut table = AssetTable::new();

    let mut model = AssetEntry::new("models/room.gltf");
    model.payload = Some(AssetPayload::Model(room_document()));
    table.insert("room", model);

    if with_video {
        let clip = VideoSource::decode(&one_frame_gif(), "clip.gif").unwrap();
        let mut entry = AssetEntry::new("videos/clip.gif");
        entry.payload = Some(AssetPayload::Video(Rc::new(RefCell::new(clip))));
        table.insert("screen", entry);
    }

    if with_bake {
        let bake = DecodedImage::from_rgba(
            RgbaImage::from_pixel(2, 2, Rgba([200, 180, 160, 255])),
            true,
        );
        let mut entry = AssetEntry::new("images/bake.png");
        entry.payload = Some(AssetPayload::Texture(Arc::new(bake)));
        table.insert("room_texture", entry);
    }

    table
}

#[test]
fn should_assign_materials_by_node_name() {
    let table = loaded_table(true, true);
    let assembled = Assembler::default().assemble(&table).unwrap();
    let mut scene = assembled.scene;

    let screen = scene.find_mut("screen").unwrap();
    assert!(matches!(
        screen.material,
        Material::Matcap {
            map: MatcapMap::Video(_)
        }
    ));

    let room = scene.find_mut("room").unwrap();
    assert!(matches!(
        room.material,
        Material::Matcap {
            map: MatcapMap::Static(_)
        }
    ));
    let tube = scene.find_mut("tube").unwrap();
    assert!(matches!(
        tube.material,
        Material::Matcap {
            map: MatcapMap::Static(_)
        }
    ));

    let neon = scene.find_mut("neon").unwrap();
    assert!(matches!(neon.material, Material::Emissive { .. }));

    // Unmatched names keep the flat white default.
    let chair = scene.find_mut("chair").unwrap();
    assert!(chair.material.is_whiteout());

    assert!(assembled.video.is_some());
    assert!(assembled.mixers.is_empty());
}

#[test]
fn should_place_and_scale_the_model_root() {
    let table = loaded_table(false, false);
    let mut scene = Assembler::default().assemble(&table).unwrap().scene;

    let root = scene.find_mut("model_root").unwrap();
    assert_eq!(root.transform.scale, cgmath::Vector3::new(0.05, 0.05, 0.05));
    assert_eq!(
        root.transform.position,
        cgmath::Vector3::new(0.0, -0.05, 0.0)
    );
    assert_eq!(scene.node_count(), 6);
}

#[test]
fn should_degrade_to_whiteout_when_maps_are_missing() {
    let table = loaded_table(false, false);
    let mut scene = Assembler::default().assemble(&table).unwrap().scene;

    // Every node falls back to the default without the clip and bake.
    assert!(scene.find_mut("screen").unwrap().material.is_whiteout());
    assert!(scene.find_mut("room").unwrap().material.is_whiteout());
    assert!(scene.find_mut("tube").unwrap().material.is_whiteout());
    // The emissive neon needs no asset.
    assert!(matches!(
        scene.find_mut("neon").unwrap().material,
        Material::Emissive { .. }
    ));
}

#[test]
fn should_fail_without_the_model_asset() {
    let table = AssetTable::new();
    let err = Assembler::default().assemble(&table).unwrap_err();
    assert!(err.to_string().contains("room"));
}

#[test]
fn should_fail_when_the_model_is_not_loaded() {
    let mut table = AssetTable::new();
    table.insert("room", AssetEntry::new("models/room.glb"));

    let err = Assembler::default().assemble(&table).unwrap_err();
    assert!(err.to_string().contains("not loaded"));
}

#[test]
fn should_use_unit_ambient_without_an_environment_map() {
    let table = loaded_table(false, false);
    let assembled = Assembler::default().assemble(&table).unwrap();
    assert_eq!(assembled.ambient, [1.0, 1.0, 1.0]);
}
