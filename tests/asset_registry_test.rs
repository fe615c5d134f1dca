use std::fs;
use std::path::PathBuf;

use futures::executor::block_on;
use neonroom::assets::{AssetEntry, AssetKind, AssetTable};

fn fixture_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("neonroom-registry-{test}"));
    fs::create_dir_all(&dir).expect("failed to create fixture dir");
    dir
}

fn write_png(path: &PathBuf) {
    let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255]));
    img.save(path).expect("failed to write png fixture");
}

fn write_gltf(path: &PathBuf) {
    let json = r#"{
        "asset": {"version": "2.0"},
        "scene": 0,
        "scenes": [{"nodes": [0]}],
        "nodes": [{"name": "room"}]
    }"#;
    fs::write(path, json).expect("failed to write gltf fixture");
}

#[test]
fn should_dispatch_loader_by_extension() {
    assert_eq!(AssetKind::from_path("images/bake.png"), Some(AssetKind::Texture));
    assert_eq!(AssetKind::from_path("images/photo.JPG"), Some(AssetKind::Texture));
    assert_eq!(AssetKind::from_path("a/b/room.glb"), Some(AssetKind::Model));
    assert_eq!(AssetKind::from_path("room.gltf"), Some(AssetKind::Model));
    assert_eq!(AssetKind::from_path("clip.webm"), Some(AssetKind::Video));
    assert_eq!(AssetKind::from_path("clip.mp4"), Some(AssetKind::Video));
    assert_eq!(AssetKind::from_path("clip.gif"), Some(AssetKind::Video));
    assert_eq!(AssetKind::from_path("sky.hdr"), Some(AssetKind::Environment));
    assert_eq!(AssetKind::from_path("notes.txt"), None);
    assert_eq!(AssetKind::from_path("no_extension"), None);
}

#[test]
fn should_load_every_supported_entry() {
    let dir = fixture_dir("load-all");
    let png = dir.join("bake.png");
    let gltf = dir.join("room.gltf");
    write_png(&png);
    write_gltf(&gltf);

    let mut table = AssetTable::new();
    table
        .insert("bake", AssetEntry::new(png.to_str().unwrap()).srgb())
        .insert("room", AssetEntry::new(gltf.to_str().unwrap()));

    block_on(table.load_all()).expect("bulk load failed");

    assert_eq!(table.len(), 2);
    let bake = table.get("bake").unwrap();
    assert!(bake.is_loaded());
    let texture = bake.texture().expect("bake should carry a texture payload");
    assert_eq!(texture.width(), 2);
    assert!(texture.srgb);

    let room = table.get("room").unwrap();
    assert!(room.is_loaded());
    assert!(room.model().is_some());
}

#[test]
fn should_skip_unsupported_extensions_but_still_resolve() {
    let dir = fixture_dir("skip");
    let png = dir.join("bake.png");
    write_png(&png);
    let notes = dir.join("notes.txt");
    fs::write(&notes, "not an asset").unwrap();

    let mut table = AssetTable::new();
    table
        .insert("bake", AssetEntry::new(png.to_str().unwrap()))
        .insert("notes", AssetEntry::new(notes.to_str().unwrap()));

    block_on(table.load_all()).expect("skipped entries must not fail the load");

    assert!(table.get("bake").unwrap().is_loaded());
    assert!(!table.get("notes").unwrap().is_loaded());
    assert_eq!(table.get("notes").unwrap().kind(), None);
}

#[test]
fn should_fail_whole_load_on_one_bad_entry() {
    let dir = fixture_dir("fail");
    let png = dir.join("bake.png");
    write_png(&png);
    let broken = dir.join("broken.png");
    fs::write(&broken, b"definitely not a png").unwrap();

    let mut table = AssetTable::new();
    table
        .insert("bake", AssetEntry::new(png.to_str().unwrap()))
        .insert("broken", AssetEntry::new(broken.to_str().unwrap()));

    let result = block_on(table.load_all());
    assert!(result.is_err());
    // No partial result: nothing is attached when any entry fails.
    assert!(!table.get("bake").unwrap().is_loaded());
    assert!(!table.get("broken").unwrap().is_loaded());
}

#[test]
fn should_fail_on_missing_file() {
    let mut table = AssetTable::new();
    table.insert("gone", AssetEntry::new("/nonexistent/nowhere.png"));

    let err = block_on(table.load_all()).unwrap_err();
    assert!(err.to_string().contains("nowhere.png"));
}
