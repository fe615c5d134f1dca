use neonroom::{
    assembler::Assembler,
    assets::{AssetEntry, AssetTable},
    viewer::{self, ViewerConfig},
};

fn main() -> anyhow::Result<()> {
    let mut assets = AssetTable::new();
    assets
        .insert("image", AssetEntry::new("images/unsplash.jpg").srgb())
        .insert("screen", AssetEntry::new("videos/square_glitch.gif"))
        .insert("room", AssetEntry::new("models/room.glb"))
        .insert("room_texture", AssetEntry::new("images/bake.png").srgb());

    viewer::run(ViewerConfig {
        assets,
        assembler: Assembler::default(),
        // #001122, converted to linear
        background: wgpu::Color {
            r: 0.0,
            g: 0.0056,
            b: 0.016,
            a: 1.0,
        },
        on_resize: None,
    })
}
