//! Declarative asset registry.
//!
//! Assets are declared up front as a table of logical name → path (plus load
//! flags). [`AssetTable::load_all`] fetches and decodes every entry
//! concurrently and resolves once all payloads are attached; scene assembly
//! must not start before that. The loader is picked purely by file
//! extension:
//!
//! - `jpg`/`jpeg`/`png`/`webp` → static color texture
//! - `glb`/`gltf` → model
//! - `webm`/`mp4`/`gif` → looping video clip
//! - `hdr` → equirectangular environment map
//!
//! Entries with any other extension are skipped with a warning and keep an
//! empty payload; the bulk load still resolves.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{Context as _, Result};

pub mod image;
pub mod model;
pub mod video;

pub use image::{DecodedImage, EnvironmentMap};
pub use model::ModelDocument;
pub use video::VideoSource;

/// Which loader an entry's file extension selects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetKind {
    Texture,
    Model,
    Video,
    Environment,
}

impl AssetKind {
    /// Infer the loader from a path's extension. `None` means unsupported.
    pub fn from_path(path: &str) -> Option<Self> {
        let extension = path.rsplit('.').next()?.to_ascii_lowercase();
        match extension.as_str() {
            "jpg" | "jpeg" | "png" | "webp" => Some(Self::Texture),
            "glb" | "gltf" => Some(Self::Model),
            "webm" | "mp4" | "gif" => Some(Self::Video),
            "hdr" => Some(Self::Environment),
            _ => None,
        }
    }
}

/// A loaded asset payload, attached to its entry in place.
#[derive(Debug)]
pub enum AssetPayload {
    Texture(Arc<DecodedImage>),
    Video(Rc<RefCell<VideoSource>>),
    Model(ModelDocument),
    Environment(Arc<EnvironmentMap>),
}

/// One row of the asset table: a path, load flags, and the payload once
/// loading completed. Entries live for the lifetime of the table.
#[derive(Debug)]
pub struct AssetEntry {
    pub path: String,
    pub srgb: bool,
    pub flip_y: bool,
    pub payload: Option<AssetPayload>,
}

impl AssetEntry {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            srgb: false,
            flip_y: false,
            payload: None,
        }
    }

    /// Decode as sRGB color data instead of linear.
    pub fn srgb(mut self) -> Self {
        self.srgb = true;
        self
    }

    /// Flip the image vertically on decode.
    pub fn flipped(mut self) -> Self {
        self.flip_y = true;
        self
    }

    pub fn kind(&self) -> Option<AssetKind> {
        AssetKind::from_path(&self.path)
    }

    pub fn is_loaded(&self) -> bool {
        self.payload.is_some()
    }

    pub fn texture(&self) -> Option<&Arc<DecodedImage>> {
        match &self.payload {
            Some(AssetPayload::Texture(image)) => Some(image),
            _ => None,
        }
    }

    pub fn video(&self) -> Option<&Rc<RefCell<VideoSource>>> {
        match &self.payload {
            Some(AssetPayload::Video(source)) => Some(source),
            _ => None,
        }
    }

    pub fn model(&self) -> Option<&ModelDocument> {
        match &self.payload {
            Some(AssetPayload::Model(document)) => Some(document),
            _ => None,
        }
    }

    pub fn environment(&self) -> Option<&Arc<EnvironmentMap>> {
        match &self.payload {
            Some(AssetPayload::Environment(map)) => Some(map),
            _ => None,
        }
    }
}

/// Logical name → entry. The table is built once at startup and mutated in
/// place as loads complete.
#[derive(Debug, Default)]
pub struct AssetTable {
    entries: HashMap<String, AssetEntry>,
}

impl AssetTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: AssetEntry) -> &mut Self {
        self.entries.insert(name.into(), entry);
        self
    }

    pub fn get(&self, name: &str) -> Option<&AssetEntry> {
        self.entries.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut AssetEntry> {
        self.entries.get_mut(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AssetEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fetch and decode every entry concurrently.
    ///
    /// Resolves only once all supported entries carry a payload. Any single
    /// fetch or decode failure fails the whole call with no partial result
    /// and no retry. Unsupported extensions are skipped with a warning.
    pub async fn load_all(&mut self) -> Result<()> {
        let mut pending = Vec::new();
        for (name, entry) in self.entries.iter() {
            match entry.kind() {
                Some(kind) => pending.push(load_entry(
                    name.clone(),
                    entry.path.clone(),
                    entry.srgb,
                    entry.flip_y,
                    kind,
                )),
                None => log::warn!(
                    "asset `{name}` has an unsupported extension (`{}`), skipping",
                    entry.path
                ),
            }
        }

        let loaded = futures::future::try_join_all(pending).await?;
        for (name, payload) in loaded {
            if let Some(entry) = self.entries.get_mut(&name) {
                entry.payload = Some(payload);
            }
        }
        Ok(())
    }
}

async fn load_entry(
    name: String,
    path: String,
    srgb: bool,
    flip_y: bool,
    kind: AssetKind,
) -> Result<(String, AssetPayload)> {
    let bytes = load_binary(&path).await?;
    let payload = match kind {
        AssetKind::Texture => {
            AssetPayload::Texture(Arc::new(DecodedImage::decode(&bytes, srgb, flip_y, &path)?))
        }
        AssetKind::Video => {
            AssetPayload::Video(Rc::new(RefCell::new(VideoSource::decode(&bytes, &path)?)))
        }
        AssetKind::Model => AssetPayload::Model(ModelDocument::decode(bytes, &path).await?),
        AssetKind::Environment => {
            AssetPayload::Environment(Arc::new(EnvironmentMap::decode(&bytes, &path)?))
        }
    };
    log::debug!("loaded asset `{name}` from `{path}`");
    Ok((name, payload))
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> reqwest::Url {
    let window = web_sys::window().unwrap();
    let location = window.location();
    let origin = location.origin().unwrap();
    let base = reqwest::Url::parse(&format!("{}/assets/", origin)).unwrap();
    base.join(file_name).unwrap()
}

/// Resolve a logical asset path and read its bytes.
///
/// Native reads relative to the `assets/` directory (overridable through
/// `NEONROOM_ASSET_ROOT`); absolute paths are used as-is. On wasm32 the file
/// is fetched over HTTP relative to the page origin.
pub async fn load_binary(file_name: &str) -> Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name);
        reqwest::get(url).await?.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let root = std::env::var("NEONROOM_ASSET_ROOT")
            .map(std::path::PathBuf::from)
            .unwrap_or_else(|_| std::path::PathBuf::from("assets"));
        let path = root.join(file_name);
        std::fs::read(&path).with_context(|| format!("failed to read asset {}", path.display()))?
    };

    Ok(data)
}
