//! Filename-keyed asset caching.
//!
//! The engine never parses asset files. An [`AssetLoader`] turns a name into
//! an asset and an [`AssetCache`] makes sure each name is loaded at most
//! once, handing out shared [`Rc`] handles afterwards. A failed load is
//! returned as an [`AssetError`] and nothing is cached, so callers keep an
//! empty handle and may retry later.

use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use lumen_ecs::draw::AssetId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    #[error("asset not found: {0:?}")]
    NotFound(String),

    #[error("failed to load asset {name:?}: {reason}")]
    Load { name: String, reason: String },
}

/// Produces assets of type `T` from names.
pub trait AssetLoader<T> {
    fn load(&mut self, name: &str) -> Result<T, AssetError>;
}

// ---------------------------------------------------------------------------
// AssetCache
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AssetCache<T> {
    assets: HashMap<String, Rc<T>>,
}

impl<T> Default for AssetCache<T> {
    fn default() -> Self {
        Self {
            assets: HashMap::new(),
        }
    }
}

impl<T> AssetCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached asset for `name`, loading it through `loader` on first
    /// use.
    pub fn get_or_load(
        &mut self,
        name: &str,
        loader: &mut dyn AssetLoader<T>,
    ) -> Result<Rc<T>, AssetError> {
        if let Some(asset) = self.assets.get(name) {
            return Ok(Rc::clone(asset));
        }
        match loader.load(name) {
            Ok(asset) => {
                tracing::debug!(asset = name, "loaded asset");
                Ok(self.insert(name, asset))
            }
            Err(err) => {
                tracing::warn!(asset = name, error = %err, "asset load failed");
                Err(err)
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Rc<T>> {
        self.assets.get(name).cloned()
    }

    /// Cache an already-loaded asset, replacing any previous one.
    pub fn insert(&mut self, name: &str, asset: T) -> Rc<T> {
        let asset = Rc::new(asset);
        self.assets.insert(name.to_owned(), Rc::clone(&asset));
        asset
    }

    pub fn contains(&self, name: &str) -> bool {
        self.assets.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Drop every cached handle. Assets still referenced elsewhere stay
    /// alive until those handles go.
    pub fn clear(&mut self) {
        self.assets.clear();
    }
}

// ---------------------------------------------------------------------------
// Textures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Texture {
    pub id: AssetId,
    pub name: String,
    pub width: u32,
    pub height: u32,
}

/// A texture loader backed by a table of known names and sizes, for
/// headless runs where nothing is uploaded to a GPU.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticTextureLoader {
    sizes: HashMap<String, (u32, u32)>,
    next_id: u64,
    loads: usize,
}

impl StaticTextureLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_texture(mut self, name: impl Into<String>, width: u32, height: u32) -> Self {
        self.sizes.insert(name.into(), (width, height));
        self
    }

    /// How many loads succeeded.
    pub fn loads(&self) -> usize {
        self.loads
    }
}

impl AssetLoader<Texture> for StaticTextureLoader {
    fn load(&mut self, name: &str) -> Result<Texture, AssetError> {
        let &(width, height) = self
            .sizes
            .get(name)
            .ok_or_else(|| AssetError::NotFound(name.to_owned()))?;
        if width == 0 || height == 0 {
            return Err(AssetError::Load {
                name: name.to_owned(),
                reason: format!("degenerate size {width}x{height}"),
            });
        }
        self.next_id += 1;
        self.loads += 1;
        Ok(Texture {
            id: AssetId(self.next_id),
            name: name.to_owned(),
            width,
            height,
        })
    }
}
