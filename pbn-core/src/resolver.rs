//! Cache-then-generate resolution of a picture's region map and vector art.

use std::fmt;

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

use crate::error::{AssetError, GenerateError, LookupError, TransportError};
use crate::region_map::RegionMap;

/// Which picture to show.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ImageRef {
    /// A picture shipped with the app, addressed by base name (`panda`).
    Bundled(String),
    /// An uploaded photo: a storage download URL or an object name.
    Remote(String),
}

impl ImageRef {
    pub fn bundled(name: impl Into<String>) -> Self {
        ImageRef::Bundled(name.into())
    }

    pub fn remote(reference: impl Into<String>) -> Self {
        ImageRef::Remote(reference.into())
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRef::Bundled(name) => f.write_str(name),
            ImageRef::Remote(r) => f.write_str(r),
        }
    }
}

/// Stable identifiers derived from a remote reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetKey {
    /// Object name of the uploaded photo, e.g. `uploads/17-cat.jpg`.
    pub object: String,
    /// Object name without extension; generated assets live next to it.
    pub base: String,
}

impl AssetKey {
    /// Accepts a storage download URL (`.../o/<encoded>?alt=media`), any other
    /// URL (last path segment) or a bare object name.
    pub fn from_reference(reference: &str) -> Self {
        let object = object_name(reference);
        let file_start = object.rfind('/').map_or(0, |i| i + 1);
        let base = match object[file_start..].rfind('.') {
            Some(dot) if dot > 0 => object[..file_start + dot].to_string(),
            _ => object.clone(),
        };
        AssetKey { object, base }
    }

    pub fn with_ext(&self, ext: &str) -> String {
        format!("{}.{}", self.base, ext)
    }
}

fn object_name(reference: &str) -> String {
    let r = reference.trim();
    let strip_query = |s: &str| s.split(['?', '#']).next().unwrap_or(s).to_string();
    let decode = |s: &str| percent_decode_str(s).decode_utf8_lossy().into_owned();
    if let Some((_, rest)) = r.split_once("/o/") {
        return decode(&strip_query(rest));
    }
    if let Some((_, rest)) = r.split_once("://") {
        let path = strip_query(rest);
        let last = path.rsplit('/').next().unwrap_or(path.as_str());
        return decode(last);
    }
    r.to_string()
}

/// Opaque SVG markup with one element per shape id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VectorArt(String);

impl VectorArt {
    pub fn new(markup: impl Into<String>) -> Self {
        VectorArt(markup.into())
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, std::string::FromUtf8Error> {
        String::from_utf8(bytes).map(VectorArt)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// A fully resolved picture.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedAsset {
    pub map: RegionMap,
    pub art: VectorArt,
}

/// Raw contents of a bundled picture.
#[derive(Clone, Debug, Default)]
pub struct RawAsset {
    pub map: Vec<u8>,
    pub art: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Bundled pictures never resolve faster than this, so the loading
    /// indicator does not flicker.
    pub min_display_ms: u32,
    pub map_ext: String,
    pub art_ext: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            min_display_ms: 800,
            map_ext: "json".to_string(),
            art_ext: "svg".to_string(),
        }
    }
}

/// Pictures shipped with the app.
#[allow(async_fn_in_trait)]
pub trait LocalAssets {
    async fn load(&self, name: &str) -> Result<RawAsset, TransportError>;
}

/// The cache of generated assets.
#[allow(async_fn_in_trait)]
pub trait ObjectStore {
    async fn download_url(&self, key: &str) -> Result<String, LookupError>;
    async fn fetch_content(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}

/// The external raster-to-regions service. On success it has written
/// `<base>.json` and `<base>.svg` into the object store.
#[allow(async_fn_in_trait)]
pub trait Generator {
    async fn generate(&self, object: &str) -> Result<(), GenerateError>;
}

#[allow(async_fn_in_trait)]
pub trait Clock {
    fn now_ms(&self) -> f64;
    async fn sleep(&self, ms: u32);
}

struct CachedUrls {
    map: String,
    art: String,
}

pub struct AssetResolver<L, S, G, C> {
    local: L,
    store: S,
    generator: G,
    clock: C,
    config: ResolverConfig,
}

impl<L, S, G, C> AssetResolver<L, S, G, C>
where
    L: LocalAssets,
    S: ObjectStore,
    G: Generator,
    C: Clock,
{
    pub fn new(local: L, store: S, generator: G, clock: C, config: ResolverConfig) -> Self {
        AssetResolver {
            local,
            store,
            generator,
            clock,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn resolve(&self, image: &ImageRef) -> Result<ResolvedAsset, AssetError> {
        match image {
            ImageRef::Bundled(name) => self.resolve_bundled(name).await,
            ImageRef::Remote(reference) => {
                self.resolve_remote(&AssetKey::from_reference(reference))
                    .await
            }
        }
    }

    async fn resolve_bundled(&self, name: &str) -> Result<ResolvedAsset, AssetError> {
        let started = self.clock.now_ms();
        let raw = self
            .local
            .load(name)
            .await
            .map_err(|e| AssetError::fetch(name, e))?;
        let asset = decode(
            &format!("{name}.{}", self.config.map_ext),
            raw.map,
            &format!("{name}.{}", self.config.art_ext),
            raw.art,
        )?;
        let elapsed = (self.clock.now_ms() - started).max(0.0);
        let floor = f64::from(self.config.min_display_ms);
        if elapsed < floor {
            self.clock.sleep((floor - elapsed).ceil() as u32).await;
        }
        log::debug!("loaded bundled picture {name}");
        Ok(asset)
    }

    async fn resolve_remote(&self, key: &AssetKey) -> Result<ResolvedAsset, AssetError> {
        let urls = match self.lookup(key).await? {
            Some(urls) => {
                log::debug!("cache hit for {}", key.base);
                urls
            }
            None => {
                log::info!("no cached picture for {}, generating", key.base);
                self.generator.generate(&key.object).await.map_err(|e| {
                    AssetError::GenerationFailed {
                        object: key.object.clone(),
                        reason: e.to_string(),
                    }
                })?;
                self.lookup(key)
                    .await?
                    .ok_or_else(|| AssetError::GenerationInconsistent {
                        key: key.base.clone(),
                    })?
            }
        };

        let map_key = key.with_ext(&self.config.map_ext);
        let art_key = key.with_ext(&self.config.art_ext);
        let map = self
            .store
            .fetch_content(&urls.map)
            .await
            .map_err(|e| AssetError::fetch(&map_key, e))?;
        let art = self
            .store
            .fetch_content(&urls.art)
            .await
            .map_err(|e| AssetError::fetch(&art_key, e))?;
        let asset = decode(&map_key, map, &art_key, art)?;
        log::info!(
            "resolved {} ({} regions)",
            key.base,
            asset.map.shape_count()
        );
        Ok(asset)
    }

    /// `Ok(None)` when either half of the pair is missing.
    async fn lookup(&self, key: &AssetKey) -> Result<Option<CachedUrls>, AssetError> {
        let map_key = key.with_ext(&self.config.map_ext);
        let art_key = key.with_ext(&self.config.art_ext);
        let map = match self.store.download_url(&map_key).await {
            Ok(url) => url,
            Err(LookupError::NotFound(_)) => return Ok(None),
            Err(LookupError::Transport(e)) => return Err(AssetError::fetch(map_key, e)),
        };
        let art = match self.store.download_url(&art_key).await {
            Ok(url) => url,
            Err(LookupError::NotFound(_)) => return Ok(None),
            Err(LookupError::Transport(e)) => return Err(AssetError::fetch(art_key, e)),
        };
        Ok(Some(CachedUrls { map, art }))
    }
}

fn decode(
    map_name: &str,
    map: Vec<u8>,
    art_name: &str,
    art: Vec<u8>,
) -> Result<ResolvedAsset, AssetError> {
    let map = RegionMap::from_json(&map).map_err(|e| AssetError::fetch(map_name, e))?;
    let art = VectorArt::from_bytes(art).map_err(|e| AssetError::fetch(art_name, e))?;
    Ok(ResolvedAsset { map, art })
}
