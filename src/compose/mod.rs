//! Document composers.
//!
//! A composer turns records into a finished [`Document`](crate::canvas::Document).
//! Everything that can fail (token resolution, image decoding, layout
//! validation) happens here, so a composed document always serializes.

pub mod card;
pub mod roster;

pub use card::{Arrangement, CardComposer, CardPlacement};
pub use roster::{Column, ColumnLayout, RosterComposer, RosterField};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::canvas::ImageResource;
use crate::config::RenderConfig;
use crate::error::{Error, Result};
use crate::layout::Banner;

/// How a card document obtains the student's token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TokenPolicy {
    /// Encode the token from the record's current fields. A cached token
    /// that no longer matches is logged and replaced.
    #[default]
    EncodeIfMissing,
    /// Use the cached token only; a record without one is rejected.
    CachedOnly,
}

/// Resolves photo references to decoded images.
pub trait AssetSource {
    /// Load the asset behind `reference`.
    ///
    /// Missing assets are reported as [`Error::AssetUnavailable`].
    fn load(&self, reference: &str) -> Result<ImageResource>;
}

/// Assets stored under a directory, addressed by root-relative references
/// such as `/uploads/1700000000-.png`.
#[derive(Debug, Clone)]
pub struct FsAssets {
    root: PathBuf,
}

impl FsAssets {
    /// Serve assets from `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Filesystem path of a reference. Parent-directory components are dropped.
    pub fn resolve(&self, reference: &str) -> PathBuf {
        let relative: PathBuf = Path::new(reference.trim_start_matches('/'))
            .components()
            .filter(|c| matches!(c, std::path::Component::Normal(_)))
            .collect();
        self.root.join(relative)
    }
}

impl AssetSource for FsAssets {
    fn load(&self, reference: &str) -> Result<ImageResource> {
        ImageResource::from_file(self.resolve(reference))
    }
}

/// Asset source with nothing in it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAssets;

impl AssetSource for NoAssets {
    fn load(&self, reference: &str) -> Result<ImageResource> {
        Err(Error::AssetUnavailable(reference.to_string()))
    }
}

/// Per-request inputs shared by the composers.
pub struct RenderContext<'a> {
    config: &'a RenderConfig,
    assets: &'a dyn AssetSource,
    timestamp: String,
    logo: Option<ImageResource>,
}

impl<'a> RenderContext<'a> {
    /// Build a context, fixing the footer timestamp and loading the logo.
    pub fn new(config: &'a RenderConfig, assets: &'a dyn AssetSource) -> Result<Self> {
        let logo = match &config.logo_path {
            Some(path) => recover(ImageResource::from_file(path), "logo")?,
            None => None,
        };
        Ok(Self {
            config,
            assets,
            timestamp: config.resolve_timestamp()?,
            logo,
        })
    }

    /// Rendering configuration.
    pub fn config(&self) -> &RenderConfig {
        self.config
    }

    /// Footer timestamp shared by every page.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Decoded logo, if available.
    pub fn logo(&self) -> Option<&ImageResource> {
        self.logo.as_ref()
    }

    /// Load an optional asset, degrading to `None` when it is unavailable.
    pub fn load_asset(&self, reference: &str) -> Result<Option<ImageResource>> {
        recover(self.assets.load(reference), reference)
    }

    /// Banner with the given subtitle.
    pub fn banner(&self, subtitle: &str) -> Banner {
        Banner::new(self.config.institution.clone(), subtitle)
    }
}

impl std::fmt::Debug for RenderContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderContext")
            .field("timestamp", &self.timestamp)
            .field("logo", &self.logo.as_ref().map(|l| l.key()))
            .finish()
    }
}

fn recover(result: Result<ImageResource>, what: &str) -> Result<Option<ImageResource>> {
    match result {
        Ok(image) => Ok(Some(image)),
        Err(e) if e.is_recoverable() => {
            log::warn!("Skipping {}: {}", what, e);
            Ok(None)
        },
        Err(e) => Err(e),
    }
}
