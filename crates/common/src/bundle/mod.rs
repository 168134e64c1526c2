//! Bundle data structures
//!
//! A bundle is a named aggregate of source assets compiled into one
//!  deliverable resource with a single content type:
//!
//! - **[`BundleKind`]**: script, stylesheet or html template, each with a fixed routing prefix
//! - **[`ContentHash`]** / **[`Validator`]**: the compiled output's hash and the ETag derived from it
//! - **[`BundleContent`]**: in-memory or file-backed compiled output
//! - **[`Asset`]** / **[`AssetLink`]**: the sources behind a bundle and their diagnostics view
//!
//! Bundles are immutable once built. A rebuild produces new bundles and swaps
//!  them into the [`BundleRegistry`](crate::registry::BundleRegistry) as a whole.

mod asset;
mod content;
mod hash;
mod kind;

use std::io;

use bytes::Bytes;

pub use asset::{asset_links, Asset, AssetLink};
pub use content::{BundleContent, BundleStream};
pub use hash::{ContentHash, Validator};
pub use kind::{BundleKind, UnknownBundleKind};

#[derive(Debug, Clone)]
pub struct Bundle {
    /// Application relative path, compared by exact string equality
    pub path: String,
    pub kind: BundleKind,
    pub content_type: String,
    pub hash: ContentHash,
    pub assets: Vec<Asset>,
    /// Paths of other bundles this bundle depends on
    pub references: Vec<String>,
    /// Conditional comment for scripts and stylesheets, e.g. `lt IE 9`
    pub condition: Option<String>,
    /// Stylesheet media query
    pub media: Option<String>,
    /// Set for bundles served from elsewhere, e.g. a CDN
    pub external_url: Option<String>,
    pub content: BundleContent,
}

impl Bundle {
    /// In-memory bundle hashed over its content, with the kind's default content type
    pub fn new(kind: BundleKind, path: impl Into<String>, content: impl Into<Bytes>) -> Self {
        let content = content.into();
        Self {
            path: path.into(),
            kind,
            content_type: kind.default_content_type().to_string(),
            hash: ContentHash::of(&content),
            assets: Vec::new(),
            references: Vec::new(),
            condition: None,
            media: None,
            external_url: None,
            content: BundleContent::Memory(content),
        }
    }

    pub fn with_hash(mut self, hash: impl Into<ContentHash>) -> Self {
        self.hash = hash.into();
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn with_assets(mut self, assets: Vec<Asset>) -> Self {
        self.assets = assets;
        self
    }

    pub fn with_references(mut self, references: Vec<String>) -> Self {
        self.references = references;
        self
    }

    pub fn with_content(mut self, content: BundleContent) -> Self {
        self.content = content;
        self
    }

    pub fn validator(&self) -> Validator {
        self.hash.validator()
    }

    pub fn is_external(&self) -> bool {
        self.external_url.is_some()
    }

    pub fn open_stream(&self) -> io::Result<BundleStream> {
        self.content.open()
    }

    pub fn content_length(&self) -> io::Result<u64> {
        self.content.len()
    }
}
