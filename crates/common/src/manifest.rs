//! A TOML manifest describing bundles, and the builder that compiles it.
//!
//! ```toml
//! source_dir = "assets"
//!
//! [[bundles]]
//! kind = "script"
//! path = "app/main"
//! assets = ["app/main/util.js", "app/main/main.js"]
//! references = ["lib/jquery"]
//!
//! [[bundles]]
//! kind = "script"
//! path = "lib/jquery"
//! external_url = "https://code.jquery.com/jquery-3.7.1.min.js"
//! ```
//!
//! Compilation is plain concatenation of the asset files in listed order.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use serde::Deserialize;

use crate::bundle::{Asset, Bundle, BundleContent, BundleKind, ContentHash};
use crate::rebuild::BundleSource;
use crate::storage::IsolatedStorage;

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    /// Directory asset paths are relative to; relative to the manifest file itself
    #[serde(default)]
    pub source_dir: Option<PathBuf>,
    #[serde(default)]
    pub bundles: Vec<ManifestBundle>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestBundle {
    pub kind: BundleKind,
    pub path: String,
    #[serde(default)]
    pub assets: Vec<String>,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub media: Option<String>,
    #[serde(default)]
    pub external_url: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to read asset {path} of bundle '{bundle}': {source}")]
    Asset {
        bundle: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to cache bundle '{bundle}': {source}")]
    Cache {
        bundle: String,
        #[source]
        source: io::Error,
    },
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let raw = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Compiles the bundles listed in a manifest file.
///
/// The manifest is re-read on every build so a rebuild picks up edits.
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    manifest_path: PathBuf,
    source_dir: Option<PathBuf>,
    cache: Option<Arc<IsolatedStorage>>,
}

impl ManifestBuilder {
    pub fn new(manifest_path: impl Into<PathBuf>) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            source_dir: None,
            cache: None,
        }
    }

    /// Override the manifest's `source_dir`
    pub fn with_source_dir(mut self, source_dir: impl Into<PathBuf>) -> Self {
        self.source_dir = Some(source_dir.into());
        self
    }

    /// Materialize compiled output into `storage` instead of keeping it in memory
    pub fn with_cache(mut self, storage: Arc<IsolatedStorage>) -> Self {
        self.cache = Some(storage);
        self
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Directory assets are read from for the given manifest
    pub fn source_dir(&self, manifest: &Manifest) -> PathBuf {
        let manifest_dir = self
            .manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        match (&self.source_dir, &manifest.source_dir) {
            (Some(dir), _) => dir.clone(),
            (None, Some(dir)) => manifest_dir.join(dir),
            (None, None) => manifest_dir,
        }
    }

    pub fn build(&self) -> Result<Vec<Bundle>, ManifestError> {
        let manifest = Manifest::load(&self.manifest_path)?;
        let source_dir = self.source_dir(&manifest);
        manifest
            .bundles
            .iter()
            .map(|entry| self.build_bundle(entry, &source_dir))
            .collect()
    }

    fn build_bundle(&self, entry: &ManifestBundle, source_dir: &Path) -> Result<Bundle, ManifestError> {
        let mut compiled = Vec::new();
        for asset in &entry.assets {
            let asset_path = source_dir.join(asset);
            let data = fs::read(&asset_path).map_err(|source| ManifestError::Asset {
                bundle: entry.path.clone(),
                path: asset_path,
                source,
            })?;
            if !compiled.is_empty() && !compiled.ends_with(b"\n") {
                compiled.push(b'\n');
            }
            compiled.extend_from_slice(&data);
        }

        let hash = match (&entry.external_url, entry.assets.is_empty()) {
            (Some(url), true) => ContentHash::of(url.as_bytes()),
            _ => ContentHash::of(&compiled),
        };

        let content = match &self.cache {
            Some(storage) if !entry.assets.is_empty() => {
                let name = format!("{}/{}", entry.kind, hash.to_hex());
                let path = storage
                    .write(&name, &compiled)
                    .map_err(|source| ManifestError::Cache {
                        bundle: entry.path.clone(),
                        source,
                    })?;
                BundleContent::File(path)
            }
            _ => BundleContent::Memory(Bytes::from(compiled)),
        };

        Ok(Bundle {
            path: entry.path.clone(),
            kind: entry.kind,
            content_type: entry
                .content_type
                .clone()
                .unwrap_or_else(|| entry.kind.default_content_type().to_string()),
            hash,
            assets: entry.assets.iter().map(Asset::new).collect(),
            references: entry.references.clone(),
            condition: entry.condition.clone(),
            media: entry.media.clone(),
            external_url: entry.external_url.clone(),
            content,
        })
    }
}

impl BundleSource for ManifestBuilder {
    type Error = ManifestError;

    fn build(&self) -> Result<Vec<Bundle>, Self::Error> {
        ManifestBuilder::build(self)
    }

    /// Drop cached output of earlier builds that the live generation no longer serves
    fn prune(&self, live: &HashSet<PathBuf>) {
        let Some(storage) = &self.cache else {
            return;
        };
        match storage.retain(live) {
            Ok(0) => {}
            Ok(removed) => tracing::debug!(removed, "pruned stale cached bundles"),
            Err(e) => tracing::warn!(
                root = %storage.root().display(),
                "failed to prune bundle cache: {}", e
            ),
        }
    }
}
