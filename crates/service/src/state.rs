use std::path::PathBuf;
use std::sync::Arc;

use common::manifest::{Manifest, ManifestBuilder, ManifestError};
use common::rebuild::{CacheRebuilder, RebuildError, RegistryRebuilder};
use common::registry::BundleRegistry;
use common::storage::{self, StorageError};
use common::urls::UrlGenerator;

use super::config::Config;

/// Main service state - shared by every request handler
#[derive(Clone)]
pub struct State {
    registry: Arc<BundleRegistry>,
    rebuilder: Arc<dyn CacheRebuilder>,
    urls: UrlGenerator,
    settings: Arc<Settings>,
}

/// Runtime settings surfaced by the diagnostics page
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub debug: bool,
    pub html_rewriting: bool,
    pub source_dir: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
}

impl State {
    pub fn new(
        registry: Arc<BundleRegistry>,
        rebuilder: Arc<dyn CacheRebuilder>,
        urls: UrlGenerator,
        settings: Settings,
    ) -> Self {
        Self {
            registry,
            rebuilder,
            urls,
            settings: Arc::new(settings),
        }
    }

    /// Set up storage, compile the manifest and load the first registry generation
    pub fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        let mut builder = ManifestBuilder::new(&config.manifest_path);
        if let Some(source_dir) = &config.source_dir {
            builder = builder.with_source_dir(source_dir);
        }

        // 1. Setup cache storage, debug mode keeps everything in memory
        let cache_dir = if config.debug {
            None
        } else {
            if let Some(storage_dir) = &config.storage_dir {
                storage::configure_process_storage(storage_dir)?;
            }
            let cache = storage::process_storage().storage()?;
            tracing::info!(path = %cache.root().display(), "Using bundle cache directory");
            let cache_dir = cache.root().to_path_buf();
            builder = builder.with_cache(cache);
            Some(cache_dir)
        };

        // 2. Resolve where assets come from
        let manifest = Manifest::load(builder.manifest_path())?;
        let source_dir = builder.source_dir(&manifest);
        tracing::info!(
            manifest = %builder.manifest_path().display(),
            source_dir = %source_dir.display(),
            "Loading bundles"
        );

        // 3. Build the first generation
        let registry = Arc::new(BundleRegistry::new().with_lock_timeout(config.lock_timeout));
        let rebuilder = RegistryRebuilder::new(builder, registry.clone());
        rebuilder.rebuild_cache()?;

        Ok(Self::new(
            registry,
            Arc::new(rebuilder),
            UrlGenerator::new(config.url_base.clone()),
            Settings {
                debug: config.debug,
                html_rewriting: config.html_rewriting,
                source_dir: Some(source_dir),
                cache_dir,
            },
        ))
    }

    pub fn registry(&self) -> &Arc<BundleRegistry> {
        &self.registry
    }

    pub fn rebuilder(&self) -> &Arc<dyn CacheRebuilder> {
        &self.rebuilder
    }

    pub fn urls(&self) -> &UrlGenerator {
        &self.urls
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

impl AsRef<BundleRegistry> for State {
    fn as_ref(&self) -> &BundleRegistry {
        &self.registry
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),
    #[error("Initial bundle build failed: {0}")]
    Rebuild(#[from] RebuildError),
}
