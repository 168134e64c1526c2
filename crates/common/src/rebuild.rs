//! Rebuilding the bundle registry.
//!
//! Building happens outside the registry lock; only the final swap takes the
//!  exclusive write path, so requests keep being served from the previous
//!  generation while a rebuild compiles. Rebuilds themselves run one at a
//!  time: a build and its swap are never interleaved with another rebuild.

use std::collections::HashSet;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::bundle::{Bundle, BundleContent};
use crate::registry::{BundleRegistry, RegistryError};

/// Something that can compile the full set of bundles
pub trait BundleSource: Send + Sync {
    type Error: Error + Send + Sync + 'static;

    fn build(&self) -> Result<Vec<Bundle>, Self::Error>;

    /// Called after a build has been installed, with every content file the
    ///  live generation still serves. Anything else the source materialized
    ///  may be released.
    fn prune(&self, _live: &HashSet<PathBuf>) {}
}

/// Administrative trigger that invalidates and rebuilds the bundle cache
pub trait CacheRebuilder: Send + Sync {
    fn rebuild_cache(&self) -> Result<(), RebuildError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RebuildError {
    #[error("failed to build bundles: {0}")]
    Build(#[source] Box<dyn Error + Send + Sync>),
    #[error("failed to install rebuilt bundles: {0}")]
    Registry(#[from] RegistryError),
}

/// Rebuilds from a [`BundleSource`] into a shared [`BundleRegistry`]
pub struct RegistryRebuilder<S> {
    source: S,
    registry: Arc<BundleRegistry>,
    /// held from build start until the swap (and pruning) is done
    rebuild_lock: Mutex<()>,
}

impl<S: BundleSource> RegistryRebuilder<S> {
    pub fn new(source: S, registry: Arc<BundleRegistry>) -> Self {
        Self {
            source,
            registry,
            rebuild_lock: Mutex::new(()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: BundleSource> CacheRebuilder for RegistryRebuilder<S> {
    fn rebuild_cache(&self) -> Result<(), RebuildError> {
        let _rebuilding = self.rebuild_lock.lock();

        let bundles = self
            .source
            .build()
            .map_err(|e| RebuildError::Build(Box::new(e)))?;
        let count = bundles.len();
        let live = content_files(&bundles);
        let generation = self.registry.replace(bundles)?;
        tracing::info!(generation, bundles = count, "bundle cache rebuilt");

        self.source.prune(&live);
        Ok(())
    }
}

fn content_files(bundles: &[Bundle]) -> HashSet<PathBuf> {
    bundles
        .iter()
        .filter_map(|bundle| match &bundle.content {
            BundleContent::File(path) => Some(path.clone()),
            BundleContent::Memory(_) => None,
        })
        .collect()
}
