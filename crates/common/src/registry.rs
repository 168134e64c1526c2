//! The in-memory collection of currently active bundles.
//!
//! Readers (request handling, diagnostics) share the lock; a rebuild takes it
//!  exclusively and swaps in a whole new generation, so a reader either sees
//!  the previous generation or the next one, never a mix.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::bundle::{Bundle, BundleKind};

/// How long to wait for the registry lock before giving up
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("timed out after {0:?} waiting for the bundle registry read lock")]
    ReadLockTimeout(Duration),
    #[error("timed out after {0:?} waiting for the bundle registry write lock")]
    WriteLockTimeout(Duration),
    #[error("more than one {kind} bundle claims path '{path}'")]
    DuplicateBundle { kind: BundleKind, path: String },
}

#[derive(Debug, Default)]
struct Generation {
    number: u64,
    bundles: Vec<Bundle>,
    /// kind -> path -> position in `bundles`
    index: HashMap<BundleKind, HashMap<String, usize>>,
}

impl Generation {
    fn build(number: u64, bundles: Vec<Bundle>) -> Result<Self, RegistryError> {
        let mut index: HashMap<BundleKind, HashMap<String, usize>> = HashMap::new();
        for (position, bundle) in bundles.iter().enumerate() {
            let by_path = index.entry(bundle.kind).or_default();
            if by_path.insert(bundle.path.clone(), position).is_some() {
                return Err(RegistryError::DuplicateBundle {
                    kind: bundle.kind,
                    path: bundle.path.clone(),
                });
            }
        }
        Ok(Self {
            number,
            bundles,
            index,
        })
    }

    fn find(&self, path: &str, kind: BundleKind) -> Option<&Bundle> {
        self.index
            .get(&kind)
            .and_then(|by_path| by_path.get(path))
            .map(|&position| &self.bundles[position])
    }
}

#[derive(Debug)]
pub struct BundleRegistry {
    inner: RwLock<Generation>,
    lock_timeout: Duration,
}

impl Default for BundleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BundleRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Generation::default()),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Registry seeded with an initial generation
    pub fn with_bundles(bundles: Vec<Bundle>) -> Result<Self, RegistryError> {
        Ok(Self {
            inner: RwLock::new(Generation::build(1, bundles)?),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        })
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Take the shared lock. It is released when the guard drops.
    pub fn read(&self) -> Result<RegistryReadGuard<'_>, RegistryError> {
        self.inner
            .try_read_for(self.lock_timeout)
            .map(|inner| RegistryReadGuard { inner })
            .ok_or(RegistryError::ReadLockTimeout(self.lock_timeout))
    }

    /// Take the exclusive lock, waiting for active readers to finish.
    pub fn write(&self) -> Result<RegistryWriteGuard<'_>, RegistryError> {
        self.inner
            .try_write_for(self.lock_timeout)
            .map(|inner| RegistryWriteGuard { inner })
            .ok_or(RegistryError::WriteLockTimeout(self.lock_timeout))
    }

    /// Swap in a new set of bundles as the next generation.
    ///
    /// The set is validated before the exclusive lock is taken; the lock is
    ///  held only for the swap itself.
    pub fn replace(&self, bundles: Vec<Bundle>) -> Result<u64, RegistryError> {
        let next = Generation::build(0, bundles)?;
        let previous = {
            let mut guard = self.write()?;
            guard.install(next)
        };
        let number = previous.number + 1;
        tracing::debug!(generation = number, "bundle registry replaced");
        Ok(number)
    }
}

/// Shared access to the current generation
pub struct RegistryReadGuard<'a> {
    inner: RwLockReadGuard<'a, Generation>,
}

impl RegistryReadGuard<'_> {
    /// The bundle of `kind` whose path equals `path` exactly
    pub fn find(&self, path: &str, kind: BundleKind) -> Option<&Bundle> {
        self.inner.find(path, kind)
    }

    /// Every bundle, in the order the generation was built
    pub fn bundles(&self) -> impl Iterator<Item = &Bundle> {
        self.inner.bundles.iter()
    }

    pub fn bundles_of(&self, kind: BundleKind) -> impl Iterator<Item = &Bundle> {
        self.inner.bundles.iter().filter(move |b| b.kind == kind)
    }

    pub fn generation(&self) -> u64 {
        self.inner.number
    }

    pub fn len(&self) -> usize {
        self.inner.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.bundles.is_empty()
    }
}

/// Exclusive access; readers block until this guard drops
pub struct RegistryWriteGuard<'a> {
    inner: RwLockWriteGuard<'a, Generation>,
}

impl RegistryWriteGuard<'_> {
    /// Replace the generation while already holding the lock
    pub fn replace(&mut self, bundles: Vec<Bundle>) -> Result<u64, RegistryError> {
        let next = Generation::build(0, bundles)?;
        Ok(self.install(next).number + 1)
    }

    pub fn generation(&self) -> u64 {
        self.inner.number
    }

    fn install(&mut self, mut next: Generation) -> Generation {
        next.number = self.inner.number + 1;
        std::mem::replace(&mut *self.inner, next)
    }
}
