//! Process-scoped persistent storage for compiled bundles.
//!
//! The storage directory is opened on first demand and at most once per
//!  process. Disposal releases the handle, may be called any number of times
//!  (or never), and leaves the container refusing further access.

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tempfile::NamedTempFile;

pub const STORAGE_DIR_NAME: &str = "cassette";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("isolated storage has been disposed")]
    Disposed,
    #[error("process storage is already configured at {0}")]
    AlreadyConfigured(PathBuf),
    #[error("failed to open isolated storage at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Handle to an opened storage directory
#[derive(Debug)]
pub struct IsolatedStorage {
    root: PathBuf,
}

impl IsolatedStorage {
    fn open(root: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(root).map_err(|source| StorageError::Open {
            path: root.to_path_buf(),
            source,
        })?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `contents` to `name` below the root, replacing any previous file.
    ///
    /// The data goes to a uniquely named temporary sibling first and is
    ///  persisted into place, so neither concurrent writers of the same name
    ///  nor a reader holding the old file ever see partial content.
    pub fn write(&self, name: &str, contents: &[u8]) -> io::Result<PathBuf> {
        let target = self.root.join(name);
        let parent = target.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent)?;

        let mut staging = NamedTempFile::new_in(parent)?;
        staging.write_all(contents)?;
        staging.as_file().sync_data()?;
        staging.persist(&target).map_err(|e| e.error)?;
        Ok(target)
    }

    /// Remove every stored file not in `live`. Returns how many were removed.
    ///
    /// Handles already open on a removed file stay readable until closed.
    pub fn retain(&self, live: &HashSet<PathBuf>) -> io::Result<usize> {
        retain_in(&self.root, live)
    }
}

fn retain_in(dir: &Path, live: &HashSet<PathBuf>) -> io::Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            removed += retain_in(&path, live)?;
        } else if !live.contains(&path) {
            fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}

#[derive(Debug)]
enum Slot {
    Empty,
    Open(Arc<IsolatedStorage>),
    Disposed,
}

#[derive(Debug)]
pub struct StorageContainer {
    root: PathBuf,
    slot: Mutex<Slot>,
}

impl StorageContainer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            slot: Mutex::new(Slot::Empty),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The storage handle, opened on the first call
    pub fn storage(&self) -> Result<Arc<IsolatedStorage>, StorageError> {
        let mut slot = self.slot.lock();
        match &*slot {
            Slot::Open(storage) => Ok(storage.clone()),
            Slot::Disposed => Err(StorageError::Disposed),
            Slot::Empty => {
                let storage = Arc::new(IsolatedStorage::open(&self.root)?);
                tracing::debug!(root = %self.root.display(), "isolated storage opened");
                *slot = Slot::Open(storage.clone());
                Ok(storage)
            }
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(&*self.slot.lock(), Slot::Open(_))
    }

    /// Release the handle. Returns whether a handle was actually open.
    pub fn dispose(&self) -> bool {
        let previous = std::mem::replace(&mut *self.slot.lock(), Slot::Disposed);
        matches!(previous, Slot::Open(_))
    }
}

static PROCESS_STORAGE: OnceLock<StorageContainer> = OnceLock::new();

/// Machine wide default location, falling back to the temp directory
pub fn default_storage_root() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(STORAGE_DIR_NAME)
        .join("isolated")
}

/// Choose the process storage root. Only allowed before first use.
pub fn configure_process_storage(root: impl Into<PathBuf>) -> Result<(), StorageError> {
    let root = root.into();
    let mut configured = false;
    let container = PROCESS_STORAGE.get_or_init(|| {
        configured = true;
        StorageContainer::new(root.clone())
    });
    if configured || container.root() == root {
        Ok(())
    } else {
        Err(StorageError::AlreadyConfigured(container.root().to_path_buf()))
    }
}

/// The single storage container for this process
pub fn process_storage() -> &'static StorageContainer {
    PROCESS_STORAGE.get_or_init(|| StorageContainer::new(default_storage_root()))
}
