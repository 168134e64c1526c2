use std::path::PathBuf;
use std::time::Duration;

use common::registry::DEFAULT_LOCK_TIMEOUT;

#[derive(Debug, Clone)]
pub struct Config {
    // bundle configuration
    /// path to the bundle manifest (TOML)
    pub manifest_path: PathBuf,
    /// directory asset paths are relative to,
    ///  if not set then the manifest's `source_dir` is used
    pub source_dir: Option<PathBuf>,
    /// directory compiled bundles are cached in,
    ///  if not set then a machine wide data directory is used
    pub storage_dir: Option<PathBuf>,

    // behaviour
    /// serve bundles straight from memory, generate asset urls
    ///  and skip size reporting in diagnostics
    pub debug: bool,
    /// reported by diagnostics, rewriting itself happens in the page layer
    pub html_rewriting: bool,
    /// how long a request waits on the bundle registry lock
    pub lock_timeout: Duration,
    /// prefix for generated bundle and asset urls
    pub url_base: String,

    // misc
    pub log_level: tracing::Level,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            manifest_path: PathBuf::from("cassette.toml"),
            source_dir: None,
            storage_dir: None,
            debug: false,
            html_rewriting: false,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            url_base: String::new(),
            log_level: tracing::Level::INFO,
        }
    }
}
