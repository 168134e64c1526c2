/**
 * Bundle model: kinds and their routing prefixes,
 *  content hashes and the ETag validators derived
 *  from them, content sources and assets.
 */
pub mod bundle;
/**
 * Build-time bundles from a TOML manifest; a
 *  minimal stand-in for a real asset pipeline.
 */
pub mod manifest;
/**
 * Stripping routing segments off request paths.
 */
pub mod path;
/**
 * Rebuild trigger and the source of freshly
 *  compiled bundles.
 */
pub mod rebuild;
/**
 * The shared bundle collection behind a
 *  readers-writer lock.
 */
pub mod registry;
/**
 * Per-kind request resolution and cache validation.
 */
pub mod request;
/**
 * Lazily opened, process-scoped storage for
 *  materialized bundle content.
 */
pub mod storage;
pub mod urls;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::bundle::{
        asset_links, Asset, AssetLink, Bundle, BundleContent, BundleKind, BundleStream,
        ContentHash, Validator,
    };
    pub use crate::manifest::{Manifest, ManifestBuilder, ManifestError};
    pub use crate::path::{decode_request_path, encode_path, resolve_bundle_path};
    pub use crate::rebuild::{BundleSource, CacheRebuilder, RebuildError, RegistryRebuilder};
    pub use crate::registry::{BundleRegistry, RegistryError};
    pub use crate::request::{BundleOutcome, BundleRequestError, BundleRequestHandler};
    pub use crate::storage::{IsolatedStorage, StorageContainer, StorageError};
    pub use crate::urls::{UrlGenerator, DIAGNOSTICS_PATH};
    pub use crate::version::build_info;
}
