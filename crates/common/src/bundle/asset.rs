use serde::{Deserialize, Serialize};

use super::Bundle;
use crate::urls::UrlGenerator;

/// A single source file that contributes to a bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Application relative path of the source file
    pub path: String,
}

impl Asset {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// An asset as presented by diagnostics: its path relative to the owning
///  bundle and, in debug mode, a URL for the raw asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetLink {
    pub path: String,
    pub url: Option<String>,
}

/// Walk a bundle's assets into links.
///
/// Passing a url generator attaches asset URLs; without one every `url` is `None`.
pub fn asset_links(bundle: &Bundle, urls: Option<&UrlGenerator>) -> Vec<AssetLink> {
    bundle
        .assets
        .iter()
        .map(|asset| AssetLink {
            path: relative_to_bundle(&bundle.path, &asset.path).to_string(),
            url: urls.map(|urls| urls.asset_url(asset)),
        })
        .collect()
}

fn relative_to_bundle<'a>(bundle_path: &str, asset_path: &'a str) -> &'a str {
    if asset_path.len() <= bundle_path.len() {
        return asset_path;
    }
    match asset_path.get(..bundle_path.len()) {
        Some(head) if head.eq_ignore_ascii_case(bundle_path) => asset_path[bundle_path.len()..]
            .strip_prefix('/')
            .unwrap_or(asset_path),
        _ => asset_path,
    }
}
