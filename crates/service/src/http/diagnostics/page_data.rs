use serde::Serialize;

use common::bundle::{asset_links, AssetLink, Bundle, BundleKind};
use common::registry::RegistryError;
use common::version::build_info;

use crate::ServiceState;

/// Snapshot of every bundle, taken under one read lock
#[derive(Debug, Serialize)]
pub struct PageData {
    pub scripts: Vec<BundleData>,
    pub stylesheets: Vec<BundleData>,
    pub html_templates: Vec<BundleData>,
    pub cassette: CassetteData,
}

#[derive(Debug, Serialize)]
pub struct BundleData {
    pub path: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    pub assets: Vec<AssetLink>,
    pub references: Vec<String>,
    /// Content length in bytes, `None` when unknown
    pub size: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct CassetteData {
    pub version: &'static str,
    pub cache_directory: String,
    pub source_directory: String,
    pub is_html_rewriting_enabled: bool,
    pub is_debugging_enabled: bool,
    pub generation: u64,
}

impl PageData {
    pub fn capture(state: &ServiceState) -> Result<Self, RegistryError> {
        let settings = state.settings();
        let registry = state.registry().read()?;

        let data_for = |kind: BundleKind| -> Vec<BundleData> {
            registry
                .bundles_of(kind)
                .map(|bundle| bundle_data(state, bundle))
                .collect()
        };

        Ok(Self {
            scripts: data_for(BundleKind::Script),
            stylesheets: data_for(BundleKind::Stylesheet),
            html_templates: data_for(BundleKind::HtmlTemplate),
            cassette: CassetteData {
                version: build_info().version,
                cache_directory: display_dir(settings.cache_dir.as_deref()),
                source_directory: display_dir(settings.source_dir.as_deref()),
                is_html_rewriting_enabled: settings.html_rewriting,
                is_debugging_enabled: settings.debug,
                generation: registry.generation(),
            },
        })
    }
}

fn bundle_data(state: &ServiceState, bundle: &Bundle) -> BundleData {
    let debug = state.settings().debug;
    BundleData {
        path: bundle.path.clone(),
        url: state.urls().bundle_url(bundle),
        condition: bundle.condition.clone(),
        media: bundle.media.clone(),
        assets: asset_links(bundle, debug.then_some(state.urls())),
        references: bundle.references.clone(),
        size: bundle_size(bundle, debug),
    }
}

/// Size is unknown in debug mode, where content is not materialized, and
///  for bundles without assets
fn bundle_size(bundle: &Bundle, debug: bool) -> Option<u64> {
    if debug || bundle.assets.is_empty() {
        return None;
    }
    match bundle.content_length() {
        Ok(size) => Some(size),
        Err(e) => {
            tracing::warn!(path = %bundle.path, "Failed to read bundle size: {}", e);
            None
        }
    }
}

fn display_dir(dir: Option<&std::path::Path>) -> String {
    dir.map(|d| d.display().to_string())
        .unwrap_or_else(|| "(none)".to_string())
}
