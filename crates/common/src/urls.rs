use crate::bundle::{Asset, Bundle};
use crate::path::encode_path;

/// Path of the diagnostics endpoint
pub const DIAGNOSTICS_PATH: &str = "/_Cassette";

/// Builds the URLs pages use to reference bundles and assets.
///
/// A bundle URL carries the content hash as its version segment, so it
///  changes whenever the bundle is rebuilt with different output.
#[derive(Debug, Clone, Default)]
pub struct UrlGenerator {
    /// Prepended to every generated URL, e.g. `/static` when mounted below a sub path
    base: String,
}

impl UrlGenerator {
    pub fn new(base: impl Into<String>) -> Self {
        let base: String = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// `{base}{kind prefix}/{hex hash}/{path}` with the path percent-encoded;
    ///  external bundles use their own URL
    pub fn bundle_url(&self, bundle: &Bundle) -> String {
        if let Some(external) = &bundle.external_url {
            return external.clone();
        }
        format!(
            "{}{}/{}/{}",
            self.base,
            bundle.kind.prefix(),
            bundle.hash.to_hex(),
            encode_path(&bundle.path)
        )
    }

    pub fn asset_url(&self, asset: &Asset) -> String {
        format!(
            "{}{}/asset/{}",
            self.base,
            DIAGNOSTICS_PATH,
            encode_path(&asset.path)
        )
    }
}
