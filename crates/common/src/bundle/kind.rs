use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The closed set of bundle kinds served by the gateway.
///
/// Each kind owns a fixed, non-overlapping routing prefix and a default
///  content type, so dispatch is a table lookup rather than a type check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleKind {
    Script,
    Stylesheet,
    #[serde(rename = "htmltemplate", alias = "html-template")]
    HtmlTemplate,
}

struct KindInfo {
    prefix: &'static str,
    name: &'static str,
    content_type: &'static str,
}

const KIND_TABLE: [KindInfo; 3] = [
    KindInfo {
        prefix: "/script",
        name: "script",
        content_type: "text/javascript",
    },
    KindInfo {
        prefix: "/stylesheet",
        name: "stylesheet",
        content_type: "text/css",
    },
    KindInfo {
        prefix: "/htmltemplate",
        name: "htmltemplate",
        content_type: "text/html",
    },
];

impl BundleKind {
    /// Every kind, in the order the diagnostics page lists them
    pub const ALL: [BundleKind; 3] = [
        BundleKind::Script,
        BundleKind::Stylesheet,
        BundleKind::HtmlTemplate,
    ];

    fn info(&self) -> &'static KindInfo {
        &KIND_TABLE[*self as usize]
    }

    /// Routing prefix for requests of this kind, e.g. `/script`
    pub fn prefix(&self) -> &'static str {
        self.info().prefix
    }

    pub fn as_str(&self) -> &'static str {
        self.info().name
    }

    /// Content type used when a bundle does not declare one
    pub fn default_content_type(&self) -> &'static str {
        self.info().content_type
    }

    /// Find the kind whose prefix starts the given request path
    pub fn from_request_path(path: &str) -> Option<BundleKind> {
        Self::ALL.into_iter().find(|kind| {
            path.strip_prefix(kind.prefix())
                .map(|rest| rest.is_empty() || rest.starts_with('/'))
                .unwrap_or(false)
        })
    }
}

impl fmt::Display for BundleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown bundle kind: {0}")]
pub struct UnknownBundleKind(String);

impl FromStr for BundleKind {
    type Err = UnknownBundleKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "script" => Ok(BundleKind::Script),
            "stylesheet" => Ok(BundleKind::Stylesheet),
            "htmltemplate" | "html-template" => Ok(BundleKind::HtmlTemplate),
            other => Err(UnknownBundleKind(other.to_string())),
        }
    }
}
