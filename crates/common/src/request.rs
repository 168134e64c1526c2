//! Request-time resolution of a bundle and its cache validation.

use std::io;
use std::sync::Arc;

use crate::bundle::{BundleKind, BundleStream, Validator};
use crate::path::resolve_bundle_path;
use crate::registry::{BundleRegistry, RegistryError};

/// What a bundle request resolved to
#[derive(Debug)]
pub enum BundleOutcome {
    /// No bundle of this kind claims the path
    NotFound { path: String },
    /// The client's validator is current
    NotModified { content_type: String },
    /// Full content with a fresh validator
    Content {
        content_type: String,
        validator: Validator,
        stream: BundleStream,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum BundleRequestError {
    #[error("bundle registry unavailable: {0}")]
    Registry(#[from] RegistryError),
    #[error("failed to open content of bundle '{path}': {source}")]
    OpenStream {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Serves bundles of a single kind
#[derive(Debug, Clone)]
pub struct BundleRequestHandler {
    kind: BundleKind,
    registry: Arc<BundleRegistry>,
}

impl BundleRequestHandler {
    pub fn new(kind: BundleKind, registry: Arc<BundleRegistry>) -> Self {
        Self { kind, registry }
    }

    pub fn kind(&self) -> BundleKind {
        self.kind
    }

    /// Resolve `raw_path` and decide between not-found, not-modified and content.
    ///
    /// The registry read lock covers the lookup and the opening of the content
    ///  stream, and is released before this returns on every path. Reading
    ///  the returned stream does not need the lock.
    pub fn handle(
        &self,
        raw_path: &str,
        if_none_match: Option<&[u8]>,
    ) -> Result<BundleOutcome, BundleRequestError> {
        let path = resolve_bundle_path(raw_path);

        let registry = self.registry.read()?;
        let Some(bundle) = registry.find(path, self.kind) else {
            tracing::info!(kind = %self.kind, path, "bundle not found");
            return Ok(BundleOutcome::NotFound {
                path: path.to_string(),
            });
        };

        let validator = bundle.validator();
        if validator.matches(if_none_match) {
            tracing::info!(kind = %self.kind, path, "bundle not modified");
            return Ok(BundleOutcome::NotModified {
                content_type: bundle.content_type.clone(),
            });
        }

        let stream = bundle
            .open_stream()
            .map_err(|source| BundleRequestError::OpenStream {
                path: path.to_string(),
                source,
            })?;
        tracing::info!(kind = %self.kind, path, etag = %validator, "bundle returned");
        Ok(BundleOutcome::Content {
            content_type: bundle.content_type.clone(),
            validator,
            stream,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{Bundle, BundleContent, ContentHash};
    use std::io::Read;
    use std::time::Duration;

    fn registry() -> Arc<BundleRegistry> {
        Arc::new(
            BundleRegistry::with_bundles(vec![
                Bundle::new(BundleKind::Script, "app/main", "main();")
                    .with_hash(ContentHash::from(0xABCD1234u32)),
                Bundle::new(BundleKind::Stylesheet, "app/theme", "body{}"),
            ])
            .unwrap()
            .with_lock_timeout(Duration::from_millis(50)),
        )
    }

    #[test]
    fn test_content_with_validator() {
        let handler = BundleRequestHandler::new(BundleKind::Script, registry());
        match handler.handle("/script/v1/app/main", None).unwrap() {
            BundleOutcome::Content {
                content_type,
                validator,
                mut stream,
            } => {
                assert_eq!(content_type, "text/javascript");
                assert_eq!(validator.as_str(), "\"abcd1234\"");
                let mut body = String::new();
                stream.read_to_string(&mut body).unwrap();
                assert_eq!(body, "main();");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_matching_validator_is_not_modified() {
        let handler = BundleRequestHandler::new(BundleKind::Script, registry());
        let outcome = handler
            .handle("/script/v1/app/main", Some(b"\"abcd1234\"".as_slice()))
            .unwrap();
        assert!(matches!(
            outcome,
            BundleOutcome::NotModified { ref content_type } if content_type == "text/javascript"
        ));
    }

    #[test]
    fn test_other_validator_gets_content() {
        let handler = BundleRequestHandler::new(BundleKind::Script, registry());
        let outcome = handler
            .handle("/script/v1/app/main", Some(b"\"ffffffff\"".as_slice()))
            .unwrap();
        assert!(matches!(outcome, BundleOutcome::Content { .. }));
    }

    #[test]
    fn test_kinds_are_isolated() {
        let handler = BundleRequestHandler::new(BundleKind::Script, registry());
        let outcome = handler.handle("/script/v1/app/theme", None).unwrap();
        assert!(matches!(outcome, BundleOutcome::NotFound { ref path } if path == "app/theme"));
    }

    #[test]
    fn test_short_paths_are_not_found() {
        let handler = BundleRequestHandler::new(BundleKind::Script, registry());
        for raw in ["", "/", "/script", "/script/v1", "app/main"] {
            let outcome = handler.handle(raw, None).unwrap();
            assert!(matches!(outcome, BundleOutcome::NotFound { .. }), "{raw}");
        }
    }

    #[test]
    fn test_lock_timeout_is_an_error() {
        let registry = registry();
        let handler = BundleRequestHandler::new(BundleKind::Script, registry.clone());
        let _writer = registry.write().unwrap();
        assert!(matches!(
            handler.handle("/script/v1/app/main", None),
            Err(BundleRequestError::Registry(RegistryError::ReadLockTimeout(_)))
        ));
    }

    #[test]
    fn test_open_failure_releases_lock() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(
            BundleRegistry::with_bundles(vec![Bundle::new(BundleKind::Script, "gone", "")
                .with_content(BundleContent::File(dir.path().join("missing.js")))])
            .unwrap()
            .with_lock_timeout(Duration::from_millis(50)),
        );
        let handler = BundleRequestHandler::new(BundleKind::Script, registry.clone());

        assert!(matches!(
            handler.handle("/script/v1/gone", None),
            Err(BundleRequestError::OpenStream { .. })
        ));
        assert!(registry.write().is_ok());
    }
}
