//! Shared fixtures for HTTP integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use tower::ServiceExt;

use ::common::prelude::*;
use service::{ServiceState, Settings};

/// Rebuilder that records how often it ran and installs a fixed bundle set
pub struct CountingRebuilder {
    pub registry: Arc<BundleRegistry>,
    pub next: Vec<Bundle>,
    pub calls: AtomicUsize,
}

impl CacheRebuilder for CountingRebuilder {
    fn rebuild_cache(&self) -> Result<(), RebuildError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.registry.replace(self.next.clone())?;
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub registry: Arc<BundleRegistry>,
    pub rebuilder: Arc<CountingRebuilder>,
}

pub fn sample_bundles() -> Vec<Bundle> {
    let mut theme = Bundle::new(BundleKind::Stylesheet, "site/theme", "body{}")
        .with_assets(vec![Asset::new("site/theme/a.css"), Asset::new("site/theme/b.css")]);
    theme.media = Some("screen".to_string());

    vec![
        Bundle::new(BundleKind::Script, "app/main", "main();")
            .with_hash(ContentHash::from(0xABCD1234u32))
            .with_assets(vec![Asset::new("app/main/main.js")])
            .with_references(vec!["lib/util".to_string()]),
        Bundle::new(BundleKind::Script, "lib/util", "util();"),
        theme,
        Bundle::new(BundleKind::HtmlTemplate, "views/list", "<li></li>"),
    ]
}

pub fn test_app_with(settings: Settings, next: Vec<Bundle>) -> TestApp {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let registry = Arc::new(BundleRegistry::with_bundles(sample_bundles()).unwrap());
    let rebuilder = Arc::new(CountingRebuilder {
        registry: registry.clone(),
        next,
        calls: AtomicUsize::new(0),
    });
    let state = ServiceState::new(
        registry.clone(),
        rebuilder.clone(),
        UrlGenerator::default(),
        settings,
    );

    TestApp {
        router: service::http::router(state),
        registry,
        rebuilder,
    }
}

pub fn test_app() -> TestApp {
    test_app_with(Settings::default(), Vec::new())
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_with(uri: &str, header: &str, value: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header, value)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
