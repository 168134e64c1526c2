//! HTTP integration tests for bundle routes

mod common;

use std::io::Write;
use std::time::Duration;

use axum::http::{header, StatusCode};

use crate::common::{body_string, get, get_with, send, test_app};

use ::common::prelude::*;

#[tokio::test]
async fn test_fetch_without_validator() {
    let app = test_app();
    let response = send(&app.router, get("/script/v1/app/main")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ETAG], "\"abcd1234\"");
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/javascript");
    assert_eq!(body_string(response).await, "main();");
}

#[tokio::test]
async fn test_matching_validator_is_not_modified() {
    let app = test_app();
    let response = send(
        &app.router,
        get_with("/script/v1/app/main", "if-none-match", "\"abcd1234\""),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/javascript");
    assert!(response.headers().get(header::ETAG).is_none());
    assert_eq!(body_string(response).await, "");
}

#[tokio::test]
async fn test_other_validator_gets_content() {
    let app = test_app();
    for value in ["\"ffffffff\"", "W/\"abcd1234\"", "\"abcd1234\", \"ffffffff\"", "*"] {
        let response = send(
            &app.router,
            get_with("/script/v1/app/main", "if-none-match", value),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK, "{value}");
    }
}

#[tokio::test]
async fn test_version_segment_is_ignored() {
    let app = test_app();
    for uri in ["/script/abcd1234/app/main", "/script/anything/app/main"] {
        let response = send(&app.router, get(uri)).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn test_each_kind_served_under_its_prefix() {
    let app = test_app();

    let response = send(&app.router, get("/stylesheet/v1/site/theme")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");

    let response = send(&app.router, get("/htmltemplate/v1/views/list")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
    assert_eq!(body_string(response).await, "<li></li>");
}

#[tokio::test]
async fn test_kinds_are_isolated() {
    let app = test_app();
    let response = send(&app.router, get("/script/v1/site/theme")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app.router, get("/stylesheet/v1/app/main")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_bundle_and_short_paths_are_not_found() {
    let app = test_app();
    for uri in ["/script/v1/nope", "/script/v1", "/script/v1/", "/script"] {
        let response = send(&app.router, get(uri)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn test_rebuild_invalidates_issued_validator() {
    let app = test_app();
    let response = send(&app.router, get("/script/v1/lib/util")).await;
    let stale = response.headers()[header::ETAG].to_str().unwrap().to_string();

    app.registry
        .replace(vec![Bundle::new(BundleKind::Script, "lib/util", "util(2);")])
        .unwrap();

    let response = send(
        &app.router,
        get_with("/script/v1/lib/util", "if-none-match", &stale),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_ne!(response.headers()[header::ETAG], stale.as_str());
    assert_eq!(body_string(response).await, "util(2);");
}

#[tokio::test]
async fn test_file_backed_bundle_is_streamed() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let content = "x".repeat(256 * 1024);
    file.write_all(content.as_bytes()).unwrap();

    let app = test_app();
    app.registry
        .replace(vec![Bundle::new(BundleKind::Script, "big", "")
            .with_hash(ContentHash::of(content.as_bytes()))
            .with_content(BundleContent::File(file.path().to_path_buf()))])
        .unwrap();

    let response = send(&app.router, get("/script/v1/big")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await.len(), content.len());
}

#[tokio::test]
async fn test_unreadable_content_is_server_error_and_releases_lock() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app();
    app.registry
        .replace(vec![Bundle::new(BundleKind::Script, "gone", "")
            .with_content(BundleContent::File(dir.path().join("gone.js")))])
        .unwrap();

    let response = send(&app.router, get("/script/v1/gone")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(app.registry.replace(Vec::new()).is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_lock_timeout_is_server_error() {
    let registry = std::sync::Arc::new(
        BundleRegistry::with_bundles(vec![Bundle::new(BundleKind::Script, "a", "a();")])
            .unwrap()
            .with_lock_timeout(Duration::from_millis(20)),
    );
    let app = crate::common::test_app();
    let state = service::ServiceState::new(
        registry.clone(),
        app.rebuilder.clone(),
        UrlGenerator::default(),
        service::Settings::default(),
    );
    let router = service::http::router(state);

    let writer = registry.write().unwrap();
    let response = send(&router, get("/script/v1/a")).await;
    drop(writer);
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = send(&router, get("/script/v1/a")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route_falls_back() {
    let app = test_app();
    let response = send(&app.router, get("/images/v1/logo.png")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_generated_url_reaches_bundle_with_escaped_path() {
    let app = test_app();
    let bundle = Bundle::new(BundleKind::Script, "docs/read me/ü", "docs();");
    let url = UrlGenerator::default().bundle_url(&bundle);
    app.registry.replace(vec![bundle]).unwrap();

    let response = send(&app.router, get(&url)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "docs();");

    let response = send(&app.router, get("/script/v1/docs/read%20me/%C3%BC")).await;
    assert_eq!(response.status(), StatusCode::OK);
}
