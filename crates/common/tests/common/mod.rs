//! Shared fixtures for registry and request integration tests
#![allow(dead_code)]

use std::io::Read;
use std::sync::Arc;

use ::common::prelude::*;

/// Install a test subscriber once; later calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn script(path: &'static str, body: &'static str) -> Bundle {
    Bundle::new(BundleKind::Script, path, body)
}

pub fn stylesheet(path: &'static str, body: &'static str) -> Bundle {
    Bundle::new(BundleKind::Stylesheet, path, body)
}

/// Registry holding one bundle of every kind plus the worked example bundle
pub fn sample_registry() -> Arc<BundleRegistry> {
    init_tracing();
    Arc::new(
        BundleRegistry::with_bundles(vec![
            script("app/main", "main();").with_hash(ContentHash::from(0xABCD1234u32)),
            script("lib/util", "util();"),
            stylesheet("site/theme", "body{}"),
            Bundle::new(BundleKind::HtmlTemplate, "views/list", "<li></li>"),
        ])
        .unwrap(),
    )
}

/// Drain a content outcome into (validator, body)
pub fn expect_content(outcome: BundleOutcome) -> (String, String) {
    match outcome {
        BundleOutcome::Content {
            validator,
            mut stream,
            ..
        } => {
            let mut body = String::new();
            stream.read_to_string(&mut body).unwrap();
            (validator.to_string(), body)
        }
        other => panic!("expected content, got {:?}", other),
    }
}
