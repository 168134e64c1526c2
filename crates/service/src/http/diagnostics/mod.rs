//! The `/_Cassette` diagnostics page and its administrative actions.

use askama::Template;
use askama_axum::IntoResponse;
use axum::extract::{Form, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tokio_util::io::ReaderStream;

use common::urls::DIAGNOSTICS_PATH;

mod page_data;

pub use page_data::{BundleData, CassetteData, PageData};

use crate::ServiceState;

pub const REBUILD_CACHE_ACTION: &str = "rebuild-cache";

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route(DIAGNOSTICS_PATH, get(handler).post(post_handler))
        .route(&format!("{}/asset/*path", DIAGNOSTICS_PATH), get(asset_handler))
        .with_state(state)
}

// TODO: gate on a configured diagnostics credential instead of allowing everyone
fn can_access(_headers: &HeaderMap) -> bool {
    true
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.contains("application/json"))
        .unwrap_or(false)
}

struct AssetView {
    path: String,
    url: String,
}

struct BundleView {
    path: String,
    url: String,
    details: String,
    assets: Vec<AssetView>,
    references: String,
    size: String,
}

struct SectionView {
    title: &'static str,
    bundles: Vec<BundleView>,
}

#[derive(Template)]
#[template(path = "pages/diagnostics.html")]
struct DiagnosticsTemplate {
    sections: Vec<SectionView>,
    cassette: CassetteData,
    action_path: &'static str,
    rebuild_action: &'static str,
}

impl From<BundleData> for BundleView {
    fn from(data: BundleData) -> Self {
        let details = [
            data.condition.map(|c| format!("condition: {}", c)),
            data.media.map(|m| format!("media: {}", m)),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(", ");

        Self {
            path: data.path,
            url: data.url,
            details,
            assets: data
                .assets
                .into_iter()
                .map(|link| AssetView {
                    path: link.path,
                    url: link.url.unwrap_or_default(),
                })
                .collect(),
            references: data.references.join(", "),
            size: data
                .size
                .map(|s| s.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

fn section(title: &'static str, bundles: Vec<BundleData>) -> SectionView {
    SectionView {
        title,
        bundles: bundles.into_iter().map(BundleView::from).collect(),
    }
}

#[tracing::instrument(skip(state, headers))]
pub async fn handler(State(state): State<ServiceState>, headers: HeaderMap) -> Response {
    if !can_access(&headers) {
        return StatusCode::NOT_FOUND.into_response();
    }

    let snapshot = tokio::task::spawn_blocking(move || PageData::capture(&state)).await;
    let data = match snapshot {
        Ok(Ok(data)) => data,
        Ok(Err(e)) => {
            tracing::error!("Failed to snapshot bundles: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Unexpected error").into_response();
        }
        Err(e) => {
            tracing::error!("Diagnostics task failed: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Unexpected error").into_response();
        }
    };

    if wants_json(&headers) {
        return (StatusCode::OK, Json(data)).into_response();
    }

    let template = DiagnosticsTemplate {
        sections: vec![
            section("Scripts", data.scripts),
            section("Stylesheets", data.stylesheets),
            section("HTML Templates", data.html_templates),
        ],
        cassette: data.cassette,
        action_path: DIAGNOSTICS_PATH,
        rebuild_action: REBUILD_CACHE_ACTION,
    };
    (StatusCode::OK, template).into_response()
}

#[derive(Debug, Deserialize)]
pub struct DiagnosticsForm {
    #[serde(default)]
    pub action: Option<String>,
}

/// Administrative actions; always answers 200 once access is granted
#[tracing::instrument(skip(state, headers, form))]
pub async fn post_handler(
    State(state): State<ServiceState>,
    headers: HeaderMap,
    form: Option<Form<DiagnosticsForm>>,
) -> Response {
    if !can_access(&headers) {
        return StatusCode::NOT_FOUND.into_response();
    }

    let action = form.and_then(|Form(form)| form.action);
    if action.as_deref() == Some(REBUILD_CACHE_ACTION) {
        tracing::info!("Rebuilding bundle cache");
        let rebuilder = state.rebuilder().clone();
        match tokio::task::spawn_blocking(move || rebuilder.rebuild_cache()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("Bundle cache rebuild failed: {}", e),
            Err(e) => tracing::error!("Bundle cache rebuild task failed: {}", e),
        }
    }

    StatusCode::OK.into_response()
}

/// Raw source assets, only available in debug mode
#[tracing::instrument(skip(state))]
pub async fn asset_handler(
    State(state): State<ServiceState>,
    Path(path): Path<String>,
) -> Response {
    let settings = state.settings();
    let Some(source_dir) = settings.source_dir.as_ref().filter(|_| settings.debug) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let relative = std::path::Path::new(&path);
    if !relative
        .components()
        .all(|c| matches!(c, std::path::Component::Normal(_)))
    {
        return StatusCode::NOT_FOUND.into_response();
    }

    let full_path = source_dir.join(relative);
    match tokio::fs::File::open(&full_path).await {
        Ok(file) => {
            let mime = mime_guess::from_path(&full_path).first_or_octet_stream();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime.to_string())],
                axum::body::Body::from_stream(ReaderStream::new(file)),
            )
                .into_response()
        }
        Err(e) => {
            tracing::info!(path = %full_path.display(), "Asset not found: {}", e);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}
