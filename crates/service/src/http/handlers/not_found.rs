use askama::Template;
use askama_axum::IntoResponse;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::Response;
use axum::Json;

#[derive(Template)]
#[template(path = "pages/not_found.html")]
struct NotFoundTemplate {}

/// Fallback for paths outside every bundle prefix and the diagnostics page
pub async fn not_found_handler(uri: Uri, headers: HeaderMap) -> Response {
    tracing::debug!(path = %uri.path(), "No route matched");
    let accept = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok());

    match accept {
        Some(accept_str) if accept_str.contains("application/json") => {
            let err_msg = serde_json::json!({"msg": "not found", "path": uri.path()});
            (StatusCode::NOT_FOUND, Json(err_msg)).into_response()
        }
        Some(accept_str) if accept_str.contains("text/html") => {
            (StatusCode::NOT_FOUND, NotFoundTemplate {}).into_response()
        }
        _ => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/plain")],
            "not found",
        )
            .into_response(),
    }
}
