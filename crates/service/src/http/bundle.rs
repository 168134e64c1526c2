use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio_util::io::ReaderStream;

use common::bundle::{BundleKind, BundleStream};
use common::path::decode_request_path;
use common::request::{BundleOutcome, BundleRequestError, BundleRequestHandler};

use crate::ServiceState;

/// One `GET {prefix}/*path` route per bundle kind
pub fn router(state: ServiceState) -> Router<ServiceState> {
    BundleKind::ALL
        .into_iter()
        .fold(Router::new(), |router, kind| {
            router.route(
                &format!("{}/*path", kind.prefix()),
                get(move |state: State<ServiceState>, uri: Uri, headers: HeaderMap| {
                    handler(kind, state, uri, headers)
                }),
            )
        })
        .with_state(state)
}

#[tracing::instrument(skip(state, headers), fields(path = %uri.path()))]
pub async fn handler(
    kind: BundleKind,
    State(state): State<ServiceState>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, BundleError> {
    let bundles = BundleRequestHandler::new(kind, state.registry().clone());
    let raw_path = decode_request_path(uri.path()).into_owned();
    let if_none_match = headers
        .get(header::IF_NONE_MATCH)
        .map(|value| value.as_bytes().to_vec());

    // lock waits and file opens block, keep them off the async workers
    let outcome =
        tokio::task::spawn_blocking(move || bundles.handle(&raw_path, if_none_match.as_deref()))
            .await??;

    Ok(outcome_response(outcome))
}

pub fn outcome_response(outcome: BundleOutcome) -> Response {
    match outcome {
        BundleOutcome::NotFound { .. } => StatusCode::NOT_FOUND.into_response(),
        BundleOutcome::NotModified { content_type } => (
            StatusCode::NOT_MODIFIED,
            [(header::CONTENT_TYPE, content_type)],
            Body::empty(),
        )
            .into_response(),
        BundleOutcome::Content {
            content_type,
            validator,
            stream,
        } => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, content_type),
                (header::ETAG, validator.to_string()),
            ],
            stream_body(stream),
        )
            .into_response(),
    }
}

fn stream_body(stream: BundleStream) -> Body {
    match stream {
        BundleStream::Memory(cursor) => Body::from(cursor.into_inner()),
        BundleStream::File(file) => {
            Body::from_stream(ReaderStream::new(tokio::fs::File::from_std(file)))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error(transparent)]
    Request(#[from] BundleRequestError),
    #[error("bundle request task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IntoResponse for BundleError {
    fn into_response(self) -> Response {
        tracing::error!("Failed to serve bundle: {}", self);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Unexpected error".to_string(),
        )
            .into_response()
    }
}
