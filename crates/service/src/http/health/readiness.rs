use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tokio::time::timeout;

use common::registry::BundleRegistry;

use crate::ServiceState;

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Ready once the bundle registry can be read
#[tracing::instrument(skip(state))]
pub async fn handler(State(state): State<ServiceState>) -> Response {
    let registry = state.registry().clone();
    let check = tokio::task::spawn_blocking(move || registry_ready(&registry));

    match timeout(HEALTH_CHECK_TIMEOUT, check).await {
        Ok(Ok(Ok(bundles))) => {
            let msg = serde_json::json!({"status": "ok", "bundles": bundles});
            (StatusCode::OK, Json(msg)).into_response()
        }
        Ok(Ok(Err(message))) => failure(&message),
        Ok(Err(_)) => failure("health check task failed"),
        Err(_) => failure("health check timed out"),
    }
}

fn registry_ready(registry: &BundleRegistry) -> Result<usize, String> {
    registry
        .read()
        .map(|guard| guard.len())
        .map_err(|e| e.to_string())
}

fn failure(message: &str) -> Response {
    let msg = serde_json::json!({
        "status": "failure",
        "message": message
    });
    (StatusCode::SERVICE_UNAVAILABLE, Json(msg)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_ready() {
        let registry = BundleRegistry::new().with_lock_timeout(Duration::from_millis(10));
        assert_eq!(registry_ready(&registry), Ok(0));

        let _writer = registry.write().unwrap();
        assert!(registry_ready(&registry).is_err());
    }
}
