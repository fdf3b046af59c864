//! Health check endpoints.
//!
//! `/health` is liveness only. `/ready` asks a [`ReadinessProbe`] (normally
//! the store) whether requests can be served.

use axum::{http::StatusCode, Json};
use seatbook_core::BoxFuture;
use serde::Serialize;

/// Dependency check behind the readiness endpoint.
pub trait ReadinessProbe: Send + Sync {
    /// Name reported in the response, e.g. `"postgres"`.
    fn component(&self) -> &'static str;

    /// Resolve to `Err(reason)` when the dependency cannot serve requests.
    fn check(&self) -> BoxFuture<'_, Result<(), String>>;
}

/// Liveness response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"`
    pub status: &'static str,
    /// Service version
    pub version: &'static str,
}

/// Readiness response.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    /// Overall readiness
    pub ready: bool,
    /// Checked dependency
    pub component: &'static str,
    /// Failure reason, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Liveness check.
///
/// ```text
/// GET /health
/// {"status":"ok","version":"0.1.0"}
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

/// Readiness check against `probe`.
///
/// - 200 OK: the dependency answered
/// - 503 Service Unavailable: it did not
pub async fn readiness_check(probe: &dyn ReadinessProbe) -> (StatusCode, Json<ReadinessResponse>) {
    match probe.check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                ready: true,
                component: probe.component(),
                message: None,
            }),
        ),
        Err(reason) => {
            tracing::warn!(component = probe.component(), %reason, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    ready: false,
                    component: probe.component(),
                    message: Some(reason),
                }),
            )
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticProbe(Result<(), String>);

    impl ReadinessProbe for StaticProbe {
        fn component(&self) -> &'static str {
            "static"
        }

        fn check(&self) -> BoxFuture<'_, Result<(), String>> {
            Box::pin(std::future::ready(self.0.clone()))
        }
    }

    #[tokio::test]
    async fn test_simple_health_check() {
        let (status, Json(body)) = health_check().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
    }

    #[tokio::test]
    async fn test_ready_probe() {
        let (status, Json(body)) = readiness_check(&StaticProbe(Ok(()))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.ready);
        assert!(body.message.is_none());
    }

    #[tokio::test]
    async fn test_failing_probe_is_unavailable() {
        let probe = StaticProbe(Err("connection refused".to_string()));
        let (status, Json(body)) = readiness_check(&probe).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.message.as_deref(), Some("connection refused"));
    }
}
