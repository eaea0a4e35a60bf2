//! Router construction and server host for the API.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::{HeaderName, Method, Request, header::CONTENT_TYPE},
    middleware,
    routing::get,
};
use berth_labels::LabelService;
use berth_telemetry::{Metrics, REQUEST_ID_HEADER, build_sha};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{Span, info};

use crate::error::{ApiServerError, ApiServerResult};
use crate::http::auth::resolve_credential;
use crate::http::constants::{HEADER_API_KEY, HEADER_TOTAL_COUNT};
use crate::http::health::{health, metrics};
use crate::http::labels::{
    create_label, delete_label, get_label, list_label_resources, list_labels, update_label,
};
use crate::http::telemetry::HttpMetricsLayer;
use crate::state::ApiState;

/// Axum router wrapper that hosts the Berth label API.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Wire the router, middleware stack and shared state.
    #[must_use]
    pub fn new(labels: LabelService, telemetry: Metrics) -> Self {
        let state = Arc::new(ApiState::new(labels, telemetry.clone()));
        let cors_layer = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([CONTENT_TYPE, HeaderName::from_static(HEADER_API_KEY)])
            .expose_headers([HeaderName::from_static(HEADER_TOTAL_COUNT)]);
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                tracing::info_span!(
                    "http.request",
                    method = %request.method(),
                    route = %request.uri().path(),
                    request_id = %request_id,
                    build_sha = %build_sha(),
                    status_code = tracing::field::Empty,
                    latency_ms = tracing::field::Empty
                )
            })
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &Span| {
                    span.record("status_code", response.status().as_u16());
                    let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
                    span.record("latency_ms", latency_ms);
                },
            );
        let layered = ServiceBuilder::new()
            .layer(berth_telemetry::propagate_request_id_layer())
            .layer(berth_telemetry::set_request_id_layer())
            .layer(trace_layer)
            .layer(HttpMetricsLayer::new(telemetry));

        let router = Self::public_routes()
            .merge(Self::label_routes())
            .layer(cors_layer)
            .route_layer(layered)
            .with_state(state);

        Self { router }
    }

    fn public_routes() -> Router<Arc<ApiState>> {
        Router::new()
            .route("/health", get(health))
            .route("/metrics", get(metrics))
    }

    fn label_routes() -> Router<Arc<ApiState>> {
        Router::new()
            .route("/api/labels", get(list_labels).post(create_label))
            .route(
                "/api/labels/{id}",
                get(get_label).put(update_label).delete(delete_label),
            )
            .route("/api/labels/{id}/resources", get(list_label_resources))
            .route_layer(middleware::from_fn(resolve_credential))
    }

    /// Router with every layer applied, for in-process callers.
    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve the API on `addr` until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener fails to bind or the server terminates unexpectedly.
    pub async fn serve<F>(self, addr: SocketAddr, shutdown: F) -> ApiServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ApiServerError::Bind { addr, source })?;
        info!(addr = %addr, "api listener bound");
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|source| ApiServerError::Serve { source })
    }
}
