//! Accounts is a small customer and account management API.

#![forbid(unsafe_code)]
pub mod account;
pub mod config;
pub mod database;
pub mod error;
pub mod model;
mod router;
pub mod telemetry;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::routing::get;
use axum::{Router, middleware as AxumMiddleware};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer,
};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

use account::{AccountRepository, AccountService, MemoryAccountRepository};
pub use error::ServerError;

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    app: Router,
    method: Method,
    path: &str,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use axum::http::header;
    use tower::util::ServiceExt;

    app.oneshot(
        Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// State backed by an empty in-memory repository.
#[cfg(test)]
pub fn test_state() -> (AppState, Arc<MemoryAccountRepository>) {
    let repo = Arc::new(MemoryAccountRepository::new());
    let mut config = config::Configuration::default();
    config.contact_info = config::ContactInfo {
        message: "Welcome to the accounts API".into(),
        contact_details: [("email".to_owned(), "support@accounts.local".to_owned())]
            .into_iter()
            .collect(),
        on_call_support: vec!["(555) 555-1234".into()],
    };

    let state = AppState {
        config: Arc::new(config),
        accounts: AccountService::new(repo.clone()),
        metrics: None,
    };
    (state, repo)
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub accounts: AccountService,
    pub metrics: Option<PrometheusHandle>,
}

/// Prometheus exposition of recorded metrics.
async fn render_metrics(State(state): State<AppState>) -> (StatusCode, String) {
    match state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, String::default()),
    }
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Tag every request with an `x-request-id`.
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        // Set a timeout.
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, Duration::from_secs(10)))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
                .allow_headers(Any),
        );

    let api = router::accounts::router()
        // `GET /build-info` goes to `build_info`.
        .route("/build-info", get(router::info::build_info))
        // `GET /runtime-version` goes to `runtime_version`.
        .route("/runtime-version", get(router::info::runtime_version))
        // `GET /contact-info` goes to `contact_info`.
        .route("/contact-info", get(router::info::contact_info));

    Router::new()
        .nest("/api", api)
        // `GET /metrics` goes to `render_metrics`.
        .route("/metrics", get(render_metrics))
        .with_state(state)
        .route_layer(AxumMiddleware::from_fn(telemetry::track))
        .layer(middleware)
}

/// Initialize the application state.
pub async fn initialize_state(
    config: Arc<config::Configuration>,
    metrics: Option<PrometheusHandle>,
) -> Result<AppState, Box<dyn std::error::Error>> {
    let repo: Arc<dyn AccountRepository> = match config.postgres {
        Some(ref postgres) => {
            let db = database::Database::from_config(postgres).await?;

            // execute migrations scripts on start.
            db.migrate().await?;

            Arc::new(account::PgAccountRepository::new(db.postgres))
        },
        None => {
            tracing::warn!(
                "missing `postgres` entry on configuration file, records are kept in memory"
            );
            Arc::new(MemoryAccountRepository::new())
        },
    };

    Ok(AppState {
        config,
        accounts: AccountService::new(repo),
        metrics,
    })
}
