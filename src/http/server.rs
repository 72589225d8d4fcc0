//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the resource and vote handlers
//! - Wire up middleware (CORS, timeout, body limit, request id, tracing, metrics)
//! - Apply configuration updates while serving
//! - Flush the vote store once serving stops

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    error_handling::HandleErrorLayer,
    extract::{DefaultBodyLimit, MatchedPath, Request},
    http::{HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    BoxError, Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::{timeout::error::Elapsed, timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::http::response::ErrorBody;
use crate::http::{resources, votes};
use crate::infra::{CloudInventory, InfrastructureAggregator};
use crate::observability::metrics;
use crate::voting::VoteService;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ArcSwap<AppConfig>>,
    pub votes: VoteService,
    pub inventory: Arc<dyn CloudInventory>,
}

impl AppState {
    /// An aggregator bound to the configuration current at call time.
    pub fn aggregator(&self) -> InfrastructureAggregator {
        InfrastructureAggregator::new(self.config.load_full(), self.inventory.clone())
    }
}

/// HTTP server for the dashboard API.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    pub fn new(config: AppConfig, inventory: Arc<dyn CloudInventory>, votes: VoteService) -> Self {
        let state = AppState {
            config: Arc::new(ArcSwap::from_pointee(config)),
            votes,
            inventory,
        };
        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Oversized bodies surface as JSON rejections inside the handlers and
    /// timeouts go through `handle_layer_error`, so neither escapes as a
    /// bare 408 or 413.
    fn build_router(state: AppState) -> Router {
        let (timeout, body_limit) = {
            let config = state.config.load();
            (
                Duration::from_secs(config.listener.request_timeout_secs),
                config.listener.max_body_bytes,
            )
        };
        let cors = cors_layer(&state.config);

        let api = Router::new()
            .route("/api/resources/status", get(resources::status))
            .route("/api/resources/connection-status", get(resources::connection_status))
            .route("/api/resources/ec2", get(resources::ec2))
            .route("/api/resources/alb", get(resources::alb))
            .route("/api/resources/rds", get(resources::rds))
            .route("/api/resources/s3", get(resources::s3))
            .route("/api/resources/cloudfront", get(resources::cloudfront))
            .route("/api/resources/vpc", get(resources::vpc))
            .route("/api/resources/health", get(resources::health))
            .route("/api/resources/deployment-progress", get(resources::deployment_progress))
            .route("/api/votes", get(votes::list_polls).post(votes::create_poll))
            .route("/api/votes/health", get(votes::health))
            .route("/api/votes/active", get(votes::list_active_polls))
            .route("/api/votes/{id}", get(votes::get_poll))
            .route("/api/votes/{id}/deactivate", put(votes::deactivate_poll))
            .route("/api/votes/{id}/options/{option_id}", post(votes::cast_vote))
            .route_layer(middleware::from_fn(track_metrics))
            .layer(DefaultBodyLimit::max(body_limit));

        api.fallback(not_found)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(HandleErrorLayer::new(handle_layer_error))
                    .layer(TimeoutLayer::new(timeout)),
            )
            .layer(cors)
            .layer(propagate_request_id_layer())
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request.headers().request_id(),
                    )
                }),
            )
            .layer(set_request_id_layer())
    }

    /// The fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serve until `shutdown` fires. Configuration received on
    /// `config_updates` replaces the current one for subsequent requests;
    /// the listener itself is not rebound.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<AppConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            demo = self.state.config.load().demo.enabled,
            "HTTP server starting"
        );

        let live_config = self.state.config.clone();
        let reloader = tokio::spawn(async move {
            while let Some(update) = config_updates.recv().await {
                tracing::info!(demo = update.demo.enabled, "Applying configuration update");
                live_config.store(Arc::new(update));
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        if let Err(e) = self.state.votes.flush() {
            tracing::error!(error = %e, "Failed to flush polls on shutdown");
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// CORS driven by the live configuration, so reloaded origins apply
/// without rebuilding the router.
fn cors_layer(config: &Arc<ArcSwap<AppConfig>>) -> CorsLayer {
    let current = config.load();
    let methods: Vec<Method> = current
        .cors
        .allowed_methods
        .iter()
        .filter_map(|m| Method::from_bytes(m.as_bytes()).ok())
        .collect();

    let live = config.clone();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &axum::http::request::Parts| {
                let Ok(origin) = origin.to_str() else {
                    return false;
                };
                live.load()
                    .cors
                    .allowed_origins
                    .iter()
                    .any(|pattern| origin_matches(pattern, origin))
            },
        ))
        .allow_methods(methods)
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(current.cors.allow_credentials)
}

/// Exact match, or a single `*` wildcard such as `https://*.cloudfront.net`.
pub fn origin_matches(pattern: &str, origin: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == origin,
        Some((prefix, suffix)) => {
            origin.len() >= prefix.len() + suffix.len()
                && origin.starts_with(prefix)
                && origin.ends_with(suffix)
        }
    }
}

async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());
    let method = request.method().to_string();
    let request_id = request.headers().request_id().to_owned();

    let response = next.run(request).await;
    let status = response.status().as_u16();

    metrics::record_request(&method, &route, status, start);
    tracing::debug!(
        request_id = %request_id,
        method = %method,
        route = %route,
        status,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );
    response
}

async fn not_found(request: Request) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody::new(
            "not_found",
            format!("no route for {} {}", request.method(), request.uri().path()),
        )),
    )
}

/// Errors raised by the tower stack itself. Answered like any other
/// expected failure: 200 with an error body.
async fn handle_layer_error(err: BoxError) -> Response {
    let body = if err.is::<Elapsed>() {
        tracing::warn!("Request timed out");
        ErrorBody::new("timeout", "request timed out")
    } else {
        tracing::error!(error = %err, "Unhandled middleware error");
        ErrorBody::new("internal", err.to_string())
    };
    (StatusCode::OK, Json(body)).into_response()
}
