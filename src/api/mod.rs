use axum::{
    Router,
    http::{HeaderName, HeaderValue, header},
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::clients::TranscriptSource;
use crate::config::Config;
use crate::services::{AuthService, ReportService};
use crate::state::SharedState;

pub mod auth;
mod error;
mod observability;
mod operations;
pub mod reports;
mod rooms;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn reports(&self) -> &Arc<ReportService> {
        &self.shared.report_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

/// Builds state around a caller-supplied transcript source instead of the
/// hosted conversational-AI service.
pub async fn create_app_state_with_transcripts(
    config: Config,
    transcripts: Arc<dyn TranscriptSource>,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::with_transcripts(config, transcripts).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().server.cors_allowed_origins.clone();

    let protected_routes = create_protected_router(state.clone());

    let api_router = Router::new()
        .merge(protected_routes)
        .with_state(state.clone());

    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/health", get(observability::health))
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .merge(public_routes)
        // Inside TraceLayer so the auth middleware records into this span
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(
            cors_layer
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers([
                    header::CONTENT_DISPOSITION,
                    HeaderName::from_static(reports::SKIPPED_EVENTS_HEADER),
                ]),
        )
        .layer(TraceLayer::new_for_http())
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(auth::get_current_user))
        .route("/rooms", get(rooms::list_rooms))
        .route("/userId", post(operations::get_user_id))
        .route("/createOperation", post(operations::create_operation))
        .route("/operations/{id}", get(operations::get_operation))
        .route("/operations/{id}/events", get(operations::list_events))
        .route("/sendNotes", post(operations::send_notes))
        .route("/lastOperationId", get(operations::last_operation_id))
        .route("/downloadReport", post(reports::download_report))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
