use axum::{extract::State, http::Method, middleware, routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    db::RecommendationStore,
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
};

pub mod history;
pub mod recommendations;
pub mod stats;

/// Shared state of the serving API
pub struct AppState {
    pub store: Arc<dyn RecommendationStore>,
    /// Window used by `/history` when the client does not pass `days`
    pub history_days: u32,
}

impl AppState {
    pub fn new(store: Arc<dyn RecommendationStore>, history_days: u32) -> Self {
        Self {
            store,
            history_days,
        }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::new()
        .route("/health", get(health_check))
        .route(
            "/recommendations/:advertiser_id/:model",
            get(recommendations::get_recommendations),
        )
        .route("/history/:advertiser_id", get(history::get_history))
        .route("/stats", get(stats::get_stats))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let db_status = match state.store.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "Store health check failed");
            "error"
        }
    };

    Json(json!({ "status": "ok", "db_status": db_status }))
}
