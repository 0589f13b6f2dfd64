use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    db::{CatalogStore, LookStore, UserStore},
    middleware::{make_span_with_request_id, request_id_middleware},
    services::{feed::FeedComposer, recommender::Recommender},
};

pub mod feed;
pub mod looks;
pub mod saved;

/// Shared handles every handler works with
///
/// Built once at startup; all collaborators are safe for concurrent use.
pub struct AppState {
    pub feed: FeedComposer,
    pub looks: Arc<dyn LookStore>,
    pub users: Arc<dyn UserStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub recommender: Arc<dyn Recommender>,
    pub latest_app_version: String,
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/feed", get(feed::feed))
        .route("/feed/:category", get(feed::feed_by_category))
        .route("/looks/:slug", get(looks::get_look))
        .route("/looks/:slug/like", post(looks::like).delete(looks::unlike))
        .route(
            "/looks/:slug/dislike",
            post(looks::dislike).delete(looks::undislike),
        )
        .route("/liked", get(looks::liked))
        .route("/saved", get(saved::list))
        .route("/saved/:slug", post(saved::save).delete(saved::unsave))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
