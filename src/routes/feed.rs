use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::{request_id::RequestId, CurrentUser},
    models::{Category, Look, Topic},
    routes::AppState,
};

const FEED_TOPICS: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    #[serde(default)]
    pub page: u32,
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub page: u32,
    pub looks: Vec<Look>,
    pub categories: Vec<Category>,
    pub topics: Vec<Topic>,
    pub latest_app_version: String,
}

#[derive(Debug, Serialize)]
pub struct CategoryFeedResponse {
    pub page: u32,
    pub category: Category,
    pub looks: Vec<Look>,
}

/// Handler for the personalized feed
pub async fn feed(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<FeedQuery>,
) -> AppResult<Json<FeedResponse>> {
    tracing::info!(
        request_id = %request_id,
        user_id = user.id,
        page = params.page,
        "Processing feed request"
    );

    let looks = state.feed.feed(&user, params.page).await?;
    let categories = state.catalog.categories().await?;
    let topics = state.catalog.random_topics(FEED_TOPICS).await?;

    Ok(Json(FeedResponse {
        page: params.page,
        looks,
        categories,
        topics,
        latest_app_version: state.latest_app_version.clone(),
    }))
}

/// Handler for a single category's looks
pub async fn feed_by_category(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
    Query(params): Query<FeedQuery>,
) -> AppResult<Json<CategoryFeedResponse>> {
    let category = state
        .catalog
        .find_category(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category '{}' not found", slug)))?;

    let looks = state
        .feed
        .by_category(&user, category.id, params.page)
        .await?;

    Ok(Json(CategoryFeedResponse {
        page: params.page,
        category,
        looks,
    }))
}
