use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    db::LookRelation,
    error::AppResult,
    middleware::CurrentUser,
    models::Look,
    routes::{looks::find_look, AppState},
    services::{interactions, recommender::FeedbackKind},
};

/// Handler listing the user's saved looks
pub async fn list(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<Look>>> {
    let looks = state
        .looks
        .related_looks(LookRelation::Saved, user.id)
        .await?;
    Ok(Json(looks))
}

/// Handler saving a look; saved looks drop out of the feed
pub async fn save(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
) -> AppResult<Json<Value>> {
    let look = find_look(&state, &slug).await?;
    state
        .looks
        .add_relation(LookRelation::Saved, user.id, look.id)
        .await?;

    interactions::record(state.recommender.as_ref(), FeedbackKind::Star, &user, &look.slug).await;

    Ok(Json(json!({ "success": true })))
}

/// Handler removing a look from the saved set
pub async fn unsave(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
) -> AppResult<Json<Value>> {
    let look = find_look(&state, &slug).await?;
    state
        .looks
        .remove_relation(LookRelation::Saved, user.id, look.id)
        .await?;

    interactions::retract(state.recommender.as_ref(), FeedbackKind::Star, &user, &look.slug).await;

    Ok(Json(json!({ "success": true })))
}
