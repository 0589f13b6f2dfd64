use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    db::LookRelation,
    error::{AppError, AppResult},
    middleware::CurrentUser,
    models::{Look, LookDetails},
    routes::AppState,
    services::{interactions, recommender::FeedbackKind},
};

const SIMILAR_LOOKS: i64 = 8;

/// Loads a live look or fails with 404
pub(crate) async fn find_look(state: &AppState, slug: &str) -> AppResult<Look> {
    state
        .looks
        .find_by_slug(slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Look '{}' not found", slug)))
}

/// Handler for a single look with the user's relation to it
pub async fn get_look(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
) -> AppResult<Json<LookDetails>> {
    let mut look = find_look(&state, &slug).await?;
    look.items = state.looks.items_for_look(look.id).await?;

    let is_liked = state
        .looks
        .has_relation(LookRelation::Liked, user.id, look.id)
        .await?;
    let is_disliked = state
        .looks
        .has_relation(LookRelation::Disliked, user.id, look.id)
        .await?;
    let is_saved = state
        .looks
        .has_relation(LookRelation::Saved, user.id, look.id)
        .await?;

    let mut similar = state.looks.random_by_sex(user.sex, SIMILAR_LOOKS).await?;
    similar.retain(|l| l.id != look.id);

    interactions::record(state.recommender.as_ref(), FeedbackKind::Read, &user, &look.slug).await;

    Ok(Json(LookDetails {
        look,
        is_liked,
        is_disliked,
        is_saved,
        similar,
    }))
}

/// Handler listing the looks the user liked
pub async fn liked(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<Look>>> {
    let looks = state
        .looks
        .related_looks(LookRelation::Liked, user.id)
        .await?;
    Ok(Json(looks))
}

/// Handler for liking a look; clears an earlier dislike signal
pub async fn like(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
) -> AppResult<Json<Value>> {
    let look = find_look(&state, &slug).await?;
    state
        .looks
        .add_relation(LookRelation::Liked, user.id, look.id)
        .await?;
    state
        .looks
        .remove_relation(LookRelation::Disliked, user.id, look.id)
        .await?;

    let recommender = state.recommender.as_ref();
    interactions::record(recommender, FeedbackKind::Like, &user, &look.slug).await;
    interactions::retract(recommender, FeedbackKind::Dislike, &user, &look.slug).await;

    tracing::info!(user_id = user.id, look = %look.slug, "Look liked");

    Ok(Json(json!({ "success": true })))
}

/// Handler for removing a like
pub async fn unlike(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
) -> AppResult<Json<Value>> {
    let look = find_look(&state, &slug).await?;
    state
        .looks
        .remove_relation(LookRelation::Liked, user.id, look.id)
        .await?;

    interactions::retract(state.recommender.as_ref(), FeedbackKind::Like, &user, &look.slug).await;

    Ok(Json(json!({ "success": true })))
}

/// Handler for disliking a look; clears an earlier like
pub async fn dislike(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
) -> AppResult<Json<Value>> {
    let look = find_look(&state, &slug).await?;
    state
        .looks
        .add_relation(LookRelation::Disliked, user.id, look.id)
        .await?;
    state
        .looks
        .remove_relation(LookRelation::Liked, user.id, look.id)
        .await?;

    let recommender = state.recommender.as_ref();
    interactions::record(recommender, FeedbackKind::Dislike, &user, &look.slug).await;
    interactions::retract(recommender, FeedbackKind::Like, &user, &look.slug).await;

    tracing::info!(user_id = user.id, look = %look.slug, "Look disliked");

    Ok(Json(json!({ "success": true })))
}

/// Handler for removing a dislike
pub async fn undislike(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
) -> AppResult<Json<Value>> {
    let look = find_look(&state, &slug).await?;
    state
        .looks
        .remove_relation(LookRelation::Disliked, user.id, look.id)
        .await?;

    interactions::retract(
        state.recommender.as_ref(),
        FeedbackKind::Dislike,
        &user,
        &look.slug,
    )
    .await;

    Ok(Json(json!({ "success": true })))
}
