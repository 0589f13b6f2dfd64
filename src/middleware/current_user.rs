use axum::{extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

use crate::{error::AppError, models::UserProfile, routes::AppState};

/// Header set by the authenticating gateway in front of this service
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated user's profile
///
/// Rejects with 401 when the header is missing, malformed, or names a user
/// that does not exist.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserProfile);

fn parse_user_id(parts: &Parts) -> Option<i64> {
    parts
        .headers
        .get(USER_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
}

#[async_trait::async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parse_user_id(parts).ok_or_else(|| {
            AppError::Unauthorized(format!("Missing or invalid {} header", USER_ID_HEADER))
        })?;

        let user = state
            .users
            .find_profile(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Unknown user".to_string()))?;

        tracing::Span::current().record("user_id", user.id);

        Ok(CurrentUser(user))
    }
}
