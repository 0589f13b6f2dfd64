//! Recommendation service abstraction
//!
//! The feed asks an external collaborative-filtering engine for ranked look
//! slugs, and user interactions are reported back to it as feedback so the
//! engine can learn. `GorseClient` is the production implementation.
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Display;

use crate::error::AppResult;

pub mod gorse;

pub use gorse::GorseClient;

/// Kind of user interaction reported to the recommender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Read,
    Like,
    Dislike,
    /// Look saved to the user's collection
    Star,
}

impl FeedbackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackKind::Read => "read",
            FeedbackKind::Like => "like",
            FeedbackKind::Dislike => "dislike",
            FeedbackKind::Star => "star",
        }
    }
}

impl Display for FeedbackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One feedback record as the recommender expects it on the wire
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feedback {
    #[serde(rename = "FeedbackType")]
    pub kind: FeedbackKind,
    #[serde(rename = "UserId")]
    pub user_id: String,
    #[serde(rename = "ItemId")]
    pub item_id: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl Feedback {
    /// Feedback stamped with the current time
    pub fn now(kind: FeedbackKind, user_id: impl Into<String>, item_id: impl Into<String>) -> Self {
        Self {
            kind,
            user_id: user_id.into(),
            item_id: item_id.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Trait for recommendation engines
///
/// An empty recommendation list is a valid answer meaning "nothing
/// personalized for this user yet". Errors are reserved for transport and
/// service failures.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Recommender: Send + Sync {
    /// Ranked item slugs for a user within a category, paginated
    async fn recommend_for_user_and_category(
        &self,
        user_id: &str,
        category: &str,
        limit: u32,
        offset: u32,
    ) -> AppResult<Vec<String>>;

    /// Record one or more interactions
    async fn insert_feedback(&self, feedback: &[Feedback]) -> AppResult<()>;

    /// Retract a previously recorded interaction
    async fn delete_feedback(
        &self,
        kind: FeedbackKind,
        user_id: &str,
        item_id: &str,
    ) -> AppResult<()>;
}
