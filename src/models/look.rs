use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::{Sex, WardrobeItem};

/// A curated outfit shown in the feed
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct Look {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker; deleted looks are never served
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
    pub name: String,
    pub slug: String,
    pub image: String,
    pub desc: String,
    #[sqlx(try_from = "String")]
    pub sex: Sex,
    /// Constituent wardrobe items, loaded only for the detail view
    #[sqlx(skip)]
    pub items: Vec<WardrobeItem>,
    /// Set when the look reached the feed through the user's wardrobe.
    /// Presentation only, never persisted.
    #[sqlx(skip)]
    pub is_from_wardrobe: bool,
}

/// Single look with the requesting user's relation to it
#[derive(Debug, Clone, Serialize)]
pub struct LookDetails {
    pub look: Look,
    pub is_liked: bool,
    pub is_disliked: bool,
    pub is_saved: bool,
    pub similar: Vec<Look>,
}
