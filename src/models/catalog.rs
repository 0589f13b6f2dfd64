use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Feed category shown as a filter chip above the looks
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Editorial topic grouping several looks
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Topic {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub desc: String,
    pub image: String,
}
