use serde::Serialize;
use sqlx::FromRow;

use super::Sex;

/// The requesting user, as far as feed composition is concerned
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Hard filter on every served look and the recommender category
    #[sqlx(try_from = "String")]
    pub sex: Sex,
}

impl UserProfile {
    /// Identifier in the form the recommender knows the user by
    pub fn recommender_id(&self) -> String {
        self.id.to_string()
    }
}
