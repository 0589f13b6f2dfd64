use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Sex;

/// A clothing item that can appear in looks and in users' wardrobes
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct WardrobeItem {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub image: String,
    #[sqlx(try_from = "String")]
    pub sex: Sex,
    #[sqlx(rename = "wardrobe_category_id")]
    pub category_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_with_any_sex_decodes_as_unisex() {
        let item: WardrobeItem = serde_json::from_value(serde_json::json!({
            "id": 5,
            "name": "White sneakers",
            "slug": "white-sneakers",
            "image": "items/white-sneakers.jpg",
            "sex": "any",
            "category_id": 3
        }))
        .unwrap();

        assert_eq!(item.sex, Sex::Unisex);
        assert_eq!(serde_json::to_value(&item).unwrap()["sex"], "unisex");
    }
}
