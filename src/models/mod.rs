use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod catalog;
pub mod look;
pub mod user;
pub mod wardrobe;

pub use catalog::{Category, Topic};
pub use look::{Look, LookDetails};
pub use user::UserProfile;
pub use wardrobe::WardrobeItem;

/// Audience a look, wardrobe item or user belongs to
///
/// Stored as lowercase text. For users it doubles as the recommendation
/// category passed to the recommender. Wardrobe items store their unisex
/// value as `any`, which reads as [`Sex::Unisex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    #[serde(alias = "any")]
    Unisex,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
            Sex::Unisex => "unisex",
        }
    }
}

impl Display for Sex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown sex value: {0:?}")]
pub struct ParseSexError(pub String);

impl TryFrom<String> for Sex {
    type Error = ParseSexError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "male" => Ok(Sex::Male),
            "female" => Ok(Sex::Female),
            "unisex" | "any" => Ok(Sex::Unisex),
            _ => Err(ParseSexError(value)),
        }
    }
}
