use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    db::{AffinityQuery, LookStore},
    error::{AppError, AppResult},
    models::{Look, UserProfile},
    services::recommender::Recommender,
};

/// Looks requested from the recommender per page
pub const RECOMMENDED_PER_PAGE: u32 = 15;
/// Wardrobe looks mixed into a page that has recommendations
pub const WARDROBE_PER_PAGE: u32 = 5;
/// Wardrobe looks per page when the recommender has nothing
pub const FALLBACK_PER_PAGE: u32 = 20;
/// Looks per page of a single category
pub const CATEGORY_PER_PAGE: u32 = 20;

/// Composes the personalized feed
///
/// Each page blends recommender output with looks sharing items with the
/// user's wardrobe, so every page carries some wardrobe-relevant looks even
/// when the recommender is confident. When the recommender has nothing for
/// the user, the page is filled from the wardrobe alone.
#[derive(Clone)]
pub struct FeedComposer {
    recommender: Arc<dyn Recommender>,
    looks: Arc<dyn LookStore>,
}

impl FeedComposer {
    pub fn new(recommender: Arc<dyn Recommender>, looks: Arc<dyn LookStore>) -> Self {
        Self { recommender, looks }
    }

    /// Builds one feed page in random order
    pub async fn feed(&self, user: &UserProfile, page: u32) -> AppResult<Vec<Look>> {
        let mut rng = StdRng::from_entropy();
        self.feed_with_rng(user, page, &mut rng).await
    }

    /// Same as [`FeedComposer::feed`] with a caller-supplied source of randomness
    pub async fn feed_with_rng<R>(
        &self,
        user: &UserProfile,
        page: u32,
        rng: &mut R,
    ) -> AppResult<Vec<Look>>
    where
        R: Rng + Send + ?Sized,
    {
        if user.id == 0 {
            return Err(AppError::InvalidInput(
                "Feed requires an identified user".to_string(),
            ));
        }

        let slugs = self
            .recommender
            .recommend_for_user_and_category(
                &user.recommender_id(),
                user.sex.as_str(),
                RECOMMENDED_PER_PAGE,
                page_offset(RECOMMENDED_PER_PAGE, page)?,
            )
            .await?;

        let recommended = if slugs.is_empty() {
            tracing::debug!(user_id = user.id, page, "Recommender returned nothing, falling back to wardrobe");
            Vec::new()
        } else {
            self.looks.find_by_slugs(&slugs, user).await?
        };

        let query = affinity_query(user, page, slugs)?;
        let mut from_wardrobe = self.looks.wardrobe_affinity(&query).await?;
        for look in &mut from_wardrobe {
            look.is_from_wardrobe = true;
        }

        let recommended_count = recommended.len();
        let wardrobe_count = from_wardrobe.len();

        let mut looks = merge_unique(recommended, from_wardrobe);
        looks.shuffle(rng);

        tracing::info!(
            user_id = user.id,
            page,
            recommended = recommended_count,
            from_wardrobe = wardrobe_count,
            total = looks.len(),
            "Feed composed"
        );

        Ok(looks)
    }

    /// One page of a category, newest first, limited to the user's sex
    pub async fn by_category(
        &self,
        user: &UserProfile,
        category_id: i64,
        page: u32,
    ) -> AppResult<Vec<Look>> {
        let offset = page_offset(CATEGORY_PER_PAGE, page)?;
        self.looks
            .by_category(
                category_id,
                user.sex,
                i64::from(CATEGORY_PER_PAGE),
                i64::from(offset),
            )
            .await
    }
}

/// Offset of `page` for pages of `per_page` items
fn page_offset(per_page: u32, page: u32) -> AppResult<u32> {
    per_page
        .checked_mul(page)
        .ok_or_else(|| AppError::InvalidInput(format!("Page {} is out of range", page)))
}

/// Wardrobe query for a page, narrowed when the recommender produced `slugs`
fn affinity_query(user: &UserProfile, page: u32, slugs: Vec<String>) -> AppResult<AffinityQuery> {
    let (per_page, exclude) = if slugs.is_empty() {
        (FALLBACK_PER_PAGE, None)
    } else {
        (WARDROBE_PER_PAGE, Some(slugs))
    };

    Ok(AffinityQuery {
        user_id: user.id,
        sex: user.sex,
        exclude,
        limit: i64::from(per_page),
        offset: i64::from(page_offset(per_page, page)?),
    })
}

/// Concatenates `primary` and `secondary`, dropping repeated ids.
/// The first occurrence wins.
fn merge_unique(primary: Vec<Look>, secondary: Vec<Look>) -> Vec<Look> {
    let mut seen = HashSet::with_capacity(primary.len() + secondary.len());
    primary
        .into_iter()
        .chain(secondary)
        .filter(|look| seen.insert(look.id))
        .collect()
}
