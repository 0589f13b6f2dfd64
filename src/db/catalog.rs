use sqlx::PgPool;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{Category, Topic},
};

const CATEGORIES_CACHE_TTL: u64 = 3600; // 1 hour

/// Editorial content served next to the feed looks
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    async fn categories(&self) -> AppResult<Vec<Category>>;

    async fn find_category(&self, slug: &str) -> AppResult<Option<Category>>;

    async fn random_topics(&self, limit: i64) -> AppResult<Vec<Topic>>;
}

#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
    cache: Cache,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool, cache: Cache) -> Self {
        Self { pool, cache }
    }
}

#[async_trait::async_trait]
impl CatalogStore for PgCatalogStore {
    async fn categories(&self) -> AppResult<Vec<Category>> {
        cached!(
            self.cache,
            CacheKey::Categories,
            CATEGORIES_CACHE_TTL,
            async move {
                let categories = sqlx::query_as::<_, Category>(
                    "SELECT id, name, slug FROM categories WHERE deleted_at IS NULL ORDER BY id",
                )
                .fetch_all(&self.pool)
                .await?;

                tracing::debug!(count = categories.len(), "Categories loaded from database");

                Ok::<_, AppError>(categories)
            }
        )
    }

    async fn find_category(&self, slug: &str) -> AppResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug FROM categories WHERE slug = $1 AND deleted_at IS NULL",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    async fn random_topics(&self, limit: i64) -> AppResult<Vec<Topic>> {
        let topics = sqlx::query_as::<_, Topic>(
            r#"
            SELECT id, name, slug, "desc", image
            FROM topics
            WHERE deleted_at IS NULL
            ORDER BY random()
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(topics)
    }
}
