use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{Look, Sex, UserProfile, WardrobeItem},
};

/// A user ↔ look association table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookRelation {
    Liked,
    Disliked,
    Saved,
}

impl LookRelation {
    fn table(&self) -> &'static str {
        match self {
            LookRelation::Liked => "liked_looks",
            LookRelation::Disliked => "disliked_looks",
            LookRelation::Saved => "saved_looks",
        }
    }
}

/// Parameters of the wardrobe-affinity lookup
///
/// Selects looks sharing at least one item with the user's wardrobe, of the
/// user's sex, not soft-deleted and not already saved by the user. When
/// `exclude` is set, looks with those slugs are left out as well.
#[derive(Debug, Clone, PartialEq)]
pub struct AffinityQuery {
    pub user_id: i64,
    pub sex: Sex,
    pub exclude: Option<Vec<String>>,
    pub limit: i64,
    pub offset: i64,
}

/// Read and association access to looks
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LookStore: Send + Sync {
    /// Looks with the given slugs that are visible to `user`
    /// (matching sex, not deleted, not saved)
    async fn find_by_slugs(&self, slugs: &[String], user: &UserProfile) -> AppResult<Vec<Look>>;

    /// Looks related to the user's wardrobe, newest first
    async fn wardrobe_affinity(&self, query: &AffinityQuery) -> AppResult<Vec<Look>>;

    /// One page of a category's looks of the given sex, newest first
    async fn by_category(
        &self,
        category_id: i64,
        sex: Sex,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Look>>;

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Look>>;

    async fn items_for_look(&self, look_id: i64) -> AppResult<Vec<WardrobeItem>>;

    /// Random looks of one sex
    async fn random_by_sex(&self, sex: Sex, limit: i64) -> AppResult<Vec<Look>>;

    async fn has_relation(
        &self,
        relation: LookRelation,
        user_id: i64,
        look_id: i64,
    ) -> AppResult<bool>;

    /// Idempotent: adding an existing association is not an error
    async fn add_relation(
        &self,
        relation: LookRelation,
        user_id: i64,
        look_id: i64,
    ) -> AppResult<()>;

    async fn remove_relation(
        &self,
        relation: LookRelation,
        user_id: i64,
        look_id: i64,
    ) -> AppResult<()>;

    /// All looks the user holds in an association, newest look first
    async fn related_looks(&self, relation: LookRelation, user_id: i64) -> AppResult<Vec<Look>>;
}

/// Builds the lookup of recommended slugs, narrowed to what `user` may see
pub fn build_visible_by_slugs_query(
    slugs: &[String],
    user: &UserProfile,
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT looks.* FROM looks WHERE looks.slug = ANY(");
    builder.push_bind(slugs.to_vec());
    builder.push(") AND looks.sex = ");
    builder.push_bind(user.sex.as_str());
    builder.push(
        " AND looks.deleted_at IS NULL \
         AND looks.id NOT IN (SELECT saved_looks.look_id FROM saved_looks WHERE saved_looks.user_id = ",
    );
    builder.push_bind(user.id);
    builder.push(")");

    builder
}

/// Builds the wardrobe-affinity statement with every value bound
pub fn build_affinity_query(query: &AffinityQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(
        "SELECT looks.* FROM looks \
         JOIN look_items li ON looks.id = li.look_id \
         JOIN users_wardrobe uw ON li.wardrobe_item_id = uw.wardrobe_item_id \
         WHERE uw.user_id = ",
    );
    builder.push_bind(query.user_id);
    builder.push(
        " AND looks.id NOT IN (SELECT saved_looks.look_id FROM saved_looks WHERE saved_looks.user_id = ",
    );
    builder.push_bind(query.user_id);
    builder.push(") AND looks.sex = ");
    builder.push_bind(query.sex.as_str());
    builder.push(" AND looks.deleted_at IS NULL");

    if let Some(exclude) = &query.exclude {
        builder.push(" AND looks.slug <> ALL(");
        builder.push_bind(exclude.clone());
        builder.push(")");
    }

    builder.push(" GROUP BY looks.id ORDER BY looks.id DESC LIMIT ");
    builder.push_bind(query.limit);
    builder.push(" OFFSET ");
    builder.push_bind(query.offset);

    builder
}

const LOOK_ITEMS_CACHE_TTL: u64 = 86400; // 1 day

/// Postgres-backed look store
#[derive(Clone)]
pub struct PgLookStore {
    pool: PgPool,
    cache: Cache,
}

impl PgLookStore {
    pub fn new(pool: PgPool, cache: Cache) -> Self {
        Self { pool, cache }
    }
}

#[async_trait::async_trait]
impl LookStore for PgLookStore {
    async fn find_by_slugs(&self, slugs: &[String], user: &UserProfile) -> AppResult<Vec<Look>> {
        let mut builder = build_visible_by_slugs_query(slugs, user);
        let looks = builder
            .build_query_as::<Look>()
            .fetch_all(&self.pool)
            .await?;

        Ok(looks)
    }

    async fn wardrobe_affinity(&self, query: &AffinityQuery) -> AppResult<Vec<Look>> {
        let mut builder = build_affinity_query(query);
        let looks = builder
            .build_query_as::<Look>()
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(
            user_id = query.user_id,
            excluded = query.exclude.as_ref().map_or(0, Vec::len),
            limit = query.limit,
            offset = query.offset,
            found = looks.len(),
            "Wardrobe affinity query completed"
        );

        Ok(looks)
    }

    async fn by_category(
        &self,
        category_id: i64,
        sex: Sex,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Look>> {
        let looks = sqlx::query_as::<_, Look>(
            r#"
            SELECT looks.* FROM looks
            JOIN look_categories lc ON looks.id = lc.look_id
            WHERE lc.category_id = $1 AND looks.sex = $2 AND looks.deleted_at IS NULL
            ORDER BY looks.id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(category_id)
        .bind(sex.as_str())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(looks)
    }

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Look>> {
        let look = sqlx::query_as::<_, Look>(
            "SELECT * FROM looks WHERE slug = $1 AND deleted_at IS NULL",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(look)
    }

    async fn items_for_look(&self, look_id: i64) -> AppResult<Vec<WardrobeItem>> {
        cached!(
            self.cache,
            CacheKey::LookItems(look_id),
            LOOK_ITEMS_CACHE_TTL,
            async move {
                let items = sqlx::query_as::<_, WardrobeItem>(
                    r#"
                    SELECT wi.id, wi.name, wi.slug, wi.image, wi.sex, wi.wardrobe_category_id
                    FROM wardrobe_items wi
                    JOIN look_items li ON li.wardrobe_item_id = wi.id
                    WHERE li.look_id = $1
                    ORDER BY wi.id
                    "#,
                )
                .bind(look_id)
                .fetch_all(&self.pool)
                .await?;

                Ok::<_, AppError>(items)
            }
        )
    }

    async fn random_by_sex(&self, sex: Sex, limit: i64) -> AppResult<Vec<Look>> {
        let looks = sqlx::query_as::<_, Look>(
            "SELECT * FROM looks WHERE sex = $1 AND deleted_at IS NULL ORDER BY random() LIMIT $2",
        )
        .bind(sex.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(looks)
    }

    async fn has_relation(
        &self,
        relation: LookRelation,
        user_id: i64,
        look_id: i64,
    ) -> AppResult<bool> {
        let query = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE user_id = $1 AND look_id = $2)",
            relation.table()
        );
        let exists: bool = sqlx::query_scalar(&query)
            .bind(user_id)
            .bind(look_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn add_relation(
        &self,
        relation: LookRelation,
        user_id: i64,
        look_id: i64,
    ) -> AppResult<()> {
        let query = format!(
            "INSERT INTO {} (user_id, look_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            relation.table()
        );
        sqlx::query(&query)
            .bind(user_id)
            .bind(look_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn remove_relation(
        &self,
        relation: LookRelation,
        user_id: i64,
        look_id: i64,
    ) -> AppResult<()> {
        let query = format!(
            "DELETE FROM {} WHERE user_id = $1 AND look_id = $2",
            relation.table()
        );
        sqlx::query(&query)
            .bind(user_id)
            .bind(look_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn related_looks(&self, relation: LookRelation, user_id: i64) -> AppResult<Vec<Look>> {
        let query = format!(
            "SELECT looks.* FROM looks \
             JOIN {table} r ON r.look_id = looks.id \
             WHERE r.user_id = $1 AND looks.deleted_at IS NULL \
             ORDER BY looks.id DESC",
            table = relation.table()
        );
        let looks = sqlx::query_as::<_, Look>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(looks)
    }
}
