pub mod catalog;
pub mod looks;
pub mod postgres;
pub mod redis;
pub mod users;

pub use catalog::{CatalogStore, PgCatalogStore};
pub use looks::{AffinityQuery, LookRelation, LookStore, PgLookStore};
pub use postgres::create_pool;
pub use redis::create_redis_client;
pub use redis::Cache;
pub use redis::CacheKey;
pub use users::{PgUserStore, UserStore};
