use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::Utc;
use serde_json::Value;

use papaya_api::{
    db::{AffinityQuery, CatalogStore, LookRelation, LookStore, UserStore},
    error::{AppError, AppResult},
    models::{Category, Look, Sex, Topic, UserProfile, WardrobeItem},
    routes::{create_router, AppState},
    services::{
        recommender::{Feedback, FeedbackKind, Recommender},
        FeedComposer,
    },
};

const USER_HEADER: &str = "x-user-id";

fn look(id: i64, slug: &str, sex: Sex) -> Look {
    Look {
        id,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        deleted_at: None,
        name: format!("Look {}", id),
        slug: slug.to_string(),
        image: format!("looks/{}.jpg", slug),
        desc: String::new(),
        sex,
        items: Vec::new(),
        is_from_wardrobe: false,
    }
}

struct StubUsers;

#[async_trait::async_trait]
impl UserStore for StubUsers {
    async fn find_profile(&self, user_id: i64) -> AppResult<Option<UserProfile>> {
        Ok((user_id == 42).then(|| UserProfile {
            id: 42,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            sex: Sex::Female,
        }))
    }
}

/// In-memory catalog: two recommendable looks, three wardrobe looks, one male look
struct StubLooks {
    looks: Vec<Look>,
    wardrobe: Vec<i64>,
    /// (look id, category id)
    categories: Vec<(i64, i64)>,
    relations: Mutex<HashSet<(LookRelation, i64, i64)>>,
}

impl StubLooks {
    fn new() -> Self {
        Self {
            looks: vec![
                look(1, "a", Sex::Female),
                look(2, "b", Sex::Female),
                look(10, "w1", Sex::Female),
                look(11, "w2", Sex::Female),
                look(12, "w3", Sex::Female),
                look(20, "m1", Sex::Male),
            ],
            wardrobe: vec![10, 11, 12],
            categories: vec![(1, 1), (2, 1), (12, 1), (20, 1), (11, 2)],
            relations: Mutex::new(HashSet::new()),
        }
    }

    fn has(&self, relation: LookRelation, user_id: i64, look_id: i64) -> bool {
        self.relations
            .lock()
            .unwrap()
            .contains(&(relation, user_id, look_id))
    }
}

#[async_trait::async_trait]
impl LookStore for StubLooks {
    async fn find_by_slugs(&self, slugs: &[String], user: &UserProfile) -> AppResult<Vec<Look>> {
        Ok(self
            .looks
            .iter()
            .filter(|l| slugs.contains(&l.slug) && l.sex == user.sex)
            .filter(|l| !self.has(LookRelation::Saved, user.id, l.id))
            .cloned()
            .collect())
    }

    async fn wardrobe_affinity(&self, query: &AffinityQuery) -> AppResult<Vec<Look>> {
        let excluded = query.exclude.clone().unwrap_or_default();
        let mut looks: Vec<Look> = self
            .looks
            .iter()
            .filter(|l| self.wardrobe.contains(&l.id))
            .filter(|l| l.sex == query.sex && !excluded.contains(&l.slug))
            .filter(|l| !self.has(LookRelation::Saved, query.user_id, l.id))
            .cloned()
            .collect();
        looks.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(looks
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect())
    }

    async fn by_category(
        &self,
        category_id: i64,
        sex: Sex,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Look>> {
        let mut looks: Vec<Look> = self
            .looks
            .iter()
            .filter(|l| l.sex == sex && self.categories.contains(&(l.id, category_id)))
            .cloned()
            .collect();
        looks.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(looks
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Look>> {
        Ok(self.looks.iter().find(|l| l.slug == slug).cloned())
    }

    async fn items_for_look(&self, look_id: i64) -> AppResult<Vec<WardrobeItem>> {
        Ok(vec![WardrobeItem {
            id: look_id * 100,
            name: "White sneakers".to_string(),
            slug: "white-sneakers".to_string(),
            image: "items/white-sneakers.jpg".to_string(),
            sex: Sex::Unisex,
            category_id: 3,
        }])
    }

    async fn random_by_sex(&self, sex: Sex, limit: i64) -> AppResult<Vec<Look>> {
        Ok(self
            .looks
            .iter()
            .filter(|l| l.sex == sex)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn has_relation(
        &self,
        relation: LookRelation,
        user_id: i64,
        look_id: i64,
    ) -> AppResult<bool> {
        Ok(self.has(relation, user_id, look_id))
    }

    async fn add_relation(
        &self,
        relation: LookRelation,
        user_id: i64,
        look_id: i64,
    ) -> AppResult<()> {
        self.relations
            .lock()
            .unwrap()
            .insert((relation, user_id, look_id));
        Ok(())
    }

    async fn remove_relation(
        &self,
        relation: LookRelation,
        user_id: i64,
        look_id: i64,
    ) -> AppResult<()> {
        self.relations
            .lock()
            .unwrap()
            .remove(&(relation, user_id, look_id));
        Ok(())
    }

    async fn related_looks(&self, relation: LookRelation, user_id: i64) -> AppResult<Vec<Look>> {
        Ok(self
            .looks
            .iter()
            .filter(|l| self.has(relation, user_id, l.id))
            .cloned()
            .collect())
    }
}

struct StubCatalog;

#[async_trait::async_trait]
impl CatalogStore for StubCatalog {
    async fn categories(&self) -> AppResult<Vec<Category>> {
        Ok(vec![Category {
            id: 1,
            name: "Casual".to_string(),
            slug: "casual".to_string(),
        }])
    }

    async fn find_category(&self, slug: &str) -> AppResult<Option<Category>> {
        Ok(self
            .categories()
            .await?
            .into_iter()
            .find(|c| c.slug == slug))
    }

    async fn random_topics(&self, _limit: i64) -> AppResult<Vec<Topic>> {
        Ok(Vec::new())
    }
}

/// Recommender answering with fixed slugs, or failing when `slugs` is `None`
struct StubRecommender {
    slugs: Option<Vec<String>>,
    inserted: Mutex<Vec<Feedback>>,
    deleted: Mutex<Vec<(FeedbackKind, String, String)>>,
}

impl StubRecommender {
    fn returning(slugs: &[&str]) -> Self {
        Self {
            slugs: Some(slugs.iter().map(|s| s.to_string()).collect()),
            inserted: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            slugs: None,
            inserted: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl Recommender for StubRecommender {
    async fn recommend_for_user_and_category(
        &self,
        _user_id: &str,
        _category: &str,
        _limit: u32,
        _offset: u32,
    ) -> AppResult<Vec<String>> {
        self.slugs
            .clone()
            .ok_or_else(|| AppError::ExternalApi("recommender unavailable".to_string()))
    }

    async fn insert_feedback(&self, feedback: &[Feedback]) -> AppResult<()> {
        self.inserted.lock().unwrap().extend_from_slice(feedback);
        Ok(())
    }

    async fn delete_feedback(
        &self,
        kind: FeedbackKind,
        user_id: &str,
        item_id: &str,
    ) -> AppResult<()> {
        self.deleted
            .lock()
            .unwrap()
            .push((kind, user_id.to_string(), item_id.to_string()));
        Ok(())
    }
}

struct TestApp {
    server: TestServer,
    looks: Arc<StubLooks>,
    recommender: Arc<StubRecommender>,
}

fn create_test_app(recommender: StubRecommender) -> TestApp {
    let looks = Arc::new(StubLooks::new());
    let recommender = Arc::new(recommender);

    let state = Arc::new(AppState {
        feed: FeedComposer::new(recommender.clone(), looks.clone()),
        looks: looks.clone(),
        users: Arc::new(StubUsers),
        catalog: Arc::new(StubCatalog),
        recommender: recommender.clone(),
        latest_app_version: "1.0.3".to_string(),
    });

    TestApp {
        server: TestServer::new(create_router(state)).unwrap(),
        looks,
        recommender,
    }
}

fn user_header(id: &'static str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static(USER_HEADER),
        HeaderValue::from_static(id),
    )
}

fn slugs_of(body: &Value) -> HashSet<String> {
    body["looks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["slug"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app(StubRecommender::returning(&[]));
    let response = app.server.get("/health").await;
    response.assert_status_ok();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = create_test_app(StubRecommender::returning(&[]));
    let id = "6f1c1c2e-1f0b-4a8e-9a4e-2d7f3f1b9c11";
    let response = app
        .server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static(id),
        )
        .await;

    assert_eq!(response.headers()["x-request-id"], id);
}

#[tokio::test]
async fn test_feed_requires_user() {
    let app = create_test_app(StubRecommender::returning(&["a"]));
    let response = app.server.get("/api/v1/feed").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_feed_rejects_unknown_user() {
    let app = create_test_app(StubRecommender::returning(&["a"]));
    let (name, value) = user_header("7");
    let response = app.server.get("/api/v1/feed").add_header(name, value).await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_feed_rejects_invalid_page() {
    let app = create_test_app(StubRecommender::returning(&["a"]));
    for page in ["abc", "-1"] {
        let (name, value) = user_header("42");
        let response = app
            .server
            .get(&format!("/api/v1/feed?page={}", page))
            .add_header(name, value)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_feed_blends_recommendations_and_wardrobe() {
    let app = create_test_app(StubRecommender::returning(&["a", "b"]));
    let (name, value) = user_header("42");
    let response = app.server.get("/api/v1/feed").add_header(name, value).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["page"], 0);
    assert_eq!(body["latest_app_version"], "1.0.3");
    assert_eq!(body["categories"][0]["slug"], "casual");

    let expected: HashSet<String> = ["a", "b", "w1", "w2", "w3"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(slugs_of(&body), expected);

    for look in body["looks"].as_array().unwrap() {
        assert_eq!(look["sex"], "female");
        let from_wardrobe = look["slug"].as_str().unwrap().starts_with('w');
        assert_eq!(look["is_from_wardrobe"], from_wardrobe);
    }
}

#[tokio::test]
async fn test_feed_falls_back_to_wardrobe() {
    let app = create_test_app(StubRecommender::returning(&[]));
    let (name, value) = user_header("42");
    let response = app.server.get("/api/v1/feed").add_header(name, value).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["looks"].as_array().unwrap().len(), 3);
    assert!(body["looks"]
        .as_array()
        .unwrap()
        .iter()
        .all(|l| l["is_from_wardrobe"] == true));
}

#[tokio::test]
async fn test_feed_past_the_end_is_empty() {
    let app = create_test_app(StubRecommender::returning(&[]));
    let (name, value) = user_header("42");
    let response = app
        .server
        .get("/api/v1/feed?page=5")
        .add_header(name, value)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["looks"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_feed_fails_when_recommender_fails() {
    let app = create_test_app(StubRecommender::failing());
    let (name, value) = user_header("42");
    let response = app.server.get("/api/v1/feed").add_header(name, value).await;

    assert!(response.status_code().is_server_error());
    let body: Value = response.json();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_get_unknown_look() {
    let app = create_test_app(StubRecommender::returning(&[]));
    let (name, value) = user_header("42");
    let response = app
        .server
        .get("/api/v1/looks/missing")
        .add_header(name, value)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_look_records_read() {
    let app = create_test_app(StubRecommender::returning(&[]));
    let (name, value) = user_header("42");
    let response = app.server.get("/api/v1/looks/a").add_header(name, value).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["look"]["slug"], "a");
    assert_eq!(body["look"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["is_liked"], false);
    assert!(body["similar"]
        .as_array()
        .unwrap()
        .iter()
        .all(|l| l["slug"] != "a"));

    let inserted = app.recommender.inserted.lock().unwrap();
    assert_eq!(inserted.len(), 1);
    assert_eq!(inserted[0].kind, FeedbackKind::Read);
    assert_eq!(inserted[0].item_id, "a");
}

#[tokio::test]
async fn test_like_then_dislike() {
    let app = create_test_app(StubRecommender::returning(&[]));

    let (name, value) = user_header("42");
    app.server
        .post("/api/v1/looks/a/like")
        .add_header(name, value)
        .await
        .assert_status_ok();
    assert!(app.looks.has(LookRelation::Liked, 42, 1));

    let (name, value) = user_header("42");
    app.server
        .post("/api/v1/looks/a/dislike")
        .add_header(name, value)
        .await
        .assert_status_ok();
    assert!(app.looks.has(LookRelation::Disliked, 42, 1));
    assert!(!app.looks.has(LookRelation::Liked, 42, 1));

    let kinds: Vec<FeedbackKind> = app
        .recommender
        .inserted
        .lock()
        .unwrap()
        .iter()
        .map(|f| f.kind)
        .collect();
    assert_eq!(kinds, vec![FeedbackKind::Like, FeedbackKind::Dislike]);

    let deleted = app.recommender.deleted.lock().unwrap();
    assert_eq!(
        deleted.last(),
        Some(&(FeedbackKind::Like, "42".to_string(), "a".to_string()))
    );
}

#[tokio::test]
async fn test_saved_looks_leave_listing_after_unsave() {
    let app = create_test_app(StubRecommender::returning(&[]));

    let (name, value) = user_header("42");
    app.server
        .post("/api/v1/saved/w1")
        .add_header(name, value)
        .await
        .assert_status_ok();

    let (name, value) = user_header("42");
    let saved: Vec<Value> = app.server.get("/api/v1/saved").add_header(name, value).await.json();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0]["slug"], "w1");

    let (name, value) = user_header("42");
    app.server
        .delete("/api/v1/saved/w1")
        .add_header(name, value)
        .await
        .assert_status_ok();

    let (name, value) = user_header("42");
    let saved: Vec<Value> = app.server.get("/api/v1/saved").add_header(name, value).await.json();
    assert!(saved.is_empty());

    let deleted = app.recommender.deleted.lock().unwrap();
    assert_eq!(deleted[0].0, FeedbackKind::Star);
}

async fn save_look(app: &TestApp, slug: &str) {
    let (name, value) = user_header("42");
    app.server
        .post(&format!("/api/v1/saved/{}", slug))
        .add_header(name, value)
        .await
        .assert_status_ok();
}

async fn feed_slugs(app: &TestApp) -> HashSet<String> {
    let (name, value) = user_header("42");
    let response = app.server.get("/api/v1/feed").add_header(name, value).await;
    response.assert_status_ok();
    slugs_of(&response.json())
}

#[tokio::test]
async fn test_saved_looks_leave_the_feed() {
    let app = create_test_app(StubRecommender::returning(&["a", "b"]));
    save_look(&app, "a").await;
    save_look(&app, "w1").await;

    let slugs = feed_slugs(&app).await;

    let expected: HashSet<String> = ["b", "w2", "w3"].iter().map(|s| s.to_string()).collect();
    assert_eq!(slugs, expected);
}

#[tokio::test]
async fn test_saved_looks_leave_the_fallback_feed() {
    let app = create_test_app(StubRecommender::returning(&[]));
    save_look(&app, "w1").await;

    let slugs = feed_slugs(&app).await;

    let expected: HashSet<String> = ["w2", "w3"].iter().map(|s| s.to_string()).collect();
    assert_eq!(slugs, expected);
}

#[tokio::test]
async fn test_liked_looks_listing() {
    let app = create_test_app(StubRecommender::returning(&[]));

    let (name, value) = user_header("42");
    app.server
        .post("/api/v1/looks/b/like")
        .add_header(name, value)
        .await
        .assert_status_ok();

    let (name, value) = user_header("42");
    let liked: Vec<Value> = app.server.get("/api/v1/liked").add_header(name, value).await.json();
    assert_eq!(liked.len(), 1);
    assert_eq!(liked[0]["slug"], "b");

    let (name, value) = user_header("42");
    app.server
        .delete("/api/v1/looks/b/like")
        .add_header(name, value)
        .await
        .assert_status_ok();

    let (name, value) = user_header("42");
    let liked: Vec<Value> = app.server.get("/api/v1/liked").add_header(name, value).await.json();
    assert!(liked.is_empty());
}

#[tokio::test]
async fn test_category_feed_is_newest_first_for_user_sex() {
    let app = create_test_app(StubRecommender::failing());
    let (name, value) = user_header("42");
    let response = app
        .server
        .get("/api/v1/feed/casual")
        .add_header(name, value)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["page"], 0);
    assert_eq!(body["category"]["slug"], "casual");
    let slugs: Vec<&str> = body["looks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, vec!["w3", "b", "a"]);
}

#[tokio::test]
async fn test_category_feed_past_the_end_is_empty() {
    let app = create_test_app(StubRecommender::returning(&[]));
    let (name, value) = user_header("42");
    let response = app
        .server
        .get("/api/v1/feed/casual?page=1")
        .add_header(name, value)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["looks"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_category() {
    let app = create_test_app(StubRecommender::returning(&[]));
    let (name, value) = user_header("42");
    let response = app
        .server
        .get("/api/v1/feed/formal")
        .add_header(name, value)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}
