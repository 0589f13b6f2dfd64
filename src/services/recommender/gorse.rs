//! Gorse recommender client
//!
//! Talks to a Gorse server over its REST API:
//! 1. Recommendations: GET /api/recommend/{user}/{category}?n=&offset= → JSON array of item ids
//! 2. Feedback: POST /api/feedback with a JSON array of feedback records
//! 3. Retraction: DELETE /api/feedback/{type}/{user}/{item}
//!
//! Item ids on the Gorse side are look slugs.
use crate::{
    error::{AppError, AppResult},
    services::recommender::{Feedback, FeedbackKind, Recommender},
};
use reqwest::{Client as HttpClient, RequestBuilder, Response, Url};
use std::time::Duration;

const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Clone)]
pub struct GorseClient {
    http_client: HttpClient,
    api_url: Url,
    api_key: Option<String>,
}

impl GorseClient {
    /// Creates a client whose every request is bounded by `timeout`
    pub fn new(api_url: String, api_key: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let api_url = Url::parse(&api_url)?;
        if api_url.cannot_be_a_base() {
            anyhow::bail!("Recommender URL {} cannot carry a path", api_url);
        }
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_url,
            api_key,
        })
    }

    /// Base URL extended with `segments`, each percent-encoded on its own
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_url.clone();
        // Checked in `new`: the base URL always accepts path segments
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn recommend_url(&self, user_id: &str, category: &str) -> Url {
        self.endpoint(&["api", "recommend", user_id, category])
    }

    fn feedback_url(&self) -> Url {
        self.endpoint(&["api", "feedback"])
    }

    fn delete_feedback_url(&self, kind: FeedbackKind, user_id: &str, item_id: &str) -> Url {
        self.endpoint(&["api", "feedback", kind.as_str(), user_id, item_id])
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    /// Turns a non-success status into an `ExternalApi` error
    async fn check_status(response: Response, operation: &str) -> AppResult<Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::error!(
            operation = operation,
            status = %status,
            body = %body,
            "Recommender request failed"
        );
        Err(AppError::ExternalApi(format!(
            "Gorse {} returned status {}: {}",
            operation, status, body
        )))
    }
}

#[async_trait::async_trait]
impl Recommender for GorseClient {
    async fn recommend_for_user_and_category(
        &self,
        user_id: &str,
        category: &str,
        limit: u32,
        offset: u32,
    ) -> AppResult<Vec<String>> {
        let request = self
            .http_client
            .get(self.recommend_url(user_id, category))
            .query(&[("n", limit), ("offset", offset)]);

        let response = self.authorize(request).send().await?;
        let response = Self::check_status(response, "recommend").await?;

        // Gorse answers `null` when it has nothing for the user
        let slugs: Option<Vec<String>> = response.json().await?;
        let slugs = slugs.unwrap_or_default();

        tracing::debug!(
            user_id = %user_id,
            category = %category,
            limit = limit,
            offset = offset,
            returned = slugs.len(),
            "Recommendations fetched"
        );

        Ok(slugs)
    }

    async fn insert_feedback(&self, feedback: &[Feedback]) -> AppResult<()> {
        if feedback.is_empty() {
            return Ok(());
        }

        let request = self.http_client.post(self.feedback_url()).json(feedback);
        let response = self.authorize(request).send().await?;
        Self::check_status(response, "insert feedback").await?;

        tracing::debug!(count = feedback.len(), "Feedback recorded");

        Ok(())
    }

    async fn delete_feedback(
        &self,
        kind: FeedbackKind,
        user_id: &str,
        item_id: &str,
    ) -> AppResult<()> {
        let request = self
            .http_client
            .delete(self.delete_feedback_url(kind, user_id, item_id));
        let response = self.authorize(request).send().await?;
        Self::check_status(response, "delete feedback").await?;

        tracing::debug!(kind = %kind, user_id = %user_id, item_id = %item_id, "Feedback retracted");

        Ok(())
    }
}
