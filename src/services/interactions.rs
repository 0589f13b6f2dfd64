use crate::{
    models::UserProfile,
    services::recommender::{Feedback, FeedbackKind, Recommender},
};

/// Reports an interaction to the recommender.
///
/// Best-effort: the user's action already succeeded locally, so a recommender
/// outage is logged and otherwise ignored.
pub async fn record(recommender: &dyn Recommender, kind: FeedbackKind, user: &UserProfile, slug: &str) {
    let feedback = Feedback::now(kind, user.recommender_id(), slug);
    if let Err(e) = recommender.insert_feedback(std::slice::from_ref(&feedback)).await {
        tracing::error!(
            error = %e,
            kind = %kind,
            user_id = user.id,
            look = %slug,
            "Failed to submit feedback to recommender"
        );
    }
}

/// Withdraws an interaction from the recommender. Best-effort like [`record`].
pub async fn retract(recommender: &dyn Recommender, kind: FeedbackKind, user: &UserProfile, slug: &str) {
    if let Err(e) = recommender
        .delete_feedback(kind, &user.recommender_id(), slug)
        .await
    {
        tracing::error!(
            error = %e,
            kind = %kind,
            user_id = user.id,
            look = %slug,
            "Failed to retract feedback from recommender"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::AppError, models::Sex, services::recommender::MockRecommender};

    fn user() -> UserProfile {
        UserProfile {
            id: 7,
            name: "Sam".to_string(),
            email: "sam@example.com".to_string(),
            sex: Sex::Male,
        }
    }

    #[tokio::test]
    async fn test_record_sends_single_feedback() {
        let mut recommender = MockRecommender::new();
        recommender
            .expect_insert_feedback()
            .withf(|feedback| {
                feedback.len() == 1
                    && feedback[0].kind == FeedbackKind::Like
                    && feedback[0].user_id == "7"
                    && feedback[0].item_id == "denim-weekend"
            })
            .times(1)
            .returning(|_| Ok(()));

        record(&recommender, FeedbackKind::Like, &user(), "denim-weekend").await;
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let mut recommender = MockRecommender::new();
        recommender
            .expect_insert_feedback()
            .returning(|_| Err(AppError::ExternalApi("down".to_string())));
        recommender
            .expect_delete_feedback()
            .withf(|kind, user_id, item_id| {
                *kind == FeedbackKind::Star && user_id == "7" && item_id == "denim-weekend"
            })
            .returning(|_, _, _| Err(AppError::ExternalApi("down".to_string())));

        record(&recommender, FeedbackKind::Read, &user(), "denim-weekend").await;
        retract(&recommender, FeedbackKind::Star, &user(), "denim-weekend").await;
    }
}
