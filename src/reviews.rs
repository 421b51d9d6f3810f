use crate::error::{Error, Result};
use crate::firestore::{review_doc, review_id, reviews_collection, DocumentStore, Fields};
use crate::models::{Review, ReviewDraft};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

pub fn validate_draft(draft: &ReviewDraft) -> Result<ReviewDraft> {
    if !(MIN_RATING..=MAX_RATING).contains(&draft.rating) {
        return Err(Error::Validation(format!(
            "Rating must be between {} and {} stars",
            MIN_RATING, MAX_RATING
        )));
    }
    Ok(ReviewDraft {
        rating: draft.rating,
        text: draft.text.trim().to_string(),
    })
}

/// Document fields for a record; anything that is not a JSON object is malformed.
fn to_fields<T: Serialize>(value: &T) -> Result<Fields> {
    Ok(serde_json::from_value(serde_json::to_value(value)?)?)
}

/// Reviews live at `movies/{movie_id}/reviews/{uid}_{movie_id}`.
#[derive(Clone)]
pub struct ReviewStore {
    docs: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl ReviewStore {
    pub fn new(docs: Arc<dyn DocumentStore>) -> Self {
        Self::with_clock(docs, Arc::new(SystemClock))
    }

    pub fn with_clock(docs: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { docs, clock }
    }

    /// Creates or overwrites the caller's review. Every submit, edits included,
    /// stamps a fresh `created_at`.
    pub async fn submit(
        &self,
        movie_id: i64,
        uid: &str,
        username: &str,
        draft: &ReviewDraft,
    ) -> Result<Review> {
        let draft = validate_draft(draft)?;
        let path = review_doc(movie_id, uid)?;
        let review = Review {
            id: review_id(uid, movie_id),
            user_id: uid.to_string(),
            username: username.to_string(),
            rating: draft.rating,
            text: draft.text,
            created_at: self.clock.now_millis(),
        };
        let fields = to_fields(&review)?;
        debug!(movie_id, uid, rating = review.rating, "submitting review");
        self.docs.set(&path, fields).await?;
        Ok(review)
    }

    /// Removes the caller's review if present.
    pub async fn delete(&self, movie_id: i64, uid: &str) -> Result<()> {
        debug!(movie_id, uid, "deleting review");
        self.docs.delete(&review_doc(movie_id, uid)?).await
    }

    pub async fn list(&self, movie_id: i64) -> Result<Vec<Review>> {
        let docs = self.docs.list(&reviews_collection(movie_id)).await?;
        Ok(docs
            .into_iter()
            .filter_map(|fields| {
                match serde_json::from_value::<Review>(serde_json::Value::Object(fields)) {
                    Ok(r) => Some(r),
                    Err(e) => {
                        warn!("Skipping unreadable review for movie {}: {}", movie_id, e);
                        None
                    }
                }
            })
            .collect())
    }

    pub async fn find_mine(&self, movie_id: i64, uid: &str) -> Result<Option<Review>> {
        Ok(self
            .list(movie_id)
            .await?
            .into_iter()
            .find(|r| r.user_id == uid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firestore::MemoryDocumentStore;
    use std::sync::atomic::{AtomicI64, Ordering};

    struct StepClock(AtomicI64);

    impl Clock for StepClock {
        fn now_millis(&self) -> i64 {
            self.0.fetch_add(1_000, Ordering::SeqCst)
        }
    }

    fn store() -> ReviewStore {
        ReviewStore::with_clock(
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(StepClock(AtomicI64::new(1_000))),
        )
    }

    fn draft(rating: u8, text: &str) -> ReviewDraft {
        ReviewDraft {
            rating,
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn repeated_submit_keeps_one_review_and_advances_timestamp() {
        let reviews = store();
        let first = reviews.submit(550, "u1", "ana", &draft(4, "Great")).await.unwrap();
        let second = reviews.submit(550, "u1", "ana", &draft(4, "Great")).await.unwrap();

        let listed = reviews.list(550).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "u1_550");
        assert_eq!(listed[0].rating, 4);
        assert!(second.created_at > first.created_at);
        assert_eq!(listed[0].created_at, second.created_at);
    }

    #[tokio::test]
    async fn list_is_per_movie_and_find_mine_matches_user() {
        let reviews = store();
        reviews.submit(1, "u1", "ana", &draft(5, "  Loved it ")).await.unwrap();
        reviews.submit(1, "u2", "bo", &draft(2, "Meh")).await.unwrap();
        reviews.submit(2, "u1", "ana", &draft(3, "Ok")).await.unwrap();

        assert_eq!(reviews.list(1).await.unwrap().len(), 2);
        let mine = reviews.find_mine(1, "u1").await.unwrap().unwrap();
        assert_eq!(mine.text, "Loved it");
        assert!(reviews.find_mine(1, "u3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let reviews = store();
        reviews.submit(7, "u1", "ana", &draft(1, "No")).await.unwrap();
        reviews.delete(7, "u1").await.unwrap();
        reviews.delete(7, "u1").await.unwrap();
        assert!(reviews.list(7).await.unwrap().is_empty());
    }

    #[test]
    fn review_fields_use_camel_case_and_reject_non_objects() {
        let review = Review {
            id: "u1_3".to_string(),
            user_id: "u1".to_string(),
            username: "ana".to_string(),
            rating: 4,
            text: "Fine".to_string(),
            created_at: 42,
        };
        let fields = to_fields(&review).unwrap();
        assert_eq!(fields["userId"], "u1");
        assert_eq!(fields["createdAt"], 42);
        assert_eq!(fields.len(), 6);

        assert!(matches!(to_fields(&"just text"), Err(Error::Malformed(_))));
        assert!(matches!(to_fields(&[1, 2]), Err(Error::Malformed(_))));
    }

    #[tokio::test]
    async fn rejects_out_of_range_ratings() {
        let reviews = store();
        for rating in [0, 6] {
            let err = reviews.submit(1, "u1", "ana", &draft(rating, "x")).await.unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
        }
        assert!(reviews.list(1).await.unwrap().is_empty());
    }
}
