use chrono::{DateTime, Utc};
use std::future::Future;
use uuid::Uuid;

use crate::storage::{Database, DatabaseError, Feed, NewPost};

/// The store operations the ingestion loop depends on.
///
/// [`Database`] is the production implementation. Tests substitute doubles to
/// inject failures the real store cannot be made to produce on demand.
pub trait FeedStore: Send + Sync {
    /// The feed fetched least recently, never-fetched feeds first.
    fn next_feed_to_fetch(&self) -> impl Future<Output = Result<Option<Feed>, DatabaseError>> + Send;

    fn mark_feed_fetched(
        &self,
        feed_id: Uuid,
        fetched_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), DatabaseError>> + Send;

    /// Insert a post; an existing `(feed_id, url)` yields `DatabaseError::DuplicatePost`.
    fn create_post(&self, post: &NewPost) -> impl Future<Output = Result<(), DatabaseError>> + Send;
}

impl FeedStore for Database {
    async fn next_feed_to_fetch(&self) -> Result<Option<Feed>, DatabaseError> {
        self.get_next_feed_to_fetch().await
    }

    async fn mark_feed_fetched(
        &self,
        feed_id: Uuid,
        fetched_at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        Database::mark_feed_fetched(self, feed_id, fetched_at).await
    }

    async fn create_post(&self, post: &NewPost) -> Result<(), DatabaseError> {
        Database::create_post(self, post).await
    }
}
