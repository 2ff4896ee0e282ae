use uuid::Uuid;

use super::schema::Database;
use super::types::{DatabaseError, NewPost, Post, PostWithFeed};

impl Database {
    // ========================================================================
    // Post Operations
    // ========================================================================

    /// Insert a post.
    ///
    /// The `(feed_id, url)` pair is unique. A second insert of the same pair
    /// leaves the stored row untouched and returns `DatabaseError::DuplicatePost`,
    /// so callers can tell an expected duplicate from a real failure without
    /// inspecting error messages.
    pub async fn create_post(&self, post: &NewPost) -> Result<(), DatabaseError> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query(
            r#"
            INSERT INTO posts (id, created_at, updated_at, title, url, description, published_at, feed_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(feed_id, url) DO NOTHING
        "#,
        )
        .bind(post.id)
        .bind(now)
        .bind(now)
        .bind(&post.title)
        .bind(&post.url)
        .bind(&post.description)
        .bind(post.published_at.map(|t| t.timestamp()))
        .bind(post.feed_id)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::DuplicatePost {
                feed_id: post.feed_id,
                url: post.url.clone(),
            });
        }
        Ok(())
    }

    /// All posts stored for a feed, in insertion order
    pub async fn get_posts_for_feed(&self, feed_id: Uuid) -> Result<Vec<Post>, DatabaseError> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, created_at, updated_at, title, url, description, published_at, feed_id
            FROM posts
            WHERE feed_id = ?
            ORDER BY rowid
        "#,
        )
        .bind(feed_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    /// Newest posts across the feeds a user follows.
    ///
    /// Undated posts sort after dated ones; within equal dates newer rows win.
    pub async fn get_posts_for_user(
        &self,
        user_id: Uuid,
        limit: u32,
    ) -> Result<Vec<PostWithFeed>, DatabaseError> {
        let posts = sqlx::query_as::<_, PostWithFeed>(
            r#"
            SELECT p.title, p.url, p.description, p.published_at, f.name AS feed_name
            FROM posts p
            JOIN feeds f ON f.id = p.feed_id
            JOIN feed_follows ff ON ff.feed_id = p.feed_id
            WHERE ff.user_id = ?
            ORDER BY p.published_at DESC NULLS LAST, p.created_at DESC
            LIMIT ?
        "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }
}
