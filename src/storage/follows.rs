use uuid::Uuid;

use super::schema::Database;
use super::types::{DatabaseError, FeedFollow};

const FOLLOW_COLUMNS: &str = r#"
    ff.id, ff.created_at, ff.user_id, ff.feed_id,
    u.name AS user_name, f.name AS feed_name
"#;

impl Database {
    // ========================================================================
    // Follow Operations
    // ========================================================================

    /// Follow a feed and return the follow joined with user and feed names.
    ///
    /// Following the same feed twice yields `AlreadyExists`.
    pub async fn create_follow(
        &self,
        user_id: Uuid,
        feed_id: Uuid,
    ) -> Result<FeedFollow, DatabaseError> {
        let now = chrono::Utc::now().timestamp();
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO feed_follows (id, created_at, updated_at, user_id, feed_id)
            VALUES (?, ?, ?, ?, ?)
        "#,
        )
        .bind(id)
        .bind(now)
        .bind(now)
        .bind(user_id)
        .bind(feed_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::on_conflict(e, "follow", &feed_id.to_string()))?;

        let follow = sqlx::query_as::<_, FeedFollow>(&format!(
            r#"
            SELECT {FOLLOW_COLUMNS}
            FROM feed_follows ff
            JOIN users u ON u.id = ff.user_id
            JOIN feeds f ON f.id = ff.feed_id
            WHERE ff.id = ?
        "#
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(follow)
    }

    /// Feeds the user follows, ordered by feed name
    pub async fn get_follows_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FeedFollow>, DatabaseError> {
        let follows = sqlx::query_as::<_, FeedFollow>(&format!(
            r#"
            SELECT {FOLLOW_COLUMNS}
            FROM feed_follows ff
            JOIN users u ON u.id = ff.user_id
            JOIN feeds f ON f.id = ff.feed_id
            WHERE ff.user_id = ?
            ORDER BY f.name
        "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(follows)
    }

    /// Remove a follow. Returns `false` if the user was not following the feed.
    pub async fn delete_follow(&self, user_id: Uuid, feed_id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM feed_follows WHERE user_id = ? AND feed_id = ?")
            .bind(user_id)
            .bind(feed_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
