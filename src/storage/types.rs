use chrono::{DateTime, FixedOffset};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another gator process holds a write lock on the database
    #[error("The database is locked by another gator process. Stop it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// A post with the same (feed, url) pair is already stored
    #[error("Post already stored for feed {feed_id}: {url}")]
    DuplicatePost { feed_id: Uuid, url: String },

    /// A uniqueness constraint rejected a user, feed, or follow
    #[error("{entity} already exists: {key}")]
    AlreadyExists { entity: &'static str, key: String },

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let error_string = err.to_string().to_lowercase();

        // SQLITE_BUSY (5): database is locked
        // SQLITE_LOCKED (6): database table is locked
        if error_string.contains("database is locked")
            || error_string.contains("database table is locked")
            || error_string.contains("sqlite_busy")
            || error_string.contains("sqlite_locked")
        {
            return DatabaseError::InstanceLocked;
        }

        DatabaseError::Other(err)
    }

    /// Map a unique-constraint violation to `AlreadyExists`, anything else to `from_sqlx`.
    pub(crate) fn on_conflict(err: sqlx::Error, entity: &'static str, key: &str) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity,
                    key: key.to_string(),
                };
            }
        }
        Self::from_sqlx(err)
    }

    /// True for the expected (feed, url) duplicate signalled by `create_post`.
    pub fn is_duplicate_post(&self) -> bool {
        matches!(self, DatabaseError::DuplicatePost { .. })
    }
}

// ============================================================================
// Input Types
// ============================================================================

/// A post built from one feed item, ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub id: Uuid,
    pub feed_id: Uuid,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    /// Publish time with the zone offset the feed declared
    pub published_at: Option<DateTime<FixedOffset>>,
}

// ============================================================================
// Data Structures
// ============================================================================

/// Timestamps are Unix seconds throughout.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub created_at: i64,
    pub updated_at: i64,
    pub name: String,
}

/// Feed data from database
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Feed {
    pub id: Uuid,
    pub created_at: i64,
    pub updated_at: i64,
    pub name: String,
    pub url: String,
    pub user_id: Uuid,
    /// Unix microseconds; `None` until the scheduler has selected the feed
    pub last_fetched_at: Option<i64>,
}

/// Feed joined with the name of the user who added it
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedWithOwner {
    pub name: String,
    pub url: String,
    pub owner_name: String,
}

/// A follow joined with its user and feed names
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedFollow {
    pub id: Uuid,
    pub created_at: i64,
    pub user_id: Uuid,
    pub feed_id: Uuid,
    pub user_name: String,
    pub feed_name: String,
}

/// Post data from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub created_at: i64,
    pub updated_at: i64,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub published_at: Option<i64>,
    pub feed_id: Uuid,
}

/// Post joined with its feed name, as listed by `browse`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostWithFeed {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub published_at: Option<i64>,
    pub feed_name: String,
}
