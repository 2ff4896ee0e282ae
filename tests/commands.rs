//! Integration tests for the CLI subcommands.
//!
//! Each test gets an in-memory database and a config file in its own scratch
//! directory, then drives `commands::run` and inspects what it printed.

use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use gator::commands::{self, Command, CommandError, Context};
use gator::config::{Config, ConfigError};
use gator::storage::{Database, NewPost};

struct Harness {
    ctx: Context,
    dir: PathBuf,
}

impl Harness {
    async fn new() -> Self {
        let dir = std::env::temp_dir().join(format!("gator_commands_test_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let db = Database::open(":memory:").await.unwrap();
        let ctx = Context::new(
            db,
            Config::default(),
            dir.join("config.toml"),
            CancellationToken::new(),
        );
        Self { ctx, dir }
    }

    /// Run a command, returning its result and everything it printed.
    async fn run(&mut self, command: Command) -> (Result<(), CommandError>, String) {
        let mut out = Vec::new();
        let result = commands::run(&mut self.ctx, command, &mut out).await;
        (result, String::from_utf8(out).unwrap())
    }

    async fn ok(&mut self, command: Command) -> String {
        let (result, out) = self.run(command).await;
        result.unwrap();
        out
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.dir).ok();
    }
}

fn register(name: &str) -> Command {
    Command::Register { name: name.into() }
}

fn add_feed(name: &str, url: &str) -> Command {
    Command::AddFeed {
        name: name.into(),
        url: url.into(),
    }
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
async fn test_register_logs_in_and_persists_config() {
    let mut h = Harness::new().await;

    let out = h.ok(register("kahya")).await;
    assert!(out.contains("User kahya created"));
    assert!(out.contains("Logged in as: kahya"));

    let saved = Config::load(&h.ctx.config_path).unwrap();
    assert_eq!(saved.current_user_name.as_deref(), Some("kahya"));
}

#[tokio::test]
async fn test_register_duplicate_rejected() {
    let mut h = Harness::new().await;
    h.ok(register("kahya")).await;

    let (result, _) = h.run(register("kahya")).await;
    assert!(matches!(result, Err(CommandError::UserExists(ref n)) if n == "kahya"));
}

#[tokio::test]
async fn test_login_unknown_user_rejected() {
    let mut h = Harness::new().await;

    let (result, out) = h.run(Command::Login { name: "ghost".into() }).await;
    assert!(matches!(result, Err(CommandError::UnknownUser(ref n)) if n == "ghost"));
    assert!(out.is_empty());
    assert!(h.ctx.config.current_user_name.is_none());
}

#[tokio::test]
async fn test_users_marks_current() {
    let mut h = Harness::new().await;
    h.ok(register("kahya")).await;
    h.ok(register("holgith")).await;
    h.ok(Command::Login { name: "kahya".into() }).await;

    let out = h.ok(Command::Users).await;
    assert_eq!(out, "* kahya (current)\n* holgith\n");
}

#[tokio::test]
async fn test_terminal_escapes_stripped_from_output() {
    let mut h = Harness::new().await;
    let sneaky = "kah\x1b[31mya";

    let out = h.ok(register(sneaky)).await;
    assert!(!out.contains('\x1b'));
    assert!(out.contains("User kah[31mya created"));

    let out = h.ok(add_feed("Lanes", "https://wagslane.dev/index.xml")).await;
    assert!(!out.contains('\x1b'));

    let out = h.ok(Command::Users).await;
    assert_eq!(out, "* kah[31mya (current)\n");

    let out = h.ok(Command::Feeds).await;
    assert_eq!(
        out,
        "Feed: Lanes - URL: 'https://wagslane.dev/index.xml' - Added by: kah[31mya\n"
    );

    let out = h.ok(Command::Following).await;
    assert_eq!(out, "kah[31mya is following:\n* Lanes\n");
}

#[tokio::test]
async fn test_reset_removes_everything() {
    let mut h = Harness::new().await;
    h.ok(register("kahya")).await;
    h.ok(add_feed("Lanes", "https://wagslane.dev/index.xml")).await;

    let out = h.ok(Command::Reset).await;
    assert!(out.contains("1 users removed"));
    assert_eq!(h.ok(Command::Users).await, "");
    assert!(h.ok(Command::Feeds).await.starts_with("No feeds yet"));

    // The configured user no longer exists
    let (result, _) = h.run(Command::Following).await;
    assert!(matches!(result, Err(CommandError::UnknownUser(_))));
}

// ============================================================================
// Feeds and follows
// ============================================================================

#[tokio::test]
async fn test_addfeed_requires_login() {
    let mut h = Harness::new().await;

    let (result, _) = h.run(add_feed("Lanes", "https://wagslane.dev/index.xml")).await;
    assert!(matches!(result, Err(CommandError::NotLoggedIn)));
}

#[tokio::test]
async fn test_addfeed_rejects_bad_url() {
    let mut h = Harness::new().await;
    h.ok(register("kahya")).await;

    let (result, _) = h.run(add_feed("Local", "file:///etc/passwd")).await;
    assert!(matches!(result, Err(CommandError::InvalidUrl(_))));
    let (result, _) = h.run(add_feed("Junk", "not a url")).await;
    assert!(matches!(result, Err(CommandError::InvalidUrl(_))));
}

#[tokio::test]
async fn test_addfeed_follows_and_lists() {
    let mut h = Harness::new().await;
    h.ok(register("kahya")).await;

    let out = h.ok(add_feed("Lanes", "https://wagslane.dev/index.xml")).await;
    assert!(out.contains("Feed Lanes added: https://wagslane.dev/index.xml"));
    assert!(out.contains("kahya is now following Lanes"));

    let out = h.ok(Command::Feeds).await;
    assert_eq!(
        out,
        "Feed: Lanes - URL: 'https://wagslane.dev/index.xml' - Added by: kahya\n"
    );

    let out = h.ok(Command::Following).await;
    assert_eq!(out, "kahya is following:\n* Lanes\n");

    let (result, _) = h.run(add_feed("Again", "https://wagslane.dev/index.xml")).await;
    assert!(matches!(result, Err(CommandError::FeedExists(_))));
}

#[tokio::test]
async fn test_follow_and_unfollow() {
    let mut h = Harness::new().await;
    h.ok(register("kahya")).await;
    h.ok(add_feed("Lanes", "https://wagslane.dev/index.xml")).await;
    h.ok(register("holgith")).await;

    let out = h.ok(Command::Following).await;
    assert_eq!(out, "holgith is not following any feeds.\n");

    let follow = || Command::Follow {
        url: "https://wagslane.dev/index.xml".into(),
    };
    let out = h.ok(follow()).await;
    assert_eq!(out, "holgith is now following Lanes\n");

    let (result, _) = h.run(follow()).await;
    assert!(matches!(result, Err(CommandError::AlreadyFollowing(ref n)) if n == "Lanes"));

    let unfollow = || Command::Unfollow {
        url: "https://wagslane.dev/index.xml".into(),
    };
    let out = h.ok(unfollow()).await;
    assert_eq!(out, "holgith is no longer following Lanes\n");

    let (result, _) = h.run(unfollow()).await;
    assert!(matches!(result, Err(CommandError::NotFollowing(_))));
}

#[tokio::test]
async fn test_follow_unknown_feed() {
    let mut h = Harness::new().await;
    h.ok(register("kahya")).await;

    let (result, _) = h
        .run(Command::Follow {
            url: "https://example.com/missing.xml".into(),
        })
        .await;
    assert!(matches!(result, Err(CommandError::FeedNotFound(_))));
}

// ============================================================================
// Browse
// ============================================================================

#[tokio::test]
async fn test_browse_lists_newest_followed_posts() {
    let mut h = Harness::new().await;
    h.ok(register("kahya")).await;
    h.ok(add_feed("Lanes", "https://wagslane.dev/index.xml")).await;

    let feed = h
        .ctx
        .db
        .get_feed_by_url("https://wagslane.dev/index.xml")
        .await
        .unwrap()
        .unwrap();
    for (slug, published) in [
        ("old", "Mon, 02 Jan 2006 15:04:05 -0700"),
        ("new", "Tue, 03 Jan 2006 15:04:05 -0700"),
        ("newest", "Wed, 04 Jan 2006 15:04:05 -0700"),
    ] {
        h.ctx
            .db
            .create_post(&NewPost {
                id: Uuid::new_v4(),
                feed_id: feed.id,
                title: slug.to_string(),
                url: format!("https://wagslane.dev/posts/{slug}/"),
                description: Some(String::new()),
                published_at: gator::ingest::parse_pub_date(published),
            })
            .await
            .unwrap();
    }

    // Default limit is two posts
    let out = h.ok(Command::Browse { limit: 2 }).await;
    assert!(out.contains("--- newest ---"));
    assert!(out.contains("--- new ---"));
    assert!(!out.contains("--- old ---"));
    assert!(out.find("--- newest ---") < out.find("--- new ---"));
    assert!(out.contains("Wed Jan 4 2006 from Lanes"));
    assert!(out.contains("Link: https://wagslane.dev/posts/newest/"));

    let out = h.ok(Command::Browse { limit: 10 }).await;
    assert_eq!(out.matches("Link:").count(), 3);
}

#[tokio::test]
async fn test_browse_without_posts() {
    let mut h = Harness::new().await;
    h.ok(register("kahya")).await;

    let out = h.ok(Command::Browse { limit: 2 }).await;
    assert!(out.starts_with("No posts yet"));
}

// ============================================================================
// Agg
// ============================================================================

#[tokio::test]
async fn test_agg_invalid_interval_fails_before_collecting() {
    let mut h = Harness::new().await;
    h.ok(register("kahya")).await;
    h.ok(add_feed("Lanes", "https://wagslane.dev/index.xml")).await;

    for bad in ["soon", "10", "0s", "-1m"] {
        let (result, out) = h.run(Command::Agg { interval: bad.into() }).await;
        assert!(
            matches!(result, Err(CommandError::Config(ConfigError::InvalidInterval(_)))),
            "{bad}: {result:?}"
        );
        assert!(out.is_empty());
    }

    let feed = h
        .ctx
        .db
        .get_feed_by_url("https://wagslane.dev/index.xml")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(feed.last_fetched_at, None);
}

#[tokio::test]
async fn test_agg_stops_when_cancelled() {
    let mut h = Harness::new().await;
    h.ctx.cancel.cancel();

    let out = h.ok(Command::Agg { interval: "1m".into() }).await;
    assert_eq!(out, "Collecting feeds every 1m0s\nStopped collecting feeds\n");
}
