//! CLI subcommands.
//!
//! Every subcommand is a variant of [`Command`], dispatched once in [`run`].
//! Handlers write user-facing text to the supplied writer and report failures
//! as [`CommandError`]; only `main` decides to exit.

mod agg;
mod browse;
mod feeds;
mod follows;
mod users;

use clap::Subcommand;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, ConfigError};
use crate::feed::FetchError;
use crate::storage::{Database, DatabaseError, User};
use crate::util::UrlValidationError;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Not logged in. Run `gator register <name>` or `gator login <name>` first.")]
    NotLoggedIn,

    #[error("User {0} does not exist")]
    UnknownUser(String),

    #[error("User {0} already exists")]
    UserExists(String),

    #[error("No feed with URL {0}. Add it with `gator addfeed <name> <url>`.")]
    FeedNotFound(String),

    #[error("A feed with URL {0} already exists. Follow it with `gator follow <url>`.")]
    FeedExists(String),

    #[error("Already following {0}")]
    AlreadyFollowing(String),

    #[error("Not following {0}")]
    NotFollowing(String),

    #[error("Invalid feed URL: {0}")]
    InvalidUrl(#[from] UrlValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] DatabaseError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a user and log in as them
    Register { name: String },

    /// Switch the current user
    Login { name: String },

    /// List all users
    Users,

    /// Delete every user, feed, follow and post
    Reset,

    /// Fetch feeds forever, one per tick (e.g. `1m`, `30s`, `1h30m`)
    Agg {
        #[arg(value_name = "INTERVAL")]
        interval: String,
    },

    /// Add a feed and follow it
    #[command(name = "addfeed")]
    AddFeed { name: String, url: String },

    /// List all feeds and who added them
    Feeds,

    /// Follow an existing feed by URL
    Follow { url: String },

    /// List the feeds the current user follows
    Following,

    /// Stop following a feed
    Unfollow { url: String },

    /// Show the newest posts from followed feeds
    Browse {
        #[arg(default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
        limit: u32,
    },
}

/// Everything a handler may touch.
pub struct Context {
    pub db: Database,
    pub config: Config,
    /// Where `config` is saved when the current user changes
    pub config_path: PathBuf,
    /// Fired on Ctrl-C; stops `agg`
    pub cancel: CancellationToken,
}

impl Context {
    pub fn new(db: Database, config: Config, config_path: PathBuf, cancel: CancellationToken) -> Self {
        Self {
            db,
            config,
            config_path,
            cancel,
        }
    }

    /// Resolve the configured user, failing if nobody is logged in or the
    /// user was deleted since.
    pub async fn current_user(&self) -> Result<User, CommandError> {
        let name = self
            .config
            .current_user_name
            .as_deref()
            .ok_or(CommandError::NotLoggedIn)?;
        self.db
            .get_user_by_name(name)
            .await?
            .ok_or_else(|| CommandError::UnknownUser(name.to_string()))
    }
}

pub async fn run(ctx: &mut Context, command: Command, out: &mut dyn Write) -> Result<(), CommandError> {
    tracing::debug!(?command, "Running command");
    match command {
        Command::Register { name } => users::register(ctx, &name, out).await,
        Command::Login { name } => users::login(ctx, &name, out).await,
        Command::Users => users::list(ctx, out).await,
        Command::Reset => users::reset(ctx, out).await,
        Command::Agg { interval } => agg::run(ctx, &interval, out).await,
        Command::AddFeed { name, url } => feeds::add(ctx, &name, &url, out).await,
        Command::Feeds => feeds::list(ctx, out).await,
        Command::Follow { url } => follows::follow(ctx, &url, out).await,
        Command::Following => follows::following(ctx, out).await,
        Command::Unfollow { url } => follows::unfollow(ctx, &url, out).await,
        Command::Browse { limit } => browse::run(ctx, limit, out).await,
    }
}
