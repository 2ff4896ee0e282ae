use std::io::Write;

use super::{CommandError, Context};
use crate::storage::DatabaseError;
use crate::util::{strip_control_chars, validate_feed_url};

/// `addfeed`: the new feed is owned and followed by the current user.
pub(super) async fn add(ctx: &Context, name: &str, url: &str, out: &mut dyn Write) -> Result<(), CommandError> {
    let user = ctx.current_user().await?;
    let url = validate_feed_url(url)?;

    let feed = ctx
        .db
        .create_feed(name, url.as_str(), user.id)
        .await
        .map_err(|e| match e {
            DatabaseError::AlreadyExists { .. } => CommandError::FeedExists(url.to_string()),
            other => other.into(),
        })?;
    tracing::info!(feed = %feed.name, url = %feed.url, user = %user.name, "Feed added");
    writeln!(
        out,
        "Feed {} added: {}",
        strip_control_chars(&feed.name),
        strip_control_chars(&feed.url)
    )?;

    let follow = ctx.db.create_follow(user.id, feed.id).await?;
    writeln!(
        out,
        "{} is now following {}",
        strip_control_chars(&follow.user_name),
        strip_control_chars(&follow.feed_name)
    )?;
    Ok(())
}

pub(super) async fn list(ctx: &Context, out: &mut dyn Write) -> Result<(), CommandError> {
    let feeds = ctx.db.get_feeds_with_owners().await?;
    if feeds.is_empty() {
        writeln!(out, "No feeds yet. Add one with `gator addfeed <name> <url>`.")?;
        return Ok(());
    }

    for feed in feeds {
        writeln!(
            out,
            "Feed: {} - URL: '{}' - Added by: {}",
            strip_control_chars(&feed.name),
            strip_control_chars(&feed.url),
            strip_control_chars(&feed.owner_name)
        )?;
    }
    Ok(())
}
