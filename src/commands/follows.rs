use std::io::Write;

use super::{CommandError, Context};
use crate::storage::{DatabaseError, Feed};
use crate::util::{strip_control_chars, validate_feed_url};

/// Look a feed up by URL, normalised the same way `addfeed` stored it.
async fn feed_by_url(ctx: &Context, url: &str) -> Result<Feed, CommandError> {
    let url = validate_feed_url(url)?;
    ctx.db
        .get_feed_by_url(url.as_str())
        .await?
        .ok_or_else(|| CommandError::FeedNotFound(url.to_string()))
}

pub(super) async fn follow(ctx: &Context, url: &str, out: &mut dyn Write) -> Result<(), CommandError> {
    let user = ctx.current_user().await?;
    let feed = feed_by_url(ctx, url).await?;

    let follow = ctx
        .db
        .create_follow(user.id, feed.id)
        .await
        .map_err(|e| match e {
            DatabaseError::AlreadyExists { .. } => CommandError::AlreadyFollowing(feed.name.clone()),
            other => other.into(),
        })?;
    writeln!(
        out,
        "{} is now following {}",
        strip_control_chars(&follow.user_name),
        strip_control_chars(&follow.feed_name)
    )?;
    Ok(())
}

pub(super) async fn following(ctx: &Context, out: &mut dyn Write) -> Result<(), CommandError> {
    let user = ctx.current_user().await?;
    let follows = ctx.db.get_follows_for_user(user.id).await?;

    if follows.is_empty() {
        writeln!(out, "{} is not following any feeds.", strip_control_chars(&user.name))?;
        return Ok(());
    }
    writeln!(out, "{} is following:", strip_control_chars(&user.name))?;
    for follow in follows {
        writeln!(out, "* {}", strip_control_chars(&follow.feed_name))?;
    }
    Ok(())
}

pub(super) async fn unfollow(ctx: &Context, url: &str, out: &mut dyn Write) -> Result<(), CommandError> {
    let user = ctx.current_user().await?;
    let feed = feed_by_url(ctx, url).await?;

    if !ctx.db.delete_follow(user.id, feed.id).await? {
        return Err(CommandError::NotFollowing(feed.name));
    }
    writeln!(out, "{} is no longer following {}", strip_control_chars(&user.name), strip_control_chars(&feed.name))?;
    Ok(())
}
