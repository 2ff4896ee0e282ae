use chrono::DateTime;
use std::io::Write;

use super::{CommandError, Context};
use crate::storage::PostWithFeed;
use crate::util::strip_control_chars;

const SEPARATOR: &str = "==================================================";

pub(super) async fn run(ctx: &Context, limit: u32, out: &mut dyn Write) -> Result<(), CommandError> {
    let user = ctx.current_user().await?;
    let posts = ctx.db.get_posts_for_user(user.id, limit).await?;

    if posts.is_empty() {
        writeln!(out, "No posts yet. Follow a feed and run `gator agg <interval>` to collect some.")?;
        return Ok(());
    }

    for post in &posts {
        write_post(out, post)?;
    }
    Ok(())
}

/// SEC-001: everything but the date is remote text and goes through
/// `strip_control_chars` before reaching the terminal.
fn write_post(out: &mut dyn Write, post: &PostWithFeed) -> std::io::Result<()> {
    let date = post
        .published_at
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .map(|t| t.format("%a %b %-d %Y").to_string())
        .unwrap_or_else(|| "Undated".to_string());

    writeln!(out, "{} from {}", date, strip_control_chars(&post.feed_name))?;
    writeln!(out, "--- {} ---", strip_control_chars(&post.title))?;
    let description = post.description.as_deref().unwrap_or("").trim();
    if !description.is_empty() {
        writeln!(out, "    {}", strip_control_chars(description))?;
    }
    writeln!(out, "Link: {}", strip_control_chars(&post.url))?;
    writeln!(out, "{}", SEPARATOR)
}
