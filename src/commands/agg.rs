use std::io::Write;

use super::{CommandError, Context};
use crate::config::ConfigError;
use crate::feed::FeedFetcher;
use crate::ingest::{FeedScheduler, IngestionPipeline};
use crate::util::{format_duration, parse_duration};

/// `agg`: collect feeds until the context's cancellation token fires.
///
/// The interval is validated before anything is fetched.
pub(super) async fn run(ctx: &Context, interval: &str, out: &mut dyn Write) -> Result<(), CommandError> {
    let interval = parse_duration(interval).map_err(ConfigError::from)?;
    let fetcher = FeedFetcher::new()?;
    let scheduler = FeedScheduler::new(IngestionPipeline::new(ctx.db.clone(), fetcher));

    writeln!(out, "Collecting feeds every {}", format_duration(interval))?;
    out.flush()?;

    scheduler.run(interval, &ctx.cancel).await?;
    writeln!(out, "Stopped collecting feeds")?;
    Ok(())
}
