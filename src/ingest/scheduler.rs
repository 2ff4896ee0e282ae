use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::pipeline::{IngestionPipeline, IngestionReport};
use super::store::FeedStore;
use crate::config::ConfigError;
use crate::util::{format_duration, DurationError};

/// Periodic driver that ingests the least recently fetched feed on every tick.
pub struct FeedScheduler<S> {
    pipeline: IngestionPipeline<S>,
}

impl<S: FeedStore> FeedScheduler<S> {
    pub fn new(pipeline: IngestionPipeline<S>) -> Self {
        Self { pipeline }
    }

    /// Tick every `interval` until `cancel` fires.
    ///
    /// The first tick fires immediately. Cycles never overlap: a cycle that
    /// runs past the next tick delays it rather than queueing extra ticks.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidInterval` for a zero interval, before any
    /// feed is touched. Nothing that happens inside a cycle is returned.
    pub async fn run(&self, interval: Duration, cancel: &CancellationToken) -> Result<(), ConfigError> {
        if interval.is_zero() {
            return Err(ConfigError::InvalidInterval(DurationError::NotPositive(
                format_duration(interval),
            )));
        }

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(interval = %format_duration(interval), "Collecting feeds");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            self.run_cycle(cancel).await;
        }

        tracing::info!("Feed collection stopped");
        Ok(())
    }

    /// Select the next feed and ingest it. `None` when no cycle ran.
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> Option<IngestionReport> {
        match self.pipeline.store().next_feed_to_fetch().await {
            Ok(Some(feed)) => {
                tracing::debug!(feed = %feed.name, url = %feed.url, "Selected feed");
                Some(self.pipeline.ingest_once(&feed, cancel).await)
            }
            Ok(None) => {
                tracing::info!("No feeds to fetch");
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to select next feed");
                None
            }
        }
    }
}
