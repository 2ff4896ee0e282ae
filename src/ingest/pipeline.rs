use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc, Weekday};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::store::FeedStore;
use crate::feed::{FeedFetcher, FeedItem};
use crate::storage::{Feed, NewPost};

/// Outcome counts for one ingestion cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestionReport {
    /// Items in the fetched document
    pub posts_found: usize,
    /// Items inserted as new posts
    pub posts_stored: usize,
    /// Items skipped because the (feed, url) pair was already stored
    pub duplicates: usize,
    /// Items skipped because the store rejected them for any other reason
    pub failures: usize,
}

/// Turns one feed's remote document into stored posts.
pub struct IngestionPipeline<S> {
    store: S,
    fetcher: FeedFetcher,
}

impl<S: FeedStore> IngestionPipeline<S> {
    pub fn new(store: S, fetcher: FeedFetcher) -> Self {
        Self { store, fetcher }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one ingestion cycle for `feed`.
    ///
    /// The feed is marked fetched before the request goes out, so a feed whose
    /// fetch keeps failing still rotates to the back of the queue. Nothing in
    /// here is fatal: a failed mark is logged and ignored, a failed fetch ends
    /// the cycle with an empty report, and a failed insert skips that item.
    pub async fn ingest_once(&self, feed: &Feed, cancel: &CancellationToken) -> IngestionReport {
        let fetched_at = Utc::now();
        if let Err(e) = self.store.mark_feed_fetched(feed.id, fetched_at).await {
            tracing::warn!(feed = %feed.name, error = %e, "Failed to mark feed as fetched");
        }

        let document = match self.fetcher.fetch(&feed.url, cancel).await {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(feed = %feed.name, url = %feed.url, error = %e, "Failed to fetch feed");
                return IngestionReport::default();
            }
        };

        let mut report = IngestionReport {
            posts_found: document.items.len(),
            ..IngestionReport::default()
        };

        for item in document.items {
            let post = new_post(feed.id, item);
            match self.store.create_post(&post).await {
                Ok(()) => report.posts_stored += 1,
                Err(e) if e.is_duplicate_post() => report.duplicates += 1,
                Err(e) => {
                    report.failures += 1;
                    tracing::warn!(feed = %feed.name, url = %post.url, error = %e, "Failed to store post");
                }
            }
        }

        tracing::info!(
            feed = %feed.name,
            fetched_at = %fetched_at.to_rfc3339(),
            found = report.posts_found,
            stored = report.posts_stored,
            duplicates = report.duplicates,
            failures = report.failures,
            "Feed collected"
        );
        report
    }
}

fn new_post(feed_id: Uuid, item: FeedItem) -> NewPost {
    let published_at = parse_pub_date(&item.pub_date);
    if published_at.is_none() && !item.pub_date.is_empty() {
        tracing::debug!(url = %item.link, pub_date = %item.pub_date, "Unrecognised publish date");
    }

    NewPost {
        id: Uuid::new_v4(),
        feed_id,
        title: item.title,
        url: item.link,
        description: Some(item.description),
        published_at,
    }
}

/// Parses an RSS `pubDate`, keeping the zone offset it declares.
///
/// Exactly two forms are accepted, numeric zone first:
///
/// - `Mon, 02 Jan 2006 15:04:05 -0700`
/// - `Mon, 02 Jan 2006 15:04:05 MST`
///
/// The weekday must be a valid name but is not checked against the date.
/// `UT`, `UTC`, `GMT` and the North American zones from RFC 822 map to their
/// offsets; any other zone abbreviation is accepted at offset zero.
///
/// # Examples
///
/// ```
/// use gator::ingest::parse_pub_date;
///
/// let t = parse_pub_date("Mon, 02 Jan 2006 15:04:05 -0700").unwrap();
/// assert_eq!(t.to_rfc3339(), "2006-01-02T15:04:05-07:00");
/// assert!(parse_pub_date("not-a-date").is_none());
/// ```
pub fn parse_pub_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let (weekday, rest) = raw.trim().split_once(", ")?;
    if weekday.len() != 3 || weekday.parse::<Weekday>().is_err() {
        return None;
    }

    let (stamp, zone) = rest.rsplit_once(' ')?;
    if !is_two_digit_stamp(stamp) {
        return None;
    }
    let offset = numeric_offset(zone).or_else(|| named_offset(zone))?;
    let naive = NaiveDateTime::parse_from_str(stamp, "%d %b %Y %H:%M:%S").ok()?;

    naive.and_local_timezone(offset).single()
}

/// `DD Mon YYYY HH:MM:SS` with every numeric field zero-padded.
///
/// chrono's `%d` and `%H` also take a single digit, so the width is checked
/// here first.
fn is_two_digit_stamp(stamp: &str) -> bool {
    const DIGITS: [usize; 12] = [0, 1, 7, 8, 9, 10, 12, 13, 15, 16, 18, 19];
    let bytes = stamp.as_bytes();
    bytes.len() == 20
        && DIGITS.iter().all(|&i| bytes[i].is_ascii_digit())
        && bytes[14] == b':'
        && bytes[17] == b':'
}

/// `+HHMM` / `-HHMM`
fn numeric_offset(zone: &str) -> Option<FixedOffset> {
    let sign = match zone.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let digits = &zone[1..];
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn named_offset(zone: &str) -> Option<FixedOffset> {
    let hours = match zone {
        "UT" | "UTC" | "GMT" => 0,
        "EST" => -5,
        "EDT" => -4,
        "CST" => -6,
        "CDT" => -5,
        "MST" => -7,
        "MDT" => -6,
        "PST" => -8,
        "PDT" => -7,
        _ if is_zone_abbreviation(zone) => 0,
        _ => return None,
    };
    FixedOffset::east_opt(hours * 3600)
}

/// Three upper-case letters, or four to five ending in `T` (`AEST`, `CHADT`).
fn is_zone_abbreviation(zone: &str) -> bool {
    if !zone.bytes().all(|b| b.is_ascii_uppercase()) {
        return false;
    }
    match zone.len() {
        3 => true,
        4 | 5 => zone.ends_with('T'),
        _ => false,
    }
}
