//! Fetching and decoding RSS feed documents.
//!
//! - [`parser`] - Event-driven RSS 2.0 channel parser built on `quick-xml`
//! - [`fetcher`] - Single-shot HTTP retrieval with a timeout, size cap, and
//!   cancellation
//!
//! # Example
//!
//! ```ignore
//! use gator::feed::FeedFetcher;
//! use tokio_util::sync::CancellationToken;
//!
//! let fetcher = FeedFetcher::new()?;
//! let doc = fetcher.fetch("https://wagslane.dev/index.xml", &CancellationToken::new()).await?;
//! for item in &doc.items {
//!     println!("{}", item.title);
//! }
//! ```

mod fetcher;
mod parser;

pub use fetcher::{FeedFetcher, FetchError, DEFAULT_TIMEOUT};
pub use parser::{parse_document, FeedDocument, FeedItem, ParseError};
