//! The feed ingestion loop.
//!
//! [`FeedScheduler`] picks the least recently fetched feed on every tick and
//! hands it to [`IngestionPipeline`], which fetches the document and stores
//! each item as a post. Both talk to storage only through [`FeedStore`].

mod pipeline;
mod scheduler;
mod store;

pub use pipeline::{parse_pub_date, IngestionPipeline, IngestionReport};
pub use scheduler::FeedScheduler;
pub use store::FeedStore;
