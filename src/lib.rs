//! gator: a command-line RSS aggregator.
//!
//! Users register, add and follow RSS feeds, and `gator agg` periodically
//! fetches the least recently fetched feed, storing each new item as a post
//! that `gator browse` lists.

pub mod commands;
pub mod config;
pub mod feed;
pub mod ingest;
pub mod storage;
pub mod util;
