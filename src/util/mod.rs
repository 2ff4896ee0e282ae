//! Utility functions shared by the commands and the ingestion pipeline.
//!
//! - **Durations**: Parse and print polling intervals such as `1m30s`
//! - **Text processing**: Single-pass HTML unescaping and terminal sanitising
//! - **URL validation**: Reject feed URLs the fetcher cannot GET

mod duration;
mod text;
mod url_validator;

pub use duration::{format_duration, parse_duration, DurationError};
pub use text::{strip_control_chars, unescape_html};
pub use url_validator::{validate_feed_url, UrlValidationError};
