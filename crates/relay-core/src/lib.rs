//! Foundational low-level utilities shared across relay crates.
//!
//! Provides wall-clock helpers used by webhook freshness checks and text
//! truncation used when echoing remote payloads into logs or chat replies.

pub mod text_utils;
pub mod time_utils;

pub use text_utils::{truncate_for_error, truncate_chars};
pub use time_utils::{current_unix_timestamp, is_within_skew};
