//! Output file naming.
//!
//! `{collection}.{mode}.tokens.json`, no escaping unless asked for.

use once_cell::sync::Lazy;
use regex::Regex;

pub use crate::models::{ARCHIVE_FILE_NAME, MANIFEST_FILE_NAME};

/// Path separators and control characters.
static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[/\\\x00-\x1f\x7f]").expect("valid unsafe-char regex"));

/// Token file name for one mode of a collection.
pub fn token_file_name(collection_name: &str, mode: &str) -> String {
    format!("{}.{}.tokens.json", collection_name, mode)
}

/// Replace path separators and control characters with `_`.
///
/// A segment that would resolve to `.` or `..` is also replaced.
pub fn sanitize_segment(segment: &str) -> String {
    let cleaned = UNSAFE_CHARS.replace_all(segment, "_").into_owned();
    match cleaned.as_str() {
        "." | ".." => "_".repeat(cleaned.len()),
        _ => cleaned,
    }
}

/// Token file name with both segments sanitized.
pub fn safe_token_file_name(collection_name: &str, mode: &str) -> String {
    token_file_name(&sanitize_segment(collection_name), &sanitize_segment(mode))
}
