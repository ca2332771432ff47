//! Log sanitization utilities
//!
//! Keeps user-typed filter text and row payloads from flooding debug/error
//! logs.

/// Maximum number of characters kept in log output.
const TRUNCATE_LIMIT: usize = 120;

/// Truncate a string for safe logging.
///
/// Returns the original string if it has at most `TRUNCATE_LIMIT` characters,
/// otherwise the first `TRUNCATE_LIMIT` characters followed by a marker with
/// the total character count. Control characters are replaced by spaces so a
/// pasted multi-line value stays on one log line.
pub fn truncate_for_log(s: &str) -> String {
    let total = s.chars().count();
    let kept: String = s
        .chars()
        .take(TRUNCATE_LIMIT)
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    if total <= TRUNCATE_LIMIT {
        kept
    } else {
        format!("{kept}... [{total} chars]")
    }
}
