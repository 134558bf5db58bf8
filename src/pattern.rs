//! Case-insensitive text matching shared by the query methods.

/// Substring match, or whole-string match when `restricted`.
/// Both sides are compared case-insensitively.
pub(crate) fn text_matches(haystack: &str, pattern: &str, restricted: bool) -> bool {
    let haystack = haystack.to_lowercase();
    let pattern = pattern.to_lowercase();
    if restricted {
        haystack == pattern
    } else {
        haystack.contains(&pattern)
    }
}
