use regex::Regex;
use std::sync::LazyLock;

static PROFILE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:instagram|facebook|twitter)\.com/([a-zA-Z0-9_.]+)")
        .expect("profile URL pattern is valid")
});

/// Extracts the username from an Instagram, Facebook or Twitter profile URL.
///
/// The pattern is searched anywhere in the string and the first match wins.
/// Nothing is normalized: case, query strings and trailing slashes are left
/// to what the pattern happens to accept.
pub fn extract_username(url: &str) -> Option<&str> {
    PROFILE_URL
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
