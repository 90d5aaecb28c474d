//! Local sanity check for submitted keys.
//!
//! This does not contact the provider; it only rejects input that cannot be a usable key.

/// Shortest key accepted. Real provider keys are far longer.
pub const MIN_API_KEY_LEN: usize = 16;

pub fn looks_like_api_key(key: &str) -> bool {
    let len = key.chars().count();
    let valid = len >= MIN_API_KEY_LEN && !key.chars().any(|c| c.is_whitespace() || c.is_control());
    tracing::debug!(chars = len, valid, "checked api key shape");
    valid
}
