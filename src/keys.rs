//! Key derivation: free-text titles -> partition/row key strings.

use regex::Regex;
use std::sync::OnceLock;

/// Partition key shared by every module record.
pub const MODULE_PARTITION: &str = "default";

fn non_key_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z_]").expect("static key pattern"))
}

/// Lowercase, spaces to underscores, then drop everything outside `[a-z_]`.
/// e.g. "Daily Life!" -> "daily_life", "Café" -> "caf"
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase().replace(' ', "_");
    non_key_chars().replace_all(&lowered, "").into_owned()
}
