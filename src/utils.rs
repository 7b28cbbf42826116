use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

pub fn generate_code_verifier() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(128)
        .map(char::from)
        .collect()
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

pub fn unix_now() -> u64 {
    Utc::now().timestamp() as u64
}

/// Makes a string safe to use as a single path component.
///
/// Path separators, characters reserved on Windows and control characters are
/// replaced with `_`. Leading/trailing whitespace and dots are trimmed so the
/// result can't turn into `.` or `..`. An empty result becomes `_`.
pub fn sanitize_component(input: &str) -> String {
    let sanitized: String = input
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | '?' | '*' | '"' | '<' | '>' | '|' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = sanitized.trim().trim_matches('.').trim();
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Converts a millisecond duration to whole seconds, rounded to nearest.
pub fn duration_secs(duration_ms: u64) -> u64 {
    (duration_ms + 500) / 1000
}
