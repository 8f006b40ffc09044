//! Short code generation and target URL validation

use rand::Rng;
use url::Url;

/// Length of every generated code
pub const CODE_LENGTH: usize = 10;

/// URL-safe 64-symbol alphabet
const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// Generates a random 10-character URL-safe code.
///
/// Collisions are not checked here; `UrlStore::append_entry` rejects codes
/// already present in the index and asks for another one.
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
        .collect()
}

/// Longest accepted target URL; also the character limit of a spreadsheet cell
pub const MAX_URL_LENGTH: usize = 32_767;

/// Returns true when `input` is an absolute http(s) URL with a host, no
/// longer than [`MAX_URL_LENGTH`] bytes.
///
/// Whitespace and control characters are rejected outright: the parser would
/// silently strip them, but the raw string ends up in a `Location` header.
pub fn is_valid_url(input: &str) -> bool {
    if input.len() > MAX_URL_LENGTH {
        return false;
    }
    if input.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }
    match Url::parse(input) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}
