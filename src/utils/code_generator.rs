//! Short code generation and validation utilities.
//!
//! Codes are fixed-length strings over the 62 ASCII alphanumeric characters.
//! Uniqueness is not guaranteed here; see
//! [`crate::application::services::LinkService`].

use rand::Rng;
use rand::distr::Alphanumeric;

/// Generates a random alphanumeric code of `length` characters.
///
/// Uses the thread-local non-cryptographic RNG; codes are identifiers, not
/// secrets.
///
/// # Examples
///
/// ```ignore
/// let code = generate_code(5);
/// assert_eq!(code.len(), 5);
/// assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
/// ```
pub fn generate_code(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Checks that `code` is present and made of exactly `length` ASCII
/// alphanumeric characters.
///
/// # Examples
///
/// ```ignore
/// assert!(is_valid_code(5, Some("AbC12")));
/// assert!(!is_valid_code(5, Some("AbC1")));     // Too short
/// assert!(!is_valid_code(5, Some("AbC1-")));    // Hyphen
/// assert!(!is_valid_code(5, None));
/// ```
pub fn is_valid_code(length: usize, code: Option<&str>) -> bool {
    code.is_some_and(|c| c.len() == length && c.chars().all(|ch| ch.is_ascii_alphanumeric()))
}
