//! Hashing helpers for the login challenge.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Lowercase hex SHA-256 of `input`.
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Expected login hash for `user`: `sha256(user + password + salt)`.
pub fn login_hash(user: &str, password: &str, salt: &str) -> String {
    sha256_hex(&format!("{user}{password}{salt}"))
}

/// Compares two strings without short-circuiting on the first difference.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_login_hash_concatenates_in_order() {
        assert_eq!(login_hash("admin", "pw", "salt"), sha256_hex("adminpwsalt"));
        assert_ne!(login_hash("admin", "pw", "salt"), login_hash("pw", "admin", "salt"));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "abcd"));
    }
}
