//! DTOs for the token endpoint.

use serde::{Deserialize, Serialize};

/// Login challenge.
///
/// Both fields are optional on the wire so that a missing field is answered
/// with the same `401` as a wrong hash.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub user: Option<String>,

    /// `sha256(user + password + salt)` as lowercase hex.
    pub hash: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}
