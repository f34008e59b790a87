//! Token issuance and verification.

use chrono::Utc;
use jsonwebtoken::{Algorithm, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::error::AppError;
use crate::infrastructure::keys::SigningKeys;
use crate::utils::hashing::{constant_time_eq, login_hash};

/// Shared-secret material for the login challenge.
#[derive(Debug, Clone)]
pub struct MasterCredentials {
    pub user: String,
    pub password: String,
    pub salt: String,
}

/// Claims carried by issued tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues RS256 tokens for the master user and verifies them.
///
/// A client proves knowledge of the shared secret by sending
/// `sha256(user + password + salt)`. The hash must match both the value
/// computed for the submitted user and the one computed for the master user.
pub struct AuthService {
    credentials: MasterCredentials,
    keys: SigningKeys,
    token_ttl_secs: i64,
}

impl AuthService {
    pub fn new(credentials: MasterCredentials, keys: SigningKeys, token_ttl_secs: i64) -> Self {
        Self {
            credentials,
            keys,
            token_ttl_secs,
        }
    }

    fn rejected() -> AppError {
        AppError::unauthorized("Unauthorized", json!({}))
    }

    /// Checks the login challenge and returns a signed token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if a field is missing or the hash does
    /// not match; the response never tells which check failed.
    /// Returns [`AppError::Internal`] if signing fails.
    pub fn issue_token(&self, user: Option<&str>, hash: Option<&str>) -> Result<String, AppError> {
        let (Some(user), Some(hash)) = (user.filter(|u| !u.is_empty()), hash.filter(|h| !h.is_empty()))
        else {
            warn!("Login attempt with missing fields");
            return Err(Self::rejected());
        };

        let MasterCredentials {
            user: master_user,
            password,
            salt,
        } = &self.credentials;

        let for_submitted_user = login_hash(user, password, salt);
        let for_master_user = login_hash(master_user, password, salt);

        // both comparisons always run
        let accepted =
            constant_time_eq(hash, &for_submitted_user) & constant_time_eq(hash, &for_master_user);

        if !accepted {
            warn!(user, "Login attempt rejected");
            return Err(Self::rejected());
        }

        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.to_string(),
            iat: now,
            exp: now + self.token_ttl_secs,
        };

        let token = encode(&Header::new(Algorithm::RS256), &claims, &self.keys.encoding).map_err(
            |e| AppError::internal("Failed to sign token", json!({ "reason": e.to_string() })),
        )?;

        info!(user, expires_in = self.token_ttl_secs, "Token issued");
        Ok(token)
    }

    /// Verifies signature and expiry of a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] for any invalid, expired or foreign token.
    pub fn authenticate(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<Claims>(token, &self.keys.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                warn!(error = %e, "Bearer token rejected");
                AppError::unauthorized(
                    "Unauthorized",
                    json!({ "reason": "Invalid or expired token" }),
                )
            })
    }
}
