//! Handler for the token endpoint.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

use crate::api::dto::login::{LoginRequest, TokenResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Exchanges the shared-secret hash for a bearer token.
///
/// # Endpoint
///
/// `POST /login`
///
/// # Request Body
///
/// ```json
/// { "user": "admin", "hash": "<sha256(user + password + salt)>" }
/// ```
///
/// # Response
///
/// ```json
/// { "token": "eyJhbGciOiJSUzI1NiJ9..." }
/// ```
///
/// # Errors
///
/// Returns 401 Unauthorized for a missing field, an unreadable body or a
/// wrong hash, without telling which.
pub async fn login_handler(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();

    let token = state
        .auth_service
        .issue_token(payload.user.as_deref(), payload.hash.as_deref())?;

    Ok(Json(TokenResponse { token }))
}
