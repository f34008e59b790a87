//! API route configuration.
//!
//! Routes are split by authentication requirement; the caller attaches the
//! [`crate::api::middleware::auth`] layer to [`protected_routes`].

use crate::api::handlers::{
    create_link_handler, delete_link_handler, index_handler, list_links_handler, login_handler,
    qrcode_handler, redirect_handler, rename_link_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, patch, post},
};

/// Routes open to anyone.
///
/// # Endpoints
///
/// - `GET  /`               - Liveness (`418`)
/// - `GET  /{code}`         - Short link redirect
/// - `GET  /{code}/qrcode`  - QR code download
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index_handler))
        .route("/{code}", get(redirect_handler))
        .route("/{code}/qrcode", get(qrcode_handler))
}

/// The token endpoint.
///
/// - `POST /login` - Exchange the shared-secret hash for a bearer token
pub fn login_routes() -> Router<AppState> {
    Router::new().route("/login", post(login_handler))
}

/// Routes that require a bearer token.
///
/// # Endpoints
///
/// - `GET   /all`   - List links
/// - `POST  /new`   - Create a link
/// - `POST  /del`   - Delete a link by id
/// - `PATCH /{id}`  - Rename a link
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/all", get(list_links_handler))
        .route("/new", post(create_link_handler))
        .route("/del", post(delete_link_handler))
        .route("/{code}", patch(rename_link_handler))
}
