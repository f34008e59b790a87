//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET   /`               - Liveness, answers `418` (public)
//! - `GET   /{code}`         - Short link redirect (public)
//! - `GET   /{code}/qrcode`  - QR code download (public)
//! - `POST  /login`          - Bearer token issuance (shared-secret hash)
//! - `GET   /all`, `POST /new`, `POST /del`, `PATCH /{id}` - Link management (Bearer token required)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket, stricter on `/login`
//! - **Authentication** - RS256 bearer token on management routes
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::middleware::{auth, rate_limit, tracing};
use crate::state::AppState;
use anyhow::Result;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// The router must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`: rate limiting and
/// the index handler read the peer address.
///
/// # Errors
///
/// Returns an error if a rate limiter cannot be built.
pub fn app_router(state: AppState) -> Result<NormalizePath<Router>> {
    let protected = api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer))
        .layer(rate_limit::layer()?);

    let login = api::routes::login_routes().layer(rate_limit::secure_layer()?);

    let public = api::routes::public_routes().layer(rate_limit::layer()?);

    let router = Router::new()
        .merge(public)
        .merge(login)
        .merge(protected)
        .with_state(state)
        .layer(tracing::layer());

    Ok(NormalizePathLayer::trim_trailing_slash().layer(router))
}
