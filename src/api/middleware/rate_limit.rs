//! Rate limiting middleware using token bucket algorithm.

use anyhow::{Context, Result};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::PeerIpKeyExtractor,
};

pub type RateLimitLayer =
    GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

fn build(replenish_secs: u64, burst_size: u32) -> Result<RateLimitLayer> {
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(replenish_secs)
        .burst_size(burst_size)
        .finish()
        .with_context(|| {
            format!("Invalid rate limit: one request per {replenish_secs}s, burst {burst_size}")
        })?;

    Ok(GovernorLayer::new(Arc::new(governor_conf)))
}

/// Creates a rate limiter for public endpoints.
///
/// # Limits
///
/// - **Replenish**: one request every 2 seconds
/// - **Burst**: 100 requests
///
/// Requests exceeding the limit receive `429 Too Many Requests`.
///
/// # Key Extraction
///
/// Rate limits are applied per client IP address extracted from the
/// socket peer address, so the router must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
///
/// # Errors
///
/// Returns an error if the limits are rejected by the governor builder.
pub fn layer() -> Result<RateLimitLayer> {
    build(2, 100)
}

/// Creates a stricter rate limiter for the token endpoint.
///
/// # Limits
///
/// - **Replenish**: one request per second
/// - **Burst**: 10 requests
///
/// Slows down guessing of the login hash.
///
/// # Errors
///
/// Returns an error if the limits are rejected by the governor builder.
pub fn secure_layer() -> Result<RateLimitLayer> {
    build(1, 10)
}
