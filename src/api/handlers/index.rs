//! Handler for the root path.

use axum::{
    extract::ConnectInfo,
    http::{HeaderMap, StatusCode, header},
};
use std::net::SocketAddr;
use tracing::info;

/// Liveness answer.
///
/// # Endpoint
///
/// `GET /`
///
/// Logs the `Host` header and the caller's IP and always answers
/// `418 I'm a teapot`.
pub async fn index_handler(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> StatusCode {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    info!(host, ip = %addr.ip(), "Index requested");

    StatusCode::IM_A_TEAPOT
}
