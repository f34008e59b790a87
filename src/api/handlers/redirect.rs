//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, warn};

use crate::api::handlers::pages;
use crate::domain::visit_event::VisitEvent;
use crate::state::AppState;

pub const REDIRECT_CACHE_CONTROL: &str = "no-cache, no-store, max-age=3600, must-revalidate";

/// Redirects a short code to its destination URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Request Flow
///
/// 1. Check the code shape, fetch the link, check its expiration
/// 2. Send a visit event to the background worker
/// 3. Return `302 Found`
///
/// # Visit Tracking
///
/// Visit events go to a bounded channel. If the queue is full, the visit is
/// dropped and logged; the redirect is never delayed by the counter.
///
/// # Errors
///
/// Malformed, unknown and expired codes as well as database failures are
/// answered with the HTML not-found page.
pub async fn redirect_handler(Path(code): Path<String>, State(state): State<AppState>) -> Response {
    let link = match state.link_service.resolve_active(&code).await {
        Ok(link) => link,
        Err(e) => {
            debug!(code, error = %e, "Redirect refused");
            return pages::not_found(&code);
        }
    };

    match state
        .visit_sender
        .try_send(VisitEvent::new(link.id, link.code.as_str()))
    {
        Ok(()) => {}
        Err(TrySendError::Full(event)) => {
            warn!(link_id = event.link_id, code = %event.code, "Visit queue full, visit dropped");
        }
        Err(TrySendError::Closed(event)) => {
            error!(link_id = event.link_id, code = %event.code, "Visit worker is gone, visit dropped");
        }
    }

    (
        StatusCode::FOUND,
        [
            (header::LOCATION, link.url),
            (header::CACHE_CONTROL, REDIRECT_CACHE_CONTROL.to_string()),
        ],
    )
        .into_response()
}
