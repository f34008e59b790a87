//! Handler for QR code download.

use axum::{
    extract::{Path, Query, State, rejection::QueryRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::debug;
use validator::Validate;

use crate::api::dto::qrcode::QrCodeQuery;
use crate::api::handlers::pages;
use crate::error::AppError;
use crate::infrastructure::qr::render_qr;
use crate::state::AppState;

/// Serves a QR code of the short URL as a file download.
///
/// # Endpoint
///
/// `GET /{code}/qrcode?format=png|svg&scale=N&width=N`
///
/// - `format` - `png` (default) or `svg`
/// - `scale` - pixels per module, 1 to 40 (default: 4)
/// - `width` - minimum image width in pixels, 21 to 4096
///
/// The code always encodes `DOMAIN + code` with error correction level H and
/// is sent as `shortlink.png` or `shortlink.svg`.
///
/// # Errors
///
/// Returns 400 Bad Request for invalid query parameters.
/// Malformed, unknown and expired codes are answered with the HTML
/// not-found page.
pub async fn qrcode_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    query: Result<Query<QrCodeQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query.map_err(|e| {
        AppError::bad_request("Invalid query parameters", json!({ "reason": e.body_text() }))
    })?;
    query.validate()?;

    let link = match state.link_service.resolve_active(&code).await {
        Ok(link) => link,
        Err(e) => {
            debug!(code, error = %e, "QR code refused");
            return Ok(pages::not_found(&code));
        }
    };

    let options = query.options();
    let short_url = state.link_service.short_url(&link.code);

    let image = render_qr(&short_url, &options).map_err(|e| {
        AppError::internal("Failed to render QR code", json!({ "reason": e.to_string() }))
    })?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, options.format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", options.format.file_name()),
            ),
        ],
        image,
    )
        .into_response())
}
