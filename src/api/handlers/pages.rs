//! Static HTML pages served to browsers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Page shown when a short link cannot be followed.
///
/// Renders `templates/not_found.html`; `code` is escaped by askama.
#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundPage {
    pub code: String,
}

/// `404 Not Found` with the HTML page for `code`.
pub fn not_found(code: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        NotFoundPage {
            code: code.to_string(),
        },
    )
        .into_response()
}
