//! Handlers for link management endpoints (list, create, delete, rename).

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection, rejection::PathRejection},
};
use serde_json::json;
use validator::Validate;

use crate::api::dto::link::{
    DeleteLinkRequest, DeleteLinkResponse, NewLinkRequest, NewLinkResponse, RenameLinkRequest,
};
use crate::domain::entities::Link;
use crate::error::AppError;
use crate::state::AppState;

/// Lists every link.
///
/// # Endpoint
///
/// `GET /all`
///
/// # Response
///
/// ```json
/// [
///   {
///     "id": 1,
///     "codigo": "aB3xZ",
///     "url": "https://example.com",
///     "nome": "Example",
///     "visitas": 12,
///     "expira_em": null
///   }
/// ]
/// ```
pub async fn list_links_handler(State(state): State<AppState>) -> Result<Json<Vec<Link>>, AppError> {
    let links = state.link_service.list_links().await?;
    Ok(Json(links))
}

/// Creates a short link with a generated code.
///
/// # Endpoint
///
/// `POST /new`
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com",
///   "nome": "Example",
///   "expira_em": "2030-12-31"   // optional
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "urlEnviada": "https://example.com",
///   "urlCriada": "https://s.example.com/aB3xZ",
///   "nome": "Example"
/// }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request if a field is missing or blank.
pub async fn create_link_handler(
    State(state): State<AppState>,
    payload: Result<Json<NewLinkRequest>, JsonRejection>,
) -> Result<Json<NewLinkResponse>, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let link = state
        .link_service
        .create_link(&payload.url, &payload.name, payload.expires_on)
        .await?;

    Ok(Json(NewLinkResponse {
        short_url: state.link_service.short_url(&link.code),
        submitted_url: link.url,
        name: link.name,
    }))
}

/// Deletes a link by id.
///
/// # Endpoint
///
/// `POST /del`
///
/// # Request Body
///
/// ```json
/// { "id": 1 }
/// ```
///
/// # Errors
///
/// Returns 404 Not Found if no link has this id.
pub async fn delete_link_handler(
    State(state): State<AppState>,
    payload: Result<Json<DeleteLinkRequest>, JsonRejection>,
) -> Result<Json<DeleteLinkResponse>, AppError> {
    let Json(payload) = payload?;

    let deleted = state.link_service.delete_link(payload.id).await?;

    Ok(Json(DeleteLinkResponse { deleted }))
}

/// Renames a link.
///
/// # Endpoint
///
/// `PATCH /{id}`
///
/// # Request Body
///
/// ```json
/// { "nome": "New name" }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request if the id is not numeric or the name is empty or
/// longer than 100 characters after trimming.
/// Returns 404 Not Found if no link has this id.
pub async fn rename_link_handler(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<RenameLinkRequest>, JsonRejection>,
) -> Result<Json<Link>, AppError> {
    let Path(id) = id.map_err(|e| {
        AppError::bad_request("Link id must be a number", json!({ "reason": e.body_text() }))
    })?;
    let Json(payload) = payload?;

    let link = state.link_service.rename_link(id, &payload.name).await?;

    Ok(Json(link))
}
