//! Repository trait for short link data access.

use crate::domain::entities::{Link, NewLink};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for managing short links.
///
/// "Not found" is reported as `Ok(None)`; the service layer decides whether
/// that becomes an [`AppError::NotFound`].
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::SqlLinkRepository`] - MySQL / SQL Server
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Finds a link by its database id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn get_by_id(&self, id: i64) -> Result<Option<Link>, AppError>;

    /// Finds a link by its short code. The comparison is case-sensitive.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn get_by_code(&self, code: &str) -> Result<Option<Link>, AppError>;

    /// Inserts a link with zero visits and returns the generated id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors or if the backend
    /// does not report the new id.
    async fn insert(&self, new_link: NewLink) -> Result<i64, AppError>;

    /// Adds one to the visit counter in a single atomic statement.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn increment_visits(&self, id: i64) -> Result<(), AppError>;

    /// Writes `code`, `url`, `name` and `visits` of `link` to the row with its id.
    ///
    /// The stored visit counter is replaced by `link.visits`; increments
    /// committed after `link` was read are lost. Use [`Self::update_name`]
    /// to change only the name.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn update(&self, link: &Link) -> Result<(), AppError>;

    /// Sets the name of the row with `id`, leaving every other column as is.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn update_name(&self, id: i64, name: &str) -> Result<(), AppError>;

    /// Lists every link ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list(&self) -> Result<Vec<Link>, AppError>;

    /// Deletes a link and returns the row as it was before deletion.
    ///
    /// Returns `Ok(None)` without deleting anything if the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn delete_by_id(&self, id: i64) -> Result<Option<Link>, AppError>;

    /// Deletes every link whose expiration date lies before today.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn delete_all_expired(&self) -> Result<u64, AppError>;
}
