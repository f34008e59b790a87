//! Link creation, lookup and maintenance service.

use chrono::NaiveDate;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::entities::{Link, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::code_generator::{generate_code, is_valid_code};

/// Maximum length of a link name, in characters.
pub const MAX_NAME_CHARS: usize = 100;

/// Service for creating, resolving and maintaining short links.
///
/// Generic over the repository so unit tests can inject mocks; the server uses
/// `LinkService<dyn LinkRepository>`.
pub struct LinkService<L: LinkRepository + ?Sized> {
    repository: Arc<L>,
    code_length: usize,
    domain: String,
}

impl<L: LinkRepository + ?Sized> LinkService<L> {
    /// Creates a new link service.
    ///
    /// # Arguments
    ///
    /// - `repository` - link storage
    /// - `code_length` - length of generated codes
    /// - `domain` - prefix of every short URL, e.g. `https://s.example.com/`
    pub fn new(repository: Arc<L>, code_length: usize, domain: impl Into<String>) -> Self {
        Self {
            repository,
            code_length,
            domain: domain.into(),
        }
    }

    pub fn code_length(&self) -> usize {
        self.code_length
    }

    /// Builds the public short URL for `code`.
    pub fn short_url(&self, code: &str) -> String {
        format!("{}{}", self.domain, code)
    }

    /// Creates a link with a freshly generated unique code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `url` or `name` is blank.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn create_link(
        &self,
        url: &str,
        name: &str,
        expires_on: Option<NaiveDate>,
    ) -> Result<Link, AppError> {
        let url = url.trim();
        let name = name.trim();

        if url.is_empty() || name.is_empty() {
            return Err(AppError::bad_request(
                "url and nome must not be blank",
                json!({ "url_blank": url.is_empty(), "nome_blank": name.is_empty() }),
            ));
        }

        let code = self.generate_unique_code().await?;
        let new_link = NewLink {
            code,
            url: url.to_string(),
            name: name.to_string(),
            expires_on,
        };

        let id = self.repository.insert(new_link.clone()).await?;
        info!(id, code = %new_link.code, "Link created");

        Ok(Link {
            id,
            code: new_link.code,
            url: new_link.url,
            name: new_link.name,
            visits: 0,
            expires_on: new_link.expires_on,
        })
    }

    /// Resolves a code to a link that may be visited.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the code is malformed, unknown or
    /// the link has expired. Returns [`AppError::Internal`] on database errors.
    pub async fn resolve_active(&self, code: &str) -> Result<Link, AppError> {
        if !is_valid_code(self.code_length, Some(code)) {
            warn!(code, "Invalid code requested");
            return Err(AppError::not_found(
                "Short link not found",
                json!({ "code": code }),
            ));
        }

        let link = self.repository.get_by_code(code).await?.ok_or_else(|| {
            AppError::not_found("Short link not found", json!({ "code": code }))
        })?;

        if link.is_expired() {
            info!(id = link.id, code, name = %link.name, "Expired link requested");
            return Err(AppError::not_found(
                "Short link has expired",
                json!({ "code": code }),
            ));
        }

        Ok(link)
    }

    /// Lists every link ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn list_links(&self) -> Result<Vec<Link>, AppError> {
        self.repository.list().await
    }

    /// Deletes a link and returns it as it was.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link has this id.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn delete_link(&self, id: i64) -> Result<Link, AppError> {
        let link = self
            .repository
            .delete_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "id": id })))?;

        info!(id, code = %link.code, "Link deleted");
        Ok(link)
    }

    /// Renames a link.
    ///
    /// The name is trimmed and must hold 1 to [`MAX_NAME_CHARS`] characters.
    /// Only the name column is written, so visits recorded meanwhile are kept.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for an empty or too long name,
    /// [`AppError::NotFound`] for an unknown id and [`AppError::Internal`] on
    /// database errors.
    pub async fn rename_link(&self, id: i64, name: &str) -> Result<Link, AppError> {
        let name = name.trim();
        let chars = name.chars().count();

        if chars == 0 || chars > MAX_NAME_CHARS {
            return Err(AppError::bad_request(
                format!("nome must have between 1 and {MAX_NAME_CHARS} characters"),
                json!({ "length": chars }),
            ));
        }

        let mut link = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "id": id })))?;

        self.repository.update_name(id, name).await?;
        link.name = name.to_string();

        info!(id, name, "Link renamed");
        Ok(link)
    }

    /// Deletes every link whose expiration date lies before today.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn purge_expired(&self) -> Result<u64, AppError> {
        let removed = self.repository.delete_all_expired().await?;
        info!(removed, "Expired links purged");
        Ok(removed)
    }

    /// Generates codes until one is not in use.
    ///
    /// There is no attempt limit; every collision is logged so that a crowded
    /// code space shows up in the logs.
    async fn generate_unique_code(&self) -> Result<String, AppError> {
        let mut collisions = 0u32;

        loop {
            let code = generate_code(self.code_length);

            if self.repository.get_by_code(&code).await?.is_none() {
                return Ok(code);
            }

            collisions += 1;
            warn!(code, collisions, length = self.code_length, "Generated code already in use");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockLinkRepository;
    use chrono::{Days, Local};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DOMAIN: &str = "https://s.example.com/";

    fn create_test_link(id: i64, code: &str, expires_on: Option<NaiveDate>) -> Link {
        Link {
            id,
            code: code.to_string(),
            url: "https://example.com".to_string(),
            name: "Example".to_string(),
            visits: 0,
            expires_on,
        }
    }

    fn service(repo: MockLinkRepository) -> LinkService<MockLinkRepository> {
        LinkService::new(Arc::new(repo), 5, DOMAIN)
    }

    #[tokio::test]
    async fn test_create_link_success() {
        let mut repo = MockLinkRepository::new();
        repo.expect_get_by_code().times(1).returning(|_| Ok(None));
        repo.expect_insert()
            .withf(|l| l.url == "https://example.com" && l.name == "Example" && l.code.len() == 5)
            .times(1)
            .returning(|_| Ok(12));

        let link = service(repo)
            .create_link(" https://example.com ", "Example ", None)
            .await
            .unwrap();

        assert_eq!(link.id, 12);
        assert_eq!(link.visits, 0);
        assert_eq!(link.url, "https://example.com");
        assert!(is_valid_code(5, Some(&link.code)));
    }

    #[tokio::test]
    async fn test_create_link_regenerates_on_collision() {
        let lookups = AtomicUsize::new(0);
        let mut repo = MockLinkRepository::new();
        repo.expect_get_by_code().times(3).returning(move |code| {
            if lookups.fetch_add(1, Ordering::SeqCst) < 2 {
                Ok(Some(create_test_link(1, code, None)))
            } else {
                Ok(None)
            }
        });
        repo.expect_insert().times(1).returning(|_| Ok(3));

        let link = service(repo)
            .create_link("https://example.com", "Example", None)
            .await
            .unwrap();

        assert_eq!(link.id, 3);
    }

    #[tokio::test]
    async fn test_create_link_rejects_blank_fields() {
        let mut repo = MockLinkRepository::new();
        repo.expect_insert().never();

        let svc = service(repo);

        let err = svc.create_link("   ", "Example", None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        let err = svc
            .create_link("https://example.com", "", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_link_keeps_expiration() {
        let expires = NaiveDate::from_ymd_opt(2031, 1, 1);
        let mut repo = MockLinkRepository::new();
        repo.expect_get_by_code().returning(|_| Ok(None));
        repo.expect_insert()
            .withf(move |l| l.expires_on == expires)
            .returning(|_| Ok(1));

        let link = service(repo)
            .create_link("https://example.com", "Example", expires)
            .await
            .unwrap();

        assert_eq!(link.expires_on, expires);
    }

    #[tokio::test]
    async fn test_resolve_active_valid_link() {
        let mut repo = MockLinkRepository::new();
        repo.expect_get_by_code()
            .withf(|c| c == "AbC12")
            .times(1)
            .returning(|c| Ok(Some(create_test_link(1, c, None))));

        let link = service(repo).resolve_active("AbC12").await.unwrap();
        assert_eq!(link.code, "AbC12");
    }

    #[tokio::test]
    async fn test_resolve_active_malformed_code_skips_lookup() {
        let mut repo = MockLinkRepository::new();
        repo.expect_get_by_code().never();

        let svc = service(repo);
        for code in ["abc", "abcdef", "ab-cd"] {
            let err = svc.resolve_active(code).await.unwrap_err();
            assert!(matches!(err, AppError::NotFound { .. }));
        }
    }

    #[tokio::test]
    async fn test_resolve_active_unknown_code() {
        let mut repo = MockLinkRepository::new();
        repo.expect_get_by_code().returning(|_| Ok(None));

        let err = service(repo).resolve_active("zzzzz").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_resolve_active_expiration_boundary() {
        let today = Local::now().date_naive();
        let yesterday = today.checked_sub_days(Days::new(1)).unwrap();

        let mut repo = MockLinkRepository::new();
        repo.expect_get_by_code()
            .withf(|c| c == "today")
            .returning(move |c| Ok(Some(create_test_link(1, c, Some(today)))));
        repo.expect_get_by_code()
            .withf(|c| c == "yestr")
            .returning(move |c| Ok(Some(create_test_link(2, c, Some(yesterday)))));

        let svc = service(repo);

        assert!(svc.resolve_active("today").await.is_ok());
        let err = svc.resolve_active("yestr").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_link_not_found() {
        let mut repo = MockLinkRepository::new();
        repo.expect_delete_by_id().returning(|_| Ok(None));

        let err = service(repo).delete_link(99).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_link_returns_deleted_row() {
        let mut repo = MockLinkRepository::new();
        repo.expect_delete_by_id()
            .withf(|id| *id == 4)
            .returning(|id| Ok(Some(create_test_link(id, "abcde", None))));

        let link = service(repo).delete_link(4).await.unwrap();
        assert_eq!(link.id, 4);
    }

    #[tokio::test]
    async fn test_rename_link_trims_and_updates() {
        let mut repo = MockLinkRepository::new();
        repo.expect_get_by_id()
            .returning(|id| Ok(Some(create_test_link(id, "abcde", None))));
        repo.expect_update_name()
            .withf(|id, name| *id == 8 && name == "New name")
            .times(1)
            .returning(|_, _| Ok(()));
        repo.expect_update().never();

        let link = service(repo).rename_link(8, "  New name  ").await.unwrap();
        assert_eq!(link.name, "New name");
    }

    #[tokio::test]
    async fn test_rename_link_keeps_visits_recorded_meanwhile() {
        let stored_visits = Arc::new(AtomicUsize::new(10));

        let mut repo = MockLinkRepository::new();
        let counter = stored_visits.clone();
        repo.expect_get_by_id().returning(move |id| {
            let mut link = create_test_link(id, "abcde", None);
            link.visits = counter.load(Ordering::SeqCst) as i64;
            // three redirects land after the read
            counter.fetch_add(3, Ordering::SeqCst);
            Ok(Some(link))
        });
        let counter = stored_visits.clone();
        repo.expect_update().returning(move |link| {
            counter.store(link.visits as usize, Ordering::SeqCst);
            Ok(())
        });
        repo.expect_update_name().returning(|_, _| Ok(()));

        service(repo).rename_link(1, "Renamed").await.unwrap();

        assert_eq!(stored_visits.load(Ordering::SeqCst), 13);
    }

    #[tokio::test]
    async fn test_rename_link_length_limits() {
        let mut repo = MockLinkRepository::new();
        repo.expect_get_by_id().never();
        repo.expect_update_name().never();

        let svc = service(repo);

        assert!(matches!(
            svc.rename_link(1, "   ").await.unwrap_err(),
            AppError::Validation { .. }
        ));
        assert!(matches!(
            svc.rename_link(1, &"x".repeat(MAX_NAME_CHARS + 1))
                .await
                .unwrap_err(),
            AppError::Validation { .. }
        ));
    }

    #[tokio::test]
    async fn test_rename_link_accepts_max_length_multibyte() {
        let name = "é".repeat(MAX_NAME_CHARS);
        let mut repo = MockLinkRepository::new();
        repo.expect_get_by_id()
            .returning(|id| Ok(Some(create_test_link(id, "abcde", None))));
        repo.expect_update_name().returning(|_, _| Ok(()));

        assert!(service(repo).rename_link(1, &name).await.is_ok());
    }

    #[tokio::test]
    async fn test_rename_link_unknown_id() {
        let mut repo = MockLinkRepository::new();
        repo.expect_get_by_id().returning(|_| Ok(None));
        repo.expect_update_name().never();

        let err = service(repo).rename_link(1, "Name").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let mut repo = MockLinkRepository::new();
        repo.expect_delete_all_expired().times(1).returning(|| Ok(6));

        assert_eq!(service(repo).purge_expired().await.unwrap(), 6);
    }

    #[test]
    fn test_short_url_uses_domain_prefix() {
        let svc = service(MockLinkRepository::new());
        assert_eq!(svc.short_url("AbC12"), "https://s.example.com/AbC12");
    }
}
