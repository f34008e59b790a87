//! Background worker applying queued visit increments.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, error, info, warn};

use crate::domain::repositories::LinkRepository;
use crate::domain::visit_event::VisitEvent;
use crate::error::AppError;

const MAX_RETRIES: usize = 3;
const RETRY_BASE_MS: u64 = 10;
const RETRY_MAX_DELAY: Duration = Duration::from_secs(1);

/// Consumes visit events until every sender is dropped.
///
/// An increment is retried with jittered exponential backoff only when the
/// database could not be reached ([`AppError::is_retryable`]). Any other
/// failure may have been applied already, so it is logged once and the event
/// is discarded; the client has already been redirected at this point.
pub async fn run_visit_worker<R>(mut rx: mpsc::Receiver<VisitEvent>, repository: Arc<R>)
where
    R: LinkRepository + ?Sized,
{
    info!("Visit worker started");

    while let Some(event) = rx.recv().await {
        let strategy = ExponentialBackoff::from_millis(RETRY_BASE_MS)
            .max_delay(RETRY_MAX_DELAY)
            .map(jitter)
            .take(MAX_RETRIES);

        let result = RetryIf::start(
            strategy,
            || {
                let repository = repository.clone();
                let link_id = event.link_id;
                async move { repository.increment_visits(link_id).await }
            },
            |e: &AppError| {
                let retry = e.is_retryable();
                if retry {
                    warn!(link_id = event.link_id, error = ?e, "Database unavailable, retrying visit");
                }
                retry
            },
        )
        .await;

        match result {
            Ok(()) => debug!(link_id = event.link_id, code = %event.code, "Visit recorded"),
            Err(e) => error!(
                link_id = event.link_id,
                code = %event.code,
                error = ?e,
                "Dropping visit"
            ),
        }
    }

    info!("Visit worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockLinkRepository;
    use mockall::Sequence;
    use serde_json::json;

    #[tokio::test]
    async fn test_worker_increments_each_event() {
        let mut repo = MockLinkRepository::new();
        repo.expect_increment_visits()
            .withf(|id| *id == 7)
            .times(2)
            .returning(|_| Ok(()));

        let (tx, rx) = mpsc::channel(8);
        tx.send(VisitEvent::new(7, "abcde")).await.unwrap();
        tx.send(VisitEvent::new(7, "abcde")).await.unwrap();
        drop(tx);

        run_visit_worker(rx, Arc::new(repo)).await;
    }

    #[tokio::test]
    async fn test_worker_retries_unreachable_database() {
        let mut repo = MockLinkRepository::new();
        let mut seq = Sequence::new();
        repo.expect_increment_visits()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(AppError::unavailable("Database unavailable", json!({}))));
        repo.expect_increment_visits()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let (tx, rx) = mpsc::channel(8);
        tx.send(VisitEvent::new(1, "abcde")).await.unwrap();
        drop(tx);

        run_visit_worker(rx, Arc::new(repo)).await;
    }

    #[tokio::test]
    async fn test_worker_does_not_repeat_failed_statement() {
        let mut repo = MockLinkRepository::new();
        repo.expect_increment_visits()
            .withf(|id| *id == 1)
            .times(1)
            .returning(|_| Err(AppError::internal("Database error", json!({}))));
        repo.expect_increment_visits()
            .withf(|id| *id == 2)
            .times(1)
            .returning(|_| Ok(()));

        let (tx, rx) = mpsc::channel(8);
        tx.send(VisitEvent::new(1, "aaaaa")).await.unwrap();
        tx.send(VisitEvent::new(2, "bbbbb")).await.unwrap();
        drop(tx);

        run_visit_worker(rx, Arc::new(repo)).await;
    }

    #[tokio::test]
    async fn test_worker_gives_up_and_continues() {
        let mut repo = MockLinkRepository::new();
        repo.expect_increment_visits()
            .withf(|id| *id == 1)
            .times(MAX_RETRIES + 1)
            .returning(|_| Err(AppError::unavailable("Database unavailable", json!({}))));
        repo.expect_increment_visits()
            .withf(|id| *id == 2)
            .times(1)
            .returning(|_| Ok(()));

        let (tx, rx) = mpsc::channel(8);
        tx.send(VisitEvent::new(1, "aaaaa")).await.unwrap();
        tx.send(VisitEvent::new(2, "bbbbb")).await.unwrap();
        drop(tx);

        run_visit_worker(rx, Arc::new(repo)).await;
    }
}
