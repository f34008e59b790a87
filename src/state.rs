//! Shared application state injected into handlers.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::services::{AuthService, LinkService};
use crate::domain::repositories::LinkRepository;
use crate::domain::visit_event::VisitEvent;

/// Services and channels shared by every request.
///
/// Cloning is cheap: every field is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService<dyn LinkRepository>>,
    pub auth_service: Arc<AuthService>,
    /// Producer side of the visit queue consumed by
    /// [`crate::domain::visit_worker::run_visit_worker`].
    pub visit_sender: mpsc::Sender<VisitEvent>,
}

impl AppState {
    pub fn new(
        link_service: Arc<LinkService<dyn LinkRepository>>,
        auth_service: Arc<AuthService>,
        visit_sender: mpsc::Sender<VisitEvent>,
    ) -> Self {
        Self {
            link_service,
            auth_service,
            visit_sender,
        }
    }
}
