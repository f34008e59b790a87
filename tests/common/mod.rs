#![allow(dead_code)]

use async_trait::async_trait;
use axum::ServiceExt;
use axum::extract::Request;
use axum_test::TestServer;
use chrono::{Local, NaiveDate};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, OnceLock};
use tokio::sync::mpsc;

use encurta::application::services::{AuthService, LinkService, MasterCredentials};
use encurta::domain::entities::{Link, NewLink};
use encurta::domain::repositories::LinkRepository;
use encurta::domain::visit_event::VisitEvent;
use encurta::error::AppError;
use encurta::infrastructure::keys::{SigningKeys, ensure_key_pair, load_signing_keys};
use encurta::routes::app_router;
use encurta::state::AppState;
use encurta::utils::hashing::login_hash;

pub const DOMAIN: &str = "https://s.example.com/";
pub const CODE_LENGTH: usize = 5;
pub const MASTER_USER: &str = "admin";
pub const MASTER_PASS: &str = "s3cret";
pub const SALT: &str = "pepper";

/// Link store backed by a vector, with the same matching rules as the SQL
/// repository (case-sensitive codes, expiry by calendar day).
#[derive(Default)]
pub struct InMemoryLinkRepository {
    links: Mutex<Vec<Link>>,
    next_id: Mutex<i64>,
}

impl InMemoryLinkRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed(&self, code: &str, url: &str, name: &str, expires_on: Option<NaiveDate>) -> Link {
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;

        let link = Link {
            id: *next_id,
            code: code.to_string(),
            url: url.to_string(),
            name: name.to_string(),
            visits: 0,
            expires_on,
        };
        self.links.lock().unwrap().push(link.clone());
        link
    }

    pub fn find(&self, id: i64) -> Option<Link> {
        self.links.lock().unwrap().iter().find(|l| l.id == id).cloned()
    }

    pub fn count(&self) -> usize {
        self.links.lock().unwrap().len()
    }
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn get_by_id(&self, id: i64) -> Result<Option<Link>, AppError> {
        Ok(self.find(id))
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        Ok(self
            .links
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.code == code)
            .cloned())
    }

    async fn insert(&self, new_link: NewLink) -> Result<i64, AppError> {
        let link = self.seed(
            &new_link.code,
            &new_link.url,
            &new_link.name,
            new_link.expires_on,
        );
        Ok(link.id)
    }

    async fn increment_visits(&self, id: i64) -> Result<(), AppError> {
        if let Some(link) = self.links.lock().unwrap().iter_mut().find(|l| l.id == id) {
            link.visits += 1;
        }
        Ok(())
    }

    async fn update(&self, link: &Link) -> Result<(), AppError> {
        if let Some(stored) = self
            .links
            .lock()
            .unwrap()
            .iter_mut()
            .find(|l| l.id == link.id)
        {
            *stored = link.clone();
        }
        Ok(())
    }

    async fn update_name(&self, id: i64, name: &str) -> Result<(), AppError> {
        if let Some(stored) = self.links.lock().unwrap().iter_mut().find(|l| l.id == id) {
            stored.name = name.to_string();
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Link>, AppError> {
        Ok(self.links.lock().unwrap().clone())
    }

    async fn delete_by_id(&self, id: i64) -> Result<Option<Link>, AppError> {
        let mut links = self.links.lock().unwrap();
        let position = links.iter().position(|l| l.id == id);
        Ok(position.map(|i| links.remove(i)))
    }

    async fn delete_all_expired(&self) -> Result<u64, AppError> {
        let today = Local::now().date_naive();
        let mut links = self.links.lock().unwrap();
        let before = links.len();
        links.retain(|l| l.expires_on.is_none_or(|d| d >= today));
        Ok((before - links.len()) as u64)
    }
}

/// One 2048-bit key pair per test binary; generation is slow.
pub fn test_keys() -> SigningKeys {
    static KEYS: OnceLock<SigningKeys> = OnceLock::new();
    KEYS.get_or_init(|| {
        let dir = tempfile::tempdir().unwrap();
        ensure_key_pair(dir.path(), 2048).unwrap();
        load_signing_keys(dir.path()).unwrap()
    })
    .clone()
}

pub fn create_test_state(
    repo: Arc<InMemoryLinkRepository>,
) -> (AppState, mpsc::Receiver<VisitEvent>) {
    let (tx, rx) = mpsc::channel(100);

    let repository: Arc<dyn LinkRepository> = repo;
    let link_service = Arc::new(LinkService::new(repository, CODE_LENGTH, DOMAIN));
    let auth_service = Arc::new(AuthService::new(
        MasterCredentials {
            user: MASTER_USER.to_string(),
            password: MASTER_PASS.to_string(),
            salt: SALT.to_string(),
        },
        test_keys(),
        3600,
    ));

    (AppState::new(link_service, auth_service, tx), rx)
}

/// Serves the production router, rate limits included, on a random local
/// port so handlers and limiters see a real peer address.
pub fn make_server(
    repo: Arc<InMemoryLinkRepository>,
) -> (TestServer, AppState, mpsc::Receiver<VisitEvent>) {
    let (state, rx) = create_test_state(repo);
    let app = app_router(state.clone()).unwrap();
    let server = TestServer::new(
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .unwrap();
    (server, state, rx)
}

pub fn master_hash() -> String {
    login_hash(MASTER_USER, MASTER_PASS, SALT)
}

pub fn issue_token(state: &AppState) -> String {
    state
        .auth_service
        .issue_token(Some(MASTER_USER), Some(&master_hash()))
        .unwrap()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
