//! # encurta
//!
//! A URL shortener built with Axum on top of MySQL or SQL Server.
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture principles with clear layer separation:
//!
//! - **Domain Layer** ([`domain`]) - Link entity, repository trait and visit worker
//! - **Application Layer** ([`application`]) - Link and authentication services
//! - **Infrastructure Layer** ([`infrastructure`]) - Database connector, SQL
//!   repository, RSA keys and QR rendering
//! - **API Layer** ([`api`]) - HTTP handlers, DTOs, and middleware
//!
//! ## Features
//!
//! - One query interface over MySQL (`sqlx`) and SQL Server (`tiberius`),
//!   with `?` placeholders rewritten per backend
//! - Random case-sensitive alphanumeric codes
//! - Asynchronous visit counting with retry logic
//! - Links that expire after a given day
//! - QR codes of short links as PNG or SVG
//! - RS256 bearer tokens issued against a shared-secret hash
//! - Rate limiting and request tracing
//!
//! ## Quick Start
//!
//! ```bash
//! export DOMAIN="https://s.example.com/"
//! export SQL_TYPE="mysql"
//! export MYSQL_HOST="localhost" MYSQL_PORT="3306" MYSQL_USER="root" MYSQL_DATABASE="encurta"
//! export MYSQL_CREATE_SCRIPT="sql/mysql/create.sql" SQL_CREATE="true"
//! export APP_MASTER_USER="admin" APP_MASTER_PASS="secret" APP_SALT="salt"
//!
//! cargo run
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod state;
pub mod utils;

pub mod config;
pub mod server;

pub mod routes;

pub use error::AppError;
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{AuthService, LinkService, MasterCredentials};
    pub use crate::domain::entities::{Link, NewLink};
    pub use crate::domain::repositories::LinkRepository;
    pub use crate::error::AppError;
    pub use crate::state::AppState;
}
