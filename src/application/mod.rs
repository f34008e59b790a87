//! Application layer services implementing business logic.
//!
//! Services coordinate repository calls and business rules and give HTTP
//! handlers and the admin CLI a small API.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Link creation, lookup and maintenance
//! - [`services::auth_service::AuthService`] - Login challenge and bearer tokens

pub mod services;
