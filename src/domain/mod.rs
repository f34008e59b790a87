//! Domain layer containing business entities and repository contracts.
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`visit_event`] - Visit tracking event model
//! - [`visit_worker`] - Asynchronous visit counting worker
//!
//! # Visit Processing Flow
//!
//! 1. The redirect handler resolves a link and answers `302 Found`
//! 2. A [`visit_event::VisitEvent`] is pushed to a bounded channel
//! 3. [`visit_worker::run_visit_worker`] applies the increment, retrying only while the database is unreachable

pub mod entities;
pub mod repositories;
pub mod visit_event;
pub mod visit_worker;
