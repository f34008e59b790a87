//! SQL repository implementations.
//!
//! - [`SqlLinkRepository`] - Link storage over the MySQL / SQL Server connector

pub mod sql_link_repository;

pub use sql_link_repository::SqlLinkRepository;
