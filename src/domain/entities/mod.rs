//! Core domain entities.
//!
//! - [`Link`] - A shortened URL mapping as stored in the link table
//! - [`NewLink`] - Input for creating a link; the id is assigned by the database

pub mod link;

pub use link::{Link, NewLink};
