//! Utility functions used across the application.
//!
//! - [`code_generator`] - Short code generation and validation
//! - [`hashing`] - SHA-256 helpers for the login challenge

pub mod code_generator;
pub mod hashing;
