//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer and wraps
//! everything that touches the outside world.
//!
//! # Modules
//!
//! - [`database`] - MySQL / SQL Server connector with placeholder translation
//! - [`persistence`] - SQL repository implementations
//! - [`keys`] - RSA key pair storage for token signing
//! - [`qr`] - QR code rendering

pub mod database;
pub mod keys;
pub mod persistence;
pub mod qr;
