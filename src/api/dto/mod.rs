//! Data Transfer Objects for API requests and responses.
//!
//! Field names on the wire are the Portuguese names clients already use
//! (`nome`, `expira_em`, `urlCriada`, ...); the Rust side uses English names
//! mapped with `#[serde(rename)]`.

pub mod link;
pub mod login;
pub mod qrcode;
