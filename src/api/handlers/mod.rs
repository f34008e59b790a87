//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod index;
pub mod links;
pub mod login;
pub mod pages;
pub mod qrcode;
pub mod redirect;

pub use index::index_handler;
pub use links::{create_link_handler, delete_link_handler, list_links_handler, rename_link_handler};
pub use login::login_handler;
pub use qrcode::qrcode_handler;
pub use redirect::redirect_handler;
