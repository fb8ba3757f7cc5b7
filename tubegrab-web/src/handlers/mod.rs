//! HTTP request handlers organized by page

pub mod download;
pub mod error;
pub mod pages;

// Re-export handler functions
pub use download::{FetchForm, SelectionQuery, content_disposition, fetch_download, selection_page};
pub use error::{ErrorPage, WebError, status_for};
pub use pages::{LookupForm, favicon, health, landing_page, submit_lookup};
