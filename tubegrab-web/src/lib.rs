//! Tubegrab Web - HTML front-end for video downloads
//!
//! Server-rendered lookup and selection pages plus the attachment endpoint,
//! built on axum. All media work is delegated to `tubegrab_core`.

pub mod handlers;
pub mod server;
pub mod templates;

// Re-export main types
pub use server::{AppState, build_router, run_server};
