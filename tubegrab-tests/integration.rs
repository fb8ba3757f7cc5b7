//! Integration tests for Tubegrab
//!
//! These tests drive `DownloadService` with fake collaborators and verify
//! selection, transcoding and staging behaviour across module boundaries.

#[path = "integration/concurrent_downloads.rs"]
mod concurrent_downloads;
#[path = "integration/error_classification.rs"]
mod error_classification;
#[path = "integration/selection_workflow.rs"]
mod selection_workflow;
