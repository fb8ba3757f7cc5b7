//! Per-request scratch files for the transcoder.
//!
//! Every staged file gets a unique name and is removed when its
//! [`StagedFile`] is dropped, on success and error paths alike.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tempfile::TempPath;

use crate::error::Result;

/// File name prefix of everything Tubegrab stages.
pub const STAGING_PREFIX: &str = "tubegrab-";

/// Directory in which transcoder input and output files are allocated.
#[derive(Debug, Clone)]
pub struct StagingArea {
    directory: PathBuf,
}

/// A uniquely named temporary file, deleted on drop.
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
}

impl StagingArea {
    /// Creates the staging area, creating the directory if needed.
    ///
    /// # Errors
    /// - `TubegrabError::Io` - Directory cannot be created
    pub fn new(directory: Option<PathBuf>) -> Result<Self> {
        let directory = directory.unwrap_or_else(std::env::temp_dir);
        std::fs::create_dir_all(&directory)?;
        Ok(Self { directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Allocates an empty uniquely named file with the given extension.
    ///
    /// # Errors
    /// - `TubegrabError::Io` - File cannot be created
    pub fn allocate(&self, extension: &str) -> Result<StagedFile> {
        let suffix = format!(".{}", sanitize_extension(extension));
        let file = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(&suffix)
            .tempfile_in(&self.directory)?;
        let staged = StagedFile {
            path: file.into_temp_path(),
        };
        tracing::trace!("Allocated staging file {}", staged.path().display());
        Ok(staged)
    }

    /// Writes `bytes` into a freshly allocated file.
    ///
    /// # Errors
    /// - `TubegrabError::Io` - File cannot be created or written
    pub async fn stage(&self, bytes: &[u8], extension: &str) -> Result<StagedFile> {
        let staged = self.allocate(extension)?;
        tokio::fs::write(staged.path(), bytes).await?;
        tracing::debug!(
            "Staged {} bytes at {}",
            bytes.len(),
            staged.path().display()
        );
        Ok(staged)
    }
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole file back into memory.
    ///
    /// # Errors
    /// - `TubegrabError::Io` - File cannot be read
    pub async fn read(&self) -> Result<Bytes> {
        Ok(Bytes::from(tokio::fs::read(self.path()).await?))
    }
}

/// Keeps only ASCII alphanumerics so container names cannot form paths.
fn sanitize_extension(extension: &str) -> String {
    let cleaned: String = extension
        .trim_start_matches('.')
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(8)
        .collect();
    if cleaned.is_empty() {
        "bin".to_string()
    } else {
        cleaned.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn test_stage_and_read_back() {
        let dir = tempdir().unwrap();
        let staging = StagingArea::new(Some(dir.path().to_path_buf())).unwrap();

        let staged = staging.stage(b"raw audio", "m4a").await.unwrap();
        assert!(staged.path().starts_with(dir.path()));
        assert_eq!(staged.path().extension().unwrap(), "m4a");
        assert_eq!(staged.read().await.unwrap(), Bytes::from_static(b"raw audio"));
    }

    #[tokio::test]
    async fn test_staged_files_are_unique_and_removed_on_drop() {
        let dir = tempdir().unwrap();
        let staging = StagingArea::new(Some(dir.path().to_path_buf())).unwrap();

        let first = staging.stage(b"a", "m4a").await.unwrap();
        let second = staging.stage(b"b", "m4a").await.unwrap();
        assert_ne!(first.path(), second.path());

        let first_path = first.path().to_path_buf();
        drop(first);
        assert!(!first_path.exists());
        assert!(second.path().exists());
        drop(second);

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let staging = StagingArea::new(Some(nested.clone())).unwrap();
        assert!(nested.is_dir());
        assert_eq!(staging.directory(), nested.as_path());
    }

    #[test]
    fn test_sanitize_extension() {
        assert_eq!(sanitize_extension("M4A"), "m4a");
        assert_eq!(sanitize_extension(".mp3"), "mp3");
        assert_eq!(sanitize_extension("../../etc"), "etc");
        assert_eq!(sanitize_extension(""), "bin");
    }
}
