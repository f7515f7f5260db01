//! Downloaded audio scoped to its temporary directory

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A local audio file owned together with the directory it was written to
///
/// The directory is removed when the asset is dropped, whichever way the
/// request ends. [`AudioAsset::cleanup`] does the same eagerly.
#[derive(Debug)]
pub struct AudioAsset {
    dir: Option<TempDir>,
    path: PathBuf,
    title: String,
    source_id: String,
}

impl AudioAsset {
    /// Wrap a file that lives inside `dir`
    pub fn new(dir: TempDir, path: PathBuf, title: String, source_id: String) -> Self {
        Self {
            dir: Some(dir),
            path,
            title,
            source_id,
        }
    }

    /// Fresh scratch directory for one download
    pub fn scratch_dir() -> anyhow::Result<TempDir> {
        tempfile::Builder::new()
            .prefix("melodora-")
            .tempdir()
            .map_err(|e| anyhow::anyhow!("Failed to create temporary directory: {}", e))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Directory removed on cleanup
    pub fn dir_path(&self) -> Option<&Path> {
        self.dir.as_ref().map(|d| d.path())
    }

    /// Remove the temporary directory now
    pub fn cleanup(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(dir) = self.dir.take() {
            let dir_path = dir.path().to_path_buf();
            match dir.close() {
                Ok(()) => log::debug!("Removed temporary directory {}", dir_path.display()),
                Err(e) => log::warn!(
                    "Failed to remove temporary directory {}: {}",
                    dir_path.display(),
                    e
                ),
            }
        }
    }
}

impl Drop for AudioAsset {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset() -> AudioAsset {
        let dir = AudioAsset::scratch_dir().unwrap();
        let path = dir.path().join("track.wav");
        std::fs::write(&path, b"RIFF").unwrap();
        AudioAsset::new(dir, path, "Track".to_string(), "abc".to_string())
    }

    #[test]
    fn test_drop_removes_directory() {
        let asset = asset();
        let dir = asset.dir_path().unwrap().to_path_buf();
        assert!(asset.path().exists());
        drop(asset);
        assert!(!dir.exists());
    }

    #[test]
    fn test_explicit_cleanup() {
        let asset = asset();
        let dir = asset.dir_path().unwrap().to_path_buf();
        assert_eq!(asset.title(), "Track");
        assert_eq!(asset.source_id(), "abc");
        asset.cleanup();
        assert!(!dir.exists());
    }

    #[test]
    fn test_cleanup_tolerates_missing_directory() {
        let asset = asset();
        let dir = asset.dir_path().unwrap().to_path_buf();
        std::fs::remove_dir_all(&dir).unwrap();
        // Logged, never raised
        asset.cleanup();
        assert!(!dir.exists());
    }
}
