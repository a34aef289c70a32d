//! Per-request scratch storage.
//!
//! Each retrieval owns one [`ScratchDir`] under the temp root. Every file the
//! external tools write for that request lives inside it, and dropping the
//! guard removes the directory with everything in it. Cleanup therefore
//! happens on every exit path without call sites having to remember it.

use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::distr::Alphanumeric;
use rand::Rng;
use tempfile::TempDir;
use tracing::{debug, warn};

/// Prefix of per-request scratch directories.
pub const SCRATCH_PREFIX: &str = "vgrab-";

/// Length of the random part of generated names.
const RANDOM_SUFFIX_LEN: usize = 8;

/// Unique, timestamped file stem: `<UTC yyyymmddHHMMSSmmm>-<random>`.
pub fn unique_stem() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("{}-{}", Utc::now().format("%Y%m%d%H%M%S%3f"), suffix)
}

/// Scoped scratch directory, removed on drop.
#[derive(Debug)]
pub struct ScratchDir {
    dir: Option<TempDir>,
}

impl ScratchDir {
    /// Create a fresh scratch directory under `root`, creating `root` if needed.
    pub fn create(root: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}{}-", SCRATCH_PREFIX, unique_stem()))
            .tempdir_in(root)?;
        debug!(path = %dir.path().display(), "Created scratch directory");
        Ok(Self { dir: Some(dir) })
    }

    /// [`ScratchDir::create`] on the blocking pool, for async callers.
    pub async fn create_async(root: &Path) -> io::Result<Self> {
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || Self::create(&root))
            .await
            .map_err(io::Error::other)?
    }

    /// Directory path.
    pub fn path(&self) -> &Path {
        self.dir
            .as_ref()
            .map(TempDir::path)
            .unwrap_or_else(|| Path::new(""))
    }

    /// A new unique file stem for a file in this directory.
    pub fn new_stem(&self) -> String {
        unique_stem()
    }

    /// A new unique file path with the given extension.
    pub fn new_file(&self, tag: &str, extension: &str) -> PathBuf {
        self.path().join(format!("{}-{}.{}", self.new_stem(), tag, extension))
    }

    /// Remove the directory now, reporting failures.
    pub fn close(mut self) -> io::Result<()> {
        match self.dir.take() {
            Some(dir) => {
                let path = dir.path().to_path_buf();
                dir.close()?;
                debug!(path = %path.display(), "Removed scratch directory");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            match dir.close() {
                Ok(()) => debug!(path = %path.display(), "Removed scratch directory"),
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove scratch directory"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn entries(root: &Path) -> usize {
        std::fs::read_dir(root).map(|d| d.count()).unwrap_or(0)
    }

    #[test]
    fn test_unique_stem_shape() {
        let stem = unique_stem();
        let (timestamp, suffix) = stem.split_once('-').unwrap();
        assert_eq!(timestamp.len(), 17);
        assert!(timestamp.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(suffix.len(), RANDOM_SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_stems_do_not_collide() {
        let stems: HashSet<String> = (0..1000).map(|_| unique_stem()).collect();
        assert_eq!(stems.len(), 1000);
    }

    #[test]
    fn test_drop_removes_everything() {
        let root = tempfile::tempdir().unwrap();
        {
            let scratch = ScratchDir::create(root.path()).unwrap();
            assert!(scratch.path().starts_with(root.path()));
            std::fs::write(scratch.new_file("dl", "mp4"), b"data").unwrap();
            std::fs::write(scratch.path().join("partial.part"), b"data").unwrap();
            assert_eq!(entries(root.path()), 1);
        }
        assert_eq!(entries(root.path()), 0);
    }

    #[test]
    fn test_close_removes_directory() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::create(root.path()).unwrap();
        let path = scratch.path().to_path_buf();
        scratch.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_creates_missing_root() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        let scratch = ScratchDir::create(&nested).unwrap();
        assert!(scratch.path().starts_with(&nested));
    }

    #[tokio::test]
    async fn test_create_async() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::create_async(&root.path().join("nested")).await.unwrap();
        assert!(scratch.path().is_dir());
        drop(scratch);
        assert_eq!(entries(&root.path().join("nested")), 0);
    }

    #[test]
    fn test_concurrent_directories_are_distinct() {
        let root = tempfile::tempdir().unwrap();
        let a = ScratchDir::create(root.path()).unwrap();
        let b = ScratchDir::create(root.path()).unwrap();
        assert_ne!(a.path(), b.path());
        assert_ne!(a.new_file("dl", "mp4"), b.new_file("dl", "mp4"));
    }
}
