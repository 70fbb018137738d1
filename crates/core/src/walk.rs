//! Local file enumeration
//!
//! Walks an upload root and collects every regular file beneath it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::traits::LocalFs;

/// Recursively list the regular files under `root`
///
/// Symlinks are neither followed nor collected. The walk is all-or-nothing:
/// the first unreadable entry fails the whole enumeration, since uploading a
/// partial listing would look like a complete run.
pub fn collect_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| root.display().to_string());
            Error::Filesystem(format!("failed to scan {path}: {e}"))
        })?;

        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    tracing::debug!(root = %root.display(), count = files.len(), "Enumerated files");
    Ok(files)
}

/// Local filesystem access backed by the OS
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

#[async_trait]
impl LocalFs for OsFs {
    async fn list_regular_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || collect_files(&root))
            .await
            .map_err(|e| Error::Filesystem(format!("directory scan task failed: {e}")))?
    }

    async fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        tokio::fs::read(path).await.map_err(Error::Read)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::TempDir;

    fn sample_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::write(dir.path().join("b.png"), b"b").unwrap();
        fs::write(dir.path().join("c.json"), b"{}").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/d.css"), b"d").unwrap();
        fs::write(dir.path().join("sub/e.js"), b"e").unwrap();
        dir
    }

    #[test]
    fn test_collect_files_recurses() {
        let dir = sample_tree();
        let files = collect_files(dir.path()).unwrap();
        assert_eq!(files.len(), 5);
        assert!(files.iter().all(|p| p.is_file()));
        assert!(files.contains(&dir.path().join("sub/e.js")));
    }

    #[test]
    fn test_collect_files_skips_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("x/y/z")).unwrap();
        let files = collect_files(dir.path()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_collect_files_is_repeatable() {
        let dir = sample_tree();
        let first: HashSet<_> = collect_files(dir.path()).unwrap().into_iter().collect();
        let second: HashSet<_> = collect_files(dir.path()).unwrap().into_iter().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_collect_files_missing_root() {
        let dir = TempDir::new().unwrap();
        let err = collect_files(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, Error::Filesystem(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_collect_files_excludes_symlinks() {
        let dir = sample_tree();
        std::os::unix::fs::symlink(dir.path().join("a.txt"), dir.path().join("link.txt")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("sub"), dir.path().join("sublink")).unwrap();

        let files = collect_files(dir.path()).unwrap();
        assert_eq!(files.len(), 5);
        assert!(!files.contains(&dir.path().join("link.txt")));
    }

    #[tokio::test]
    async fn test_os_fs_lists_off_the_runtime() {
        let dir = sample_tree();
        let files = OsFs.list_regular_files(dir.path()).await.unwrap();
        assert_eq!(files, collect_files(dir.path()).unwrap());

        let err = OsFs
            .list_regular_files(&dir.path().join("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Filesystem(_)));
    }

    #[tokio::test]
    async fn test_os_fs_read_file() {
        let dir = sample_tree();
        let fs = OsFs;
        let data = fs.read_file(&dir.path().join("a.txt")).await.unwrap();
        assert_eq!(data, b"a");

        let err = fs.read_file(&dir.path().join("missing")).await.unwrap_err();
        assert!(matches!(err, Error::Read(_)));
    }
}
