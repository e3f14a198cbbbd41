//! The filesystem seam of the caches.
//!
//! Existence of a file at a key's path is the sole truth of "is cached";
//! there is no manifest. The trait keeps the resolution algorithm
//! independent of the backing store so an alternative (say, a key-value
//! database) can be substituted without touching it.

use std::fs;
use std::path::{Path, PathBuf};
use wellframe_structures::{Result, WellframeError};

/// Minimal byte-level storage: existence check, read, write, delete.
pub trait CacheStore {
    fn exists(&self, path: &Path) -> bool;
    fn read(&self, path: &Path) -> Result<Vec<u8>>;
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()>;
    fn delete(&self, path: &Path) -> Result<()>;
}

/// The local-filesystem store.
///
/// Writes go to a temp file in the destination directory followed by a
/// rename, so a concurrent out-of-process reader never observes a
/// half-written entry; concurrent writers are last-writer-wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalDiskStore;

impl LocalDiskStore {
    fn temp_path(path: &Path) -> PathBuf {
        let mut name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".tmp-{}", std::process::id()));
        path.with_file_name(name)
    }
}

impl CacheStore for LocalDiskStore {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|source| WellframeError::CacheRead {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let write_err = |source| WellframeError::CacheWrite {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let temp = Self::temp_path(path);
        fs::write(&temp, bytes).map_err(write_err)?;
        fs::rename(&temp, path).map_err(write_err)
    }

    fn delete(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(WellframeError::CacheWrite {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_delete_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDiskStore;
        let path = dir.path().join("a/b/entry.arr");
        assert!(!store.exists(&path));
        store.write(&path, b"payload").unwrap();
        assert!(store.exists(&path));
        assert_eq!(store.read(&path).unwrap(), b"payload");
        store.delete(&path).unwrap();
        assert!(!store.exists(&path));
        // deleting again is a no-op
        store.delete(&path).unwrap();
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDiskStore;
        let path = dir.path().join("entry.arr");
        store.write(&path, b"x").unwrap();
        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["entry.arr".to_string()]);
    }

    #[test]
    fn test_read_missing_is_cache_read_error() {
        let store = LocalDiskStore;
        let err = store.read(Path::new("/nonexistent/entry.arr")).unwrap_err();
        assert!(matches!(err, WellframeError::CacheRead { .. }));
    }
}
