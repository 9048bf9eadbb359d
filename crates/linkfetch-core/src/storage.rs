//! Persisting downloaded bodies.
//!
//! Each body is written to `<name>.part` and renamed over the final name, so
//! a failed write never leaves a truncated file under the destination name.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Temporary file suffix used before the rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `file.iso` → `file.iso.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to create output directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("refusing unsafe destination name {0:?}")]
    UnsafeName(String),
}

/// Sink for downloaded bodies. Shared across worker threads.
pub trait Storage: Send + Sync {
    /// Writes `bytes` under `name`, replacing any existing file. Returns the final path.
    fn persist(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, StorageError>;
}

/// Writes files into a single output directory.
#[derive(Debug, Clone)]
pub struct DirStorage {
    dir: PathBuf,
}

impl DirStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Creates the output directory (not its parents). Existing directory is fine.
    pub fn ensure_dir(&self) -> Result<(), StorageError> {
        match fs::create_dir(&self.dir) {
            Ok(()) => {
                tracing::debug!(dir = %self.dir.display(), "created output directory");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && self.dir.is_dir() => Ok(()),
            Err(source) => Err(StorageError::CreateDir {
                path: self.dir.clone(),
                source,
            }),
        }
    }

    /// Resolves `name` inside the output directory. Rejects names that could escape it.
    pub fn target_path(&self, name: &str) -> Result<PathBuf, StorageError> {
        let rel = Path::new(name);
        let safe = !name.is_empty()
            && rel
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !safe {
            return Err(StorageError::UnsafeName(name.to_string()));
        }
        Ok(self.dir.join(rel))
    }
}

impl Storage for DirStorage {
    fn persist(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        let final_path = self.target_path(name)?;
        self.ensure_dir()?;

        let tp = temp_path(&final_path);
        if let Err(source) = fs::write(&tp, bytes) {
            let _ = fs::remove_file(&tp);
            return Err(StorageError::Write { path: tp, source });
        }
        if let Err(source) = fs::rename(&tp, &final_path) {
            let _ = fs::remove_file(&tp);
            return Err(StorageError::Write {
                path: final_path,
                source,
            });
        }
        Ok(final_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_path_appends_part() {
        let p = temp_path(Path::new("file.iso"));
        assert_eq!(p.to_string_lossy(), "file.iso.part");
        let p2 = temp_path(Path::new("/tmp/archive.zip"));
        assert_eq!(p2.to_string_lossy(), "/tmp/archive.zip.part");
    }

    #[test]
    fn persist_creates_dir_and_writes() {
        let root = tempfile::tempdir().unwrap();
        let storage = DirStorage::new(root.path().join("out"));
        let path = storage.persist("a.txt", b"hello").unwrap();
        assert_eq!(path, root.path().join("out").join("a.txt"));
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn persist_overwrites_existing_file() {
        let root = tempfile::tempdir().unwrap();
        let storage = DirStorage::new(root.path());
        storage.persist("a.txt", b"first version").unwrap();
        let path = storage.persist("a.txt", b"second").unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"second");
    }

    #[test]
    fn ensure_dir_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let storage = DirStorage::new(root.path().join("out"));
        storage.ensure_dir().unwrap();
        storage.ensure_dir().unwrap();
        assert!(root.path().join("out").is_dir());
    }

    #[test]
    fn missing_parent_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let storage = DirStorage::new(root.path().join("missing").join("out"));
        match storage.persist("a.txt", b"x") {
            Err(StorageError::CreateDir { .. }) => {}
            other => panic!("expected CreateDir error, got {:?}", other),
        }
    }

    #[test]
    fn output_dir_that_is_a_file_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("plain");
        std::fs::write(&file, b"").unwrap();
        let storage = DirStorage::new(&file);
        assert!(matches!(
            storage.ensure_dir(),
            Err(StorageError::CreateDir { .. })
        ));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn failed_write_removes_temp_file() {
        if !Path::new("/dev/full").exists() {
            return;
        }
        let root = tempfile::tempdir().unwrap();
        let storage = DirStorage::new(root.path());
        let final_path = root.path().join("a.txt");
        let tp = temp_path(&final_path);
        // Every write through the temp path fails with ENOSPC.
        std::os::unix::fs::symlink("/dev/full", &tp).unwrap();

        match storage.persist("a.txt", b"hello") {
            Err(StorageError::Write { path, .. }) => assert_eq!(path, tp),
            other => panic!("expected Write error, got {:?}", other),
        }
        assert!(std::fs::symlink_metadata(&tp).is_err());
        assert!(!final_path.exists());
    }

    #[test]
    fn unsafe_names_are_rejected() {
        let root = tempfile::tempdir().unwrap();
        let storage = DirStorage::new(root.path().join("out"));
        for name in ["", "../escape.txt", "/etc/passwd", "a/../../b"] {
            assert!(
                matches!(storage.persist(name, b"x"), Err(StorageError::UnsafeName(_))),
                "name {:?} should be rejected",
                name
            );
        }
        assert!(!root.path().join("escape.txt").exists());
        assert!(!root.path().join("out").exists());
    }
}
