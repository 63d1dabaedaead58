//! Storage traits for the record file tree
//!
//! Datasets, the account file, the audit log, and uploaded documents all
//! live in one file tree (`datos/*.csv`, `config/usuarios.csv`,
//! `uploads/`). These traits abstract that tree so the same code runs
//! against an in-memory map in tests and a real directory in production.
//!
//! Paths are relative, `/`-separated strings (`datos/estudiantes.csv`,
//! `uploads/EST-00042_Identificacion.pdf`). Absolute paths and `..`
//! segments are rejected.
//!
//! ## Traits
//!
//! - `StorageRead`: read-only access (read, stat, list a directory)
//! - `StorageWrite`: mutating operations (write, rename, make directories)
//! - `Storage`: marker trait combining both capabilities
//!
//! ## Implementations
//!
//! - `MemoryStorage`: HashMap-backed, for tests and dry runs
//! - `FileStorage`: a directory on disk (tokio::fs)

use crate::error::{Error, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::fmt::Debug;
use std::sync::Arc;

// ============================================================================
// Core Traits
// ============================================================================

/// Metadata for a stored file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// File size in bytes.
    pub size: u64,
}

/// Read-only storage operations
///
/// This trait provides all non-mutating storage operations: reading bytes,
/// checking existence, and listing directory entries.
#[async_trait]
pub trait StorageRead: Debug + Send + Sync {
    /// Read raw bytes from the given path
    ///
    /// Returns `Error::NotFound` if the file doesn't exist.
    async fn read_bytes(&self, path: &str) -> Result<Vec<u8>>;

    /// Look up metadata for a file
    ///
    /// Returns `Ok(None)` if the file doesn't exist. Errors are reserved
    /// for actual failures (I/O, permissions).
    async fn stat(&self, path: &str) -> Result<Option<FileStat>>;

    /// List the entry names directly under a directory
    ///
    /// Returns plain names (no leading directory components), sorted.
    /// Returns `Error::NotFound` if the directory doesn't exist; callers
    /// that treat a missing directory as "no entries" downgrade it.
    async fn list_dir(&self, dir: &str) -> Result<Vec<String>>;

    /// Check if a file exists at the given path
    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.stat(path).await?.is_some())
    }
}

/// Mutating storage operations
#[async_trait]
pub trait StorageWrite: Debug + Send + Sync {
    /// Write bytes to the given path, creating parent directories as needed
    ///
    /// Overwrites any existing file at the path.
    async fn write_bytes(&self, path: &str, bytes: &[u8]) -> Result<()>;

    /// Rename a file
    ///
    /// Returns `Error::NotFound` if `from` doesn't exist and a storage
    /// error if `to` already exists. Renames never overwrite.
    async fn rename(&self, from: &str, to: &str) -> Result<()>;

    /// Create a directory (and any missing parents)
    ///
    /// Idempotent: succeeds if the directory already exists.
    async fn make_dir(&self, dir: &str) -> Result<()>;
}

// ============================================================================
// Marker Trait
// ============================================================================

/// Full storage capability marker
///
/// Combines `StorageRead` and `StorageWrite`, providing a single bound for
/// backends that support all operations. Used for type erasure in
/// `AnyStorage`.
pub trait Storage: StorageRead + StorageWrite {}
impl<T: StorageRead + StorageWrite> Storage for T {}

// ============================================================================
// Path Helpers
// ============================================================================

/// Parent directory of a relative path, if it has one.
///
/// `parent_dir("datos/inscritos.csv")` is `Some("datos")`;
/// `parent_dir("inscritos.csv")` is `None`.
pub fn parent_dir(path: &str) -> Option<&str> {
    path.rsplit_once('/').map(|(dir, _)| dir)
}

/// Last segment of a relative path.
pub fn file_name(path: &str) -> &str {
    path.rsplit_once('/').map(|(_, name)| name).unwrap_or(path)
}

/// Reject absolute paths and `..` traversal.
fn check_relative(path: &str) -> Result<()> {
    use std::path::Component;
    let p = std::path::Path::new(path);
    if p.is_absolute()
        || p.components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
    {
        return Err(Error::storage(format!(
            "Invalid storage path '{}': must be a relative path without '..'",
            path
        )));
    }
    Ok(())
}

// ============================================================================
// MemoryStorage Implementation
// ============================================================================

#[derive(Debug, Default)]
struct MemoryInner {
    files: HashMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
}

/// A simple in-memory storage for testing
///
/// Stores files in a HashMap with interior mutability (`Arc<RwLock<...>>`)
/// so clones share the same tree. Directories are tracked explicitly so
/// `list_dir` on a never-created directory fails the same way it does on
/// disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<RwLock<MemoryInner>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a file at the given path
    ///
    /// Note: takes `&self` (not `&mut self`) due to interior mutability.
    pub fn insert(&self, path: impl Into<String>, data: Vec<u8>) {
        let path = path.into();
        let mut inner = self.inner.write();
        add_parents(&mut inner.dirs, &path);
        inner.files.insert(path, data);
    }

    /// Number of files currently stored
    pub fn file_count(&self) -> usize {
        self.inner.read().files.len()
    }
}

/// Record every ancestor directory of `path` as existing.
fn add_parents(dirs: &mut BTreeSet<String>, path: &str) {
    let mut rest = path;
    while let Some(dir) = parent_dir(rest) {
        dirs.insert(dir.to_string());
        rest = dir;
    }
}

impl MemoryInner {
    fn dir_exists(&self, dir: &str) -> bool {
        dir.is_empty() || self.dirs.contains(dir)
    }
}

#[async_trait]
impl StorageRead for MemoryStorage {
    async fn read_bytes(&self, path: &str) -> Result<Vec<u8>> {
        self.inner
            .read()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| Error::not_found(path))
    }

    async fn stat(&self, path: &str) -> Result<Option<FileStat>> {
        Ok(self
            .inner
            .read()
            .files
            .get(path)
            .map(|bytes| FileStat {
                size: bytes.len() as u64,
            }))
    }

    async fn list_dir(&self, dir: &str) -> Result<Vec<String>> {
        let dir = dir.trim_end_matches('/');
        let inner = self.inner.read();
        if !inner.dir_exists(dir) {
            return Err(Error::not_found(dir));
        }
        let in_dir = |path: &str| match parent_dir(path) {
            Some(parent) => parent == dir,
            None => dir.is_empty(),
        };
        // BTreeSet keeps entries sorted, matching FileStorage output order.
        let mut names = BTreeSet::new();
        for path in inner.files.keys() {
            if in_dir(path) {
                names.insert(file_name(path).to_string());
            }
        }
        for sub in &inner.dirs {
            if in_dir(sub) {
                names.insert(file_name(sub).to_string());
            }
        }
        Ok(names.into_iter().collect())
    }
}

#[async_trait]
impl StorageWrite for MemoryStorage {
    async fn write_bytes(&self, path: &str, bytes: &[u8]) -> Result<()> {
        check_relative(path)?;
        let mut inner = self.inner.write();
        add_parents(&mut inner.dirs, path);
        inner.files.insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        check_relative(to)?;
        let mut inner = self.inner.write();
        if inner.files.contains_key(to) {
            return Err(Error::storage(format!(
                "rename target already exists: {}",
                to
            )));
        }
        match inner.files.remove(from) {
            Some(bytes) => {
                add_parents(&mut inner.dirs, to);
                inner.files.insert(to.to_string(), bytes);
                Ok(())
            }
            None => Err(Error::not_found(from)),
        }
    }

    async fn make_dir(&self, dir: &str) -> Result<()> {
        check_relative(dir)?;
        let dir = dir.trim_end_matches('/');
        if dir.is_empty() {
            return Ok(());
        }
        let mut inner = self.inner.write();
        add_parents(&mut inner.dirs, dir);
        inner.dirs.insert(dir.to_string());
        Ok(())
    }
}

// ============================================================================
// FileStorage Implementation
// ============================================================================

/// File-based storage rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct FileStorage {
    /// Base directory containing the record file tree
    root: std::path::PathBuf,
}

impl FileStorage {
    /// Create a new file storage with the given root directory
    ///
    /// The root should be the directory containing `datos/`, `config/`
    /// and `uploads/`.
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the root directory for this storage
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Resolve a relative storage path to a path on disk
    fn resolve(&self, path: &str) -> Result<std::path::PathBuf> {
        check_relative(path)?;
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl StorageRead for FileStorage {
    async fn read_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.resolve(path)?;
        tokio::fs::read(&full).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::not_found(path)
            } else {
                Error::io(format!("Failed to read {}: {}", full.display(), e))
            }
        })
    }

    async fn stat(&self, path: &str) -> Result<Option<FileStat>> {
        let full = self.resolve(path)?;
        match tokio::fs::metadata(&full).await {
            Ok(meta) => Ok(Some(FileStat { size: meta.len() })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(format!(
                "Failed to stat {}: {}",
                full.display(),
                e
            ))),
        }
    }

    async fn list_dir(&self, dir: &str) -> Result<Vec<String>> {
        let full = self.resolve(dir)?;
        let mut entries = match tokio::fs::read_dir(&full).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::not_found(dir));
            }
            Err(e) => {
                return Err(Error::io(format!(
                    "Failed to list {}: {}",
                    full.display(),
                    e
                )));
            }
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            Error::io(format!(
                "Failed to read entry in {}: {}",
                full.display(),
                e
            ))
        })? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}

#[async_trait]
impl StorageWrite for FileStorage {
    async fn write_bytes(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let full = self.resolve(path)?;

        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::io(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        tokio::fs::write(&full, bytes)
            .await
            .map_err(|e| Error::io(format!("Failed to write {}: {}", full.display(), e)))
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let from_full = self.resolve(from)?;
        let to_full = self.resolve(to)?;

        match tokio::fs::metadata(&from_full).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::not_found(from));
            }
            Err(e) => {
                return Err(Error::io(format!(
                    "Failed to stat {}: {}",
                    from_full.display(),
                    e
                )));
            }
        }
        if tokio::fs::metadata(&to_full).await.is_ok() {
            return Err(Error::storage(format!(
                "rename target already exists: {}",
                to
            )));
        }

        tokio::fs::rename(&from_full, &to_full).await.map_err(|e| {
            Error::io(format!(
                "Failed to rename {} -> {}: {}",
                from_full.display(),
                to_full.display(),
                e
            ))
        })
    }

    async fn make_dir(&self, dir: &str) -> Result<()> {
        let full = self.resolve(dir)?;
        tokio::fs::create_dir_all(&full).await.map_err(|e| {
            Error::io(format!(
                "Failed to create directory {}: {}",
                full.display(),
                e
            ))
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_storage_read_write() {
        let storage = MemoryStorage::new();
        storage.insert("datos/inscritos.csv", b"matricula\nINS-1".to_vec());

        let bytes = storage.read_bytes("datos/inscritos.csv").await.unwrap();
        assert_eq!(bytes, b"matricula\nINS-1");

        assert!(storage.exists("datos/inscritos.csv").await.unwrap());
        assert!(!storage.exists("datos/otros.csv").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_storage_not_found() {
        let storage = MemoryStorage::new();
        let err = storage.read_bytes("missing.csv").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_memory_storage_stat() {
        let storage = MemoryStorage::new();
        storage.insert("uploads/a.pdf", vec![0u8; 120]);

        let stat = storage.stat("uploads/a.pdf").await.unwrap().unwrap();
        assert_eq!(stat.size, 120);
        assert!(storage.stat("uploads/b.pdf").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_storage_list_dir() {
        let storage = MemoryStorage::new();
        storage.insert("uploads/b.pdf", b"b".to_vec());
        storage.insert("uploads/a.pdf", b"a".to_vec());
        storage.insert("datos/inscritos.csv", b"x".to_vec());

        let names = storage.list_dir("uploads").await.unwrap();
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);
    }

    #[tokio::test]
    async fn test_memory_storage_list_missing_dir() {
        let storage = MemoryStorage::new();
        let err = storage.list_dir("uploads").await.unwrap_err();
        assert!(err.is_not_found());

        storage.make_dir("uploads").await.unwrap();
        assert!(storage.list_dir("uploads").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_storage_rename() {
        let storage = MemoryStorage::new();
        storage.insert("uploads/INS-1_Acta.pdf", b"doc".to_vec());

        storage
            .rename("uploads/INS-1_Acta.pdf", "uploads/EST-1_Acta.pdf")
            .await
            .unwrap();

        assert!(!storage.exists("uploads/INS-1_Acta.pdf").await.unwrap());
        let bytes = storage.read_bytes("uploads/EST-1_Acta.pdf").await.unwrap();
        assert_eq!(bytes, b"doc");
    }

    #[tokio::test]
    async fn test_memory_storage_rename_missing_source() {
        let storage = MemoryStorage::new();
        let err = storage.rename("uploads/nope.pdf", "uploads/x.pdf").await;
        assert!(err.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_memory_storage_rename_never_overwrites() {
        let storage = MemoryStorage::new();
        storage.insert("uploads/a.pdf", b"a".to_vec());
        storage.insert("uploads/b.pdf", b"b".to_vec());

        let err = storage.rename("uploads/a.pdf", "uploads/b.pdf").await;
        assert!(err.is_err());

        // Both files untouched after the failed rename.
        assert_eq!(storage.read_bytes("uploads/a.pdf").await.unwrap(), b"a");
        assert_eq!(storage.read_bytes("uploads/b.pdf").await.unwrap(), b"b");
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let storage = MemoryStorage::new();
        assert!(storage.write_bytes("../escape.csv", b"x").await.is_err());
        assert!(storage.write_bytes("/abs.csv", b"x").await.is_err());
    }

    #[tokio::test]
    async fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        storage
            .write_bytes("datos/inscritos.csv", b"matricula\nINS-1")
            .await
            .unwrap();

        let bytes = storage.read_bytes("datos/inscritos.csv").await.unwrap();
        assert_eq!(bytes, b"matricula\nINS-1");

        let stat = storage.stat("datos/inscritos.csv").await.unwrap().unwrap();
        assert_eq!(stat.size, 15);
    }

    #[tokio::test]
    async fn test_file_storage_list_and_rename() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        storage.write_bytes("uploads/b.pdf", b"b").await.unwrap();
        storage.write_bytes("uploads/a.pdf", b"a").await.unwrap();
        assert_eq!(
            storage.list_dir("uploads").await.unwrap(),
            vec!["a.pdf", "b.pdf"]
        );

        storage
            .rename("uploads/a.pdf", "uploads/c.pdf")
            .await
            .unwrap();
        assert_eq!(
            storage.list_dir("uploads").await.unwrap(),
            vec!["b.pdf", "c.pdf"]
        );

        let err = storage.rename("uploads/c.pdf", "uploads/b.pdf").await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_file_storage_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        let err = storage.list_dir("uploads").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
