//! # Expediente Documents
//!
//! Adapter over the `uploads/` area of the record store: lists the
//! documents belonging to an identifier, renames them when the identifier
//! changes, and fetches/stores individual files.
//!
//! Association between a record and its documents is purely by filename
//! (there is no foreign key in any dataset), so everything here leans on
//! the delimiter-bounded matching in [`filename`].

pub mod filename;

pub use filename::{
    contains_identifier, content_type, document_name, dotted_document_name, has_known_extension,
    parse_document_name, replace_identifier, sanitize_name, DocumentKind, DocumentName,
    KNOWN_EXTENSIONS,
};

use expediente_core::error::Result;
use expediente_core::storage::{StorageRead, StorageWrite};
use tracing::{info, warn};

/// One successfully renamed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamedFile {
    pub from: String,
    pub to: String,
}

/// One document that matched but could not be renamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRename {
    pub filename: String,
    pub reason: String,
}

/// Result of renaming every document from one identifier to another.
///
/// Skips are counted, not fatal: documents are a convenience artifact and
/// a migration proceeds with whatever subset was renamed.
#[derive(Debug, Clone, Default)]
pub struct RenameOutcome {
    pub renamed: Vec<RenamedFile>,
    pub skipped: Vec<SkippedRename>,
}

impl RenameOutcome {
    /// Number of documents actually renamed.
    pub fn renamed_count(&self) -> usize {
        self.renamed.len()
    }

    /// True when nothing matched or everything was skipped.
    pub fn is_noop(&self) -> bool {
        self.renamed.is_empty()
    }
}

/// Access to the uploaded documents of record holders.
#[derive(Debug, Clone)]
pub struct DocumentStore<S> {
    storage: S,
    uploads_dir: String,
}

impl<S> DocumentStore<S>
where
    S: StorageRead + StorageWrite,
{
    /// Create a store over `uploads_dir` within the given storage.
    pub fn new(storage: S, uploads_dir: impl Into<String>) -> Self {
        Self {
            storage,
            uploads_dir: uploads_dir.into(),
        }
    }

    /// Directory the documents live under.
    pub fn uploads_dir(&self) -> &str {
        &self.uploads_dir
    }

    fn path_for(&self, name: &str) -> String {
        format!("{}/{}", self.uploads_dir, name)
    }

    /// Every document filename referencing `identifier` as a bounded token.
    ///
    /// A missing uploads directory yields no documents, not an error.
    pub async fn list_for(&self, identifier: &str) -> Result<Vec<String>> {
        let entries = match self.storage.list_dir(&self.uploads_dir).await {
            Ok(entries) => entries,
            Err(e) if e.is_not_found() => {
                warn!(dir = %self.uploads_dir, "uploads directory not found");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };
        Ok(entries
            .into_iter()
            .filter(|name| {
                filename::has_known_extension(name)
                    && filename::contains_identifier(name, identifier)
            })
            .collect())
    }

    /// Rename every document of `old_id` to reference `new_id`.
    ///
    /// A file is renamed only if it still exists and nothing already sits
    /// at the destination name; anything else lands in `skipped` with a
    /// reason. Listing failures (other than a missing directory) are the
    /// only hard errors.
    pub async fn rename_all(&self, old_id: &str, new_id: &str) -> Result<RenameOutcome> {
        let matches = self.list_for(old_id).await?;
        info!(old_id, new_id, candidates = matches.len(), "renaming documents");

        let mut outcome = RenameOutcome::default();
        for name in matches {
            let target = filename::replace_identifier(&name, old_id, new_id);
            let from = self.path_for(&name);
            let to = self.path_for(&target);

            match self.storage.exists(&from).await {
                Ok(true) => {}
                Ok(false) => {
                    outcome.skipped.push(SkippedRename {
                        filename: name,
                        reason: "source file no longer exists".to_string(),
                    });
                    continue;
                }
                Err(e) => {
                    outcome.skipped.push(SkippedRename {
                        filename: name,
                        reason: e.to_string(),
                    });
                    continue;
                }
            }
            match self.storage.exists(&to).await {
                Ok(false) => {}
                Ok(true) => {
                    warn!(%name, %target, "rename skipped, destination already exists");
                    outcome.skipped.push(SkippedRename {
                        filename: name,
                        reason: format!("destination already exists: {target}"),
                    });
                    continue;
                }
                Err(e) => {
                    outcome.skipped.push(SkippedRename {
                        filename: name,
                        reason: e.to_string(),
                    });
                    continue;
                }
            }

            match self.storage.rename(&from, &to).await {
                Ok(()) => {
                    info!(%name, %target, "document renamed");
                    outcome.renamed.push(RenamedFile {
                        from: name,
                        to: target,
                    });
                }
                Err(e) => {
                    warn!(%name, error = %e, "document rename failed");
                    outcome.skipped.push(SkippedRename {
                        filename: name,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(outcome)
    }

    /// Read one document fully into memory.
    pub async fn fetch(&self, name: &str) -> Result<Vec<u8>> {
        self.storage.read_bytes(&self.path_for(name)).await
    }

    /// Write a new document, creating the uploads directory as needed.
    pub async fn store(&self, name: &str, bytes: &[u8]) -> Result<()> {
        self.storage.write_bytes(&self.path_for(name), bytes).await
    }
}
