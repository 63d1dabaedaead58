//! # Expediente Core
//!
//! Core library for the academic record lifecycle: datasets, identifiers,
//! storage traits, and the audit trail.
//!
//! This crate provides:
//! - The four-stage [`Status`] chain (inscrito → estudiante → egresado →
//!   contratado) and the identifier allocator that moves records along it
//! - The tabular [`Dataset`] store with column-union merge semantics
//! - Typed per-status records with an `extras` side-map
//! - Storage trait interfaces plus in-memory and on-disk implementations
//! - The append-only [`AuditLog`]
//!
//! ## Design Principles
//!
//! 1. **Strings all the way down**: cells are kept exactly as they appear
//!    in the files; no numeric coercion, no date parsing on load
//! 2. **Async at the I/O seam only**: datasets are plain data once loaded
//! 3. **Nothing silently dropped**: schema differences widen via column
//!    union; unknown columns ride along in record extras
//!
//! ## Example
//!
//! ```ignore
//! use expediente_core::{Dataset, MemoryStorage, Status};
//!
//! let storage = MemoryStorage::new();
//! let mut ds = Dataset::load(&storage, "datos/inscritos.csv").await?;
//! if let Some(row) = ds.find_by_identifier("INS-00042") {
//!     // ...
//! }
//! ds.save(&storage, "datos/inscritos.csv").await?;
//! ```

pub mod audit;
pub mod csv;
pub mod dataset;
pub mod error;
pub mod identifier;
pub mod record;
pub mod status;
pub mod storage;

pub use audit::{AuditEntry, AuditLog, AUDIT_COLUMNS, SYSTEM_ACTOR, TIMESTAMP_FORMAT};
pub use dataset::{Dataset, ID_COLUMN, NO_VALUE};
pub use error::{Error, Result};
pub use identifier::{allocate, allocate_at, Allocation, FALLBACK_SUFFIX_FORMAT};
pub use record::{ApplicantRecord, GraduateRecord, StaffRecord, StudentRecord};
pub use status::Status;
pub use storage::{
    file_name, parent_dir, FileStat, FileStorage, MemoryStorage, Storage, StorageRead,
    StorageWrite,
};

/// Prelude module for convenient imports of storage traits and common types.
///
/// # Example
///
/// ```ignore
/// use expediente_core::prelude::*;
///
/// async fn example<S: Storage>(storage: &S) -> Result<()> {
///     let bytes = storage.read_bytes("datos/inscritos.csv").await?;
///     storage.write_bytes("datos/inscritos.csv", &bytes).await
/// }
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::status::Status;
    pub use crate::storage::{
        FileStat, FileStorage, MemoryStorage, Storage, StorageRead, StorageWrite,
    };
}
