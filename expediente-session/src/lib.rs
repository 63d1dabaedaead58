//! # Expediente Session
//!
//! The administrative session layer: configuration parsing, storage
//! wiring, and the [`Session`] context that owns every dataset for one
//! administrative action group.
//!
//! A session loads all datasets fresh when opened and writes whole files
//! when saved, per the last-write-wins discipline of the record store.
//! Everything downstream (migration, intake) borrows its repositories
//! from here instead of touching storage directly.

pub mod config;
pub mod error;
pub mod session;

pub use config::{ConfigValue, DatasetLayout, RemoteConfig, SessionConfig, StorageConfig, StorageType};
pub use error::{Result, SessionError};
pub use session::{open_from_config, AnyStorage, FileSession, MemorySession, Session};
