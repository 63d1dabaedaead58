//! Append-only audit trail (`datos/bitacora.csv`)
//!
//! Every administrative action appends one row: when, who, what, detail.
//! Rows are never mutated or deleted. The log is an ordinary dataset
//! underneath, so legacy files with extra columns survive a load/append/
//! save cycle via the column-union merge.

use crate::dataset::Dataset;
use crate::error::Result;
use crate::storage::{StorageRead, StorageWrite};
use chrono::NaiveDateTime;
use tracing::debug;

/// Columns of the audit file, in write order.
pub const AUDIT_COLUMNS: [&str; 4] = ["timestamp", "usuario", "accion", "detalles"];

/// Actor recorded for operations with no authenticated user.
pub const SYSTEM_ACTOR: &str = "Sistema";

/// Timestamp format used in audit rows.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One decoded audit row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub timestamp: String,
    pub user: String,
    pub action: String,
    pub detail: String,
}

/// The append-only audit log.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    dataset: Dataset,
}

impl AuditLog {
    /// Create an empty log; columns appear with the first entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Append an entry timestamped now.
    pub fn append(&mut self, user: &str, action: &str, detail: &str) {
        self.append_at(chrono::Local::now().naive_local(), user, action, detail);
    }

    /// Append an entry with an explicit timestamp.
    pub fn append_at(&mut self, at: NaiveDateTime, user: &str, action: &str, detail: &str) {
        let timestamp = at.format(TIMESTAMP_FORMAT).to_string();
        debug!(action, user, "audit entry appended");
        self.dataset.insert(vec![
            (AUDIT_COLUMNS[0].to_string(), timestamp),
            (AUDIT_COLUMNS[1].to_string(), user.to_string()),
            (AUDIT_COLUMNS[2].to_string(), action.to_string()),
            (AUDIT_COLUMNS[3].to_string(), detail.to_string()),
        ]);
    }

    /// Decode all entries in file order.
    pub fn entries(&self) -> Vec<AuditEntry> {
        let cell = |row: usize, col: &str| {
            self.dataset
                .get(row, col)
                .unwrap_or_default()
                .to_string()
        };
        (0..self.dataset.len())
            .map(|row| AuditEntry {
                timestamp: cell(row, AUDIT_COLUMNS[0]),
                user: cell(row, AUDIT_COLUMNS[1]),
                action: cell(row, AUDIT_COLUMNS[2]),
                detail: cell(row, AUDIT_COLUMNS[3]),
            })
            .collect()
    }

    /// Load the log from storage; a missing file yields an empty log.
    pub async fn load<S>(storage: &S, path: &str) -> Result<Self>
    where
        S: StorageRead + ?Sized,
    {
        Ok(Self {
            dataset: Dataset::load(storage, path).await?,
        })
    }

    /// Save the log, creating missing directories first.
    pub async fn save<S>(&self, storage: &S, path: &str) -> Result<()>
    where
        S: StorageWrite + ?Sized,
    {
        self.dataset.save(storage, path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_append_records_formatted_timestamp() {
        let mut log = AuditLog::new();
        log.append_at(noon(), SYSTEM_ACTOR, "LOGIN", "Usuario admin inició sesión");

        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].timestamp, "2024-05-01 12:30:00");
        assert_eq!(entries[0].user, SYSTEM_ACTOR);
        assert_eq!(entries[0].action, "LOGIN");
    }

    #[test]
    fn test_entries_keep_append_order() {
        let mut log = AuditLog::new();
        log.append_at(noon(), "admin", "LOGIN", "first");
        log.append_at(noon(), "admin", "MIGRACION_INSCRITO_ESTUDIANTE", "second");

        let actions: Vec<String> = log.entries().into_iter().map(|e| e.action).collect();
        assert_eq!(actions, vec!["LOGIN", "MIGRACION_INSCRITO_ESTUDIANTE"]);
    }

    #[tokio::test]
    async fn test_legacy_columns_survive_append_and_save() {
        let storage = MemoryStorage::new();
        storage.insert(
            "datos/bitacora.csv",
            b"timestamp,usuario,accion,detalles,ip\n2024-01-01 00:00:00,admin,LOGIN,ok,localhost\n"
                .to_vec(),
        );

        let mut log = AuditLog::load(&storage, "datos/bitacora.csv").await.unwrap();
        log.append_at(noon(), "admin", "LOGOUT", "bye");
        log.save(&storage, "datos/bitacora.csv").await.unwrap();

        let reloaded = AuditLog::load(&storage, "datos/bitacora.csv").await.unwrap();
        assert_eq!(reloaded.len(), 2);
        // The legacy `ip` column is still in the file header.
        let bytes = storage.read_bytes("datos/bitacora.csv").await.unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.lines().next().unwrap().contains("ip"));
    }

    #[tokio::test]
    async fn test_load_missing_file_yields_empty_log() {
        let storage = MemoryStorage::new();
        let log = AuditLog::load(&storage, "datos/bitacora.csv").await.unwrap();
        assert!(log.is_empty());
    }
}
