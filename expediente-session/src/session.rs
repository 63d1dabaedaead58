//! The administrative session: every dataset loaded fresh, one storage
//! handle, whole-file saves.
//!
//! Datasets are loaded once at open in keeping with the last-write-wins
//! discipline: the session assumes a single administrative actor, reads
//! everything at the start of an action group, and writes whole files at
//! the end. Nothing is cached across sessions.

use crate::config::{DatasetLayout, SessionConfig, StorageType};
use crate::error::{Result, SessionError};
use async_trait::async_trait;
use expediente_core::audit::AuditLog;
use expediente_core::dataset::Dataset;
use expediente_core::storage::{
    FileStat, FileStorage, MemoryStorage, Storage, StorageRead, StorageWrite,
};
use expediente_core::Status;
use expediente_directory::{Account, AccountDirectory};
use expediente_documents::DocumentStore;
use std::sync::Arc;
use tracing::info;

// ============================================================================
// Dynamic storage wrapper
// ============================================================================

/// A dynamically-dispatched storage backend.
///
/// Lets `open_from_config` return a single concrete session type whether
/// the config selects memory or filesystem storage.
#[derive(Clone)]
pub struct AnyStorage(Arc<dyn Storage>);

impl std::fmt::Debug for AnyStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AnyStorage").field(&self.0).finish()
    }
}

impl AnyStorage {
    pub fn new(inner: Arc<dyn Storage>) -> Self {
        Self(inner)
    }
}

#[async_trait]
impl StorageRead for AnyStorage {
    async fn read_bytes(&self, path: &str) -> expediente_core::Result<Vec<u8>> {
        self.0.read_bytes(path).await
    }

    async fn stat(&self, path: &str) -> expediente_core::Result<Option<FileStat>> {
        self.0.stat(path).await
    }

    async fn list_dir(&self, dir: &str) -> expediente_core::Result<Vec<String>> {
        self.0.list_dir(dir).await
    }

    async fn exists(&self, path: &str) -> expediente_core::Result<bool> {
        self.0.exists(path).await
    }
}

#[async_trait]
impl StorageWrite for AnyStorage {
    async fn write_bytes(&self, path: &str, bytes: &[u8]) -> expediente_core::Result<()> {
        self.0.write_bytes(path, bytes).await
    }

    async fn rename(&self, from: &str, to: &str) -> expediente_core::Result<()> {
        self.0.rename(from, to).await
    }

    async fn make_dir(&self, dir: &str) -> expediente_core::Result<()> {
        self.0.make_dir(dir).await
    }
}

// ============================================================================
// Session
// ============================================================================

/// One administrative action group over the record store.
#[derive(Debug)]
pub struct Session<S> {
    storage: S,
    layout: DatasetLayout,
    /// One dataset per status, indexed by `Status::index()`.
    datasets: [Dataset; 4],
    accounts: AccountDirectory,
    audit: AuditLog,
    documents: DocumentStore<S>,
}

/// Session over in-memory storage (tests, dry runs).
pub type MemorySession = Session<MemoryStorage>;

/// Session over a local directory.
pub type FileSession = Session<FileStorage>;

impl<S> Session<S>
where
    S: Storage + Clone,
{
    /// Open a session, loading every dataset fresh from storage.
    pub async fn open(storage: S, layout: DatasetLayout) -> Result<Self> {
        let mut datasets: [Dataset; 4] = Default::default();
        for status in Status::ALL {
            datasets[status.index()] =
                Dataset::load(&storage, layout.dataset_path(status)).await?;
        }
        let accounts = AccountDirectory::load(&storage, &layout.usuarios).await?;
        let audit = AuditLog::load(&storage, &layout.bitacora).await?;
        let documents = DocumentStore::new(storage.clone(), layout.uploads_dir.clone());

        info!(
            inscritos = datasets[Status::Applicant.index()].len(),
            estudiantes = datasets[Status::Student.index()].len(),
            egresados = datasets[Status::Graduate.index()].len(),
            contratados = datasets[Status::Staff.index()].len(),
            cuentas = accounts.len(),
            "session opened with fresh data"
        );

        Ok(Self {
            storage,
            layout,
            datasets,
            accounts,
            audit,
            documents,
        })
    }

    /// The storage handle this session reads and writes through.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The dataset file layout.
    pub fn layout(&self) -> &DatasetLayout {
        &self.layout
    }

    /// The dataset for one status.
    pub fn dataset(&self, status: Status) -> &Dataset {
        &self.datasets[status.index()]
    }

    /// Mutable access to one status dataset.
    pub fn dataset_mut(&mut self, status: Status) -> &mut Dataset {
        &mut self.datasets[status.index()]
    }

    /// Mutable access to two distinct status datasets at once.
    ///
    /// Returns `None` when both statuses are the same.
    pub fn dataset_pair_mut(
        &mut self,
        first: Status,
        second: Status,
    ) -> Option<(&mut Dataset, &mut Dataset)> {
        let i = first.index();
        let j = second.index();
        if i == j {
            return None;
        }
        if i < j {
            let (left, right) = self.datasets.split_at_mut(j);
            Some((&mut left[i], &mut right[0]))
        } else {
            let (left, right) = self.datasets.split_at_mut(i);
            Some((&mut right[0], &mut left[j]))
        }
    }

    /// The account directory.
    pub fn accounts(&self) -> &AccountDirectory {
        &self.accounts
    }

    /// Mutable account directory.
    pub fn accounts_mut(&mut self) -> &mut AccountDirectory {
        &mut self.accounts
    }

    /// The audit trail.
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Mutable audit trail.
    pub fn audit_mut(&mut self) -> &mut AuditLog {
        &mut self.audit
    }

    /// The uploaded-document adapter.
    pub fn documents(&self) -> &DocumentStore<S> {
        &self.documents
    }

    /// Authenticate and record the login in the audit trail.
    ///
    /// The audit entry is in-memory only until [`Self::save_audit`].
    pub fn login(&mut self, login: &str, password: &str) -> Option<Account> {
        let account = self.accounts.authenticate(login, password)?;
        self.audit.append(
            &account.usuario,
            "LOGIN",
            &format!("Usuario {} inició sesión", account.usuario),
        );
        Some(account)
    }

    /// Save one status dataset to storage.
    pub async fn save_dataset(&self, status: Status) -> Result<()> {
        self.datasets[status.index()]
            .save(&self.storage, self.layout.dataset_path(status))
            .await?;
        Ok(())
    }

    /// Save the account directory to storage.
    pub async fn save_accounts(&self) -> Result<()> {
        self.accounts.save(&self.storage, &self.layout.usuarios).await?;
        Ok(())
    }

    /// Save the audit trail to storage.
    pub async fn save_audit(&self) -> Result<()> {
        self.audit.save(&self.storage, &self.layout.bitacora).await?;
        Ok(())
    }

    /// Save everything, reporting a per-file outcome instead of failing
    /// at the first error.
    pub async fn persist_all(&self) -> Vec<(String, Result<()>)> {
        let mut outcomes = Vec::with_capacity(6);
        for status in Status::ALL {
            outcomes.push((
                status.dataset_name().to_string(),
                self.save_dataset(status).await,
            ));
        }
        outcomes.push(("usuarios".to_string(), self.save_accounts().await));
        outcomes.push(("bitacora".to_string(), self.save_audit().await));
        outcomes
    }
}

/// Open a session from a parsed configuration.
pub async fn open_from_config(config: &SessionConfig) -> Result<Session<AnyStorage>> {
    let storage: Arc<dyn Storage> = match config.storage.storage_type {
        StorageType::Memory => Arc::new(MemoryStorage::new()),
        StorageType::File => {
            let path = config.storage.path.as_deref().ok_or_else(|| {
                SessionError::invalid_config("File storage requires a 'path'")
            })?;
            Arc::new(FileStorage::new(path))
        }
    };
    Session::open(AnyStorage::new(storage), config.layout.clone()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_storage() -> MemoryStorage {
        let storage = MemoryStorage::new();
        storage.insert(
            "datos/inscritos.csv",
            b"matricula,nombre_completo\nINS-1,Ana\n".to_vec(),
        );
        storage.insert(
            "config/usuarios.csv",
            b"usuario,password,rol\nINS-1,123,inscrito\n".to_vec(),
        );
        storage
    }

    #[tokio::test]
    async fn test_open_on_empty_storage_yields_empty_session() {
        let session = Session::open(MemoryStorage::new(), DatasetLayout::default())
            .await
            .unwrap();
        for status in Status::ALL {
            assert!(session.dataset(status).is_empty());
        }
        assert!(session.accounts().is_empty());
        assert!(session.audit().is_empty());
    }

    #[tokio::test]
    async fn test_open_loads_existing_files() {
        let session = Session::open(seeded_storage(), DatasetLayout::default())
            .await
            .unwrap();
        assert_eq!(session.dataset(Status::Applicant).len(), 1);
        assert_eq!(session.accounts().len(), 1);
    }

    #[tokio::test]
    async fn test_save_dataset_round_trips() {
        let storage = MemoryStorage::new();
        let mut session = Session::open(storage.clone(), DatasetLayout::default())
            .await
            .unwrap();

        session.dataset_mut(Status::Student).insert(vec![
            ("matricula".to_string(), "EST-1".to_string()),
            ("nombre_completo".to_string(), "Ana".to_string()),
        ]);
        session.save_dataset(Status::Student).await.unwrap();

        let reopened = Session::open(storage, DatasetLayout::default()).await.unwrap();
        assert_eq!(reopened.dataset(Status::Student).len(), 1);
    }

    #[tokio::test]
    async fn test_persist_all_reports_every_file() {
        let session = Session::open(seeded_storage(), DatasetLayout::default())
            .await
            .unwrap();
        let outcomes = session.persist_all().await;
        let names: Vec<&str> = outcomes.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "inscritos",
                "estudiantes",
                "egresados",
                "contratados",
                "usuarios",
                "bitacora"
            ]
        );
        assert!(outcomes.iter().all(|(_, result)| result.is_ok()));
    }

    #[tokio::test]
    async fn test_dataset_pair_mut() {
        let mut session = Session::open(MemoryStorage::new(), DatasetLayout::default())
            .await
            .unwrap();

        assert!(session
            .dataset_pair_mut(Status::Student, Status::Student)
            .is_none());

        let (src, dst) = session
            .dataset_pair_mut(Status::Applicant, Status::Student)
            .unwrap();
        src.insert(vec![("matricula".to_string(), "INS-1".to_string())]);
        dst.insert(vec![("matricula".to_string(), "EST-1".to_string())]);

        assert_eq!(session.dataset(Status::Applicant).len(), 1);
        assert_eq!(session.dataset(Status::Student).len(), 1);
    }

    #[tokio::test]
    async fn test_login_appends_audit_entry() {
        let mut session = Session::open(seeded_storage(), DatasetLayout::default())
            .await
            .unwrap();

        assert!(session.login("INS-1", "bad").is_none());
        assert!(session.audit().is_empty());

        let account = session.login("INS-1", "123").unwrap();
        assert_eq!(account.usuario, "INS-1");
        let entries = session.audit().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "LOGIN");
        assert!(entries[0].detail.contains("INS-1"));
    }

    #[tokio::test]
    async fn test_open_from_config_memory_and_file() {
        let memory = open_from_config(&SessionConfig::memory()).await.unwrap();
        assert!(memory.dataset(Status::Applicant).is_empty());

        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig::file(dir.path().to_string_lossy());
        let mut session = open_from_config(&config).await.unwrap();
        session
            .dataset_mut(Status::Applicant)
            .insert(vec![("matricula".to_string(), "INS-1".to_string())]);
        session.save_dataset(Status::Applicant).await.unwrap();

        let reopened = open_from_config(&config).await.unwrap();
        assert_eq!(reopened.dataset(Status::Applicant).len(), 1);
    }
}
