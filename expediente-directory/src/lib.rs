//! # Expediente Directory
//!
//! The account directory (`config/usuarios.csv`): one row per person,
//! keyed by login identifier. For everyone except administrators the login
//! *is* the record identifier, so when a person's record migrates to a new
//! status the same account row is rewritten in place — never deleted and
//! recreated.
//!
//! Login lookup is three-tiered: exact, then case/whitespace-insensitive,
//! then partial-contains. The tier that matched travels with the result so
//! callers can refuse to act on a weak match.

use expediente_core::dataset::Dataset;
use expediente_core::error::{Error, Result};
use expediente_core::storage::{StorageRead, StorageWrite};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::warn;

/// Role stored for administrator accounts.
pub const ADMIN_ROLE: &str = "administrador";

/// Column holding the login identifier.
pub const LOGIN_COLUMN: &str = "usuario";

/// Column holding the stored credential (plaintext or SHA-256 hex).
const PASSWORD_COLUMN: &str = "password";

/// Column holding the account role.
const ROLE_COLUMN: &str = "rol";

/// SHA-256 hex digest, the credential hash used by the account file.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// One account row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Account {
    pub usuario: String,
    pub password: String,
    pub rol: String,
    pub nombre: String,
    pub email: String,
    pub activo: String,
    pub fecha_registro: String,
    pub estatus: String,
    /// Columns outside the known schema, preserved verbatim.
    pub extras: BTreeMap<String, String>,
}

impl Account {
    /// Known account columns, in on-disk order.
    pub const COLUMNS: [&'static str; 8] = [
        "usuario",
        "password",
        "rol",
        "nombre",
        "email",
        "activo",
        "fecha_registro",
        "estatus",
    ];

    /// Build an account from (column, value) pairs.
    pub fn from_fields<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut account = Self::default();
        for (column, value) in fields {
            match column.as_str() {
                "usuario" => account.usuario = value,
                "password" => account.password = value,
                "rol" => account.rol = value,
                "nombre" => account.nombre = value,
                "email" => account.email = value,
                "activo" => account.activo = value,
                "fecha_registro" => account.fecha_registro = value,
                "estatus" => account.estatus = value,
                _ => {
                    if !value.trim().is_empty() {
                        account.extras.insert(column, value);
                    }
                }
            }
        }
        account
    }

    /// Decompose into (column, value) pairs, known columns first.
    pub fn into_fields(self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("usuario".to_string(), self.usuario),
            ("password".to_string(), self.password),
            ("rol".to_string(), self.rol),
            ("nombre".to_string(), self.nombre),
            ("email".to_string(), self.email),
            ("activo".to_string(), self.activo),
            ("fecha_registro".to_string(), self.fecha_registro),
            ("estatus".to_string(), self.estatus),
        ];
        fields.extend(self.extras);
        fields
    }

    /// True for administrator accounts.
    pub fn is_admin(&self) -> bool {
        self.rol.trim().eq_ignore_ascii_case(ADMIN_ROLE)
    }
}

/// How confidently a login lookup matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchStrength {
    /// Stored login equals the input (whitespace-trimmed).
    Exact,
    /// Equal after trimming and lowercasing both sides.
    Normalized,
    /// The input is merely a substring of the stored login.
    Partial,
}

/// A located account plus how it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginMatch {
    pub account: Account,
    pub strength: MatchStrength,
    row: usize,
}

impl LoginMatch {
    /// True unless this was a partial-contains match.
    pub fn is_reliable(&self) -> bool {
        self.strength != MatchStrength::Partial
    }
}

/// The account directory.
#[derive(Debug, Clone, Default)]
pub struct AccountDirectory {
    dataset: Dataset,
}

impl AccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accounts.
    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    /// True when no accounts are loaded.
    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Find an account by login, weakest-effort last.
    ///
    /// Tiers: trimmed-exact, then trimmed-lowercased equality, then
    /// partial-contains. A partial match is logged as a warning and
    /// reported as [`MatchStrength::Partial`] so callers can refuse it for
    /// anything destructive.
    pub fn find_by_login(&self, login: &str) -> Option<LoginMatch> {
        let col = self.dataset.column_index(LOGIN_COLUMN)?;
        let wanted = login.trim();
        let wanted_lower = wanted.to_lowercase();

        fn stored(row: &[String], col: usize) -> &str {
            row.get(col).map(String::as_str).unwrap_or_default()
        }

        let mut found = None;
        for (row, cells) in self.dataset.rows().iter().enumerate() {
            if stored(cells, col).trim() == wanted {
                found = Some((row, MatchStrength::Exact));
                break;
            }
        }
        if found.is_none() {
            for (row, cells) in self.dataset.rows().iter().enumerate() {
                if stored(cells, col).trim().to_lowercase() == wanted_lower {
                    found = Some((row, MatchStrength::Normalized));
                    break;
                }
            }
        }
        if found.is_none() && !wanted_lower.is_empty() {
            for (row, cells) in self.dataset.rows().iter().enumerate() {
                if stored(cells, col).trim().to_lowercase().contains(&wanted_lower) {
                    warn!(
                        input = wanted,
                        matched = stored(cells, col),
                        "login matched only partially"
                    );
                    found = Some((row, MatchStrength::Partial));
                    break;
                }
            }
        }

        let (row, strength) = found?;
        let account = Account::from_fields(self.dataset.row_map(row)?);
        Some(LoginMatch {
            account,
            strength,
            row,
        })
    }

    /// Check credentials against the stored password.
    ///
    /// The stored credential may be the plaintext or the SHA-256 hex
    /// digest of it; both sides are whitespace-trimmed. A partial login
    /// match is refused outright: a substring is not a login. Returns the
    /// account on success.
    pub fn authenticate(&self, login: &str, password: &str) -> Option<Account> {
        let matched = self.find_by_login(login)?;
        if !matched.is_reliable() {
            warn!(
                input = login,
                matched = %matched.account.usuario,
                "partial login match refused for authentication"
            );
            return None;
        }
        let stored = matched.account.password.trim();
        let supplied = password.trim();
        if stored == supplied || stored == sha256_hex(supplied) {
            Some(matched.account)
        } else {
            None
        }
    }

    /// Rewrite an account's login and role in place.
    ///
    /// The row is located by trimmed-exact login match and mutated; it is
    /// never deleted and recreated, so every other column survives.
    pub fn update_role_and_login(
        &mut self,
        old_login: &str,
        new_login: &str,
        new_role: &str,
    ) -> Result<()> {
        let col = self
            .dataset
            .column_index(LOGIN_COLUMN)
            .ok_or_else(|| Error::not_found("account login column"))?;
        let wanted = old_login.trim();
        let row = self
            .dataset
            .rows()
            .iter()
            .position(|cells| cells.get(col).map(|v| v.trim()) == Some(wanted))
            .ok_or_else(|| Error::not_found(format!("account '{}'", old_login)))?;

        self.dataset.set_field(row, LOGIN_COLUMN, new_login);
        self.dataset.set_field(row, ROLE_COLUMN, new_role);
        Ok(())
    }

    /// Append a new account row.
    pub fn create_account(&mut self, account: Account) {
        self.dataset.insert(account.into_fields());
    }

    /// All accounts, in file order.
    pub fn accounts(&self) -> Vec<Account> {
        (0..self.dataset.len())
            .filter_map(|row| self.dataset.row_map(row))
            .map(Account::from_fields)
            .collect()
    }

    /// Load the directory; a missing file yields an empty directory.
    pub async fn load<S>(storage: &S, path: &str) -> Result<Self>
    where
        S: StorageRead + ?Sized,
    {
        Ok(Self {
            dataset: Dataset::load(storage, path).await?,
        })
    }

    /// Save the directory, creating missing directories first.
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
    use expediente_core::storage::MemoryStorage;

    fn directory_with(rows: &[(&str, &str, &str)]) -> AccountDirectory {
        let mut dir = AccountDirectory::new();
        for (usuario, password, rol) in rows {
            dir.create_account(Account {
                usuario: usuario.to_string(),
                password: password.to_string(),
                rol: rol.to_string(),
                nombre: "Ana López".to_string(),
                email: "ana@example.edu".to_string(),
                activo: "True".to_string(),
                fecha_registro: "2024-01-01 00:00:00".to_string(),
                estatus: "activo".to_string(),
                extras: BTreeMap::new(),
            });
        }
        dir
    }

    #[test]
    fn test_find_by_login_tiers() {
        let dir = directory_with(&[("INS-00042", "123", "inscrito")]);

        let exact = dir.find_by_login("INS-00042").unwrap();
        assert_eq!(exact.strength, MatchStrength::Exact);

        let normalized = dir.find_by_login("  ins-00042 ").unwrap();
        assert_eq!(normalized.strength, MatchStrength::Normalized);
        assert!(normalized.is_reliable());

        let partial = dir.find_by_login("00042").unwrap();
        assert_eq!(partial.strength, MatchStrength::Partial);
        assert!(!partial.is_reliable());

        assert!(dir.find_by_login("EST-9").is_none());
    }

    #[test]
    fn test_exact_beats_partial_on_earlier_row() {
        let dir = directory_with(&[("INS-00042", "a", "inscrito"), ("INS-0004", "b", "inscrito")]);
        let matched = dir.find_by_login("INS-0004").unwrap();
        assert_eq!(matched.strength, MatchStrength::Exact);
        assert_eq!(matched.account.usuario, "INS-0004");
    }

    #[test]
    fn test_authenticate_plaintext_or_hash() {
        let hashed = sha256_hex("secreto");
        let dir = directory_with(&[("admin", "123", ADMIN_ROLE), ("ana", &hashed, "estudiante")]);

        assert!(dir.authenticate("admin", "123").is_some());
        assert!(dir.authenticate("admin", " 123 ").is_some());
        assert!(dir.authenticate("ana", "secreto").is_some());
        assert!(dir.authenticate("ana", "wrong").is_none());

        let admin = dir.authenticate("admin", "123").unwrap();
        assert!(admin.is_admin());
    }

    #[test]
    fn test_authenticate_refuses_partial_login_match() {
        let dir = directory_with(&[("INS-00042", "123", "inscrito")]);

        // The substring locates the account, but not reliably enough to
        // log in with, even with the right password.
        assert_eq!(
            dir.find_by_login("00042").unwrap().strength,
            MatchStrength::Partial
        );
        assert!(dir.authenticate("00042", "123").is_none());

        // The full login still works.
        assert!(dir.authenticate("INS-00042", "123").is_some());
    }

    #[test]
    fn test_update_role_and_login_rewrites_in_place() {
        let mut dir = directory_with(&[("INS-00042", "123", "inscrito")]);

        dir.update_role_and_login("INS-00042", "EST-00042", "estudiante")
            .unwrap();

        assert_eq!(dir.len(), 1);
        let updated = dir.find_by_login("EST-00042").unwrap();
        assert_eq!(updated.strength, MatchStrength::Exact);
        assert_eq!(updated.account.rol, "estudiante");
        // Untouched columns survive the rewrite.
        assert_eq!(updated.account.nombre, "Ana López");
        assert!(dir.find_by_login("INS-00042").is_none());
    }

    #[test]
    fn test_update_missing_account_fails() {
        let mut dir = directory_with(&[("INS-1", "x", "inscrito")]);
        let err = dir
            .update_role_and_login("INS-9", "EST-9", "estudiante")
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_save_load_round_trip_keeps_extras() {
        let storage = MemoryStorage::new();
        let mut dir = directory_with(&[("INS-1", "x", "inscrito")]);
        let mut account = Account {
            usuario: "legacy".to_string(),
            ..Account::default()
        };
        account.extras.insert("telefono".to_string(), "555".to_string());
        dir.create_account(account);

        dir.save(&storage, "config/usuarios.csv").await.unwrap();
        let reloaded = AccountDirectory::load(&storage, "config/usuarios.csv")
            .await
            .unwrap();

        assert_eq!(reloaded.len(), 2);
        let legacy = reloaded.find_by_login("legacy").unwrap();
        assert_eq!(
            legacy.account.extras.get("telefono").map(String::as_str),
            Some("555")
        );
    }

    #[test]
    fn test_sha256_hex_known_digest() {
        assert_eq!(
            sha256_hex("123"),
            "a665a45920422f9d417e4867efdc4fb8a04a1f3fff1fa07e998e86f7f7a27ae3"
        );
    }
}
