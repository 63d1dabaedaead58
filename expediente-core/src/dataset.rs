//! Tabular dataset store
//!
//! Each record status keeps its rows in one CSV file (`datos/inscritos.csv`,
//! `datos/estudiantes.csv`, ...). A [`Dataset`] is the in-memory form:
//! a header row plus data rows, all cells kept as strings exactly as they
//! appear in the file.
//!
//! Datasets merge by column union: inserting a record whose columns differ
//! from the current schema widens the schema and pads the missing cells
//! with [`NO_VALUE`] instead of dropping them. `save(load())` is
//! content-stable.

use crate::csv;
use crate::error::Result;
use crate::storage::{parent_dir, StorageRead, StorageWrite};
use std::collections::BTreeMap;
use tracing::debug;

/// Cell content used when a row has no value for a column.
///
/// Matches how the files on disk represent absent values: the cell is
/// present but empty.
pub const NO_VALUE: &str = "";

/// Name of the identifier-bearing column shared by all status datasets.
pub const ID_COLUMN: &str = "matricula";

/// One status dataset: a column schema plus rows of string cells.
///
/// Every row always has exactly `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Create an empty dataset with no schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty dataset with a fixed column schema.
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the dataset has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column schema in file order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Data rows in file order.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Position of a column in the schema.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell value at (row, column).
    pub fn get(&self, index: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(index)?.get(col).map(String::as_str)
    }

    /// One row as a column-name → value map.
    pub fn row_map(&self, index: usize) -> Option<BTreeMap<String, String>> {
        let row = self.rows.get(index)?;
        Some(
            self.columns
                .iter()
                .cloned()
                .zip(row.iter().cloned())
                .collect(),
        )
    }

    /// Find the row whose identifier column equals `id`.
    ///
    /// Comparison trims incidental surrounding whitespace on the stored
    /// value but is otherwise exact (case-sensitive). Returns the first
    /// matching row index.
    pub fn find_by_identifier(&self, id: &str) -> Option<usize> {
        let col = self.column_index(ID_COLUMN)?;
        let id = id.trim();
        self.rows
            .iter()
            .position(|row| row.get(col).map(|v| v.trim()) == Some(id))
    }

    /// Append a record, widening the schema to the column union.
    ///
    /// If the dataset is schema-empty the record's columns become the
    /// schema. Otherwise any column the record carries that the dataset
    /// lacks is appended to the schema and existing rows are padded with
    /// [`NO_VALUE`]; columns the record lacks are filled the same way.
    pub fn insert(&mut self, fields: Vec<(String, String)>) {
        if self.columns.is_empty() {
            let (columns, row): (Vec<_>, Vec<_>) = fields.into_iter().unzip();
            self.columns = columns;
            self.rows.push(row);
            return;
        }

        for (name, _) in &fields {
            if self.column_index(name).is_none() {
                self.columns.push(name.clone());
                for row in &mut self.rows {
                    row.push(NO_VALUE.to_string());
                }
            }
        }

        let row = self
            .columns
            .iter()
            .map(|col| {
                fields
                    .iter()
                    .find(|(name, _)| name == col)
                    .map(|(_, value)| value.clone())
                    .unwrap_or_else(|| NO_VALUE.to_string())
            })
            .collect();
        self.rows.push(row);
    }

    /// Remove every row whose identifier column equals `id`.
    ///
    /// Returns how many rows were removed so callers can detect a no-op.
    pub fn remove_by_identifier(&mut self, id: &str) -> usize {
        let Some(col) = self.column_index(ID_COLUMN) else {
            return 0;
        };
        let id = id.trim();
        let before = self.rows.len();
        self.rows
            .retain(|row| row.get(col).map(|v| v.trim()) != Some(id));
        before - self.rows.len()
    }

    /// Overwrite one cell, widening the schema if the column is new.
    ///
    /// Returns `false` when the row index is out of range.
    pub fn set_field(&mut self, index: usize, column: &str, value: impl Into<String>) -> bool {
        if index >= self.rows.len() {
            return false;
        }
        let col = match self.column_index(column) {
            Some(col) => col,
            None => {
                self.columns.push(column.to_string());
                for row in &mut self.rows {
                    row.push(NO_VALUE.to_string());
                }
                self.columns.len() - 1
            }
        };
        self.rows[index][col] = value.into();
        true
    }

    /// Parse a dataset from CSV text.
    ///
    /// The first row is the header (cells trimmed). Rows whose cells are
    /// all empty are skipped; remaining rows are padded or truncated to
    /// the header width.
    pub fn from_csv(text: &str) -> Self {
        let mut parsed = csv::parse(text).into_iter();
        let Some(header) = parsed.next() else {
            return Self::new();
        };
        let columns: Vec<String> = header.iter().map(|c| c.trim().to_string()).collect();
        let width = columns.len();

        let mut rows = Vec::new();
        for mut row in parsed {
            if row.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            row.resize(width, NO_VALUE.to_string());
            rows.push(row);
        }
        Self { columns, rows }
    }

    /// Serialize to CSV text.
    ///
    /// A schema-empty dataset serializes to the empty string.
    pub fn to_csv(&self) -> String {
        if self.columns.is_empty() {
            return String::new();
        }
        let mut out = csv::format_row(&self.columns);
        out.push('\n');
        for row in &self.rows {
            out.push_str(&csv::format_row(row));
            out.push('\n');
        }
        out
    }

    /// Load a dataset from storage.
    ///
    /// A missing file yields an empty dataset with no error; the file
    /// appears on the first save.
    pub async fn load<S>(storage: &S, path: &str) -> Result<Self>
    where
        S: StorageRead + ?Sized,
    {
        let bytes = match storage.read_bytes(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.is_not_found() => {
                debug!(path, "dataset file not present, starting empty");
                return Ok(Self::new());
            }
            Err(e) => return Err(e),
        };
        let text = csv::decode_text(&bytes);
        Ok(Self::from_csv(&text))
    }

    /// Save the dataset to storage, creating missing directories first.
    pub async fn save<S>(&self, storage: &S, path: &str) -> Result<()>
    where
        S: StorageWrite + ?Sized,
    {
        if let Some(dir) = parent_dir(path) {
            storage.make_dir(dir).await?;
        }
        storage.write_bytes(path, self.to_csv().as_bytes()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_insert_into_schema_empty_defines_columns() {
        let mut ds = Dataset::new();
        ds.insert(fields(&[("matricula", "INS-1"), ("nombre_completo", "Ana")]));

        assert_eq!(ds.columns(), &["matricula", "nombre_completo"]);
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.get(0, "nombre_completo"), Some("Ana"));
    }

    #[test]
    fn test_insert_widens_to_column_union() {
        let mut ds = Dataset::new();
        ds.insert(fields(&[("matricula", "INS-1"), ("programa", "Derecho")]));
        ds.insert(fields(&[("matricula", "INS-2"), ("usuario", "ana.lopez")]));

        assert_eq!(ds.columns(), &["matricula", "programa", "usuario"]);
        // Old row padded for the new column, new row padded for the old one.
        assert_eq!(ds.get(0, "usuario"), Some(NO_VALUE));
        assert_eq!(ds.get(1, "programa"), Some(NO_VALUE));
        assert_eq!(ds.get(1, "usuario"), Some("ana.lopez"));
    }

    #[test]
    fn test_find_by_identifier_trims_whitespace() {
        let mut ds = Dataset::new();
        ds.insert(fields(&[("matricula", " INS-00042 "), ("nombre", "Ana")]));

        assert_eq!(ds.find_by_identifier("INS-00042"), Some(0));
        assert_eq!(ds.find_by_identifier("ins-00042"), None);
        assert_eq!(ds.find_by_identifier("INS-0004"), None);
    }

    #[test]
    fn test_remove_by_identifier_reports_count() {
        let mut ds = Dataset::new();
        ds.insert(fields(&[("matricula", "INS-1")]));
        ds.insert(fields(&[("matricula", "INS-2")]));

        assert_eq!(ds.remove_by_identifier("INS-1"), 1);
        assert_eq!(ds.remove_by_identifier("INS-1"), 0);
        assert_eq!(ds.len(), 1);
        assert!(ds.find_by_identifier("INS-1").is_none());
    }

    #[test]
    fn test_set_field_new_column_pads_other_rows() {
        let mut ds = Dataset::new();
        ds.insert(fields(&[("matricula", "INS-1")]));
        ds.insert(fields(&[("matricula", "INS-2")]));

        assert!(ds.set_field(1, "estatus", "Activo"));
        assert_eq!(ds.get(0, "estatus"), Some(NO_VALUE));
        assert_eq!(ds.get(1, "estatus"), Some("Activo"));
        assert!(!ds.set_field(9, "estatus", "x"));
    }

    #[test]
    fn test_from_csv_skips_blank_rows_and_pads_short_ones() {
        let text = "matricula, nombre ,programa\nINS-1,Ana\n,,\nINS-2,Luis,Derecho\n";
        let ds = Dataset::from_csv(text);

        assert_eq!(ds.columns(), &["matricula", "nombre", "programa"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.get(0, "programa"), Some(NO_VALUE));
        assert_eq!(ds.get(1, "programa"), Some("Derecho"));
    }

    #[test]
    fn test_csv_round_trip_is_stable() {
        let mut ds = Dataset::new();
        ds.insert(fields(&[
            ("matricula", "INS-1"),
            ("nombre_completo", "López, Ana"),
            ("documentos_subidos", "Acta \"original\""),
        ]));
        ds.insert(fields(&[("matricula", "INS-2"), ("usuario", "luis")]));

        let round = Dataset::from_csv(&ds.to_csv());
        assert_eq!(round, ds);
        assert_eq!(Dataset::from_csv(&round.to_csv()), round);
    }

    #[test]
    fn test_schema_empty_serializes_to_empty_string() {
        assert_eq!(Dataset::new().to_csv(), "");
    }

    #[tokio::test]
    async fn test_load_missing_file_yields_empty_dataset() {
        let storage = MemoryStorage::new();
        let ds = Dataset::load(&storage, "datos/inscritos.csv").await.unwrap();
        assert!(ds.is_empty());
        assert!(ds.columns().is_empty());
    }

    #[tokio::test]
    async fn test_save_creates_parent_directories() {
        let storage = MemoryStorage::new();
        let mut ds = Dataset::new();
        ds.insert(fields(&[("matricula", "EST-1"), ("nombre", "Ana")]));

        ds.save(&storage, "datos/estudiantes.csv").await.unwrap();

        assert!(storage.list_dir("datos").await.is_ok());
        let loaded = Dataset::load(&storage, "datos/estudiantes.csv")
            .await
            .unwrap();
        assert_eq!(loaded, ds);
    }
}
