//! Persistence of the dimensional model into `SQLite`.
//!
//! Every table is dropped and recreated on load so that a re-run replaces
//! rather than appends. Foreign-key enforcement is off while tables are
//! replaced, since a dimension is dropped while the previous fact rows still
//! reference it, and is switched back on afterwards.
//!
//! In [`LoadMode::PerTable`] each table commits on its own, and a failure
//! leaves earlier tables committed. [`LoadMode::Atomic`] wraps all tables and
//! indexes in one transaction.

mod schema;

pub use schema::{create_sql, insert_sql, Column, IndexDef, TableRow, INDEXES};

use std::path::{Path, PathBuf};

use rusqlite::types::Value;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::config::LoadMode;
use crate::errors::PersistenceError;
use crate::model::DimensionalModel;

/// Rows written per table, in load order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoadReport {
    /// `(table, rows)` pairs.
    pub tables: Vec<(String, usize)>,
    /// Number of indexes created.
    pub indexes: usize,
}

impl LoadReport {
    /// Rows written to `table`, if it was loaded.
    #[must_use]
    pub fn rows(&self, table: &str) -> Option<usize> {
        self.tables.iter().find(|(t, _)| t == table).map(|(_, n)| *n)
    }
}

/// An open warehouse database.
///
/// The connection is released when the store is dropped, including on
/// error paths; [`WarehouseStore::close`] does the same but surfaces the
/// close error.
#[derive(Debug)]
pub struct WarehouseStore {
    conn: Option<Connection>,
    path: PathBuf,
}

impl WarehouseStore {
    /// Opens (or creates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).map_err(|e| PersistenceError::new("open", e))?;
        tracing::info!(path = %path.display(), "Opened database connection");
        Ok(Self {
            conn: Some(conn),
            path,
        })
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self, PersistenceError> {
        let conn = Connection::open_in_memory().map_err(|e| PersistenceError::new("open", e))?;
        Ok(Self {
            conn: Some(conn),
            path: PathBuf::from(":memory:"),
        })
    }

    /// Database location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn conn(&self) -> Result<&Connection, PersistenceError> {
        self.conn
            .as_ref()
            .ok_or_else(|| PersistenceError::new("connect", rusqlite::Error::InvalidQuery))
    }

    fn conn_mut(&mut self) -> Result<&mut Connection, PersistenceError> {
        self.conn
            .as_mut()
            .ok_or_else(|| PersistenceError::new("connect", rusqlite::Error::InvalidQuery))
    }

    /// Replaces every warehouse table with the contents of `model` and
    /// builds the secondary indexes.
    pub fn load(
        &mut self,
        model: &DimensionalModel,
        mode: LoadMode,
    ) -> Result<LoadReport, PersistenceError> {
        tracing::info!(path = %self.path.display(), ?mode, "Loading data to database");
        let conn = self.conn_mut()?;

        set_foreign_keys(conn, false)?;
        let replaced = replace_tables(conn, model, mode);
        let restored = set_foreign_keys(conn, true);
        let report = replaced?;
        restored?;

        tracing::info!(indexes = report.indexes, "Created database indexes");
        tracing::info!("Data loaded to database successfully");
        Ok(report)
    }

    /// Number of rows in `table`.
    pub fn row_count(&self, table: &str) -> Result<usize, PersistenceError> {
        let conn = self.conn()?;
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .map_err(|e| PersistenceError::new("count", e).with_table(table))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// All rows of `table`, ordered by its first column.
    pub fn dump_table(&self, table: &str) -> Result<Vec<Vec<Value>>, PersistenceError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!("SELECT * FROM {table} ORDER BY 1"))
            .map_err(|e| PersistenceError::new("select", e).with_table(table))?;
        let width = stmt.column_count();
        let rows = stmt
            .query_map([], |row| (0..width).map(|i| row.get::<_, Value>(i)).collect())
            .map_err(|e| PersistenceError::new("select", e).with_table(table))?
            .collect::<Result<Vec<Vec<Value>>, _>>()
            .map_err(|e| PersistenceError::new("select", e).with_table(table))?;
        Ok(rows)
    }

    /// Names of the indexes defined on `table`.
    pub fn index_names(&self, table: &str) -> Result<Vec<String>, PersistenceError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT name FROM sqlite_master \
                 WHERE type = 'index' AND tbl_name = ?1 ORDER BY name",
            )
            .map_err(|e| PersistenceError::new("select", e).with_table(table))?;
        let names = stmt
            .query_map([table], |row| row.get::<_, String>(0))
            .map_err(|e| PersistenceError::new("select", e).with_table(table))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| PersistenceError::new("select", e).with_table(table))?;
        Ok(names)
    }

    /// Closes the connection.
    pub fn close(mut self) -> Result<(), PersistenceError> {
        if let Some(conn) = self.conn.take() {
            conn.close()
                .map_err(|(_, e)| PersistenceError::new("close", e))?;
            tracing::info!("Database connection closed");
        }
        Ok(())
    }
}

impl Drop for WarehouseStore {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            match conn.close() {
                Ok(()) => tracing::info!("Database connection closed"),
                Err((_, e)) => tracing::warn!(error = %e, "Failed to close database connection"),
            }
        }
    }
}

/// Opens the store at `path`, loads `model` and closes the connection,
/// whether or not the load succeeded.
pub fn load(
    model: &DimensionalModel,
    path: &Path,
    mode: LoadMode,
) -> Result<LoadReport, PersistenceError> {
    let mut store = WarehouseStore::open(path)?;
    let report = store.load(model, mode)?;
    store.close()?;
    Ok(report)
}

fn set_foreign_keys(conn: &Connection, enabled: bool) -> Result<(), PersistenceError> {
    conn.pragma_update(None, "foreign_keys", enabled)
        .map_err(|e| PersistenceError::new("set foreign_keys", e))
}

fn replace_tables(
    conn: &mut Connection,
    model: &DimensionalModel,
    mode: LoadMode,
) -> Result<LoadReport, PersistenceError> {
    let dims = &model.dimensions;
    match mode {
        LoadMode::PerTable => {
            let tables = vec![
                commit_table(conn, dims.location.rows())?,
                commit_table(conn, dims.vehicle.rows())?,
                commit_table(conn, dims.utility.rows())?,
                commit_table(conn, dims.time.rows())?,
                commit_table(conn, &model.fact.rows)?,
            ];
            let indexes = create_indexes(conn)?;
            Ok(LoadReport { tables, indexes })
        }
        LoadMode::Atomic => {
            let tx = conn
                .transaction()
                .map_err(|e| PersistenceError::new("begin transaction", e))?;
            let tables = vec![
                write_table(&tx, dims.location.rows())?,
                write_table(&tx, dims.vehicle.rows())?,
                write_table(&tx, dims.utility.rows())?,
                write_table(&tx, dims.time.rows())?,
                write_table(&tx, &model.fact.rows)?,
            ];
            let indexes = create_indexes(&tx)?;
            tx.commit().map_err(|e| PersistenceError::new("commit", e))?;
            Ok(LoadReport { tables, indexes })
        }
    }
}

fn commit_table<R: TableRow>(
    conn: &mut Connection,
    rows: &[R],
) -> Result<(String, usize), PersistenceError> {
    let tx = conn
        .transaction()
        .map_err(|e| PersistenceError::new("begin transaction", e).with_table(R::TABLE))?;
    let written = write_table(&tx, rows)?;
    tx.commit()
        .map_err(|e| PersistenceError::new("commit", e).with_table(R::TABLE))?;
    Ok(written)
}

fn write_table<R: TableRow>(
    conn: &Connection,
    rows: &[R],
) -> Result<(String, usize), PersistenceError> {
    conn.execute(&format!("DROP TABLE IF EXISTS {}", R::TABLE), [])
        .map_err(|e| PersistenceError::new("drop table", e).with_table(R::TABLE))?;
    conn.execute(&create_sql::<R>(), [])
        .map_err(|e| PersistenceError::new("create table", e).with_table(R::TABLE))?;

    let mut stmt = conn
        .prepare(&insert_sql::<R>())
        .map_err(|e| PersistenceError::new("prepare insert", e).with_table(R::TABLE))?;
    for row in rows {
        row.insert(&mut stmt)
            .map_err(|e| PersistenceError::new("insert", e).with_table(R::TABLE))?;
    }

    tracing::info!(table = R::TABLE, rows = rows.len(), "Loaded table");
    Ok((R::TABLE.to_string(), rows.len()))
}

fn create_indexes(conn: &Connection) -> Result<usize, PersistenceError> {
    for index in &INDEXES {
        conn.execute(&index.create_sql(), [])
            .map_err(|e| PersistenceError::new("create index", e).with_table(index.table))?;
    }
    Ok(INDEXES.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{build_model, DimensionTable, FACT_TABLE};
    use crate::testing::sample_raw_table;
    use crate::transform::{clean, TransformOptions};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample_model() -> DimensionalModel {
        let cleaned = clean(
            &sample_raw_table(),
            TransformOptions::default().with_current_year(2026),
        );
        build_model(&cleaned).unwrap()
    }

    #[test]
    fn test_load_writes_every_table() {
        let model = sample_model();
        let mut store = WarehouseStore::open_in_memory().unwrap();

        let report = store.load(&model, LoadMode::PerTable).unwrap();
        assert_eq!(report.rows(FACT_TABLE), Some(3));
        assert_eq!(report.rows("dim_time"), Some(2));
        assert_eq!(report.indexes, 8);
        assert_eq!(store.row_count(FACT_TABLE).unwrap(), 3);
        assert_eq!(
            store.row_count("dim_location").unwrap(),
            model.dimensions.location.len()
        );
    }

    #[test]
    fn test_reload_replaces_rather_than_appends() {
        let model = sample_model();
        let mut store = WarehouseStore::open_in_memory().unwrap();

        store.load(&model, LoadMode::PerTable).unwrap();
        let first = store.dump_table("dim_vehicle").unwrap();
        store.load(&model, LoadMode::Atomic).unwrap();

        assert_eq!(store.row_count(FACT_TABLE).unwrap(), 3);
        assert_eq!(store.dump_table("dim_vehicle").unwrap(), first);
    }

    /// The sample model with renamed utilities and a fact row that violates
    /// `base_msrp NOT NULL` (`NaN` binds as NULL).
    fn model_failing_at_fact_table() -> DimensionalModel {
        let mut model = sample_model();
        let renamed = model
            .dimensions
            .utility
            .rows()
            .iter()
            .cloned()
            .map(|mut row| {
                row.utility_name.push_str(" (RENAMED)");
                row
            })
            .collect();
        model.dimensions.utility = DimensionTable::from_rows(renamed);
        model.fact.rows[1].base_msrp = f64::NAN;
        model
    }

    fn foreign_keys_enabled(store: &WarehouseStore) -> bool {
        store
            .conn()
            .unwrap()
            .query_row("PRAGMA foreign_keys", [], |row| row.get::<_, i64>(0))
            .unwrap()
            == 1
    }

    #[test]
    fn test_reload_file_in_both_modes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("warehouse.db");
        let model = sample_model();

        load(&model, &path, LoadMode::PerTable).unwrap();
        let first = WarehouseStore::open(&path)
            .unwrap()
            .dump_table("dim_location")
            .unwrap();

        for mode in [LoadMode::PerTable, LoadMode::Atomic] {
            let report = load(&model, &path, mode).unwrap();
            assert_eq!(report.rows(FACT_TABLE), Some(3));
        }

        let store = WarehouseStore::open(&path).unwrap();
        assert_eq!(store.dump_table("dim_location").unwrap(), first);
        assert_eq!(store.row_count(FACT_TABLE).unwrap(), 3);
    }

    #[test]
    fn test_foreign_keys_enforced_after_load() {
        let mut store = WarehouseStore::open_in_memory().unwrap();
        store.load(&sample_model(), LoadMode::PerTable).unwrap();
        assert!(foreign_keys_enabled(&store));

        let err = store
            .load(&model_failing_at_fact_table(), LoadMode::Atomic)
            .unwrap_err();
        assert_eq!(err.operation, "insert");
        assert!(foreign_keys_enabled(&store));
    }

    #[test]
    fn test_atomic_failure_keeps_previous_warehouse() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("warehouse.db");
        load(&sample_model(), &path, LoadMode::PerTable).unwrap();
        let utilities = WarehouseStore::open(&path)
            .unwrap()
            .dump_table("dim_utility")
            .unwrap();

        let err =
            load(&model_failing_at_fact_table(), &path, LoadMode::Atomic).unwrap_err();
        assert_eq!(err.operation, "insert");
        assert_eq!(err.table.as_deref(), Some(FACT_TABLE));

        let store = WarehouseStore::open(&path).unwrap();
        assert_eq!(store.dump_table("dim_utility").unwrap(), utilities);
        assert_eq!(store.row_count(FACT_TABLE).unwrap(), 3);
        assert_eq!(store.index_names("dim_utility").unwrap(), vec!["idx_utility_name"]);
    }

    #[test]
    fn test_per_table_failure_keeps_committed_tables() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("warehouse.db");
        load(&sample_model(), &path, LoadMode::PerTable).unwrap();

        let err =
            load(&model_failing_at_fact_table(), &path, LoadMode::PerTable).unwrap_err();
        assert_eq!(err.table.as_deref(), Some(FACT_TABLE));

        let store = WarehouseStore::open(&path).unwrap();
        let names: Vec<Value> = store
            .dump_table("dim_utility")
            .unwrap()
            .into_iter()
            .map(|row| row[1].clone())
            .collect();
        assert!(names
            .iter()
            .all(|n| matches!(n, Value::Text(t) if t.ends_with(" (RENAMED)"))));
        assert_eq!(store.row_count(FACT_TABLE).unwrap(), 3);
        store.close().unwrap();
    }

    #[test]
    fn test_failed_load_releases_connection() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("warehouse.db");

        load(&model_failing_at_fact_table(), &path, LoadMode::Atomic).unwrap_err();

        let mut store = WarehouseStore::open(&path).unwrap();
        let report = store.load(&sample_model(), LoadMode::Atomic).unwrap();
        assert_eq!(report.rows(FACT_TABLE), Some(3));
        store.close().unwrap();
    }

    #[test]
    fn test_indexes_created() {
        let mut store = WarehouseStore::open_in_memory().unwrap();
        store.load(&sample_model(), LoadMode::Atomic).unwrap();

        assert_eq!(
            store.index_names(FACT_TABLE).unwrap(),
            vec![
                "idx_fact_location",
                "idx_fact_time",
                "idx_fact_utility",
                "idx_fact_vehicle"
            ]
        );
        assert_eq!(store.index_names("dim_utility").unwrap(), vec!["idx_utility_name"]);
    }

    #[test]
    fn test_year_category_stored_as_label() {
        let mut store = WarehouseStore::open_in_memory().unwrap();
        store.load(&sample_model(), LoadMode::PerTable).unwrap();

        let rows = store.dump_table("dim_time").unwrap();
        assert_eq!(rows[0][3], Value::Text("2015-2020".to_string()));
        assert_eq!(rows[1][3], Value::Text("Pre-2015".to_string()));
    }

    #[test]
    fn test_load_to_file_closes_connection() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("warehouse.db");

        let report = load(&sample_model(), &path, LoadMode::PerTable).unwrap();
        assert_eq!(report.rows(FACT_TABLE), Some(3));

        let reopened = WarehouseStore::open(&path).unwrap();
        assert_eq!(reopened.row_count(FACT_TABLE).unwrap(), 3);
    }

    #[test]
    fn test_unopenable_path_is_persistence_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("warehouse.db");

        let err = load(&sample_model(), &path, LoadMode::PerTable).unwrap_err();
        assert_eq!(err.operation, "open");
    }

    #[test]
    fn test_missing_table_count_fails() {
        let store = WarehouseStore::open_in_memory().unwrap();
        let err = store.row_count("dim_location").unwrap_err();
        assert_eq!(err.table.as_deref(), Some("dim_location"));
    }
}
