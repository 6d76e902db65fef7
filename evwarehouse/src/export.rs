//! Flat-file export: one CSV per warehouse table.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::errors::ExportError;
use crate::load::TableRow;
use crate::model::DimensionalModel;

/// Writes each table of `model` to `<dir>/<table>.csv`, creating `dir` if
/// needed. Returns the written paths in load order.
pub fn export_csv(model: &DimensionalModel, dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
    tracing::info!(dir = %dir.display(), "Exporting tables to CSV");
    std::fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let dims = &model.dimensions;
    let paths = vec![
        write_csv(dir, dims.location.rows())?,
        write_csv(dir, dims.vehicle.rows())?,
        write_csv(dir, dims.utility.rows())?,
        write_csv(dir, dims.time.rows())?,
        write_csv(dir, &model.fact.rows)?,
    ];

    tracing::info!(files = paths.len(), "CSV export completed");
    Ok(paths)
}

fn write_csv<R: TableRow + Serialize>(dir: &Path, rows: &[R]) -> Result<PathBuf, ExportError> {
    let path = dir.join(format!("{}.csv", R::TABLE));
    let csv_error = |source| ExportError::Csv {
        table: R::TABLE.to_string(),
        source,
    };

    let mut writer = csv::Writer::from_path(&path).map_err(csv_error)?;
    if rows.is_empty() {
        let header: Vec<&str> = R::COLUMNS.iter().map(|c| c.name).collect();
        writer.write_record(&header).map_err(csv_error)?;
    }
    for row in rows {
        writer.serialize(row).map_err(csv_error)?;
    }
    writer.flush().map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;

    tracing::info!(table = R::TABLE, rows = rows.len(), path = %path.display(), "Exported table");
    Ok(path)
}
