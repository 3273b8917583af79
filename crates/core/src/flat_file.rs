//! Flat CSV-file storage helpers.
//!
//! Both the identity mapping and the vitals store are single CSV files with a
//! fixed header. These helpers own the shared mechanics: bootstrapping a
//! missing file with its header, self-healing a missing or malformed header
//! without losing data rows, and appending/reading rows through serde.
//!
//! Self-healing is an idempotent repair, not a normal-path behaviour: a file
//! whose first line is not the expected header gets the header prepended and
//! the existing lines kept as data. Rows that then fail to decode are skipped
//! with a warning rather than failing the whole read.

use crate::error::{ObsError, ObsResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::fs::OpenOptions;
use std::path::Path;

/// Ensures `path` exists and starts with the expected header line.
///
/// Creates the parent directory and a header-only file when missing. When the
/// first line differs from the expected header, the header is prepended and
/// every existing line is preserved as a data row.
pub(crate) fn ensure_header(path: &Path, columns: &[&str]) -> ObsResult<()> {
    let header = columns.join(",");

    if !path.exists() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ObsError::StorageDirCreation)?;
        }
        fs::write(path, format!("{header}\n")).map_err(ObsError::FileWrite)?;
        return Ok(());
    }

    let contents = fs::read_to_string(path).map_err(ObsError::FileRead)?;
    let first_line = contents.lines().next().unwrap_or("");
    if first_line.trim() == header {
        return Ok(());
    }

    tracing::warn!(path = %path.display(), "repairing missing or malformed CSV header");
    let mut repaired = String::with_capacity(header.len() + 1 + contents.len());
    repaired.push_str(&header);
    repaired.push('\n');
    repaired.push_str(&contents);
    if !repaired.ends_with('\n') {
        repaired.push('\n');
    }
    fs::write(path, repaired).map_err(ObsError::FileWrite)?;

    Ok(())
}

/// Appends one row, bootstrapping or repairing the header first.
///
/// The row is flushed before returning, so it is visible to any subsequent
/// read.
pub(crate) fn append_row<T: Serialize>(path: &Path, columns: &[&str], row: &T) -> ObsResult<()> {
    ensure_header(path, columns)?;

    let file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(ObsError::FileWrite)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    writer.serialize(row).map_err(ObsError::CsvWrite)?;
    writer.flush().map_err(ObsError::FileWrite)?;

    Ok(())
}

/// Reads every decodable row in file order.
///
/// A missing file reads as no rows. Rows that fail to decode are logged and
/// skipped so one bad line cannot hide the rest of the data.
pub(crate) fn read_rows<T: DeserializeOwned>(path: &Path, columns: &[&str]) -> ObsResult<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    ensure_header(path, columns)?;

    let mut reader = csv::Reader::from_path(path).map_err(ObsError::CsvRead)?;
    let mut rows = Vec::new();
    for result in reader.deserialize() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => {
                tracing::warn!(path = %path.display(), "skipping undecodable row: {e}");
            }
        }
    }

    Ok(rows)
}
