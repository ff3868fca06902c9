//! CSV writers for corrected series and master tables.
//!
//! Floats are written in their shortest round-trip form, switching to
//! exponent notation for very small or very large magnitudes. NaN and
//! missing cells are written as empty fields.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::table::MasterTable;
use super::transforms::CorrectedSeries;

/// Header of the potential column in per-file outputs.
pub const POTENTIAL_HEADER: &str = "E_vs_RHE";

/// Header of the current density column in per-file outputs.
pub const CURRENT_DENSITY_HEADER: &str = "Current_density";

/// Suffix replacing `.txt` in per-file output names.
pub const OUTPUT_SUFFIX: &str = "_output.csv";

/// Magnitudes below this are written in exponent notation.
const EXPONENT_BELOW: f64 = 1e-4;

/// Magnitudes at or above this are written in exponent notation.
const EXPONENT_FROM: f64 = 1e16;

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write data to file.
    #[error("failed to write to file '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV writing error.
    #[error("CSV write error for '{path}': {source}")]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Creates parent directories for a file path if they don't exist.
fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

fn create_csv_writer(path: &Path) -> Result<csv::Writer<BufWriter<File>>> {
    ensure_parent_dirs(path)?;

    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(csv::Writer::from_writer(BufWriter::new(file)))
}

/// Format a value the way it appears in output CSVs.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        return String::new();
    }

    let magnitude = value.abs();
    if magnitude != 0.0 && (magnitude < EXPONENT_BELOW || magnitude >= EXPONENT_FROM) {
        format!("{:e}", value)
    } else {
        value.to_string()
    }
}

fn format_cell(value: Option<f64>) -> String {
    value.map(format_value).unwrap_or_default()
}

/// Path of the per-file output next to a raw export.
///
/// `data/lsv_1.txt` becomes `data/lsv_1_output.csv`.
pub fn output_path_for(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.strip_suffix(".txt").unwrap_or(&name);
    input.with_file_name(format!("{}{}", stem, OUTPUT_SUFFIX))
}

/// Write a corrected series with `E_vs_RHE,Current_density` headers.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
///
/// # Example
///
/// ```no_run
/// use voltammetry_pipeline::core::transforms::CorrectedSeries;
/// use voltammetry_pipeline::core::writers::write_series_csv;
/// use std::path::Path;
///
/// let series = CorrectedSeries { x: vec![0.7, 0.8], y: vec![0.1, 0.2] };
/// write_series_csv(Path::new("lsv_1_output.csv"), &series).unwrap();
/// ```
pub fn write_series_csv(path: &Path, series: &CorrectedSeries) -> Result<()> {
    let mut csv_writer = create_csv_writer(path)?;
    let path_str = path.display().to_string();

    csv_writer
        .write_record([POTENTIAL_HEADER, CURRENT_DENSITY_HEADER])
        .map_err(|e| WriteError::CsvError {
            path: path_str.clone(),
            source: e,
        })?;

    for (x, y) in series.points() {
        csv_writer
            .write_record(&[format_value(x), format_value(y)])
            .map_err(|e| WriteError::CsvError {
                path: path_str.clone(),
                source: e,
            })?;
    }

    csv_writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}

/// Write a master table, padding short columns with empty cells.
///
/// A table without columns produces an empty file.
pub fn write_master_csv(path: &Path, table: &MasterTable) -> Result<()> {
    if table.num_columns() == 0 {
        ensure_parent_dirs(path)?;
        File::create(path).map_err(|e| WriteError::CreateFile {
            path: path.display().to_string(),
            source: e,
        })?;
        return Ok(());
    }

    let mut csv_writer = create_csv_writer(path)?;
    let path_str = path.display().to_string();

    csv_writer
        .write_record(table.headers())
        .map_err(|e| WriteError::CsvError {
            path: path_str.clone(),
            source: e,
        })?;

    for row in 0..table.num_rows() {
        let cells: Vec<String> = table.row(row).into_iter().map(format_cell).collect();
        csv_writer
            .write_record(&cells)
            .map_err(|e| WriteError::CsvError {
                path: path_str.clone(),
                source: e,
            })?;
    }

    csv_writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}
