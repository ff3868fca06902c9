//! Loader for raw potentiostat text exports.
//!
//! An export starts with a fixed-size preamble written by the instrument
//! software, followed by whitespace-delimited rows of
//! `index time potential current`. Only the potential and current columns
//! are kept.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Number of preamble lines skipped before the data rows.
pub const PREAMBLE_LINES: usize = 19;

/// Number of whitespace-separated fields in a data row.
pub const FIELDS_PER_ROW: usize = 4;

const POTENTIAL_FIELD: usize = 2;
const CURRENT_FIELD: usize = 3;

/// Errors that can occur while loading a raw export.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no data rows after the preamble: {0}")]
    EmptyFile(PathBuf),

    #[error("{path}:{line}: expected 4 fields, found {found}")]
    MalformedRow {
        path: PathBuf,
        line: usize,
        found: usize,
    },

    #[error("{path}:{line}: invalid {column} value '{value}'")]
    InvalidNumber {
        path: PathBuf,
        line: usize,
        column: &'static str,
        value: String,
    },
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Potential and current columns of one raw export, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    /// Measured potential in volts.
    pub potential: Vec<f64>,
    /// Measured current in instrument units.
    pub current: Vec<f64>,
    /// Source file path.
    pub source_path: Option<PathBuf>,
}

impl RawRecord {
    /// Creates an empty record with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            potential: Vec::with_capacity(capacity),
            current: Vec::with_capacity(capacity),
            source_path: None,
        }
    }

    /// Returns the number of data rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.potential.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.potential.is_empty()
    }

    /// Adds one data row.
    #[inline]
    pub fn push(&mut self, potential: f64, current: f64) {
        self.potential.push(potential);
        self.current.push(current);
    }
}

/// Load a raw export from disk.
///
/// The first [`PREAMBLE_LINES`] lines are skipped without inspection.
/// Blank lines after the preamble are ignored; any other line must hold
/// exactly [`FIELDS_PER_ROW`] fields with numeric potential and current,
/// otherwise the whole file is rejected.
///
/// # Errors
///
/// Returns an error if the file cannot be read, holds a malformed row,
/// or has no data rows.
pub fn load_raw_record<P: AsRef<Path>>(path: P) -> Result<RawRecord> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| LoaderError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    // Instrument preambles are not always UTF-8; they are skipped anyway.
    let text = String::from_utf8_lossy(&bytes);

    let mut record = parse_raw_text(&text, path)?;
    record.source_path = Some(path.to_path_buf());
    Ok(record)
}

/// Parse the text of a raw export. `path` is only used in error messages.
pub fn parse_raw_text(text: &str, path: &Path) -> Result<RawRecord> {
    let mut record = RawRecord::with_capacity(1024);

    for (idx, line) in text.lines().enumerate().skip(PREAMBLE_LINES) {
        let line_no = idx + 1;
        let fields: Vec<&str> = line.split_whitespace().collect();

        if fields.is_empty() {
            continue;
        }

        if fields.len() != FIELDS_PER_ROW {
            return Err(LoaderError::MalformedRow {
                path: path.to_path_buf(),
                line: line_no,
                found: fields.len(),
            });
        }

        let potential = parse_field(fields[POTENTIAL_FIELD], "potential", path, line_no)?;
        let current = parse_field(fields[CURRENT_FIELD], "current", path, line_no)?;

        record.push(potential, current);
    }

    if record.is_empty() {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }

    Ok(record)
}

fn parse_field(value: &str, column: &'static str, path: &Path, line: usize) -> Result<f64> {
    value.parse::<f64>().map_err(|_| LoaderError::InvalidNumber {
        path: path.to_path_buf(),
        line,
        column,
        value: value.to_string(),
    })
}
