//! Category-wide master tables.
//!
//! Every processed file contributes an `<identity>_x` and `<identity>_y`
//! column. Columns have independent lengths; the table pads shorter columns
//! with missing cells up to the longest one.

use log::warn;

use super::transforms::CorrectedSeries;

/// Ordered collection of named columns for one category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MasterAccumulator {
    columns: Vec<(String, Vec<f64>)>,
}

impl MasterAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of columns collected so far.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Values of a column, if present.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    /// Insert or replace a single column.
    ///
    /// A replaced column keeps its original position.
    pub fn insert_column(&mut self, name: String, values: Vec<f64>) {
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => {
                warn!("Column '{}' already present, replacing earlier values", name);
                *existing = values;
            }
            None => self.columns.push((name, values)),
        }
    }

    /// Insert a series under `<identity>_x` and `<identity>_y`.
    pub fn insert_series(&mut self, identity: &str, series: CorrectedSeries) {
        let CorrectedSeries { x, y } = series;
        self.insert_column(format!("{}_x", identity), x);
        self.insert_column(format!("{}_y", identity), y);
    }

    /// Consume the accumulator into the padded table.
    pub fn into_table(self) -> MasterTable {
        MasterTable::from_columns(self.columns)
    }
}

/// Rectangular view over ragged columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MasterTable {
    headers: Vec<String>,
    columns: Vec<Vec<f64>>,
    num_rows: usize,
}

impl MasterTable {
    /// Merge ragged columns, padding to the longest.
    pub fn from_columns(columns: Vec<(String, Vec<f64>)>) -> Self {
        let num_rows = columns.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
        let (headers, columns): (Vec<String>, Vec<Vec<f64>>) = columns.into_iter().unzip();

        Self {
            headers,
            columns,
            num_rows,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    #[inline]
    pub fn num_columns(&self) -> usize {
        self.headers.len()
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Cell value, `None` where the column is shorter than the table.
    #[inline]
    pub fn cell(&self, row: usize, col: usize) -> Option<f64> {
        self.columns.get(col).and_then(|c| c.get(row)).copied()
    }

    /// One padded row.
    pub fn row(&self, row: usize) -> Vec<Option<f64>> {
        (0..self.num_columns()).map(|col| self.cell(row, col)).collect()
    }
}
