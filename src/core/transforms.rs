//! Reference and area corrections for raw voltammetry records.
//!
//! The measured potential is shifted onto the RHE scale with the folder's
//! reference offset and a Nernstian pH term; the measured current is divided
//! by the electrode area to give a current density.

use std::path::Path;

use super::loaders::{self, RawRecord};
use crate::config::ExperimentCondition;

/// Nernstian slope in volts per pH unit.
pub const NERNST_SLOPE_V_PER_PH: f64 = 0.059;

/// Active electrode area in cm².
pub const ELECTRODE_AREA_CM2: f64 = 0.1979;

/// Potential vs RHE paired with current density, one entry per data row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrectedSeries {
    /// Potential vs RHE in volts.
    pub x: Vec<f64>,
    /// Current density.
    pub y: Vec<f64>,
}

impl CorrectedSeries {
    #[inline]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Iterate over `(x, y)` pairs in row order.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

/// Convert a measured potential to the RHE scale.
#[inline]
pub fn potential_vs_rhe(potential: f64, condition: &ExperimentCondition) -> f64 {
    potential + condition.e_red + NERNST_SLOPE_V_PER_PH * condition.ph
}

/// Convert a measured current to current density.
#[inline]
pub fn current_density(current: f64) -> f64 {
    current / ELECTRODE_AREA_CM2
}

/// Apply both corrections to every row of a record.
pub fn correct_record(record: &RawRecord, condition: &ExperimentCondition) -> CorrectedSeries {
    let x = record
        .potential
        .iter()
        .map(|&p| potential_vs_rhe(p, condition))
        .collect();
    let y = record.current.iter().map(|&c| current_density(c)).collect();

    CorrectedSeries { x, y }
}

/// Load a raw export and return its corrected series.
pub fn correct_file<P: AsRef<Path>>(
    path: P,
    condition: &ExperimentCondition,
) -> loaders::Result<CorrectedSeries> {
    let record = loaders::load_raw_record(path)?;
    Ok(correct_record(&record, condition))
}
