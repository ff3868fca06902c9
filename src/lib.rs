//! Batch conversion of potentiostat voltammetry exports.
//!
//! This crate provides tools for:
//! - Loading raw LSV/CV text exports (fixed preamble, four whitespace-separated columns)
//! - Referencing potentials to RHE and normalising currents to current density
//! - Collecting every converted series into per-category master tables
//! - Plotting all files of a category in a folder on one figure
//!
//! # Example
//!
//! ```no_run
//! use voltammetry_pipeline::{core::transforms::correct_file, ExperimentCondition};
//!
//! let series = correct_file("run1/lsv_1.txt", &ExperimentCondition::new(0.197, 13.0)).unwrap();
//! println!("{} points", series.len());
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;
pub mod visualization;

pub use config::{ExperimentCondition, PipelineConfig, PlotConfig};
pub use core::{Category, CorrectedSeries, MasterTable, RawRecord};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
