//! Core data types and I/O operations.

pub mod category;
pub mod loaders;
pub mod table;
pub mod transforms;
pub mod writers;

pub use category::Category;
pub use loaders::{load_raw_record, LoaderError, RawRecord};
pub use table::{MasterAccumulator, MasterTable};
pub use transforms::{correct_file, correct_record, CorrectedSeries};
pub use writers::{output_path_for, write_master_csv, write_series_csv, WriteError};
