//! Batch processing over an experiment tree.

pub mod batch;
pub mod discovery;

// Re-export key types for convenience
pub use batch::{
    process_file, process_folder, run_batch, run_batch_with_progress, write_master_tables,
    BatchSummary, FileOutput, FolderReport, MasterAccumulators,
};
pub use discovery::{
    file_identity, find_category_files, find_condition_folders, CategoryMatcher,
    ConditionFolder, DiscoveryError,
};
