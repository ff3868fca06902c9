//! Batch conversion of an experiment tree.
//!
//! Every immediate subfolder of the root is one experimental condition.
//! Each tagged raw export is corrected with its folder's condition and
//! written next to the input; all series are collected into one master
//! table per category, written at the root once every folder is done.
//! The first failure aborts the run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info, warn};

use super::discovery::{
    file_identity, find_category_files, find_condition_folders, CategoryMatcher, ConditionFolder,
};
use crate::config::{ExperimentCondition, PipelineConfig, PlotConfig};
use crate::core::{
    correct_file, output_path_for, write_master_csv, write_series_csv, Category,
    CorrectedSeries, MasterAccumulator,
};
use crate::visualization::{self, CategoryFigure};

/// Master accumulators of both categories.
#[derive(Debug, Clone, Default)]
pub struct MasterAccumulators {
    pub lsv: MasterAccumulator,
    pub cv: MasterAccumulator,
}

impl MasterAccumulators {
    pub fn get(&self, category: Category) -> &MasterAccumulator {
        match category {
            Category::Lsv => &self.lsv,
            Category::Cv => &self.cv,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut MasterAccumulator {
        match category {
            Category::Lsv => &mut self.lsv,
            Category::Cv => &mut self.cv,
        }
    }
}

/// One converted raw export.
#[derive(Debug, Clone, PartialEq)]
pub struct FileOutput {
    pub category: Category,
    pub input: PathBuf,
    pub output: PathBuf,
    pub rows: usize,
}

/// What a single folder contributed to the batch.
#[derive(Debug, Clone)]
pub struct FolderReport {
    pub name: String,
    pub condition: ExperimentCondition,
    pub files: Vec<FileOutput>,
    pub plots: Vec<PathBuf>,
}

impl FolderReport {
    fn new(name: &str, condition: ExperimentCondition) -> Self {
        Self {
            name: name.to_string(),
            condition,
            files: Vec::new(),
            plots: Vec::new(),
        }
    }

    /// Number of files converted for a category.
    pub fn count(&self, category: Category) -> usize {
        self.files.iter().filter(|f| f.category == category).count()
    }
}

/// Result of a complete batch run.
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub folders: Vec<FolderReport>,
    pub master_files: Vec<PathBuf>,
}

impl BatchSummary {
    /// Number of files converted for a category across all folders.
    pub fn files_processed(&self, category: Category) -> usize {
        self.folders.iter().map(|f| f.count(category)).sum()
    }

    pub fn plots_written(&self) -> usize {
        self.folders.iter().map(|f| f.plots.len()).sum()
    }
}

/// Correct one raw export and write its sibling `_output.csv`.
///
/// # Returns
///
/// The output path and the corrected series.
pub fn process_file(
    input: &Path,
    condition: &ExperimentCondition,
) -> Result<(PathBuf, CorrectedSeries)> {
    let series = correct_file(input, condition)
        .with_context(|| format!("Failed to convert {}", input.display()))?;

    let output = output_path_for(input);
    write_series_csv(&output, &series)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    debug!(
        "{} -> {} ({} rows)",
        input.display(),
        output.display(),
        series.len()
    );

    Ok((output, series))
}

/// Convert every tagged export of one folder.
///
/// The accumulators are taken by value and handed back with this folder's
/// columns added. With `plot` set, one figure per category that had at
/// least one file is written into the folder.
pub fn process_folder(
    folder: &ConditionFolder,
    condition: &ExperimentCondition,
    mut accumulators: MasterAccumulators,
    plot: Option<&PlotConfig>,
) -> Result<(MasterAccumulators, FolderReport)> {
    let matchers: Vec<CategoryMatcher> = Category::ALL
        .iter()
        .map(|&category| CategoryMatcher::new(category))
        .collect();

    let mut report = FolderReport::new(&folder.name, *condition);

    for matcher in &matchers {
        let category = matcher.category();
        let files = find_category_files(&folder.path, matcher)?;
        let mut figure = CategoryFigure::new(folder.name.as_str(), category);

        for input in &files {
            let identity = file_identity(input);

            if matchers.iter().filter(|m| m.matches(&file_name_string(input))).count() > 1 {
                debug!(
                    "{} matches more than one category, converting it as {}",
                    input.display(),
                    category
                );
            }

            let (output, series) = process_file(input, condition)?;

            report.files.push(FileOutput {
                category,
                input: input.clone(),
                output,
                rows: series.len(),
            });

            if plot.is_some() {
                figure.add_line(identity.as_str(), series.clone());
            }
            accumulators.get_mut(category).insert_series(&identity, series);
        }

        if let Some(plot_config) = plot {
            if !figure.is_empty() {
                let paths = visualization::save_category_figure(&folder.path, &figure, plot_config)
                    .with_context(|| {
                        format!("Failed to plot {} for {}", category, folder.path.display())
                    })?;
                info!("Wrote {} plot for {}", category, folder.name);
                report.plots.extend(paths);
            }
        }
    }

    Ok((accumulators, report))
}

fn file_name_string(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Write `master_LSV.csv` and `master_CV.csv` into `root`.
///
/// Both files are written even when a category collected nothing.
pub fn write_master_tables(root: &Path, accumulators: MasterAccumulators) -> Result<Vec<PathBuf>> {
    let MasterAccumulators { lsv, cv } = accumulators;
    let mut written = Vec::with_capacity(2);

    for (category, accumulator) in [(Category::Lsv, lsv), (Category::Cv, cv)] {
        let path = root.join(category.master_file_name());
        let table = accumulator.into_table();

        write_master_csv(&path, &table)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!(
            "Wrote {} ({} columns, {} rows)",
            path.display(),
            table.num_columns(),
            table.num_rows()
        );
        written.push(path);
    }

    Ok(written)
}

/// Run the batch over `root`.
pub fn run_batch(root: &Path, config: &PipelineConfig) -> Result<BatchSummary> {
    run_batch_with_progress(root, config, |_, _, _| {})
}

/// Run the batch over `root`, reporting each folder before it is processed.
///
/// `progress` receives the folder index, the folder count and the folder.
pub fn run_batch_with_progress<F>(
    root: &Path,
    config: &PipelineConfig,
    mut progress: F,
) -> Result<BatchSummary>
where
    F: FnMut(usize, usize, &ConditionFolder),
{
    let folders = find_condition_folders(root)
        .with_context(|| format!("Failed to scan {}", root.display()))?;
    let plot = config.plot.enabled.then_some(&config.plot);

    if folders.is_empty() {
        warn!("No experiment folders found in {}", root.display());
    }

    let mut accumulators = MasterAccumulators::default();
    let mut reports = Vec::with_capacity(folders.len());

    for (idx, folder) in folders.iter().enumerate() {
        progress(idx, folders.len(), folder);

        if config.explicit_condition(&folder.name).is_none() {
            warn!(
                "No condition configured for '{}', using E_red = {} V, pH = {}",
                folder.name, config.default_condition.e_red, config.default_condition.ph
            );
        }
        let condition = config.condition_for(&folder.name);

        info!(
            "Processing {} (E_red = {} V, pH = {})",
            folder.name, condition.e_red, condition.ph
        );

        let (next, report) = process_folder(folder, &condition, accumulators, plot)?;
        accumulators = next;
        reports.push(report);
    }

    let master_files = write_master_tables(root, accumulators)?;

    Ok(BatchSummary {
        folders: reports,
        master_files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loaders::PREAMBLE_LINES;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn write_export(dir: &Path, name: &str, rows: &[&str]) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        for i in 0..PREAMBLE_LINES {
            writeln!(file, "Instrument header {}", i).unwrap();
        }
        for row in rows {
            writeln!(file, "{}", row).unwrap();
        }
        path
    }

    fn ramp(n: usize) -> Vec<String> {
        (0..n)
            .map(|i| format!("{} {} {} {}", i + 1, i as f64 * 0.1, i as f64 * 0.01, i as f64 * 1e-4))
            .collect()
    }

    fn write_ramp(dir: &Path, name: &str, n: usize) -> PathBuf {
        let rows = ramp(n);
        let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
        write_export(dir, name, &refs)
    }

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_end_to_end_example() {
        let root = TempDir::new().unwrap();
        let folder = root.path().join("run1");
        write_export(
            &folder,
            "lsv_1.txt",
            &[
                "1 0.0 0.100 0.0197900",
                "2 0.1 0.200 0.0395800",
                "3 0.2 0.300 0.0593700",
            ],
        );

        let mut config = PipelineConfig::default();
        config
            .conditions
            .insert("run1".to_string(), ExperimentCondition::new(0.2, 7.0));

        let summary = run_batch(root.path(), &config).unwrap();
        assert_eq!(summary.files_processed(Category::Lsv), 1);
        assert_eq!(summary.files_processed(Category::Cv), 0);

        let lines = read_lines(&folder.join("lsv_1_output.csv"));
        assert_eq!(lines[0], "E_vs_RHE,Current_density");
        assert_eq!(lines.len(), 4);

        let expected = [(0.713, 0.1), (0.813, 0.2), (0.913, 0.3)];
        for (line, (ex, ey)) in lines[1..].iter().zip(expected) {
            let mut parts = line.split(',');
            let x: f64 = parts.next().unwrap().parse().unwrap();
            let y: f64 = parts.next().unwrap().parse().unwrap();
            assert!((x - ex).abs() < 1e-12);
            assert!((y - ey).abs() < 1e-12);
        }

        let master = read_lines(&root.path().join("master_LSV.csv"));
        assert_eq!(master[0], "lsv_1_x,lsv_1_y");
        assert_eq!(master.len(), 4);

        assert_eq!(fs::read_to_string(root.path().join("master_CV.csv")).unwrap(), "");
    }

    #[test]
    fn test_output_row_count_matches_input() {
        let root = TempDir::new().unwrap();
        let input = write_ramp(&root.path().join("a"), "cv_scan.txt", 57);

        run_batch(root.path(), &PipelineConfig::default()).unwrap();

        let lines = read_lines(&output_path_for(&input));
        assert_eq!(lines.len(), 57 + 1);
    }

    #[test]
    fn test_master_tables_span_all_folders() {
        let root = TempDir::new().unwrap();
        write_ramp(&root.path().join("a"), "lsv_a1.txt", 4);
        write_ramp(&root.path().join("a"), "cv_a1.txt", 2);
        write_ramp(&root.path().join("b"), "lsv_b1.txt", 6);
        write_ramp(&root.path().join("b"), "lsv_b2.txt", 3);

        let summary = run_batch(root.path(), &PipelineConfig::default()).unwrap();
        assert_eq!(summary.files_processed(Category::Lsv), 3);
        assert_eq!(summary.master_files.len(), 2);

        let lsv = read_lines(&root.path().join("master_LSV.csv"));
        assert_eq!(
            lsv[0],
            "lsv_a1_x,lsv_a1_y,lsv_b1_x,lsv_b1_y,lsv_b2_x,lsv_b2_y"
        );
        assert_eq!(lsv.len(), 6 + 1);
        // lsv_a1 has 4 rows, lsv_b2 has 3
        assert!(lsv[6].starts_with(",,"));
        assert!(lsv[6].ends_with(",,"));

        let cv = read_lines(&root.path().join("master_CV.csv"));
        assert_eq!(cv[0], "cv_a1_x,cv_a1_y");
        assert_eq!(cv.len(), 2 + 1);
    }

    #[test]
    fn test_accumulators_are_threaded_through_folders() {
        let root = TempDir::new().unwrap();
        write_ramp(&root.path().join("a"), "lsv_1.txt", 3);
        write_ramp(&root.path().join("b"), "cv_1.txt", 2);

        let folders = find_condition_folders(root.path()).unwrap();
        let condition = ExperimentCondition::default();

        let acc = MasterAccumulators::default();
        let (acc, report_a) = process_folder(&folders[0], &condition, acc, None).unwrap();
        assert_eq!(acc.get(Category::Lsv).num_columns(), 2);
        assert_eq!(report_a.count(Category::Lsv), 1);

        let (acc, report_b) = process_folder(&folders[1], &condition, acc, None).unwrap();
        assert_eq!(acc.get(Category::Lsv).num_columns(), 2);
        assert_eq!(acc.get(Category::Cv).num_columns(), 2);
        assert_eq!(report_b.files[0].rows, 2);
    }

    #[test]
    fn test_empty_folder_contributes_nothing() {
        let root = TempDir::new().unwrap();
        let empty = root.path().join("empty");
        fs::create_dir_all(&empty).unwrap();
        File::create(empty.join("notes.txt")).unwrap();

        let mut config = PipelineConfig::default();
        config.plot.enabled = true;

        let summary = run_batch(root.path(), &config).unwrap();

        assert_eq!(summary.plots_written(), 0);
        assert!(!empty.join("lsv_plot.png").exists());
        assert!(!empty.join("cv_plot.svg").exists());
        assert_eq!(fs::read_to_string(root.path().join("master_LSV.csv")).unwrap(), "");
    }

    #[test]
    fn test_plots_only_categories_with_files() {
        let root = TempDir::new().unwrap();
        let folder = root.path().join("a");
        write_ramp(&folder, "lsv_1.txt", 2);

        let mut config = PipelineConfig::default();
        config.plot.enabled = true;
        config.plot.width = 640;
        config.plot.height = 480;

        let summary = run_batch(root.path(), &config).unwrap();

        assert_eq!(summary.plots_written(), 2);
        assert_eq!(
            summary.folders[0].plots,
            vec![folder.join("lsv_plot.png"), folder.join("lsv_plot.svg")]
        );
        assert!(folder.join("lsv_plot.png").exists());
        assert!(folder.join("lsv_plot.svg").exists());
        assert!(!folder.join("cv_plot.png").exists());
        assert!(!folder.join("cv_plot.svg").exists());
    }

    #[test]
    fn test_plotting_disabled_writes_no_images() {
        let root = TempDir::new().unwrap();
        let folder = root.path().join("a");
        write_ramp(&folder, "lsv_1.txt", 2);

        let summary = run_batch(root.path(), &PipelineConfig::default()).unwrap();

        assert_eq!(summary.plots_written(), 0);
        assert!(!folder.join("lsv_plot.png").exists());
    }

    #[test]
    fn test_file_with_both_tags_is_processed_twice() {
        let root = TempDir::new().unwrap();
        write_ramp(&root.path().join("a"), "lsvcv_1.txt", 2);

        let summary = run_batch(root.path(), &PipelineConfig::default()).unwrap();

        assert_eq!(summary.files_processed(Category::Lsv), 1);
        assert_eq!(summary.files_processed(Category::Cv), 1);
        assert_eq!(read_lines(&root.path().join("master_LSV.csv"))[0], "lsvcv_1_x,lsvcv_1_y");
        assert_eq!(read_lines(&root.path().join("master_CV.csv"))[0], "lsvcv_1_x,lsvcv_1_y");
    }

    #[test]
    fn test_unlisted_folder_uses_default_condition() {
        let root = TempDir::new().unwrap();
        let input = write_export(&root.path().join("x"), "lsv.txt", &["1 0 0.5 0"]);

        let mut config = PipelineConfig::default();
        config.default_condition = ExperimentCondition::new(1.0, 0.0);

        run_batch(root.path(), &config).unwrap();

        let lines = read_lines(&output_path_for(&input));
        assert_eq!(lines[1], "1.5,0");
    }

    #[test]
    fn test_parse_failure_aborts_run() {
        let root = TempDir::new().unwrap();
        write_ramp(&root.path().join("a"), "lsv_ok.txt", 3);
        write_export(&root.path().join("b"), "lsv_bad.txt", &["1 0 0.1 oops"]);

        let err = run_batch(root.path(), &PipelineConfig::default()).unwrap_err();

        assert!(format!("{:#}", err).contains("lsv_bad.txt"));
        assert!(!root.path().join("master_LSV.csv").exists());
        assert!(!root.path().join("master_CV.csv").exists());
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let root = TempDir::new().unwrap();
        let result = run_batch(&root.path().join("nope"), &PipelineConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let root = TempDir::new().unwrap();
        write_ramp(&root.path().join("b"), "lsv_2.txt", 5);
        write_ramp(&root.path().join("a"), "lsv_1.txt", 7);
        let cv = write_ramp(&root.path().join("a"), "cv_1.txt", 4);

        let mut config = PipelineConfig::default();
        config
            .conditions
            .insert("a".to_string(), ExperimentCondition::new(0.197, 13.0));

        run_batch(root.path(), &config).unwrap();
        let first_master = fs::read(root.path().join("master_LSV.csv")).unwrap();
        let first_cv = fs::read(output_path_for(&cv)).unwrap();

        run_batch(root.path(), &config).unwrap();
        assert_eq!(fs::read(root.path().join("master_LSV.csv")).unwrap(), first_master);
        assert_eq!(fs::read(output_path_for(&cv)).unwrap(), first_cv);
    }

    #[test]
    fn test_progress_reports_each_folder() {
        let root = TempDir::new().unwrap();
        write_ramp(&root.path().join("a"), "lsv_1.txt", 2);
        write_ramp(&root.path().join("b"), "lsv_2.txt", 2);

        let mut seen = Vec::new();
        run_batch_with_progress(root.path(), &PipelineConfig::default(), |idx, total, folder| {
            seen.push((idx, total, folder.name.clone()));
        })
        .unwrap();

        assert_eq!(seen, vec![(0, 2, "a".to_string()), (1, 2, "b".to_string())]);
    }
}
