//! Command-line interface for the voltammetry pipeline.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::ExperimentCondition;
use crate::core::Category;
use crate::PipelineConfig;

#[derive(Parser)]
#[command(name = "voltammetry-pipeline")]
#[command(about = "Convert LSV/CV instrument exports into referenced CSV tables", version)]
pub struct Cli {
    /// Path to YAML config file with per-folder conditions
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every LSV/CV export under a root directory
    Run {
        /// Root directory; each subfolder is one experimental condition
        root: PathBuf,
        /// Write a comparison plot per folder and category
        #[arg(long)]
        plot: bool,
        /// Reference offset (V) for folders missing from the config
        #[arg(long, allow_hyphen_values = true)]
        e_red: Option<f64>,
        /// pH for folders missing from the config
        #[arg(long)]
        ph: Option<f64>,
    },

    /// Convert a single export
    Convert {
        /// Raw instrument text file
        input: PathBuf,
        /// Output CSV (defaults to <stem>_output.csv next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Reference offset in volts
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        e_red: f64,
        /// Electrolyte pH
        #[arg(long, default_value_t = 0.0)]
        ph: f64,
    },

    /// Write a config listing every folder under a root with zero conditions
    InitConfig {
        /// Root directory to scan
        root: PathBuf,
        /// Output YAML file
        #[arg(short, long, default_value = "conditions.yaml")]
        output: PathBuf,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<62} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 39 {
            let head: String = value.chars().take(36).collect();
            format!("{}...", head)
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<39} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

fn fail(message: &str, err: &anyhow::Error) -> ! {
    error!("{}: {:#}", message, err);
    std::process::exit(1);
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    // Conditions are per folder, so a config that fails to load is fatal
    let config = match &cli.config {
        Some(path) => match PipelineConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                error!("Failed to load config from {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => PipelineConfig::default(),
    };

    match cli.command {
        Commands::Run { root, plot, e_red, ph } => {
            cmd_run(&root, plot, e_red, ph, config);
        }
        Commands::Convert { input, output, e_red, ph } => {
            cmd_convert(&input, output, ExperimentCondition::new(e_red, ph));
        }
        Commands::InitConfig { root, output } => {
            cmd_init_config(&root, &output, config);
        }
    }
}

/// Apply command-line overrides on top of the loaded config.
fn apply_overrides(
    mut config: PipelineConfig,
    plot: bool,
    e_red: Option<f64>,
    ph: Option<f64>,
) -> PipelineConfig {
    if plot {
        config.plot.enabled = true;
    }
    if let Some(e_red) = e_red {
        config.default_condition.e_red = e_red;
    }
    if let Some(ph) = ph {
        config.default_condition.ph = ph;
    }
    config
}

fn cmd_run(root: &Path, plot: bool, e_red: Option<f64>, ph: Option<f64>, config: PipelineConfig) {
    use crate::processors::batch;

    let start = Instant::now();
    let config = apply_overrides(config, plot, e_red, ph);

    println!("Converting voltammetry exports...");
    println!("Root directory: {}", root.display());
    println!("Plots: {}", if config.plot.enabled { "yes" } else { "no" });

    let spinner = create_spinner("Scanning experiment folders...");

    let result = batch::run_batch_with_progress(root, &config, |idx, total, folder| {
        spinner.set_message(format!("[{}/{}] {}", idx + 1, total, folder.name));
    });

    spinner.finish_and_clear();

    match result {
        Ok(summary) => {
            let masters: Vec<String> = summary
                .master_files
                .iter()
                .filter_map(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .collect();

            print_summary(
                "Batch Conversion Complete",
                &[
                    ("Root directory", root.display().to_string()),
                    ("Folders", summary.folders.len().to_string()),
                    ("LSV files", summary.files_processed(Category::Lsv).to_string()),
                    ("CV files", summary.files_processed(Category::Cv).to_string()),
                    ("Plots written", summary.plots_written().to_string()),
                    ("Master tables", masters.join(", ")),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
        }
        Err(e) => fail("Batch conversion failed", &e),
    }
}

fn cmd_convert(input: &Path, output: Option<PathBuf>, condition: ExperimentCondition) {
    use crate::core::{transforms, writers};

    let start = Instant::now();
    let output_path = output.unwrap_or_else(|| writers::output_path_for(input));

    println!("Converting single file...");
    println!("Input: {}", input.display());
    println!("Output: {}", output_path.display());

    let result = transforms::correct_file(input, &condition)
        .map_err(anyhow::Error::from)
        .and_then(|series| {
            writers::write_series_csv(&output_path, &series)?;
            Ok(series.len())
        });

    match result {
        Ok(rows) => {
            print_summary(
                "Conversion Complete",
                &[
                    ("Input file", input.display().to_string()),
                    ("Output file", output_path.display().to_string()),
                    ("Rows converted", rows.to_string()),
                    ("E_red (V)", condition.e_red.to_string()),
                    ("pH", condition.ph.to_string()),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
        }
        Err(e) => fail("Conversion failed", &e),
    }
}

fn cmd_init_config(root: &Path, output: &Path, config: PipelineConfig) {
    use crate::processors::discovery;

    let folders = match discovery::find_condition_folders(root) {
        Ok(folders) => folders,
        Err(e) => fail("Failed to scan root", &anyhow::Error::from(e)),
    };

    let mut scaffold = PipelineConfig::scaffold(folders.iter().map(|f| f.name.clone()));
    scaffold.plot = config.plot;
    scaffold.default_condition = config.default_condition;

    // Keep conditions that are already configured
    for (name, condition) in config.conditions {
        if let Some(entry) = scaffold.conditions.get_mut(&name) {
            *entry = condition;
        }
    }

    if let Err(e) = scaffold.to_yaml(output) {
        fail("Failed to write config", &anyhow::Error::from(e));
    }

    print_summary(
        "Config Written",
        &[
            ("Root directory", root.display().to_string()),
            ("Folders", folders.len().to_string()),
            ("Config file", output.display().to_string()),
        ],
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_command() {
        let cli = Cli::try_parse_from([
            "voltammetry-pipeline",
            "-vv",
            "run",
            "/data/root",
            "--plot",
            "--e-red",
            "-0.2",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Run { root, plot, e_red, ph } => {
                assert_eq!(root, PathBuf::from("/data/root"));
                assert!(plot);
                assert_eq!(e_red, Some(-0.2));
                assert_eq!(ph, None);
            }
            _ => panic!("Expected run command"),
        }
    }

    #[test]
    fn test_parse_convert_defaults() {
        let cli = Cli::try_parse_from(["voltammetry-pipeline", "convert", "lsv_1.txt"]).unwrap();

        match cli.command {
            Commands::Convert { input, output, e_red, ph } => {
                assert_eq!(input, PathBuf::from("lsv_1.txt"));
                assert!(output.is_none());
                assert_eq!(e_red, 0.0);
                assert_eq!(ph, 0.0);
            }
            _ => panic!("Expected convert command"),
        }
    }

    #[test]
    fn test_apply_overrides() {
        let config = apply_overrides(PipelineConfig::default(), true, Some(0.197), None);

        assert!(config.plot.enabled);
        assert_eq!(config.default_condition, ExperimentCondition::new(0.197, 0.0));

        let untouched = apply_overrides(PipelineConfig::default(), false, None, None);
        assert!(!untouched.plot.enabled);
    }
}
