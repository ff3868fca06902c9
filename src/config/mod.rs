//! Configuration types for the voltammetry pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading or saving configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Reference correction applied to every file of one experiment folder.
///
/// Both values default to `0.0`, which leaves the measured potential as is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperimentCondition {
    /// Reference electrode offset in volts.
    #[serde(default)]
    pub e_red: f64,

    /// Electrolyte pH.
    #[serde(default)]
    pub ph: f64,
}

impl ExperimentCondition {
    pub fn new(e_red: f64, ph: f64) -> Self {
        Self { e_red, ph }
    }
}

/// Configuration for the per-folder comparison plots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotConfig {
    /// Write plots next to the per-file outputs
    #[serde(default)]
    pub enabled: bool,

    /// Image width in pixels
    #[serde(default = "default_plot_width")]
    pub width: u32,

    /// Image height in pixels
    #[serde(default = "default_plot_height")]
    pub height: u32,
}

fn default_plot_width() -> u32 {
    1800
}

fn default_plot_height() -> u32 {
    1200
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            width: default_plot_width(),
            height: default_plot_height(),
        }
    }
}

/// Main pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub plot: PlotConfig,

    /// Condition used for folders without an entry in `conditions`.
    #[serde(default)]
    pub default_condition: ExperimentCondition,

    /// Conditions keyed by folder name (relative to the batch root).
    #[serde(default)]
    pub conditions: BTreeMap<String, ExperimentCondition>,
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Build a config listing every folder with the default (zero) condition.
    pub fn scaffold<I, S>(folders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            conditions: folders
                .into_iter()
                .map(|name| (name.into(), ExperimentCondition::default()))
                .collect(),
            ..Self::default()
        }
    }

    /// Condition for a folder, or `None` when the folder has no explicit entry.
    pub fn explicit_condition(&self, folder: &str) -> Option<ExperimentCondition> {
        self.conditions.get(folder).copied()
    }

    /// Condition for a folder, falling back to `default_condition`.
    pub fn condition_for(&self, folder: &str) -> ExperimentCondition {
        self.explicit_condition(folder)
            .unwrap_or(self.default_condition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_pipeline_config() {
        let config = PipelineConfig::default();
        assert!(!config.plot.enabled);
        assert_eq!(config.plot.width, 1800);
        assert_eq!(config.default_condition, ExperimentCondition::new(0.0, 0.0));
        assert!(config.conditions.is_empty());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "conditions:\n  NiFe:\n    e_red: 0.197\n  Pt:\n    ph: 14\n";
        let config: PipelineConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.plot.height, 1200);
        assert_eq!(config.condition_for("NiFe"), ExperimentCondition::new(0.197, 0.0));
        assert_eq!(config.condition_for("Pt"), ExperimentCondition::new(0.0, 14.0));
    }

    #[test]
    fn test_condition_falls_back_to_default() {
        let mut config = PipelineConfig::default();
        config.default_condition = ExperimentCondition::new(0.2, 7.0);

        assert_eq!(config.explicit_condition("missing"), None);
        assert_eq!(config.condition_for("missing"), ExperimentCondition::new(0.2, 7.0));
    }

    #[test]
    fn test_scaffold_and_yaml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conditions.yaml");

        let config = PipelineConfig::scaffold(["run_a", "run_b"]);
        config.to_yaml(&path).unwrap();

        let loaded = PipelineConfig::from_yaml(&path).unwrap();
        let names: Vec<&str> = loaded.conditions.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["run_a", "run_b"]);
        assert_eq!(loaded.condition_for("run_a"), ExperimentCondition::default());
    }

    #[test]
    fn test_from_yaml_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = PipelineConfig::from_yaml(dir.path().join("nope.yaml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
