//! CLI argument definitions using clap.

use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

/// ml-pipeline - staged training pipeline orchestrator
#[derive(Parser, Debug)]
#[command(
    name = "ml-pipeline",
    author,
    version,
    about = "Run the staged ML training pipeline",
    long_about = "Runs the configured pipeline stages in order through an external execution\n\
                  backend, stopping at the first failure. main.steps=all runs download,\n\
                  basic_cleaning, data_check, data_split and train_random_forest;\n\
                  test_regression_model runs only when listed explicitly.\n\n\
                  Trailing KEY=VALUE arguments override configuration entries; use\n\
                  +KEY=VALUE to add a key that does not exist yet."
)]
pub struct Cli {
    /// Path to configuration file (YAML, TOML or JSON)
    #[arg(short, long, default_value = "config.yaml", env = "ML_PIPELINE_CONFIG")]
    pub config: PathBuf,

    /// Base directory of local stage sources (defaults to the config file's directory)
    #[arg(long, env = "ML_PIPELINE_ROOT_DIR")]
    pub root_dir: Option<PathBuf>,

    /// Execution backend program
    #[arg(long, default_value = "mlflow", env = "ML_PIPELINE_RUNNER")]
    pub runner: String,

    /// Print the resolved stage plan and exit without running anything
    #[arg(long)]
    pub dry_run: bool,

    /// Output the dry-run plan as JSON
    #[arg(long, requires = "dry_run")]
    pub json: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "ML_PIPELINE_METRICS_PORT")]
    pub metrics_port: u16,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, env = "ML_PIPELINE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty", env = "ML_PIPELINE_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Configuration overrides (`section.key=value`, `+section.key=value`)
    #[arg(value_name = "OVERRIDES")]
    pub overrides: Vec<String>,
}

impl Cli {
    /// Directory local stage sources are resolved against
    pub fn root_dir(&self) -> PathBuf {
        if let Some(dir) = &self.root_dir {
            return dir.clone();
        }
        match self.config.parent() {
            Some(parent) if parent != Path::new("") => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    pub fn metrics_port(&self) -> Option<u16> {
        (self.metrics_port != 0).then_some(self.metrics_port)
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
