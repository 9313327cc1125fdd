//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON/YAML configuration files
//! - Apply command-line `key=value` overrides
//! - Validate configuration legality
//! - Generate `PipelineConfig`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config =
//!     ConfigLoader::load_with_overrides(Path::new("config.yaml"), &["main.steps=download"])
//!         .unwrap();
//! println!("Project: {}", config.main.project_name);
//! ```

mod overrides;
mod parser;
mod validator;

pub use contracts::PipelineConfig;
pub use overrides::Override;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json / .yaml).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<PipelineConfig, ContractError> {
        Self::load_with_overrides::<&str>(path, &[])
    }

    /// Load configuration from file path, then apply `key=value` overrides
    ///
    /// # Errors
    /// Same as [`ConfigLoader::load_from_path`], plus malformed or dangling overrides.
    pub fn load_with_overrides<S: AsRef<str>>(
        path: &Path,
        overrides: &[S],
    ) -> Result<PipelineConfig, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str_with_overrides(&content, format, overrides)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<PipelineConfig, ContractError> {
        Self::load_from_str_with_overrides::<&str>(content, format, &[])
    }

    /// Load configuration from string with overrides
    pub fn load_from_str_with_overrides<S: AsRef<str>>(
        content: &str,
        format: ConfigFormat,
        overrides: &[S],
    ) -> Result<PipelineConfig, ContractError> {
        let mut tree = parser::parse_tree(content, format)?;
        overrides::apply_all(&mut tree, overrides)?;
        let config = parser::into_config(tree)?;
        validator::validate(&config)?;
        Ok(config)
    }

    /// Serialize PipelineConfig to TOML string
    pub fn to_toml(config: &PipelineConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize PipelineConfig to JSON string
    pub fn to_json(config: &PipelineConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        std::fs::read_to_string(path).map_err(|e| ContractError::ConfigParse {
            message: format!("cannot read {}: {e}", path.display()),
            source: Some(Box::new(e)),
        })
    }
}
