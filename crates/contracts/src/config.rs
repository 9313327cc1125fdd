//! PipelineConfig - Config Loader output
//!
//! Flat configuration tree: project identity, step selection and one
//! parameter sub-tree per stage family. Immutable once loaded.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use validator::Validate;

/// Literal directive selecting the default stages
pub const ALL_STEPS: &str = "all";

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PipelineConfig {
    #[validate(nested)]
    pub main: MainConfig,

    #[validate(nested)]
    pub etl: EtlConfig,

    #[validate(nested)]
    pub data_check: DataCheckConfig,

    #[validate(nested)]
    pub modeling: ModelingConfig,
}

/// `main.*`: identity and step selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct MainConfig {
    #[validate(length(min = 1))]
    pub project_name: String,

    /// Run-group identity shared by every stage of one invocation
    #[validate(length(min = 1))]
    pub experiment_name: String,

    /// `"all"` or a comma-delimited list of stage names
    #[validate(length(min = 1))]
    pub steps: String,

    /// Base location of externally maintained stage implementations
    #[validate(length(min = 1))]
    pub components_repository: String,

    /// Namespace for artifact references (defaults to `project_name`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1))]
    pub artifact_namespace: Option<String>,

    /// Environment manager directive passed to the execution backend
    #[serde(default = "default_env_manager")]
    #[validate(length(min = 1))]
    pub env_manager: String,
}

fn default_env_manager() -> String {
    "conda".to_string()
}

impl MainConfig {
    /// Namespace used when composing artifact references
    pub fn namespace(&self) -> &str {
        self.artifact_namespace
            .as_deref()
            .unwrap_or(&self.project_name)
    }
}

/// `etl.*`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct EtlConfig {
    /// Sample file fetched by the download stage
    #[validate(length(min = 1))]
    pub sample: String,

    /// Price bounds keep the number as written; `10` is forwarded as `10`
    pub min_price: Number,

    pub max_price: Number,
}

impl EtlConfig {
    /// `(min_price, max_price)` as floats
    pub fn price_bounds(&self) -> (f64, f64) {
        let as_f64 = |n: &Number| n.as_f64().unwrap_or(f64::NAN);
        (as_f64(&self.min_price), as_f64(&self.max_price))
    }
}

/// `data_check.*`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct DataCheckConfig {
    #[validate(range(exclusive_min = 0.0))]
    pub kl_threshold: f64,
}

/// `modeling.*`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ModelingConfig {
    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub test_size: f64,

    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub val_size: f64,

    pub random_seed: i64,

    /// Column used for stratified splitting (`"none"` disables it)
    pub stratify_by: String,

    #[validate(range(min = 1))]
    pub max_tfidf_features: u32,

    /// Hyper-parameters handed to the training stage verbatim
    pub random_forest: Map<String, Value>,
}
