//! Stage parameter construction

use contracts::{Parameters, PipelineConfig, Stage};
use serde_json::{json, Value};

use crate::resolver::ArtifactResolver;

/// Stand-in for the hand-off path when planning without running
pub const HANDOFF_PLACEHOLDER: &str = "<materialized at run time>";

/// Build the parameter mapping for one stage.
///
/// `handoff` is the materialized hyper-parameter file for stages that need
/// one; when absent, [`HANDOFF_PLACEHOLDER`] is used instead.
pub fn build(
    stage: Stage,
    config: &PipelineConfig,
    resolver: &ArtifactResolver,
    handoff: Option<&str>,
) -> Parameters {
    let def = stage.definition();
    let mut params = Parameters::new();

    // 输入工件统一解析
    for binding in def.inputs {
        params.insert(
            binding.param.to_string(),
            Value::String(resolver.resolve(binding).to_string()),
        );
    }

    let etl = &config.etl;
    let modeling = &config.modeling;
    let output = def.primary_output();

    let mut set = |key: &str, value: Value| {
        params.insert(key.to_string(), value);
    };

    match stage {
        Stage::Download => {
            set("sample", json!(etl.sample));
            if let Some(out) = output {
                set("artifact_name", json!(out.name));
                set("artifact_type", json!(out.artifact_type));
                set("artifact_description", json!(out.description));
            }
        }
        Stage::BasicCleaning => {
            if let Some(out) = output {
                set("output_artifact", json!(out.name));
                set("output_type", json!(out.artifact_type));
                set("output_description", json!(out.description));
            }
            set("min_price", Value::Number(etl.min_price.clone()));
            set("max_price", Value::Number(etl.max_price.clone()));
        }
        Stage::DataCheck => {
            set("kl_threshold", json!(config.data_check.kl_threshold));
            set("min_price", Value::Number(etl.min_price.clone()));
            set("max_price", Value::Number(etl.max_price.clone()));
        }
        Stage::DataSplit => {
            set("test_size", json!(modeling.test_size));
            set("random_seed", json!(modeling.random_seed));
            set("stratify_by", json!(modeling.stratify_by));
        }
        Stage::TrainRandomForest => {
            set("val_size", json!(modeling.val_size));
            set("random_seed", json!(modeling.random_seed));
            set("stratify_by", json!(modeling.stratify_by));
            set("rf_config", json!(handoff.unwrap_or(HANDOFF_PLACEHOLDER)));
            set("max_tfidf_features", json!(modeling.max_tfidf_features));
            if let Some(out) = output {
                set("output_artifact", json!(out.name));
            }
        }
        Stage::TestRegressionModel => {}
    }

    params
}
