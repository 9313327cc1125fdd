//! Stage catalogue
//!
//! The pipeline is a fixed, linearly-ordered list of stages. Each stage is
//! statically described by a [`StageDefinition`]: where its code lives, which
//! artifacts it consumes, what it produces and which parameters it requires.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{ContractError, ExitSignal, Parameters, VersionQualifier};

/// Identity of a pipeline stage.
///
/// Variants are declared in canonical execution order; `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Download,
    BasicCleaning,
    DataCheck,
    DataSplit,
    TrainRandomForest,
    TestRegressionModel,
}

impl Stage {
    /// Every stage, in canonical execution order
    pub const CANONICAL: [Stage; 6] = [
        Stage::Download,
        Stage::BasicCleaning,
        Stage::DataCheck,
        Stage::DataSplit,
        Stage::TrainRandomForest,
        Stage::TestRegressionModel,
    ];

    /// Stages selected by `"all"`, in canonical order.
    ///
    /// `test_regression_model` needs a model promoted to `prod`, so it only
    /// runs when named explicitly.
    pub const DEFAULT: [Stage; 5] = [
        Stage::Download,
        Stage::BasicCleaning,
        Stage::DataCheck,
        Stage::DataSplit,
        Stage::TrainRandomForest,
    ];

    /// Token used in step-selection directives and logs
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Download => "download",
            Self::BasicCleaning => "basic_cleaning",
            Self::DataCheck => "data_check",
            Self::DataSplit => "data_split",
            Self::TrainRandomForest => "train_random_forest",
            Self::TestRegressionModel => "test_regression_model",
        }
    }

    /// Zero-based position in the canonical order
    pub fn position(self) -> usize {
        self as usize
    }

    /// Static description of this stage
    pub fn definition(self) -> &'static StageDefinition {
        match self {
            Self::Download => &DOWNLOAD,
            Self::BasicCleaning => &BASIC_CLEANING,
            Self::DataCheck => &DATA_CHECK,
            Self::DataSplit => &DATA_SPLIT,
            Self::TrainRandomForest => &TRAIN_RANDOM_FOREST,
            Self::TestRegressionModel => &TEST_REGRESSION_MODEL,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::CANONICAL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| ContractError::unknown_stage(s))
    }
}

impl Serialize for Stage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Stage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Where a stage's code lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageSource {
    /// Sub-directory of `main.components_repository`
    Component(&'static str),
    /// Path relative to the project root directory
    Local(&'static str),
}

/// Semantic type expected for a parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Str,
    Int,
    Float,
    Path,
    Artifact,
}

/// One entry of a stage's parameter schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
}

/// An artifact a stage consumes, bound to one of its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputBinding {
    /// Parameter receiving the resolved reference
    pub param: &'static str,
    /// Artifact name as declared by the producing stage
    pub artifact: &'static str,
    pub qualifier: VersionQualifier,
}

/// An artifact a stage registers in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSpec {
    pub name: &'static str,
    pub artifact_type: &'static str,
    pub description: &'static str,
}

/// Static description of one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageDefinition {
    pub stage: Stage,
    pub source: StageSource,
    pub entry_point: &'static str,
    /// Source revision to check out, for component stages pinned to a branch
    pub version: Option<&'static str>,
    pub inputs: &'static [InputBinding],
    pub outputs: &'static [OutputSpec],
    pub parameters: &'static [ParamSpec],
    /// Needs a materialized hyper-parameter document
    pub needs_handoff: bool,
}

impl StageDefinition {
    /// First declared output
    pub fn primary_output(&self) -> Option<&'static OutputSpec> {
        self.outputs.first()
    }

    /// Check that every parameter of the schema is present.
    ///
    /// Extra keys are allowed and forwarded untouched.
    pub fn missing_parameters(&self, params: &Parameters) -> Vec<&'static str> {
        self.parameters
            .iter()
            .filter(|spec| !params.contains_key(spec.name))
            .map(|spec| spec.name)
            .collect()
    }

    /// Reject a mapping that lacks schema parameters.
    ///
    /// # Errors
    /// `StageExecution` with a setup exit signal naming the missing keys.
    pub fn check_parameters(&self, params: &Parameters) -> Result<(), ContractError> {
        let missing = self.missing_parameters(params);
        if missing.is_empty() {
            return Ok(());
        }
        Err(ContractError::stage_execution(
            self.stage,
            ExitSignal::Setup(format!("missing parameters: {}", missing.join(", "))),
        ))
    }
}

const ENTRY_MAIN: &str = "main";

static DOWNLOAD: StageDefinition = StageDefinition {
    stage: Stage::Download,
    source: StageSource::Component("get_data"),
    entry_point: ENTRY_MAIN,
    version: Some("main"),
    inputs: &[],
    outputs: &[OutputSpec {
        name: "sample.csv",
        artifact_type: "raw_data",
        description: "Raw file as downloaded",
    }],
    parameters: &[
        ParamSpec { name: "sample", kind: ParamKind::Str },
        ParamSpec { name: "artifact_name", kind: ParamKind::Str },
        ParamSpec { name: "artifact_type", kind: ParamKind::Str },
        ParamSpec { name: "artifact_description", kind: ParamKind::Str },
    ],
    needs_handoff: false,
};

static BASIC_CLEANING: StageDefinition = StageDefinition {
    stage: Stage::BasicCleaning,
    source: StageSource::Local("src/basic_cleaning"),
    entry_point: ENTRY_MAIN,
    version: None,
    inputs: &[InputBinding {
        param: "input_artifact",
        artifact: "sample.csv",
        qualifier: VersionQualifier::Latest,
    }],
    outputs: &[OutputSpec {
        name: "clean_sample.csv",
        artifact_type: "clean_data",
        description: "Cleaned NYC Airbnb data",
    }],
    parameters: &[
        ParamSpec { name: "input_artifact", kind: ParamKind::Artifact },
        ParamSpec { name: "output_artifact", kind: ParamKind::Str },
        ParamSpec { name: "output_type", kind: ParamKind::Str },
        ParamSpec { name: "output_description", kind: ParamKind::Str },
        ParamSpec { name: "min_price", kind: ParamKind::Float },
        ParamSpec { name: "max_price", kind: ParamKind::Float },
    ],
    needs_handoff: false,
};

static DATA_CHECK: StageDefinition = StageDefinition {
    stage: Stage::DataCheck,
    source: StageSource::Local("src/data_check"),
    entry_point: ENTRY_MAIN,
    version: None,
    inputs: &[
        InputBinding {
            param: "csv",
            artifact: "clean_sample.csv",
            qualifier: VersionQualifier::Latest,
        },
        InputBinding {
            param: "ref",
            artifact: "clean_sample.csv",
            qualifier: VersionQualifier::Reference,
        },
    ],
    outputs: &[],
    parameters: &[
        ParamSpec { name: "csv", kind: ParamKind::Artifact },
        ParamSpec { name: "ref", kind: ParamKind::Artifact },
        ParamSpec { name: "kl_threshold", kind: ParamKind::Float },
        ParamSpec { name: "min_price", kind: ParamKind::Float },
        ParamSpec { name: "max_price", kind: ParamKind::Float },
    ],
    needs_handoff: false,
};

static DATA_SPLIT: StageDefinition = StageDefinition {
    stage: Stage::DataSplit,
    source: StageSource::Component("train_val_test_split"),
    entry_point: ENTRY_MAIN,
    version: None,
    inputs: &[InputBinding {
        param: "input",
        artifact: "clean_sample.csv",
        qualifier: VersionQualifier::Latest,
    }],
    outputs: &[
        OutputSpec {
            name: "trainval_data.csv",
            artifact_type: "segregated_data",
            description: "Train and validation split",
        },
        OutputSpec {
            name: "test_data.csv",
            artifact_type: "segregated_data",
            description: "Held-out test split",
        },
    ],
    parameters: &[
        ParamSpec { name: "input", kind: ParamKind::Artifact },
        ParamSpec { name: "test_size", kind: ParamKind::Float },
        ParamSpec { name: "random_seed", kind: ParamKind::Int },
        ParamSpec { name: "stratify_by", kind: ParamKind::Str },
    ],
    needs_handoff: false,
};

static TRAIN_RANDOM_FOREST: StageDefinition = StageDefinition {
    stage: Stage::TrainRandomForest,
    source: StageSource::Local("src/train_random_forest"),
    entry_point: ENTRY_MAIN,
    version: None,
    inputs: &[InputBinding {
        param: "trainval_artifact",
        artifact: "trainval_data.csv",
        qualifier: VersionQualifier::Latest,
    }],
    outputs: &[OutputSpec {
        name: "random_forest_export",
        artifact_type: "model_export",
        description: "Random Forest pipeline export",
    }],
    parameters: &[
        ParamSpec { name: "trainval_artifact", kind: ParamKind::Artifact },
        ParamSpec { name: "val_size", kind: ParamKind::Float },
        ParamSpec { name: "random_seed", kind: ParamKind::Int },
        ParamSpec { name: "stratify_by", kind: ParamKind::Str },
        ParamSpec { name: "rf_config", kind: ParamKind::Path },
        ParamSpec { name: "max_tfidf_features", kind: ParamKind::Int },
        ParamSpec { name: "output_artifact", kind: ParamKind::Str },
    ],
    needs_handoff: true,
};

static TEST_REGRESSION_MODEL: StageDefinition = StageDefinition {
    stage: Stage::TestRegressionModel,
    source: StageSource::Component("test_regression_model"),
    entry_point: ENTRY_MAIN,
    version: None,
    inputs: &[
        InputBinding {
            param: "mlflow_model",
            artifact: "random_forest_export",
            qualifier: VersionQualifier::Prod,
        },
        InputBinding {
            param: "test_dataset",
            artifact: "test_data.csv",
            qualifier: VersionQualifier::Latest,
        },
    ],
    outputs: &[],
    parameters: &[
        ParamSpec { name: "mlflow_model", kind: ParamKind::Artifact },
        ParamSpec { name: "test_dataset", kind: ParamKind::Artifact },
    ],
    needs_handoff: false,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_order_matches_ord() {
        let mut sorted = Stage::CANONICAL;
        sorted.sort();
        assert_eq!(sorted, Stage::CANONICAL);
        for (idx, stage) in Stage::CANONICAL.iter().enumerate() {
            assert_eq!(stage.position(), idx);
        }
    }

    #[test]
    fn test_default_is_canonical_prefix() {
        assert_eq!(Stage::DEFAULT[..], Stage::CANONICAL[..5]);
        assert!(!Stage::DEFAULT.contains(&Stage::TestRegressionModel));
    }

    #[test]
    fn test_parse_tokens() {
        for stage in Stage::CANONICAL {
            assert_eq!(stage.as_str().parse::<Stage>().unwrap(), stage);
        }
        let err = "downlaod".parse::<Stage>().unwrap_err();
        assert!(matches!(err, ContractError::UnknownStage { .. }));
    }

    #[test]
    fn test_definitions_are_self_consistent() {
        for stage in Stage::CANONICAL {
            let def = stage.definition();
            assert_eq!(def.stage, stage);
            for input in def.inputs {
                assert!(
                    def.parameters.iter().any(|p| p.name == input.param),
                    "{stage}: input '{}' missing from schema",
                    input.param
                );
            }
        }
    }

    #[test]
    fn test_inputs_come_from_earlier_outputs() {
        for stage in Stage::CANONICAL {
            for input in stage.definition().inputs {
                let producer = Stage::CANONICAL[..stage.position()]
                    .iter()
                    .find(|s| s.definition().outputs.iter().any(|o| o.name == input.artifact));
                assert!(
                    producer.is_some(),
                    "{stage}: no earlier stage produces '{}'",
                    input.artifact
                );
            }
        }
    }

    #[test]
    fn test_missing_parameters() {
        let def = Stage::Download.definition();
        let mut params = Parameters::new();
        params.insert("sample".into(), "sample1.csv".into());
        params.insert("extra".into(), 1.into());
        let missing = def.missing_parameters(&params);
        assert_eq!(
            missing,
            vec!["artifact_name", "artifact_type", "artifact_description"]
        );

        let err = def.check_parameters(&params).unwrap_err();
        assert!(err.is_execution());
        assert!(err.to_string().contains("artifact_name"), "got: {err}");
    }

    #[test]
    fn test_serde_as_token() {
        let json = serde_json::to_string(&Stage::DataSplit).unwrap();
        assert_eq!(json, "\"data_split\"");
        let parsed: Stage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Stage::DataSplit);
    }
}
