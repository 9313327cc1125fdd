//! Layered error definitions
//!
//! Categorized by source: config / stage execution / general

use std::fmt;

use thiserror::Error;

use crate::Stage;

/// How an external stage execution ended when it did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitSignal {
    /// Process exited with a non-zero status code
    Code(i32),
    /// Process was terminated by a signal (unix)
    Signal(i32),
    /// Process never started, or the invocation was rejected before launch
    Setup(String),
}

impl fmt::Display for ExitSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "exit code {code}"),
            Self::Signal(signal) => write!(f, "terminated by signal {signal}"),
            Self::Setup(message) => write!(f, "setup failure: {message}"),
        }
    }
}

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// Step-selection directive names a stage that does not exist
    #[error("unknown stage '{token}' in step selection (known stages: {known})")]
    UnknownStage { token: String, known: String },

    /// Malformed `namespace/name:qualifier` string
    #[error("invalid artifact reference '{reference}': {message}")]
    InvalidArtifactReference { reference: String, message: String },

    // ===== Execution Errors =====
    /// A stage run failed; fatal to the pipeline invocation
    #[error("stage '{stage}' failed: {exit}")]
    StageExecution { stage: Stage, exit: ExitSignal },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create unknown stage error listing the canonical stage names
    pub fn unknown_stage(token: impl Into<String>) -> Self {
        let known = Stage::CANONICAL
            .iter()
            .map(|stage| stage.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Self::UnknownStage {
            token: token.into(),
            known,
        }
    }

    /// Create artifact reference parse error
    pub fn invalid_reference(reference: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArtifactReference {
            reference: reference.into(),
            message: message.into(),
        }
    }

    /// Create stage execution error
    pub fn stage_execution(stage: Stage, exit: ExitSignal) -> Self {
        Self::StageExecution { stage, exit }
    }

    /// Whether this error belongs to the configuration category
    /// (detected before any stage runs).
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ConfigParse { .. }
                | Self::ConfigValidation { .. }
                | Self::UnknownStage { .. }
                | Self::InvalidArtifactReference { .. }
        )
    }

    /// Whether this error is a stage execution failure
    pub fn is_execution(&self) -> bool {
        matches!(self, Self::StageExecution { .. })
    }

    /// Stage that failed, for execution errors
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            Self::StageExecution { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
