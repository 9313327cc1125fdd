//! Error types for CLI operations.

use contracts::{ContractError, Stage};
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration could not be loaded, validated or turned into a stage plan
    #[error("configuration error: {0}")]
    Configuration(#[source] ContractError),

    /// A stage failed and the pipeline stopped
    #[error("pipeline failed at stage '{stage}'")]
    StageFailed {
        stage: Stage,
        #[source]
        source: ContractError,
    },

    /// Interrupted by Ctrl+C or SIGTERM
    #[error("interrupted")]
    Interrupted,

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Process exit code
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => 2,
            Self::StageFailed { .. } => 1,
            Self::Interrupted => 130,
            Self::Other(_) => 1,
        }
    }
}

impl From<ContractError> for CliError {
    fn from(err: ContractError) -> Self {
        match err.failed_stage() {
            Some(stage) => Self::StageFailed { stage, source: err },
            None if err.is_configuration() => Self::Configuration(err),
            None => Self::Other(anyhow::Error::new(err)),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
