//! StageRunner trait - execution backend interface
//!
//! Abstracts how a stage is executed (external process, container, in-memory
//! mock) so the orchestrator never depends on a concrete backend.

use crate::{ContractError, Parameters, RunContext, RunId, Stage};

/// Executes one named stage as an isolated unit of work.
///
/// Calls are awaited one at a time by the orchestrator; an invocation only
/// returns once the stage has fully completed or failed.
#[trait_variant::make(StageRunner: Send)]
pub trait LocalStageRunner {
    /// Backend name (used for logging)
    fn name(&self) -> &str;

    /// Run `stage` with `params`.
    ///
    /// Every key of the stage's parameter schema must be present in `params`;
    /// extra keys are forwarded without validation.
    ///
    /// # Errors
    /// `ContractError::StageExecution` carrying the stage and its exit signal
    /// when the run fails or cannot be set up. Never retried.
    async fn run(
        &self,
        ctx: &RunContext,
        stage: Stage,
        params: &Parameters,
    ) -> Result<RunId, ContractError>;
}
