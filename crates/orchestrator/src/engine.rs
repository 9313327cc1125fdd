//! Pipeline state machine.

use std::fmt;
use std::time::{Duration, Instant};

use contracts::{
    ContractError, ExitSignal, InvocationOutcome, Parameters, PipelineConfig, RunContext, RunId,
    Stage, StageInvocation, StageRunner,
};
use serde::Serialize;
use tempfile::TempDir;
use tracing::{error, info, instrument, warn};

use crate::handoff::{HandoffCodec, HandoffFile, JsonCodec};
use crate::params;
use crate::resolver::ArtifactResolver;
use crate::selector;

const HANDOFF_STEM: &str = "rf_config";

/// Orchestrator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running(Stage),
    Completed,
    /// Terminal; records the stage that failed
    Failed(Stage),
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_))
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Running(stage) => write!(f, "running({stage})"),
            Self::Completed => f.write_str("completed"),
            Self::Failed(stage) => write!(f, "failed({stage})"),
        }
    }
}

/// One stage as it would be dispatched
#[derive(Debug, Clone, Serialize)]
pub struct StagePlan {
    pub stage: Stage,
    pub location: String,
    pub entry_point: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<&'static str>,
    pub parameters: Parameters,
}

/// Outcome of one `run()` call
#[derive(Debug)]
pub struct PipelineReport {
    /// Terminal state
    pub state: PipelineState,
    /// Every state entered, starting with `Idle`
    pub transitions: Vec<PipelineState>,
    pub invocations: Vec<StageInvocation>,
    pub duration: Duration,
    /// The error that stopped the pipeline, when `state` is `Failed`
    pub error: Option<ContractError>,
}

impl PipelineReport {
    pub fn is_success(&self) -> bool {
        self.state == PipelineState::Completed
    }

    pub fn failed_stage(&self) -> Option<Stage> {
        match self.state {
            PipelineState::Failed(stage) => Some(stage),
            _ => None,
        }
    }

    pub fn run_ids(&self) -> Vec<&RunId> {
        self.invocations.iter().filter_map(|inv| inv.run_id()).collect()
    }

    /// Convert a failed report into its error
    pub fn into_result(self) -> Result<Self, ContractError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

/// Records state changes in order
#[derive(Debug)]
struct StateMachine {
    current: PipelineState,
    history: Vec<PipelineState>,
}

impl StateMachine {
    fn new() -> Self {
        Self {
            current: PipelineState::Idle,
            history: vec![PipelineState::Idle],
        }
    }

    fn enter(&mut self, next: PipelineState) {
        debug_assert!(!self.current.is_terminal(), "left terminal state {}", self.current);
        self.current = next;
        self.history.push(next);
    }
}

/// Sequential pipeline driver
///
/// Construction validates the step selection, so a built orchestrator can
/// only fail at stage execution time.
pub struct Orchestrator<R> {
    config: PipelineConfig,
    ctx: RunContext,
    runner: R,
    stages: Vec<Stage>,
    resolver: ArtifactResolver,
    codec: Box<dyn HandoffCodec>,
}

impl<R: StageRunner> Orchestrator<R> {
    /// # Errors
    /// `UnknownStage` when `main.steps` names a stage that does not exist.
    pub fn new(config: PipelineConfig, ctx: RunContext, runner: R) -> Result<Self, ContractError> {
        let stages = selector::select(&config.main.steps)?;
        let resolver = ArtifactResolver::new(config.main.namespace());

        info!(
            steps = %config.main.steps,
            active = stages.len(),
            runner = runner.name(),
            "Orchestrator ready"
        );

        Ok(Self {
            config,
            ctx,
            runner,
            stages,
            resolver,
            codec: Box::new(JsonCodec),
        })
    }

    /// Replace the hand-off serialization
    pub fn with_codec(mut self, codec: impl HandoffCodec + 'static) -> Self {
        self.codec = Box::new(codec);
        self
    }

    pub fn active_stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Ordered dispatch plan, without running anything
    pub fn plan(&self) -> Vec<StagePlan> {
        self.stages
            .iter()
            .map(|&stage| {
                let def = stage.definition();
                StagePlan {
                    stage,
                    location: self.ctx.stage_location(stage),
                    entry_point: def.entry_point,
                    version: def.version,
                    parameters: params::build(stage, &self.config, &self.resolver, None),
                }
            })
            .collect()
    }

    /// Run every active stage in order, stopping at the first failure.
    ///
    /// Stage failures do not surface as `Err`; they end the run in
    /// [`PipelineState::Failed`] and are carried by the report.
    #[instrument(
        name = "pipeline_run",
        skip(self),
        fields(project = %self.ctx.project_name(), run_group = %self.ctx.run_group())
    )]
    pub async fn run(&self) -> PipelineReport {
        let started = Instant::now();
        let mut machine = StateMachine::new();
        let mut invocations = Vec::with_capacity(self.stages.len());
        let mut scratch: Option<TempDir> = None;
        let mut failure = None;

        for (idx, &stage) in self.stages.iter().enumerate() {
            machine.enter(PipelineState::Running(stage));
            observability::record_stage_started(stage);
            info!(
                stage = %stage,
                step = idx + 1,
                total = self.stages.len(),
                "Starting stage"
            );

            let stage_started = Instant::now();
            let (parameters, result) = self.dispatch(stage, &mut scratch).await;
            let elapsed = stage_started.elapsed();
            observability::record_stage_finished(stage, result.is_ok(), elapsed);

            match result {
                Ok(run_id) => {
                    info!(
                        stage = %stage,
                        run_id = %run_id,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Stage completed"
                    );
                    invocations.push(StageInvocation {
                        stage,
                        parameters,
                        outcome: InvocationOutcome::Succeeded(run_id),
                        elapsed,
                    });
                }
                Err(err) => {
                    error!(
                        stage = %stage,
                        elapsed_ms = elapsed.as_millis() as u64,
                        error = %err,
                        "Stage failed, aborting pipeline"
                    );
                    invocations.push(StageInvocation {
                        stage,
                        parameters,
                        outcome: InvocationOutcome::Failed(exit_of(&err)),
                        elapsed,
                    });
                    machine.enter(PipelineState::Failed(stage));
                    failure = Some(err);
                    break;
                }
            }
        }

        if failure.is_none() {
            machine.enter(PipelineState::Completed);
        }

        let duration = started.elapsed();
        let status = if failure.is_none() { "completed" } else { "failed" };
        observability::record_pipeline_finished(status, invocations.len(), duration);
        info!(
            state = %machine.current,
            stages_run = invocations.len(),
            duration_ms = duration.as_millis() as u64,
            "Pipeline finished"
        );

        PipelineReport {
            state: machine.current,
            transitions: machine.history,
            invocations,
            duration,
            error: failure,
        }
    }

    async fn dispatch(
        &self,
        stage: Stage,
        scratch: &mut Option<TempDir>,
    ) -> (Parameters, Result<RunId, ContractError>) {
        if !stage.definition().needs_handoff {
            let parameters = params::build(stage, &self.config, &self.resolver, None);
            let result = self.runner.run(&self.ctx, stage, &parameters).await;
            return (parameters, result);
        }

        let handoff = match self.materialize_handoff(scratch) {
            Ok(file) => file,
            Err(e) => {
                let parameters = params::build(stage, &self.config, &self.resolver, None);
                let err = ContractError::stage_execution(
                    stage,
                    ExitSignal::Setup(format!("cannot write hyper-parameter file: {e}")),
                );
                return (parameters, Err(err));
            }
        };

        let path = handoff.path().display().to_string();
        let parameters = params::build(stage, &self.config, &self.resolver, Some(&path));
        let result = self.runner.run(&self.ctx, stage, &parameters).await;
        // 阶段返回后立即删除
        drop(handoff);
        (parameters, result)
    }

    fn materialize_handoff(&self, scratch: &mut Option<TempDir>) -> std::io::Result<HandoffFile> {
        if scratch.is_none() {
            *scratch = Some(tempfile::Builder::new().prefix("ml-pipeline-").tempdir()?);
        }
        let dir = scratch
            .as_ref()
            .map(TempDir::path)
            .ok_or_else(|| std::io::Error::other("scratch directory unavailable"))?;
        HandoffFile::materialize(
            dir,
            HANDOFF_STEM,
            &self.config.modeling.random_forest,
            self.codec.as_ref(),
        )
    }
}

fn exit_of(err: &ContractError) -> ExitSignal {
    match err {
        ContractError::StageExecution { exit, .. } => exit.clone(),
        other => {
            warn!(error = %other, "Runner returned a non-execution error");
            ExitSignal::Setup(other.to_string())
        }
    }
}
