//! External process backend
//!
//! Runs each stage through an `mlflow run` style command line. The child
//! inherits stdout; stderr is forwarded to tracing and scanned for the run
//! identifier marker.

use std::process::{ExitStatus, Stdio};

use contracts::{ContractError, ExitSignal, Parameters, RunContext, RunId, Stage, StageRunner};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use crate::command::StageCommand;

/// Default execution backend program
pub const DEFAULT_PROGRAM: &str = "mlflow";

const RUN_ID_MARKER: &str = "Run (ID '";

/// Stage runner spawning one external process per stage
#[derive(Debug, Clone)]
pub struct ProcessStageRunner {
    program: String,
}

impl ProcessStageRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for ProcessStageRunner {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl StageRunner for ProcessStageRunner {
    fn name(&self) -> &str {
        &self.program
    }

    #[instrument(name = "process_stage_run", skip(self, ctx, params), fields(stage = %stage))]
    async fn run(
        &self,
        ctx: &RunContext,
        stage: Stage,
        params: &Parameters,
    ) -> Result<RunId, ContractError> {
        stage.definition().check_parameters(params)?;

        let command = StageCommand::build(&self.program, ctx, stage, params);
        info!(command = %command.display(), "Launching stage");

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .envs(command.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ContractError::stage_execution(
                    stage,
                    ExitSignal::Setup(format!("failed to launch '{}': {e}", command.program)),
                )
            })?;

        let run_id = match child.stderr.take() {
            Some(stderr) => drain_stage_output(stderr).await,
            None => None,
        };

        let status = child.wait().await.map_err(|e| {
            ContractError::stage_execution(
                stage,
                ExitSignal::Setup(format!("failed to wait for stage process: {e}")),
            )
        })?;

        if !status.success() {
            return Err(ContractError::stage_execution(stage, exit_signal(status)));
        }

        let run_id = match run_id {
            Some(id) => id,
            None => {
                let synthesized = local_run_id(stage);
                debug!(run_id = %synthesized, "No run identifier reported, synthesized one");
                synthesized
            }
        };
        Ok(run_id)
    }
}

/// Forward stderr to tracing until EOF and return the first run identifier seen.
///
/// Lines are decoded lossily. The pipe must stay open until the child closes
/// it, or the child's next write fails with SIGPIPE.
async fn drain_stage_output<R>(stderr: R) -> Option<RunId>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stderr);
    let mut buf = Vec::new();
    let mut run_id = None;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf);
                let line = text.trim_end_matches(['\n', '\r']);
                if run_id.is_none() {
                    run_id = extract_run_id(line);
                }
                info!(target: "stage_output", "{line}");
            }
            Err(e) => {
                warn!(error = %e, "Failed to read stage output, discarding the rest");
                if let Err(e) = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await {
                    warn!(error = %e, "Failed to drain stage output");
                }
                break;
            }
        }
    }
    run_id
}

/// Pull `<id>` out of `=== Run (ID '<id>') succeeded ===`
fn extract_run_id(line: &str) -> Option<RunId> {
    let start = line.find(RUN_ID_MARKER)? + RUN_ID_MARKER.len();
    let rest = &line[start..];
    let end = rest.find('\'')?;
    let id = &rest[..end];
    (!id.is_empty()).then(|| RunId::new(id))
}

fn local_run_id(stage: Stage) -> RunId {
    RunId::new(format!(
        "local-{}-{}",
        stage,
        chrono::Utc::now().timestamp_millis()
    ))
}

fn exit_signal(status: ExitStatus) -> ExitSignal {
    if let Some(code) = status.code() {
        return ExitSignal::Code(code);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return ExitSignal::Signal(signal);
        }
    }

    ExitSignal::Setup(format!("unrecognized exit status: {status}"))
}
