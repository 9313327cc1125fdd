//! Runtime records shared by the orchestrator and stage runners.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::{ExitSignal, PipelineConfig, Stage, StageSource};

/// Environment variable carrying the project identity to every stage
pub const PROJECT_ENV_VAR: &str = "WANDB_PROJECT";

/// Environment variable carrying the run-group identity to every stage
pub const RUN_GROUP_ENV_VAR: &str = "WANDB_RUN_GROUP";

/// Parameter mapping handed to a stage (sorted for stable command lines)
pub type Parameters = BTreeMap<String, Value>;

/// Opaque run identifier returned by a stage execution.
///
/// Only ever reported, never inspected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Process-wide identity for one pipeline invocation.
///
/// Built once before any stage runs and only ever borrowed afterwards, so no
/// stage can alter what a sibling stage sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    project_name: String,
    run_group: String,
    components_repository: String,
    env_manager: String,
    root_dir: PathBuf,
}

impl RunContext {
    pub fn new(
        project_name: impl Into<String>,
        run_group: impl Into<String>,
        components_repository: impl Into<String>,
        env_manager: impl Into<String>,
        root_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            run_group: run_group.into(),
            components_repository: components_repository.into(),
            env_manager: env_manager.into(),
            root_dir: root_dir.into(),
        }
    }

    /// Build from configuration; `root_dir` anchors local stage sources
    pub fn from_config(config: &PipelineConfig, root_dir: impl Into<PathBuf>) -> Self {
        Self::new(
            config.main.project_name.clone(),
            config.main.experiment_name.clone(),
            config.main.components_repository.clone(),
            config.main.env_manager.clone(),
            root_dir,
        )
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn run_group(&self) -> &str {
        &self.run_group
    }

    pub fn env_manager(&self) -> &str {
        &self.env_manager
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Environment variables every stage process receives
    pub fn environment(&self) -> [(&'static str, &str); 2] {
        [
            (PROJECT_ENV_VAR, self.project_name.as_str()),
            (RUN_GROUP_ENV_VAR, self.run_group.as_str()),
        ]
    }

    /// Concrete location of a stage's code
    pub fn stage_location(&self, stage: Stage) -> String {
        match stage.definition().source {
            StageSource::Component(name) => format!(
                "{}/{}",
                self.components_repository.trim_end_matches('/'),
                name
            ),
            StageSource::Local(path) => self.root_dir.join(path).display().to_string(),
        }
    }
}

/// Result of dispatching one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationOutcome {
    Succeeded(RunId),
    Failed(ExitSignal),
}

/// Ephemeral record of one stage dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct StageInvocation {
    pub stage: Stage,
    pub parameters: Parameters,
    pub outcome: InvocationOutcome,
    pub elapsed: Duration,
}

impl StageInvocation {
    pub fn run_id(&self) -> Option<&RunId> {
        match &self.outcome {
            InvocationOutcome::Succeeded(id) => Some(id),
            InvocationOutcome::Failed(_) => None,
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, InvocationOutcome::Succeeded(_))
    }
}
