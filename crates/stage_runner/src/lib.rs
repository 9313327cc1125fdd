//! # Stage Runner
//!
//! Execution backends for pipeline stages.
//!
//! Responsibilities:
//! - Translate a stage and its parameter mapping into a backend invocation
//! - Propagate project / run-group identity to the stage process only
//! - Report success as an opaque `RunId`, failure as a stage execution error
//! - Provide an in-memory mock for orchestrator tests

pub mod command;
pub mod mock;
pub mod process;

pub use command::StageCommand;
pub use contracts::{LocalStageRunner, RunContext, RunId, StageRunner};
pub use mock::{MockConfig, MockStageRunner, RecordedInvocation};
pub use process::ProcessStageRunner;
